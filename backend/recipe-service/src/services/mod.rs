pub mod activation;
pub mod email_service;
pub mod storage;

pub use activation::{ActivationError, ActivationService, ActivationStore, PgActivationStore};
pub use email_service::EmailService;
pub use storage::MediaStorage;
