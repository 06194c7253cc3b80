//! Ownership guard for user-owned resources.
//!
//! A single explicit predicate replaces per-view access mixins: every
//! handler that mutates or reveals an owned resource calls it directly
//! with the acting principal and the resource's owner id.

use crate::error::AppError;
use uuid::Uuid;

/// The authenticated actor making a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub is_superuser: bool,
}

/// True iff the principal owns the resource or is a superuser.
/// Pure predicate; evaluated per request before any mutation.
pub fn authorize(principal: &Principal, resource_owner_id: Uuid) -> bool {
    principal.id == resource_owner_id || principal.is_superuser
}

/// Categorical refusal: callers get a 403, never a silent filter or
/// redirect.
pub fn require_owner(principal: &Principal, resource_owner_id: Uuid) -> Result<(), AppError> {
    if authorize(principal, resource_owner_id) {
        Ok(())
    } else {
        Err(AppError::Authorization(
            "You do not have permission to access this resource".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(id: Uuid, is_superuser: bool) -> Principal {
        Principal { id, is_superuser }
    }

    #[test]
    fn test_owner_is_authorized() {
        let id = Uuid::new_v4();
        assert!(authorize(&principal(id, false), id));
    }

    #[test]
    fn test_non_owner_is_refused() {
        let caller = Uuid::new_v4();
        let other = Uuid::new_v4();
        assert!(!authorize(&principal(caller, false), other));
    }

    #[test]
    fn test_superuser_is_authorized_for_anyone() {
        let caller = Uuid::new_v4();
        let other = Uuid::new_v4();
        assert!(authorize(&principal(caller, true), other));
    }

    #[test]
    fn test_require_owner_maps_to_authorization_error() {
        let caller = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert!(require_owner(&principal(caller, false), caller).is_ok());
        match require_owner(&principal(caller, false), other) {
            Err(AppError::Authorization(_)) => {}
            other => panic!("expected Authorization error, got {:?}", other),
        }
    }
}
