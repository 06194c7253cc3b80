/// Prometheus metrics for registration, activation and authentication
use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec, Encoder, TextEncoder};

lazy_static! {
    /// Total user registrations (labels: status=success|failed)
    pub static ref REGISTRATION_TOTAL: CounterVec = register_counter_vec!(
        "auth_registration_total",
        "Total number of user registrations",
        &["status"]
    )
    .unwrap();

    /// Total account activations (labels: status=success|failed)
    pub static ref ACTIVATION_TOTAL: CounterVec = register_counter_vec!(
        "auth_activation_total",
        "Total number of account activation attempts",
        &["status"]
    )
    .unwrap();

    /// Total login attempts (labels: status=success|failed)
    pub static ref LOGIN_ATTEMPTS_TOTAL: CounterVec = register_counter_vec!(
        "auth_login_attempts_total",
        "Total number of login attempts",
        &["status"]
    )
    .unwrap();

    /// Total password reset requests (labels: status=requested|completed)
    pub static ref PASSWORD_RESET_TOTAL: CounterVec = register_counter_vec!(
        "auth_password_reset_total",
        "Total number of password reset requests",
        &["status"]
    )
    .unwrap();
}

/// Render all registered metrics in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!(error = %e, "failed to encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_register_and_render() {
        REGISTRATION_TOTAL.with_label_values(&["success"]).inc();
        ACTIVATION_TOTAL.with_label_values(&["failed"]).inc();

        let rendered = gather_metrics();
        assert!(rendered.contains("auth_registration_total"));
        assert!(rendered.contains("auth_activation_total"));
    }
}
