//! Payment verification seam for the premium upgrade.
//!
//! No payment processor is integrated. [`StubPaymentValidator`] always
//! approves after a fixed delay so the upgrade flow can be exercised end to
//! end; a real processor plugs in behind [`PaymentValidator`].

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("payment verification unavailable: {0}")]
    Unavailable(String),
}

#[async_trait::async_trait]
pub trait PaymentValidator: Send + Sync {
    /// Whether the user's payment went through.
    ///
    /// # Errors
    ///
    /// Returns an error if the verification service cannot be reached.
    async fn validate(&self) -> Result<bool, PaymentError>;
}

/// Placeholder validator: approves every payment after `delay`.
#[derive(Debug, Clone, Copy)]
pub struct StubPaymentValidator {
    pub delay: Duration,
}

impl StubPaymentValidator {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for StubPaymentValidator {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::config::DEFAULT_PAYMENT_VALIDATION_DELAY_MS))
    }
}

#[async_trait::async_trait]
impl PaymentValidator for StubPaymentValidator {
    async fn validate(&self) -> Result<bool, PaymentError> {
        tokio::time::sleep(self.delay).await;
        Ok(true)
    }
}
