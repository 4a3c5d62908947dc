//! Payment tracking: checkout creation and asynchronous settlement
//! reconciliation against tool-call payment status.

pub mod checkout;

pub use checkout::{provider_from_config, CheckoutError, CheckoutProvider};

use std::fmt;
use std::sync::Arc;

use crate::db::Database;
use crate::models::{Payment, PaymentStatus, SettlementStatus};

#[derive(Debug)]
pub enum PaymentError {
    /// Unknown tool call or checkout reference.
    NotFound,
    Checkout(CheckoutError),
    Storage(rusqlite::Error),
}

impl fmt::Display for PaymentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentError::NotFound => write!(f, "Not found"),
            PaymentError::Checkout(e) => write!(f, "{}", e),
            PaymentError::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl From<rusqlite::Error> for PaymentError {
    fn from(e: rusqlite::Error) -> Self {
        PaymentError::Storage(e)
    }
}

pub struct PaymentTracker {
    db: Arc<Database>,
    provider: Arc<dyn CheckoutProvider>,
}

impl PaymentTracker {
    pub fn new(db: Arc<Database>, provider: Arc<dyn CheckoutProvider>) -> Self {
        PaymentTracker { db, provider }
    }

    /// Create a payment for an existing tool call and attach the external
    /// checkout reference.
    pub async fn create_payment(
        &self,
        tool_call_id: &str,
        amount: f64,
        currency: &str,
    ) -> Result<Payment, PaymentError> {
        if self.db.get_tool_call(tool_call_id)?.is_none() {
            return Err(PaymentError::NotFound);
        }

        let mut payment = self.db.create_payment(tool_call_id, amount, currency)?;
        let checkout_id = self
            .provider
            .create_checkout(&payment.id, amount, currency)
            .await
            .map_err(PaymentError::Checkout)?;
        self.db.set_payment_checkout_id(&payment.id, &checkout_id)?;
        payment.checkout_id = Some(checkout_id);

        log::info!(
            "Created payment {} for tool call {} ({} {})",
            payment.id,
            tool_call_id,
            amount,
            currency
        );
        Ok(payment)
    }

    /// Process a settlement notification from the provider and reconcile the
    /// tool call's payment status.
    pub fn handle_settlement(
        &self,
        checkout_id: &str,
        status: SettlementStatus,
    ) -> Result<(), PaymentError> {
        let payment = self
            .db
            .get_payment_by_checkout_id(checkout_id)?
            .ok_or(PaymentError::NotFound)?;

        self.db.settle_payment(&payment.id, status)?;

        // Cascade onto the tool call. The source system only cascaded on
        // completion, leaving failed settlements indistinguishable from
        // not-yet-paid; failed now cascades too.
        match status {
            SettlementStatus::Completed => {
                self.db
                    .set_tool_call_payment_status(&payment.tool_call_id, PaymentStatus::Paid)?;
            }
            SettlementStatus::Failed => {
                self.db
                    .set_tool_call_payment_status(&payment.tool_call_id, PaymentStatus::Failed)?;
            }
            SettlementStatus::Pending => {}
        }

        log::info!(
            "Settled payment {} ({} -> {})",
            payment.id,
            checkout_id,
            status.as_str()
        );
        Ok(())
    }

    /// Monitoring lookup by tool call id or checkout reference.
    pub fn find_payment(&self, identifier: &str) -> Result<Option<Payment>, PaymentError> {
        Ok(self.db.find_payment(identifier)?)
    }
}
