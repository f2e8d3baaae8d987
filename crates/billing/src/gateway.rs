//! Payment gateway boundary.
//!
//! The gateway is an opaque external system: orders are created against it
//! and receipts come back signed. Nothing here models the provider's own
//! flows; signature verification is delegated through the trait so the rest
//! of the system treats a verified receipt as proof of payment.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use tradepost_core::{DomainError, DomainResult};

/// An order registered with the payment provider, awaiting payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub order_id: String,
    pub amount_minor: u64,
    pub currency: String,
}

/// Provider callback payload after a payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// External payment provider.
pub trait PaymentGateway: Send + Sync {
    /// Register an order for `amount_minor` of `currency`; `reference` ties
    /// the order back to the subscription purchase.
    fn create_order(
        &self,
        amount_minor: u64,
        currency: &str,
        reference: &str,
    ) -> DomainResult<PaymentOrder>;

    /// Verify a receipt's signature. An unverifiable receipt is a validation
    /// failure, never a success.
    fn verify_receipt(&self, receipt: &PaymentReceipt) -> DomainResult<()>;
}

/// In-process gateway for tests and local development. Orders are numbered
/// sequentially and the "signature" is derived from the order and payment
/// ids, so tests can mint valid receipts without a provider.
#[derive(Debug, Default)]
pub struct FakeGateway {
    orders: Mutex<Vec<PaymentOrder>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signature_for(order_id: &str, payment_id: &str) -> String {
        format!("sig:{order_id}:{payment_id}")
    }

    pub fn order_count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }
}

impl PaymentGateway for FakeGateway {
    fn create_order(
        &self,
        amount_minor: u64,
        currency: &str,
        reference: &str,
    ) -> DomainResult<PaymentOrder> {
        if amount_minor == 0 {
            return Err(DomainError::validation(
                "zero-amount orders do not go through the gateway",
            ));
        }
        let mut orders = self.orders.lock().unwrap();
        let order = PaymentOrder {
            order_id: format!("order-{}-{}", reference, orders.len() + 1),
            amount_minor,
            currency: currency.to_string(),
        };
        orders.push(order.clone());
        Ok(order)
    }

    fn verify_receipt(&self, receipt: &PaymentReceipt) -> DomainResult<()> {
        let known = self
            .orders
            .lock()
            .unwrap()
            .iter()
            .any(|o| o.order_id == receipt.order_id);
        if !known {
            return Err(DomainError::validation("receipt references an unknown order"));
        }
        if receipt.signature != Self::signature_for(&receipt.order_id, &receipt.payment_id) {
            return Err(DomainError::validation("payment signature mismatch"));
        }
        Ok(())
    }
}
