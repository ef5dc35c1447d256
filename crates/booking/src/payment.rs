//! Payment gateway contract and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::{Currency, Money};
use serde::{Deserialize, Serialize};

use crate::error::BookingError;

/// A checkout request sent to the gateway, one per booking attempt.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Total to charge.
    pub amount: Money,
    /// Charge currency (the payer's preferred currency).
    pub currency: Currency,
    /// Payer contact email.
    pub customer_email: String,
    /// Payer contact phone, when known.
    pub customer_phone: Option<String>,
    /// Payer display name, when known.
    pub customer_name: Option<String>,
    /// Order description shown on the checkout page.
    pub description: String,
    /// Merchant subaccount to credit, when the hotel has one configured.
    pub subaccount: Option<String>,
}

/// A checkout session created by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    /// Hosted payment page for the payer.
    pub checkout_url: String,
    /// The gateway's transaction reference, stored on the booking.
    pub tx_ref: String,
}

/// Charge status reported by the gateway on verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargeStatus {
    /// The charge settled.
    Successful,
    /// The payer has not completed checkout yet.
    Pending,
    /// The charge failed or was abandoned.
    Failed,
}

/// Result of verifying a transaction reference with the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentVerification {
    /// The charge status as the gateway reports it.
    pub status: ChargeStatus,
}

/// Trait for the external payment gateway's narrow contract.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a checkout session for the given order.
    async fn initiate_checkout(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, BookingError>;

    /// Verifies the charge behind a transaction reference.
    async fn verify(&self, tx_ref: &str) -> Result<PaymentVerification, BookingError>;
}

#[derive(Debug)]
struct InMemoryGatewayState {
    sessions: HashMap<String, CheckoutRequest>,
    next_id: u32,
    fail_on_checkout: bool,
    verify_status: ChargeStatus,
}

impl Default for InMemoryGatewayState {
    fn default() -> Self {
        Self {
            sessions: HashMap::new(),
            next_id: 0,
            fail_on_checkout: false,
            verify_status: ChargeStatus::Successful,
        }
    }
}

/// In-memory payment gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory payment gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to fail checkout initiation.
    pub fn set_fail_on_checkout(&self, fail: bool) {
        self.state.write().unwrap().fail_on_checkout = fail;
    }

    /// Configures the status reported by subsequent verifications.
    pub fn set_verify_status(&self, status: ChargeStatus) {
        self.state.write().unwrap().verify_status = status;
    }

    /// Returns the number of checkout sessions created.
    pub fn session_count(&self) -> usize {
        self.state.read().unwrap().sessions.len()
    }

    /// Returns true if a session exists for the given transaction reference.
    pub fn has_session(&self, tx_ref: &str) -> bool {
        self.state.read().unwrap().sessions.contains_key(tx_ref)
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn initiate_checkout(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, BookingError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_checkout {
            return Err(BookingError::PaymentGateway(
                "Checkout initiation declined".to_string(),
            ));
        }

        state.next_id += 1;
        let tx_ref = format!("TX-{:04}", state.next_id);
        let checkout_url = format!("https://checkout.example/pay/{tx_ref}");
        state.sessions.insert(tx_ref.clone(), request);

        Ok(CheckoutSession {
            checkout_url,
            tx_ref,
        })
    }

    async fn verify(&self, tx_ref: &str) -> Result<PaymentVerification, BookingError> {
        let state = self.state.read().unwrap();

        if !state.sessions.contains_key(tx_ref) {
            return Err(BookingError::PaymentGateway(format!(
                "Unknown transaction reference: {tx_ref}"
            )));
        }

        Ok(PaymentVerification {
            status: state.verify_status,
        })
    }
}
