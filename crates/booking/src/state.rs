//! Booking saga state machine.

use serde::{Deserialize, Serialize};

/// The state of one booking-creation attempt.
///
/// State transitions:
/// ```text
/// CheckingAvailability ──► PaymentInitiated ──► BookingPersisted
///     ──► LineItemsPersisted ──► InventoryReserved
///
/// any state ──► RollingBack ──► Aborted
/// ```
///
/// The rollback boundary sits at `BookingPersisted`: failures before it leave
/// no persisted state, failures at or after it require compensation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BookingSagaState {
    /// Validating availability per requested room type.
    #[default]
    CheckingAvailability,

    /// Checkout session created with the payment gateway.
    PaymentInitiated,

    /// The pending booking row exists.
    BookingPersisted,

    /// All line items exist.
    LineItemsPersisted,

    /// Inventory reserved for every line item (terminal success).
    InventoryReserved,

    /// A step failed and compensations are running.
    RollingBack,

    /// Compensation finished after a failure (terminal failure).
    Aborted,
}

impl BookingSagaState {
    /// Returns true once persisted state exists that a failure must undo.
    pub fn past_rollback_boundary(&self) -> bool {
        matches!(
            self,
            BookingSagaState::BookingPersisted | BookingSagaState::LineItemsPersisted
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingSagaState::InventoryReserved | BookingSagaState::Aborted
        )
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingSagaState::CheckingAvailability => "CheckingAvailability",
            BookingSagaState::PaymentInitiated => "PaymentInitiated",
            BookingSagaState::BookingPersisted => "BookingPersisted",
            BookingSagaState::LineItemsPersisted => "LineItemsPersisted",
            BookingSagaState::InventoryReserved => "InventoryReserved",
            BookingSagaState::RollingBack => "RollingBack",
            BookingSagaState::Aborted => "Aborted",
        }
    }
}

impl std::fmt::Display for BookingSagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
