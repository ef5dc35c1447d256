//! Booking core: availability, inventory reservation, payment contract,
//! the creation saga, and lifecycle sweepers.
//!
//! Creating a booking is a multi-step operation across independently
//! committed statements:
//! 1. Check availability per requested room type
//! 2. Initiate checkout with the payment gateway
//! 3. Persist the booking row (the rollback boundary)
//! 4. Persist one line item per room type
//! 5. Reserve inventory per line item
//!
//! Steps completed after the rollback boundary record an undo action; on any
//! later failure the undo stack is unwound in reverse-dependency order
//! (inventory first, then line items, then the booking row), each step
//! best-effort.
//!
//! Two sweepers reconcile stale state opportunistically from the read and
//! update paths: one frees inventory once checkout has passed, the other
//! cancels bookings stuck in pending payment beyond the timeout window.

pub mod availability;
pub mod coordinator;
pub mod error;
pub mod inventory;
pub mod payment;
pub mod state;
pub mod sweep;

pub use availability::{AvailabilityChecker, AvailabilityResult};
pub use coordinator::{
    BookingConfirmation, BookingCoordinator, BookingRequest, BookingSummary, RoomSelection,
    RoomTypeBreakdown,
};
pub use error::BookingError;
pub use inventory::InventoryService;
pub use payment::{
    ChargeStatus, CheckoutRequest, CheckoutSession, InMemoryPaymentGateway, PaymentGateway,
    PaymentVerification,
};
pub use state::BookingSagaState;
pub use sweep::{PENDING_PAYMENT_TIMEOUT_MINUTES, Sweeper};
