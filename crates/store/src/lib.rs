//! Persistence layer for the booking platform.
//!
//! A single [`BookingStore`] trait covers bookings, their room-type line
//! items, and room-type inventory counters. Two implementations are
//! provided: [`InMemoryBookingStore`] for tests and single-process use, and
//! [`PostgresBookingStore`] backed by sqlx.
//!
//! Every statement commits independently; the booking saga compensates
//! across them rather than relying on a wrapping transaction. The only
//! atomic pieces are the conditional single-statement updates: inventory
//! decrement (which requires a sufficient balance in its WHERE clause) and
//! the cancellation/inventory-release claims.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryBookingStore;
pub use postgres::PostgresBookingStore;
pub use store::BookingStore;
