//! Lifecycle sweepers: reconciliation passes over stale bookings.
//!
//! Both sweeps run opportunistically on request paths rather than on a
//! scheduler, and never propagate errors to their callers: a failed sweep
//! leaves its bookings for the next pass.

use chrono::{Duration, Utc};
use domain::{Booking, PaymentStatus};
use store::BookingStore;

use crate::inventory::InventoryService;

/// How long a booking may sit in pending payment before it is cancelled.
pub const PENDING_PAYMENT_TIMEOUT_MINUTES: i64 = 30;

/// Background reconciliation over expired bookings.
#[derive(Clone)]
pub struct Sweeper<S> {
    store: S,
    inventory: InventoryService<S>,
}

impl<S: BookingStore + Clone> Sweeper<S> {
    /// Creates a new sweeper over the given store.
    pub fn new(store: S) -> Self {
        let inventory = InventoryService::new(store.clone());
        Self { store, inventory }
    }

    /// Frees inventory held by non-cancelled bookings whose checkout date
    /// has passed. Checked-out is not cancelled: only inventory moves.
    ///
    /// Each booking's release is claimed through its
    /// `inventory_released_at` marker first, so re-running the sweep (or a
    /// concurrent sweep racing this one) cannot free the same rooms twice.
    ///
    /// Returns the number of bookings whose inventory was freed.
    #[tracing::instrument(skip(self))]
    pub async fn release_expired_checkouts(&self) -> usize {
        let now = Utc::now();
        let expired = match self.store.find_expired_checkouts(now.date_naive()).await {
            Ok(expired) => expired,
            Err(e) => {
                tracing::warn!(error = %e, "expired-checkout sweep failed to query");
                return 0;
            }
        };

        let mut released = 0;
        for booking in expired {
            match self.store.claim_inventory_release(booking.id, now).await {
                Ok(true) => {
                    self.release_line_items(&booking).await;
                    released += 1;
                }
                // Another sweep or a cancellation got there first.
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(booking_id = %booking.id, error = %e, "failed to claim inventory release");
                }
            }
        }

        if released > 0 {
            metrics::counter!("expired_checkout_releases_total").increment(released as u64);
            tracing::info!(released, "expired-checkout sweep freed inventory");
        }
        released
    }

    /// Cancels bookings stuck in pending payment beyond
    /// [`PENDING_PAYMENT_TIMEOUT_MINUTES`], marking the payment failed and
    /// freeing their inventory.
    ///
    /// Returns the number of bookings cancelled.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_expired_pending(&self) -> usize {
        let now = Utc::now();
        let cutoff = now - Duration::minutes(PENDING_PAYMENT_TIMEOUT_MINUTES);
        let expired = match self.store.find_expired_pending(cutoff).await {
            Ok(expired) => expired,
            Err(e) => {
                tracing::warn!(error = %e, "expired-pending sweep failed to query");
                return 0;
            }
        };

        let mut cancelled = 0;
        for booking in expired {
            match self
                .store
                .claim_cancellation(
                    booking.id,
                    "Payment window expired",
                    Some(PaymentStatus::Failed),
                    now,
                )
                .await
            {
                Ok(true) => {
                    match self.store.claim_inventory_release(booking.id, now).await {
                        Ok(true) => self.release_line_items(&booking).await,
                        Ok(false) => {}
                        Err(e) => {
                            tracing::warn!(booking_id = %booking.id, error = %e, "failed to claim inventory release");
                        }
                    }
                    cancelled += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(booking_id = %booking.id, error = %e, "failed to cancel expired pending booking");
                }
            }
        }

        if cancelled > 0 {
            metrics::counter!("expired_pending_cancellations_total").increment(cancelled as u64);
            tracing::info!(cancelled, "expired-pending sweep cancelled bookings");
        }
        cancelled
    }

    /// Hands back every line item's rooms, logging and continuing on
    /// individual failures.
    async fn release_line_items(&self, booking: &Booking) {
        let items = match self.store.find_line_items(booking.id).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(booking_id = %booking.id, error = %e, "failed to load line items for release");
                return;
            }
        };

        for item in items {
            match self.inventory.increase(item.room_type_id, item.num_rooms).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(
                        booking_id = %booking.id,
                        room_type_id = %item.room_type_id,
                        "inventory release found no room type"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        booking_id = %booking.id,
                        room_type_id = %item.room_type_id,
                        error = %e,
                        "inventory release failed"
                    );
                }
            }
        }
    }
}
