//! Availability checking for room-type inventory over a date range.

use chrono::NaiveDate;
use common::{BookingId, RoomTypeId};
use domain::StayRange;
use store::BookingStore;

/// Outcome of an availability check. Never an error: denials and even
/// data-access failures come back as a structured `available = false`
/// result so callers can treat the check as non-throwing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityResult {
    /// Whether the requested rooms can be booked.
    pub available: bool,
    /// The room type's fixed capacity.
    pub total_inventory: u32,
    /// Rooms held by non-cancelled bookings overlapping the stay.
    pub booked: u32,
    /// Rooms still free for the stay (`max(0, total - booked)`).
    pub available_rooms: u32,
    /// Human-readable reason when denied.
    pub reason: Option<String>,
}

impl AvailabilityResult {
    fn denied(reason: impl Into<String>) -> Self {
        Self {
            available: false,
            total_inventory: 0,
            booked: 0,
            available_rooms: 0,
            reason: Some(reason.into()),
        }
    }

    fn denied_with_counts(
        reason: impl Into<String>,
        total_inventory: u32,
        booked: u32,
        available_rooms: u32,
    ) -> Self {
        Self {
            available: false,
            total_inventory,
            booked,
            available_rooms,
            reason: Some(reason.into()),
        }
    }
}

/// Computes available inventory for a room type by subtracting overlapping
/// non-cancelled bookings from total capacity.
#[derive(Clone)]
pub struct AvailabilityChecker<S> {
    store: S,
}

impl<S: BookingStore> AvailabilityChecker<S> {
    /// Creates a new availability checker.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Checks whether `requested_rooms` of a room type are free for the
    /// stay. See [`check_excluding`](Self::check_excluding).
    pub async fn check(
        &self,
        room_type_id: RoomTypeId,
        check_in: NaiveDate,
        check_out: NaiveDate,
        requested_guests: u32,
        requested_rooms: u32,
    ) -> AvailabilityResult {
        self.check_excluding(
            room_type_id,
            check_in,
            check_out,
            requested_guests,
            requested_rooms,
            None,
        )
        .await
    }

    /// Availability check that leaves one booking's own line items out of
    /// the booked count. The saga's mid-flight re-check passes the booking
    /// it has just persisted; everyone else passes `None` via
    /// [`check`](Self::check).
    #[tracing::instrument(skip(self))]
    pub async fn check_excluding(
        &self,
        room_type_id: RoomTypeId,
        check_in: NaiveDate,
        check_out: NaiveDate,
        requested_guests: u32,
        requested_rooms: u32,
        exclude_booking: Option<BookingId>,
    ) -> AvailabilityResult {
        let stay = match StayRange::new(check_in, check_out) {
            Ok(stay) => stay,
            Err(e) => return AvailabilityResult::denied(e.to_string()),
        };

        if requested_rooms == 0 {
            return AvailabilityResult::denied("Requested room count must be greater than zero");
        }

        let room_type = match self.store.find_room_type(room_type_id).await {
            Ok(Some(rt)) => rt,
            Ok(None) => {
                return AvailabilityResult::denied(format!("Room type {room_type_id} not found"));
            }
            Err(e) => {
                tracing::error!(%room_type_id, error = %e, "availability check failed to load room type");
                return AvailabilityResult::denied("System error while checking availability");
            }
        };

        if requested_guests > room_type.max_occupancy * requested_rooms {
            return AvailabilityResult::denied(format!(
                "{} guest(s) exceed the occupancy limit of {} for {} room(s)",
                requested_guests,
                room_type.max_occupancy * requested_rooms,
                requested_rooms,
            ));
        }

        let booked = match self
            .store
            .sum_overlapping_rooms(room_type_id, &stay, exclude_booking)
            .await
        {
            Ok(booked) => booked,
            Err(e) => {
                tracing::error!(%room_type_id, error = %e, "availability check failed to count bookings");
                return AvailabilityResult::denied("System error while checking availability");
            }
        };

        let total = i64::from(room_type.total_inventory);
        let available = (total - booked).max(0);

        if available < i64::from(requested_rooms) {
            return AvailabilityResult::denied_with_counts(
                format!(
                    "Insufficient inventory: requested {requested_rooms}, available {available}, \
                     total {total}, booked {booked}"
                ),
                room_type.total_inventory,
                booked as u32,
                available as u32,
            );
        }

        AvailabilityResult {
            available: true,
            total_inventory: room_type.total_inventory,
            booked: booked as u32,
            available_rooms: available as u32,
            reason: None,
        }
    }
}
