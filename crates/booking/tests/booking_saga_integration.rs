//! Integration tests for the booking saga, sweepers, and lifecycle
//! operations against the in-memory store.

use booking::{
    AvailabilityChecker, BookingCoordinator, BookingError, BookingRequest, ChargeStatus,
    InMemoryPaymentGateway, RoomSelection, Sweeper,
};
use chrono::{Duration, NaiveDate, Utc};
use common::{HotelId, UserId};
use domain::{
    Booking, BookingRoomType, Currency, Guest, Money, PaymentStatus, RoomType, StayRange,
};
use store::{BookingStore, InMemoryBookingStore};

type TestCoordinator = BookingCoordinator<InMemoryBookingStore, InMemoryPaymentGateway>;

struct TestHarness {
    coordinator: TestCoordinator,
    store: InMemoryBookingStore,
    gateway: InMemoryPaymentGateway,
}

impl TestHarness {
    fn new() -> Self {
        let store = InMemoryBookingStore::new();
        let gateway = InMemoryPaymentGateway::new();
        let coordinator = BookingCoordinator::new(store.clone(), gateway.clone());
        Self {
            coordinator,
            store,
            gateway,
        }
    }

    async fn seed_room_type(&self, name: &str, max_occupancy: u32, total: u32) -> RoomType {
        let rt = RoomType::new(HotelId::new(), name, max_occupancy, total, 2, 30);
        self.store.insert_room_type(&rt).await.unwrap();
        rt
    }

    fn guest(&self) -> Guest {
        Guest {
            user_id: UserId::new(),
            email: "guest@example.com".to_string(),
            phone_number: Some("+2348000000000".to_string()),
            full_name: Some("Ada Guest".to_string()),
            currency: Currency::new("NGN"),
        }
    }

    fn request(
        &self,
        check_in: NaiveDate,
        check_out: NaiveDate,
        rooms: Vec<RoomSelection>,
    ) -> BookingRequest {
        BookingRequest {
            hotel_id: HotelId::new(),
            check_in_date: check_in,
            check_out_date: check_out,
            rooms,
            total_price: Money::from_minor(250_000),
        }
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn select(rt: &RoomType, num_rooms: u32, num_guests: u32) -> RoomSelection {
    RoomSelection {
        room_type_id: rt.id,
        num_rooms,
        num_guests,
    }
}

/// Availability reports `max(0, total - booked)` and denies anything
/// beyond it.
#[tokio::test]
async fn availability_arithmetic_over_existing_bookings() {
    let h = TestHarness::new();
    let rt = h.seed_room_type("Standard", 2, 10).await;

    // Two overlapping bookings holding 4 + 3 rooms.
    for rooms in [4u32, 3] {
        let booking = Booking::pending(
            UserId::new(),
            HotelId::new(),
            StayRange::new(date(2999, 6, 1), date(2999, 6, 10)).unwrap(),
            Money::from_minor(10_000),
            Currency::default(),
            format!("tx-{rooms}"),
            Utc::now(),
        );
        h.store.insert_booking(&booking).await.unwrap();
        h.store
            .insert_line_item(&BookingRoomType::new(booking.id, rt.id, rooms, rooms))
            .await
            .unwrap();
    }

    let checker = AvailabilityChecker::new(h.store.clone());
    let result = checker
        .check(rt.id, date(2999, 6, 3), date(2999, 6, 5), 2, 4)
        .await;

    assert!(!result.available);
    assert_eq!(result.total_inventory, 10);
    assert_eq!(result.booked, 7);
    assert_eq!(result.available_rooms, 3);

    let granted = checker
        .check(rt.id, date(2999, 6, 3), date(2999, 6, 5), 2, 3)
        .await;
    assert!(granted.available);
}

/// The overlap boundary is inclusive on both ends. One case per
/// boundary.
#[tokio::test]
async fn overlap_boundary_cases() {
    let h = TestHarness::new();
    let rt = h.seed_room_type("Standard", 2, 5).await;

    let existing = Booking::pending(
        UserId::new(),
        HotelId::new(),
        StayRange::new(date(2999, 6, 10), date(2999, 6, 15)).unwrap(),
        Money::from_minor(10_000),
        Currency::default(),
        "tx-existing",
        Utc::now(),
    );
    h.store.insert_booking(&existing).await.unwrap();
    h.store
        .insert_line_item(&BookingRoomType::new(existing.id, rt.id, 5, 5))
        .await
        .unwrap();

    let checker = AvailabilityChecker::new(h.store.clone());
    let booked = |ci: NaiveDate, co: NaiveDate| {
        let checker = checker.clone();
        async move { checker.check(rt.id, ci, co, 1, 1).await.booked }
    };

    // Requested ends exactly on the existing check-in: counted.
    assert_eq!(booked(date(2999, 6, 5), date(2999, 6, 10)).await, 5);
    // Requested starts exactly on the existing check-out: counted.
    assert_eq!(booked(date(2999, 6, 15), date(2999, 6, 20)).await, 5);
    // Requested ends the day before the existing check-in: not counted.
    assert_eq!(booked(date(2999, 6, 5), date(2999, 6, 9)).await, 0);
    // Requested starts the day after the existing check-out: not counted.
    assert_eq!(booked(date(2999, 6, 16), date(2999, 6, 20)).await, 0);
    // Fully contained: counted.
    assert_eq!(booked(date(2999, 6, 11), date(2999, 6, 14)).await, 5);
}

/// With one unavailable room type among N, nothing is persisted and no
/// inventory moves.
#[tokio::test]
async fn all_or_nothing_on_unavailable_room_type() {
    let h = TestHarness::new();
    let a = h.seed_room_type("A", 2, 5).await;
    let b = h.seed_room_type("B", 2, 0).await;
    let c = h.seed_room_type("C", 2, 5).await;

    let result = h
        .coordinator
        .create_booking(
            &h.guest(),
            h.request(
                date(2999, 6, 1),
                date(2999, 6, 5),
                vec![select(&a, 1, 1), select(&b, 1, 1), select(&c, 1, 1)],
            ),
        )
        .await;

    assert!(matches!(
        result,
        Err(BookingError::RoomTypeUnavailable { room_type_id, .. }) if room_type_id == b.id
    ));
    assert_eq!(h.store.booking_count().await, 0);
    assert_eq!(h.store.line_item_count().await, 0);
    for rt in [&a, &c] {
        assert_eq!(
            h.store.available_inventory(rt.id).await,
            Some(rt.total_inventory)
        );
    }
    assert_eq!(h.gateway.session_count(), 0);
}

/// A reservation failure at the k-th line item restores inventory for
/// items 1..k-1 and deletes all rows.
#[tokio::test]
async fn rollback_restores_inventory_on_late_failure() {
    let h = TestHarness::new();
    let first = h.seed_room_type("First", 2, 5).await;
    let second = h.seed_room_type("Second", 2, 5).await;
    let third = h.seed_room_type("Third", 2, 5).await;
    h.store.fail_decrease_for(third.id).await;

    let result = h
        .coordinator
        .create_booking(
            &h.guest(),
            h.request(
                date(2999, 6, 1),
                date(2999, 6, 5),
                vec![select(&first, 2, 2), select(&second, 1, 1), select(&third, 1, 1)],
            ),
        )
        .await;

    assert!(matches!(
        result,
        Err(BookingError::ReservationFailed { room_type_id }) if room_type_id == third.id
    ));
    // First and second were decremented and compensated back to 5.
    for rt in [&first, &second, &third] {
        assert_eq!(h.store.available_inventory(rt.id).await, Some(5));
    }
    assert_eq!(h.store.booking_count().await, 0);
    assert_eq!(h.store.line_item_count().await, 0);
}

/// Cancelling an already-cancelled booking is a denial with no
/// inventory mutation.
#[tokio::test]
async fn cancel_twice_is_denied_without_inventory_mutation() {
    let h = TestHarness::new();
    let rt = h.seed_room_type("Deluxe", 2, 5).await;

    let confirmation = h
        .coordinator
        .create_booking(
            &h.guest(),
            h.request(date(2999, 6, 1), date(2999, 6, 5), vec![select(&rt, 2, 2)]),
        )
        .await
        .unwrap();

    h.coordinator
        .cancel_booking(confirmation.booking.id, "guest request")
        .await
        .unwrap();
    assert_eq!(h.store.available_inventory(rt.id).await, Some(5));

    let again = h
        .coordinator
        .cancel_booking(confirmation.booking.id, "guest request")
        .await;
    assert!(matches!(again, Err(BookingError::AlreadyCancelled(_))));
    assert_eq!(h.store.available_inventory(rt.id).await, Some(5));
}

/// The pending-payment window. A booking 31 minutes old is swept, one
/// 29 minutes old is untouched.
#[tokio::test]
async fn pending_payment_timeout_window() {
    let h = TestHarness::new();
    let rt = h.seed_room_type("Deluxe", 2, 10).await;

    let seed = |minutes_ago: i64, tx: &str| {
        Booking::pending(
            UserId::new(),
            HotelId::new(),
            StayRange::new(date(2999, 6, 1), date(2999, 6, 5)).unwrap(),
            Money::from_minor(10_000),
            Currency::default(),
            tx.to_string(),
            Utc::now() - Duration::minutes(minutes_ago),
        )
    };
    let stale = seed(31, "tx-stale");
    let fresh = seed(29, "tx-fresh");

    for (booking, rooms) in [(&stale, 3u32), (&fresh, 2u32)] {
        h.store.insert_booking(booking).await.unwrap();
        h.store
            .insert_line_item(&BookingRoomType::new(booking.id, rt.id, rooms, rooms))
            .await
            .unwrap();
        h.store
            .decrease_available_inventory(rt.id, rooms)
            .await
            .unwrap();
    }
    assert_eq!(h.store.available_inventory(rt.id).await, Some(5));

    let sweeper = Sweeper::new(h.store.clone());
    assert_eq!(sweeper.cancel_expired_pending().await, 1);

    let swept = h.store.find_booking(stale.id).await.unwrap().unwrap();
    assert!(swept.cancelled);
    assert_eq!(swept.payment_status, PaymentStatus::Failed);
    assert!(swept.cancelled_at.is_some());

    let untouched = h.store.find_booking(fresh.id).await.unwrap().unwrap();
    assert!(!untouched.cancelled);
    assert_eq!(untouched.payment_status, PaymentStatus::Pending);

    // Only the stale booking's 3 rooms came back.
    assert_eq!(h.store.available_inventory(rt.id).await, Some(8));
}

/// Verifying a payment the gateway reports successful twice makes
/// exactly one transition to completed.
#[tokio::test]
async fn verify_payment_transitions_once() {
    let h = TestHarness::new();
    let rt = h.seed_room_type("Deluxe", 2, 5).await;

    let confirmation = h
        .coordinator
        .create_booking(
            &h.guest(),
            h.request(date(2999, 6, 1), date(2999, 6, 5), vec![select(&rt, 1, 1)]),
        )
        .await
        .unwrap();
    h.gateway.set_verify_status(ChargeStatus::Successful);

    let first = h
        .coordinator
        .verify_payment(confirmation.booking.id)
        .await
        .unwrap();
    assert_eq!(first.payment_status, PaymentStatus::Completed);

    let second = h
        .coordinator
        .verify_payment(confirmation.booking.id)
        .await
        .unwrap();
    assert_eq!(second.payment_status, PaymentStatus::Completed);
    assert_eq!(second.updated_at, first.updated_at);
    assert_eq!(h.store.available_inventory(rt.id).await, Some(4));
}

/// With 5 rooms total and 3 booked for a range, re-checking the same range
/// denies 3 and grants 2.
#[tokio::test]
async fn booked_rooms_consume_availability_for_the_range() {
    let h = TestHarness::new();
    let rt = h.seed_room_type("R1", 2, 5).await;

    h.coordinator
        .create_booking(
            &h.guest(),
            h.request(date(2999, 6, 1), date(2999, 6, 5), vec![select(&rt, 3, 3)]),
        )
        .await
        .unwrap();

    let checker = AvailabilityChecker::new(h.store.clone());
    let denied = checker
        .check(rt.id, date(2999, 6, 1), date(2999, 6, 5), 3, 3)
        .await;
    assert!(!denied.available);
    assert_eq!(denied.available_rooms, 2);

    let granted = checker
        .check(rt.id, date(2999, 6, 1), date(2999, 6, 5), 2, 2)
        .await;
    assert!(granted.available);
}

/// A checked-out stay frees inventory on the next read without cancelling
/// the booking, and the sweep does not run twice for it.
#[tokio::test]
async fn read_path_triggers_expired_checkout_sweep() {
    let h = TestHarness::new();
    let rt = h.seed_room_type("Deluxe", 2, 5).await;
    let guest = h.guest();

    // A stay already in the past, reserved inventory still held.
    let booking = Booking::pending(
        guest.user_id,
        HotelId::new(),
        StayRange::new(date(2020, 1, 1), date(2020, 1, 5)).unwrap(),
        Money::from_minor(10_000),
        Currency::default(),
        "tx-past",
        Utc::now() - Duration::days(30),
    );
    h.store.insert_booking(&booking).await.unwrap();
    h.store
        .insert_line_item(&BookingRoomType::new(booking.id, rt.id, 2, 2))
        .await
        .unwrap();
    h.store.decrease_available_inventory(rt.id, 2).await.unwrap();

    let listed = h.coordinator.get_user_bookings(guest.user_id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(!listed[0].cancelled);

    assert_eq!(h.store.available_inventory(rt.id).await, Some(5));
    let swept = h.store.find_booking(booking.id).await.unwrap().unwrap();
    assert!(swept.inventory_released());

    // A second read pass finds nothing left to free.
    h.coordinator.get_user_bookings(guest.user_id).await.unwrap();
    assert_eq!(h.store.available_inventory(rt.id).await, Some(5));
}

/// Cancelling after a sweep already freed the rooms must not free them
/// again.
#[tokio::test]
async fn cancel_after_sweep_does_not_double_free() {
    let h = TestHarness::new();
    let rt = h.seed_room_type("Deluxe", 2, 5).await;
    let guest = h.guest();

    let booking = Booking::pending(
        guest.user_id,
        HotelId::new(),
        StayRange::new(date(2020, 1, 1), date(2020, 1, 5)).unwrap(),
        Money::from_minor(10_000),
        Currency::default(),
        "tx-past",
        Utc::now() - Duration::days(30),
    );
    h.store.insert_booking(&booking).await.unwrap();
    h.store
        .insert_line_item(&BookingRoomType::new(booking.id, rt.id, 2, 2))
        .await
        .unwrap();
    h.store.decrease_available_inventory(rt.id, 2).await.unwrap();

    let sweeper = Sweeper::new(h.store.clone());
    assert_eq!(sweeper.release_expired_checkouts().await, 1);
    assert_eq!(h.store.available_inventory(rt.id).await, Some(5));

    // The booking is pending and old, so the cancel path's own pending
    // sweep claims it first; either way the rooms must not come back twice.
    let result = h.coordinator.cancel_booking(booking.id, "late cancel").await;
    match result {
        Ok(cancelled) => assert!(cancelled.cancelled),
        Err(BookingError::AlreadyCancelled(_)) => {}
        Err(other) => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.store.available_inventory(rt.id).await, Some(5));
}

/// Line items are processed in caller order and the failure names the room
/// type that broke.
#[tokio::test]
async fn failure_error_names_the_failing_room_type() {
    let h = TestHarness::new();
    let a = h.seed_room_type("A", 2, 5).await;
    let b = h.seed_room_type("B", 2, 5).await;
    h.store.fail_decrease_for(b.id).await;

    let err = h
        .coordinator
        .create_booking(
            &h.guest(),
            h.request(
                date(2999, 6, 1),
                date(2999, 6, 5),
                vec![select(&a, 1, 1), select(&b, 1, 1)],
            ),
        )
        .await
        .unwrap_err();

    assert!(err.to_string().contains(&b.id.to_string()));
}
