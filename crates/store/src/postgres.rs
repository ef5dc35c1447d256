use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::{BookingId, HotelId, LineItemId, RoomTypeId, UserId};
use domain::{Booking, BookingRoomType, Currency, Money, PaymentStatus, RoomType, StayRange};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::store::BookingStore;

/// PostgreSQL-backed booking store.
#[derive(Clone)]
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    /// Creates a new PostgreSQL booking store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_booking(row: PgRow) -> Result<Booking> {
        let check_in: NaiveDate = row.try_get("check_in_date")?;
        let check_out: NaiveDate = row.try_get("check_out_date")?;
        let stay =
            StayRange::new(check_in, check_out).map_err(|e| StoreError::Decode(e.to_string()))?;

        let status: String = row.try_get("payment_status")?;
        let payment_status: PaymentStatus = status.parse().map_err(StoreError::Decode)?;

        Ok(Booking {
            id: BookingId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            hotel_id: HotelId::from_uuid(row.try_get::<Uuid, _>("hotel_id")?),
            stay,
            total_price: Money::from_minor(row.try_get("total_price_minor")?),
            currency: Currency::new(row.try_get::<String, _>("currency")?),
            payment_status,
            tx_ref: row.try_get("tx_ref")?,
            cancelled: row.try_get("cancelled")?,
            cancelled_at: row.try_get("cancelled_at")?,
            cancellation_reason: row.try_get("cancellation_reason")?,
            inventory_released_at: row.try_get("inventory_released_at")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }

    fn row_to_room_type(row: PgRow) -> Result<RoomType> {
        Ok(RoomType {
            id: RoomTypeId::from_uuid(row.try_get::<Uuid, _>("id")?),
            hotel_id: HotelId::from_uuid(row.try_get::<Uuid, _>("hotel_id")?),
            name: row.try_get("name")?,
            max_occupancy: row.try_get::<i32, _>("max_occupancy")? as u32,
            total_inventory: row.try_get::<i32, _>("total_inventory")? as u32,
            available_inventory: row.try_get::<i32, _>("available_inventory")? as u32,
            bed_count: row.try_get::<i32, _>("bed_count")? as u32,
            size_sqm: row.try_get::<i32, _>("size_sqm")? as u32,
        })
    }

    fn row_to_line_item(row: PgRow) -> Result<BookingRoomType> {
        Ok(BookingRoomType {
            id: LineItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            booking_id: BookingId::from_uuid(row.try_get::<Uuid, _>("booking_id")?),
            room_type_id: RoomTypeId::from_uuid(row.try_get::<Uuid, _>("room_type_id")?),
            num_rooms: row.try_get::<i32, _>("num_rooms")? as u32,
            num_guests: row.try_get::<i32, _>("num_guests")? as u32,
        })
    }
}

const BOOKING_COLUMNS: &str = "id, user_id, hotel_id, check_in_date, check_out_date, \
     total_price_minor, currency, payment_status, tx_ref, cancelled, cancelled_at, \
     cancellation_reason, inventory_released_at, created_at, updated_at";

#[async_trait]
impl BookingStore for PostgresBookingStore {
    #[tracing::instrument(skip(self, room_type), fields(room_type_id = %room_type.id), err)]
    async fn insert_room_type(&self, room_type: &RoomType) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO room_types
                (id, hotel_id, name, max_occupancy, total_inventory, available_inventory,
                 bed_count, size_sqm)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(room_type.id.as_uuid())
        .bind(room_type.hotel_id.as_uuid())
        .bind(&room_type.name)
        .bind(room_type.max_occupancy as i32)
        .bind(room_type.total_inventory as i32)
        .bind(room_type.available_inventory as i32)
        .bind(room_type.bed_count as i32)
        .bind(room_type.size_sqm as i32)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_room_type(&self, id: RoomTypeId) -> Result<Option<RoomType>> {
        let row = sqlx::query(
            r#"
            SELECT id, hotel_id, name, max_occupancy, total_inventory, available_inventory,
                   bed_count, size_sqm
            FROM room_types
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_room_type).transpose()
    }

    #[tracing::instrument(skip(self), err)]
    async fn decrease_available_inventory(&self, id: RoomTypeId, count: u32) -> Result<bool> {
        // Single conditional statement: the balance check and the decrement
        // commit together, so a concurrent reservation cannot slip between
        // them.
        let result = sqlx::query(
            r#"
            UPDATE room_types
            SET available_inventory = available_inventory - $2
            WHERE id = $1 AND available_inventory >= $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(count as i32)
        .execute(&self.pool)
        .await?;

        let decremented = result.rows_affected() > 0;
        if !decremented {
            metrics::counter!("store_inventory_decrements_rejected_total").increment(1);
            tracing::debug!(%id, count, "conditional decrement matched no row");
        }
        Ok(decremented)
    }

    #[tracing::instrument(skip(self), err)]
    async fn increase_available_inventory(&self, id: RoomTypeId, count: u32) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE room_types
            SET available_inventory = LEAST(total_inventory, available_inventory + $2)
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(count as i32)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self, booking), fields(booking_id = %booking.id), err)]
    async fn insert_booking(&self, booking: &Booking) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings
                (id, user_id, hotel_id, check_in_date, check_out_date, total_price_minor,
                 currency, payment_status, tx_ref, cancelled, cancelled_at,
                 cancellation_reason, inventory_released_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(booking.id.as_uuid())
        .bind(booking.user_id.as_uuid())
        .bind(booking.hotel_id.as_uuid())
        .bind(booking.stay.check_in())
        .bind(booking.stay.check_out())
        .bind(booking.total_price.minor_units())
        .bind(booking.currency.as_str())
        .bind(booking.payment_status.as_str())
        .bind(&booking.tx_ref)
        .bind(booking.cancelled)
        .bind(booking.cancelled_at)
        .bind(&booking.cancellation_reason)
        .bind(booking.inventory_released_at)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), err)]
    async fn delete_booking(&self, id: BookingId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_booking(&self, id: BookingId) -> Result<Option<Booking>> {
        let row = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_booking).transpose()
    }

    async fn find_booking_by_tx_ref(&self, tx_ref: &str) -> Result<Option<Booking>> {
        let row = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE tx_ref = $1"
        ))
        .bind(tx_ref)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_booking).transpose()
    }

    async fn find_bookings_for_user(&self, user_id: UserId) -> Result<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }

    #[tracing::instrument(skip(self), err)]
    async fn update_payment_status(
        &self,
        id: BookingId,
        status: PaymentStatus,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE bookings SET payment_status = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), err)]
    async fn update_stay(
        &self,
        id: BookingId,
        stay: StayRange,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE bookings SET check_in_date = $2, check_out_date = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(stay.check_in())
        .bind(stay.check_out())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self, reason), err)]
    async fn claim_cancellation(
        &self,
        id: BookingId,
        reason: &str,
        new_payment_status: Option<PaymentStatus>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        // Conditional on cancelled = FALSE: at most one caller wins.
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET cancelled = TRUE,
                cancelled_at = $2,
                cancellation_reason = $3,
                payment_status = COALESCE($4, payment_status),
                updated_at = $2
            WHERE id = $1 AND cancelled = FALSE
            "#,
        )
        .bind(id.as_uuid())
        .bind(now)
        .bind(reason)
        .bind(new_payment_status.map(|s| s.as_str()))
        .execute(&self.pool)
        .await?;

        let claimed = result.rows_affected() > 0;
        if !claimed {
            tracing::debug!(%id, "cancellation claim lost, booking already cancelled or missing");
        }
        Ok(claimed)
    }

    #[tracing::instrument(skip(self), err)]
    async fn claim_inventory_release(&self, id: BookingId, now: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET inventory_released_at = $2, updated_at = $2
            WHERE id = $1 AND inventory_released_at IS NULL
            "#,
        )
        .bind(id.as_uuid())
        .bind(now)
        .execute(&self.pool)
        .await?;

        let claimed = result.rows_affected() > 0;
        if !claimed {
            tracing::debug!(%id, "inventory-release claim lost, already released or missing");
        }
        Ok(claimed)
    }

    #[tracing::instrument(skip(self), err)]
    async fn sum_overlapping_rooms(
        &self,
        room_type_id: RoomTypeId,
        stay: &StayRange,
        exclude_booking: Option<BookingId>,
    ) -> Result<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(brt.num_rooms)::BIGINT
            FROM booking_room_types brt
            INNER JOIN bookings b ON brt.booking_id = b.id
            WHERE brt.room_type_id = $1
              AND b.cancelled = FALSE
              AND b.check_in_date <= $2
              AND b.check_out_date >= $3
              AND ($4::UUID IS NULL OR b.id <> $4)
            "#,
        )
        .bind(room_type_id.as_uuid())
        .bind(stay.check_out())
        .bind(stay.check_in())
        .bind(exclude_booking.map(|id| id.as_uuid()))
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    #[tracing::instrument(skip(self), err)]
    async fn find_expired_checkouts(&self, today: NaiveDate) -> Result<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE cancelled = FALSE AND inventory_released_at IS NULL AND check_out_date <= $1"
        ))
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }

    #[tracing::instrument(skip(self), err)]
    async fn find_expired_pending(&self, cutoff: DateTime<Utc>) -> Result<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE payment_status = 'pending' AND cancelled = FALSE AND created_at <= $1"
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }

    #[tracing::instrument(skip(self, item), fields(booking_id = %item.booking_id, room_type_id = %item.room_type_id), err)]
    async fn insert_line_item(&self, item: &BookingRoomType) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO booking_room_types (id, booking_id, room_type_id, num_rooms, num_guests)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.booking_id.as_uuid())
        .bind(item.room_type_id.as_uuid())
        .bind(item.num_rooms as i32)
        .bind(item.num_guests as i32)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), err)]
    async fn delete_line_items(&self, booking_id: BookingId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM booking_room_types WHERE booking_id = $1")
            .bind(booking_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn find_line_items(&self, booking_id: BookingId) -> Result<Vec<BookingRoomType>> {
        let rows = sqlx::query(
            r#"
            SELECT id, booking_id, room_type_id, num_rooms, num_guests
            FROM booking_room_types
            WHERE booking_id = $1
            ORDER BY id
            "#,
        )
        .bind(booking_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_line_item).collect()
    }
}
