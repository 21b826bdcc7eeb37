//! `PostgreSQL` store.
//!
//! # Schema: `casanova`
//!
//! - `customers` - one row per resolved contact per restaurant; partial unique
//!   indexes on `(restaurant_code, primary_email)` and
//!   `(restaurant_code, primary_phone)`, CHECK constraint on
//!   `no_show_count <= total_reservations`
//! - `reservations` - owned by the reservation subsystem; tracking reads rows,
//!   links them to a customer, and moves their status
//!
//! # Migrations
//!
//! Migrations are stored in `crates/tracking/migrations/` and run via:
//! ```bash
//! cargo run -p casanova-cli -- migrate
//! ```

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use casanova_core::{
    CustomerId, NormalizedEmail, NormalizedPhone, ReservationId, ReservationStatus,
    RestaurantCode,
};

use super::{ContactField, CustomerStore, ReservationStore, StoreError, Transition};
use crate::models::{Counter, Customer, NewCustomer, NewReservation, Reservation};

/// Embedded migrations for the `casanova` schema.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const CUSTOMER_COLUMNS: &str = "id, restaurant_code, primary_email, primary_phone, primary_name, \
     total_reservations, no_show_count, last_no_show_date, first_reservation_date, \
     created_at, updated_at";

const RESERVATION_COLUMNS: &str = "id, restaurant_code, customer_name, customer_email, \
     customer_phone, reservation_date, reservation_time, guest_count, special_notes, \
     status::text AS status, customer_id, created_at, updated_at";

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending migrations.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::migrate::MigrateError` if a migration fails.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        MIGRATOR.run(&self.pool).await
    }

    /// Insert a reservation as the reservation subsystem would (seeding, tests).
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the insert fails.
    pub async fn insert_reservation(
        &self,
        restaurant: &RestaurantCode,
        new: NewReservation,
    ) -> Result<Reservation, StoreError> {
        let guest_count = i32::try_from(new.guest_count)
            .map_err(|_| StoreError::Backend(format!("guest count {} too large", new.guest_count)))?;

        let row: ReservationRow = sqlx::query_as(&format!(
            r"
            INSERT INTO casanova.reservations
                (restaurant_code, customer_name, customer_email, customer_phone,
                 reservation_date, reservation_time, guest_count, special_notes, customer_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {RESERVATION_COLUMNS}
            "
        ))
        .bind(restaurant.as_str())
        .bind(&new.customer_name)
        .bind(&new.customer_email)
        .bind(&new.customer_phone)
        .bind(new.reservation_date)
        .bind(&new.reservation_time)
        .bind(guest_count)
        .bind(&new.special_notes)
        .bind(new.customer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;

        row.try_into()
    }
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    restaurant_code: String,
    primary_email: Option<String>,
    primary_phone: Option<String>,
    primary_name: String,
    total_reservations: i32,
    no_show_count: i32,
    last_no_show_date: Option<NaiveDate>,
    first_reservation_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = StoreError;

    fn try_from(r: CustomerRow) -> Result<Self, Self::Error> {
        let primary_email = r
            .primary_email
            .as_deref()
            .map(NormalizedEmail::parse)
            .transpose()
            .map_err(|e| {
                StoreError::DataCorruption(format!("invalid email in database: {e}"))
            })?;
        let primary_phone = r
            .primary_phone
            .as_deref()
            .map(NormalizedPhone::from_e164)
            .transpose()
            .map_err(|e| {
                StoreError::DataCorruption(format!("invalid phone in database: {e}"))
            })?;

        Ok(Self {
            id: CustomerId::from_uuid(r.id),
            restaurant: restaurant_from_db(&r.restaurant_code)?,
            primary_email,
            primary_phone,
            primary_name: r.primary_name,
            total_reservations: counter_from_db("total_reservations", r.total_reservations)?,
            no_show_count: counter_from_db("no_show_count", r.no_show_count)?,
            last_no_show_date: r.last_no_show_date,
            first_reservation_date: r.first_reservation_date,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    restaurant_code: String,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    reservation_date: NaiveDate,
    reservation_time: String,
    guest_count: i32,
    special_notes: String,
    status: String,
    customer_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = StoreError;

    fn try_from(r: ReservationRow) -> Result<Self, Self::Error> {
        let status: ReservationStatus = r
            .status
            .parse()
            .map_err(|e| StoreError::DataCorruption(format!("{e}")))?;

        Ok(Self {
            id: ReservationId::from_uuid(r.id),
            restaurant: restaurant_from_db(&r.restaurant_code)?,
            customer_name: r.customer_name,
            customer_email: r.customer_email,
            customer_phone: r.customer_phone,
            reservation_date: r.reservation_date,
            reservation_time: r.reservation_time,
            guest_count: counter_from_db("guest_count", r.guest_count)?,
            special_notes: r.special_notes,
            status,
            customer_id: r.customer_id.map(CustomerId::from_uuid),
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

fn restaurant_from_db(code: &str) -> Result<RestaurantCode, StoreError> {
    RestaurantCode::new(code)
        .ok_or_else(|| StoreError::DataCorruption("blank restaurant code in database".to_owned()))
}

fn counter_from_db(column: &str, value: i32) -> Result<u32, StoreError> {
    u32::try_from(value)
        .map_err(|_| StoreError::DataCorruption(format!("negative {column} in database: {value}")))
}

/// Map a driver error onto the store taxonomy.
fn classify(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            match db_err.constraint() {
                Some("customers_restaurant_phone_key") => {
                    StoreError::DuplicateContact(ContactField::Phone)
                }
                Some("customers_restaurant_email_key") => {
                    StoreError::DuplicateContact(ContactField::Email)
                }
                _ => StoreError::Backend(err.to_string()),
            }
        }
        sqlx::Error::Database(ref db_err) if db_err.is_check_violation() => {
            if db_err.constraint() == Some("customers_no_show_le_total") {
                StoreError::CounterInvariant
            } else {
                StoreError::Backend(err.to_string())
            }
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::DataCorruption(err.to_string())
        }
        other => StoreError::Backend(other.to_string()),
    }
}

impl PgStore {
    async fn fetch_customer(
        &self,
        sql: &str,
        restaurant: &RestaurantCode,
        key: impl for<'q> sqlx::Encode<'q, sqlx::Postgres> + sqlx::Type<sqlx::Postgres> + Send + 'static,
    ) -> Result<Option<Customer>, StoreError> {
        let row: Option<CustomerRow> = sqlx::query_as(sql)
            .bind(restaurant.as_str())
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;
        row.map(Customer::try_from).transpose()
    }
}

impl CustomerStore for PgStore {
    async fn find_by_email(
        &self,
        restaurant: &RestaurantCode,
        email: &NormalizedEmail,
    ) -> Result<Option<Customer>, StoreError> {
        self.fetch_customer(
            &format!(
                "SELECT {CUSTOMER_COLUMNS} FROM casanova.customers \
                 WHERE restaurant_code = $1 AND primary_email = $2 \
                 ORDER BY created_at, id LIMIT 1"
            ),
            restaurant,
            email.clone(),
        )
        .await
    }

    async fn find_by_phone(
        &self,
        restaurant: &RestaurantCode,
        phone: &NormalizedPhone,
    ) -> Result<Option<Customer>, StoreError> {
        self.fetch_customer(
            &format!(
                "SELECT {CUSTOMER_COLUMNS} FROM casanova.customers \
                 WHERE restaurant_code = $1 AND primary_phone = $2 \
                 ORDER BY created_at, id LIMIT 1"
            ),
            restaurant,
            phone.clone(),
        )
        .await
    }

    async fn get_customer(
        &self,
        restaurant: &RestaurantCode,
        id: CustomerId,
    ) -> Result<Option<Customer>, StoreError> {
        self.fetch_customer(
            &format!(
                "SELECT {CUSTOMER_COLUMNS} FROM casanova.customers \
                 WHERE restaurant_code = $1 AND id = $2"
            ),
            restaurant,
            id,
        )
        .await
    }

    async fn create_customer(
        &self,
        restaurant: &RestaurantCode,
        customer: NewCustomer,
    ) -> Result<Customer, StoreError> {
        let row: CustomerRow = sqlx::query_as(&format!(
            r"
            INSERT INTO casanova.customers
                (restaurant_code, primary_email, primary_phone, primary_name,
                 first_reservation_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(restaurant.as_str())
        .bind(customer.primary_email)
        .bind(customer.primary_phone)
        .bind(customer.primary_name)
        .bind(customer.first_reservation_date)
        .bind(customer.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;

        row.try_into()
    }

    async fn increment(
        &self,
        restaurant: &RestaurantCode,
        id: CustomerId,
        counter: Counter,
        delta: u32,
        at: DateTime<Utc>,
    ) -> Result<Customer, StoreError> {
        let delta = i32::try_from(delta)
            .map_err(|_| StoreError::Backend(format!("{counter} delta {delta} too large")))?;

        // Column names come from a closed enum, never from input
        let set = match counter {
            Counter::TotalReservations => "total_reservations = total_reservations + $3",
            Counter::NoShows => {
                "no_show_count = no_show_count + $3, last_no_show_date = ($4 AT TIME ZONE 'UTC')::date"
            }
        };

        let row: Option<CustomerRow> = sqlx::query_as(&format!(
            r"
            UPDATE casanova.customers
            SET {set}, updated_at = $4
            WHERE restaurant_code = $1 AND id = $2
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(restaurant.as_str())
        .bind(id)
        .bind(delta)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        row.ok_or_else(|| StoreError::NotFound(format!("customer {id}")))?
            .try_into()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(classify)
    }
}

impl ReservationStore for PgStore {
    async fn get_reservation(
        &self,
        restaurant: &RestaurantCode,
        id: ReservationId,
    ) -> Result<Option<Reservation>, StoreError> {
        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM casanova.reservations \
             WHERE restaurant_code = $1 AND id = $2"
        ))
        .bind(restaurant.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        row.map(Reservation::try_from).transpose()
    }

    async fn set_status(
        &self,
        restaurant: &RestaurantCode,
        id: ReservationId,
        status: ReservationStatus,
        at: DateTime<Utc>,
    ) -> Result<Reservation, StoreError> {
        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            r"
            UPDATE casanova.reservations
            SET status = $3::casanova.reservation_status, updated_at = $4
            WHERE restaurant_code = $1 AND id = $2
            RETURNING {RESERVATION_COLUMNS}
            "
        ))
        .bind(restaurant.as_str())
        .bind(id)
        .bind(status.as_str())
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        row.ok_or_else(|| StoreError::NotFound(format!("reservation {id}")))?
            .try_into()
    }

    async fn transition_status(
        &self,
        restaurant: &RestaurantCode,
        id: ReservationId,
        allowed_from: &[ReservationStatus],
        to: ReservationStatus,
        at: DateTime<Utc>,
    ) -> Result<Transition, StoreError> {
        let allowed: Vec<&str> = allowed_from.iter().map(|s| s.as_str()).collect();

        let applied: Option<ReservationRow> = sqlx::query_as(&format!(
            r"
            UPDATE casanova.reservations
            SET status = $3::casanova.reservation_status, updated_at = $4
            WHERE restaurant_code = $1 AND id = $2 AND status::text = ANY($5)
            RETURNING {RESERVATION_COLUMNS}
            "
        ))
        .bind(restaurant.as_str())
        .bind(id)
        .bind(to.as_str())
        .bind(at)
        .bind(allowed)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        if let Some(row) = applied {
            return Ok(Transition::Applied(row.try_into()?));
        }

        // Either unknown or not in an allowed status; tell them apart
        self.get_reservation(restaurant, id)
            .await?
            .map(Transition::Unchanged)
            .ok_or_else(|| StoreError::NotFound(format!("reservation {id}")))
    }

    async fn list_reservations(
        &self,
        restaurant: &RestaurantCode,
    ) -> Result<Vec<Reservation>, StoreError> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM casanova.reservations \
             WHERE restaurant_code = $1 ORDER BY created_at DESC, id"
        ))
        .bind(restaurant.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;

        rows.into_iter().map(Reservation::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_unavailable() {
        assert!(matches!(
            classify(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            classify(sqlx::Error::RowNotFound),
            StoreError::Backend(_)
        ));
    }

    #[test]
    fn test_negative_counter_is_corruption() {
        assert!(matches!(
            counter_from_db("no_show_count", -1),
            Err(StoreError::DataCorruption(_))
        ));
        assert_eq!(counter_from_db("no_show_count", 4).ok(), Some(4));
    }

    #[test]
    fn test_row_with_unnormalized_phone_is_corruption() {
        let now = Utc::now();
        let row = CustomerRow {
            id: Uuid::new_v4(),
            restaurant_code: "CASANOVA2024".to_owned(),
            primary_email: None,
            primary_phone: Some("06 12 34 56 78".to_owned()),
            primary_name: String::new(),
            total_reservations: 1,
            no_show_count: 0,
            last_no_show_date: None,
            first_reservation_date: None,
            created_at: now,
            updated_at: now,
        };
        assert!(matches!(
            Customer::try_from(row),
            Err(StoreError::DataCorruption(_))
        ));
    }
}
