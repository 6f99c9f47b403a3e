//! # Catalog Repository
//!
//! Database operations for catalog items.
//!
//! ## Ownership Boundary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Who Owns Catalog Rows?                               │
//! │                                                                         │
//! │  The catalog is owned by the shop's product management flow. The        │
//! │  rental engine is a READER:                                             │
//! │                                                                         │
//! │    • tier prices      → snapshotted into contracts at booking           │
//! │    • sale price       → snapshotted into extras at attach               │
//! │    • spare quantity   → short-circuits the availability scan            │
//! │                                                                         │
//! │  insert() and set_available_quantity() exist for seeding and for        │
//! │  whatever admin surface fronts this store - rental operations never     │
//! │  call them.                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use velorent_core::CatalogItem;

/// Repository for catalog item database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = CatalogRepository::new(pool);
///
/// let item = repo.get_by_id("uuid-here").await?;
/// let bikes = repo.list_rentable().await?;
/// ```
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Gets a catalog item by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(CatalogItem))` - Item found
    /// * `Ok(None)` - Item not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CatalogItem>> {
        let item = sqlx::query_as::<_, CatalogItem>(
            r#"
            SELECT
                id, reference, name, rentable,
                hourly_price_cents, daily_price_cents,
                weekly_price_cents, monthly_price_cents,
                sale_price_cents, available_quantity,
                created_at, updated_at
            FROM catalog_items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Gets a catalog item by its business reference.
    pub async fn get_by_reference(&self, reference: &str) -> DbResult<Option<CatalogItem>> {
        let item = sqlx::query_as::<_, CatalogItem>(
            r#"
            SELECT
                id, reference, name, rentable,
                hourly_price_cents, daily_price_cents,
                weekly_price_cents, monthly_price_cents,
                sale_price_cents, available_quantity,
                created_at, updated_at
            FROM catalog_items
            WHERE reference = ?1
            "#,
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Lists all rentable items, sorted by name.
    pub async fn list_rentable(&self) -> DbResult<Vec<CatalogItem>> {
        let items = sqlx::query_as::<_, CatalogItem>(
            r#"
            SELECT
                id, reference, name, rentable,
                hourly_price_cents, daily_price_cents,
                weekly_price_cents, monthly_price_cents,
                sale_price_cents, available_quantity,
                created_at, updated_at
            FROM catalog_items
            WHERE rentable = 1
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = items.len(), "Listed rentable items");
        Ok(items)
    }

    /// Inserts a new catalog item.
    ///
    /// ## Returns
    /// * `Ok(())` - Inserted
    /// * `Err(DbError::UniqueViolation)` - Reference already exists
    pub async fn insert(&self, item: &CatalogItem) -> DbResult<()> {
        debug!(reference = %item.reference, "Inserting catalog item");

        sqlx::query(
            r#"
            INSERT INTO catalog_items (
                id, reference, name, rentable,
                hourly_price_cents, daily_price_cents,
                weekly_price_cents, monthly_price_cents,
                sale_price_cents, available_quantity,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&item.id)
        .bind(&item.reference)
        .bind(&item.name)
        .bind(item.rentable)
        .bind(item.hourly_price_cents)
        .bind(item.daily_price_cents)
        .bind(item.weekly_price_cents)
        .bind(item.monthly_price_cents)
        .bind(item.sale_price_cents)
        .bind(item.available_quantity)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Reads the spare quantity for an item.
    ///
    /// ## Usage
    /// The availability check reads this first: spare stock short-circuits
    /// the overlap scan entirely.
    pub async fn get_available_quantity(&self, id: &str) -> DbResult<i64> {
        let quantity: Option<i64> =
            sqlx::query_scalar("SELECT available_quantity FROM catalog_items WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        quantity.ok_or_else(|| DbError::not_found("CatalogItem", id))
    }

    /// Sets the spare quantity for an item (admin/seed surface only).
    pub async fn set_available_quantity(&self, id: &str, quantity: i64) -> DbResult<()> {
        debug!(id = %id, quantity = %quantity, "Setting available quantity");

        let now = chrono::Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE catalog_items
            SET available_quantity = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("CatalogItem", id));
        }

        Ok(())
    }

    /// Counts catalog items (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM catalog_items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_item(reference: &str, rentable: bool) -> CatalogItem {
        let now = Utc::now();
        CatalogItem {
            id: Uuid::new_v4().to_string(),
            reference: reference.to_string(),
            name: format!("Item {reference}"),
            rentable,
            hourly_price_cents: 300,
            daily_price_cents: 1500,
            weekly_price_cents: 7000,
            monthly_price_cents: 20000,
            sale_price_cents: 500,
            available_quantity: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.catalog();

        let item = sample_item("BIKE-01", true);
        repo.insert(&item).await.unwrap();

        let fetched = repo.get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(fetched.reference, "BIKE-01");
        assert_eq!(fetched.daily_price_cents, 1500);
        assert!(fetched.rentable);

        let by_ref = repo.get_by_reference("BIKE-01").await.unwrap().unwrap();
        assert_eq!(by_ref.id, item.id);
    }

    #[tokio::test]
    async fn test_duplicate_reference_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.catalog();

        repo.insert(&sample_item("BIKE-01", true)).await.unwrap();
        let err = repo.insert(&sample_item("BIKE-01", true)).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_list_rentable_excludes_accessories() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.catalog();

        repo.insert(&sample_item("BIKE-01", true)).await.unwrap();
        repo.insert(&sample_item("HELMET-01", false)).await.unwrap();

        let rentable = repo.list_rentable().await.unwrap();
        assert_eq!(rentable.len(), 1);
        assert_eq!(rentable[0].reference, "BIKE-01");
    }

    #[tokio::test]
    async fn test_available_quantity_roundtrip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.catalog();

        let item = sample_item("BIKE-01", true);
        repo.insert(&item).await.unwrap();

        assert_eq!(repo.get_available_quantity(&item.id).await.unwrap(), 1);

        repo.set_available_quantity(&item.id, 4).await.unwrap();
        assert_eq!(repo.get_available_quantity(&item.id).await.unwrap(), 4);

        let missing = repo.get_available_quantity("nope").await.unwrap_err();
        assert!(matches!(missing, DbError::NotFound { .. }));
    }
}
