use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::models::{utc_timestamp, Product, ProductFields};

const MAX_CONNECTIONS: u32 = 8;

// ── Connection & schema ───────────────────────────────────────────────────────

/// Opens a pool over the SQLite file at `path`, creating the file if needed.
pub async fn open_pool(path: &str) -> AppResult<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Single-connection in-memory database; every pooled connection would otherwise
/// see its own empty database.
#[cfg(test)]
pub async fn open_in_memory() -> AppResult<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with("sqlite::memory:".parse::<SqliteConnectOptions>()?)
        .await?;
    ensure_schema(&pool).await?;
    Ok(pool)
}

pub async fn ensure_schema(pool: &SqlitePool) -> AppResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            name       TEXT    NOT NULL,
            price      REAL    NOT NULL CHECK (price >= 0),
            stock      INTEGER NOT NULL DEFAULT 0 CHECK (stock >= 0),
            created_at TEXT    NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

// ── Products ──────────────────────────────────────────────────────────────────

pub async fn fetch_all_products(pool: &SqlitePool) -> AppResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT id, name, price, stock, created_at FROM products ORDER BY id DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(products)
}

pub async fn fetch_product_by_id(pool: &SqlitePool, id: i64) -> AppResult<Product> {
    sqlx::query_as::<_, Product>(
        "SELECT id, name, price, stock, created_at FROM products WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| not_found(id))
}

pub async fn insert_product(pool: &SqlitePool, fields: &ProductFields) -> AppResult<Product> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (name, price, stock, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING id, name, price, stock, created_at
        "#,
    )
    .bind(&fields.name)
    .bind(fields.price)
    .bind(fields.stock)
    .bind(utc_timestamp())
    .fetch_one(pool)
    .await?;

    Ok(product)
}

/// Overwrites the writable fields of an existing row. Concurrent writers to the
/// same id are last-write-wins.
pub async fn update_product(
    pool: &SqlitePool,
    id: i64,
    fields: &ProductFields,
) -> AppResult<Product> {
    sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET name  = ?,
            price = ?,
            stock = ?
        WHERE id = ?
        RETURNING id, name, price, stock, created_at
        "#,
    )
    .bind(&fields.name)
    .bind(fields.price)
    .bind(fields.stock)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| not_found(id))
}

pub async fn delete_product(pool: &SqlitePool, id: i64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

pub async fn count_products(pool: &SqlitePool) -> AppResult<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Product {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str, price: f64, stock: i64) -> ProductFields {
        ProductFields { name: name.to_string(), price, stock }
    }

    #[tokio::test]
    async fn insert_then_fetch() {
        let pool = open_in_memory().await.unwrap();
        let created = insert_product(&pool, &fields("Widget", 9.99, 5)).await.unwrap();

        assert_eq!(created.id, 1);
        assert_eq!(created.name, "Widget");
        assert!(created.created_at.ends_with('Z'));

        let fetched = fetch_product_by_id(&pool, created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let pool = open_in_memory().await.unwrap();
        for name in ["A", "B", "C"] {
            insert_product(&pool, &fields(name, 1.0, 1)).await.unwrap();
        }

        let ids: Vec<i64> = fetch_all_products(&pool).await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(count_products(&pool).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn update_keeps_id_and_created_at() {
        let pool = open_in_memory().await.unwrap();
        let created = insert_product(&pool, &fields("Widget", 9.99, 5)).await.unwrap();

        let updated = update_product(&pool, created.id, &fields("Gadget", 1.5, 0)).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.name, "Gadget");
        assert_eq!(updated.price, 1.5);
        assert_eq!(updated.stock, 0);
    }

    #[tokio::test]
    async fn missing_rows_are_not_found() {
        let pool = open_in_memory().await.unwrap();
        assert!(matches!(fetch_product_by_id(&pool, 42).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            update_product(&pool, 42, &fields("X", 1.0, 1)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(delete_product(&pool, 42).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_twice_is_not_found() {
        let pool = open_in_memory().await.unwrap();
        let created = insert_product(&pool, &fields("Widget", 1.0, 1)).await.unwrap();

        delete_product(&pool, created.id).await.unwrap();
        assert!(matches!(delete_product(&pool, created.id).await, Err(AppError::NotFound(_))));
        assert_eq!(count_products(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let pool = open_in_memory().await.unwrap();
        let first = insert_product(&pool, &fields("A", 1.0, 1)).await.unwrap();
        delete_product(&pool, first.id).await.unwrap();

        let second = insert_product(&pool, &fields("B", 1.0, 1)).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn table_rejects_negative_values() {
        let pool = open_in_memory().await.unwrap();
        assert!(matches!(
            insert_product(&pool, &fields("Bad", -1.0, 1)).await,
            Err(AppError::Database(_))
        ));
        assert!(matches!(
            insert_product(&pool, &fields("Bad", 1.0, -1)).await,
            Err(AppError::Database(_))
        ));
    }

    #[tokio::test]
    async fn schema_on_disk_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        let path = path.to_str().unwrap();

        let pool = open_pool(path).await.unwrap();
        ensure_schema(&pool).await.unwrap();
        insert_product(&pool, &fields("Persisted", 2.0, 2)).await.unwrap();
        pool.close().await;

        let pool = open_pool(path).await.unwrap();
        ensure_schema(&pool).await.unwrap();
        assert_eq!(count_products(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn open_pool_fails_for_unreachable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("catalog.db");
        assert!(open_pool(path.to_str().unwrap()).await.is_err());
    }
}
