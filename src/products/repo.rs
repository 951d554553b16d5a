use sqlx::SqlitePool;

use super::{dto::NewProduct, error::ProductError, repo_types::Product};
use crate::db::is_unique_violation;

impl Product {
    /// Insert a product; `product_id` collisions report `Conflict`.
    pub async fn create(db: &SqlitePool, new: &NewProduct) -> Result<i64, ProductError> {
        let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM products WHERE product_id = ?")
            .bind(new.product_id)
            .fetch_optional(db)
            .await?;
        if existing.is_some() {
            return Err(ProductError::Conflict);
        }

        let done = sqlx::query(
            r#"
            INSERT INTO products (product_id, name, stock)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(new.product_id)
        .bind(&new.name)
        .bind(new.stock)
        .execute(db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ProductError::Conflict
            } else {
                ProductError::Storage(e)
            }
        })?;
        Ok(done.last_insert_rowid())
    }

    pub async fn list(db: &SqlitePool, limit: i64, offset: i64) -> Result<Vec<Product>, ProductError> {
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, product_id, name, stock
            FROM products
            ORDER BY id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn widget(product_id: i64) -> NewProduct {
        NewProduct {
            product_id,
            name: format!("widget-{product_id}"),
            stock: 5,
        }
    }

    #[tokio::test]
    async fn duplicate_product_id_conflicts() {
        let db = test_pool().await;
        Product::create(&db, &widget(42)).await.unwrap();
        let err = Product::create(&db, &widget(42)).await.unwrap_err();
        assert!(matches!(err, ProductError::Conflict));
        assert_eq!(Product::list(&db, 10, 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_pages_in_insertion_order() {
        let db = test_pool().await;
        for id in 1..=5 {
            Product::create(&db, &widget(id)).await.unwrap();
        }
        let page: Vec<i64> = Product::list(&db, 2, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.product_id)
            .collect();
        assert_eq!(page, vec![3, 4]);
        assert!(Product::list(&db, 10, 10).await.unwrap().is_empty());
    }
}
