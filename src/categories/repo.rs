use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::repo_types::{CategoryFilter, CategoryType, DisplayOrderUpdate, TransactionCategory};
use crate::error::AppResult;

const CATEGORY_COLUMNS: &str = "category_id, uid, category_type, parent_category_id, name, \
     icon, color, comment, hidden, display_order, deleted, created_unix_time, \
     updated_unix_time, deleted_unix_time";

const CATEGORY_ORDER: &str = " ORDER BY category_type ASC, parent_category_id ASC, display_order ASC";

/// Persistence for transaction categories. Every read skips soft deleted
/// rows and every write is scoped to `uid`.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn list(&self, uid: i64, filter: CategoryFilter) -> AppResult<Vec<TransactionCategory>>;

    async fn find(&self, uid: i64, category_id: i64) -> AppResult<Option<TransactionCategory>>;

    /// The category plus its direct children.
    async fn find_with_children(
        &self,
        uid: i64,
        category_id: i64,
    ) -> AppResult<Vec<TransactionCategory>>;

    async fn max_display_order(
        &self,
        uid: i64,
        category_type: CategoryType,
        parent_category_id: i64,
    ) -> AppResult<Option<i32>>;

    async fn insert(&self, category: &TransactionCategory) -> AppResult<()>;

    /// Writes name, icon, color, comment, hidden and the update time.
    async fn update_details(&self, category: &TransactionCategory) -> AppResult<u64>;

    async fn update_display_orders(
        &self,
        uid: i64,
        orders: &[DisplayOrderUpdate],
        updated_unix_time: i64,
    ) -> AppResult<()>;

    async fn set_hidden(
        &self,
        uid: i64,
        ids: &[i64],
        hidden: bool,
        updated_unix_time: i64,
    ) -> AppResult<u64>;

    /// Soft deletes `ids` and then every child of them, in one unit of work.
    /// Returns the rows hit by the first step; zero means nothing changed.
    async fn soft_delete(&self, uid: i64, ids: &[i64], deleted_unix_time: i64) -> AppResult<u64>;
}

#[derive(Clone)]
pub struct PgCategoryStore {
    db: PgPool,
}

impl PgCategoryStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CategoryStore for PgCategoryStore {
    async fn list(&self, uid: i64, filter: CategoryFilter) -> AppResult<Vec<TransactionCategory>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {CATEGORY_COLUMNS} FROM transaction_categories WHERE uid = "
        ));
        qb.push_bind(uid).push(" AND deleted = FALSE");
        if let Some(category_type) = filter.category_type {
            qb.push(" AND category_type = ")
                .push_bind(i16::from(category_type));
        }
        if let Some(parent_category_id) = filter.parent_category_id {
            qb.push(" AND parent_category_id = ")
                .push_bind(parent_category_id);
        }
        qb.push(CATEGORY_ORDER);

        let rows = qb
            .build_query_as::<TransactionCategory>()
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn find(&self, uid: i64, category_id: i64) -> AppResult<Option<TransactionCategory>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM transaction_categories \
             WHERE uid = $1 AND deleted = FALSE AND category_id = $2"
        );
        let row = sqlx::query_as::<_, TransactionCategory>(&sql)
            .bind(uid)
            .bind(category_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn find_with_children(
        &self,
        uid: i64,
        category_id: i64,
    ) -> AppResult<Vec<TransactionCategory>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM transaction_categories \
             WHERE uid = $1 AND deleted = FALSE \
               AND (category_id = $2 OR parent_category_id = $2){CATEGORY_ORDER}"
        );
        let rows = sqlx::query_as::<_, TransactionCategory>(&sql)
            .bind(uid)
            .bind(category_id)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn max_display_order(
        &self,
        uid: i64,
        category_type: CategoryType,
        parent_category_id: i64,
    ) -> AppResult<Option<i32>> {
        let max = sqlx::query_scalar::<_, Option<i32>>(
            r#"
            SELECT MAX(display_order)
              FROM transaction_categories
             WHERE uid = $1 AND deleted = FALSE
               AND category_type = $2 AND parent_category_id = $3
            "#,
        )
        .bind(uid)
        .bind(i16::from(category_type))
        .bind(parent_category_id)
        .fetch_one(&self.db)
        .await?;
        Ok(max)
    }

    async fn insert(&self, category: &TransactionCategory) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO transaction_categories
                (category_id, uid, category_type, parent_category_id, name, icon, color,
                 comment, hidden, display_order, deleted, created_unix_time,
                 updated_unix_time, deleted_unix_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(category.category_id)
        .bind(category.uid)
        .bind(i16::from(category.category_type))
        .bind(category.parent_category_id)
        .bind(&category.name)
        .bind(category.icon)
        .bind(&category.color)
        .bind(&category.comment)
        .bind(category.hidden)
        .bind(category.display_order)
        .bind(category.deleted)
        .bind(category.created_unix_time)
        .bind(category.updated_unix_time)
        .bind(category.deleted_unix_time)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_details(&self, category: &TransactionCategory) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE transaction_categories
               SET name = $1, icon = $2, color = $3, comment = $4, hidden = $5,
                   updated_unix_time = $6
             WHERE category_id = $7 AND uid = $8 AND deleted = FALSE
            "#,
        )
        .bind(&category.name)
        .bind(category.icon)
        .bind(&category.color)
        .bind(&category.comment)
        .bind(category.hidden)
        .bind(category.updated_unix_time)
        .bind(category.category_id)
        .bind(category.uid)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected())
    }

    async fn update_display_orders(
        &self,
        uid: i64,
        orders: &[DisplayOrderUpdate],
        updated_unix_time: i64,
    ) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        for order in orders {
            sqlx::query(
                r#"
                UPDATE transaction_categories
                   SET display_order = $1, updated_unix_time = $2
                 WHERE category_id = $3 AND uid = $4 AND deleted = FALSE
                "#,
            )
            .bind(order.display_order)
            .bind(updated_unix_time)
            .bind(order.category_id)
            .bind(uid)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn set_hidden(
        &self,
        uid: i64,
        ids: &[i64],
        hidden: bool,
        updated_unix_time: i64,
    ) -> AppResult<u64> {
        let mut tx = self.db.begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE transaction_categories
               SET hidden = $1, updated_unix_time = $2
             WHERE uid = $3 AND deleted = FALSE AND category_id = ANY($4)
            "#,
        )
        .bind(hidden)
        .bind(updated_unix_time)
        .bind(uid)
        .bind(ids)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn soft_delete(&self, uid: i64, ids: &[i64], deleted_unix_time: i64) -> AppResult<u64> {
        let mut tx = self.db.begin().await?;

        let deleted = sqlx::query(
            r#"
            UPDATE transaction_categories
               SET deleted = TRUE, deleted_unix_time = $1
             WHERE uid = $2 AND deleted = FALSE AND category_id = ANY($3)
            "#,
        )
        .bind(deleted_unix_time)
        .bind(uid)
        .bind(ids)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if deleted < 1 {
            tx.rollback().await?;
            return Ok(0);
        }

        sqlx::query(
            r#"
            UPDATE transaction_categories
               SET deleted = TRUE, deleted_unix_time = $1
             WHERE uid = $2 AND deleted = FALSE AND parent_category_id = ANY($3)
            "#,
        )
        .bind(deleted_unix_time)
        .bind(uid)
        .bind(ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(deleted)
    }
}
