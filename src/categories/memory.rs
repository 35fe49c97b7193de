use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    repo::CategoryStore,
    repo_types::{CategoryFilter, CategoryType, DisplayOrderUpdate, TransactionCategory},
};
use crate::error::AppResult;

/// In-memory [`CategoryStore`] used by tests.
#[derive(Default)]
pub struct MemoryCategoryStore {
    rows: RwLock<Vec<TransactionCategory>>,
}

impl MemoryCategoryStore {
    /// Every row including soft deleted ones.
    pub async fn all_rows(&self) -> Vec<TransactionCategory> {
        self.rows.read().await.clone()
    }
}

fn sort_rows(rows: &mut [TransactionCategory]) {
    rows.sort_by_key(|c| (c.category_type, c.parent_category_id, c.display_order));
}

#[async_trait]
impl CategoryStore for MemoryCategoryStore {
    async fn list(&self, uid: i64, filter: CategoryFilter) -> AppResult<Vec<TransactionCategory>> {
        let mut rows: Vec<_> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|c| c.uid == uid && !c.deleted)
            .filter(|c| filter.category_type.map_or(true, |t| c.category_type == t))
            .filter(|c| {
                filter
                    .parent_category_id
                    .map_or(true, |p| c.parent_category_id == p)
            })
            .cloned()
            .collect();
        sort_rows(&mut rows);
        Ok(rows)
    }

    async fn find(&self, uid: i64, category_id: i64) -> AppResult<Option<TransactionCategory>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|c| c.uid == uid && !c.deleted && c.category_id == category_id)
            .cloned())
    }

    async fn find_with_children(
        &self,
        uid: i64,
        category_id: i64,
    ) -> AppResult<Vec<TransactionCategory>> {
        let mut rows: Vec<_> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|c| c.uid == uid && !c.deleted)
            .filter(|c| c.category_id == category_id || c.parent_category_id == category_id)
            .cloned()
            .collect();
        sort_rows(&mut rows);
        Ok(rows)
    }

    async fn max_display_order(
        &self,
        uid: i64,
        category_type: CategoryType,
        parent_category_id: i64,
    ) -> AppResult<Option<i32>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|c| c.uid == uid && !c.deleted)
            .filter(|c| c.category_type == category_type)
            .filter(|c| c.parent_category_id == parent_category_id)
            .map(|c| c.display_order)
            .max())
    }

    async fn insert(&self, category: &TransactionCategory) -> AppResult<()> {
        self.rows.write().await.push(category.clone());
        Ok(())
    }

    async fn update_details(&self, category: &TransactionCategory) -> AppResult<u64> {
        let mut rows = self.rows.write().await;
        let Some(row) = rows.iter_mut().find(|c| {
            c.uid == category.uid && !c.deleted && c.category_id == category.category_id
        }) else {
            return Ok(0);
        };
        row.name = category.name.clone();
        row.icon = category.icon;
        row.color = category.color.clone();
        row.comment = category.comment.clone();
        row.hidden = category.hidden;
        row.updated_unix_time = category.updated_unix_time;
        Ok(1)
    }

    async fn update_display_orders(
        &self,
        uid: i64,
        orders: &[DisplayOrderUpdate],
        updated_unix_time: i64,
    ) -> AppResult<()> {
        let mut rows = self.rows.write().await;
        for order in orders {
            if let Some(row) = rows
                .iter_mut()
                .find(|c| c.uid == uid && !c.deleted && c.category_id == order.category_id)
            {
                row.display_order = order.display_order;
                row.updated_unix_time = updated_unix_time;
            }
        }
        Ok(())
    }

    async fn set_hidden(
        &self,
        uid: i64,
        ids: &[i64],
        hidden: bool,
        updated_unix_time: i64,
    ) -> AppResult<u64> {
        let mut affected = 0;
        for row in self.rows.write().await.iter_mut() {
            if row.uid == uid && !row.deleted && ids.contains(&row.category_id) {
                row.hidden = hidden;
                row.updated_unix_time = updated_unix_time;
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn soft_delete(&self, uid: i64, ids: &[i64], deleted_unix_time: i64) -> AppResult<u64> {
        let mut rows = self.rows.write().await;
        let live = |c: &TransactionCategory| c.uid == uid && !c.deleted;

        if !rows.iter().any(|c| live(c) && ids.contains(&c.category_id)) {
            return Ok(0);
        }

        let mut deleted = 0;
        for row in rows.iter_mut() {
            if live(&*row) && ids.contains(&row.category_id) {
                row.deleted = true;
                row.deleted_unix_time = deleted_unix_time;
                deleted += 1;
            }
        }
        for row in rows.iter_mut() {
            if live(&*row) && ids.contains(&row.parent_category_id) {
                row.deleted = true;
                row.deleted_unix_time = deleted_unix_time;
            }
        }
        Ok(deleted)
    }
}
