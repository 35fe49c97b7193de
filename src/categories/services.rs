use time::OffsetDateTime;
use tracing::{debug, warn};

use super::{
    repo::CategoryStore,
    repo_types::{
        CategoryFilter, CategoryType, DisplayOrderUpdate, TransactionCategory, PARENT_ID_LEVEL_ONE,
    },
};
use crate::{
    db::generate_id,
    error::{AppError, AppResult},
};

/// Fields of a category about to be created.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub uid: i64,
    pub category_type: CategoryType,
    pub parent_category_id: i64,
    pub name: String,
    pub icon: i64,
    pub color: String,
    pub comment: String,
}

/// Columns a modification is allowed to touch.
#[derive(Debug, Clone)]
pub struct CategoryChanges {
    pub name: String,
    pub icon: i64,
    pub color: String,
    pub comment: String,
    pub hidden: bool,
}

fn check_uid(uid: i64) -> AppResult<()> {
    if uid <= 0 {
        return Err(AppError::UserIdInvalid);
    }
    Ok(())
}

fn check_category_id(category_id: i64) -> AppResult<()> {
    if category_id <= 0 {
        return Err(AppError::TransactionCategoryIdInvalid);
    }
    Ok(())
}

fn check_category_ids(ids: &[i64]) -> AppResult<()> {
    if ids.is_empty() {
        return Err(AppError::InvalidParameter("ids".into()));
    }
    ids.iter().try_for_each(|id| check_category_id(*id))
}

fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

pub async fn get_all_categories_by_uid(
    store: &dyn CategoryStore,
    uid: i64,
    filter: CategoryFilter,
) -> AppResult<Vec<TransactionCategory>> {
    check_uid(uid)?;
    store.list(uid, filter).await
}

pub async fn get_category_by_category_id(
    store: &dyn CategoryStore,
    uid: i64,
    category_id: i64,
) -> AppResult<TransactionCategory> {
    check_uid(uid)?;
    check_category_id(category_id)?;
    store
        .find(uid, category_id)
        .await?
        .ok_or(AppError::TransactionCategoryNotFound)
}

/// Returns the category and its direct children, parent first.
pub async fn get_category_and_sub_categories_by_category_id(
    store: &dyn CategoryStore,
    uid: i64,
    category_id: i64,
) -> AppResult<(TransactionCategory, Vec<TransactionCategory>)> {
    check_uid(uid)?;
    check_category_id(category_id)?;

    let rows = store.find_with_children(uid, category_id).await?;
    let (parents, children): (Vec<_>, Vec<_>) = rows
        .into_iter()
        .partition(|c| c.category_id == category_id);

    match parents.into_iter().next() {
        Some(parent) => Ok((parent, children)),
        None => Err(AppError::TransactionCategoryNotFound),
    }
}

pub async fn get_max_display_order(
    store: &dyn CategoryStore,
    uid: i64,
    category_type: CategoryType,
) -> AppResult<i32> {
    check_uid(uid)?;
    let max = store
        .max_display_order(uid, category_type, PARENT_ID_LEVEL_ONE)
        .await?;
    Ok(max.unwrap_or(0))
}

pub async fn get_max_sub_category_display_order(
    store: &dyn CategoryStore,
    uid: i64,
    category_type: CategoryType,
    parent_category_id: i64,
) -> AppResult<i32> {
    check_uid(uid)?;
    check_category_id(parent_category_id)?;
    let max = store
        .max_display_order(uid, category_type, parent_category_id)
        .await?;
    Ok(max.unwrap_or(0))
}

pub async fn create_category(
    store: &dyn CategoryStore,
    new: NewCategory,
) -> AppResult<TransactionCategory> {
    check_uid(new.uid)?;

    let max_display_order = if new.parent_category_id == PARENT_ID_LEVEL_ONE {
        get_max_display_order(store, new.uid, new.category_type).await?
    } else {
        check_category_id(new.parent_category_id)?;
        let Some(parent) = store.find(new.uid, new.parent_category_id).await? else {
            warn!(uid = new.uid, parent = new.parent_category_id, "parent category not found");
            return Err(AppError::TransactionCategoryParentNotFound);
        };
        if !parent.is_top_level() {
            return Err(AppError::TransactionCategoryParentIsNotTopLevel);
        }
        if parent.category_type != new.category_type {
            return Err(AppError::TransactionCategoryTypeMismatch);
        }
        get_max_sub_category_display_order(
            store,
            new.uid,
            new.category_type,
            new.parent_category_id,
        )
        .await?
    };

    let now = now_unix();
    let category = TransactionCategory {
        category_id: generate_id(),
        uid: new.uid,
        category_type: new.category_type,
        parent_category_id: new.parent_category_id,
        name: new.name,
        icon: new.icon,
        color: new.color,
        comment: new.comment,
        hidden: false,
        display_order: max_display_order + 1,
        deleted: false,
        created_unix_time: now,
        updated_unix_time: now,
        deleted_unix_time: 0,
    };

    store.insert(&category).await?;
    debug!(uid = category.uid, category_id = category.category_id, "category created");
    Ok(category)
}

pub async fn modify_category(
    store: &dyn CategoryStore,
    uid: i64,
    category_id: i64,
    changes: CategoryChanges,
) -> AppResult<TransactionCategory> {
    let mut category = get_category_by_category_id(store, uid, category_id).await?;

    category.name = changes.name;
    category.icon = changes.icon;
    category.color = changes.color;
    category.comment = changes.comment;
    category.hidden = changes.hidden;
    category.updated_unix_time = now_unix();

    if store.update_details(&category).await? < 1 {
        return Err(AppError::TransactionCategoryNotFound);
    }
    Ok(category)
}

pub async fn hide_categories(
    store: &dyn CategoryStore,
    uid: i64,
    ids: &[i64],
    hidden: bool,
) -> AppResult<()> {
    check_uid(uid)?;
    check_category_ids(ids)?;

    if store.set_hidden(uid, ids, hidden, now_unix()).await? < 1 {
        return Err(AppError::TransactionCategoryNotFound);
    }
    Ok(())
}

pub async fn modify_category_display_orders(
    store: &dyn CategoryStore,
    uid: i64,
    orders: &[DisplayOrderUpdate],
) -> AppResult<()> {
    check_uid(uid)?;
    if orders.is_empty() {
        return Err(AppError::InvalidParameter("new_display_orders".into()));
    }
    for order in orders {
        check_category_id(order.category_id)?;
        if order.display_order < 1 {
            return Err(AppError::InvalidParameter("display_order".into()));
        }
    }
    store.update_display_orders(uid, orders, now_unix()).await
}

/// Soft deletes `ids` and their children.
pub async fn delete_categories(store: &dyn CategoryStore, uid: i64, ids: &[i64]) -> AppResult<()> {
    check_uid(uid)?;
    check_category_ids(ids)?;

    if store.soft_delete(uid, ids, now_unix()).await? < 1 {
        return Err(AppError::TransactionCategoryNotFound);
    }
    debug!(uid, count = ids.len(), "categories deleted");
    Ok(())
}
