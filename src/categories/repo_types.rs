use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

/// Parent id of top level categories.
pub const PARENT_ID_LEVEL_ONE: i64 = 0;

#[derive(Debug, Error)]
#[error("unknown transaction category type {0}")]
pub struct UnknownCategoryType(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CategoryType {
    Income,
    Expense,
    Transfer,
}

impl TryFrom<u8> for CategoryType {
    type Error = UnknownCategoryType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(CategoryType::Income),
            2 => Ok(CategoryType::Expense),
            3 => Ok(CategoryType::Transfer),
            other => Err(UnknownCategoryType(other.into())),
        }
    }
}

impl TryFrom<i16> for CategoryType {
    type Error = UnknownCategoryType;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| UnknownCategoryType(value.into()))
            .and_then(CategoryType::try_from)
    }
}

impl From<CategoryType> for u8 {
    fn from(value: CategoryType) -> Self {
        match value {
            CategoryType::Income => 1,
            CategoryType::Expense => 2,
            CategoryType::Transfer => 3,
        }
    }
}

impl From<CategoryType> for i16 {
    fn from(value: CategoryType) -> Self {
        u8::from(value).into()
    }
}

/// Transaction category record in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct TransactionCategory {
    pub category_id: i64,
    pub uid: i64,
    #[sqlx(try_from = "i16")]
    pub category_type: CategoryType,
    pub parent_category_id: i64,
    pub name: String,
    pub icon: i64,
    pub color: String,
    pub comment: String,
    pub hidden: bool,
    pub display_order: i32,
    pub deleted: bool,
    pub created_unix_time: i64,
    pub updated_unix_time: i64,
    pub deleted_unix_time: i64,
}

impl TransactionCategory {
    pub fn is_top_level(&self) -> bool {
        self.parent_category_id == PARENT_ID_LEVEL_ONE
    }
}

/// Optional filters for listing categories.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryFilter {
    pub category_type: Option<CategoryType>,
    pub parent_category_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DisplayOrderUpdate {
    pub category_id: i64,
    pub display_order: i32,
}
