use serde::{Deserialize, Serialize};

use super::{
    repo_types::{CategoryType, DisplayOrderUpdate, TransactionCategory},
    services::{CategoryChanges, NewCategory},
};
use crate::error::{AppError, AppResult};

const MAX_NAME_LEN: usize = 32;
const MAX_COLOR_LEN: usize = 6;
const MAX_COMMENT_LEN: usize = 255;

fn check_details(name: &str, color: &str, comment: &str) -> AppResult<()> {
    let name_len = name.trim().chars().count();
    if name_len == 0 || name_len > MAX_NAME_LEN {
        return Err(AppError::InvalidParameter("name".into()));
    }
    if color.len() != MAX_COLOR_LEN || !color.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AppError::InvalidParameter("color".into()));
    }
    if comment.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::InvalidParameter("comment".into()));
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryListQuery {
    #[serde(rename = "type")]
    pub category_type: Option<CategoryType>,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryCreateRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    #[serde(default)]
    pub parent_id: i64,
    pub icon: i64,
    pub color: String,
    #[serde(default)]
    pub comment: String,
}

impl CategoryCreateRequest {
    pub fn into_new_category(self, uid: i64) -> AppResult<NewCategory> {
        check_details(&self.name, &self.color, &self.comment)?;
        Ok(NewCategory {
            uid,
            category_type: self.category_type,
            parent_category_id: self.parent_id,
            name: self.name.trim().to_string(),
            icon: self.icon,
            color: self.color.to_ascii_lowercase(),
            comment: self.comment,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CategoryModifyRequest {
    pub name: String,
    pub icon: i64,
    pub color: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub hidden: bool,
}

impl CategoryModifyRequest {
    pub fn into_changes(self) -> AppResult<CategoryChanges> {
        check_details(&self.name, &self.color, &self.comment)?;
        Ok(CategoryChanges {
            name: self.name.trim().to_string(),
            icon: self.icon,
            color: self.color.to_ascii_lowercase(),
            comment: self.comment,
            hidden: self.hidden,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CategoryHideRequest {
    pub ids: Vec<i64>,
    pub hidden: bool,
}

#[derive(Debug, Deserialize)]
pub struct CategoryDisplayOrder {
    pub id: i64,
    pub display_order: i32,
}

#[derive(Debug, Deserialize)]
pub struct CategoryMoveRequest {
    pub new_display_orders: Vec<CategoryDisplayOrder>,
}

impl CategoryMoveRequest {
    pub fn orders(&self) -> Vec<DisplayOrderUpdate> {
        self.new_display_orders
            .iter()
            .map(|o| DisplayOrderUpdate {
                category_id: o.id,
                display_order: o.display_order,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct CategoryDeleteRequest {
    pub ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct CategoryInfoResponse {
    pub id: i64,
    pub name: String,
    pub parent_id: i64,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    pub icon: i64,
    pub color: String,
    pub comment: String,
    pub display_order: i32,
    pub hidden: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_categories: Vec<CategoryInfoResponse>,
}

impl From<TransactionCategory> for CategoryInfoResponse {
    fn from(c: TransactionCategory) -> Self {
        Self {
            id: c.category_id,
            name: c.name,
            parent_id: c.parent_category_id,
            category_type: c.category_type,
            icon: c.icon,
            color: c.color,
            comment: c.comment,
            display_order: c.display_order,
            hidden: c.hidden,
            sub_categories: Vec::new(),
        }
    }
}

/// Nests children under their parents. Rows whose parent is not in the
/// input stay at the top, preserving input order.
pub fn build_category_tree(rows: Vec<TransactionCategory>) -> Vec<CategoryInfoResponse> {
    let (top, children): (Vec<_>, Vec<_>) =
        rows.into_iter().partition(TransactionCategory::is_top_level);

    let mut roots: Vec<CategoryInfoResponse> =
        top.into_iter().map(CategoryInfoResponse::from).collect();
    let mut orphans = Vec::new();

    for child in children {
        match roots.iter_mut().find(|r| r.id == child.parent_category_id) {
            Some(parent) => parent.sub_categories.push(child.into()),
            None => orphans.push(child.into()),
        }
    }

    roots.extend(orphans);
    roots
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub const CATEGORY_CSV_HEADER: &str = "id,type,parent_id,name,icon,color,display_order,hidden,comment";

/// RFC 4180 style output: comma separated, `\n` line ends, and a field is
/// wrapped in double quotes only when it contains a comma, quote, CR or LF,
/// with inner quotes doubled. Only free-text columns can need quoting.
pub fn categories_to_csv(rows: &[TransactionCategory]) -> String {
    let mut out = String::from(CATEGORY_CSV_HEADER);
    out.push('\n');
    for c in rows {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{}\n",
            c.category_id,
            u8::from(c.category_type),
            c.parent_category_id,
            csv_field(&c.name),
            c.icon,
            c.color,
            c.display_order,
            c.hidden,
            csv_field(&c.comment),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, parent: i64, name: &str) -> TransactionCategory {
        TransactionCategory {
            category_id: id,
            uid: 1,
            category_type: CategoryType::Expense,
            parent_category_id: parent,
            name: name.into(),
            icon: 1,
            color: "00ff00".into(),
            comment: String::new(),
            hidden: false,
            display_order: 1,
            deleted: false,
            created_unix_time: 0,
            updated_unix_time: 0,
            deleted_unix_time: 0,
        }
    }

    #[test]
    fn tree_nests_children() {
        let tree = build_category_tree(vec![
            row(1, 0, "Food"),
            row(2, 0, "Car"),
            row(3, 1, "Lunch"),
            row(4, 9, "Stray"),
        ]);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree[0].sub_categories.len(), 1);
        assert_eq!(tree[0].sub_categories[0].name, "Lunch");
        assert_eq!(tree[2].name, "Stray");
    }

    #[test]
    fn csv_escapes_fields() {
        let mut r = row(7, 0, "Food, drinks");
        r.comment = "say \"hi\"".into();
        let csv = categories_to_csv(&[r]);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(CATEGORY_CSV_HEADER));
        assert_eq!(
            lines.next(),
            Some("7,2,0,\"Food, drinks\",1,00ff00,1,false,\"say \"\"hi\"\"\"")
        );
    }

    #[test]
    fn create_request_validation() {
        let req: CategoryCreateRequest = serde_json::from_str(
            r#"{"name":" Food ","type":2,"icon":3,"color":"FFAA00"}"#,
        )
        .unwrap();
        let new = req.into_new_category(5).unwrap();
        assert_eq!(new.name, "Food");
        assert_eq!(new.color, "ffaa00");
        assert_eq!(new.parent_category_id, 0);

        let req: CategoryCreateRequest =
            serde_json::from_str(r#"{"name":"","type":1,"icon":3,"color":"ffaa00"}"#).unwrap();
        assert!(req.into_new_category(5).is_err());

        assert!(serde_json::from_str::<CategoryCreateRequest>(
            r#"{"name":"x","type":9,"icon":3,"color":"ffaa00"}"#
        )
        .is_err());
    }
}
