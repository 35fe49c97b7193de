use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{error, info, instrument};

use super::{
    dto::{
        build_category_tree, categories_to_csv, CategoryCreateRequest, CategoryDeleteRequest,
        CategoryHideRequest, CategoryInfoResponse, CategoryListQuery, CategoryModifyRequest,
        CategoryMoveRequest,
    },
    repo_types::CategoryFilter,
    services,
};
use crate::{
    auth::extractors::{NormalAuth, QueryTokenAuth},
    error::AppResult,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/export.csv", get(export_categories))
        .route("/categories/hide", post(hide_categories))
        .route("/categories/move", post(move_categories))
        .route("/categories/delete", post(delete_categories))
        .route("/categories/:id", get(get_category).put(modify_category))
}

#[instrument(skip(state, claims))]
pub async fn list_categories(
    State(state): State<AppState>,
    NormalAuth(claims): NormalAuth,
    Query(query): Query<CategoryListQuery>,
) -> AppResult<Json<Vec<CategoryInfoResponse>>> {
    let filter = CategoryFilter {
        category_type: query.category_type,
        parent_category_id: query.parent_id,
    };
    let rows =
        services::get_all_categories_by_uid(state.categories.as_ref(), claims.uid()?, filter)
            .await?;

    if query.parent_id.is_some() {
        return Ok(Json(rows.into_iter().map(Into::into).collect()));
    }
    Ok(Json(build_category_tree(rows)))
}

#[instrument(skip(state, claims))]
pub async fn get_category(
    State(state): State<AppState>,
    NormalAuth(claims): NormalAuth,
    Path(id): Path<i64>,
) -> AppResult<Json<CategoryInfoResponse>> {
    let (parent, children) = services::get_category_and_sub_categories_by_category_id(
        state.categories.as_ref(),
        claims.uid()?,
        id,
    )
    .await?;

    let mut resp = CategoryInfoResponse::from(parent);
    resp.sub_categories = children.into_iter().map(Into::into).collect();
    Ok(Json(resp))
}

#[instrument(skip(state, claims, payload))]
pub async fn create_category(
    State(state): State<AppState>,
    NormalAuth(claims): NormalAuth,
    Json(payload): Json<CategoryCreateRequest>,
) -> AppResult<Json<CategoryInfoResponse>> {
    let uid = claims.uid()?;
    let new = payload.into_new_category(uid)?;

    let category = services::create_category(state.categories.as_ref(), new)
        .await
        .map_err(|e| {
            error!(error = %e, uid, "create category failed");
            e
        })?;

    info!(uid, category_id = category.category_id, "category created");
    Ok(Json(category.into()))
}

#[instrument(skip(state, claims, payload))]
pub async fn modify_category(
    State(state): State<AppState>,
    NormalAuth(claims): NormalAuth,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryModifyRequest>,
) -> AppResult<Json<CategoryInfoResponse>> {
    let uid = claims.uid()?;
    let changes = payload.into_changes()?;

    let category = services::modify_category(state.categories.as_ref(), uid, id, changes).await?;

    info!(uid, category_id = id, "category modified");
    Ok(Json(category.into()))
}

#[instrument(skip(state, claims, payload))]
pub async fn hide_categories(
    State(state): State<AppState>,
    NormalAuth(claims): NormalAuth,
    Json(payload): Json<CategoryHideRequest>,
) -> AppResult<Json<Value>> {
    let uid = claims.uid()?;
    services::hide_categories(state.categories.as_ref(), uid, &payload.ids, payload.hidden)
        .await?;

    info!(uid, count = payload.ids.len(), hidden = payload.hidden, "categories hidden state changed");
    Ok(Json(json!({ "ok": true })))
}

#[instrument(skip(state, claims, payload))]
pub async fn move_categories(
    State(state): State<AppState>,
    NormalAuth(claims): NormalAuth,
    Json(payload): Json<CategoryMoveRequest>,
) -> AppResult<Json<Value>> {
    let uid = claims.uid()?;
    services::modify_category_display_orders(state.categories.as_ref(), uid, &payload.orders())
        .await
        .map_err(|e| {
            error!(error = %e, uid, "reorder categories failed");
            e
        })?;

    Ok(Json(json!({ "ok": true })))
}

#[instrument(skip(state, claims, payload))]
pub async fn delete_categories(
    State(state): State<AppState>,
    NormalAuth(claims): NormalAuth,
    Json(payload): Json<CategoryDeleteRequest>,
) -> AppResult<Json<Value>> {
    let uid = claims.uid()?;
    services::delete_categories(state.categories.as_ref(), uid, &payload.ids).await?;

    info!(uid, count = payload.ids.len(), "categories deleted");
    Ok(Json(json!({ "ok": true })))
}

#[instrument(skip(state, claims))]
pub async fn export_categories(
    State(state): State<AppState>,
    QueryTokenAuth(claims): QueryTokenAuth,
) -> AppResult<impl IntoResponse> {
    let rows = services::get_all_categories_by_uid(
        state.categories.as_ref(),
        claims.uid()?,
        CategoryFilter::default(),
    )
    .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"categories.csv\"",
            ),
        ],
        categories_to_csv(&rows),
    ))
}
