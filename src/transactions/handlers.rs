use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{EditableQuery, EditableResponse};
use crate::{
    auth::extractors::NormalAuth, error::AppResult, state::AppState,
    users::handlers::current_user,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/transactions/editable", get(check_editable))
}

/// Applies the caller's edit scope to a transaction time.
#[instrument(skip(state, claims))]
pub async fn check_editable(
    State(state): State<AppState>,
    NormalAuth(claims): NormalAuth,
    Query(query): Query<EditableQuery>,
) -> AppResult<Json<EditableResponse>> {
    let (transaction_time, utc_offset) = query.resolve()?;
    let user = current_user(&state, claims.uid()?).await?;

    let editable = user.can_edit_transaction_by_transaction_time(transaction_time, utc_offset);
    if !editable {
        info!(
            uid = user.uid,
            scope = %user.transaction_edit_scope,
            "transaction is outside the edit scope"
        );
    }

    Ok(Json(EditableResponse::new(transaction_time, utc_offset, editable)?))
}
