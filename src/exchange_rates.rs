//! Exchange rates data source selection.
//!
//! The source is picked from configuration once at start-up and shared
//! through [`crate::state::AppState`].

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::{
    auth::extractors::NormalAuth,
    config::AppConfig,
    error::{AppError, AppResult},
    state::AppState,
};

pub const EURO_CENTRAL_BANK_DATA_SOURCE: &str = "euro_central_bank";

pub trait ExchangeRatesDataSource: Send + Sync {
    /// Configuration name of the source.
    fn name(&self) -> &'static str;
    fn base_currency(&self) -> &'static str;
    fn reference_url(&self) -> &'static str;
}

pub struct EuroCentralBankDataSource;

impl ExchangeRatesDataSource for EuroCentralBankDataSource {
    fn name(&self) -> &'static str {
        EURO_CENTRAL_BANK_DATA_SOURCE
    }

    fn base_currency(&self) -> &'static str {
        "EUR"
    }

    fn reference_url(&self) -> &'static str {
        "https://www.ecb.europa.eu/stats/eurofxref/eurofxref-daily.xml"
    }
}

pub fn from_config(config: &AppConfig) -> AppResult<Arc<dyn ExchangeRatesDataSource>> {
    match config.exchange_rates_data_source.as_str() {
        EURO_CENTRAL_BANK_DATA_SOURCE => Ok(Arc::new(EuroCentralBankDataSource)),
        _ => Err(AppError::InvalidExchangeRatesDataSource),
    }
}

#[derive(Debug, Serialize)]
pub struct DataSourceResponse {
    pub data_source: &'static str,
    pub base_currency: &'static str,
    pub reference_url: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/exchange_rates/source", get(get_data_source))
}

async fn get_data_source(
    State(state): State<AppState>,
    NormalAuth(_claims): NormalAuth,
) -> Json<DataSourceResponse> {
    let source = &state.exchange_rates;
    Json(DataSourceResponse {
        data_source: source.name(),
        base_currency: source.base_currency(),
        reference_url: source.reference_url(),
    })
}
