use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub two_factor_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub exchange_rates_data_source: String,
}

fn env_minutes(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "bookkeeping".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "bookkeeping-users".into()),
            ttl_minutes: env_minutes("JWT_TTL_MINUTES", 60 * 24 * 30),
            two_factor_ttl_minutes: env_minutes("JWT_TWO_FACTOR_TTL_MINUTES", 5),
        };
        let exchange_rates_data_source = std::env::var("EXCHANGE_RATES_DATA_SOURCE")
            .unwrap_or_else(|_| crate::exchange_rates::EURO_CENTRAL_BANK_DATA_SOURCE.into());
        Ok(Self {
            database_url,
            jwt,
            exchange_rates_data_source,
        })
    }
}
