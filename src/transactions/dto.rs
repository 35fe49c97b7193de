use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    datetime::{
        format_timezone_offset, format_unix_time_to_long_date_time_without_second,
        format_unix_time_to_year_month, get_max_transaction_time_from_unix_time,
        get_min_transaction_time_from_unix_time, get_unix_time_from_transaction_time,
        parse_from_long_date_time, parse_from_short_date_time, parse_timezone_offset,
    },
    error::{AppError, AppResult},
};

/// Either `time` (packed transaction time) or `datetime` (wall clock at
/// `utc_offset`, `2021-04-01 06:01:23` or `2021-4-1 6:1:23`) is required.
#[derive(Debug, Deserialize)]
pub struct EditableQuery {
    pub time: Option<i64>,
    pub datetime: Option<String>,
    pub utc_offset: String,
}

impl EditableQuery {
    /// Returns the transaction time and the caller offset in minutes.
    pub fn resolve(&self) -> AppResult<(i64, i16)> {
        // an unescaped `+` in a query string decodes to a space
        let offset = match self.utc_offset.strip_prefix(' ') {
            Some(rest) => format!("+{rest}"),
            None => self.utc_offset.clone(),
        };
        let utc_offset = parse_timezone_offset(&offset)?;

        let transaction_time = match (self.time, self.datetime.as_deref()) {
            (Some(time), _) => time,
            (None, Some(datetime)) => {
                let local = parse_from_long_date_time(datetime, utc_offset)
                    .or_else(|_| parse_from_short_date_time(datetime, utc_offset))?;
                get_min_transaction_time_from_unix_time(local.unix_timestamp())
            }
            (None, None) => return Err(AppError::InvalidParameter("time".into())),
        };
        let unix_time = get_unix_time_from_transaction_time(transaction_time);
        if transaction_time <= 0 || OffsetDateTime::from_unix_timestamp(unix_time).is_err() {
            return Err(AppError::InvalidParameter("time".into()));
        }

        Ok((transaction_time, utc_offset))
    }
}

#[derive(Debug, Serialize)]
pub struct EditableResponse {
    pub editable: bool,
    pub unix_time: i64,
    pub min_time: i64,
    pub max_time: i64,
    pub local_time: String,
    pub local_month: String,
    pub utc_offset: String,
}

impl EditableResponse {
    pub fn new(transaction_time: i64, utc_offset: i16, editable: bool) -> AppResult<Self> {
        let unix_time = get_unix_time_from_transaction_time(transaction_time);
        Ok(Self {
            editable,
            unix_time,
            min_time: get_min_transaction_time_from_unix_time(unix_time),
            max_time: get_max_transaction_time_from_unix_time(unix_time),
            local_time: format_unix_time_to_long_date_time_without_second(unix_time, utc_offset)?,
            local_month: format_unix_time_to_year_month(unix_time, utc_offset)?,
            utc_offset: format_timezone_offset(utc_offset),
        })
    }
}
