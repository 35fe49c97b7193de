use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::edit_scope::TransactionEditScope;

pub const WEEKDAY_INVALID: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum WeekDay {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Invalid(u8),
}

impl WeekDay {
    /// Days since Sunday, or the raw value for unrecognized days.
    pub fn number_days_from_sunday(self) -> u8 {
        self.into()
    }
}

impl From<u8> for WeekDay {
    fn from(value: u8) -> Self {
        match value {
            0 => WeekDay::Sunday,
            1 => WeekDay::Monday,
            2 => WeekDay::Tuesday,
            3 => WeekDay::Wednesday,
            4 => WeekDay::Thursday,
            5 => WeekDay::Friday,
            6 => WeekDay::Saturday,
            other => WeekDay::Invalid(other),
        }
    }
}

impl From<WeekDay> for u8 {
    fn from(value: WeekDay) -> Self {
        match value {
            WeekDay::Sunday => 0,
            WeekDay::Monday => 1,
            WeekDay::Tuesday => 2,
            WeekDay::Wednesday => 3,
            WeekDay::Thursday => 4,
            WeekDay::Friday => 5,
            WeekDay::Saturday => 6,
            WeekDay::Invalid(other) => other,
        }
    }
}

impl From<i16> for WeekDay {
    fn from(value: i16) -> Self {
        u8::try_from(value).map_or(WeekDay::Invalid(WEEKDAY_INVALID), WeekDay::from)
    }
}

impl From<time::Weekday> for WeekDay {
    fn from(value: time::Weekday) -> Self {
        WeekDay::from(value.number_days_from_sunday())
    }
}

impl fmt::Display for WeekDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekDay::Sunday => f.write_str("Sunday"),
            WeekDay::Monday => f.write_str("Monday"),
            WeekDay::Tuesday => f.write_str("Tuesday"),
            WeekDay::Wednesday => f.write_str("Wednesday"),
            WeekDay::Thursday => f.write_str("Thursday"),
            WeekDay::Friday => f.write_str("Friday"),
            WeekDay::Saturday => f.write_str("Saturday"),
            WeekDay::Invalid(WEEKDAY_INVALID) => f.write_str("Invalid"),
            WeekDay::Invalid(raw) => write!(f, "Invalid({raw})"),
        }
    }
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub uid: i64,
    pub username: String,
    pub email: String,
    pub nickname: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub two_factor_passcode_hash: Option<String>,
    pub default_currency: String,
    #[sqlx(try_from = "i16")]
    pub first_day_of_week: WeekDay,
    #[sqlx(try_from = "i16")]
    pub transaction_edit_scope: TransactionEditScope,
    pub deleted: bool,
    pub email_verified: bool,
    pub created_unix_time: i64,
    pub updated_unix_time: i64,
    pub deleted_unix_time: i64,
    pub last_login_unix_time: i64,
}

impl User {
    pub fn two_factor_enabled(&self) -> bool {
        self.two_factor_passcode_hash.is_some()
    }
}
