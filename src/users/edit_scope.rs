//! Which transactions a user may still edit.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use super::repo_types::{User, WeekDay};
use crate::datetime::{client_today_start, get_unix_time_from_transaction_time, SECONDS_PER_DAY};

pub const TRANSACTION_EDIT_SCOPE_INVALID: u8 = 255;

/// Largest raw value accepted from clients. One past the last named scope;
/// such values are stored as given and never grant editing.
pub const TRANSACTION_EDIT_SCOPE_MAX_INPUT: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum TransactionEditScope {
    None,
    All,
    TodayOrLater,
    Last24HourOrLater,
    ThisWeekOrLater,
    ThisMonthOrLater,
    ThisYearOrLater,
    Invalid(u8),
}

impl From<u8> for TransactionEditScope {
    fn from(value: u8) -> Self {
        match value {
            0 => TransactionEditScope::None,
            1 => TransactionEditScope::All,
            2 => TransactionEditScope::TodayOrLater,
            3 => TransactionEditScope::Last24HourOrLater,
            4 => TransactionEditScope::ThisWeekOrLater,
            5 => TransactionEditScope::ThisMonthOrLater,
            6 => TransactionEditScope::ThisYearOrLater,
            other => TransactionEditScope::Invalid(other),
        }
    }
}

impl From<TransactionEditScope> for u8 {
    fn from(value: TransactionEditScope) -> Self {
        match value {
            TransactionEditScope::None => 0,
            TransactionEditScope::All => 1,
            TransactionEditScope::TodayOrLater => 2,
            TransactionEditScope::Last24HourOrLater => 3,
            TransactionEditScope::ThisWeekOrLater => 4,
            TransactionEditScope::ThisMonthOrLater => 5,
            TransactionEditScope::ThisYearOrLater => 6,
            TransactionEditScope::Invalid(other) => other,
        }
    }
}

impl From<i16> for TransactionEditScope {
    fn from(value: i16) -> Self {
        u8::try_from(value).map_or(
            TransactionEditScope::Invalid(TRANSACTION_EDIT_SCOPE_INVALID),
            TransactionEditScope::from,
        )
    }
}

impl fmt::Display for TransactionEditScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionEditScope::None => f.write_str("None"),
            TransactionEditScope::All => f.write_str("All"),
            TransactionEditScope::TodayOrLater => f.write_str("TodayOrLater"),
            TransactionEditScope::Last24HourOrLater => f.write_str("Last24HourOrLater"),
            TransactionEditScope::ThisWeekOrLater => f.write_str("ThisWeekOrLater"),
            TransactionEditScope::ThisMonthOrLater => f.write_str("ThisMonthOrLater"),
            TransactionEditScope::ThisYearOrLater => f.write_str("ThisYearOrLater"),
            TransactionEditScope::Invalid(TRANSACTION_EDIT_SCOPE_INVALID) => f.write_str("Invalid"),
            TransactionEditScope::Invalid(raw) => write!(f, "Invalid({raw})"),
        }
    }
}

/// Days between the start of the week and `today`, always in `0..7`.
pub fn days_since_week_start(today: WeekDay, first_day_of_week: WeekDay) -> i64 {
    (i64::from(today.number_days_from_sunday())
        - i64::from(first_day_of_week.number_days_from_sunday()))
    .rem_euclid(7)
}

impl TransactionEditScope {
    /// Decides editability of a transaction at `now`.
    ///
    /// Calendar scopes start at the caller's local midnight; the weekday,
    /// day of month and day of year used to step back are the server's
    /// (UTC). The rolling 24 hour scope ignores the caller offset.
    pub fn can_edit(
        self,
        first_day_of_week: WeekDay,
        transaction_time: i64,
        utc_offset: i16,
        now: OffsetDateTime,
    ) -> bool {
        match self {
            TransactionEditScope::None => return false,
            TransactionEditScope::All => return true,
            _ => {}
        }

        let transaction_unix_time = get_unix_time_from_transaction_time(transaction_time);

        if self == TransactionEditScope::Last24HourOrLater {
            return transaction_unix_time >= now.unix_timestamp() - SECONDS_PER_DAY;
        }

        let Ok(client_today_first_unix_time) = client_today_start(now, utc_offset) else {
            return false;
        };
        let server_now = now.to_offset(UtcOffset::UTC);

        let days_back = match self {
            TransactionEditScope::TodayOrLater => 0,
            TransactionEditScope::ThisWeekOrLater => {
                days_since_week_start(server_now.weekday().into(), first_day_of_week)
            }
            TransactionEditScope::ThisMonthOrLater => i64::from(server_now.day()) - 1,
            TransactionEditScope::ThisYearOrLater => i64::from(server_now.ordinal()) - 1,
            _ => return false,
        };

        transaction_unix_time >= client_today_first_unix_time - days_back * SECONDS_PER_DAY
    }
}

impl User {
    pub fn can_edit_transaction_by_transaction_time(
        &self,
        transaction_time: i64,
        utc_offset: i16,
    ) -> bool {
        self.transaction_edit_scope.can_edit(
            self.first_day_of_week,
            transaction_time,
            utc_offset,
            OffsetDateTime::now_utc(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datetime::get_min_transaction_time_from_unix_time as tx_time;

    // 2021-03-31 22:01:23 UTC, a Wednesday, day 90 of the year.
    const NOW: i64 = 1617228083;
    const UTC_TODAY_START: i64 = 1617148800;

    fn now() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(NOW).unwrap()
    }

    fn can_edit(scope: TransactionEditScope, unix_time: i64, offset: i16) -> bool {
        scope.can_edit(WeekDay::Monday, tx_time(unix_time), offset, now())
    }

    #[test]
    fn none_and_all_ignore_time_and_offset() {
        for unix_time in [0, NOW - 400 * SECONDS_PER_DAY, NOW, NOW + SECONDS_PER_DAY] {
            for offset in [-720, 0, 345, 840] {
                assert!(!can_edit(TransactionEditScope::None, unix_time, offset));
                assert!(can_edit(TransactionEditScope::All, unix_time, offset));
            }
        }
    }

    #[test]
    fn last_24_hours_boundary_is_inclusive() {
        let scope = TransactionEditScope::Last24HourOrLater;
        assert!(can_edit(scope, NOW - SECONDS_PER_DAY, 0));
        assert!(!can_edit(scope, NOW - SECONDS_PER_DAY - 1, 0));
        // the last millisecond of the older second still decodes to it
        assert!(!scope.can_edit(
            WeekDay::Sunday,
            (NOW - SECONDS_PER_DAY - 1) * 1000 + 999,
            0,
            now()
        ));
    }

    #[test]
    fn last_24_hours_ignores_caller_offset() {
        let scope = TransactionEditScope::Last24HourOrLater;
        for offset in [-720, 0, 480, 840] {
            assert!(can_edit(scope, NOW - SECONDS_PER_DAY, offset));
            assert!(!can_edit(scope, NOW - SECONDS_PER_DAY - 1, offset));
        }
    }

    #[test]
    fn today_follows_client_midnight() {
        let scope = TransactionEditScope::TodayOrLater;
        assert!(can_edit(scope, UTC_TODAY_START, 0));
        assert!(!can_edit(scope, UTC_TODAY_START - 1, 0));

        // At UTC+8 it is already 2021-04-01 06:01 for the caller.
        let utc8_today_start = 1617206400;
        assert!(!can_edit(scope, UTC_TODAY_START, 480));
        assert!(can_edit(scope, utc8_today_start, 480));
        assert!(!can_edit(scope, utc8_today_start - 1, 480));
    }

    #[test]
    fn week_start_for_monday_on_wednesday_is_two_days_back() {
        assert_eq!(days_since_week_start(WeekDay::Wednesday, WeekDay::Monday), 2);
        assert_eq!(days_since_week_start(WeekDay::Wednesday, WeekDay::Thursday), 6);
        assert_eq!(days_since_week_start(WeekDay::Sunday, WeekDay::Sunday), 0);

        let scope = TransactionEditScope::ThisWeekOrLater;
        let monday = UTC_TODAY_START - 2 * SECONDS_PER_DAY;
        assert!(can_edit(scope, monday, 0));
        assert!(!can_edit(scope, monday - 1, 0));

        let sunday_start = UTC_TODAY_START - 3 * SECONDS_PER_DAY;
        assert!(scope.can_edit(WeekDay::Sunday, tx_time(sunday_start), 0, now()));
        assert!(!scope.can_edit(WeekDay::Sunday, tx_time(sunday_start - 1), 0, now()));
    }

    #[test]
    fn month_and_year_start() {
        let march_first = 1614556800;
        assert!(can_edit(TransactionEditScope::ThisMonthOrLater, march_first, 0));
        assert!(!can_edit(TransactionEditScope::ThisMonthOrLater, march_first - 1, 0));

        let january_first = 1609459200;
        assert!(can_edit(TransactionEditScope::ThisYearOrLater, january_first, 0));
        assert!(!can_edit(TransactionEditScope::ThisYearOrLater, january_first - 1, 0));
    }

    #[test]
    fn unrecognized_scopes_fail_closed() {
        for raw in [TRANSACTION_EDIT_SCOPE_MAX_INPUT, 42, TRANSACTION_EDIT_SCOPE_INVALID] {
            let scope = TransactionEditScope::from(raw);
            assert!(!can_edit(scope, NOW, 0));
            assert!(!can_edit(scope, NOW + SECONDS_PER_DAY, 0));
        }
    }

    #[test]
    fn calendar_scopes_are_monotonic_in_transaction_time() {
        let scopes = [
            TransactionEditScope::TodayOrLater,
            TransactionEditScope::ThisWeekOrLater,
            TransactionEditScope::ThisMonthOrLater,
            TransactionEditScope::ThisYearOrLater,
        ];
        for scope in scopes {
            for offset in [-720, -300, 0, 345, 840] {
                let mut seen_editable = false;
                let mut t = NOW - 400 * SECONDS_PER_DAY;
                while t <= NOW + SECONDS_PER_DAY {
                    let editable = can_edit(scope, t, offset);
                    assert!(!seen_editable || editable, "{scope} at {t} offset {offset}");
                    seen_editable |= editable;
                    t += 3600;
                }
                assert!(seen_editable, "{scope} never editable at offset {offset}");
            }
        }
    }

    #[test]
    fn scope_rendering() {
        assert_eq!(TransactionEditScope::Last24HourOrLater.to_string(), "Last24HourOrLater");
        assert_eq!(TransactionEditScope::from(255u8).to_string(), "Invalid");
        assert_eq!(TransactionEditScope::from(7u8).to_string(), "Invalid(7)");
        assert_eq!(u8::from(TransactionEditScope::from(7u8)), 7);
        assert_eq!(TransactionEditScope::from(300i16), TransactionEditScope::Invalid(255));
    }
}
