//! Unix time, transaction time and fixed UTC offset helpers.
//!
//! Offsets are always caller supplied minutes east of UTC; nothing here reads
//! the host time zone.

use lazy_static::lazy_static;
use regex::Regex;
use time::{macros::format_description, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::error::{AppError, AppResult};

pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Transaction times pack milliseconds below the unix second.
pub fn get_unix_time_from_transaction_time(transaction_time: i64) -> i64 {
    transaction_time / 1000
}

pub fn get_min_transaction_time_from_unix_time(unix_time: i64) -> i64 {
    unix_time * 1000
}

pub fn get_max_transaction_time_from_unix_time(unix_time: i64) -> i64 {
    unix_time * 1000 + 999
}

/// Parses `+HH:MM` / `-HH:MM` into minutes east of UTC.
pub fn parse_timezone_offset(value: &str) -> AppResult<i16> {
    lazy_static! {
        static ref OFFSET_RE: Regex = Regex::new(r"^([+-])(\d{2}):(\d{2})$").unwrap();
    }
    let caps = OFFSET_RE
        .captures(value)
        .ok_or(AppError::InvalidTimezoneOffset)?;

    let hours: i16 = caps[2].parse().map_err(|_| AppError::InvalidTimezoneOffset)?;
    let minutes: i16 = caps[3].parse().map_err(|_| AppError::InvalidTimezoneOffset)?;
    if hours > 23 || minutes > 59 {
        return Err(AppError::InvalidTimezoneOffset);
    }

    let total = hours * 60 + minutes;
    Ok(if &caps[1] == "-" { -total } else { total })
}

pub fn format_timezone_offset(offset_minutes: i16) -> String {
    let sign = if offset_minutes < 0 { '-' } else { '+' };
    let abs = offset_minutes.unsigned_abs();
    format!("{}{:02}:{:02}", sign, abs / 60, abs % 60)
}

pub fn fixed_offset(offset_minutes: i16) -> AppResult<UtcOffset> {
    UtcOffset::from_whole_seconds(i32::from(offset_minutes) * 60)
        .map_err(|_| AppError::InvalidTimezoneOffset)
}

/// Unix time of the client's local midnight on the day containing `now`.
pub fn client_today_start(now: OffsetDateTime, offset_minutes: i16) -> AppResult<i64> {
    let client_now = now.to_offset(fixed_offset(offset_minutes)?);
    let elapsed_today = i64::from(client_now.hour()) * 3600
        + i64::from(client_now.minute()) * 60
        + i64::from(client_now.second());
    Ok(client_now.unix_timestamp() - elapsed_today)
}

fn from_unix_time(unix_time: i64, offset_minutes: i16) -> AppResult<OffsetDateTime> {
    let instant = OffsetDateTime::from_unix_timestamp(unix_time)
        .map_err(|_| AppError::InvalidParameter(format!("unix time {unix_time}")))?;
    Ok(instant.to_offset(fixed_offset(offset_minutes)?))
}

pub fn format_unix_time_to_long_date_time_without_second(
    unix_time: i64,
    offset_minutes: i16,
) -> AppResult<String> {
    from_unix_time(unix_time, offset_minutes)?
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .map_err(|e| AppError::Internal(e.to_string()))
}

pub fn format_unix_time_to_year_month(unix_time: i64, offset_minutes: i16) -> AppResult<String> {
    from_unix_time(unix_time, offset_minutes)?
        .format(format_description!("[year]-[month]"))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Parses `2021-04-01 06:01:23` as wall time at the given offset.
pub fn parse_from_long_date_time(value: &str, offset_minutes: i16) -> AppResult<OffsetDateTime> {
    let local = PrimitiveDateTime::parse(
        value,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    )
    .map_err(|_| AppError::InvalidParameter(format!("date time {value}")))?;
    Ok(local.assume_offset(fixed_offset(offset_minutes)?))
}

/// Parses unpadded `2021-4-1 6:1:23` as wall time at the given offset.
pub fn parse_from_short_date_time(value: &str, offset_minutes: i16) -> AppResult<OffsetDateTime> {
    let local = PrimitiveDateTime::parse(
        value,
        format_description!(
            "[year]-[month padding:none]-[day padding:none] [hour padding:none]:[minute padding:none]:[second padding:none]"
        ),
    )
    .map_err(|_| AppError::InvalidParameter(format!("date time {value}")))?;
    Ok(local.assume_offset(fixed_offset(offset_minutes)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_UNIX_TIME: i64 = 1617228083;

    #[test]
    fn transaction_time_decodes_to_unix_second() {
        assert_eq!(get_unix_time_from_transaction_time(1617228083999), SAMPLE_UNIX_TIME);
        assert_eq!(get_unix_time_from_transaction_time(1617228083000), SAMPLE_UNIX_TIME);
    }

    #[test]
    fn transaction_time_bounds_for_unix_second() {
        assert_eq!(get_min_transaction_time_from_unix_time(SAMPLE_UNIX_TIME), 1617228083000);
        assert_eq!(get_max_transaction_time_from_unix_time(SAMPLE_UNIX_TIME), 1617228083999);
    }

    #[test]
    fn parse_and_format_timezone_offset() {
        assert_eq!(parse_timezone_offset("+02:00").unwrap(), 120);
        assert_eq!(parse_timezone_offset("+05:45").unwrap(), 345);
        assert_eq!(parse_timezone_offset("-12:00").unwrap(), -720);
        assert_eq!(parse_timezone_offset("+00:00").unwrap(), 0);

        assert_eq!(format_timezone_offset(345), "+05:45");
        assert_eq!(format_timezone_offset(-720), "-12:00");
        assert_eq!(format_timezone_offset(0), "+00:00");
        assert_eq!(format_timezone_offset(parse_timezone_offset("+05:45").unwrap()), "+05:45");
    }

    #[test]
    fn malformed_timezone_offsets_are_rejected() {
        for value in ["00:00", "0", "1000", "+5:45", "+05:60", "+0545", ""] {
            assert!(
                matches!(parse_timezone_offset(value), Err(AppError::InvalidTimezoneOffset)),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn client_today_start_honours_offset() {
        let now = OffsetDateTime::from_unix_timestamp(SAMPLE_UNIX_TIME).unwrap();
        // 2021-03-31 00:00 UTC
        assert_eq!(client_today_start(now, 0).unwrap(), 1617148800);
        // 2021-04-01 00:00 +08:00
        assert_eq!(client_today_start(now, 480).unwrap(), 1617206400);
    }

    #[test]
    fn formats_in_client_offset() {
        assert_eq!(
            format_unix_time_to_long_date_time_without_second(SAMPLE_UNIX_TIME, 0).unwrap(),
            "2021-03-31 22:01"
        );
        assert_eq!(
            format_unix_time_to_long_date_time_without_second(SAMPLE_UNIX_TIME, 480).unwrap(),
            "2021-04-01 06:01"
        );
        assert_eq!(format_unix_time_to_year_month(SAMPLE_UNIX_TIME, 0).unwrap(), "2021-03");
        assert_eq!(format_unix_time_to_year_month(SAMPLE_UNIX_TIME, 480).unwrap(), "2021-04");
    }

    #[test]
    fn parses_long_and_short_date_times() {
        let long = parse_from_long_date_time("2021-04-01 06:01:23", 480).unwrap();
        assert_eq!(long.unix_timestamp(), SAMPLE_UNIX_TIME);

        let short = parse_from_short_date_time("2021-4-1 6:1:23", 480).unwrap();
        assert_eq!(short.unix_timestamp(), SAMPLE_UNIX_TIME);

        assert!(parse_from_long_date_time("2021/04/01", 0).is_err());
    }
}
