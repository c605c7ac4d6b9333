use std::time::SystemTime;

use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc,
};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Largest distance from the epoch, in milliseconds, that is accepted.
///
/// Epoch numbers are checked against this bound directly. Text is resolved
/// through `chrono`, which stops at year 262143 (about 8.2e15 ms), so dates
/// written past that year are rejected.
pub const MAX_EPOCH_MILLIS: f64 = 8.64e15;

// output of Date.prototype.toString and toDateString
const DATE_STRING_OFFSET_FORMAT: &str = "%a %b %d %Y %H:%M:%S GMT%z";
const DATE_STRING_FORMAT: &str = "%a %b %d %Y";

/// Anything that can be resolved into an absolute point in time.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(from = "Value")]
pub enum Timestamp {
    /// Milliseconds since the unix epoch, truncated toward zero.
    EpochMillis(f64),
    Text(String),
    Instant(DateTime<Utc>),
}

impl Timestamp {
    pub fn to_instant(&self) -> Result<DateTime<Utc>> {
        match self {
            Timestamp::EpochMillis(millis) => {
                let whole = millis_in_range(*millis)?;
                DateTime::from_timestamp_millis(whole).ok_or(Error::TimestampOutOfRange(*millis))
            }
            Timestamp::Text(text) => parse_text(text),
            Timestamp::Instant(instant) => Ok(*instant),
        }
    }

    /// Milliseconds since the epoch. Epoch numbers never go through `chrono`,
    /// so the whole ±8.64e15 ms range is available to them.
    pub fn epoch_millis(&self) -> Result<i64> {
        match self {
            Timestamp::EpochMillis(millis) => millis_in_range(*millis),
            _ => Ok(self.to_instant()?.timestamp_millis()),
        }
    }
}

fn millis_in_range(millis: f64) -> Result<i64> {
    if !millis.is_finite() || millis.abs() > MAX_EPOCH_MILLIS {
        return Err(Error::TimestampOutOfRange(millis));
    }
    Ok(millis.trunc() as i64)
}

fn parse_text(text: &str) -> Result<DateTime<Utc>> {
    let s = text.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
        return Ok(instant.with_timezone(&Utc));
    }
    if let Some(instant) = parse_date_time_string(s) {
        return Ok(instant);
    }
    if let Ok(instant) = DateTime::parse_from_rfc2822(s) {
        return Ok(instant.with_timezone(&Utc));
    }
    let without_zone_name = strip_zone_name(s);
    if let Ok(instant) = DateTime::parse_from_str(without_zone_name, DATE_STRING_OFFSET_FORMAT) {
        return Ok(instant.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(without_zone_name, DATE_STRING_FORMAT) {
        if let Some(instant) = from_local(date.and_time(NaiveTime::MIN)) {
            return Ok(instant);
        }
    }

    Err(Error::UnparseableTimestamp(text.to_owned()))
}

// "Mon Jul 29 2024 10:00:00 GMT+0200 (Central European Summer Time)"
fn strip_zone_name(s: &str) -> &str {
    match s.find(" (") {
        Some(open) if s.ends_with(')') => &s[..open],
        _ => s,
    }
}

/// ECMAScript date time string format:
/// `YYYY[-MM[-DD]][THH:mm[:ss[.sss]]][Z|±HH:mm]`, where the year may also be
/// written `±YYYYYY`. Date-only forms are utc, date-times without an offset
/// are local. A space is accepted in place of the `T`.
fn parse_date_time_string(s: &str) -> Option<DateTime<Utc>> {
    let (year, mut rest) = split_year(s)?;
    let mut month = 1;
    let mut day = 1;
    if let Some(after) = rest.strip_prefix('-') {
        (month, rest) = two_digits(after)?;
        if let Some(after) = rest.strip_prefix('-') {
            (day, rest) = two_digits(after)?;
        }
    }
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    if rest.is_empty() {
        return Some(date.and_time(NaiveTime::MIN).and_utc());
    }

    let rest = rest.strip_prefix(&['T', 't', ' '][..])?;
    let (hour, rest) = two_digits(rest)?;
    let (minute, mut rest) = two_digits(rest.strip_prefix(':')?)?;
    let mut second = 0;
    let mut nanos = 0;
    if let Some(after) = rest.strip_prefix(':') {
        (second, rest) = two_digits(after)?;
        if let Some(after) = rest.strip_prefix('.') {
            (nanos, rest) = fraction_nanos(after)?;
        }
    }

    // 24:00 is the end of the day
    let naive = if (hour, minute, second, nanos) == (24, 0, 0, 0) {
        date.succ_opt()?.and_time(NaiveTime::MIN)
    } else {
        date.and_time(NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)?)
    };

    match rest {
        "" => from_local(naive),
        "Z" | "z" => Some(naive.and_utc()),
        offset => {
            let offset = parse_offset(offset)?;
            let instant = offset.from_local_datetime(&naive).single()?;
            Some(instant.with_timezone(&Utc))
        }
    }
}

fn split_year(s: &str) -> Option<(i32, &str)> {
    match s.as_bytes().first()? {
        sign @ (b'+' | b'-') => {
            let digits = s.get(1..7)?;
            // minus zero is not a year
            if !is_digits(digits) || s.starts_with("-000000") {
                return None;
            }
            let year: i32 = digits.parse().ok()?;
            let year = if *sign == b'-' { -year } else { year };
            Some((year, &s[7..]))
        }
        _ => {
            let digits = s.get(..4)?;
            if !is_digits(digits) {
                return None;
            }
            Some((digits.parse().ok()?, &s[4..]))
        }
    }
}

fn two_digits(s: &str) -> Option<(u32, &str)> {
    let digits = s.get(..2)?;
    if !is_digits(digits) {
        return None;
    }
    Some((digits.parse().ok()?, &s[2..]))
}

// any number of fraction digits, precision past nanoseconds is dropped
fn fraction_nanos(s: &str) -> Option<(u32, &str)> {
    let len = s.bytes().take_while(u8::is_ascii_digit).count();
    if len == 0 {
        return None;
    }
    let nanos = s[..len.min(9)]
        .bytes()
        .chain(std::iter::repeat(b'0'))
        .take(9)
        .fold(0, |acc, b| acc * 10 + u32::from(b - b'0'));
    Some((nanos, &s[len..]))
}

// ±HH:mm or ±HHmm
fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let (hours, rest) = two_digits(rest)?;
    let rest = rest.strip_prefix(':').unwrap_or(rest);
    let (minutes, rest) = two_digits(rest)?;
    if !rest.is_empty() || hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60) as i32)
}

fn is_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

fn from_local(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    // ambiguous wall-clock times take the earlier instant, skipped ones move forward
    Local
        .from_local_datetime(&naive)
        .earliest()
        .or_else(|| Local.from_local_datetime(&(naive + TimeDelta::hours(1))).earliest())
        .map(|local| local.with_timezone(&Utc))
}

/// Seconds from `start` to `end`, negative when `end` comes first.
///
/// Unparseable timestamps give `NaN`; use [`try_elapsed_seconds`] to get the
/// parse error instead.
pub fn elapsed_seconds(start: impl Into<Timestamp>, end: impl Into<Timestamp>) -> f64 {
    try_elapsed_seconds(start, end).unwrap_or_else(|err| {
        log::debug!("elapsed time is NaN: {}", err);
        f64::NAN
    })
}

pub fn try_elapsed_seconds(start: impl Into<Timestamp>, end: impl Into<Timestamp>) -> Result<f64> {
    let start = start.into().epoch_millis()?;
    let end = end.into().epoch_millis()?;
    Ok((end - start) as f64 / 1000.0)
}

impl From<i64> for Timestamp {
    fn from(millis: i64) -> Self {
        Timestamp::EpochMillis(millis as f64)
    }
}

impl From<u64> for Timestamp {
    fn from(millis: u64) -> Self {
        Timestamp::EpochMillis(millis as f64)
    }
}

impl From<f64> for Timestamp {
    fn from(millis: f64) -> Self {
        Timestamp::EpochMillis(millis)
    }
}

impl From<&str> for Timestamp {
    fn from(text: &str) -> Self {
        Timestamp::Text(text.to_owned())
    }
}

impl From<String> for Timestamp {
    fn from(text: String) -> Self {
        Timestamp::Text(text)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Timestamp {
    fn from(instant: DateTime<Tz>) -> Self {
        Timestamp::Instant(instant.with_timezone(&Utc))
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        Timestamp::Instant(time.into())
    }
}

/// Loose conversion of a JSON value: `null` is the epoch, booleans are 0 or 1 ms.
impl From<&Value> for Timestamp {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Timestamp::EpochMillis(0.0),
            Value::Bool(b) => Timestamp::EpochMillis(if *b { 1.0 } else { 0.0 }),
            Value::Number(n) => Timestamp::EpochMillis(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Timestamp::Text(s.clone()),
            other => Timestamp::Text(other.to_string()),
        }
    }
}

impl From<Value> for Timestamp {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Timestamp::Text(s),
            other => Timestamp::from(&other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_same_timestamp_is_zero() {
        assert_eq!(elapsed_seconds("2024-07-29T08:00:00Z", "2024-07-29T08:00:00Z"), 0.0);
        assert_eq!(elapsed_seconds(1_722_240_000_000_i64, 1_722_240_000_000_i64), 0.0);
    }

    #[test]
    fn test_elapsed_is_signed() {
        let forward = elapsed_seconds("2024-07-29T08:00:00Z", "2024-07-29T08:01:30Z");
        let backward = elapsed_seconds("2024-07-29T08:01:30Z", "2024-07-29T08:00:00Z");
        assert_eq!(forward, 90.0);
        assert_eq!(backward, -90.0);
    }

    #[test]
    fn test_epoch_millis() {
        assert_eq!(elapsed_seconds(1_000_i64, 2_500_i64), 1.5);
        // fractional millis are truncated
        assert_eq!(elapsed_seconds(0.9, 1_000.7), 1.0);
    }

    #[test]
    fn test_offsets_are_respected() {
        let elapsed = elapsed_seconds("2024-07-29T08:00:00+02:00", "2024-07-29T06:00:30Z");
        assert_eq!(elapsed, 30.0);
        let elapsed = elapsed_seconds("2024-07-29T08:00+02:00", "2024-07-29T06:00Z");
        assert_eq!(elapsed, 0.0);
    }

    #[test]
    fn test_date_only_is_utc_midnight() {
        let instant = Timestamp::from("2024-07-29").to_instant().unwrap();
        assert_eq!(instant.to_rfc3339(), "2024-07-29T00:00:00+00:00");
        assert_eq!(elapsed_seconds("2024-07-29", "2024-07-30"), 86_400.0);
    }

    #[test]
    fn test_year_and_month_are_utc_start_of_period() {
        let year = Timestamp::from("2024").to_instant().unwrap();
        assert_eq!(year.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        let month = Timestamp::from("2024-07").to_instant().unwrap();
        assert_eq!(month.to_rfc3339(), "2024-07-01T00:00:00+00:00");
        assert_eq!(elapsed_seconds("2024", "2024-01-01T00:00:01Z"), 1.0);
        assert!(elapsed_seconds("2024-7", 0_i64).is_nan());
        assert!(elapsed_seconds("2024-13", 0_i64).is_nan());
    }

    #[test]
    fn test_extended_years() {
        let elapsed = elapsed_seconds("+002024-07-29T08:00:00Z", "2024-07-29T08:00:01Z");
        assert_eq!(elapsed, 1.0);
        let before_common_era = Timestamp::from("-000001-01-01").to_instant().unwrap();
        assert_eq!(before_common_era, Utc.with_ymd_and_hms(-1, 1, 1, 0, 0, 0).unwrap());
        // minus zero is rejected
        assert!(elapsed_seconds("-000000-01-01", 0_i64).is_nan());
    }

    #[test]
    fn test_end_of_day_hour() {
        assert_eq!(elapsed_seconds("2024-07-29T24:00:00Z", "2024-07-30T00:00:00Z"), 0.0);
        assert!(elapsed_seconds("2024-07-29T24:01:00Z", 0_i64).is_nan());
    }

    #[test]
    fn test_date_to_string_output() {
        let shown = "Mon Jul 29 2024 10:00:00 GMT+0200 (Central European Summer Time)";
        assert_eq!(elapsed_seconds(shown, "2024-07-29T08:00:01Z"), 1.0);
        let shown_utc = "Mon Jul 29 2024 08:00:00 GMT+0000";
        assert_eq!(elapsed_seconds(shown_utc, "2024-07-29T08:00:00Z"), 0.0);
        // the date part alone is local midnight
        assert_eq!(elapsed_seconds("Mon Jul 29 2024", "2024-07-29T00:00:00"), 0.0);
    }

    #[test]
    fn test_epoch_millis_past_calendar_range() {
        assert_eq!(elapsed_seconds(8.6e15, 8.6e15 + 1_000.0), 1.0);
        assert_eq!(elapsed_seconds(-8.64e15, -8.64e15 + 500.0), 0.5);
        assert_eq!(Timestamp::EpochMillis(8.6e15).epoch_millis().unwrap(), 8_600_000_000_000_000);
        assert!(matches!(
            Timestamp::EpochMillis(8.6e15).to_instant(),
            Err(Error::TimestampOutOfRange(_))
        ));
    }

    #[test]
    fn test_local_date_time() {
        assert_eq!(elapsed_seconds("2024-07-29T08:00:00", "2024-07-29 08:01:30.500"), 90.5);
        assert_eq!(elapsed_seconds("2024-07-29T08:00", "2024-07-29T08:00:00"), 0.0);
    }

    #[test]
    fn test_rfc2822() {
        let elapsed = elapsed_seconds("Mon, 29 Jul 2024 08:00:00 +0000", "2024-07-29T08:00:10Z");
        assert_eq!(elapsed, 10.0);
    }

    #[test]
    fn test_mixed_inputs() {
        let instant = Utc.with_ymd_and_hms(2024, 7, 29, 8, 0, 0).unwrap();
        let millis = instant.timestamp_millis();
        assert_eq!(elapsed_seconds(instant, millis + 2_000), 2.0);
        assert_eq!(elapsed_seconds("2024-07-29T08:00:00Z", instant), 0.0);
    }

    #[test]
    fn test_unparseable_is_nan() {
        assert!(elapsed_seconds("yesterday-ish", "2024-07-29T08:00:00Z").is_nan());
        assert!(elapsed_seconds(f64::NAN, 0_i64).is_nan());
        assert!(elapsed_seconds(0_i64, 9e15).is_nan());
        assert!(elapsed_seconds(&json!({"at": 5}), 0_i64).is_nan());
    }

    #[test]
    fn test_try_elapsed_reports_parse_error() {
        let err = try_elapsed_seconds("not a date", 0_i64).unwrap_err();
        assert!(matches!(err, Error::UnparseableTimestamp(ref text) if text == "not a date"));
        let err = try_elapsed_seconds(0_i64, f64::INFINITY).unwrap_err();
        assert!(matches!(err, Error::TimestampOutOfRange(_)));
    }

    #[test]
    fn test_json_values() {
        assert_eq!(elapsed_seconds(&Value::Null, &json!(1000)), 1.0);
        assert_eq!(elapsed_seconds(&json!(false), &json!(true)), 0.001);
        assert_eq!(elapsed_seconds(json!("2024-07-29"), json!("2024-07-29T00:01:00Z")), 60.0);
    }

    #[test]
    fn test_deserialize() {
        let stamps: Vec<Timestamp> = serde_json::from_str(r#"[1000, "2024-07-29", null]"#).unwrap();
        assert_eq!(
            stamps,
            vec![
                Timestamp::EpochMillis(1000.0),
                Timestamp::Text("2024-07-29".to_owned()),
                Timestamp::EpochMillis(0.0),
            ]
        );
    }
}
