//! Lenient time expression parser
//!
//! Accepts absolute timestamps, numeric and month-name dates, clock times,
//! day words (`today`, `tomorrow`) and relative offsets (`in 5 minutes`,
//! `2 hours from now`). Dates without a year fall in the current year.
//! Bare clock times resolve to today and are never rolled forward.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};
use lazy_regex::{regex_captures, regex_replace_all};

use crate::error::ValidationError;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Parse `input` relative to `now`
pub fn parse_time(input: &str, now: DateTime<Local>) -> Result<DateTime<Local>, ValidationError> {
    let trimmed = input.trim();
    let unparseable = || ValidationError::UnparseableTime(input.to_string());

    if trimmed.is_empty() {
        return Err(unparseable());
    }

    if let Some(time) = parse_absolute(trimmed) {
        return Ok(time);
    }

    let text = trimmed.to_lowercase();
    if text == "now" {
        return Ok(now);
    }

    parse_relative(&text, now)
        .or_else(|| parse_calendar(&text, now))
        .ok_or_else(unparseable)
}

fn parse_absolute(text: &str) -> Option<DateTime<Local>> {
    if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        return Some(time.with_timezone(&Local));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return to_local(naive);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return to_local(date.and_time(NaiveTime::MIN));
        }
    }

    None
}

fn parse_relative(text: &str, now: DateTime<Local>) -> Option<DateTime<Local>> {
    let (amount, unit) = if let Some((_, amount, unit)) = regex_captures!(r"^in\s+(\d+|an?|one)\s*([a-z]+)$", text)
    {
        (amount, unit)
    } else if let Some((_, amount, unit)) = regex_captures!(r"^(\d+|an?|one)\s*([a-z]+)\s+from\s+now$", text) {
        (amount, unit)
    } else {
        return None;
    };

    let amount: i64 = match amount {
        "a" | "an" | "one" => 1,
        digits => digits.parse().ok()?,
    };

    now.checked_add_signed(unit_delta(unit, amount)?)
}

fn unit_delta(unit: &str, amount: i64) -> Option<TimeDelta> {
    match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => TimeDelta::try_seconds(amount),
        "m" | "min" | "mins" | "minute" | "minutes" => TimeDelta::try_minutes(amount),
        "h" | "hr" | "hrs" | "hour" | "hours" => TimeDelta::try_hours(amount),
        "d" | "day" | "days" => TimeDelta::try_days(amount),
        "w" | "wk" | "wks" | "week" | "weeks" => TimeDelta::try_weeks(amount),
        _ => None,
    }
}

/// `[at] <clock>`, `<day> [at] <clock>`, `<clock> <day>`, `<date> [<clock>]`, `tomorrow`
fn parse_calendar(text: &str, now: DateTime<Local>) -> Option<DateTime<Local>> {
    if let Some(clock) = text.strip_prefix("at ") {
        return to_local(now.date_naive().and_time(parse_clock_after_at(clock.trim())?));
    }
    if let Some(clock) = parse_clock(text) {
        return to_local(now.date_naive().and_time(clock));
    }

    if let Some((day, clock)) = text.split_once(" at ") {
        let date = resolve_day(day.trim(), now)?;
        return to_local(date.and_time(parse_clock_after_at(clock.trim())?));
    }

    for word in ["today", "tomorrow"] {
        let Some(clock) = text.strip_prefix(word).or_else(|| text.strip_suffix(word)) else {
            continue;
        };
        let date = resolve_day(word, now)?;
        let clock = match clock.trim() {
            "" if word == "tomorrow" => now.time(),
            "" => return None,
            clock => parse_clock(clock)?,
        };
        return to_local(date.and_time(clock));
    }

    // `<date> [<clock>]`, longest date first
    let bounds: Vec<usize> = text
        .match_indices(' ')
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    bounds.into_iter().rev().find_map(|i| {
        let date = resolve_day(text[..i].trim(), now)?;
        let clock = match text[i..].trim() {
            "" => NaiveTime::MIN,
            clock => parse_clock(clock)?,
        };
        to_local(date.and_time(clock))
    })
}

fn resolve_day(day: &str, now: DateTime<Local>) -> Option<NaiveDate> {
    let today = now.date_naive();
    match day {
        "today" => Some(today),
        "tomorrow" => today.succ_opt(),
        _ => {
            let day = normalize_date(day);
            parse_date(&day).or_else(|| parse_date(&format!("{} {}", day, today.year())))
        }
    }
}

/// `Oct 20th, 2026` becomes `Oct 20 2026`
fn normalize_date(day: &str) -> String {
    let day = regex_replace_all!(r"\b(\d{1,2})(?:st|nd|rd|th)\b", day, |_, digits: &str| digits.to_string());
    day.replace(',', " ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

/// After `at`, a lone hour like `9` is a clock time
fn parse_clock_after_at(text: &str) -> Option<NaiveTime> {
    parse_clock(text).or_else(|| {
        let (_, hour) = regex_captures!(r"^(\d{1,2})$", text)?;
        NaiveTime::from_hms_opt(hour.parse().ok()?, 0, 0)
    })
}

/// `15:30`, `15:30:05`, `3pm`, `3:30 pm`, `noon`, `midnight`
fn parse_clock(text: &str) -> Option<NaiveTime> {
    match text {
        "noon" => return NaiveTime::from_hms_opt(12, 0, 0),
        "midnight" => return Some(NaiveTime::MIN),
        _ => {}
    }

    let (_, hour, minute, second, meridiem) = regex_captures!(
        r"^(\d{1,2})(?::(\d{2}))?(?::(\d{2}))?\s*(am|pm|a\.m\.|p\.m\.)?$",
        text
    )?;

    let mut hour: u32 = hour.parse().ok()?;
    let minute: u32 = if minute.is_empty() { 0 } else { minute.parse().ok()? };
    let second: u32 = if second.is_empty() { 0 } else { second.parse().ok()? };

    match meridiem {
        "" => {
            // a lone number is a day-of-month to most parsers, not a time
            if text.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
        }
        m => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            let pm = m.starts_with('p');
            hour = match (hour, pm) {
                (12, false) => 0,
                (12, true) => 12,
                (h, true) => h + 12,
                (h, false) => h,
            };
        }
    }

    NaiveTime::from_hms_opt(hour, minute, second)
}

fn to_local(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    Local.from_local_datetime(&naive).earliest()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).single().unwrap()
    }

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, s).single().unwrap()
    }

    #[test]
    fn test_absolute_formats() {
        let expected = local(2026, 10, 18, 15, 30, 0);
        assert_eq!(parse_time("2026-10-18 15:30:00", noon()).unwrap(), expected);
        assert_eq!(parse_time("2026-10-18 15:30", noon()).unwrap(), expected);
        assert_eq!(parse_time("2026-10-18T15:30:00", noon()).unwrap(), expected);
        assert_eq!(parse_time("2026/10/18 15:30", noon()).unwrap(), expected);
    }

    #[test]
    fn test_rfc3339_keeps_instant() {
        let parsed = parse_time("2026-10-18T15:30:00+00:00", noon()).unwrap();
        assert_eq!(parsed.timestamp(), 1_792_337_400);
    }

    #[test]
    fn test_bare_date_is_midnight() {
        assert_eq!(parse_time("2026-10-20", noon()).unwrap(), local(2026, 10, 20, 0, 0, 0));
    }

    #[test]
    fn test_relative_offsets() {
        let now = noon();
        assert_eq!(parse_time("in 5 minutes", now).unwrap(), now + TimeDelta::minutes(5));
        assert_eq!(parse_time("in an hour", now).unwrap(), now + TimeDelta::hours(1));
        assert_eq!(parse_time("In 2 Days", now).unwrap(), now + TimeDelta::days(2));
        assert_eq!(parse_time("90 seconds from now", now).unwrap(), now + TimeDelta::seconds(90));
        assert_eq!(parse_time("in 10m", now).unwrap(), now + TimeDelta::minutes(10));
    }

    #[test]
    fn test_clock_times_resolve_to_today() {
        assert_eq!(parse_time("3pm", noon()).unwrap(), local(2026, 10, 18, 15, 0, 0));
        assert_eq!(parse_time("3:45 PM", noon()).unwrap(), local(2026, 10, 18, 15, 45, 0));
        assert_eq!(parse_time("09:15", noon()).unwrap(), local(2026, 10, 18, 9, 15, 0));
        assert_eq!(parse_time("12am", noon()).unwrap(), local(2026, 10, 18, 0, 0, 0));
        assert_eq!(parse_time("12:30pm", noon()).unwrap(), local(2026, 10, 18, 12, 30, 0));
        assert_eq!(parse_time("noon", noon()).unwrap(), noon());
    }

    #[test]
    fn test_day_words() {
        assert_eq!(parse_time("tomorrow at 9am", noon()).unwrap(), local(2026, 10, 19, 9, 0, 0));
        assert_eq!(parse_time("tomorrow 18:00", noon()).unwrap(), local(2026, 10, 19, 18, 0, 0));
        assert_eq!(parse_time("8pm today", noon()).unwrap(), local(2026, 10, 18, 20, 0, 0));
        assert_eq!(parse_time("tomorrow", noon()).unwrap(), local(2026, 10, 19, 12, 0, 0));
        assert_eq!(parse_time("2026-10-21 at 7:30am", noon()).unwrap(), local(2026, 10, 21, 7, 30, 0));
    }

    #[test]
    fn test_month_name_dates() {
        let cases = [
            ("October 20 at 3pm", local(2026, 10, 20, 15, 0, 0)),
            ("Oct 20 2026 15:00", local(2026, 10, 20, 15, 0, 0)),
            ("20 October 2026", local(2026, 10, 20, 0, 0, 0)),
            ("oct 20", local(2026, 10, 20, 0, 0, 0)),
            ("21 Oct 9:30am", local(2026, 10, 21, 9, 30, 0)),
            ("November 3rd, 2026 at 8pm", local(2026, 11, 3, 20, 0, 0)),
            ("December 1 at 9", local(2026, 12, 1, 9, 0, 0)),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_time(input, noon()).unwrap(), expected, "input: {:?}", input);
        }
    }

    #[test]
    fn test_leading_at() {
        assert_eq!(parse_time("at 3pm", noon()).unwrap(), local(2026, 10, 18, 15, 0, 0));
        assert_eq!(parse_time("at 17:45", noon()).unwrap(), local(2026, 10, 18, 17, 45, 0));
        assert_eq!(parse_time("at 9", noon()).unwrap(), local(2026, 10, 18, 9, 0, 0));
    }

    #[test]
    fn test_now() {
        assert_eq!(parse_time(" now ", noon()).unwrap(), noon());
    }

    #[test]
    fn test_unparseable() {
        for input in ["", "whenever", "25:00", "13pm", "in 5 fortnights", "7", "today", "at", "octember 20", "at 25"] {
            let err = parse_time(input, noon()).unwrap_err();
            assert_eq!(err, ValidationError::UnparseableTime(input.to_string()), "input: {:?}", input);
        }
    }
}
