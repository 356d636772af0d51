//! Wall-clock helpers shared by extraction, the hard-constraint gate and narration.
//!
//! Times are day-local `NaiveTime`s. Arithmetic happens in minutes since midnight so
//! that an activity may run past 24:00 without wrapping back to the morning.

use chrono::{NaiveTime, Timelike};

pub const MINUTES_PER_DAY: u32 = 24 * 60;

const RANGE_SEPARATORS: [char; 5] = ['-', '~', '〜', '–', '—'];

/// Parses `H:MM` or `HH:MM`.
pub fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let (hours, minutes) = raw.trim().split_once(':')?;
    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return None;
    }
    if !hours.chars().chain(minutes.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours = hours.parse::<u32>().ok()?;
    let minutes = minutes.parse::<u32>().ok()?;
    NaiveTime::from_hms_opt(hours, minutes, 0)
}

/// Result of reading an activity or opening-hours time string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSpan {
    Unspecified,
    At(NaiveTime),
    Between(NaiveTime, NaiveTime),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanError {
    Unrecognized,
    Reversed { start: NaiveTime, end: NaiveTime },
}

/// Reads `""`, `"10:00"` or `"10:00-12:00"` (also `~`, `〜`, en and em dashes).
pub fn parse_span(raw: &str) -> Result<ClockSpan, SpanError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(ClockSpan::Unspecified);
    }

    match trimmed.split_once(|c: char| RANGE_SEPARATORS.contains(&c)) {
        Some((start, end)) => {
            let start = parse_clock(start).ok_or(SpanError::Unrecognized)?;
            let end = parse_clock(end).ok_or(SpanError::Unrecognized)?;
            if end < start {
                return Err(SpanError::Reversed { start, end });
            }
            Ok(ClockSpan::Between(start, end))
        }
        None => parse_clock(trimmed)
            .map(ClockSpan::At)
            .ok_or(SpanError::Unrecognized),
    }
}

pub fn minutes_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Deadlines before this hour belong to the night after the current travel day.
pub const DAY_ROLLOVER_HOUR: u32 = 4;

/// Places `target` on the traveler's timeline in minutes since today's midnight.
///
/// An early-morning target (before [`DAY_ROLLOVER_HOUR`]) seen during the day lands after
/// 24:00. Any other target already behind `now` stays in the past.
pub fn deadline_minutes(now: NaiveTime, target: NaiveTime) -> u32 {
    let rollover = DAY_ROLLOVER_HOUR * 60;
    let now = minutes_of_day(now);
    let target = minutes_of_day(target);
    if target < now && target < rollover && now >= rollover {
        target + MINUTES_PER_DAY
    } else {
        target
    }
}

/// Formats minutes since today's midnight as `HH:MM`, folding anything past 24:00.
pub fn format_minutes(minutes: u32) -> String {
    let folded = minutes % MINUTES_PER_DAY;
    format!("{:02}:{:02}", folded / 60, folded % 60)
}

/// Formats a span such as `45m` or `1h 05m`.
pub fn format_span(minutes: u32) -> String {
    if minutes < 60 {
        format!("{minutes}m")
    } else {
        format!("{}h {:02}m", minutes / 60, minutes % 60)
    }
}

/// Serde adapter writing `NaiveTime` as `HH:MM`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse(raw: &str) -> Result<NaiveTime, String> {
        super::parse_clock(raw)
            .or_else(|| NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S").ok())
            .ok_or_else(|| format!("failed to parse '{raw}' as HH:MM"))
    }
}

/// Optional variant of [`hhmm`].
pub mod hhmm_option {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(time) => super::hhmm::serialize(time, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|value| super::hhmm::parse(&value).map_err(serde::de::Error::custom))
            .transpose()
    }
}
