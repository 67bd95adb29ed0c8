//! Parsing of the locale formatted "date at time" values written by the
//! history source (for example `19/10/2026 às 14:32`).

use crate::core::config::TimestampSettings;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("timestamp is empty")]
    Empty,
    #[error("unrecognized timestamp '{0}'")]
    Unrecognized(String),
    #[error("utc offset of {0} minutes is out of range")]
    InvalidOffset(i32),
}

/// Converts history timestamps into comparable UTC instants.
#[derive(Debug, Clone)]
pub struct TimestampParser {
    separators: Vec<String>,
    date_formats: Vec<String>,
    time_formats: Vec<String>,
    offset: FixedOffset,
}

impl TimestampParser {
    pub fn new(settings: &TimestampSettings) -> Result<Self, TimestampError> {
        let offset = settings
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(TimestampError::InvalidOffset(settings.utc_offset_minutes))?;
        Ok(Self {
            separators: settings.separators.clone(),
            date_formats: settings.date_formats.clone(),
            time_formats: settings.time_formats.clone(),
            offset,
        })
    }

    pub fn parse(&self, raw: &str) -> Result<DateTime<Utc>, TimestampError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(TimestampError::Empty);
        }
        if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
            return Ok(instant.with_timezone(&Utc));
        }

        let local = self
            .split_candidates(text)
            .into_iter()
            .find_map(|(date, time)| self.parse_parts(date, time))
            .ok_or_else(|| TimestampError::Unrecognized(text.to_string()))?;

        self.offset
            .from_local_datetime(&local)
            .single()
            .map(|instant| instant.with_timezone(&Utc))
            .ok_or_else(|| TimestampError::Unrecognized(text.to_string()))
    }

    /// Candidate (date, time) splits, most specific first.
    fn split_candidates<'a>(&self, text: &'a str) -> Vec<(&'a str, Option<&'a str>)> {
        let mut candidates = Vec::new();
        for separator in &self.separators {
            let split = if separator.chars().all(char::is_alphabetic) {
                split_word(text, separator)
            } else {
                text.split_once(separator.as_str())
            };
            if let Some((date, time)) = split {
                candidates.push((date.trim(), Some(time.trim())));
            }
        }
        if let Some((date, time)) = text.rsplit_once(char::is_whitespace) {
            candidates.push((date.trim(), Some(time.trim())));
        }
        candidates.push((text, None));
        candidates
    }

    fn parse_parts(&self, date: &str, time: Option<&str>) -> Option<NaiveDateTime> {
        let date = self
            .date_formats
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(date, format).ok())?;
        let time = match time {
            Some(time) => self
                .time_formats
                .iter()
                .find_map(|format| NaiveTime::parse_from_str(time, format).ok())?,
            None => NaiveTime::from_hms_opt(0, 0, 0)?,
        };
        Some(date.and_time(time))
    }
}

/// Split on a separator word surrounded by whitespace, ignoring ASCII case.
fn split_word<'a>(text: &'a str, word: &str) -> Option<(&'a str, &'a str)> {
    let mut offset = 0;
    for token in text.split_whitespace() {
        let start = offset + text[offset..].find(token)?;
        let end = start + token.len();
        offset = end;
        if start > 0 && token.eq_ignore_ascii_case(word) {
            return Some((&text[..start], &text[end..]));
        }
    }
    None
}
