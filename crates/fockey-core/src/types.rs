//! Core type definitions for Fockey
//!
//! These types map directly to the records the extension persists and are
//! used throughout the evaluation core.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::normalize_domain_rule;
use crate::error::{Error, Result};

/// Milliseconds since the Unix epoch.
pub type TimestampMs = i64;

// =============================================================================
// Days of week
// =============================================================================

bitflags::bitflags! {
    /// Set of days a schedule applies to. Bit `n` is day `n`, 0 = Sunday.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DayMask: u8 {
        const SUNDAY = 1 << 0;
        const MONDAY = 1 << 1;
        const TUESDAY = 1 << 2;
        const WEDNESDAY = 1 << 3;
        const THURSDAY = 1 << 4;
        const FRIDAY = 1 << 5;
        const SATURDAY = 1 << 6;

        /// Monday through Friday
        const WEEKDAYS = Self::MONDAY.bits()
            | Self::TUESDAY.bits()
            | Self::WEDNESDAY.bits()
            | Self::THURSDAY.bits()
            | Self::FRIDAY.bits();
        /// Saturday and Sunday
        const WEEKEND = Self::SATURDAY.bits() | Self::SUNDAY.bits();
        /// Every day
        const EVERY_DAY = 0x7F;
    }
}

impl DayMask {
    /// Day from its index (0 = Sunday .. 6 = Saturday).
    pub fn from_index(day: u8) -> Option<Self> {
        if day <= 6 {
            Some(Self::from_bits_truncate(1 << day))
        } else {
            None
        }
    }

    pub fn from_indices<I: IntoIterator<Item = u8>>(days: I) -> Option<Self> {
        let mut mask = Self::empty();
        for day in days {
            mask |= Self::from_index(day)?;
        }
        Some(mask)
    }

    pub fn from_weekday(weekday: chrono::Weekday) -> Self {
        Self::from_bits_truncate(1 << weekday.num_days_from_sunday())
    }

    pub fn contains_weekday(&self, weekday: chrono::Weekday) -> bool {
        self.contains(Self::from_weekday(weekday))
    }

    /// Sorted day indices.
    pub fn indices(&self) -> Vec<u8> {
        (0..7u8).filter(|day| self.bits() & (1 << day) != 0).collect()
    }

    /// Parse a single day name ("mon", "tuesday", ...) or index ("0".."6").
    pub fn parse_day(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        if let Ok(index) = name.parse::<u8>() {
            return Self::from_index(index);
        }
        match name.as_str() {
            "sun" | "sunday" => Some(Self::SUNDAY),
            "mon" | "monday" => Some(Self::MONDAY),
            "tue" | "tues" | "tuesday" => Some(Self::TUESDAY),
            "wed" | "wednesday" => Some(Self::WEDNESDAY),
            "thu" | "thurs" | "thursday" => Some(Self::THURSDAY),
            "fri" | "friday" => Some(Self::FRIDAY),
            "sat" | "saturday" => Some(Self::SATURDAY),
            "weekdays" => Some(Self::WEEKDAYS),
            "weekend" => Some(Self::WEEKEND),
            "daily" | "everyday" => Some(Self::EVERY_DAY),
            _ => None,
        }
    }

    /// Parse a comma-separated day list, e.g. `mon,wed,fri` or `weekdays`.
    pub fn parse_list(text: &str) -> Option<Self> {
        let mut mask = Self::empty();
        for part in text.split(',').filter(|p| !p.trim().is_empty()) {
            mask |= Self::parse_day(part)?;
        }
        Some(mask)
    }
}

impl Serialize for DayMask {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.indices().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DayMask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let days = Vec::<u8>::deserialize(deserializer)?;
        Self::from_indices(days.iter().copied()).ok_or_else(|| {
            serde::de::Error::custom(format!("day index out of range in {days:?}"))
        })
    }
}

// =============================================================================
// Rules
// =============================================================================

/// Which list of a rule set a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub enum RuleKind {
    /// Domain, wildcard domain or domain with path prefix
    Domain,
    /// Substring of the page URL
    UrlKeyword,
    /// Substring of page content (titles, channel names)
    ContentKeyword,
}

impl RuleKind {
    /// Canonical form of a user-entered value, or `None` if nothing usable remains.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        match self {
            Self::Domain => normalize_domain_rule(raw),
            Self::UrlKeyword | Self::ContentKeyword => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::UrlKeyword => "urlKeyword",
            Self::ContentKeyword => "contentKeyword",
        }
    }
}

impl FromStr for RuleKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "domain" | "domains" | "site" => Ok(Self::Domain),
            "url" | "urlkeyword" | "url-keyword" | "url_keyword" => Ok(Self::UrlKeyword),
            "content" | "contentkeyword" | "content-keyword" | "content_keyword" | "keyword" => {
                Ok(Self::ContentKeyword)
            }
            _ => Err(Error::InvalidRule(s.to_string())),
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three blocking lists shared by schedules and Quick Block sessions.
///
/// Lists keep insertion order for display and never hold duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct RuleSet {
    #[serde(default)]
    pub blocked_domains: Vec<String>,
    #[serde(default)]
    pub url_keywords: Vec<String>,
    #[serde(default)]
    pub content_keywords: Vec<String>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.blocked_domains.is_empty() && self.url_keywords.is_empty() && self.content_keywords.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocked_domains.len() + self.url_keywords.len() + self.content_keywords.len()
    }

    pub fn list(&self, kind: RuleKind) -> &[String] {
        match kind {
            RuleKind::Domain => &self.blocked_domains,
            RuleKind::UrlKeyword => &self.url_keywords,
            RuleKind::ContentKeyword => &self.content_keywords,
        }
    }

    fn list_mut(&mut self, kind: RuleKind) -> &mut Vec<String> {
        match kind {
            RuleKind::Domain => &mut self.blocked_domains,
            RuleKind::UrlKeyword => &mut self.url_keywords,
            RuleKind::ContentKeyword => &mut self.content_keywords,
        }
    }

    /// Normalize and append a value. Returns `Ok(false)` if it was already present.
    pub fn insert(&mut self, kind: RuleKind, raw: &str) -> Result<bool> {
        let value = kind
            .normalize(raw)
            .ok_or_else(|| Error::InvalidRule(raw.to_string()))?;
        let list = self.list_mut(kind);
        if list.iter().any(|existing| existing.eq_ignore_ascii_case(&value)) {
            return Ok(false);
        }
        list.push(value);
        Ok(true)
    }

    /// Remove a value (compared in normalized form). Returns whether anything was removed.
    pub fn remove(&mut self, kind: RuleKind, raw: &str) -> bool {
        let value = kind.normalize(raw).unwrap_or_else(|| raw.trim().to_string());
        let list = self.list_mut(kind);
        let before = list.len();
        list.retain(|existing| !existing.eq_ignore_ascii_case(&value));
        list.len() != before
    }

    /// Iterate `(kind, value)` over all three lists.
    pub fn iter(&self) -> impl Iterator<Item = (RuleKind, &str)> + '_ {
        let domains = self.blocked_domains.iter().map(|v| (RuleKind::Domain, v.as_str()));
        let urls = self.url_keywords.iter().map(|v| (RuleKind::UrlKeyword, v.as_str()));
        let content = self.content_keywords.iter().map(|v| (RuleKind::ContentKeyword, v.as_str()));
        domains.chain(urls).chain(content)
    }
}
