//! Alert view filtering.

use std::str::FromStr;

use super::types::{ContentAlert, Platform, Sentiment};

/// A filter dimension: either everything, or exactly one value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Selector<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Selector<T> {
    /// Check a concrete value against the selector.
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Selector::All => true,
            Selector::Only(wanted) => wanted == value,
        }
    }

    /// Check an optional value. A missing value only passes `All`.
    pub fn matches_opt(&self, value: Option<&T>) -> bool {
        match self {
            Selector::All => true,
            Selector::Only(wanted) => value == Some(wanted),
        }
    }
}

impl<T: FromStr> FromStr for Selector<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(Selector::All)
        } else {
            s.parse().map(Selector::Only)
        }
    }
}

/// Apply platform and sentiment selectors to a slice of alerts.
///
/// Produces an independent subsequence: source order is preserved and
/// the input is untouched. Alerts with no sentiment only appear under
/// the `All` sentiment selector.
#[must_use]
pub fn filter_alerts(
    alerts: &[ContentAlert],
    platform: &Selector<Platform>,
    sentiment: &Selector<Sentiment>,
) -> Vec<ContentAlert> {
    alerts
        .iter()
        .filter(|alert| {
            platform.matches(&alert.platform) && sentiment.matches_opt(alert.sentiment.as_ref())
        })
        .cloned()
        .collect()
}
