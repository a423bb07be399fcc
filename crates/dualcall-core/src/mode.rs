//! Interaction mode
//!
//! An [`Api`](crate::Api) instance is bound to exactly one mode for its whole
//! lifetime. Every operation decorated through it presents the call shape of
//! that mode.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How decorated operations deliver their values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiMode {
    /// Each call resolves exactly one value
    #[default]
    #[serde(alias = "promise", alias = "one-shot")]
    OneShot,

    /// Each call delivers zero or more values over time until cancelled
    #[serde(alias = "rxjs")]
    Subscription,
}

impl ApiMode {
    /// Stable, lowercase name of the mode
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiMode::OneShot => "one-shot",
            ApiMode::Subscription => "subscription",
        }
    }

    /// Whether calls in this mode hand back continuous updates
    pub fn is_subscription(&self) -> bool {
        matches!(self, ApiMode::Subscription)
    }
}

impl fmt::Display for ApiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "one-shot" | "one_shot" | "oneshot" | "promise" => Ok(ApiMode::OneShot),
            "subscription" | "subscribe" | "rxjs" => Ok(ApiMode::Subscription),
            other => Err(crate::Error::config(format!(
                "Unknown API mode '{}'. Valid modes: one-shot, subscription",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("one-shot".parse::<ApiMode>().unwrap(), ApiMode::OneShot);
        assert_eq!("Promise".parse::<ApiMode>().unwrap(), ApiMode::OneShot);
        assert_eq!(" rxjs ".parse::<ApiMode>().unwrap(), ApiMode::Subscription);
        assert!("poll".parse::<ApiMode>().is_err());
    }

    #[test]
    fn serde_accepts_aliases() {
        let mode: ApiMode = serde_json::from_str("\"rxjs\"").unwrap();
        assert_eq!(mode, ApiMode::Subscription);

        let encoded = serde_json::to_string(&ApiMode::OneShot).unwrap();
        assert_eq!(encoded, "\"one_shot\"");
    }

    #[test]
    fn displayed_name_reads_back() {
        for mode in [ApiMode::OneShot, ApiMode::Subscription] {
            let logged = format!("\"{}\"", mode);
            let parsed: ApiMode = serde_json::from_str(&logged).unwrap();
            assert_eq!(parsed, mode);
            assert_eq!(mode.to_string().parse::<ApiMode>().unwrap(), mode);
        }
        assert!(ApiMode::Subscription.is_subscription());
        assert!(!ApiMode::OneShot.is_subscription());
    }
}
