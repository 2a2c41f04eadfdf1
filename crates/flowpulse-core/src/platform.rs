use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A tracked popularity source.
///
/// The string forms (`"youtube"`, `"forum"`, `"google"`) are what the
/// database and API use; `Google` is the search-trend source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Forum,
    Google,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Youtube, Platform::Forum, Platform::Google];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Forum => "forum",
            Platform::Google => "google",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown platform: {0}")]
pub struct PlatformParseError(pub String);

impl std::str::FromStr for Platform {
    type Err = PlatformParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "youtube" => Ok(Platform::Youtube),
            "forum" => Ok(Platform::Forum),
            "google" => Ok(Platform::Google),
            other => Err(PlatformParseError(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for platform in Platform::ALL {
            assert_eq!(platform.as_str().parse::<Platform>(), Ok(platform));
        }
    }

    #[test]
    fn rejects_unknown_platform() {
        let err = "tiktok".parse::<Platform>().unwrap_err();
        assert_eq!(err, PlatformParseError("tiktok".to_owned()));
    }

    #[test]
    fn serde_uses_lowercase_strings() {
        let json = serde_json::to_string(&Platform::Google).expect("serialize");
        assert_eq!(json, "\"google\"");
        let parsed: Platform = serde_json::from_str("\"forum\"").expect("deserialize");
        assert_eq!(parsed, Platform::Forum);
    }
}
