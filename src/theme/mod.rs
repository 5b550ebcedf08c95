//! Theme preference and the light/dark value derived from it.

mod detect;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use detect::{FixedProbe, OsProbe, SignalProbe, SignalSource, TerminalProbe};

/// The theme mode a user picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    Light,
    Dark,
    #[default]
    Auto,
}

impl Preference {
    pub const ALL: [Self; 3] = [Self::Light, Self::Dark, Self::Auto];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Auto => "auto",
        }
    }

    /// Next value in the toggle order `light -> dark -> auto -> light`.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Auto,
            Self::Auto => Self::Light,
        }
    }

    /// Resolve against the OS dark-mode signal.
    pub const fn resolve(self, system_prefers_dark: bool) -> EffectiveTheme {
        match self {
            Self::Light => EffectiveTheme::Light,
            Self::Dark => EffectiveTheme::Dark,
            Self::Auto => EffectiveTheme::from_signal(system_prefers_dark),
        }
    }
}

impl fmt::Display for Preference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of `light`, `dark` or `auto`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid theme preference {0:?}: expected light, dark or auto")]
pub struct InvalidPreference(pub String);

impl FromStr for Preference {
    type Err = InvalidPreference;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "auto" => Ok(Self::Auto),
            other => Err(InvalidPreference(other.to_string())),
        }
    }
}

/// The theme actually applied to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectiveTheme {
    Light,
    Dark,
}

impl EffectiveTheme {
    pub const fn from_signal(prefers_dark: bool) -> Self {
        if prefers_dark { Self::Dark } else { Self::Light }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub const fn is_dark(self) -> bool {
        matches!(self, Self::Dark)
    }
}

impl fmt::Display for EffectiveTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_the_three_literals() {
        assert_eq!("light".parse::<Preference>(), Ok(Preference::Light));
        assert_eq!("dark".parse::<Preference>(), Ok(Preference::Dark));
        assert_eq!("auto".parse::<Preference>(), Ok(Preference::Auto));
    }

    #[test]
    fn parse_rejects_padded_literals() {
        assert_eq!(
            " dark\n".parse::<Preference>(),
            Err(InvalidPreference(" dark\n".into()))
        );
        assert!("auto ".parse::<Preference>().is_err());
    }

    #[test]
    fn parse_rejects_other_values() {
        let err = "blue".parse::<Preference>().unwrap_err();
        assert_eq!(err, InvalidPreference("blue".into()));
        assert!(err.to_string().contains("blue"));

        assert!("Dark".parse::<Preference>().is_err());
        assert!("".parse::<Preference>().is_err());
    }

    #[test]
    fn display_matches_storage_literal() {
        for pref in Preference::ALL {
            assert_eq!(pref.to_string().parse::<Preference>(), Ok(pref));
        }
    }

    #[test]
    fn next_cycles_through_all_three() {
        assert_eq!(Preference::Light.next(), Preference::Dark);
        assert_eq!(Preference::Dark.next(), Preference::Auto);
        assert_eq!(Preference::Auto.next(), Preference::Light);
        assert_eq!(Preference::Light.next().next().next(), Preference::Light);
    }

    #[test]
    fn resolve_is_dark_only_for_dark_or_auto_with_dark_signal() {
        for pref in Preference::ALL {
            for signal in [false, true] {
                let expected = pref == Preference::Dark || (pref == Preference::Auto && signal);
                assert_eq!(pref.resolve(signal).is_dark(), expected, "{pref} / {signal}");
            }
        }
    }

    #[test]
    fn default_preference_is_auto() {
        assert_eq!(Preference::default(), Preference::Auto);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Preference::Auto).unwrap(), "\"auto\"");
        assert_eq!(serde_json::to_string(&EffectiveTheme::Dark).unwrap(), "\"dark\"");
    }
}
