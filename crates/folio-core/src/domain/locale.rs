use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Supported content languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Zh,
    Es,
    Fr,
}

impl Locale {
    pub const ALL: [Locale; 4] = [Locale::En, Locale::Zh, Locale::Es, Locale::Fr];

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Zh => "zh",
            Locale::Es => "es",
            Locale::Fr => "fr",
        }
    }
}

impl FromStr for Locale {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::ALL
            .into_iter()
            .find(|locale| locale.as_str() == s)
            .ok_or_else(|| DomainError::UnsupportedLocale(s.to_string()))
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_codes() {
        assert_eq!("zh".parse::<Locale>().unwrap(), Locale::Zh);
        assert_eq!(Locale::default(), Locale::En);
    }

    #[test]
    fn test_rejects_unknown_code() {
        let err = "de".parse::<Locale>().unwrap_err();
        assert!(matches!(err, DomainError::UnsupportedLocale(code) if code == "de"));
        // Codes are exact, not case-folded.
        assert!("EN".parse::<Locale>().is_err());
    }
}
