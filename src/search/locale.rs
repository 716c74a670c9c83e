use serde::{Deserialize, Serialize};

/// Language/country pairing sent to the search API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Es,
    En,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::Es, Locale::En];

    /// Value for the `gl` (country) parameter.
    pub fn country(self) -> &'static str {
        match self {
            Locale::Es => "es",
            Locale::En => "us",
        }
    }

    /// Value for the `hl` (interface language) parameter.
    pub fn language(self) -> &'static str {
        match self {
            Locale::Es => "es",
            Locale::En => "en",
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.language())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spanish_targets_spain() {
        assert_eq!(Locale::Es.country(), "es");
        assert_eq!(Locale::Es.language(), "es");
    }

    #[test]
    fn english_targets_us() {
        assert_eq!(Locale::En.country(), "us");
        assert_eq!(Locale::En.language(), "en");
    }

    #[test]
    fn locale_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Locale::Es).unwrap(), r#""es""#);
        let en: Locale = serde_json::from_str(r#""en""#).unwrap();
        assert_eq!(en, Locale::En);
    }
}
