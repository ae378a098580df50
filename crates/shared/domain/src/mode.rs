use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Build mode, resolved once at process start and passed by value into every task run.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Mode {
    /// Expanded output with source maps.
    #[default]
    #[strum(to_string = "development", serialize = "dev")]
    Development,
    /// Minified output, no source maps.
    #[strum(to_string = "production", serialize = "prod")]
    Production,
}

impl Mode {
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub const fn source_maps(self) -> bool {
        matches!(self, Self::Development)
    }

    #[must_use]
    pub const fn minify(self) -> bool {
        self.is_production()
    }
}
