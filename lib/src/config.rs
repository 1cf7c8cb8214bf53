use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, Chainable};
use crate::value::{Format, Toml};

/// Process-wide sorting options, read once at startup and handed to the
/// template engine.
///
/// ```rust
/// use sorting::config::Settings;
///
/// let settings = Settings::from_toml("invalid_field_raises_404 = true").unwrap();
/// assert!(settings.invalid_field_raises_404);
/// assert_eq!(settings.sort_up, "&uarr;");
/// assert_eq!(settings.sort_down, "&darr;");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Shown after the title of a column sorted in ascending order.
    pub sort_up: String,
    /// Shown after the title of a column sorted in descending order.
    pub sort_down: String,
    /// Whether sorting on an unknown field is a not-found error rather than
    /// leaving the collection unsorted.
    pub invalid_field_raises_404: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            sort_up: "&uarr;".into(),
            sort_down: "&darr;".into(),
            invalid_field_raises_404: false,
        }
    }
}

impl Settings {
    pub fn from_toml(string: &str) -> Result<Self> {
        Toml::read(string)
    }

    pub fn read(path: &Path) -> Result<Self> {
        Toml::read(path).chain_with(|| error! {
            "failed to read sorting settings",
            "path" => path.display(),
        })
    }
}
