use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use sorting::error;
use sorting::config::Settings;
use sorting::error::{Chainable, Result};
use sorting::value::{Format, Toml, Value};

/// Looked up in the template directory, then in its parent.
pub const CONFIG_FILE: &str = "sortview.toml";

#[derive(Default, Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub sorting: Settings,
    #[serde(flatten)]
    pub globals: FxHashMap<String, Value>,
}

impl Config {
    /// Reads `explicit` if given, otherwise the first [`CONFIG_FILE`] found
    /// beside `templates`. Without either, the defaults apply.
    pub fn discover(explicit: Option<&Path>, templates: &Path) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::find(templates),
        };

        let Some(path) = path else {
            tracing::debug!(dir = %templates.display(), "no {CONFIG_FILE} found, using defaults");
            return Ok(Config::default());
        };

        let config: Config = Toml::read(path.as_path()).chain_with(|| error! {
            "failed to read configuration",
            "path" => path.display(),
        })?;

        tracing::debug!(path = %path.display(), ?config, "loaded configuration");
        Ok(config)
    }

    fn find(templates: &Path) -> Option<PathBuf> {
        [Some(templates), templates.parent()]
            .into_iter()
            .flatten()
            .map(|dir| dir.join(CONFIG_FILE))
            .find(|path| path.is_file())
    }
}
