use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use gridsearch::WorldConfig;
use log::debug;

/// What the app uses to interact with the outside world: the session file and the terminal
pub struct Context {
    storage_path: PathBuf,
}

impl Context {
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
        }
    }

    pub fn get_storage<T: for<'de> serde::Deserialize<'de>>(&self) -> Option<T> {
        debug!("getting storage: path = {}", self.storage_path.display());
        let text = match fs::read_to_string(&self.storage_path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                log::error!(
                    "Failed to read storage {}: {}",
                    self.storage_path.display(),
                    e
                );
                return None;
            }
        };

        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                log::error!(
                    "Failed to parse storage {}: {}",
                    self.storage_path.display(),
                    e
                );
                None
            }
        }
    }

    pub fn set_storage<T: serde::Serialize>(&self, value: &T) -> anyhow::Result<()> {
        debug!("setting storage: path = {}", self.storage_path.display());
        let text = serde_json::to_string_pretty(value)?;
        fs::write(&self.storage_path, text)
            .with_context(|| format!("could not write {}", self.storage_path.display()))
    }

    pub fn set_output(&self, output: &str) {
        let mut stdout = io::stdout().lock();
        // a closed stdout is not worth failing a run over
        let _ = writeln!(stdout, "{}", output).and_then(|_| stdout.flush());
    }
}

/// Reads a config file, or the defaults when no file is given
pub fn load_config(path: Option<&Path>) -> anyhow::Result<WorldConfig> {
    let Some(path) = path else {
        return Ok(WorldConfig::default());
    };

    let text =
        fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))?;
    let config = serde_json::from_str(&text)
        .with_context(|| format!("could not parse config {}", path.display()))?;
    debug!("loaded config from {}: {:?}", path.display(), config);

    Ok(config)
}
