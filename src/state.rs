use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// State carried between runs.
///
/// Holds the hysteresis flag biasing the price thresholds, the last state the
/// actuation scripts were driven to, and the predictor's consumption history.
/// This is the only state outliving a single optimization run.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RunState {
    #[serde(default)]
    pub last_charging_state: bool,

    #[serde(default)]
    pub last_applied_state: Option<bool>,

    #[serde(default)]
    pub load_history: Vec<Vec<f64>>,
}

impl RunState {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_from(path: &Path) -> Self {
        Self::read_fallibly_from(path).unwrap_or_else(|error| {
            error!(error = %format!("{error:#}"), "failed to read the state file");
            Self::default()
        })
    }

    fn read_fallibly_from(path: &Path) -> Result<Self> {
        if path.is_file() {
            Ok(toml::from_str(&std::fs::read_to_string(path)?)?)
        } else {
            Ok(Self::default())
        }
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn write_to(&self, path: &Path) {
        match toml::to_string(self) {
            Ok(serialized) => {
                if let Err(error) = std::fs::write(path, serialized) {
                    error!(error = %format!("{error:#}"), "failed to write the state file");
                }
            }
            Err(error) => error!(error = %format!("{error:#}"), "failed to serialize the state"),
        }
    }
}
