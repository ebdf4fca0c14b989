use serde::{Deserialize, Serialize};
use std::{fs, time::Duration};

use crate::Status;

/// Client settings, usually loaded from a JSON file next to the binary.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,

    #[serde(default)]
    pub access_token: Option<String>,

    /// Name used in the conversation greeting.
    #[serde(default)]
    pub user_name: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Upper bound for a whole chat turn, classification through mutation.
    #[serde(default = "default_turn_timeout_secs")]
    pub turn_timeout_secs: u64,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, Status> {
        let text = fs::read_to_string(path)
            .map_err(|e| Status::new(&format!("Failed to read config file '{path}'"), e))?;
        let config = serde_json::from_str::<Config>(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Status> {
        if self.api_url.trim().is_empty() {
            return Err(Status::invalid_argument("Config 'api_url' is empty"));
        }
        if self.request_timeout_secs == 0 || self.turn_timeout_secs == 0 {
            return Err(Status::invalid_argument("Config timeouts must be positive"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: DEFAULT_API_URL.to_owned(),
            access_token: None,
            user_name: None,
            request_timeout_secs: default_request_timeout_secs(),
            turn_timeout_secs: default_turn_timeout_secs(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_turn_timeout_secs() -> u64 {
    30
}

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
