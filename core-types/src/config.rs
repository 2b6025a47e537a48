// Copyright (c) James Kassemi, SC, US. All rights reserved.

use config::{Config, ConfigError};
use serde::{Deserialize, Serialize};

/// Runtime knobs for the monitor, loadable from `config.toml` and `APP_*`
/// environment overrides. Periods are minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_event_reader_url")]
    pub event_reader_url: String,
    #[serde(default = "default_lookback_period")]
    pub max_lookback_period: i64,
    #[serde(default = "default_lookback_period")]
    pub superseded_check_period: i64,
    #[serde(default = "default_check_frequency")]
    pub check_frequency: u64,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_app_name")]
    pub app_system_code: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(config::File::with_name("config.toml").required(false))
            .add_source(config::Environment::with_prefix("APP"))
            .build()?;
        settings.try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            event_reader_url: default_event_reader_url(),
            max_lookback_period: default_lookback_period(),
            superseded_check_period: default_lookback_period(),
            check_frequency: default_check_frequency(),
            content_type: default_content_type(),
            app_name: default_app_name(),
            app_system_code: default_app_name(),
            port: default_port(),
        }
    }
}

fn default_event_reader_url() -> String {
    "http://localhost:8080".to_string()
}

// three days
fn default_lookback_period() -> i64 {
    4320
}

fn default_check_frequency() -> u64 {
    5
}

fn default_content_type() -> String {
    "Annotations".to_string()
}

fn default_app_name() -> String {
    "annotations-monitor".to_string()
}

fn default_port() -> u16 {
    8084
}
