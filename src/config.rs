use std::time::Duration;

use serde::Deserialize;

use crate::libraries::endpoint_state::EndpointState;
use crate::libraries::map_widget::MapView;
use crate::libraries::sync_controller::{RedrawStrategy, SyncSettings};
use crate::models::{Coordinate, SyncError};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Port the path service listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Where clients send path requests
    #[serde(default = "default_path_service_url")]
    pub path_service_url: String,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default)]
    pub redraw_strategy: RedrawStrategy,

    // Initial endpoints, also used as the map center (source)
    #[serde(default = "default_source_lat")]
    pub source_lat: f64,
    #[serde(default = "default_source_lng")]
    pub source_lng: f64,
    #[serde(default = "default_target_lat")]
    pub target_lat: f64,
    #[serde(default = "default_target_lng")]
    pub target_lng: f64,

    #[serde(default = "default_map_zoom")]
    pub map_zoom: u8,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env::<Config>()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            strategy: self.redraw_strategy,
            request_timeout: self.request_timeout(),
        }
    }

    /// Starting endpoints; fails if the configured defaults are out of range
    pub fn endpoints(&self) -> Result<EndpointState, SyncError> {
        Ok(EndpointState::new(
            Coordinate::new(self.source_lat, self.source_lng)?,
            Coordinate::new(self.target_lat, self.target_lng)?,
        ))
    }

    pub fn map_view(&self) -> Result<MapView, SyncError> {
        Ok(MapView {
            center: Coordinate::new(self.source_lat, self.source_lng)?,
            zoom: self.map_zoom,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            path_service_url: default_path_service_url(),
            request_timeout_ms: default_request_timeout_ms(),
            redraw_strategy: RedrawStrategy::default(),
            source_lat: default_source_lat(),
            source_lng: default_source_lng(),
            target_lat: default_target_lat(),
            target_lng: default_target_lng(),
            map_zoom: default_map_zoom(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_port() -> u16 {
    8888
}

fn default_path_service_url() -> String {
    "http://127.0.0.1:8888/".to_string()
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_source_lat() -> f64 {
    48.012653
}

fn default_source_lng() -> f64 {
    7.835194
}

fn default_target_lat() -> f64 {
    48.010683
}

fn default_target_lng() -> f64 {
    7.81776
}

fn default_map_zoom() -> u8 {
    15
}

fn default_user_agent() -> String {
    format!("route-sync/{}", env!("CARGO_PKG_VERSION"))
}
