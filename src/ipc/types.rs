use std::path::PathBuf;

use serde::Deserialize;

use crate::roster::Roster;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub data_dir: Option<PathBuf>,
    pub roster: Option<Roster>,
    /// Document-service base URL, set alongside the roster load.
    pub service_url: Option<String>,
}
