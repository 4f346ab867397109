use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::report::DEFAULT_SERVICE_URL;
use crate::roster::Roster;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "dataDir": state.data_dir.as_ref().map(|p| p.to_string_lossy().to_string()),
            "students": state.roster.as_ref().map(|r| r.student_count()),
        }),
    )
}

fn handle_roster_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };
    let service_url = req
        .params
        .get("serviceUrl")
        .and_then(|v| v.as_str())
        .unwrap_or(DEFAULT_SERVICE_URL)
        .to_string();

    match Roster::load(&path) {
        Ok(roster) => {
            tracing::info!(
                students = roster.student_count(),
                photo_labels = roster.photo_label_count(),
                "roster loaded"
            );
            let result = json!({
                "students": roster.student_count(),
                "photoLabels": roster.photo_label_count(),
                "photoMappingLoaded": roster.photo_mapping_loaded(),
            });
            state.data_dir = Some(path);
            state.roster = Some(roster);
            state.service_url = Some(service_url);
            ok(&req.id, result)
        }
        Err(e) => err(&req.id, "roster_load_failed", format!("{e:#}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "roster.load" => Some(handle_roster_load(state, req)),
        _ => None,
    }
}
