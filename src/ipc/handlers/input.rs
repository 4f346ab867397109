use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::normalize;
use serde_json::json;

/// Live-counter op: normalize pasted text and report the survivors.
/// Works without a loaded roster; membership comes later.
fn handle_normalize(req: &Request) -> serde_json::Value {
    let Some(text) = req.params.get("text").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.text", None);
    };
    let ids = normalize::normalize_ids(text);
    ok(
        &req.id,
        json!({
            "ids": ids,
            "count": ids.len(),
        }),
    )
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "input.normalize" => Some(handle_normalize(req)),
        _ => None,
    }
}
