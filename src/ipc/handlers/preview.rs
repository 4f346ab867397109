use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::normalize;
use crate::report;
use serde_json::json;

/// Builds the preview card model for the UI: one card per matched
/// student, plus the unknown IDs so the page can flag them before the
/// user asks for a report.
fn handle_build(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(text) = req.params.get("text").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.text", None);
    };
    let Some(roster) = state.roster.as_ref() else {
        return err(&req.id, "no_roster", "load a roster first", None);
    };

    let ids = normalize::normalize_ids(text);
    let (known, unknown): (Vec<String>, Vec<String>) = {
        let (k, u) = roster.partition_known(&ids);
        (
            k.into_iter().map(|s| s.to_string()).collect(),
            u.into_iter().map(|s| s.to_string()).collect(),
        )
    };

    let cards: Vec<serde_json::Value> = report::report_entries(roster, &known)
        .into_iter()
        .map(|e| {
            json!({
                "ordinal": e.ordinal,
                "id": e.id,
                "name": e.name,
                "photoLabel": e.photo_label,
            })
        })
        .collect();

    let total = cards.len();
    ok(
        &req.id,
        json!({
            "students": cards,
            "total": total,
            "unknownIds": unknown,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "preview.build" => Some(handle_build(state, req)),
        _ => None,
    }
}
