use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::normalize;
use crate::pdf::PdfRenderer;
use crate::report::{
    GenerateError, Generator, HttpDocumentService, DEFAULT_SERVICE_URL,
};
use crate::roster::Roster;
use serde_json::json;
use std::path::PathBuf;

struct GenerateParams {
    ids: Vec<String>,
    out_dir: PathBuf,
}

/// Accepts either raw text (normalized here) or an already-normalized
/// ID array, matching the two ways the page drives generation.
fn parse_generate_params(req: &Request) -> Result<GenerateParams, serde_json::Value> {
    let out_dir = req
        .params
        .get("outDir")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
        .ok_or_else(|| err(&req.id, "bad_params", "missing params.outDir", None))?;

    if let Some(text) = req.params.get("text").and_then(|v| v.as_str()) {
        return Ok(GenerateParams {
            ids: normalize::normalize_ids(text),
            out_dir,
        });
    }
    if let Some(arr) = req.params.get("ids").and_then(|v| v.as_array()) {
        let ids = arr
            .iter()
            .map(|v| {
                v.as_str().map(|s| s.to_string()).ok_or_else(|| {
                    err(&req.id, "bad_params", "params.ids must be strings", None)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(GenerateParams { ids, out_dir });
    }
    Err(err(
        &req.id,
        "bad_params",
        "missing params.text or params.ids",
        None,
    ))
}

fn roster_of<'a>(state: &'a AppState, req: &Request) -> Result<&'a Roster, serde_json::Value> {
    state
        .roster
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_roster", "load a roster first", None))
}

fn handle_generate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let params = match parse_generate_params(req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let roster = match roster_of(state, req) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let base_url = state
        .service_url
        .clone()
        .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());

    let service = HttpDocumentService::new(&base_url);
    let renderer = PdfRenderer::new();
    let generator = Generator::new(&service, &renderer);

    let report = match generator.run(roster, &params.ids) {
        Ok(r) => r,
        Err(GenerateError::EmptyInput) => {
            return err(
                &req.id,
                "empty_input",
                "enter at least one valid student ID",
                None,
            )
        }
        Err(GenerateError::UnknownIds(list)) => {
            return err(
                &req.id,
                "unknown_ids",
                format!("unknown student IDs: {}", list.join(", ")),
                Some(json!({ "unknownIds": list })),
            )
        }
        Err(GenerateError::FallbackRender(e)) => {
            return err(&req.id, "fallback_render_failed", format!("{e:#}"), None)
        }
    };

    let path = params.out_dir.join(&report.filename);
    if let Err(e) = std::fs::create_dir_all(&params.out_dir)
        .and_then(|_| std::fs::write(&path, &report.bytes))
    {
        return err(
            &req.id,
            "write_failed",
            format!("write {}: {}", path.display(), e),
            None,
        );
    }

    tracing::info!(
        path = %path.display(),
        strategy = report.strategy.as_str(),
        count = report.count,
        "report written"
    );
    ok(
        &req.id,
        json!({
            "filename": report.filename,
            "path": path.to_string_lossy(),
            "count": report.count,
            "strategy": report.strategy.as_str(),
            "warnings": report.warnings,
        }),
    )
}

fn handle_service_check(state: &mut AppState, req: &Request) -> serde_json::Value {
    let base_url = req
        .params
        .get("serviceUrl")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .or_else(|| state.service_url.clone())
        .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());

    let service = HttpDocumentService::new(&base_url);
    match service.health_check() {
        Ok(()) => ok(&req.id, json!({ "serviceUrl": base_url, "healthy": true })),
        Err(e) => err(
            &req.id,
            "primary_service_failed",
            format!("{e:#}"),
            Some(json!({ "serviceUrl": base_url })),
        ),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "report.generate" => Some(handle_generate(state, req)),
        "report.serviceCheck" => Some(handle_service_check(state, req)),
        _ => None,
    }
}
