use std::time::Duration;

use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use thiserror::Error;

use crate::roster::Roster;

pub const DEFAULT_SERVICE_URL: &str = "http://localhost:5000";
const SERVICE_TIMEOUT: Duration = Duration::from_secs(30);
const FAILOVER_DELAY: Duration = Duration::from_secs(1);
const FILENAME_PREFIX: &str = "absence_report";

static DISPOSITION_FILENAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"filename="([^"]+)""#).unwrap());

/// One row of the report/preview: ordinal position, identity, and the
/// photo label when the mapping has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub ordinal: usize,
    pub id: String,
    pub name: String,
    pub photo_label: Option<String>,
}

/// Builds entries for IDs already validated against the roster.
pub fn report_entries(roster: &Roster, ids: &[String]) -> Vec<ReportEntry> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| ReportEntry {
            ordinal: i + 1,
            id: id.clone(),
            name: roster.name_of(id).unwrap_or("Unknown student").to_string(),
            photo_label: roster.photo_label(id).map(|s| s.to_string()),
        })
        .collect()
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("enter at least one valid student ID")]
    EmptyInput,
    #[error("unknown student IDs: {}", .0.join(", "))]
    UnknownIds(Vec<String>),
    #[error("fallback render failed: {0}")]
    FallbackRender(#[source] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Service,
    Local,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Service => "service",
            Strategy::Local => "local",
        }
    }
}

/// Generator phases. Failover is a one-shot escalation: the primary is
/// never retried, and a fallback failure is terminal for the request.
#[derive(Debug)]
enum Phase {
    RequestingPrimary,
    FailingOver { reason: String },
    RequestingFallback,
    Succeeded(GeneratedReport),
    Failed(GenerateError),
}

pub struct ServiceDocument {
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
}

/// Primary strategy: the remote document service. Embeds real photos,
/// which the local renderer cannot.
pub trait DocumentService {
    fn generate(&self, ids: &[String]) -> anyhow::Result<ServiceDocument>;
}

/// Fallback strategy: local rasterization, photo labels only.
pub trait LocalRenderer {
    fn render(&self, entries: &[ReportEntry], generated: DateTime<Local>)
        -> anyhow::Result<Vec<u8>>;
}

#[derive(Debug)]
pub struct GeneratedReport {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub strategy: Strategy,
    pub count: usize,
    /// Primary-path failure message when the local fallback produced
    /// the document.
    pub warnings: Vec<String>,
}

pub struct Generator<'a> {
    service: &'a dyn DocumentService,
    renderer: &'a dyn LocalRenderer,
    failover_delay: Duration,
}

impl<'a> Generator<'a> {
    pub fn new(service: &'a dyn DocumentService, renderer: &'a dyn LocalRenderer) -> Generator<'a> {
        Generator {
            service,
            renderer,
            failover_delay: FAILOVER_DELAY,
        }
    }

    #[cfg(test)]
    fn with_failover_delay(mut self, delay: Duration) -> Generator<'a> {
        self.failover_delay = delay;
        self
    }

    /// Runs one request through the two-stage machine. Validation happens
    /// up front: an empty sequence or any unknown ID aborts the whole
    /// request before the primary strategy is contacted.
    pub fn run(&self, roster: &Roster, ids: &[String]) -> Result<GeneratedReport, GenerateError> {
        if ids.is_empty() {
            return Err(GenerateError::EmptyInput);
        }
        let (_, unknown) = roster.partition_known(ids);
        if !unknown.is_empty() {
            return Err(GenerateError::UnknownIds(
                unknown.into_iter().map(|s| s.to_string()).collect(),
            ));
        }

        let now = Local::now();
        let mut warnings = Vec::new();
        let mut phase = Phase::RequestingPrimary;

        loop {
            phase = match phase {
                Phase::RequestingPrimary => {
                    tracing::info!(count = ids.len(), "requesting document from service");
                    match self.service.generate(ids) {
                        Ok(doc) => {
                            let filename = doc
                                .filename
                                .as_deref()
                                .and_then(sanitize_filename)
                                .unwrap_or_else(|| default_filename(now));
                            Phase::Succeeded(GeneratedReport {
                                bytes: doc.bytes,
                                filename,
                                strategy: Strategy::Service,
                                count: ids.len(),
                                warnings: std::mem::take(&mut warnings),
                            })
                        }
                        Err(e) => Phase::FailingOver {
                            reason: e.to_string(),
                        },
                    }
                }
                Phase::FailingOver { reason } => {
                    tracing::warn!(%reason, "document service failed, falling back to local render");
                    warnings.push(format!("document service failed: {}", reason));
                    std::thread::sleep(self.failover_delay);
                    Phase::RequestingFallback
                }
                Phase::RequestingFallback => {
                    let entries = report_entries(roster, ids);
                    match self.renderer.render(&entries, now) {
                        Ok(bytes) => Phase::Succeeded(GeneratedReport {
                            bytes,
                            filename: default_filename(now),
                            strategy: Strategy::Local,
                            count: ids.len(),
                            warnings: std::mem::take(&mut warnings),
                        }),
                        Err(e) => {
                            tracing::error!(error = %e, "local render failed");
                            Phase::Failed(GenerateError::FallbackRender(e))
                        }
                    }
                }
                Phase::Succeeded(report) => return Ok(report),
                Phase::Failed(err) => return Err(err),
            };
        }
    }
}

/// `absence_report_<YYYYMMDD>.pdf` from the local date, used whenever the
/// service does not name the file itself.
pub fn default_filename(now: DateTime<Local>) -> String {
    format!("{}_{}.pdf", FILENAME_PREFIX, now.format("%Y%m%d"))
}

/// Keeps only the final path component of a service-supplied filename.
/// The filename gets joined onto the caller's output directory, so a
/// service answering `filename="../escaped.pdf"` must not steer the
/// write elsewhere.
fn sanitize_filename(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or("").trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

/// Remote document service over HTTP: `POST {base}/generate-pdf` with the
/// validated ID list, binary document back.
pub struct HttpDocumentService {
    base_url: String,
}

impl HttpDocumentService {
    pub fn new(base_url: &str) -> HttpDocumentService {
        HttpDocumentService {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    // Built per call so a builder failure surfaces as a primary-path
    // failure and falls over like any other service error.
    fn client(&self) -> anyhow::Result<reqwest::blocking::Client> {
        Ok(reqwest::blocking::Client::builder()
            .timeout(SERVICE_TIMEOUT)
            .build()?)
    }

    pub fn health_check(&self) -> anyhow::Result<()> {
        let resp = self
            .client()?
            .get(format!("{}/health", self.base_url))
            .send()?;
        if !resp.status().is_success() {
            anyhow::bail!("service returned {}", resp.status());
        }
        Ok(())
    }
}

impl DocumentService for HttpDocumentService {
    fn generate(&self, ids: &[String]) -> anyhow::Result<ServiceDocument> {
        let resp = self
            .client()?
            .post(format!("{}/generate-pdf", self.base_url))
            .json(&json!({ "absentIds": ids }))
            .send()?;

        if !resp.status().is_success() {
            anyhow::bail!("service returned {}", resp.status());
        }

        let filename = resp
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| DISPOSITION_FILENAME.captures(v))
            .map(|c| c[1].to_string());

        let bytes = resp.bytes()?.to_vec();
        Ok(ServiceDocument { bytes, filename })
    }
}
