use crate::error::{AppError, Result};
use crate::types::{ApiResponse, Record};
use crate::util::redact_url;
use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const USER_AGENT: &str = concat!("mgnrega_report/", env!("CARGO_PKG_VERSION"));

// No request timeout: a slow answer is applied whenever it arrives.
static CLIENT: Lazy<reqwest::blocking::Client> = Lazy::new(|| {
    reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(None::<Duration>)
        .build()
        .unwrap_or_default()
});

/// Plain text GET. The seam that lets tests replace the network.
pub trait HttpGet {
    fn get_text(&self, url: &str) -> Result<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ReqwestHttp;

impl HttpGet for ReqwestHttp {
    fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET {}", redact_url(url));
        let transport = |source: reqwest::Error| AppError::Transport {
            url: redact_url(url).to_string(),
            source,
        };
        let resp = CLIENT.get(url).send().map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::Status {
                url: redact_url(url).to_string(),
                status: status.as_u16(),
            });
        }
        resp.text().map_err(transport)
    }
}

/// Result of asking the source for records.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// `records` was missing or empty. Not an error.
    Empty,
    Loaded(Vec<Record>),
}

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub total_records: usize,
    pub skipped_entries: usize,
    pub fetched_at: DateTime<Local>,
}

/// Decode a `{ "records": [...] }` body. Entries that are not JSON objects are
/// skipped rather than failing the whole load.
pub fn decode_records_body(body: &str) -> Result<(FetchOutcome, LoadReport)> {
    let parsed: ApiResponse = serde_json::from_str(body)?;
    let raw = parsed.records.unwrap_or_default();
    let total = raw.len();
    let records: Vec<Record> = raw
        .into_iter()
        .filter_map(|v| match v {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();
    let skipped = total - records.len();
    if skipped > 0 {
        warn!("{} record entries were not objects and were skipped", skipped);
    }
    let report = LoadReport {
        total_records: records.len(),
        skipped_entries: skipped,
        fetched_at: Local::now(),
    };
    if records.is_empty() {
        return Ok((FetchOutcome::Empty, report));
    }
    Ok((FetchOutcome::Loaded(records), report))
}

/// One GET of the records endpoint.
pub fn fetch_records<H: HttpGet + ?Sized>(http: &H, url: &str) -> Result<(FetchOutcome, LoadReport)> {
    info!("fetching records from {}", redact_url(url));
    let body = http.get_text(url)?;
    let out = decode_records_body(&body)?;
    info!("received {} records", out.1.total_records);
    Ok(out)
}

/// Load a saved API response from disk instead of the network.
pub fn load_records_from_file(path: &Path) -> Result<(FetchOutcome, LoadReport)> {
    info!("loading records from {}", path.display());
    let body = std::fs::read_to_string(path)?;
    decode_records_body(&body)
}
