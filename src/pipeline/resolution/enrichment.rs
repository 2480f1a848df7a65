use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What the enrichment service knows about a product. Closed outcome
/// set — provider response shapes never leak past this boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Hit {
        manual_url: String,
        warranty_length: String,
    },
    /// The service confirmed it has nothing for this product.
    Miss,
}

#[derive(Error, Debug, Clone)]
pub enum LookupError {
    #[error("enrichment service unreachable at {0}")]
    Connection(String),

    #[error("enrichment request timed out after {0}s")]
    Timeout(u64),

    #[error("enrichment service error (status {status}): {body}")]
    Service { status: u16, body: String },

    #[error("malformed enrichment response: {0}")]
    Malformed(String),
}

impl LookupError {
    /// Transient errors are worth retrying; a malformed response or a
    /// client-side rejection is not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout(_) => true,
            Self::Service { status, .. } => *status == 429 || *status >= 500,
            Self::Malformed(_) => false,
        }
    }
}

/// External manual/warranty lookup capability. Best-effort oracle: the
/// resolver treats it as opaque and only sees the closed outcome set.
pub trait EnrichmentLookup: Send + Sync {
    fn lookup(
        &self,
        brand: &str,
        model_number: &str,
        product_name: &str,
    ) -> Result<LookupOutcome, LookupError>;
}

/// Request body for the lookup endpoint
#[derive(Serialize)]
struct LookupRequest<'a> {
    brand: &'a str,
    model_number: &'a str,
    product_name: &'a str,
}

/// Response body from the lookup endpoint
#[derive(Deserialize)]
struct LookupResponse {
    found: bool,
    manual_url: Option<String>,
    warranty_length: Option<String>,
}

/// HTTP client for the enrichment service.
pub struct HttpEnrichmentClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpEnrichmentClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        }
    }

    /// Client for the endpoint configured in `config`.
    pub fn from_config() -> Self {
        Self::new(
            &crate::config::enrichment_base_url(),
            crate::config::enrichment_timeout_secs(),
        )
    }
}

impl EnrichmentLookup for HttpEnrichmentClient {
    fn lookup(
        &self,
        brand: &str,
        model_number: &str,
        product_name: &str,
    ) -> Result<LookupOutcome, LookupError> {
        let url = format!("{}/v1/manuals/lookup", self.base_url);
        let body = LookupRequest {
            brand,
            model_number,
            product_name,
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                LookupError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                LookupError::Timeout(self.timeout_secs)
            } else {
                LookupError::Service {
                    status: 0,
                    body: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Ok(LookupOutcome::Miss);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LookupError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: LookupResponse = response
            .json()
            .map_err(|e| LookupError::Malformed(e.to_string()))?;

        if !parsed.found {
            return Ok(LookupOutcome::Miss);
        }
        match parsed.manual_url {
            Some(manual_url) if !manual_url.trim().is_empty() => Ok(LookupOutcome::Hit {
                manual_url,
                warranty_length: parsed.warranty_length.unwrap_or_default(),
            }),
            _ => Err(LookupError::Malformed(
                "found=true without a manual_url".into(),
            )),
        }
    }
}

/// Mock lookup for testing — plays back scripted outcomes in order (the
/// last one repeats) and counts calls.
pub struct MockEnrichmentLookup {
    script: Mutex<Vec<Result<LookupOutcome, LookupError>>>,
    calls: AtomicUsize,
}

impl MockEnrichmentLookup {
    pub fn scripted(script: Vec<Result<LookupOutcome, LookupError>>) -> Self {
        Self {
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always answers with the same hit.
    pub fn hit(manual_url: &str, warranty_length: &str) -> Self {
        Self::scripted(vec![Ok(LookupOutcome::Hit {
            manual_url: manual_url.to_string(),
            warranty_length: warranty_length.to_string(),
        })])
    }

    /// Always answers not-found.
    pub fn miss() -> Self {
        Self::scripted(vec![Ok(LookupOutcome::Miss)])
    }

    /// Always fails with a transient timeout.
    pub fn transient() -> Self {
        Self::scripted(vec![Err(LookupError::Timeout(15))])
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EnrichmentLookup for MockEnrichmentLookup {
    fn lookup(
        &self,
        _brand: &str,
        _model_number: &str,
        _product_name: &str,
    ) -> Result<LookupOutcome, LookupError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock().expect("mock lock poisoned");
        let idx = n.min(script.len().saturating_sub(1));
        script
            .get(idx)
            .cloned()
            .unwrap_or(Ok(LookupOutcome::Miss))
    }
}
