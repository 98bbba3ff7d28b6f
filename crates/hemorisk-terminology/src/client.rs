//! Terminology server client
//!
//! `HttpTerminologyClient` talks to a FHIR terminology server using the
//! `ValueSet/$expand` operation. `StaticLookup` and `FailingLookup` are
//! in-process doubles for resolver and evaluator tests.

use crate::error::TerminologyError;
use async_trait::async_trait;
use hemorisk_types::CodeSet;
use log::debug;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Expands a terminology set reference into its member codes.
#[async_trait]
pub trait TerminologyLookup: Send + Sync {
    /// Fetch the expansion of `set_ref` from the server at `base_url`.
    async fn expand(
        &self,
        base_url: &str,
        token: &str,
        set_ref: &str,
    ) -> Result<CodeSet, TerminologyError>;
}

/// FHIR `$expand` client over HTTP.
///
/// Reads only the first expansion page; a set larger than the server's
/// page size resolves to a partial code set. Servers in practice return
/// complete expansions for the set sizes rule configurations use.
#[derive(Debug)]
pub struct HttpTerminologyClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTerminologyClient {
    /// Client with the default request timeout
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Client with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

impl Default for HttpTerminologyClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TerminologyLookup for HttpTerminologyClient {
    async fn expand(
        &self,
        base_url: &str,
        token: &str,
        set_ref: &str,
    ) -> Result<CodeSet, TerminologyError> {
        let url = format!("{}/ValueSet/$expand", base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .query(&[("url", set_ref)])
            .bearer_auth(token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| TerminologyError::request_failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TerminologyError::ServerStatus {
                status: response.status().as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TerminologyError::malformed(e.to_string()))?;
        parse_expansion(&body)
    }
}

/// Extract the member codes of an expanded ValueSet.
///
/// The `expansion` container is required; a missing `contains` array means
/// the set expanded to nothing. Entries without both system and code are
/// skipped.
fn parse_expansion(body: &Value) -> Result<CodeSet, TerminologyError> {
    let expansion = body
        .get("expansion")
        .ok_or_else(|| TerminologyError::malformed("response has no expansion"))?;

    let mut codes = CodeSet::new();
    if let Some(contains) = expansion.get("contains").and_then(Value::as_array) {
        for entry in contains {
            let system = entry.get("system").and_then(Value::as_str);
            let code = entry.get("code").and_then(Value::as_str);
            match (system, code) {
                (Some(system), Some(code)) => codes.insert(system, code),
                _ => debug!("Skipping expansion entry without system and code"),
            }
        }
    }
    Ok(codes)
}

/// A lookup serving fixed expansions, counting its calls.
#[derive(Default)]
pub struct StaticLookup {
    sets: HashMap<String, CodeSet>,
    calls: AtomicUsize,
}

impl StaticLookup {
    /// Lookup with no sets configured; everything expands to empty
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one expansion
    pub fn with_set(mut self, set_ref: impl Into<String>, codes: CodeSet) -> Self {
        self.sets.insert(set_ref.into(), codes);
        self
    }

    /// Number of expand calls served
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl TerminologyLookup for StaticLookup {
    async fn expand(
        &self,
        _base_url: &str,
        _token: &str,
        set_ref: &str,
    ) -> Result<CodeSet, TerminologyError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.sets.get(set_ref).cloned().unwrap_or_default())
    }
}

/// A lookup whose every call fails, counting its calls.
#[derive(Default)]
pub struct FailingLookup {
    calls: AtomicUsize,
}

impl FailingLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of expand calls attempted
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl TerminologyLookup for FailingLookup {
    async fn expand(
        &self,
        _base_url: &str,
        _token: &str,
        _set_ref: &str,
    ) -> Result<CodeSet, TerminologyError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Err(TerminologyError::request_failed("simulated server failure"))
    }
}
