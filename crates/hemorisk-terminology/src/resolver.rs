//! Cache-first terminology resolution
//!
//! `resolve` degrades instead of failing: a set that cannot be resolved
//! right now yields `None`, which the evaluator treats as a non-match for
//! the rules referencing it. Failures are never cached, so the next
//! assessment retries the fetch.

use crate::cache::TerminologyCache;
use crate::client::TerminologyLookup;
use hemorisk_types::CodeSet;
use log::{debug, warn};
use std::sync::Arc;

/// Connection details for the terminology server.
///
/// Resolution requires both pieces; with either missing, every
/// non-cached set is a hard miss and no request is attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerContext {
    pub base_url: Option<String>,
    pub access_token: Option<String>,
}

impl ServerContext {
    /// Fully configured server context
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            access_token: Some(access_token.into()),
        }
    }

    /// No server configured
    pub fn none() -> Self {
        Self::default()
    }

    /// Base URL and token together, or `None` unless both are set
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.base_url, &self.access_token) {
            (Some(base), Some(token)) => Some((base, token)),
            _ => None,
        }
    }
}

/// Resolves set references to code sets through the cache.
pub struct TerminologyResolver {
    cache: TerminologyCache,
    lookup: Arc<dyn TerminologyLookup>,
}

impl TerminologyResolver {
    /// Resolver with a default-TTL cache
    pub fn new(lookup: Arc<dyn TerminologyLookup>) -> Self {
        Self::with_cache(TerminologyCache::new(), lookup)
    }

    /// Resolver over an explicit cache
    pub fn with_cache(cache: TerminologyCache, lookup: Arc<dyn TerminologyLookup>) -> Self {
        Self { cache, lookup }
    }

    /// The underlying cache
    pub fn cache(&self) -> &TerminologyCache {
        &self.cache
    }

    /// Resolve one set reference.
    ///
    /// Cache first; on a miss, fetch and cache the result. Returns `None`
    /// when the server is not configured or the fetch fails.
    pub async fn resolve(&self, server: &ServerContext, set_ref: &str) -> Option<Arc<CodeSet>> {
        if let Some(cached) = self.cache.get(set_ref) {
            return Some(cached);
        }
        let Some((base_url, token)) = server.credentials() else {
            debug!("Terminology set {set_ref} unresolvable: no server configured");
            return None;
        };
        match self.lookup.expand(base_url, token, set_ref).await {
            Ok(codes) => {
                debug!("Resolved terminology set {set_ref}: {} codes", codes.len());
                Some(self.cache.insert(set_ref, codes))
            }
            Err(e) => {
                warn!("Terminology set {set_ref} unresolvable: {e}");
                None
            }
        }
    }
}
