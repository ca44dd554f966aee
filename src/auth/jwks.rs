// ABOUTME: Per-issuer JWKS fetching and caching for IdP JWT verification
// ABOUTME: Applies environment-tuned timeouts, retries, and stale-use policy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::config::environment::Environment;
use crate::errors::{AppError, AppResult};
use dashmap::DashMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Cache TTL before a fresh fetch is attempted
const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Maximum staleness tolerated when a refresh fails (non-production only)
const STALE_USE_LIMIT: Duration = Duration::from_secs(60 * 60);

/// One RSA key from a JWKS document
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key id
    pub kid: String,
    /// Key type (`RSA` expected)
    pub kty: String,
    /// Modulus, base64url
    pub n: String,
    /// Exponent, base64url
    pub e: String,
}

#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<Jwk>,
}

#[derive(Debug, Clone)]
struct CachedJwks {
    keys: HashMap<String, Jwk>,
    fetched_at: Instant,
}

/// Shared per-issuer JWKS cache
///
/// Writers race benignly; the map is last-write-wins and every entry is a
/// complete fetch result.
pub struct JwksCache {
    client: reqwest::Client,
    environment: Environment,
    cache: DashMap<String, CachedJwks>,
}

impl JwksCache {
    /// Create a cache sharing the given HTTP client
    #[must_use]
    pub fn new(client: reqwest::Client, environment: Environment) -> Self {
        Self {
            client,
            environment,
            cache: DashMap::new(),
        }
    }

    const fn fetch_timeout(&self) -> Duration {
        if self.environment.is_production() {
            Duration::from_secs(5)
        } else {
            Duration::from_secs(10)
        }
    }

    const fn fetch_retries(&self) -> u32 {
        if self.environment.is_production() {
            0
        } else {
            1
        }
    }

    /// Resolve the signing key for `kid` published by `issuer`
    ///
    /// Serves from cache inside the TTL; on fetch failure outside production,
    /// a stale entry up to one hour old is still served.
    ///
    /// # Errors
    ///
    /// Returns an error if the JWKS cannot be fetched (and no tolerable stale
    /// copy exists) or the `kid` is not present in the document.
    pub async fn get_key(&self, issuer: &str, kid: &str) -> AppResult<Jwk> {
        if let Some(entry) = self.cache.get(issuer) {
            if entry.fetched_at.elapsed() < CACHE_TTL {
                if let Some(key) = entry.keys.get(kid) {
                    return Ok(key.clone());
                }
                // Unknown kid inside the TTL usually means key rotation; fall
                // through to a fresh fetch.
            }
        }

        match self.fetch_jwks(issuer).await {
            Ok(keys) => {
                let key = keys.get(kid).cloned();
                self.cache.insert(
                    issuer.to_owned(),
                    CachedJwks {
                        keys,
                        fetched_at: Instant::now(),
                    },
                );
                key.ok_or_else(|| {
                    AppError::auth_invalid(format!("Unknown signing key id: {kid}"))
                })
            }
            Err(fetch_err) => {
                if !self.environment.is_production() {
                    if let Some(entry) = self.cache.get(issuer) {
                        if entry.fetched_at.elapsed() < STALE_USE_LIMIT {
                            tracing::warn!(
                                issuer = %issuer,
                                "JWKS refresh failed, serving stale keys: {fetch_err}"
                            );
                            if let Some(key) = entry.keys.get(kid) {
                                return Ok(key.clone());
                            }
                        }
                    }
                }
                Err(fetch_err)
            }
        }
    }

    async fn fetch_jwks(&self, issuer: &str) -> AppResult<HashMap<String, Jwk>> {
        let url = format!("{}/.well-known/jwks.json", issuer.trim_end_matches('/'));
        let mut last_error = None;

        for attempt in 0..=self.fetch_retries() {
            match self.fetch_once(&url).await {
                Ok(keys) => return Ok(keys),
                Err(e) => {
                    tracing::debug!(
                        issuer = %issuer,
                        attempt,
                        "JWKS fetch attempt failed: {e}"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AppError::auth_invalid("JWKS fetch failed without attempts")))
    }

    async fn fetch_once(&self, url: &str) -> AppResult<HashMap<String, Jwk>> {
        let response = self
            .client
            .get(url)
            .timeout(self.fetch_timeout())
            .send()
            .await
            .map_err(|e| AppError::auth_invalid(format!("JWKS fetch failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::auth_invalid(format!(
                "JWKS endpoint returned {}",
                response.status()
            )));
        }

        let document: JwksDocument = response
            .json()
            .await
            .map_err(|e| AppError::auth_invalid(format!("Invalid JWKS document: {e}")))?;

        Ok(document
            .keys
            .into_iter()
            .filter(|key| key.kty == "RSA")
            .map(|key| (key.kid.clone(), key))
            .collect())
    }
}
