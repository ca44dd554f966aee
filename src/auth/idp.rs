// ABOUTME: Identity-provider RS256 JWT verification against the issuer's JWKS
// ABOUTME: Checks token shape, header, claims, and issuer allowlist before signature validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::jwks::JwksCache;
use crate::config::environment::{
    Environment, ServerConfig, DEV_ISSUER_HOST_SUFFIX, PRODUCTION_ISSUER,
};
use crate::errors::{AppError, AppResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

/// Decoded JWT header fields this verifier cares about
#[derive(Debug, Deserialize)]
pub struct IdpHeader {
    /// Signing algorithm
    pub alg: String,
    /// Key id selecting the JWKS entry
    pub kid: Option<String>,
}

/// Decoded JWT claims this verifier cares about
#[derive(Debug, Deserialize)]
pub struct IdpClaims {
    /// Issuer URL
    pub iss: String,
    /// Subject (the user principal)
    pub sub: String,
    /// Expiry, seconds since epoch, optional
    pub exp: Option<i64>,
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str, what: &str) -> AppResult<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| AppError::auth_invalid(format!("Malformed JWT {what}: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AppError::auth_invalid(format!("Malformed JWT {what}: {e}")))
}

/// Split a compact JWT into its three segments
///
/// # Errors
///
/// Returns an error unless the token has exactly three non-empty
/// dot-separated segments.
pub fn split_segments(token: &str) -> AppResult<[&str; 3]> {
    let mut parts = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AppError::auth_invalid("Token is not a three-segment JWT"));
    };

    if header.is_empty() || payload.is_empty() || signature.is_empty() {
        return Err(AppError::auth_invalid("Token has empty JWT segments"));
    }

    Ok([header, payload, signature])
}

/// Whether `issuer` is acceptable for this deployment
///
/// The configured issuer and the fixed production issuer are always accepted.
/// Outside production, development IdP instances are accepted by host suffix
/// (a true suffix match on the host, not a substring match).
#[must_use]
pub fn issuer_allowed(issuer: &str, config: &ServerConfig) -> bool {
    if issuer == config.idp.issuer || issuer == PRODUCTION_ISSUER {
        return true;
    }

    if config.environment == Environment::Production {
        return false;
    }

    url::Url::parse(issuer)
        .ok()
        .and_then(|url| url.host_str().map(std::borrow::ToOwned::to_owned))
        .is_some_and(|host| host.ends_with(DEV_ISSUER_HOST_SUFFIX))
}

/// Verify an IdP JWT and return its subject
///
/// # Errors
///
/// Returns an error if the token is malformed, uses a different algorithm,
/// lacks a `kid`, carries an expired `exp`, names a disallowed issuer, or
/// fails signature verification against the issuer's JWKS.
pub async fn verify_idp_jwt(
    token: &str,
    config: &ServerConfig,
    jwks: &JwksCache,
) -> AppResult<String> {
    let [header_segment, payload_segment, _] = split_segments(token)?;

    let header: IdpHeader = decode_segment(header_segment, "header")?;
    if header.alg != "RS256" {
        return Err(AppError::auth_invalid(format!(
            "Unsupported JWT algorithm: {}",
            header.alg
        )));
    }
    let kid = header
        .kid
        .ok_or_else(|| AppError::auth_invalid("JWT header is missing kid"))?;

    let claims: IdpClaims = decode_segment(payload_segment, "payload")?;
    if claims.sub.is_empty() {
        return Err(AppError::auth_invalid("JWT is missing sub claim"));
    }
    if let Some(exp) = claims.exp {
        if exp <= Utc::now().timestamp() {
            return Err(AppError::auth_invalid("JWT has expired"));
        }
    }
    if !issuer_allowed(&claims.iss, config) {
        return Err(AppError::auth_invalid(format!(
            "Issuer not allowed: {}",
            claims.iss
        )));
    }

    let jwk = jwks.get_key(&claims.iss, &kid).await?;
    let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
        .map_err(|e| AppError::auth_invalid(format!("Invalid JWK components: {e}")))?;

    // Shape and expiry were checked above; the library call is for the
    // RSA-PKCS1-v1_5/SHA-256 signature only.
    let mut validation = Validation::new(Algorithm::RS256);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.set_required_spec_claims::<&str>(&[]);

    let data = jsonwebtoken::decode::<IdpClaims>(token, &decoding_key, &validation)
        .map_err(|e| AppError::auth_invalid(format!("JWT signature verification failed: {e}")))?;

    Ok(data.claims.sub)
}
