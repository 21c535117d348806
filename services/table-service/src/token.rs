//! Helpers shared by the providers talking to identity endpoints.

use crate::Credential;
use aztables_core::time::{from_unix_seconds, now, parse_expires_on, DateTime};
use aztables_core::{Context, Error, Result};
use bytes::Bytes;
use http::StatusCode;
use serde::Deserialize;

/// Token endpoints disagree on whether numbers are sent as JSON numbers or strings.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub(crate) enum NumberOrString {
    Number(i64),
    String(String),
}

impl NumberOrString {
    fn as_i64(&self) -> Result<i64> {
        match self {
            NumberOrString::Number(v) => Ok(*v),
            NumberOrString::String(s) => s
                .trim()
                .parse()
                .map_err(|_| Error::unexpected(format!("invalid number in token response: {s}"))),
        }
    }
}

/// Access token payload returned by Entra ID, IMDS and App Service.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<NumberOrString>,
    #[serde(default)]
    pub expires_on: Option<NumberOrString>,
}

impl TokenResponse {
    /// Resolve the absolute expiry, falling back to ten minutes from now.
    pub fn expires_at(&self) -> Result<DateTime> {
        if let Some(expires_on) = &self.expires_on {
            return match expires_on {
                NumberOrString::Number(secs) => from_unix_seconds(*secs),
                NumberOrString::String(s) => parse_expires_on(s),
            };
        }
        if let Some(expires_in) = &self.expires_in {
            let secs = expires_in.as_i64()?;
            return Ok(now()
                + chrono::TimeDelta::try_seconds(secs)
                    .unwrap_or_else(|| chrono::TimeDelta::try_minutes(10).expect("in bounds")));
        }
        Ok(now() + chrono::TimeDelta::try_minutes(10).expect("in bounds"))
    }

    pub fn into_credential(self) -> Result<Credential> {
        let expires_on = self.expires_at()?;
        Ok(Credential::with_bearer_token(
            &self.access_token,
            Some(expires_on),
        ))
    }
}

/// Error payload of the Microsoft identity platform.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct OAuthErrorResponse {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub error_description: String,
}

impl OAuthErrorResponse {
    pub fn parse(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

/// Build the `{authority}/{tenant}/oauth2/v2.0/{path}` url.
pub(crate) fn authority_url(authority_host: &str, tenant_id: &str, path: &str) -> String {
    format!(
        "{}/{}/oauth2/v2.0/{}",
        authority_host.trim_end_matches('/'),
        tenant_id,
        path
    )
}

/// POST an urlencoded form to an identity endpoint.
pub(crate) async fn post_form(
    ctx: &Context,
    url: &str,
    pairs: &[(&str, &str)],
) -> Result<http::Response<Bytes>> {
    let body = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter())
        .finish();

    let req = http::Request::builder()
        .method(http::Method::POST)
        .uri(url)
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(http::header::ACCEPT, "application/json")
        .body(Bytes::from(body))?;

    ctx.http_send(req).await
}

/// Request a token from the Entra ID token endpoint.
///
/// `source` names the provider in error messages.
pub(crate) async fn request_token(
    ctx: &Context,
    source: &str,
    url: &str,
    pairs: &[(&str, &str)],
) -> Result<Credential> {
    let resp = post_form(ctx, url, pairs).await?;
    parse_token_response(source, resp.status(), resp.body())
}

pub(crate) fn parse_token_response(
    source: &str,
    status: StatusCode,
    body: &[u8],
) -> Result<Credential> {
    if !status.is_success() {
        return Err(token_error(source, status, body));
    }

    let token: TokenResponse = serde_json::from_slice(body).map_err(|e| {
        Error::unexpected(format!("failed to parse {source} token response")).with_source(e)
    })?;
    token.into_credential()
}

pub(crate) fn token_error(source: &str, status: StatusCode, body: &[u8]) -> Error {
    let resp = OAuthErrorResponse::parse(body);
    let detail = if resp.error.is_empty() {
        String::from_utf8_lossy(body).to_string()
    } else {
        format!("{}: {}", resp.error, resp.error_description)
    };

    Error::credential_denied(format!(
        "{source} token request failed with status {status}: {detail}"
    ))
    .with_status(status)
}
