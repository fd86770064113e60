// API gateway
//
// Single chokepoint for every call to the EarnHub backend: joins paths onto
// the base URL, attaches the bearer token from the injected session, decodes
// the `{status, data}` envelope into typed payloads, and turns a 401 into a
// destroyed session. Endpoint methods live in sibling modules as inherent
// impls so this file stays focused on transport mechanics.

use std::time::Duration;

use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::Error;
use crate::models::{Envelope, ErrorBody};
use crate::session::{SessionContext, SessionEnd};
use crate::transport::TransportConfig;

/// Async client for the EarnHub backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: SessionContext,
    timeout: Duration,
}

/// Whether an endpoint requires a logged-in session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Auth {
    Required,
    Anonymous,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client from a transport config.
    pub fn new(
        base_url: &str,
        session: SessionContext,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
            session,
            timeout: transport.timeout,
        })
    }

    /// Wrap an existing `reqwest::Client`. `timeout` is applied to every
    /// request on top of whatever the client was built with.
    pub fn with_client(
        http: reqwest::Client,
        base_url: &str,
        session: SessionContext,
        timeout: Duration,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
            session,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The session this client authenticates with.
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    // ── URL builder ──────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.get_with_params(path, &[]).await
    }

    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let builder = self.http.get(url).query(params);
        self.send(builder, Auth::Required).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        auth: Auth,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let builder = self.http.post(url).json(body);
        self.send(builder, auth).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let builder = self.http.delete(url);
        self.send(builder, Auth::Required).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        auth: Auth,
    ) -> Result<T, Error> {
        let builder = match (self.session.current(), auth) {
            (Some(session), _) => builder.bearer_auth(session.token().expose_secret()),
            (None, Auth::Anonymous) => builder,
            (None, Auth::Required) => return Err(Error::NotAuthenticated),
        };

        let resp = builder.timeout(self.timeout).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                Error::Transport(e)
            }
        })?;

        self.handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            warn!("backend answered 401; ending session");
            self.session.destroy(SessionEnd::Expired);
            return Err(Error::SessionExpired);
        }

        let body = resp.text().await?;

        if !status.is_success() {
            return Err(parse_error(status, &body));
        }

        trace!(len = body.len(), "decoding envelope");
        let envelope: Envelope<serde_json::Value> =
            serde_json::from_str(&body).map_err(|e| decode_error(&e, &body))?;

        if envelope.status.eq_ignore_ascii_case("error") {
            return Err(parse_error(status, &body));
        }

        serde_json::from_value(envelope.data).map_err(|e| decode_error(&e, &body))
    }
}

/// Ensure the base URL ends with `/` so relative joins append rather than
/// replace the last path segment.
fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_error(status: reqwest::StatusCode, raw: &str) -> Error {
    let message = serde_json::from_str::<ErrorBody>(raw)
        .ok()
        .and_then(ErrorBody::into_message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map_or_else(|| status.to_string(), String::from)
        });

    Error::Api {
        status: status.as_u16(),
        message,
    }
}

fn decode_error(err: &serde_json::Error, body: &str) -> Error {
    let preview: String = body.chars().take(200).collect();
    Error::Decode {
        message: format!("{err} (body preview: {preview:?})"),
        body: body.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let url = normalize_base_url("https://api.example.com/backend").expect("valid url");
        assert_eq!(url.as_str(), "https://api.example.com/backend/");
        assert_eq!(
            url.join("v1/tracking/click").expect("join").as_str(),
            "https://api.example.com/backend/v1/tracking/click"
        );
    }

    #[test]
    fn error_message_prefers_nested_data_message() {
        let err = parse_error(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"status":"error","data":{"message":"Offer is inactive"},"message":"outer"}"#,
        );
        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Offer is inactive");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn error_message_falls_back_to_reason_phrase() {
        let err = parse_error(reqwest::StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert!(matches!(err, Error::Api { status: 502, ref message } if message == "Bad Gateway"));
    }
}
