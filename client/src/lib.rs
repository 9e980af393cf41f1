//! One-time registration client.
//!
//! # Flow
//!
//! [`RegistrationClient::register`] performs a single `POST` to the configured
//! endpoint and turns whatever happens into a [`Route`]:
//!
//! | What happened | Persisted | Route |
//! |---------------|-----------|-------|
//! | Server granted a non-empty location | yes | `Web(location)` |
//! | Server answered without a location, or `success: false` | yes | `Native` |
//! | Malformed endpoint / unencodable request | no | `Native` |
//! | Network error, timeout, non-2xx, undecodable body | no | `Native` |
//!
//! Anything the server actually said is definitive and never asked again.
//! Anything that prevented an answer is inconclusive and retried next launch.
//!
//! # Error Handling
//!
//! Failures never cross [`RegistrationClient::register`]; they are logged with
//! their [`FailureClass`]. [`RegistrationClient::try_register`] runs the same
//! flow but hands the [`RegistrationError`] back for callers that want it.

mod error;
mod headers;
mod identity;
mod reachability;

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use url::Url;
use waypoint_store::DecisionStore;
use waypoint_types::{ContentLocation, RegistrationRequest, RegistrationResponse, Route};

pub use error::{FailureClass, RegistrationError};
pub use headers::{HeaderAugmenter, MOBILE_USER_AGENT, MobileUserAgent, NoAugment};
pub use identity::{
    INSTALLATION_ID_FILE_NAME, IdentifierProvider, StaticIdentifier, VendorIdentifier,
};
pub use reachability::is_available;

const MAX_REDIRECTS: usize = 5;
const MAX_RESPONSE_BYTES: usize = 64 * 1024;
const MAX_ERROR_BODY_BYTES: usize = 4 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct HttpSettings {
    /// Applied to both the connect phase and the whole request.
    pub timeout: Duration,
    /// Refuse plain-http registration endpoints. Never applied to probes.
    pub https_only: bool,
}

fn base_client_builder(timeout: Duration) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .connect_timeout(timeout)
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
}

/// Build the registration transport.
pub fn http_client(settings: &HttpSettings) -> Result<reqwest::Client, reqwest::Error> {
    base_client_builder(settings.timeout)
        .https_only(settings.https_only)
        .build()
}

/// Build the reachability transport.
///
/// Granted locations may be plain http, so `https_only` is ignored here.
pub fn probe_client(settings: &HttpSettings) -> Result<reqwest::Client, reqwest::Error> {
    base_client_builder(settings.timeout).build()
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Registration URL. Validated on every attempt, not at construction.
    pub endpoint: String,
    /// Treat a granted location that is not an absolute http(s) URL as a negative answer.
    pub validate_content_location: bool,
}

/// A definitive server answer. Both variants are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Positive(ContentLocation),
    Negative,
}

impl From<Verdict> for Route {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Positive(location) => Route::Web(location),
            Verdict::Negative => Route::Native,
        }
    }
}

pub struct RegistrationClient {
    settings: ClientSettings,
    http: reqwest::Client,
    probe: reqwest::Client,
    identifiers: Arc<dyn IdentifierProvider>,
    headers: Arc<dyn HeaderAugmenter>,
    store: DecisionStore,
}

impl std::fmt::Debug for RegistrationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationClient")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl RegistrationClient {
    /// `http` carries registration and, until [`with_probe_client`] says
    /// otherwise, reachability probes too.
    ///
    /// [`with_probe_client`]: Self::with_probe_client
    pub fn new(
        settings: ClientSettings,
        http: reqwest::Client,
        identifiers: Arc<dyn IdentifierProvider>,
        headers: Arc<dyn HeaderAugmenter>,
        store: DecisionStore,
    ) -> Self {
        Self {
            settings,
            probe: http.clone(),
            http,
            identifiers,
            headers,
            store,
        }
    }

    /// Use a separate transport for [`check_reachability`](Self::check_reachability).
    #[must_use]
    pub fn with_probe_client(mut self, probe: reqwest::Client) -> Self {
        self.probe = probe;
        self
    }

    #[must_use]
    pub fn store(&self) -> &DecisionStore {
        &self.store
    }

    /// Register this installation and return the resulting route.
    ///
    /// Never fails: every error is logged and answered with [`Route::Native`]
    /// without touching the store.
    pub async fn register(&self) -> Route {
        match self.try_register().await {
            Ok(verdict) => verdict.into(),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    class = e.class().as_str(),
                    "Registration inconclusive, will retry on next launch"
                );
                Route::Native
            }
        }
    }

    /// Run the registration exchange, persisting a definitive answer.
    ///
    /// A failure to persist is logged but does not change the verdict: the
    /// server's answer is still the right route for this launch.
    pub async fn try_register(&self) -> Result<Verdict, RegistrationError> {
        let request = RegistrationRequest::new(self.identifiers.installation_id());
        let body = serde_json::to_vec(&request).map_err(RegistrationError::EncodeRequest)?;
        let url = parse_endpoint(&self.settings.endpoint)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        self.headers.augment(&mut headers);

        tracing::info!(
            url = %url,
            user_data = %request.user_data,
            "Starting registration request"
        );

        let mut response = self
            .http
            .post(url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(RegistrationError::Transport)?;

        let status = response.status();
        tracing::debug!(status = %status, "Registration response received");

        if !status.is_success() {
            let body = read_capped_error_body(&mut response).await;
            return Err(RegistrationError::Status { status, body });
        }

        let bytes = read_body(&mut response, MAX_RESPONSE_BYTES).await?;
        let reply: RegistrationResponse =
            serde_json::from_slice(&bytes).map_err(RegistrationError::Decode)?;
        tracing::debug!(
            success = reply.success,
            data = reply.data.as_deref().unwrap_or("<none>"),
            "Registration response decoded"
        );

        let verdict = self.verdict_for(&reply);
        let location = match &verdict {
            Verdict::Positive(location) => {
                tracing::info!(location = %location, "Registration granted web content");
                Some(location)
            }
            Verdict::Negative => {
                tracing::info!(
                    success = reply.success,
                    "Registration answered without content, native interface from now on"
                );
                None
            }
        };
        if let Err(e) = self.store.record_outcome(location) {
            tracing::error!(error = %e, "Failed to persist registration outcome");
        }

        Ok(verdict)
    }

    fn verdict_for(&self, reply: &RegistrationResponse) -> Verdict {
        let Some(location) = reply.effective_content_location() else {
            return Verdict::Negative;
        };
        if self.settings.validate_content_location && !is_web_url(location.as_str()) {
            tracing::warn!(
                location = %location,
                "Granted content location is not an absolute http(s) URL, treating as negative"
            );
            return Verdict::Negative;
        }
        Verdict::Positive(location)
    }

    /// Probe `location` with a `HEAD` request.
    ///
    /// Independent of registration and never touches the store.
    pub async fn check_reachability(&self, location: &str) -> bool {
        reachability::check(&self.probe, location).await
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, RegistrationError> {
    let invalid = |reason: String| RegistrationError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };
    let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

fn is_web_url(value: &str) -> bool {
    Url::parse(value).is_ok_and(|url| {
        matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty())
    })
}

async fn read_body(
    response: &mut reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, RegistrationError> {
    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(RegistrationError::Transport)?
    {
        body.extend_from_slice(&chunk);
        if body.len() > limit {
            return Err(RegistrationError::TooLarge { limit });
        }
    }
    Ok(body)
}

async fn read_capped_error_body(response: &mut reqwest::Response) -> String {
    let mut body = Vec::new();
    while let Ok(Some(chunk)) = response.chunk().await {
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}
