//! Launch-time routing.
//!
//! [`RoutingDecider`] answers "web content or native interface?" on every
//! launch. The first launch asks the registration server; every launch after a
//! definitive answer reads the memo and makes no network call.
//!
//! ```text
//! resolve()
//!   ├─ attempted == true  → cached route (no network)
//!   └─ attempted == false → RegistrationClient::register()
//! ```
//!
//! [`Waypoint::from_config`] builds the whole graph (store, identifier,
//! headers, HTTP client, decider) once at startup.

use std::sync::Arc;

use tokio::sync::Mutex;
use waypoint_client::{
    ClientSettings, HeaderAugmenter, HttpSettings, IdentifierProvider, MobileUserAgent, NoAugment,
    RegistrationClient, StaticIdentifier, VendorIdentifier, http_client, probe_client,
};
use waypoint_config::{IdentifierSetting, Platform, ResolvedConfig};
use waypoint_store::{DecisionStore, FileStore, StoreError};
use waypoint_types::{DecisionState, Route};

#[derive(Debug)]
pub struct RoutingDecider {
    client: RegistrationClient,
    /// Serializes `resolve` so one process registers at most once.
    gate: Mutex<()>,
}

impl RoutingDecider {
    pub fn new(client: RegistrationClient) -> Self {
        Self {
            client,
            gate: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn store(&self) -> &DecisionStore {
        self.client.store()
    }

    #[must_use]
    pub fn client(&self) -> &RegistrationClient {
        &self.client
    }

    /// Current decision without any network call.
    #[must_use]
    pub fn state(&self) -> DecisionState {
        self.store().outcome().state()
    }

    /// Decide the route for this launch.
    ///
    /// Never fails. A transient registration failure yields [`Route::Native`]
    /// for this launch and leaves the installation undecided.
    pub async fn resolve(&self) -> Route {
        let _guard = self.gate.lock().await;

        // Re-read under the gate: a concurrent caller may have just decided.
        match self.state() {
            DecisionState::Decided(route) => {
                tracing::info!(route = %route, "Using cached routing decision");
                route
            }
            DecisionState::Undecided => {
                tracing::info!("No routing decision yet, registering");
                self.client.register().await
            }
        }
    }

    /// [`resolve`](Self::resolve), then probe a web location before handing
    /// it out.
    ///
    /// An unreachable location downgrades this launch to native. The stored
    /// decision is untouched, so the next launch tries the location again.
    pub async fn resolve_verified(&self) -> Route {
        let route = self.resolve().await;
        let Route::Web(location) = &route else {
            return route;
        };
        if self.client.check_reachability(location.as_str()).await {
            route
        } else {
            tracing::warn!(
                location = %location,
                "Cached content location is unreachable, showing native interface for this launch"
            );
            Route::Native
        }
    }

    /// Forget the decision; the next `resolve` behaves like a first launch.
    pub fn reset(&self) -> Result<(), StoreError> {
        self.store().reset()?;
        tracing::info!("Routing decision reset");
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Fully wired routing stack for one process.
#[derive(Debug)]
pub struct Waypoint {
    decider: RoutingDecider,
}

impl Waypoint {
    pub fn from_config(config: &ResolvedConfig) -> Result<Self, WiringError> {
        let store = DecisionStore::new(Arc::new(FileStore::in_dir(&config.data_dir)));

        let identifiers: Arc<dyn IdentifierProvider> = match &config.identifier {
            IdentifierSetting::Vendor => Arc::new(VendorIdentifier::in_dir(&config.data_dir)),
            IdentifierSetting::Static(value) => Arc::new(StaticIdentifier::new(value.clone())),
        };
        let headers: Arc<dyn HeaderAugmenter> = match config.platform {
            Platform::Mobile => Arc::new(MobileUserAgent),
            Platform::Headless => Arc::new(NoAugment),
        };

        let http_settings = HttpSettings {
            timeout: config.timeout,
            https_only: config.https_only,
        };
        let http = http_client(&http_settings).map_err(WiringError::HttpClient)?;
        let probe = probe_client(&http_settings).map_err(WiringError::HttpClient)?;

        let client = RegistrationClient::new(
            ClientSettings {
                endpoint: config.registration_endpoint.clone(),
                validate_content_location: config.validate_content_location,
            },
            http,
            identifiers,
            headers,
            store,
        )
        .with_probe_client(probe);

        tracing::debug!(
            endpoint = %config.registration_endpoint,
            platform = config.platform.as_str(),
            data_dir = %config.data_dir.display(),
            "Routing stack wired"
        );

        Ok(Self {
            decider: RoutingDecider::new(client),
        })
    }

    #[must_use]
    pub fn decider(&self) -> &RoutingDecider {
        &self.decider
    }

    #[must_use]
    pub fn into_decider(self) -> RoutingDecider {
        self.decider
    }
}
