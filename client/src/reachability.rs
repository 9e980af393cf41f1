use reqwest::StatusCode;
use url::Url;

/// Anything below 500 except 404 counts as available.
#[must_use]
pub fn is_available(status: StatusCode) -> bool {
    status != StatusCode::NOT_FOUND && status.as_u16() < 500
}

pub(crate) async fn check(http: &reqwest::Client, location: &str) -> bool {
    let url = match Url::parse(location) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url,
        Ok(url) => {
            tracing::debug!(
                location,
                scheme = url.scheme(),
                "Unsupported scheme for reachability probe"
            );
            return false;
        }
        Err(e) => {
            tracing::debug!(location, error = %e, "Unparsable location for reachability probe");
            return false;
        }
    };

    match http.head(url).send().await {
        Ok(response) => {
            let status = response.status();
            let available = is_available(status);
            tracing::info!(location, status = %status, available, "Reachability probe finished");
            available
        }
        Err(e) => {
            tracing::warn!(location, error = %e, "Reachability probe failed");
            false
        }
    }
}
