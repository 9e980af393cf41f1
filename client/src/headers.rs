//! Platform-specific request headers.

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

/// User-Agent presented by UI platforms, matching the embedded browser.
pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.0 Mobile/15E148 Safari/604.1";

/// Adds platform headers to the registration request.
pub trait HeaderAugmenter: Send + Sync {
    fn augment(&self, headers: &mut HeaderMap);
}

/// Headless platforms send only the JSON headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAugment;

impl HeaderAugmenter for NoAugment {
    fn augment(&self, _headers: &mut HeaderMap) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MobileUserAgent;

impl HeaderAugmenter for MobileUserAgent {
    fn augment(&self, headers: &mut HeaderMap) {
        headers.insert(USER_AGENT, HeaderValue::from_static(MOBILE_USER_AGENT));
    }
}
