//! Core domain types for Waypoint.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.
//!
//! The central question the rest of the workspace answers is "web content or native
//! interface?". The answer is a [`Route`]; the memoized input that produces it is a
//! [`RegistrationOutcome`].

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod wire;
pub use wire::{RegistrationRequest, RegistrationResponse};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Content Location
// ============================================================================

/// Location of the web content handed out by the registration server.
///
/// Guaranteed non-empty. Well-formedness as a URL is checked by the client
/// (when enabled), not here: a stored location is trusted as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentLocation(String);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("content location must not be empty")]
pub struct EmptyLocationError;

impl ContentLocation {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyLocationError> {
        let value = value.into();
        if value.is_empty() {
            Err(EmptyLocationError)
        } else {
            Ok(Self(value))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ContentLocation {
    type Error = EmptyLocationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ContentLocation {
    type Error = EmptyLocationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ContentLocation> for String {
    fn from(value: ContentLocation) -> Self {
        value.0
    }
}

impl AsRef<str> for ContentLocation {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ContentLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Display Mode & Route
// ============================================================================

/// Which interface the application presents.
///
/// Always derived from a [`Route`] or [`RegistrationOutcome`], never stored on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayMode {
    WebContent,
    NativeInterface,
}

impl DisplayMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WebContent => "web",
            Self::NativeInterface => "native",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a routing decision.
///
/// A content location exists only in web mode; the enum makes any other
/// combination unrepresentable. Callers that want the flat
/// `(mode, location)` pair use [`Route::into_parts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Web(ContentLocation),
    Native,
}

impl Route {
    #[must_use]
    pub const fn display_mode(&self) -> DisplayMode {
        match self {
            Self::Web(_) => DisplayMode::WebContent,
            Self::Native => DisplayMode::NativeInterface,
        }
    }

    #[must_use]
    pub const fn content_location(&self) -> Option<&ContentLocation> {
        match self {
            Self::Web(location) => Some(location),
            Self::Native => None,
        }
    }

    #[must_use]
    pub fn into_parts(self) -> (DisplayMode, Option<ContentLocation>) {
        match self {
            Self::Web(location) => (DisplayMode::WebContent, Some(location)),
            Self::Native => (DisplayMode::NativeInterface, None),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Web(location) => write!(f, "web {location}"),
            Self::Native => f.write_str("native"),
        }
    }
}

// ============================================================================
// Registration Outcome
// ============================================================================

/// The persisted memo of the one-time registration.
///
/// `attempted == false` means no decision has been made yet. Once `attempted`
/// is true the presence of `content_location` alone decides the route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationOutcome {
    pub attempted: bool,
    pub content_location: Option<ContentLocation>,
}

/// Decision state inferred from a [`RegistrationOutcome`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionState {
    Undecided,
    Decided(Route),
}

impl RegistrationOutcome {
    #[must_use]
    pub fn decided(content_location: Option<ContentLocation>) -> Self {
        Self {
            attempted: true,
            content_location,
        }
    }

    #[must_use]
    pub fn state(&self) -> DecisionState {
        if !self.attempted {
            return DecisionState::Undecided;
        }
        match &self.content_location {
            Some(location) => DecisionState::Decided(Route::Web(location.clone())),
            None => DecisionState::Decided(Route::Native),
        }
    }
}
