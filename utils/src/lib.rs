//! Shared infrastructure utilities for Waypoint.
//!
//! - **`atomic_write`**: Crash-safe file persistence (temp + rename)
//! - **`secure_dir`**: Owner-only data directories

pub mod atomic_write;
pub mod secure_dir;

pub use atomic_write::{atomic_write, recover_bak_file};
pub use secure_dir::ensure_secure_dir;
