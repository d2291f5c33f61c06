//! Build metadata
//!
//! `build.rs` stamps each compile with a build number and UTC timestamp.

use std::fmt;

use serde::Serialize;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

const RAW_BUILD_NUMBER: Option<&str> = option_env!("FITTRACK_BUILD_NUMBER");
const RAW_BUILD_TIMESTAMP: Option<&str> = option_env!("FITTRACK_BUILD_TIMESTAMP");

/// What was compiled, and when
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub build_number: u64,
    pub build_timestamp: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self::from_stamp(RAW_BUILD_NUMBER, RAW_BUILD_TIMESTAMP)
    }

    /// Missing or unparseable stamps read as build 0, time "unknown"
    fn from_stamp(number: Option<&str>, timestamp: Option<&'static str>) -> Self {
        Self {
            name: NAME,
            version: VERSION,
            build_number: number.and_then(|n| n.trim().parse().ok()).unwrap_or(0),
            build_timestamp: timestamp.unwrap_or("unknown"),
        }
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (build {}, {})",
            self.name, self.version, self.build_number, self.build_timestamp
        )
    }
}
