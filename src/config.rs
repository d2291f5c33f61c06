//! Runtime configuration
//!
//! Everything is read from the environment; there is no config file.

use std::path::{Path, PathBuf};

use crate::build_info::BuildInfo;

/// Environment variable overriding the database location
pub const DATABASE_PATH_VAR: &str = "FITTRACK_DATABASE_PATH";

/// Default tracing directive when `RUST_LOG` does not mention the crate
pub const DEFAULT_LOG_DIRECTIVE: &str = "fittrack=info";

/// Get the database path from environment or use `<project>/data/fittrack.db`
pub fn get_database_path() -> PathBuf {
    std::env::var(DATABASE_PATH_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_database_path())
}

fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    // Go up from target/release or target/debug to project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path.push("data");
    path.push("fittrack.db");
    path
}

/// Startup lines written to stderr before the server takes over stdio
pub fn startup_banner(database_path: &Path) -> String {
    format!(
        "FitTrack - nutrition, workouts & habits\n{}\nDatabase: {}\nLog filter: RUST_LOG or {}",
        BuildInfo::current(),
        database_path.display(),
        DEFAULT_LOG_DIRECTIVE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_names_build_and_database() {
        let banner = startup_banner(Path::new("/tmp/ft.db"));
        assert!(banner.starts_with("FitTrack"));
        assert!(banner.contains(&BuildInfo::current().to_string()));
        assert!(banner.contains("Database: /tmp/ft.db"));
    }

    #[test]
    fn test_default_path_ends_with_db_file() {
        let path = default_database_path();
        assert!(path.ends_with("data/fittrack.db"));
    }
}
