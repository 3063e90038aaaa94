//! Global subscriber installation

use routeguide::logging::{init_logging, LoggingConfig};
use tempfile::TempDir;

use crate::integration::ENV_MUTEX;

#[test]
fn test_file_logging_installs_once() {
    let _guard = ENV_MUTEX.lock();
    let dir = TempDir::new().unwrap();
    let config = LoggingConfig {
        level: "debug".to_string(),
        format: "json".to_string(),
        output: "file".to_string(),
        file: dir.path().join("logs").join("routeguide.log"),
        ..LoggingConfig::default()
    };

    for key in ["ROUTEGUIDE_LOG", "ROUTEGUIDE_LOG_FORMAT", "ROUTEGUIDE_LOG_OUTPUT"] {
        std::env::remove_var(key);
    }

    init_logging(Some(&config)).unwrap();
    assert!(config.file.exists());

    // A second global subscriber is refused.
    assert!(init_logging(Some(&config)).is_err());
}
