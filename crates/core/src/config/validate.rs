use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - At least one worker and a non-empty admission queue
/// - Listen ports are non-zero and distinct
/// - Preview duration and payload limit are positive
/// - Uploads and previews live in different directories
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.ingest.workers == 0 {
        return Err(ConfigError::ValidationError(
            "ingest.workers must be at least 1".to_string(),
        ));
    }

    if config.ingest.queue_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "ingest.queue_capacity must be at least 1".to_string(),
        ));
    }

    if config.ingest.max_payload_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "ingest.max_payload_bytes cannot be 0".to_string(),
        ));
    }

    if config.server.http_port == 0 || config.server.ingest_port == 0 {
        return Err(ConfigError::ValidationError(
            "server ports cannot be 0".to_string(),
        ));
    }

    if config.server.http_port == config.server.ingest_port {
        return Err(ConfigError::ValidationError(format!(
            "server.http_port and server.ingest_port must differ (both {})",
            config.server.http_port
        )));
    }

    if config.transcoder.preview_duration_secs == 0 {
        return Err(ConfigError::ValidationError(
            "transcoder.preview_duration_secs cannot be 0".to_string(),
        ));
    }

    if config.storage.upload_dir == config.storage.preview_dir {
        return Err(ConfigError::ValidationError(
            "storage.upload_dir and storage.preview_dir must differ".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ServerConfig};
    use std::path::PathBuf;

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_zero_workers_fails() {
        let mut config = Config::default();
        config.ingest.workers = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_queue_fails() {
        let mut config = Config::default();
        config.ingest.queue_capacity = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                http_port: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_same_ports_fails() {
        let config = Config {
            server: ServerConfig {
                http_port: 9000,
                ingest_port: 9000,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn test_validate_shared_storage_dir_fails() {
        let mut config = Config::default();
        config.storage.preview_dir = PathBuf::from("uploads/full");
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_preview_duration_fails() {
        let mut config = Config::default();
        config.transcoder.preview_duration_secs = 0;
        assert!(validate_config(&config).is_err());
    }
}
