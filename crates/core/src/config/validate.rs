use super::{
    types::{Config, ItemStoreBackendKind, StorageBackendKind},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - The selected storage and item store backends have their sections
/// - Rasterizer resolution and timeout are non-zero
/// - Notifier URL is an http(s) URL
/// - HTTP client timeouts (storage.gcs, item_store.realtime_db, notifier) are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    match config.storage.backend {
        StorageBackendKind::Gcs if config.storage.gcs.is_none() => {
            return Err(ConfigError::ValidationError(
                "storage.backend = \"gcs\" requires a [storage.gcs] section".to_string(),
            ));
        }
        StorageBackendKind::Local if config.storage.local.is_none() => {
            return Err(ConfigError::ValidationError(
                "storage.backend = \"local\" requires a [storage.local] section".to_string(),
            ));
        }
        _ => {}
    }

    if config.item_store.backend == ItemStoreBackendKind::RealtimeDb {
        match &config.item_store.realtime_db {
            None => {
                return Err(ConfigError::ValidationError(
                    "item_store.backend = \"realtime_db\" requires an [item_store.realtime_db] section"
                        .to_string(),
                ));
            }
            Some(rtdb) if rtdb.model_id.trim().is_empty() => {
                return Err(ConfigError::ValidationError(
                    "item_store.realtime_db.model_id cannot be empty".to_string(),
                ));
            }
            Some(_) => {}
        }
    }

    if config.item_store.approved_status.is_empty() {
        return Err(ConfigError::ValidationError(
            "item_store.approved_status cannot be empty".to_string(),
        ));
    }

    if config.rasterizer.dpi == 0 {
        return Err(ConfigError::ValidationError(
            "rasterizer.dpi cannot be 0".to_string(),
        ));
    }

    if config.rasterizer.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "rasterizer.timeout_secs cannot be 0".to_string(),
        ));
    }

    if let Some(notifier) = &config.notifier {
        if !(notifier.url.starts_with("http://") || notifier.url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "notifier.url must be an http(s) URL, got {:?}",
                notifier.url
            )));
        }
    }

    let client_timeouts = [
        ("storage.gcs", config.storage.gcs.as_ref().map(|g| g.timeout_secs)),
        (
            "item_store.realtime_db",
            config.item_store.realtime_db.as_ref().map(|r| r.timeout_secs),
        ),
        ("notifier", config.notifier.as_ref().map(|n| n.timeout_secs)),
    ];
    for (section, timeout_secs) in client_timeouts {
        if timeout_secs == Some(0) {
            return Err(ConfigError::ValidationError(format!(
                "{}.timeout_secs cannot be 0",
                section
            )));
        }
    }

    Ok(())
}
