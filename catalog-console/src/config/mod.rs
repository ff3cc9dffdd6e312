use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    pub storage: StorageSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Sessions expire after this many hours without activity.
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    /// Set to true in production behind HTTPS.
    #[serde(default)]
    pub secure_cookies: bool,
    /// Request body limit for image uploads and ZIP imports.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_session_ttl_hours() -> i64 {
    24
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

#[derive(Deserialize, Clone, Debug)]
pub struct BackendSettings {
    /// Base URL of the catalog REST API (e.g., http://localhost:8000).
    pub api_base: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct StorageSettings {
    /// Browser-reachable base URL of the object store.
    pub public_base: String,
    /// Hostnames the backend uses for the object store inside its own network.
    /// Presigned URLs pointing at these are rewritten to `public_base`.
    #[serde(default = "default_internal_bases")]
    pub internal_bases: Vec<String>,
}

fn default_internal_bases() -> Vec<String> {
    vec![
        "http://minio:9000".to_string(),
        "https://minio:9000".to_string(),
    ]
}

#[derive(Deserialize, Clone, Debug)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP collector endpoint; spans are only exported when set.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("Cannot determine current directory: {e}")))?;

    // Check if we're already in catalog-console directory or need to navigate to it
    let configuration_directory = if base_path.ends_with("catalog-console") {
        base_path.join("config")
    } else {
        base_path.join("catalog-console").join("config")
    };

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("storage.internal_bases")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_defaults_cover_both_schemes() {
        let storage: StorageSettings =
            serde_json::from_str(r#"{"public_base":"http://localhost:9000"}"#).unwrap();
        assert_eq!(
            storage.internal_bases,
            vec!["http://minio:9000", "https://minio:9000"]
        );
    }

    #[test]
    fn telemetry_is_optional() {
        let settings: Settings = serde_json::from_value(serde_json::json!({
            "server": { "host": "127.0.0.1", "port": 3000 },
            "backend": { "api_base": "http://localhost:8000" },
            "storage": { "public_base": "http://localhost:9000" }
        }))
        .unwrap();
        assert_eq!(settings.telemetry.log_level, "info");
        assert!(settings.telemetry.otlp_endpoint.is_none());
        assert_eq!(settings.server.session_ttl_hours, 24);
        assert!(!settings.server.secure_cookies);
        assert_eq!(settings.server.max_upload_bytes, 50 * 1024 * 1024);
    }
}
