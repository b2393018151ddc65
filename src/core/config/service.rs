use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::settings::AppSettings;
use super::validation::validate_config;
use crate::core::errors::ApiError;

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("PROFILE_RAG_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    /// Loads the YAML config as a JSON value. Missing or unreadable files yield `{}`.
    pub fn load_config(&self) -> Result<Value, ApiError> {
        let config = load_yaml_file(&self.config_path());
        validate_config(&config)?;
        Ok(config)
    }

    pub fn load_settings(&self) -> Result<AppSettings, ApiError> {
        let config = self.load_config()?;
        Ok(AppSettings::from_config(&config))
    }
}

fn load_yaml_file(path: &Path) -> Value {
    if !path.exists() {
        return Value::Object(Map::new());
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<Value>(&contents) {
            Ok(value) => match value {
                Value::Object(_) => value,
                _ => Value::Object(Map::new()),
            },
            Err(err) => {
                tracing::warn!("Ignoring unparsable config {}: {}", path.display(), err);
                Value::Object(Map::new())
            }
        },
        Err(_) => Value::Object(Map::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service_in(dir: &Path) -> ConfigService {
        let paths = AppPaths::from_dirs(dir.to_path_buf(), dir.to_path_buf());
        ConfigService::new(Arc::new(paths))
    }

    #[test]
    fn missing_file_loads_as_empty_object() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = service_in(dir.path());
        let config = service.load_config().expect("empty config is valid");
        assert_eq!(config, json!({}));
    }

    #[test]
    fn yaml_file_is_loaded_and_typed() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("config.yml"),
            "rag:\n  chunk_size: 600\n  chunk_overlap: 100\nllm:\n  model: mistral\n",
        )
        .expect("write config");

        let settings = service_in(dir.path()).load_settings().expect("settings");
        assert_eq!(settings.rag.chunk_size, 600);
        assert_eq!(settings.rag.chunk_overlap, 100);
        assert_eq!(settings.llm.model.as_deref(), Some("mistral"));
    }

    #[test]
    fn invalid_overlap_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("config.yml"),
            "rag:\n  chunk_size: 100\n  chunk_overlap: 100\n",
        )
        .expect("write config");

        assert!(service_in(dir.path()).load_config().is_err());
    }
}
