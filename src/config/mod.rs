use crate::models::Settings;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// File name of the settings file inside the configuration directory
pub const SETTINGS_FILE: &str = "isobridge.yaml";

/// Prefix of environment variables that override file settings,
/// e.g. `ISOBRIDGE__RUNTIME__QUEUE_CAPACITY=8`
pub const ENV_PREFIX: &str = "ISOBRIDGE";

/// Configuration manager for loading and saving the YAML settings file.
///
/// Settings come from `isobridge.yaml` in the configuration directory. A
/// missing file means defaults; environment variables may override any
/// single field on top of the file.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing `isobridge.yaml`; created if missing
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        // Create config directory if it doesn't exist
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            settings_path: config_dir.join(SETTINGS_FILE),
            config_dir,
        })
    }

    /// Load the settings file.
    ///
    /// # Returns
    /// The loaded Settings, or defaults if the file doesn't exist
    pub fn load_settings(&self) -> Result<Settings> {
        if !self.settings_path.exists() {
            tracing::warn!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
            return Ok(Settings::default());
        }

        let file_contents = fs::read_to_string(&self.settings_path)
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?;

        let settings: Settings = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        tracing::info!("Loaded settings from {}", self.settings_path);
        Ok(settings)
    }

    /// Save the settings file.
    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    /// Load the settings file, then apply `ISOBRIDGE__*` overrides from the
    /// process environment.
    pub fn load_settings_with_env(&self) -> Result<Settings> {
        self.load_with_environment(::config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Like [`load_settings_with_env()`](Self::load_settings_with_env), reading
    /// overrides from `vars` instead of the process environment.
    pub fn load_settings_with_env_from(
        &self,
        vars: ::config::Map<String, String>,
    ) -> Result<Settings> {
        self.load_with_environment(
            ::config::Environment::with_prefix(ENV_PREFIX).source(Some(vars)),
        )
    }

    fn load_with_environment(&self, environment: ::config::Environment) -> Result<Settings> {
        let base = self.load_settings()?;
        let layered = ::config::Config::try_from(&base)
            .context("Failed to convert settings into a configuration layer")?;

        let merged = ::config::Config::builder()
            .add_source(layered)
            .add_source(
                environment
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to apply environment overrides")?;

        let settings: Settings = merged
            .try_deserialize()
            .context("Invalid value in environment override")?;

        if settings != base {
            tracing::info!("Applied {}__* environment overrides", ENV_PREFIX);
        }
        Ok(settings)
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Get the settings file path.
    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(&config_path).unwrap();
        (manager, temp_dir)
    }

    #[test]
    fn test_create_config_manager() {
        let (manager, _temp_dir) = create_test_config_manager();
        assert!(manager.settings_path().ends_with(SETTINGS_FILE));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let (manager, _temp_dir) = create_test_config_manager();
        assert_eq!(manager.load_settings().unwrap(), Settings::default());
    }

    #[test]
    fn test_load_save_settings() {
        let (manager, _temp_dir) = create_test_config_manager();

        let mut settings = Settings::default();
        settings.runtime.queue_capacity = 16;
        settings.logging.debug = true;
        manager.save_settings(&settings).unwrap();

        let loaded = manager.load_settings().unwrap();
        assert_eq!(loaded.runtime.queue_capacity, 16);
        assert!(loaded.logging.debug);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let (manager, _temp_dir) = create_test_config_manager();
        fs::write(manager.settings_path(), "runtime: [not, a, map").unwrap();

        assert!(manager.load_settings().is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let (manager, _temp_dir) = create_test_config_manager();

        let mut settings = Settings::default();
        settings.source.user_delay_ms = 42;
        manager.save_settings(&settings).unwrap();

        let mut vars = ::config::Map::new();
        vars.insert(
            "ISOBRIDGE__RUNTIME__QUEUE_CAPACITY".to_string(),
            "8".to_string(),
        );
        let loaded = manager.load_settings_with_env_from(vars).unwrap();

        assert_eq!(loaded.runtime.queue_capacity, 8);
        assert_eq!(loaded.source.user_delay_ms, 42);
        assert_eq!(loaded.runtime.worker_threads, 4);
    }
}
