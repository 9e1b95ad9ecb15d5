//! # pmofritz Configuration Module
//!
//! This module provides configuration management for pmofritz, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Typed getters for the logger settings
//! - Machine-bound encryption of stored passwords (see [`encryption`])
//! - Thread-safe singleton access pattern
//!
//! Device specific sections (the `fritzbox` block) are read through extension
//! traits implemented by the crates that own them, see `pmofritz::FritzConfigExt`.
//!
//! ## Usage
//!
//! ```no_run
//! use pmoconfig::get_config;
//!
//! let config = get_config();
//! let level = config.get_log_min_level()?;
//! config.set_value(&["fritzbox", "address"], "192.168.178.1".into())?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Value};
use std::{
    env, fs,
    path::Path,
    sync::{Arc, Mutex},
};
use tracing::info;

pub mod encryption;

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("pmofritz.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load pmofritz configuration"));
}

const ENV_CONFIG_DIR: &str = "PMOFRITZ_CONFIG";
const ENV_PREFIX: &str = "PMOFRITZ_CONFIG__";
const CONFIG_DIR_NAME: &str = ".pmofritz";

const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;

/// Macro to generate getter/setter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<bool> {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => Ok(b),
                _ => Ok($default),
            }
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Configuration manager for pmofritz
///
/// The configuration is a YAML tree whose keys are stored lower-cased. When
/// it was loaded from a directory, every `set_value` is persisted to
/// `config.yaml`; configurations built with [`Config::from_yaml_str`] live in
/// memory only.
#[derive(Debug)]
pub struct Config {
    path: Option<String>,
    data: Mutex<Value>,
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> String {
        if !directory.is_empty() {
            return directory.to_string();
        }

        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var=ENV_CONFIG_DIR, path=%env_path, "Trying to load config from env");
            return env_path;
        }

        if Path::new(CONFIG_DIR_NAME).exists() {
            return CONFIG_DIR_NAME.to_string();
        }

        if let Some(home) = home_dir() {
            let home_config = home.join(CONFIG_DIR_NAME);
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        CONFIG_DIR_NAME.to_string()
    }

    /// Creates the directory if needed and checks that it is writable
    fn prepare_config_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(anyhow!("Config path {} is not a directory", path.display()));
        }

        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        Ok(())
    }

    /// Loads the configuration from the specified directory
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `PMOFRITZ_CONFIG` environment variable
    /// 3. `.pmofritz` in the current directory
    /// 4. `.pmofritz` in the user's home directory
    ///
    /// The embedded defaults are merged with `config.yaml` when present, then
    /// `PMOFRITZ_CONFIG__SECTION__KEY=value` variables are applied and the
    /// merged result is written back.
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::find_config_dir(directory);
        Self::prepare_config_dir(Path::new(&config_dir))?;
        info!(config_dir=%config_dir, "Using config directory");

        let path = Path::new(&config_dir)
            .join("config.yaml")
            .to_string_lossy()
            .to_string();

        let mut value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        match fs::read(&path) {
            Ok(data) => {
                info!(config_file=%path, "Loaded config file");
                let external: Value = serde_yaml::from_slice(&data)?;
                merge_yaml(&mut value, &lower_keys_value(external));
            }
            Err(_) => {
                info!(config_file=%path, "Config file not found, using default embedded config");
            }
        }

        let mut value = lower_keys_value(value);
        apply_env_overrides(&mut value);

        let config = Config {
            path: Some(path),
            data: Mutex::new(value),
        };
        config.save()?;
        Ok(config)
    }

    /// Builds an in-memory configuration from a YAML document
    ///
    /// The document is merged over the embedded defaults. Nothing is read
    /// from or written to disk and environment overrides are not applied.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let mut value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;
        let external: Value = serde_yaml::from_str(yaml)?;
        merge_yaml(&mut value, &lower_keys_value(external));

        Ok(Config {
            path: None,
            data: Mutex::new(lower_keys_value(value)),
        })
    }

    /// Saves the current configuration to `config.yaml`
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let yaml = {
            let data = self.lock()?;
            serde_yaml::to_string(&*data)?
        };
        fs::write(path, yaml)?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Value>> {
        self.data
            .lock()
            .map_err(|_| anyhow!("Configuration lock poisoned"))
    }

    /// Sets a configuration value at the specified path and saves it
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["fritzbox", "address"]`)
    /// * `value` - The YAML value to set
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        {
            let mut data = self.lock()?;
            set_value_internal(&mut data, path, value)?;
        }
        self.save()
    }

    /// Gets a configuration value at the specified path
    ///
    /// Keys are matched case-insensitively. Fails when the path does not exist.
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.lock()?;
        let mut current = &*data;
        for (i, key) in path.iter().enumerate() {
            let Value::Mapping(map) = current else {
                return Err(anyhow!("Path {} is not a Config", path[..i].join(".")));
            };
            current = map
                .get(&Value::String(key.to_lowercase()))
                .ok_or_else(|| anyhow!("Path {} does not exist", path[..=i].join(".")))?;
        }
        Ok(current.clone())
    }

    impl_bool_config!(
        get_log_enable_console,
        set_log_enable_console,
        &["host", "logger", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );

    /// Récupère le niveau de log minimum depuis la configuration
    pub fn get_log_min_level(&self) -> Result<String> {
        match self.get_value(&["host", "logger", "min_level"]) {
            Ok(Value::String(s)) => Ok(s),
            _ => Ok(DEFAULT_LOG_MIN_LEVEL.to_string()),
        }
    }

    /// Définit le niveau de log minimum dans la configuration
    pub fn set_log_min_level(&self, level: String) -> Result<()> {
        self.set_value(&["host", "logger", "min_level"], Value::String(level))
    }
}

/// Returns the global configuration instance
///
/// The instance is lazily loaded on first access.
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
    let Some((first, rest)) = path.split_first() else {
        *data = value;
        return Ok(());
    };
    let Value::Mapping(map) = data else {
        return Err(anyhow!("Current node is not a map"));
    };
    let key = Value::String(first.to_lowercase());
    if rest.is_empty() {
        map.insert(key, value);
        Ok(())
    } else {
        let entry = map.entry(key).or_insert(Value::Mapping(Mapping::new()));
        set_value_internal(entry, rest, value)
    }
}

fn apply_env_overrides(config: &mut Value) {
    for (key, value) in env::vars() {
        let Some(stripped) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let key_path = stripped.split("__").collect::<Vec<_>>();
        let yaml_value =
            serde_yaml::from_str::<Value>(&value).unwrap_or_else(|_| Value::String(value.clone()));
        if let Err(err) = set_value_internal(config, &key_path, yaml_value) {
            tracing::warn!(env_var=%key, error=%err, "Ignoring config override");
        }
    }
}

fn lower_keys_value(value: Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut new_map = Mapping::new();
            for (k, v) in map {
                let key = match k {
                    Value::String(s) => Value::String(s.to_lowercase()),
                    other => other,
                };
                new_map.insert(key, lower_keys_value(v));
            }
            Value::Mapping(new_map)
        }
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys_value).collect()),
        _ => value,
    }
}

/// Merges external YAML configuration into default configuration
///
/// Mappings are merged key by key, scalars and sequences are replaced.
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_embedded() {
        let config = Config::from_yaml_str("{}").unwrap();
        assert_eq!(
            config.get_value(&["fritzbox", "address"]).unwrap(),
            Value::String("fritz.box".to_string())
        );
        assert_eq!(config.get_log_min_level().unwrap(), "INFO");
        assert!(config.get_log_enable_console().unwrap());
    }

    #[test]
    fn test_user_values_override_defaults() {
        let config = Config::from_yaml_str(
            "FritzBox:\n  Address: 192.168.178.1\n  secure: true\nhost:\n  logger:\n    min_level: DEBUG\n",
        )
        .unwrap();

        assert_eq!(
            config.get_value(&["fritzbox", "address"]).unwrap(),
            Value::String("192.168.178.1".to_string())
        );
        assert_eq!(
            config.get_value(&["FRITZBOX", "secure"]).unwrap(),
            Value::Bool(true)
        );
        // les clés non redéfinies restent présentes
        assert_eq!(
            config.get_value(&["fritzbox", "username"]).unwrap(),
            Value::String(String::new())
        );
        assert_eq!(config.get_log_min_level().unwrap(), "DEBUG");
    }

    #[test]
    fn test_missing_path() {
        let config = Config::from_yaml_str("{}").unwrap();
        let err = config.get_value(&["fritzbox", "nope"]).unwrap_err();
        assert_eq!(err.to_string(), "Path fritzbox.nope does not exist");
    }

    #[test]
    fn test_set_value_creates_intermediate_maps() {
        let config = Config::from_yaml_str("{}").unwrap();
        config
            .set_value(&["accounts", "fritz", "user"], Value::String("admin".into()))
            .unwrap();
        assert_eq!(
            config.get_value(&["accounts", "fritz", "user"]).unwrap(),
            Value::String("admin".to_string())
        );
    }

    #[test]
    fn test_load_config_persists_merged_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "fritzbox:\n  username: admin\n",
        )
        .unwrap();

        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(
            config.get_value(&["fritzbox", "username"]).unwrap(),
            Value::String("admin".to_string())
        );

        config.set_log_enable_console(false).unwrap();
        let saved = fs::read_to_string(dir.path().join("config.yaml")).unwrap();
        assert!(saved.contains("enable_console: false"));
        assert!(saved.contains("address: fritz.box"));
    }
}
