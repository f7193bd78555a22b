use config::{Config, ConfigError, Environment, File};
use engine::format::DEFAULT_DECIMAL_PLACES;
use engine::history::DEFAULT_HISTORY_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub calculator: CalculatorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CalculatorConfig {
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            decimal_places: default_decimal_places(),
        }
    }
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_decimal_places() -> u32 {
    DEFAULT_DECIMAL_PLACES
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub format: LoggingFormatConfig,
    #[serde(default)]
    pub levels: LoggingLevelsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingFormatConfig {
    #[serde(default = "true_default")]
    pub show_time: bool,
    /// One JSON object per line instead of the human format.
    #[serde(default)]
    pub json: bool,
    #[serde(default)]
    pub location: LoggingLocationConfig,
}

impl Default for LoggingFormatConfig {
    fn default() -> Self {
        Self {
            show_time: true,
            json: false,
            location: LoggingLocationConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingLocationConfig {
    #[serde(default)]
    pub show_file: bool,
    #[serde(default)]
    pub show_line: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingLevelsConfig {
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "true_default")]
    pub info: bool,
    #[serde(default = "true_default")]
    pub warning: bool,
    #[serde(default = "true_default")]
    pub error: bool,
    #[serde(default = "true_default")]
    pub critical: bool,
}

impl Default for LoggingLevelsConfig {
    fn default() -> Self {
        Self {
            debug: false,
            info: true,
            warning: true,
            error: true,
            critical: true,
        }
    }
}

fn true_default() -> bool {
    true
}

impl AppConfig {
    /// Reject values the engine cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        i32::try_from(self.calculator.decimal_places).map_err(|_| {
            ConfigError::Message(format!(
                "calculator.decimal_places must be at most {}, got {}",
                i32::MAX,
                self.calculator.decimal_places
            ))
        })?;
        Ok(())
    }

    /// Build a calculator configured from this file.
    pub fn build_calculator(&self) -> engine::Calculator {
        engine::Calculator::default_arithmetic()
            .with_history_capacity(self.calculator.history_capacity)
            .with_decimal_places(self.calculator.decimal_places)
    }
}

static CONFIG: RwLock<Option<&'static AppConfig>> = RwLock::new(None);

pub fn get_config() -> Result<&'static AppConfig, ConfigError> {
    if let Some(cfg) = *CONFIG.read().unwrap_or_else(|e| e.into_inner()) {
        return Ok(cfg);
    }

    let mut write = CONFIG.write().unwrap_or_else(|e| e.into_inner());
    if let Some(cfg) = *write {
        return Ok(cfg);
    }

    let cfg: &'static AppConfig = Box::leak(Box::new(load_config()?));
    *write = Some(cfg);
    Ok(cfg)
}

#[cfg(test)]
pub fn reset_config() {
    let mut write = CONFIG.write().unwrap();
    *write = None;
}

/// Prefer the file next to the CLI manifest; fall back to the working
/// directory so an installed binary still picks up a local file.
fn locate(base: &Path, name: &str) -> PathBuf {
    let beside_manifest = base.join(name);
    if beside_manifest.exists() {
        beside_manifest
    } else {
        PathBuf::from(name)
    }
}

fn load_config() -> Result<AppConfig, ConfigError> {
    let manifest_dir =
        std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| env!("CARGO_MANIFEST_DIR").into());
    let base_path = Path::new(&manifest_dir);

    let builder = Config::builder()
        .add_source(File::from(locate(base_path, "global_config.yaml")).required(false))
        .add_source(File::from(locate(base_path, "production_config.yaml")).required(false))
        .add_source(File::from(locate(base_path, ".global_config.yaml")).required(false))
        // Nested env vars like CALC__CALCULATOR__HISTORY_CAPACITY=5
        .add_source(
            Environment::with_prefix("CALC")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

    let config: AppConfig = builder.build()?.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    struct EnvGuard(&'static str);
    impl EnvGuard {
        fn new(key: &'static str, val: &str) -> Self {
            reset_config();
            env::set_var(key, val);
            Self(key)
        }
    }
    impl Drop for EnvGuard {
        fn drop(&mut self) {
            env::remove_var(self.0);
            reset_config();
        }
    }

    #[test]
    #[serial]
    fn test_load_config() {
        let config = load_config();
        assert!(config.is_ok(), "Failed to load config: {:?}", config.err());

        let config = config.unwrap();
        assert_eq!(config.calculator.history_capacity, 20);
        assert_eq!(config.calculator.decimal_places, 8);
        assert!(config.logging.levels.info);
    }

    #[test]
    #[serial]
    fn test_env_var_override_numeric() {
        let _guard = EnvGuard::new("CALC__CALCULATOR__HISTORY_CAPACITY", "5");
        let config = load_config().expect("Should load config");
        assert_eq!(config.calculator.history_capacity, 5);
    }

    #[test]
    #[serial]
    fn test_env_var_override_boolean() {
        {
            let _guard = EnvGuard::new("CALC__LOGGING__LEVELS__DEBUG", "true");
            let config = load_config().expect("Should load config");
            assert!(config.logging.levels.debug);
        }
        {
            let _guard = EnvGuard::new("CALC__LOGGING__FORMAT__SHOW_TIME", "false");
            let config = load_config().expect("Should load config");
            assert!(!config.logging.format.show_time);
        }
    }

    #[test]
    #[serial]
    fn test_env_var_json_log_format() {
        let _guard = EnvGuard::new("CALC__LOGGING__FORMAT__JSON", "true");
        let config = load_config().expect("Should load config");
        assert!(config.logging.format.json);
    }

    #[test]
    #[serial]
    fn test_decimal_places_out_of_range_rejected() {
        let _guard = EnvGuard::new("CALC__CALCULATOR__DECIMAL_PLACES", "3000000000");
        let err = load_config().expect_err("over-range decimal places must not load");
        assert!(err.to_string().contains("decimal_places"), "{}", err);
    }

    #[test]
    #[serial]
    fn test_cached_config_and_reset() {
        reset_config();
        let first = get_config().expect("config") as *const AppConfig;
        let second = get_config().expect("config") as *const AppConfig;
        assert_eq!(first, second);
        reset_config();
    }

    #[test]
    fn test_defaults_without_file() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.calculator.history_capacity, 20);
        assert!(config.logging.format.show_time);
        assert!(!config.logging.levels.debug);
        assert!(!config.logging.format.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_build_calculator_honours_config() {
        let mut config = AppConfig::default();
        config.calculator.decimal_places = 3;
        let mut calc = config.build_calculator();
        calc.press_all(engine::keys::parse_keys("2÷3=").unwrap());
        assert_eq!(calc.display(), "0.667");
    }
}
