use config::{Config, Environment, File};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::env;
use std::path::PathBuf;
use tracing::warn;

pub mod models;
pub mod secrets;

pub use config::ConfigError;
pub use models::*;
pub use secrets::{PiiCipher, SecretError};

/// Marker value replaced by an environment variable when the configuration is loaded.
pub const SECRET_FROM_ENV: &str = "secret_from_env";

/// Loads the layered application configuration.
///
/// Sources, later ones winning: `{dir}/default.*`, `{dir}/{RUN_ENV}.*` and `BODYWORK__*`
/// environment variables. `dir` comes from `BODYWORK_CONFIG_DIR` and defaults to `config`.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let config_dir = env::var("BODYWORK_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    load_config_from(PathBuf::from(config_dir))
}

/// Loads configuration from an explicit directory. Used by `load_config` and tests.
pub fn load_config_from(config_dir: PathBuf) -> Result<AppConfig, ConfigError> {
    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());

    let default_path = config_dir.join("default");
    let env_path = config_dir.join(&run_env);

    let builder = Config::builder()
        .add_source(File::with_name(&default_path.to_string_lossy()).required(false))
        .add_source(File::with_name(&env_path.to_string_lossy()).required(false))
        .add_source(
            Environment::with_prefix("BODYWORK")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

    let raw_config: AppConfig = builder.build()?.try_deserialize()?;
    apply_env_overrides_from_marker(raw_config)
}

/// Recursively replaces all "secret_from_env" string values with environment variable values
fn inject_env_secrets(value: &mut Value) {
    fn walk(path: Vec<String>, obj: &mut Value) {
        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    let mut new_path = path.clone();
                    new_path.push(k.to_string());
                    walk(new_path, v);
                }
            }
            Value::String(s) if s == SECRET_FROM_ENV => {
                let env_key = path.join("_").to_uppercase();
                if let Ok(env_val) = env::var(&env_key) {
                    *obj = Value::String(env_val);
                } else {
                    warn!("env var {} not found for secret_from_env", env_key);
                }
            }
            _ => {}
        }
    }

    walk(vec![], value);
}

/// Applies environment overrides based on "secret_from_env" markers in serialized config
pub fn apply_env_overrides_from_marker(config: AppConfig) -> Result<AppConfig, ConfigError> {
    let mut json = serde_json::to_value(&config)
        .map_err(|err| ConfigError::Message(format!("config is not serializable: {err}")))?;
    inject_env_secrets(&mut json);
    serde_json::from_value(json)
        .map_err(|err| ConfigError::Message(format!("config lost its shape: {err}")))
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Loads `.env` (or the file named by `DOTENV_OVERRIDE`) into the process environment once.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path = env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}
