use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Load layered settings for a service.
///
/// Sources, later ones winning:
/// 1. `<config_dir>/base.yaml` (optional)
/// 2. `.env` entries and process environment prefixed with `APP_`,
///    nested with `__` (e.g. `APP_SERVER__PORT=8080`).
pub fn load<T: DeserializeOwned>(config_dir: &Path) -> Result<T, AppError> {
    dotenvy::dotenv().ok();

    let settings = Cfg::builder()
        .add_source(File::from(config_dir.join("base.yaml")).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Resolve the configuration directory of a workspace member.
///
/// Binaries are started either from the workspace root or from the crate
/// directory itself; both layouts resolve to `<crate>/config`.
pub fn config_dir(crate_dir_name: &str) -> Result<std::path::PathBuf, AppError> {
    let base_path = std::env::current_dir()?;

    if base_path.ends_with(crate_dir_name) {
        Ok(base_path.join("config"))
    } else {
        Ok(base_path.join(crate_dir_name).join("config"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default = "default_port")]
        port: u16,
    }

    fn default_port() -> u16 {
        8080
    }

    #[test]
    fn missing_base_file_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join("service-core-config-missing");
        let sample: Sample = load(&dir).expect("defaults should deserialize");
        assert_eq!(sample.port, 8080);
    }

    #[test]
    fn config_dir_appends_crate_name_from_workspace_root() {
        let dir = config_dir("definitely-not-the-cwd").unwrap();
        assert!(dir.ends_with("definitely-not-the-cwd/config"));
    }
}
