use crate::core::context::WorkflowSettings;
use crate::core::verification::Thresholds;
use crate::db::pool::DEFAULT_BUSY_TIMEOUT_MS;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub mod migrate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationConfig {
    #[serde(default = "default_accuracy")]
    pub max_acceptable_accuracy_meters: f64,
    #[serde(default = "default_distance")]
    pub max_acceptable_distance_meters: f64,
    #[serde(default = "default_warning")]
    pub warning_distance_meters: f64,
    /// Falls back to `max_acceptable_distance_meters` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appeal_eligibility_distance_meters: Option<f64>,
}

fn default_accuracy() -> f64 {
    150.0
}
fn default_distance() -> f64 {
    500.0
}
fn default_warning() -> f64 {
    100.0
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            max_acceptable_accuracy_meters: default_accuracy(),
            max_acceptable_distance_meters: default_distance(),
            warning_distance_meters: default_warning(),
            appeal_eligibility_distance_meters: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    #[serde(default = "default_zones_file")]
    pub zones_file: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
    #[serde(default)]
    pub verification: VerificationConfig,
}

fn default_zones_file() -> String {
    Config::config_dir()
        .join("zones.yaml")
        .to_string_lossy()
        .to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_busy_timeout() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl Default for Config {
    fn default() -> Self {
        Self::with_database(Self::database_file())
    }
}

impl Config {
    fn with_database(db_path: PathBuf) -> Self {
        Self {
            database: db_path.to_string_lossy().to_string(),
            zones_file: default_zones_file(),
            log_level: default_log_level(),
            busy_timeout_ms: default_busy_timeout(),
            verification: VerificationConfig::default(),
        }
    }

    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("fieldcheck")
        } else {
            let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".fieldcheck")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("fieldcheck.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("fieldcheck.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(yaml: &str) -> AppResult<Self> {
        let cfg: Config = serde_yaml::from_str(yaml)
            .map_err(|e| AppError::Config(format!("invalid configuration: {}", e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Thresholds must be positive numbers.
    pub fn validate(&self) -> AppResult<()> {
        let v = &self.verification;
        let checks = [
            ("max_acceptable_accuracy_meters", Some(v.max_acceptable_accuracy_meters)),
            ("max_acceptable_distance_meters", Some(v.max_acceptable_distance_meters)),
            ("warning_distance_meters", Some(v.warning_distance_meters)),
            (
                "appeal_eligibility_distance_meters",
                v.appeal_eligibility_distance_meters,
            ),
        ];
        for (name, value) in checks {
            if let Some(x) = value
                && (!x.is_finite() || x <= 0.0)
            {
                return Err(AppError::Config(format!(
                    "verification.{} must be a positive number, got {}",
                    name, x
                )));
            }
        }
        Ok(())
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            max_acceptable_accuracy_meters: self.verification.max_acceptable_accuracy_meters,
            max_acceptable_distance_meters: self.verification.max_acceptable_distance_meters,
            warning_distance_meters: self.verification.warning_distance_meters,
        }
    }

    pub fn settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            thresholds: self.thresholds(),
            appeal_eligibility_distance_meters: self
                .verification
                .appeal_eligibility_distance_meters,
        }
    }

    pub fn save(&self) -> AppResult<()> {
        let yaml = serde_yaml::to_string(self).map_err(|_| AppError::ConfigSave)?;
        fs::create_dir_all(Self::config_dir())?;
        let mut file = fs::File::create(Self::config_file())?;
        file.write_all(yaml.as_bytes())?;
        Ok(())
    }

    /// Initialize configuration and database files.
    /// Returns the configuration that was (or, in test mode, would have been) written.
    pub fn init_all(custom_db: Option<String>, is_test: bool) -> AppResult<Self> {
        let dir = Self::config_dir();

        let db_path = match custom_db {
            Some(name) => {
                let p = Path::new(&name);
                if p.is_absolute() {
                    p.to_path_buf()
                } else if is_test {
                    env::current_dir()?.join(p)
                } else {
                    dir.join(p)
                }
            }
            None => Self::database_file(),
        };

        let config = Self::with_database(db_path.clone());

        if !is_test {
            config.save()?;
            println!("✅ Config file: {:?}", Self::config_file());
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        if !db_path.exists() {
            fs::File::create(&db_path)?;
        }

        println!("✅ Database:    {:?}", db_path);

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn old_files_without_verification_section_still_load() {
        let cfg = Config::parse("database: /tmp/x.sqlite\n").unwrap();
        assert_eq!(cfg.database, "/tmp/x.sqlite");
        assert_eq!(cfg.verification, VerificationConfig::default());
        assert_eq!(cfg.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
        assert_eq!(cfg.settings().appeal_min_distance(), 500.0);
    }

    #[test]
    fn eligibility_distance_overrides_ceiling() {
        let cfg = Config::parse(
            "database: db.sqlite\nverification:\n  max_acceptable_distance_meters: 300\n  \
             appeal_eligibility_distance_meters: 450\n",
        )
        .unwrap();
        assert_eq!(cfg.thresholds().max_acceptable_distance_meters, 300.0);
        assert_eq!(cfg.thresholds().max_acceptable_accuracy_meters, 150.0);
        assert_eq!(cfg.settings().appeal_min_distance(), 450.0);
    }

    #[test]
    fn non_positive_thresholds_are_refused() {
        let err = Config::parse(
            "database: db.sqlite\nverification:\n  max_acceptable_accuracy_meters: 0\n",
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
