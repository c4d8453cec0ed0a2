use crate::error::AppError;
use std::env;
use std::path::{Path, PathBuf};

const DATA_DIR_NAME: &str = "crown_oracle";

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub corpus_path: PathBuf,
    pub cards_path: PathBuf,
    pub model_path: PathBuf,
    pub mapping_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let data_dir = match env::var("CROWN_ORACLE_DATA_DIR") {
            Ok(dir) if dir.trim().is_empty() => {
                return Err(AppError::ConfigError(
                    "CROWN_ORACLE_DATA_DIR is set but empty".to_string(),
                ));
            }
            Ok(dir) => PathBuf::from(dir),
            Err(_) => Self::default_data_dir(),
        };

        Ok(Config {
            corpus_path: path_var("CROWN_ORACLE_CORPUS", &data_dir, "battles.csv"),
            cards_path: path_var("CROWN_ORACLE_CARDS", &data_dir, "cards_i18n.json"),
            model_path: path_var("CROWN_ORACLE_MODEL", &data_dir, "oracle_model.json"),
            mapping_path: path_var("CROWN_ORACLE_MAPPING", &data_dir, "card_mapping.json"),
            data_dir,
        })
    }

    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join(DATA_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("data"))
    }
}

fn path_var(key: &str, data_dir: &Path, file_name: &str) -> PathBuf {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| data_dir.join(file_name))
}
