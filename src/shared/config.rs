//! Application configuration. Storage location, upload paths.

use serde::Deserialize;

/// Default directory holding the database file.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Default SQLite file name inside the data directory.
pub const DEFAULT_DATABASE_FILE: &str = "profiles.db";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Directory for the database file. Read from TUTOR_PROFILES_DATA_DIR.
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Database file name. Read from TUTOR_PROFILES_DATABASE_FILE.
    #[serde(default)]
    pub database_file: Option<String>,

    /// Upload directory used for new profile images. Read from TUTOR_PROFILES_IMAGE_UPLOAD_DIR.
    #[serde(default)]
    pub image_upload_dir: Option<String>,
}

impl AppConfig {
    /// Environment (prefix `TUTOR_PROFILES_`), then the optional file named by TUTOR_PROFILES_CONFIG.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("TUTOR_PROFILES"));
        if let Ok(path) = std::env::var("TUTOR_PROFILES_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    pub fn data_dir_or_default(&self) -> &str {
        self.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR)
    }

    pub fn database_file_or_default(&self) -> &str {
        self.database_file
            .as_deref()
            .unwrap_or(DEFAULT_DATABASE_FILE)
    }

    /// Defaults to `images/profile_images/`.
    pub fn image_upload_dir_or_default(&self) -> &str {
        self.image_upload_dir
            .as_deref()
            .unwrap_or(crate::domain::entities::PROFILE_IMAGE_DIR)
    }
}
