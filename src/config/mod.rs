use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub max_files: usize,
    pub max_file_bytes: usize,
    pub storage_endpoint: String,
    pub storage_bucket: String,
    pub storage_access_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Environment picks the defaults, specific env vars override them
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig { max_connections: 5, connect_timeout_secs: 5 },
            upload: UploadConfig {
                max_files: 10,
                max_file_bytes: 10 * 1024 * 1024,
                storage_endpoint: "http://localhost:9000".to_string(),
                storage_bucket: "portfolio-uploads".to_string(),
                storage_access_key: None,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig { max_connections: 10, connect_timeout_secs: 10 },
            ..Self::development()
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig { max_connections: 20, connect_timeout_secs: 10 },
            ..Self::development()
        }
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECT_TIMEOUT_SECS") {
            self.database.connect_timeout_secs =
                v.parse().unwrap_or(self.database.connect_timeout_secs);
        }

        if let Ok(v) = env::var("UPLOAD_MAX_FILES") {
            self.upload.max_files = v.parse().unwrap_or(self.upload.max_files);
        }
        if let Ok(v) = env::var("UPLOAD_MAX_FILE_BYTES") {
            self.upload.max_file_bytes = v.parse().unwrap_or(self.upload.max_file_bytes);
        }
        if let Ok(v) = env::var("STORAGE_ENDPOINT") {
            self.upload.storage_endpoint = v;
        }
        if let Ok(v) = env::var("STORAGE_BUCKET") {
            self.upload.storage_bucket = v;
        }
        if let Ok(v) = env::var("STORAGE_ACCESS_KEY") {
            self.upload.storage_access_key = Some(v);
        }

        self
    }
}
