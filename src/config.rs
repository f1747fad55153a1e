/**
* filename : config
* author : HAMA
* date: 2025. 11. 8.
* description: config.json + 환경변수 설정, .streamlit/secrets.toml 비밀값
**/

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::auth::demo::HEADLESS_ENV;
use crate::auth::sessions::{DEFAULT_SESSION_TTL_HOURS, SESSIONS_FILE};
use crate::error::TerminalError;
use crate::market_data::cache::DEFAULT_TTL_SECS;
use crate::market_data::naver::DEFAULT_NAVER_BASE_URL;
use crate::market_data::yahoo::DEFAULT_YAHOO_BASE_URL;

pub const CONFIG_FILE: &str = "config.json";
pub const SECRETS_FILE: &str = ".streamlit/secrets.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub session: SessionConfig,
    pub market_data: MarketDataConfig,
    pub logging: LoggingConfig,
    pub secrets_path: String,
    pub hosted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    pub session_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub secret: Option<String>,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketDataConfig {
    pub yahoo_base_url: String,
    pub naver_base_url: String,
    pub cache_ttl_secs: u64,
    pub max_retries: u32,
    pub backoff_ms: u64,
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    /// 작업 디렉터리의 config.json, 없으면 기본값. 환경변수가 우선
    pub fn load() -> Result<Self, TerminalError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(config_path: &Path) -> Result<Self, TerminalError> {
        let mut cfg = if config_path.exists() {
            let mut file = File::open(config_path)
                .map_err(|e| TerminalError::ConfigError(format!("Failed to open config file: {}", e)))?;

            let mut contents = String::new();
            file.read_to_string(&mut contents)
                .map_err(|e| TerminalError::ConfigError(format!("Failed to read config file: {}", e)))?;

            serde_json::from_str::<Config>(&contents)
                .map_err(|e| TerminalError::ConfigError(format!("Failed to parse config file: {}", e)))?
        } else {
            Config::default()
        };

        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// 환경변수 조회 함수를 받아 덮어쓰기 (빈 값은 무시)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("SERVER_HOST") { self.server.host = v; }
        if let Some(v) = get("SERVER_PORT") {
            match v.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => log::warn!("SERVER_PORT 값이 잘못됨, 무시: {}", v),
            }
        }
        if let Some(v) = get("DATA_DIR") { self.storage.data_dir = v; }
        if let Some(v) = get("SESSION_FILE") { self.storage.session_file = Some(v); }
        if let Some(v) = get("SESSION_SECRET") { self.session.secret = Some(v); }
        if let Some(v) = get("SESSION_TTL_HOURS") {
            match v.parse() {
                Ok(hours) => self.session.ttl_hours = hours,
                Err(_) => log::warn!("SESSION_TTL_HOURS 값이 잘못됨, 무시: {}", v),
            }
        }
        if let Some(v) = get("CACHE_TTL_SECS") {
            match v.parse() {
                Ok(secs) => self.market_data.cache_ttl_secs = secs,
                Err(_) => log::warn!("CACHE_TTL_SECS 값이 잘못됨, 무시: {}", v),
            }
        }
        if let Some(v) = get("YAHOO_BASE_URL") { self.market_data.yahoo_base_url = v; }
        if let Some(v) = get("NAVER_BASE_URL") { self.market_data.naver_base_url = v; }
        if let Some(v) = get("SECRETS_PATH") { self.secrets_path = v; }
        // 값과 무관하게 존재만 확인
        if lookup(HEADLESS_ENV).is_some() { self.hosted = true; }
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_dir)
    }

    pub fn session_file(&self) -> PathBuf {
        match &self.storage.session_file {
            Some(path) => PathBuf::from(path),
            None => self.data_dir().join(SESSIONS_FILE),
        }
    }

    pub fn bind_address(&self) -> Result<std::net::SocketAddr, TerminalError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| TerminalError::ConfigError(format!("Invalid server address: {}", e)))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            session: SessionConfig::default(),
            market_data: MarketDataConfig::default(),
            logging: LoggingConfig::default(),
            secrets_path: SECRETS_FILE.to_string(),
            hosted: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3030,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_dir: ".".to_string(),
            session_file: None,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            secret: None,
            ttl_hours: DEFAULT_SESSION_TTL_HOURS,
        }
    }
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        MarketDataConfig {
            yahoo_base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
            naver_base_url: DEFAULT_NAVER_BASE_URL.to_string(),
            cache_ttl_secs: DEFAULT_TTL_SECS,
            max_retries: 3,
            backoff_ms: 1000,
            concurrency: 4,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

/// .streamlit/secrets.toml. 모든 항목 선택
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Secrets {
    pub test_user_id: Option<String>,
    pub test_password: Option<String>,
    pub firebase: Option<HashMap<String, String>>,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
}

impl Secrets {
    /// 파일이 없으면 빈 값
    pub fn load(path: &Path) -> Result<Self, TerminalError> {
        if !path.exists() {
            log::debug!("secrets 파일 없음: {}", path.display());
            return Ok(Secrets::default());
        }

        let settings = ::config::Config::builder()
            .add_source(::config::File::new(&path.to_string_lossy(), ::config::FileFormat::Toml))
            .build()
            .map_err(|e| TerminalError::ConfigError(format!("Failed to read secrets: {}", e)))?;

        settings
            .try_deserialize()
            .map_err(|e| TerminalError::ConfigError(format!("Failed to parse secrets: {}", e)))
    }

    /// 데모 계정 (ID, 비밀번호) 둘 다 있을 때만
    pub fn test_account(&self) -> Option<(&str, &str)> {
        match (self.test_user_id.as_deref(), self.test_password.as_deref()) {
            (Some(id), Some(pw)) if !id.is_empty() && !pw.is_empty() => Some((id, pw)),
            _ => None,
        }
    }
}
