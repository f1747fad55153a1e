/**
* filename : sessions
* author : HAMA
* date: 2025. 11. 8.
* description: HMAC-SHA256 서명 세션 토큰 발급/검증 (auto_sessions.json)
**/

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tokio::sync::Mutex;

use crate::auth::users::UserStore;
use crate::error::TerminalError;

type HmacSha256 = Hmac<Sha256>;

pub const SESSIONS_FILE: &str = "auto_sessions.json";
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 72;
const NONCE_BYTES: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: String,
    pub created_at: String,
    pub expires_at: i64,
}

/// 서명 키가 설정되지 않았을 때 쓰는 임시 키 (재시작하면 기존 토큰 무효)
pub fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub struct SessionManager {
    path: PathBuf,
    secret: Vec<u8>,
    ttl: Duration,
    users: Arc<UserStore>,
    lock: Mutex<()>,
}

impl SessionManager {
    pub fn new(path: impl Into<PathBuf>, secret: &str, users: Arc<UserStore>) -> Self {
        SessionManager {
            path: path.into(),
            secret: secret.as_bytes().to_vec(),
            ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
            users,
            lock: Mutex::new(()),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn users(&self) -> &Arc<UserStore> {
        &self.users
    }

    /// 비밀번호 확인 후 서명 토큰 발급
    pub async fn login(&self, user_id: &str, password: &str) -> Result<String, TerminalError> {
        if user_id.is_empty() || password.is_empty() {
            return Err(TerminalError::CredentialsMissing("user_id and password are required".to_string()));
        }
        if !self.users.verify(user_id, password).await? {
            log::warn!("[{}] 로그인 실패: 비밀번호 불일치", user_id);
            return Err(TerminalError::InvalidCredentials(user_id.to_string()));
        }

        let token = self.issue(user_id).await?;
        log::info!("로그인 성공, 세션 토큰 발급: user={}", user_id);
        Ok(token)
    }

    /// 유효한 토큰이면 사용자 ID. 위조/폐기/만료 토큰은 None (만료 토큰은 삭제)
    pub async fn user_from_token(&self, token: &str) -> Result<Option<String>, TerminalError> {
        if token.is_empty() || self.verify_signature(token).is_err() {
            return Ok(None);
        }

        let _guard = self.lock.lock().await;
        let mut sessions = self.read().await?;
        let record = match sessions.get(token) {
            Some(record) => record.clone(),
            None => return Ok(None),
        };

        if record.expires_at <= Utc::now().timestamp() {
            sessions.remove(token);
            self.write(&sessions).await?;
            log::info!("만료된 세션 토큰 삭제: user={}", record.user_id);
            return Ok(None);
        }

        Ok(Some(record.user_id))
    }

    /// 로그아웃. 실제로 삭제됐으면 true
    pub async fn revoke(&self, token: &str) -> Result<bool, TerminalError> {
        if token.is_empty() {
            return Ok(false);
        }
        let _guard = self.lock.lock().await;
        let mut sessions = self.read().await?;
        if sessions.remove(token).is_none() {
            return Ok(false);
        }
        self.write(&sessions).await?;
        log::info!("세션 토큰 폐기 완료");
        Ok(true)
    }

    /// 기존 토큰 폐기 후 재발급. 무효 토큰이면 None
    pub async fn refresh(&self, token: &str) -> Result<Option<String>, TerminalError> {
        let user_id = match self.user_from_token(token).await? {
            Some(user_id) => user_id,
            None => return Ok(None),
        };
        self.revoke(token).await?;
        let new_token = self.issue(&user_id).await?;
        log::info!("세션 토큰 갱신: user={}", user_id);
        Ok(Some(new_token))
    }

    /// 만료 세션 정리, 삭제 건수 반환
    pub async fn purge_expired(&self) -> Result<usize, TerminalError> {
        let _guard = self.lock.lock().await;
        let mut sessions = self.read().await?;
        let now = Utc::now().timestamp();
        let before = sessions.len();
        sessions.retain(|_, record| record.expires_at > now);

        let removed = before - sessions.len();
        if removed > 0 {
            self.write(&sessions).await?;
            log::info!("만료 세션 {}건 정리", removed);
        }
        Ok(removed)
    }

    async fn issue(&self, user_id: &str) -> Result<String, TerminalError> {
        let now = Utc::now();
        let expires_at = (now + self.ttl).timestamp();
        let token = self.create_token(user_id, expires_at)?;

        let _guard = self.lock.lock().await;
        let mut sessions = self.read().await?;
        sessions.insert(
            token.clone(),
            SessionRecord {
                user_id: user_id.to_string(),
                created_at: now.to_rfc3339(),
                expires_at,
            },
        );
        self.write(&sessions).await?;
        Ok(token)
    }

    fn mac(&self) -> Result<HmacSha256, TerminalError> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| TerminalError::ConfigError(format!("Invalid session secret: {}", e)))
    }

    // user:expires:nonce:signature
    fn create_token(&self, user_id: &str, expires_at: i64) -> Result<String, TerminalError> {
        let mut nonce = [0u8; NONCE_BYTES];
        rand::thread_rng().fill_bytes(&mut nonce);
        let payload = format!("{}:{}:{}", user_id, expires_at, hex::encode(nonce));

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        Ok(format!("{}:{}", payload, signature))
    }

    fn verify_signature(&self, token: &str) -> Result<(String, i64), TerminalError> {
        let parts: Vec<&str> = token.split(':').collect();
        let [user_id, expires, nonce, signature] = parts.as_slice() else {
            return Err(TerminalError::InvalidToken("malformed token".to_string()));
        };

        let provided = hex::decode(signature)
            .map_err(|_| TerminalError::InvalidToken("malformed signature".to_string()))?;
        let mut mac = self.mac()?;
        mac.update(format!("{}:{}:{}", user_id, expires, nonce).as_bytes());
        // verify_slice 는 상수 시간 비교
        mac.verify_slice(&provided)
            .map_err(|_| TerminalError::InvalidToken("signature mismatch".to_string()))?;

        let expires_at = expires
            .parse::<i64>()
            .map_err(|_| TerminalError::InvalidToken("malformed expiry".to_string()))?;
        Ok((user_id.to_string(), expires_at))
    }

    async fn read(&self) -> Result<HashMap<String, SessionRecord>, TerminalError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(HashMap::new());
        }

        match serde_json::from_str(&contents) {
            Ok(sessions) => Ok(sessions),
            Err(e) => {
                log::warn!("세션 파일 손상, 초기화합니다: {}", e);
                Ok(HashMap::new())
            }
        }
    }

    async fn write(&self, sessions: &HashMap<String, SessionRecord>) -> Result<(), TerminalError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_string_pretty(sessions)?;
        if let Err(e) = tokio::fs::write(&self.path, body).await {
            log::error!("세션 저장 실패 (권한 오류?): {}", e);
            return Err(e.into());
        }
        Ok(())
    }
}
