/**
* filename : users
* author : HAMA
* date: 2025. 11. 8.
* description: 계정 저장소 (users.json, 비밀번호는 Argon2id PHC 해시)
**/

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tokio::sync::Mutex;

use crate::error::TerminalError;
use crate::portfolio::store::validate_user_id;

pub const USERS_FILE: &str = "users.json";

/// 솔트를 포함한 PHC 문자열 ("$argon2id$v=19$...")
pub fn hash_password(password: &str) -> Result<String, TerminalError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| TerminalError::Analysis(format!("Password hashing failed: {}", e)))
}

/// 형식이 잘못된 해시는 불일치로 취급
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            log::warn!("저장된 비밀번호 해시 형식 오류: {}", e);
            false
        }
    }
}

pub struct UserStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl UserStore {
    /// data_dir/users.json
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        UserStore {
            path: data_dir.as_ref().join(USERS_FILE),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 신규 가입. 이미 있는 ID 면 UserExists
    pub async fn register(&self, user_id: &str, password: &str) -> Result<(), TerminalError> {
        if user_id.is_empty() || password.is_empty() {
            return Err(TerminalError::CredentialsMissing("user_id and password are required".to_string()));
        }
        validate_user_id(user_id)?;

        let _guard = self.lock.lock().await;
        let mut users = self.read().await?;
        if users.contains_key(user_id) {
            return Err(TerminalError::UserExists(user_id.to_string()));
        }
        users.insert(user_id.to_string(), hash_password(password)?);
        self.write(&users).await?;
        log::info!("신규 계정 등록: {}", user_id);
        Ok(())
    }

    /// 계정을 덮어써서 등록 (데모 계정 시드용)
    pub async fn upsert(&self, user_id: &str, password: &str) -> Result<(), TerminalError> {
        if user_id.is_empty() || password.is_empty() {
            return Err(TerminalError::CredentialsMissing("user_id and password are required".to_string()));
        }
        validate_user_id(user_id)?;

        let _guard = self.lock.lock().await;
        let mut users = self.read().await?;
        users.insert(user_id.to_string(), hash_password(password)?);
        self.write(&users).await
    }

    pub async fn verify(&self, user_id: &str, password: &str) -> Result<bool, TerminalError> {
        let _guard = self.lock.lock().await;
        let users = self.read().await?;
        Ok(users.get(user_id).map(|hash| verify_password(password, hash)).unwrap_or(false))
    }

    pub async fn exists(&self, user_id: &str) -> Result<bool, TerminalError> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.contains_key(user_id))
    }

    // 없음/0바이트/손상 => 빈 맵
    async fn read(&self) -> Result<HashMap<String, String>, TerminalError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(HashMap::new());
        }

        match serde_json::from_str(&contents) {
            Ok(users) => Ok(users),
            Err(e) => {
                log::warn!("계정 파일 손상, 빈 목록으로 처리: {} ({})", self.path.display(), e);
                Ok(HashMap::new())
            }
        }
    }

    async fn write(&self, users: &HashMap<String, String>) -> Result<(), TerminalError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_string_pretty(users)?;
        tokio::fs::write(&self.path, body).await?;
        Ok(())
    }
}
