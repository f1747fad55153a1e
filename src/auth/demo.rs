/**
* filename : demo
* author : HAMA
* date: 2025. 11. 8.
* description: 호스팅 환경 감지 및 고정 데모 계정 모드
**/

use crate::auth::users::UserStore;
use crate::config::Secrets;
use crate::error::TerminalError;

/// 존재 여부만으로 호스팅 환경 판정
pub const HEADLESS_ENV: &str = "STREAMLIT_SERVER_HEADLESS";
pub const DEMO_USER_ID: &str = "demo";
pub const DEMO_PASSWORD: &str = "demo1234";

/// 호스팅 모드에서는 저장소가 재시작마다 초기화되므로 계정 하나만 허용
#[derive(Debug, Clone, PartialEq)]
pub struct DemoMode {
    hosted: bool,
    user_id: String,
    password: String,
}

impl DemoMode {
    pub fn new(hosted: bool, secrets: &Secrets) -> Self {
        let (user_id, password) = secrets.test_account().unwrap_or((DEMO_USER_ID, DEMO_PASSWORD));
        DemoMode {
            hosted,
            user_id: user_id.to_string(),
            password: password.to_string(),
        }
    }

    pub fn local() -> Self {
        Self::new(false, &Secrets::default())
    }

    pub fn is_hosted(&self) -> bool {
        self.hosted
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// 호스팅 모드면 데모 계정을 users.json 에 심는다
    pub async fn seed(&self, users: &UserStore) -> Result<(), TerminalError> {
        if !self.hosted {
            return Ok(());
        }
        users.upsert(&self.user_id, &self.password).await?;
        log::warn!(
            "호스팅 모드: 저장소가 재시작 시 초기화됩니다. 데모 계정({})만 사용 가능",
            self.user_id
        );
        Ok(())
    }

    pub fn check_registration(&self) -> Result<(), TerminalError> {
        if self.hosted {
            return Err(TerminalError::RegistrationDisabled);
        }
        Ok(())
    }

    pub fn check_login(&self, user_id: &str) -> Result<(), TerminalError> {
        if self.hosted && user_id != self.user_id {
            return Err(TerminalError::InvalidCredentials(user_id.to_string()));
        }
        Ok(())
    }
}
