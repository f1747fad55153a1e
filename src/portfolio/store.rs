/**
* filename : store
* author : HAMA
* date: 2025. 11. 7.
* description: 사용자별 포트폴리오 JSON 저장소 (portfolio_<user>.json)
**/

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::error::TerminalError;
use crate::models::portfolio::Holding;

pub const PORTFOLIO_FILE_PREFIX: &str = "portfolio_";

/// 파일 경로로 쓸 수 있는 사용자 ID 인지 확인
pub fn validate_user_id(user_id: &str) -> Result<(), TerminalError> {
    let valid = !user_id.is_empty()
        && user_id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
        && !user_id.contains("..");
    if valid {
        Ok(())
    } else {
        Err(TerminalError::InvalidParameter(format!("Invalid user id: {:?}", user_id)))
    }
}

pub struct PortfolioStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl PortfolioStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        PortfolioStore {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, user_id: &str) -> Result<PathBuf, TerminalError> {
        validate_user_id(user_id)?;
        Ok(self.dir.join(format!("{}{}.json", PORTFOLIO_FILE_PREFIX, user_id)))
    }

    /// 파일이 없거나 비었거나 깨졌으면 빈 포트폴리오
    pub async fn load(&self, user_id: &str) -> Result<Vec<Holding>, TerminalError> {
        let _guard = self.lock.lock().await;
        self.read(user_id).await
    }

    pub async fn save(&self, user_id: &str, holdings: &[Holding]) -> Result<(), TerminalError> {
        let _guard = self.lock.lock().await;
        self.write(user_id, holdings).await
    }

    /// 종목 추가 후 전체 목록 반환
    pub async fn add(&self, user_id: &str, holding: Holding) -> Result<Vec<Holding>, TerminalError> {
        if holding.ticker.trim().is_empty() {
            return Err(TerminalError::InvalidParameter("ticker must not be empty".to_string()));
        }
        if !(holding.avg_price.is_finite() && holding.avg_price >= 0.0) {
            return Err(TerminalError::InvalidParameter(format!("Invalid average price: {}", holding.avg_price)));
        }
        if !(holding.quantity.is_finite() && holding.quantity >= 0.0) {
            return Err(TerminalError::InvalidParameter(format!("Invalid quantity: {}", holding.quantity)));
        }

        let _guard = self.lock.lock().await;
        let mut holdings = self.read(user_id).await?;
        log::info!("[{}] 포트폴리오 종목 추가: {} ({})", user_id, holding.name, holding.ticker);
        holdings.push(holding);
        self.write(user_id, &holdings).await?;
        Ok(holdings)
    }

    /// index 위치 종목 삭제, 삭제된 종목 반환
    pub async fn remove(&self, user_id: &str, index: usize) -> Result<Holding, TerminalError> {
        let _guard = self.lock.lock().await;
        let mut holdings = self.read(user_id).await?;
        if index >= holdings.len() {
            return Err(TerminalError::InvalidParameter(format!(
                "Index {} out of range (portfolio has {} holdings)",
                index,
                holdings.len()
            )));
        }
        let removed = holdings.remove(index);
        self.write(user_id, &holdings).await?;
        log::info!("[{}] 포트폴리오 종목 삭제: {}", user_id, removed.ticker);
        Ok(removed)
    }

    async fn read(&self, user_id: &str) -> Result<Vec<Holding>, TerminalError> {
        let path = self.path_for(user_id)?;
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str(&contents) {
            Ok(holdings) => Ok(holdings),
            Err(e) => {
                log::warn!("포트폴리오 파일 손상, 빈 목록으로 처리: {} ({})", path.display(), e);
                Ok(Vec::new())
            }
        }
    }

    async fn write(&self, user_id: &str, holdings: &[Holding]) -> Result<(), TerminalError> {
        let path = self.path_for(user_id)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_string_pretty(holdings)?;
        tokio::fs::write(&path, json).await?;
        Ok(())
    }
}
