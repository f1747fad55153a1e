pub mod handlers;
pub mod routes;

use std::sync::Arc;

use crate::auth::{DemoMode, SessionManager, UserStore};
use crate::engine::AnalysisContext;
use crate::models::symbol_book::SymbolBook;
use crate::portfolio::PortfolioStore;

/// 핸들러 공유 상태
#[derive(Clone)]
pub struct AppState {
    pub context: AnalysisContext,
    pub users: Arc<UserStore>,
    pub sessions: Arc<SessionManager>,
    pub portfolios: Arc<PortfolioStore>,
    pub symbols: Arc<SymbolBook>,
    pub demo: Arc<DemoMode>,
    pub concurrency: usize,
}
