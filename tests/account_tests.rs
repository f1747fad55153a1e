/**
* filename : account_tests
* author : HAMA
* date: 2025. 11. 10.
* description: 회원/세션/데모 모드/포트폴리오 통합 테스트
**/

mod common;

use std::sync::Arc;

use tempfile::tempdir;
use wallst_pro::auth::{DemoMode, SessionManager, UserStore, DEMO_PASSWORD, DEMO_USER_ID, SESSIONS_FILE};
use wallst_pro::config::Secrets;
use wallst_pro::models::Holding;
use wallst_pro::portfolio::{PortfolioStore, PortfolioValuator, Rebalancer};
use wallst_pro::TerminalError;

use common::{context, decline, wave, FakeProvider};

fn sessions_in(dir: &std::path::Path, users: Arc<UserStore>) -> SessionManager {
  SessionManager::new(dir.join(SESSIONS_FILE), "integration-secret", users)
}

#[tokio::test]
async fn test_register_login_refresh_logout_flow() {
  let dir = tempdir().unwrap();
  let users = Arc::new(UserStore::new(dir.path()));
  let sessions = sessions_in(dir.path(), users.clone());

  users.register("alice", "pw1234").await.unwrap();
  assert!(matches!(
    users.register("alice", "other").await,
    Err(TerminalError::UserExists(_))
  ));

  assert!(matches!(
    sessions.login("alice", "wrong").await,
    Err(TerminalError::InvalidCredentials(_))
  ));

  let token = sessions.login("alice", "pw1234").await.unwrap();
  assert_eq!(sessions.user_from_token(&token).await.unwrap().as_deref(), Some("alice"));

  // 갱신하면 이전 토큰은 무효
  let renewed = sessions.refresh(&token).await.unwrap().unwrap();
  assert_ne!(renewed, token);
  assert!(sessions.user_from_token(&token).await.unwrap().is_none());
  assert_eq!(sessions.user_from_token(&renewed).await.unwrap().as_deref(), Some("alice"));

  assert!(sessions.revoke(&renewed).await.unwrap());
  assert!(sessions.user_from_token(&renewed).await.unwrap().is_none());
  assert!(!sessions.revoke(&renewed).await.unwrap());
}

#[tokio::test]
async fn test_sessions_survive_restart() {
  let dir = tempdir().unwrap();
  let users = Arc::new(UserStore::new(dir.path()));
  users.register("bob", "secret").await.unwrap();

  let token = sessions_in(dir.path(), users.clone()).login("bob", "secret").await.unwrap();

  // 같은 파일/키로 다시 열면 세션 유지
  let reopened = sessions_in(dir.path(), users.clone());
  assert_eq!(reopened.user_from_token(&token).await.unwrap().as_deref(), Some("bob"));

  // 다른 키로 서명 검증 실패
  let other_key = SessionManager::new(dir.path().join(SESSIONS_FILE), "another-secret", users);
  assert!(other_key.user_from_token(&token).await.unwrap().is_none());
}

#[tokio::test]
async fn test_expired_sessions_are_purged() {
  let dir = tempdir().unwrap();
  let users = Arc::new(UserStore::new(dir.path()));
  users.register("carol", "pw").await.unwrap();

  let sessions = sessions_in(dir.path(), users).with_ttl(chrono::Duration::seconds(-1));
  sessions.login("carol", "pw").await.unwrap();
  sessions.login("carol", "pw").await.unwrap();

  assert_eq!(sessions.purge_expired().await.unwrap(), 2);
  assert_eq!(sessions.purge_expired().await.unwrap(), 0);
}

#[tokio::test]
async fn test_hosted_demo_mode() {
  let dir = tempdir().unwrap();
  let users = Arc::new(UserStore::new(dir.path()));
  let demo = DemoMode::new(true, &Secrets::default());

  demo.seed(&users).await.unwrap();
  assert!(users.verify(DEMO_USER_ID, DEMO_PASSWORD).await.unwrap());
  assert!(matches!(demo.check_registration(), Err(TerminalError::RegistrationDisabled)));
  assert!(demo.check_login(DEMO_USER_ID).is_ok());
  assert!(demo.check_login("mallory").is_err());

  let local = DemoMode::local();
  assert!(local.check_registration().is_ok());
  assert!(local.check_login("mallory").is_ok());
}

#[tokio::test]
async fn test_portfolio_persists_per_user() {
  let dir = tempdir().unwrap();
  let store = PortfolioStore::new(dir.path());

  store.add("alice", Holding::new("Apple", "AAPL", 100.0, 10.0)).await.unwrap();
  store.add("alice", Holding::new("Tesla", "TSLA", 250.0, 2.0)).await.unwrap();
  store.add("bob", Holding::new("Nvidia", "NVDA", 50.0, 1.0)).await.unwrap();

  let reopened = PortfolioStore::new(dir.path());
  assert_eq!(reopened.load("alice").await.unwrap().len(), 2);
  assert_eq!(reopened.load("bob").await.unwrap().len(), 1);
  assert!(reopened.load("nobody").await.unwrap().is_empty());

  let removed = reopened.remove("alice", 0).await.unwrap();
  assert_eq!(removed.ticker, "AAPL");
  assert!(reopened.remove("alice", 5).await.is_err());
  assert_eq!(reopened.load("alice").await.unwrap()[0].ticker, "TSLA");
}

#[tokio::test]
async fn test_portfolio_report_totals() {
  let ctx = context(
    FakeProvider::new()
      .with_history("AAPL", &wave(300, 100.0))
      .with_price("AAPL", 120.0)
      .with_price("GONE", 10.0),
  );
  let holdings = vec![
    Holding::new("Apple", "AAPL", 100.0, 10.0),
    Holding::new("Gone", "GONE", 5.0, 4.0),
    Holding::new("Missing", "MISSING", 1.0, 1.0),
  ];

  let report = PortfolioValuator::new(ctx).report(&holdings).await;

  assert_eq!(report.positions.len(), 3);
  assert_eq!(report.positions[0].current_price, Some(120.0));
  assert!(report.positions[0].score.is_some());
  // 분석 실패 시 현재가만 사용
  assert_eq!(report.positions[1].current_price, Some(10.0));
  assert!(report.positions[1].score.is_none());
  assert!(report.positions[2].current_price.is_none());

  // 시세가 있는 종목만 합산
  assert_eq!(report.total_invested, 1020.0);
  assert_eq!(report.total_evaluation, 1240.0);
  assert_eq!(report.total_profit, 220.0);
}

#[tokio::test]
async fn test_rebalance_weights_sum_to_hundred() {
  let ctx = context(
    FakeProvider::new()
      .with_history("AAPL", &wave(300, 100.0))
      .with_history("TSLA", &decline(300, 300.0))
      .with_history("NVDA", &wave(300, 50.0)),
  );
  let holdings = vec![
    Holding::new("Apple", "AAPL", 90.0, 10.0),
    Holding::new("Tesla", "TSLA", 200.0, 3.0),
    Holding::new("Nvidia", "NVDA", 40.0, 20.0),
    Holding::new("Ghost", "GHOST", 1.0, 1.0),
  ];

  let plan = Rebalancer::new(ctx).with_concurrency(2).plan(&holdings).await;

  assert_eq!(plan.lines.len(), 3);
  assert_eq!(plan.failed, vec!["GHOST".to_string()]);
  // 입력 순서 유지
  let tickers: Vec<&str> = plan.lines.iter().map(|l| l.ticker.as_str()).collect();
  assert_eq!(tickers, vec!["AAPL", "TSLA", "NVDA"]);

  let current: f64 = plan.lines.iter().map(|l| l.current_weight).sum();
  assert!((current - 100.0).abs() < 0.5);
  assert!(plan.summary.is_some());
}
