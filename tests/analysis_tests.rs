/**
* filename : analysis_tests
* author : HAMA
* date: 2025. 11. 10.
* description: 분석기/스캐너/패턴/시그널 백테스트 통합 테스트
**/

mod common;

use std::sync::Arc;

use wallst_pro::analysis::{PatternFinder, PatternParams};
use wallst_pro::backtest::{RemoteDataProvider, SignalBacktestParams, SignalBacktester};
use wallst_pro::engine::{AnalysisContext, FundamentalsSource, Scanner, Strategy, TickerProfile};
use wallst_pro::market_data::Period;
use wallst_pro::models::Market;

use common::{context, data_client, decline, wave, FakeFundamentals, FakeProvider};

#[tokio::test]
async fn test_analyze_success_pipeline() {
  let ctx = context(FakeProvider::new().with_history("AAPL", &wave(250, 100.0)));

  // 입력 티커는 공백 제거 + 대문자화
  let result = ctx.analyzer(" aapl ").unwrap().analyze(Period::OneYear, false).await;

  assert!(result.success, "{:?}", result.error_msg);
  assert_eq!(result.ticker, "AAPL");
  assert!((0.0..=100.0).contains(&result.score));
  assert!(result.verdict.is_some());
  assert!(result.action.is_some());
  assert!(result.stop_loss < result.current_price);
  assert!(!result.detail_info.is_empty());
  assert!(result.error_type.is_none());
}

#[tokio::test]
async fn test_latest_price_overrides_last_close() {
  let ctx = context(
    FakeProvider::new()
      .with_history("AAPL", &wave(250, 100.0))
      .with_price("AAPL", 123.45),
  );

  let result = ctx.analyzer("AAPL").unwrap().analyze(Period::OneYear, false).await;
  assert!(result.success);
  assert_eq!(result.current_price, 123.45);
}

#[tokio::test]
async fn test_unknown_ticker_reports_data_fetch() {
  let ctx = context(FakeProvider::new());

  let result = ctx.analyzer("NOPE").unwrap().analyze(Period::SixMonths, false).await;
  assert!(!result.success);
  assert_eq!(result.error_type.as_deref(), Some("DataFetch"));
  assert!(result.error_msg.is_some());
}

#[tokio::test]
async fn test_short_history_reports_insufficient_data() {
  let ctx = context(FakeProvider::new().with_history("TINY", &wave(10, 50.0)));

  let result = ctx.analyzer("TINY").unwrap().analyze(Period::SixMonths, false).await;
  assert!(!result.success);
  assert_eq!(result.error_type.as_deref(), Some("InsufficientData"));
}

#[tokio::test]
async fn test_empty_ticker_rejected() {
  let ctx = context(FakeProvider::new());
  assert!(ctx.analyzer("   ").is_err());
}

#[tokio::test]
async fn test_fundamental_penalty_lowers_score() {
  let data = data_client(FakeProvider::new().with_history("SMALL", &wave(250, 20.0)));
  let plain = AnalysisContext::new(data.clone(), None);

  // 소형주 + 적자 => -45점
  let source: Arc<dyn FundamentalsSource> = Arc::new(FakeFundamentals {
    profile: TickerProfile {
      quote_type: "EQUITY".to_string(),
      short_name: "Small Corp".to_string(),
      market_cap: 50_000_000.0,
      trailing_eps: Some(-1.0),
      revenue_growth: Some(0.05),
      ..TickerProfile::default()
    },
  });
  let checked = AnalysisContext::new(data, Some(source));

  let base = plain.analyzer("SMALL").unwrap().analyze(Period::OneYear, true).await;
  let penalised = checked.analyzer("SMALL").unwrap().analyze(Period::OneYear, true).await;

  assert!(base.success && penalised.success);
  assert!(base.fundamentals.is_none());
  let fundamentals = penalised.fundamentals.as_ref().unwrap();
  assert_eq!(fundamentals.penalty, 45.0);
  let expected = (base.score - 45.0).max(0.0);
  assert!((penalised.score - expected).abs() < 0.11);
}

#[tokio::test]
async fn test_trend_strategy_skips_rsi_hook_filter() {
  let ctx = context(FakeProvider::new().with_history("TSLA", &decline(250, 300.0)));

  let result = ctx
    .analyzer("TSLA")
    .unwrap()
    .analyze_with(Period::OneYear, false, Strategy::Trend)
    .await;
  assert!(result.success);
  assert!(!result.filters.is_rsi_hook_failed);
}

#[tokio::test]
async fn test_scanner_sorts_and_counts_failures() {
  let ctx = context(
    FakeProvider::new()
      .with_history("AAPL", &wave(250, 100.0))
      .with_history("TSLA", &decline(250, 300.0))
      .with_history("005930.KS", &wave(250, 70_000.0)),
  );
  let universe = vec![
    ("Apple".to_string(), "AAPL".to_string()),
    ("Tesla".to_string(), "TSLA".to_string()),
    ("Ghost".to_string(), "GHOST".to_string()),
    ("삼성전자".to_string(), "005930.KS".to_string()),
  ];

  let report = Scanner::new(ctx).with_concurrency(2).scan(Market::Global, &universe).await;

  // 국내 종목은 GLOBAL 스캔 대상 아님
  assert_eq!(report.scanned, 3);
  assert_eq!(report.failed, 1);
  assert_eq!(report.results.len(), 2);
  assert!(report.results[0].score >= report.results[1].score);
  assert!(report.results.iter().all(|r| r.ticker != "005930.KS"));
}

#[tokio::test]
async fn test_pattern_finder_on_cyclic_series() {
  let data = data_client(FakeProvider::new().with_history("QQQ", &wave(400, 300.0)));

  let summary = PatternFinder::new(data)
    .with_params(PatternParams::default())
    .find("qqq")
    .await
    .unwrap();

  assert_eq!(summary.ticker, "QQQ");
  assert!(!summary.matches.is_empty());
  assert!(summary.matches.len() <= 3);
  assert!(summary.matches.iter().all(|m| m.similarity <= 100.0 + 1e-9));
  assert_eq!(summary.average_returns.len(), 2);
}

#[tokio::test]
async fn test_signal_backtest_over_remote_history() {
  let data = data_client(FakeProvider::new().with_history("NVDA", &wave(300, 50.0)));
  let backtester = SignalBacktester::new(Arc::new(RemoteDataProvider::new(data)));

  let params = SignalBacktestParams {
    threshold: 0.0,
    hold_days: 10,
  };
  let report = backtester.run("NVDA", params).await.unwrap();

  // 임계값 0 이면 워밍업 이후 모든 날이 시그널
  assert!(report.signals > 0);
  assert_eq!(report.trades.len() + report.skipped, report.signals);
  assert_eq!(report.skipped, 10);
  assert_eq!(report.wins + report.losses, report.trades.len());
  assert!((0.0..=100.0).contains(&report.win_rate));
}

#[tokio::test]
async fn test_signal_backtest_unknown_ticker_fails() {
  let data = data_client(FakeProvider::new());
  let backtester = SignalBacktester::new(Arc::new(RemoteDataProvider::new(data)));
  assert!(backtester.run("NOPE", SignalBacktestParams::default()).await.is_err());
}
