/**
* filename : main
* author : HAMA
* date: 2025. 11. 10.
* description: 서버 실행 및 단발성 분석 명령
**/

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use wallst_pro::analysis::PatternFinder;
use wallst_pro::api::{routes, AppState};
use wallst_pro::auth::sessions::random_secret;
use wallst_pro::auth::{DemoMode, SessionManager, UserStore};
use wallst_pro::backtest::{
    CsvDataProvider, HistoricalDataProvider, RemoteDataProvider, SignalBacktestParams, SignalBacktester,
};
use wallst_pro::config::{Config, Secrets};
use wallst_pro::engine::{AnalysisContext, FundamentalsSource, YahooFundamentals};
use wallst_pro::market_data::{DataClient, DualSourceRouter, NaverProvider, Period, RetryPolicy, YahooProvider};
use wallst_pro::models::symbol_book::{SymbolBook, SYMBOLS_FILE};
use wallst_pro::portfolio::PortfolioStore;
use wallst_pro::utils::logging;

const PURGE_INTERVAL_SECS: u64 = 3600;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("오류: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), anyhow::Error> {
    // 설정 로드
    let config = Config::load()?;
    logging::init(&config.logging.level)?;
    log::info!("WallSt Pro {} 시작...", wallst_pro::VERSION);

    let context = build_context(&config)?;

    // 명령줄 인수 확인
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("analyze") => {
            let ticker = args.get(1).context("usage: wallst-pro analyze <ticker> [--fundamental]")?;
            let apply_fundamental = args.iter().skip(2).any(|a| a == "--fundamental");
            run_analyze(&context, ticker, apply_fundamental).await
        }
        Some("backtest") => {
            let target = args.get(1).context("usage: wallst-pro backtest <ticker|file.csv> [hold_days]")?;
            let hold_days = args.get(2).map(|v| v.parse::<usize>()).transpose()?;
            run_backtest(&context, target, hold_days).await
        }
        Some("patterns") => {
            let ticker = args.get(1).context("usage: wallst-pro patterns <ticker>")?;
            run_patterns(&context, ticker).await
        }
        Some(other) => anyhow::bail!("unknown command: {}", other),
        None => run_server(config, context).await,
    }
}

fn build_context(config: &Config) -> Result<AnalysisContext, anyhow::Error> {
    let md = &config.market_data;
    let retry = RetryPolicy {
        max_retries: md.max_retries,
        backoff_ms: md.backoff_ms,
    };

    let yahoo = YahooProvider::new(md.yahoo_base_url.clone())?.with_retry(retry);
    let naver = NaverProvider::new(md.naver_base_url.clone())?.with_retry(retry);
    let router = DualSourceRouter::new(Arc::new(yahoo), Arc::new(naver));
    let data = Arc::new(DataClient::new(Arc::new(router), Duration::from_secs(md.cache_ttl_secs)));
    log::info!("시세 제공자 초기화 완료 (Yahoo + 네이버)");

    let fundamentals: Arc<dyn FundamentalsSource> = Arc::new(YahooFundamentals::new(md.yahoo_base_url.clone())?);
    Ok(AnalysisContext::new(data, Some(fundamentals)))
}

async fn run_analyze(context: &AnalysisContext, ticker: &str, apply_fundamental: bool) -> Result<(), anyhow::Error> {
    let result = context.analyzer(ticker)?.analyze(Period::default(), apply_fundamental).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    if !result.success {
        anyhow::bail!(result.error_msg.unwrap_or_else(|| "analysis failed".to_string()));
    }
    Ok(())
}

async fn run_backtest(context: &AnalysisContext, target: &str, hold_days: Option<usize>) -> Result<(), anyhow::Error> {
    let source: Arc<dyn HistoricalDataProvider> = if target.ends_with(".csv") {
        log::info!("CSV 파일로 백테스트: {}", target);
        Arc::new(CsvDataProvider::new(target, ','))
    } else {
        Arc::new(RemoteDataProvider::new(context.data.clone()))
    };

    let mut params = SignalBacktestParams::default();
    if let Some(days) = hold_days {
        params.hold_days = days;
    }

    // CSV 는 심볼 열이 없을 수 있으므로 빈 심볼로 전체 로드
    let symbol = if target.ends_with(".csv") { "" } else { target };
    let report = SignalBacktester::new(source).run(symbol, params).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_patterns(context: &AnalysisContext, ticker: &str) -> Result<(), anyhow::Error> {
    let summary = PatternFinder::new(context.data.clone()).find(ticker).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn run_server(config: Config, context: AnalysisContext) -> Result<(), anyhow::Error> {
    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;

    let secrets = Secrets::load(Path::new(&config.secrets_path))?;

    let users = Arc::new(UserStore::new(&data_dir));
    let secret = match config.session.secret.clone() {
        Some(secret) => secret,
        None => {
            log::warn!("SESSION_SECRET 미설정, 임시 키 사용 (재시작 시 세션 무효화)");
            random_secret()
        }
    };
    let sessions = Arc::new(
        SessionManager::new(config.session_file(), &secret, users.clone())
            .with_ttl(chrono::Duration::hours(config.session.ttl_hours)),
    );
    let portfolios = Arc::new(PortfolioStore::new(&data_dir));
    let symbols = Arc::new(SymbolBook::load(&data_dir.join(SYMBOLS_FILE))?);

    let demo = Arc::new(DemoMode::new(config.hosted, &secrets));
    if demo.is_hosted() {
        logging::log_hosted_mode(&config.storage.data_dir);
    }
    demo.seed(&users).await?;

    // 만료 세션 / 시세 캐시 정리 작업
    let purger = sessions.clone();
    let data = context.data.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(PURGE_INTERVAL_SECS));
        loop {
            interval.tick().await;
            match purger.purge_expired().await {
                Ok(0) => {}
                Ok(n) => log::info!("만료 세션 {}개 정리", n),
                Err(e) => logging::log_error("세션 정리", &e),
            }
            let evicted = data.purge_expired().await;
            if evicted > 0 {
                log::debug!("만료 캐시 {}건 정리", evicted);
            }
        }
    });

    let state = AppState {
        context,
        users,
        sessions,
        portfolios,
        symbols,
        demo,
        concurrency: config.market_data.concurrency,
    };

    let addr = config.bind_address()?;
    log::info!("API 서버 시작: http://{}", addr);
    warp::serve(routes::create_routes(state)).run(addr).await;

    Ok(())
}
