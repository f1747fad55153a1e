//! 로깅 유틸리티
//!
//! 로그 초기화 및 분석/세션 이벤트 로그 함수 제공

use env_logger::Builder;
use log::LevelFilter;
use std::env;

use crate::error::TerminalError;

fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

/// 로깅 시스템 초기화. RUST_LOG 가 설정 파일 레벨보다 우선
pub fn init(default_level: &str) -> Result<(), TerminalError> {
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string());

    Builder::new()
        .filter_level(parse_level(&log_level))
        .format_timestamp_millis()
        .try_init()
        .map_err(|e| TerminalError::ConfigError(format!("Logger already initialised: {}", e)))?;

    log::info!("로깅 시스템 초기화 완료: 레벨 = {}", log_level);

    Ok(())
}

/// 종목 분석 완료 로그
pub fn log_analysis_done(ticker: &str, score: f64, verdict: &str) {
    log::info!("분석 완료: {} - 점수: {:.1} - 판정: {}", ticker, score, verdict);
}

/// 스캔 결과 로그
pub fn log_scan_done(market: &str, scanned: usize, failed: usize) {
    log::info!("스캔 완료: {} - 성공 {}개, 실패 {}개", market, scanned - failed, failed);
}

/// 호스팅 모드 경고 (저장소 휘발)
pub fn log_hosted_mode(data_dir: &str) {
    log::warn!(
        "호스팅 모드 감지: {} 의 users.json / portfolio_*.json 은 재배포 시 초기화됩니다",
        data_dir
    );
}

/// 오류 로그
pub fn log_error(context: &str, error: &TerminalError) {
    log::error!("오류 발생 - {}: {}", context, error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("debug", LevelFilter::Debug)]
    #[case("WARN", LevelFilter::Warn)]
    #[case("verbose", LevelFilter::Info)]
    fn test_parse_level(#[case] input: &str, #[case] expected: LevelFilter) {
        assert_eq!(parse_level(input), expected);
    }
}
