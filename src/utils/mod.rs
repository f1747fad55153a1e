//! 시간 관련 유틸리티
//!
//! 타임스탬프 변환 및 포맷팅 함수 제공

pub mod logging;

use chrono::{DateTime, TimeZone, Utc};

/// 타임스탬프(밀리초)를 DateTime<Utc>로 변환
pub fn timestamp_to_datetime(timestamp_ms: i64) -> DateTime<Utc> {
  Utc.timestamp_millis_opt(timestamp_ms).single().unwrap_or_default()
}

/// 타임스탬프(밀리초)를 포맷팅된 문자열로 변환
pub fn format_timestamp(timestamp_ms: i64, format: &str) -> String {
  timestamp_to_datetime(timestamp_ms).format(format).to_string()
}
