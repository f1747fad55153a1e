/**
* filename : retry
* author : HAMA
* date: 2025. 11. 5.
* description: HTTP 재시도 (429/5xx, 지수 백오프)
**/

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};

use crate::error::TerminalError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            backoff_ms: 1000,
        }
    }
}

impl RetryPolicy {
    /// attempt 번째 재시도 전 대기 시간 (backoff_ms * 2^attempt)
    pub fn delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(1u64 << attempt.min(16)))
    }
}

pub fn is_retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

/// GET 요청을 정책에 따라 재시도. 성공 응답만 반환
pub async fn get_with_retry(
    client: &Client,
    url: &str,
    policy: &RetryPolicy,
) -> Result<Response, TerminalError> {
    let mut attempt = 0;

    loop {
        match client.get(url).send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                let status = response.status();
                if is_retryable_status(status) && attempt < policy.max_retries {
                    log::warn!("요청 재시도 {}/{} (HTTP {}): {}", attempt + 1, policy.max_retries, status, url);
                } else {
                    return Err(TerminalError::DataFetch(format!("HTTP {} from {}", status, url)));
                }
            }
            Err(e) => {
                if attempt < policy.max_retries {
                    log::warn!("요청 재시도 {}/{} (전송 오류 {}): {}", attempt + 1, policy.max_retries, e, url);
                } else {
                    return Err(TerminalError::Http(e));
                }
            }
        }

        tokio::time::sleep(policy.delay(attempt)).await;
        attempt += 1;
    }
}
