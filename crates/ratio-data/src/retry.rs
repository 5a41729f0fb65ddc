//! HTTP 429 재시도 정책.
//!
//! 두 시세 소스가 공유합니다. 429 응답에 대해서만 선형 백오프
//! (`attempt × base_delay`)로 재전송하며, 전송 오류는 재시도하지 않습니다.

use std::time::Duration;

use ratio_core::InvocationLog;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::json;

/// 재시도 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 최대 재시도 횟수 (최초 요청 제외)
    pub max_retries: u32,
    /// 기본 대기 시간
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// `attempt`번째 재시도 전 대기 시간 (1부터 시작).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// 요청을 전송하고, 429이면 재시도합니다.
    ///
    /// `build`는 시도마다 호출되어 새 요청을 만듭니다.
    /// 재시도를 소진하면 마지막 응답(429 포함)을 그대로 반환합니다.
    pub async fn send<F>(
        &self,
        label: &str,
        log: &InvocationLog,
        mut build: F,
    ) -> Result<Response, reqwest::Error>
    where
        F: FnMut() -> RequestBuilder,
    {
        let mut response = build().send().await?;

        for attempt in 1..=self.max_retries {
            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                break;
            }
            let delay = self.delay_for(attempt);
            log.info(
                format!("{}:429_retry", label),
                json!({ "i": attempt, "delay_ms": delay.as_millis() as u64 }),
            );
            tokio::time::sleep(delay).await;
            response = build().send().await?;
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratio_core::CaptureLevel;

    #[test]
    fn test_delay_is_linear() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_send_gives_up_after_max_retries() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/limited")
            .with_status(429)
            .expect(4)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/limited", server.url());
        let log = InvocationLog::new(CaptureLevel::Info, false);
        let policy = RetryPolicy::new(3, Duration::from_millis(1));

        let response = policy
            .send("test", &log, || client.get(&url))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        mock.assert_async().await;

        let retries: Vec<_> = log
            .lines()
            .into_iter()
            .filter(|l| l.msg == "test:429_retry")
            .collect();
        assert_eq!(retries.len(), 3);
    }

    #[tokio::test]
    async fn test_send_does_not_retry_other_statuses() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/missing", server.url());
        let log = InvocationLog::new(CaptureLevel::Debug, false);

        let response = RetryPolicy::default()
            .send("test", &log, || client.get(&url))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        mock.assert_async().await;
        assert!(log.lines().is_empty());
    }
}
