//! HTTP client for the accrual oracle.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::models::OperationStatus;

/// Oracle verdict for one order.
#[derive(Debug, Deserialize)]
pub struct AccrualReply {
    #[serde(rename = "order")]
    pub order_number: String,
    pub status: OperationStatus,
    #[serde(default)]
    pub accrual: Decimal,
}

#[derive(Debug, Error)]
pub enum AccrualError {
    /// HTTP 429 with the oracle's timing hints.
    #[error("too many requests")]
    TooManyRequests {
        retry_after: Duration,
        max_rpm: u32,
    },
    #[error("request failed: {0}")]
    RequestFailed(String),
}

pub struct AccrualClient {
    base_url: String,
    http: reqwest::Client,
}

impl AccrualClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// GET `<base>/api/orders/<number>`. Anything but a parsable 200 is an
    /// error; 429 carries the oracle's rate-limit hints.
    pub async fn order_status(&self, order_number: &str) -> Result<AccrualReply, AccrualError> {
        let url = format!("{}/api/orders/{}", self.base_url, order_number);
        let res = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AccrualError::RequestFailed(e.to_string()))?;

        if res.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = res
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0);
            let body = res.text().await.unwrap_or_default();
            return Err(AccrualError::TooManyRequests {
                retry_after: Duration::from_secs(retry_after),
                max_rpm: parse_max_rpm(&body),
            });
        }
        if res.status() != reqwest::StatusCode::OK {
            return Err(AccrualError::RequestFailed(format!(
                "unexpected status {}",
                res.status()
            )));
        }

        res.json::<AccrualReply>()
            .await
            .map_err(|e| AccrualError::RequestFailed(e.to_string()))
    }
}

static RPM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^No more than (\d+) requests per minute allowed").unwrap());

/// The request quota the oracle announces in its 429 body; zero when the
/// body does not match.
pub(crate) fn parse_max_rpm(body: &str) -> u32 {
    RPM_RE
        .captures(body)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_max_rpm() {
        assert_eq!(
            parse_max_rpm("No more than 60 requests per minute allowed"),
            60
        );
        assert_eq!(
            parse_max_rpm("No more than 30 requests per minute allowed\n"),
            30
        );
        assert_eq!(parse_max_rpm("please slow down"), 0);
        assert_eq!(
            parse_max_rpm("prefix No more than 60 requests per minute allowed"),
            0
        );
        assert_eq!(parse_max_rpm(""), 0);
    }

    #[test]
    fn test_reply_parsing() {
        let reply: AccrualReply =
            serde_json::from_str(r#"{"order":"12345678903","status":"PROCESSED","accrual":729.98}"#)
                .unwrap();
        assert_eq!(reply.order_number, "12345678903");
        assert_eq!(reply.status, OperationStatus::Processed);
        assert_eq!(reply.accrual, Decimal::new(72998, 2));
    }

    #[test]
    fn test_reply_without_accrual_defaults_to_zero() {
        let reply: AccrualReply =
            serde_json::from_str(r#"{"order":"12345678903","status":"PROCESSING"}"#).unwrap();
        assert_eq!(reply.status, OperationStatus::Processing);
        assert!(reply.accrual.is_zero());
    }
}
