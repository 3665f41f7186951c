use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{Client, StatusCode};

use crate::{config::AccrualConfig, data_objects::RewardDecision, error::AccrualApiError, retry::RetryPolicy};

#[derive(Debug, Clone)]
pub struct AccrualApi {
    config: AccrualConfig,
    retry: RetryPolicy,
    client: Arc<Client>,
}

impl AccrualApi {
    pub fn new(config: AccrualConfig) -> Result<Self, AccrualApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AccrualApiError::Initialization(e.to_string()))?;
        Ok(Self { config, retry: RetryPolicy::default(), client: Arc::new(client) })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn url(&self, order_number: &str) -> String {
        format!("{}/api/orders/{order_number}", self.config.base_url)
    }

    /// Asks the accrual service for its decision on the given order number.
    ///
    /// Returns `Ok(Some(decision))` on a 200 response, and `Ok(None)` on a 204: the remote system has no record
    /// of the order yet, which is a "try again later" signal rather than an error. A 429 is retried within this
    /// call according to the configured [`RetryPolicy`]; every other failure is returned immediately.
    pub async fn order_reward(&self, order_number: &str) -> Result<Option<RewardDecision>, AccrualApiError> {
        let url = self.url(order_number);
        for attempt in 1..=self.retry.max_attempts() {
            trace!("🎁️ GET {url} (attempt {attempt})");
            let response =
                self.client.get(&url).send().await.map_err(|e| AccrualApiError::RequestError(e.to_string()))?;
            let status = response.status();
            match status {
                StatusCode::OK => {
                    let decision = response
                        .json::<RewardDecision>()
                        .await
                        .map_err(|e| AccrualApiError::JsonError(e.to_string()))?;
                    trace!("🎁️ Order {order_number} decision: {}", decision.status);
                    return Ok(Some(decision));
                },
                StatusCode::NO_CONTENT => {
                    trace!("🎁️ Order {order_number} is not registered with the accrual service yet");
                    return Ok(None);
                },
                StatusCode::TOO_MANY_REQUESTS => {
                    if attempt == self.retry.max_attempts() {
                        break;
                    }
                    let retry_after = response.headers().get("Retry-After").and_then(|v| v.to_str().ok());
                    let delay = self.retry.delay_for(status, retry_after);
                    debug!("🎁️ Accrual service is rate limiting us. Retrying {order_number} in {delay:?}");
                    tokio::time::sleep(delay).await;
                },
                _ => {
                    let message =
                        response.text().await.map_err(|e| AccrualApiError::RequestError(e.to_string()))?;
                    return Err(AccrualApiError::QueryError { status: status.as_u16(), message });
                },
            }
        }
        Err(AccrualApiError::RateLimited(order_number.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builds_order_urls() {
        let api = AccrualApi::new(AccrualConfig::new("http://localhost:8078/")).unwrap();
        assert_eq!(api.url("12345678903"), "http://localhost:8078/api/orders/12345678903");
    }
}
