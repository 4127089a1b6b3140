use std::time::Duration;

use reqwest::{multipart::Form, Client, RequestBuilder};
use serde_json::Value;
use tokio::time::sleep;

use crate::{tools::log::{log_info, LogServiceType}, Error, Result};

/// Client for the external face-swap service. Submitting a pair of image
/// URLs yields a request id; the result endpoint is then polled with bounded
/// exponential backoff until the job reports a result URL.
#[derive(Debug, Clone)]
pub struct FaceSwapContext {
    host: String,
    key: String,
    client: Client,
    poll_delay: Duration,
    poll_attempts: u32,
}

impl FaceSwapContext {
    pub fn new(key: String, host: String, poll_delay_ms: u64, poll_attempts: u32) -> Self {
        FaceSwapContext {
            host,
            key,
            client: reqwest::Client::new(),
            poll_delay: Duration::from_millis(poll_delay_ms),
            poll_attempts,
        }
    }

    pub fn add_auth(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("x-rapidapi-key", &self.key)
            .header("x-rapidapi-host", &self.host)
    }

    /// Submit both image URLs and wait for the swap result. The returned
    /// JSON is relayed to the caller untouched.
    pub async fn swap(&self, target_url: &str, swap_url: &str) -> Result<Value> {
        let form = Form::new()
            .text("target_url", target_url.to_string())
            .text("swap_url", swap_url.to_string());
        let request = self.add_auth(self.client.post(format!("https://{}/faceswap/v1/image", self.host))).multipart(form);
        let response = request.send().await?;
        let value = response.json::<Value>().await?;

        let request_id = extract_request_id(&value).ok_or(Error::MissingRequestId)?;
        log_info(LogServiceType::Swap, format!("Swap submitted, request_id: {}", request_id));
        self.result(&request_id).await
    }

    /// Poll the results endpoint until the job is done, doubling the delay
    /// between attempts.
    pub async fn result(&self, request_id: &str) -> Result<Value> {
        let mut delay = self.poll_delay;
        for attempt in 0..self.poll_attempts {
            sleep(delay).await;

            let form = Form::new().text("request_id", request_id.to_string());
            let request = self.add_auth(self.client.post(format!("https://{}/result/", self.host))).multipart(form);
            let response = request.send().await?;
            let value = response.json::<Value>().await?;

            if result_ready(&value) {
                return Ok(value);
            }
            log_info(LogServiceType::Swap, format!("Result for {} not ready (attempt {})", request_id, attempt + 1));
            delay *= 2;
        }
        Err(Error::SwapJobTimeout)
    }
}

pub fn extract_request_id(value: &Value) -> Option<String> {
    value
        .pointer("/image_process_response/request_id")
        .and_then(|id| id.as_str())
        .map(|id| id.to_string())
}

pub fn result_ready(value: &Value) -> bool {
    matches!(
        value.pointer("/image_process_response/result_url").and_then(|url| url.as_str()),
        Some(url) if !url.is_empty()
    )
}
