use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::app::Result;
use crate::delivery::{Notifier, WebhookPayload};

pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(15);

/// Posts JSON payloads to chat webhooks (Discord-style `content` field).
pub struct WebhookClient {
    client: Client,
}

impl WebhookClient {
    pub fn new() -> Self {
        Self::with_timeout(DELIVERY_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("feedhook/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }
}

impl Default for WebhookClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for WebhookClient {
    async fn deliver(&self, endpoint: &str, payload: &WebhookPayload) -> Result<()> {
        tracing::debug!("Posting {} bytes to webhook", payload.content.len());

        let response = self.client.post(endpoint).json(payload).send().await?;
        response.error_for_status()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::FeedhookError;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accepts one connection, captures the request and answers with `status`.
    async fn one_shot_server(status: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            l.to_ascii_lowercase()
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                status
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{}/hook", addr), handle)
    }

    #[tokio::test]
    async fn test_posts_json_content() {
        let (url, server) = one_shot_server("204 No Content").await;
        let payload = WebhookPayload::new("Hello", "https://example.com/a", "");

        WebhookClient::new().deliver(&url, &payload).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /hook"));
        assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(request.contains(r#""content":"#));
        assert!(request.contains("https://example.com/a"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let (url, server) = one_shot_server("429 Too Many Requests").await;
        let payload = WebhookPayload::new("Hello", "https://example.com/a", "");

        let result = WebhookClient::new().deliver(&url, &payload).await;
        server.await.unwrap();

        assert!(matches!(result, Err(FeedhookError::Http(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let payload = WebhookPayload::new("Hello", "https://example.com/a", "");
        let result = WebhookClient::with_timeout(Duration::from_secs(2))
            .deliver(&format!("http://{}/hook", addr), &payload)
            .await;

        assert!(result.is_err());
    }
}
