//! Outbound webhook invocation.
//!
//! Failures never cross this boundary: transport errors, bad statuses, and a
//! missing endpoint all come back as a structured `{"error": ...}` payload so
//! the tool-call record still completes with something to store.

use serde_json::{json, Value};
use std::time::Duration;

pub struct WebhookDispatcher {
    client: reqwest::Client,
}

impl WebhookDispatcher {
    pub fn new(timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to build webhook HTTP client");
        WebhookDispatcher { client }
    }

    /// POST `{tool_name, parameters, tool_call_id}` to the agent's endpoint.
    /// One shot, no retry; the caller blocks until response or timeout.
    pub async fn invoke(
        &self,
        endpoint: &str,
        tool_name: &str,
        parameters: &Value,
        tool_call_id: &str,
    ) -> Value {
        if endpoint.is_empty() {
            return json!({"error": "No webhook configured for this agent"});
        }

        let payload = json!({
            "tool_name": tool_name,
            "parameters": parameters,
            "tool_call_id": tool_call_id,
        });

        let response = match self.client.post(endpoint).json(&payload).send().await {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Webhook request to {} failed: {}", endpoint, e);
                return json!({"error": format!("Webhook request failed: {}", e)});
            }
        };

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return json!({
                "error": format!("Webhook call failed with status {}", status.as_u16()),
                "details": details,
            });
        }

        // Successful responses are passed through verbatim, shape unchecked
        match response.json::<Value>().await {
            Ok(body) => body,
            Err(e) => json!({"error": format!("Webhook request failed: {}", e)}),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// One-shot HTTP server answering every request with the given status and
    /// JSON body. Returns the endpoint URL.
    async fn one_shot_server(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });
        format!("http://{}/webhook", addr)
    }

    #[tokio::test]
    async fn test_success_passes_body_through_verbatim() {
        let endpoint = one_shot_server("200 OK", r#"{"result":42}"#).await;
        let dispatcher = WebhookDispatcher::new(5);
        let result = dispatcher
            .invoke(&endpoint, "add", &json!({"a": 15, "b": 27}), "tc-1")
            .await;
        assert_eq!(result, json!({"result": 42}));
    }

    #[tokio::test]
    async fn test_error_status_captured_with_details() {
        let endpoint = one_shot_server("500 Internal Server Error", "boom").await;
        let dispatcher = WebhookDispatcher::new(5);
        let result = dispatcher.invoke(&endpoint, "add", &json!({}), "tc-1").await;
        assert_eq!(
            result["error"].as_str().unwrap(),
            "Webhook call failed with status 500"
        );
        assert_eq!(result["details"].as_str().unwrap(), "boom");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_becomes_error_payload() {
        let dispatcher = WebhookDispatcher::new(2);
        let result = dispatcher
            .invoke("http://127.0.0.1:1/webhook", "add", &json!({}), "tc-1")
            .await;
        assert!(result["error"]
            .as_str()
            .unwrap()
            .starts_with("Webhook request failed:"));
    }

    #[tokio::test]
    async fn test_missing_endpoint_short_circuits() {
        let dispatcher = WebhookDispatcher::new(2);
        let result = dispatcher.invoke("", "add", &json!({}), "tc-1").await;
        assert_eq!(
            result,
            json!({"error": "No webhook configured for this agent"})
        );
    }
}
