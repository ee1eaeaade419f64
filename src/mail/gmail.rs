//! Gmail REST client.
//!
//! Thin wrapper over the Gmail v1 API using a bearer token obtained out of
//! band (token refresh is handled by an external auth flow). Only the three
//! operations the assistant needs: list, metadata get, send.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::MailError;
use crate::mail::{MailSummary, Mailbox, MessageRef};

const API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Headers requested on metadata fetches.
const METADATA_HEADERS: &[&str] = &["From", "Subject", "Date", "In-Reply-To"];

/// Gmail API client.
pub struct GmailClient {
    http: reqwest::Client,
    token: SecretString,
    base_url: String,
}

impl GmailClient {
    pub fn new(token: SecretString) -> Self {
        Self {
            http: reqwest::Client::new(),
            token,
            base_url: API_BASE.to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        operation: &'static str,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, MailError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(|e| request_failed(operation, e))?;
        read_json(operation, response).await
    }
}

fn request_failed(operation: &'static str, e: reqwest::Error) -> MailError {
    MailError::RequestFailed {
        operation: operation.to_string(),
        reason: e.to_string(),
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(
    operation: &'static str,
    response: reqwest::Response,
) -> Result<T, MailError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(MailError::Rejected {
            status: status.as_u16(),
            body: body.chars().take(500).collect(),
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|e| request_failed(operation, e))
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    messages: Vec<ListEntry>,
}

#[derive(Debug, Deserialize)]
struct ListEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    id: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    payload: Payload,
}

#[derive(Debug, Default, Deserialize)]
struct Payload {
    #[serde(default)]
    headers: Vec<Header>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

// ── Mailbox impl ────────────────────────────────────────────────────

#[async_trait]
impl Mailbox for GmailClient {
    async fn list(
        &self,
        labels: &[&str],
        max: usize,
        query: Option<&str>,
    ) -> Result<Vec<MessageRef>, MailError> {
        let url = format!("{}/messages", self.base_url);
        let max_results = max.to_string();
        let mut params: Vec<(&str, &str)> = vec![("maxResults", &max_results)];
        for label in labels {
            params.push(("labelIds", label));
        }
        if let Some(q) = query {
            params.push(("q", q));
        }

        let response: ListResponse = self.get_json("list", &url, &params).await?;
        Ok(response
            .messages
            .into_iter()
            .map(|m| MessageRef { id: m.id })
            .collect())
    }

    async fn get(&self, id: &str) -> Result<MailSummary, MailError> {
        let url = format!("{}/messages/{}", self.base_url, id);
        let mut params: Vec<(&str, &str)> = vec![("format", "metadata")];
        for header in METADATA_HEADERS {
            params.push(("metadataHeaders", header));
        }

        let response: GetResponse = self.get_json("get", &url, &params).await?;

        let mut summary = MailSummary {
            id: response.id,
            from: "Unknown".to_string(),
            subject: "No Subject".to_string(),
            snippet: response.snippet,
            ..Default::default()
        };
        for header in &response.payload.headers {
            match header.name.as_str() {
                "From" => summary.from = header.value.clone(),
                "Subject" => summary.subject = header.value.clone(),
                "Date" => summary.date = header.value.clone(),
                "In-Reply-To" => summary.is_reply = true,
                _ => {}
            }
        }
        Ok(summary)
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<String, MailError> {
        if !to.contains('@') {
            return Err(MailError::InvalidAddress(to.to_string()));
        }

        let mime = format!("To: {to}\r\nSubject: {subject}\r\nContent-Type: text/plain; charset=\"UTF-8\"\r\n\r\n{body}");
        let raw = URL_SAFE_NO_PAD.encode(mime.as_bytes());

        let url = format!("{}/messages/send", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.token.expose_secret())
            .json(&serde_json::json!({ "raw": raw }))
            .send()
            .await
            .map_err(|e| request_failed("send", e))?;
        let sent: SendResponse = read_json("send", response).await?;

        tracing::info!(message_id = %sent.id, "Email sent via Gmail");
        Ok(sent.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_response_tolerates_missing_messages() {
        // Gmail omits the `messages` key entirely when the result set is empty.
        let parsed: ListResponse = serde_json::from_str(r#"{"resultSizeEstimate": 0}"#).unwrap();
        assert!(parsed.messages.is_empty());
    }

    #[test]
    fn get_response_parses_headers() {
        let body = r#"{
            "id": "m1",
            "snippet": "hello there",
            "payload": {"headers": [
                {"name": "From", "value": "a@example.com"},
                {"name": "Subject", "value": "Hi"},
                {"name": "Date", "value": "Mon, 9 Jun 2025 10:00:00 +0000"},
                {"name": "In-Reply-To", "value": "<x@example.com>"}
            ]}
        }"#;
        let parsed: GetResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.id, "m1");
        assert_eq!(parsed.payload.headers.len(), 4);
    }

    #[tokio::test]
    async fn send_rejects_address_without_at() {
        let client = GmailClient::new(SecretString::from("tok"));
        let result = client.send("not-an-address", "s", "b").await;
        assert!(matches!(result, Err(MailError::InvalidAddress(_))));
    }
}
