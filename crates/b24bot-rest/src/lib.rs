//! Bitrix24 REST adapter (reqwest).
//!
//! Implements the `b24bot-core` platform ports over the portal REST API
//! (`https://{domain}/rest/{method}.json?auth={token}`) and the OAuth server.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use b24bot_core::{
    domain::{ContactId, RobotSummary},
    errors::Error,
    ports::{PlatformClient, PlatformConnector},
    robot::{RobotDefinition, AUTH_USER_ID, DEAL_DOCUMENT_TYPE},
    Result,
};

pub mod oauth;

pub use oauth::BitrixOAuth;

/// Build the shared HTTP client with a bounded per-call timeout.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Transport(format!("http client build failed: {e}")))
}

/// Creates [`BitrixClient`]s for `https://{domain}/rest`.
#[derive(Clone, Debug)]
pub struct BitrixConnector {
    http: reqwest::Client,
}

impl BitrixConnector {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl PlatformConnector for BitrixConnector {
    fn connect(&self, domain: &str, access_token: &str) -> Box<dyn PlatformClient> {
        Box::new(BitrixClient::new(
            self.http.clone(),
            format!("https://{domain}/rest"),
            access_token,
        ))
    }
}

/// Low-level client for one portal.
#[derive(Clone)]
pub struct BitrixClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl std::fmt::Debug for BitrixClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitrixClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl BitrixClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    /// POST `payload` to a REST method and return the decoded response body.
    async fn call(&self, method: &str, payload: &Value) -> Result<Value> {
        let url = format!("{}/{method}.json", self.base_url);
        let resp = self
            .http
            .post(&url)
            .query(&[("auth", self.access_token.as_str())])
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(%method, "network error: {e}");
                Error::Transport(format!("{method}: {e}"))
            })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::Transport(format!("{method}: reading response failed: {e}")))?;

        if !status.is_success() {
            tracing::error!(%method, status = status.as_u16(), "portal API error: {body}");
            return Err(remote_error(method, status.as_u16(), body));
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|_| remote_error(method, status.as_u16(), body.clone()))?;
        if value.get("error").is_some() {
            tracing::error!(%method, "portal API error: {body}");
            return Err(remote_error(method, status.as_u16(), body));
        }
        Ok(value)
    }
}

fn remote_error(method: &str, status: u16, body: String) -> Error {
    Error::Remote {
        method: method.to_string(),
        status,
        body: body.chars().take(500).collect(),
    }
}

#[async_trait]
impl PlatformClient for BitrixClient {
    async fn delete_robot(&self, code: &str) -> Result<()> {
        self.call("bizproc.robot.delete", &json!({ "CODE": code })).await?;
        Ok(())
    }

    async fn register_robot(&self, definition: &RobotDefinition) -> Result<()> {
        self.call("bizproc.robot.add", &robot_add_payload(definition)).await?;
        Ok(())
    }

    async fn list_robots(&self) -> Result<Vec<RobotSummary>> {
        let value = self.call("bizproc.robot.list", &json!({})).await?;
        Ok(parse_robot_list(value.get("result").unwrap_or(&Value::Null)))
    }

    async fn create_contact(&self, fields: Map<String, Value>) -> Result<ContactId> {
        let method = "crm.contact.add";
        let value = self.call(method, &json!({ "fields": fields })).await?;
        value
            .get("result")
            .and_then(parse_id)
            .map(ContactId)
            .ok_or_else(|| remote_error(method, 200, value.to_string()))
    }

    async fn report_result(
        &self,
        event_token: &str,
        return_values: Map<String, Value>,
    ) -> Result<()> {
        self.call(
            "bizproc.event.send",
            &json!({ "event_token": event_token, "return_values": return_values }),
        )
        .await?;
        Ok(())
    }
}

/// Wire payload for `bizproc.robot.add`.
pub fn robot_add_payload(definition: &RobotDefinition) -> Value {
    json!({
        "CODE": definition.code,
        "HANDLER": definition.handler_url,
        "AUTH_USER_ID": AUTH_USER_ID,
        "USE_SUBSCRIPTION": "Y",
        "NAME": definition.name,
        "PROPERTIES": definition.properties,
        "RETURN_PROPERTIES": definition.return_properties,
        "FILTER": { "INCLUDE": [["crm", DEAL_DOCUMENT_TYPE]] },
    })
}

/// `bizproc.robot.list` returns either a list or an object, with items that are
/// bare codes or `{CODE, NAME}` objects.
pub fn parse_robot_list(result: &Value) -> Vec<RobotSummary> {
    let items: Vec<&Value> = match result {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(code) if !code.trim().is_empty() => Some(RobotSummary {
                code: code.clone(),
                name: None,
            }),
            Value::Object(obj) => {
                let code = obj.get("CODE").and_then(|c| c.as_str())?;
                if code.trim().is_empty() {
                    return None;
                }
                Some(RobotSummary {
                    code: code.to_string(),
                    name: obj
                        .get("NAME")
                        .and_then(|n| n.as_str())
                        .map(|n| n.to_string()),
                })
            }
            _ => None,
        })
        .collect()
}

fn parse_id(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
