//! OAuth2 authorization-code flow against the Bitrix24 OAuth server.

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use b24bot_core::{
    config::Config, domain::Credential, errors::Error, ports::OAuthExchange, Result,
};

/// Subset of the token endpoint response we keep; other fields are ignored.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    application_token: Option<String>,
    #[serde(default)]
    domain: Option<String>,
}

impl From<TokenResponse> for Credential {
    fn from(t: TokenResponse) -> Self {
        Credential {
            access_token: t.access_token,
            refresh_token: t.refresh_token,
            application_token: t.application_token,
            domain: t.domain.unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BitrixOAuth {
    http: reqwest::Client,
    token_url: String,
    authorize_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl BitrixOAuth {
    pub fn new(http: reqwest::Client, cfg: &Config) -> Result<Self> {
        let redirect_uri = cfg.redirect_uri();
        let authorize_url = Url::parse_with_params(
            &format!("{}/oauth/authorize/", cfg.oauth_url),
            &[
                ("client_id", cfg.client_id.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("response_type", "code"),
            ],
        )
        .map_err(|e| Error::Config(format!("BITRIX_OAUTH_URL is invalid: {e}")))?;

        Ok(Self {
            http,
            token_url: format!("{}/oauth/token/", cfg.oauth_url),
            authorize_url: authorize_url.into(),
            client_id: cfg.client_id.clone(),
            client_secret: cfg.client_secret.clone(),
            redirect_uri,
        })
    }
}

#[async_trait]
impl OAuthExchange for BitrixOAuth {
    fn authorize_url(&self) -> String {
        self.authorize_url.clone()
    }

    async fn exchange_code(&self, code: &str) -> Result<Credential> {
        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let resp = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("oauth token request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::Transport(format!("oauth token response unreadable: {e}")))?;

        if status != reqwest::StatusCode::OK {
            tracing::error!(status = status.as_u16(), "oauth token exchange rejected: {body}");
            return Err(Error::Remote {
                method: "oauth/token".to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| Error::Remote {
            method: "oauth/token".to_string(),
            status: status.as_u16(),
            body: format!("unexpected token response ({e}): {body}"),
        })?;
        tracing::info!(domain = ?token.domain, "oauth code exchanged");
        Ok(token.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::StatusCode, routing::post, Form, Json, Router};
    use serde_json::{json, Value};
    use std::{
        collections::HashMap,
        net::SocketAddr,
        sync::{Arc, Mutex},
        time::Duration,
    };

    type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

    async fn spawn_oauth(status: StatusCode, reply: Value) -> (String, Seen) {
        let seen: Seen = Arc::default();
        let app = Router::new()
            .route(
                "/oauth/token/",
                post(
                    move |State(seen): State<Seen>, Form(form): Form<HashMap<String, String>>| {
                        let reply = reply.clone();
                        async move {
                            seen.lock().unwrap().push(form);
                            (status, Json(reply))
                        }
                    },
                ),
            )
            .with_state(seen.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), seen)
    }

    fn config(oauth_url: &str) -> Config {
        let vars = HashMap::from([
            ("CLIENT_ID", "app.123".to_string()),
            ("CLIENT_SECRET", "s3cret".to_string()),
            ("HOST_URL", "https://robot.example.com".to_string()),
            ("BITRIX_OAUTH_URL", oauth_url.to_string()),
        ]);
        Config::from_lookup(|k| vars.get(k).cloned()).unwrap()
    }

    fn oauth(oauth_url: &str) -> BitrixOAuth {
        let http = crate::http_client(Duration::from_secs(5)).unwrap();
        BitrixOAuth::new(http, &config(oauth_url)).unwrap()
    }

    #[test]
    fn authorize_url_carries_client_and_redirect() {
        let url = Url::parse(&oauth("https://oauth.bitrix.info").authorize_url()).unwrap();
        assert_eq!(url.path(), "/oauth/authorize/");

        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(params["client_id"], "app.123");
        assert_eq!(params["redirect_uri"], "https://robot.example.com/install");
        assert_eq!(params["response_type"], "code");
    }

    #[tokio::test]
    async fn exchange_posts_form_and_maps_credential() {
        let (base, seen) = spawn_oauth(
            StatusCode::OK,
            json!({
                "access_token": "acc",
                "refresh_token": "ref",
                "expires_in": 3600,
                "domain": "portal.bitrix24.ru",
                "member_id": "m1"
            }),
        )
        .await;

        let cred = oauth(&base).exchange_code("abc").await.unwrap();
        assert_eq!(
            cred,
            Credential {
                access_token: "acc".to_string(),
                refresh_token: "ref".to_string(),
                application_token: None,
                domain: "portal.bitrix24.ru".to_string(),
            }
        );

        let form = seen.lock().unwrap()[0].clone();
        assert_eq!(form["grant_type"], "authorization_code");
        assert_eq!(form["client_id"], "app.123");
        assert_eq!(form["client_secret"], "s3cret");
        assert_eq!(form["code"], "abc");
        assert_eq!(form["redirect_uri"], "https://robot.example.com/install");
    }

    #[tokio::test]
    async fn response_without_domain_yields_empty_domain() {
        let (base, _) = spawn_oauth(
            StatusCode::OK,
            json!({ "access_token": "acc", "refresh_token": "ref" }),
        )
        .await;

        let cred = oauth(&base).exchange_code("abc").await.unwrap();
        assert!(cred.domain.is_empty());
    }

    #[tokio::test]
    async fn rejected_exchange_carries_status_and_body() {
        let (base, _) = spawn_oauth(
            StatusCode::BAD_REQUEST,
            json!({ "error": "invalid_grant" }),
        )
        .await;

        match oauth(&base).exchange_code("abc").await.unwrap_err() {
            Error::Remote { status, body, .. } => {
                assert_eq!(status, 400);
                assert!(body.contains("invalid_grant"));
            }
            other => panic!("expected remote error, got {other:?}"),
        }
    }
}
