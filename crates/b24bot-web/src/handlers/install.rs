use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::json;

use b24bot_core::{
    domain::{Credential, InstallOutcome},
    errors::Error,
};

use super::error_message;
use crate::router::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
}

/// Install event body; the portal sends the credential as `auth[...]` keys.
#[derive(Debug, Default, Deserialize)]
pub struct InstallEventForm {
    #[serde(rename = "auth[access_token]")]
    pub access_token: Option<String>,
    #[serde(rename = "auth[refresh_token]")]
    pub refresh_token: Option<String>,
    #[serde(rename = "auth[application_token]")]
    pub application_token: Option<String>,
    #[serde(rename = "auth[domain]")]
    pub domain: Option<String>,
}

impl From<InstallEventForm> for Credential {
    fn from(form: InstallEventForm) -> Self {
        Credential {
            access_token: form.access_token.unwrap_or_default(),
            refresh_token: form.refresh_token.unwrap_or_default(),
            application_token: form.application_token.filter(|t| !t.is_empty()),
            domain: form.domain.unwrap_or_default(),
        }
    }
}

/// GET /install
///
/// Without `code`: redirect the admin to the OAuth authorize page.
/// With `code`: exchange it, persist the credential and register the robot.
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Response {
    let Some(code) = query.code.filter(|c| !c.trim().is_empty()) else {
        return Redirect::temporary(&state.installer.authorize_url()).into_response();
    };

    let credential = match state.installer.exchange_code(&code).await {
        Ok(credential) => credential,
        Err(e) => {
            tracing::error!("oauth code exchange failed: {e}");
            return json_error(StatusCode::BAD_REQUEST, error_message(&e));
        }
    };

    installed(state.installer.install(credential).await)
}

/// POST /install
///
/// Platform-initiated installation carrying the credential in the form body.
pub async fn install_event(
    State(state): State<AppState>,
    Form(form): Form<InstallEventForm>,
) -> Response {
    installed(state.installer.accept_install_event(form.into()).await)
}

fn installed(result: b24bot_core::Result<InstallOutcome>) -> Response {
    match result {
        Ok(outcome) => {
            tracing::info!(?outcome, "application installed");
            Json(json!({ "status": "installed" })).into_response()
        }
        Err(e) => {
            let status = match &e {
                Error::Validation(_) => StatusCode::BAD_REQUEST,
                Error::Remote { .. } | Error::Transport(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            tracing::error!(status = status.as_u16(), "install failed: {e}");
            json_error(status, error_message(&e))
        }
    }
}

fn json_error(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
