use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use b24bot_core::{
    domain::{ContactRequest, Invocation},
    errors::Error,
};

use super::error_message;
use crate::router::AppState;

/// Robot invocation body; input properties arrive as `properties[<KEY>]`.
#[derive(Debug, Default, Deserialize)]
pub struct InvocationForm {
    pub event_token: Option<String>,
    #[serde(rename = "properties[LAST_NAME]")]
    pub last_name: Option<String>,
    #[serde(rename = "properties[NAME]")]
    pub first_name: Option<String>,
    #[serde(rename = "properties[SECOND_NAME]")]
    pub second_name: Option<String>,
    #[serde(rename = "properties[PHONE]")]
    pub phone: Option<String>,
    #[serde(rename = "properties[EMAIL]")]
    pub email: Option<String>,
}

/// POST /handler
pub async fn invoke(State(state): State<AppState>, Form(form): Form<InvocationForm>) -> Response {
    let Some(event_token) = form.event_token.filter(|t| !t.trim().is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Token missing").into_response();
    };

    let contact = ContactRequest::from_parts(
        form.last_name,
        form.first_name,
        form.second_name,
        form.phone,
        form.email,
    );
    if !contact.has_required_names() {
        return (StatusCode::BAD_REQUEST, "Error: NAME and LAST_NAME required").into_response();
    }

    let invocation = Invocation {
        event_token,
        contact,
    };
    match state.robots.process(&invocation).await {
        Ok(_) => (StatusCode::OK, "OK").into_response(),
        Err(e @ Error::Validation(_)) => {
            (StatusCode::BAD_REQUEST, format!("Error: {}", error_message(&e))).into_response()
        }
        Err(e) => {
            tracing::error!("handler error: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {e}")).into_response()
        }
    }
}

/// GET /handler
///
/// Liveness probe for the handler URL.
pub async fn ping() -> Json<Value> {
    Json(json!({ "result": "pong" }))
}
