//! Route handlers.
//!
//! Install endpoints answer with JSON; the robot handler answers in plain text,
//! which is what the business-process engine expects from a handler URL.

pub mod install;
pub mod robot;

use b24bot_core::errors::Error;

/// Message for a client-facing error body, without the error-kind prefix.
pub(crate) fn error_message(e: &Error) -> String {
    match e {
        Error::Config(msg) | Error::Validation(msg) => msg.clone(),
        Error::Remote { body, .. } => body.clone(),
        other => other.to_string(),
    }
}
