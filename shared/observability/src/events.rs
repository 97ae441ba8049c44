//! Structured identity events.
//!
//! Every event goes to the `auth_event` target with a fixed field set so log
//! pipelines can filter on it. Credentials and tokens are never fields.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthEvent {
    SignupSucceeded,
    SignupRejected,
    SignupConflict,
    LoginSucceeded,
    LoginFailed,
    TokenRejected,
}

impl AuthEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthEvent::SignupSucceeded => "signup_succeeded",
            AuthEvent::SignupRejected => "signup_rejected",
            AuthEvent::SignupConflict => "signup_conflict",
            AuthEvent::LoginSucceeded => "login_succeeded",
            AuthEvent::LoginFailed => "login_failed",
            AuthEvent::TokenRejected => "token_rejected",
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, AuthEvent::SignupSucceeded | AuthEvent::LoginSucceeded)
    }
}

impl std::fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emit an identity event. `account_id` is the opaque account identifier when
/// known; `detail` is an internal-only reason and must not echo caller input.
pub fn record_auth_event(event: AuthEvent, account_id: Option<&str>, detail: Option<&str>) {
    let account_id = account_id.unwrap_or("-");
    let detail = detail.unwrap_or("");
    if event.is_failure() {
        tracing::warn!(target: "auth_event", event = %event, account_id, detail, "identity event");
    } else {
        tracing::info!(target: "auth_event", event = %event, account_id, detail, "identity event");
    }
}
