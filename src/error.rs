//! Typed failures of the login flow and the conversation driver.

use std::fmt;
use std::time::Duration;

/// Failure reported by a [`PageDriver`](crate::page::PageDriver).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("timed out after {timeout:?} waiting for {selector}")]
    Timeout { selector: String, timeout: Duration },

    #[error("no element matches {selector}")]
    NotFound { selector: String },

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("script evaluation failed: {0}")]
    Script(String),

    #[error("browser protocol error: {0}")]
    Protocol(String),
}

/// A login form control the flow depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginControl {
    LoginButton,
    EmailInput,
    EmailSubmitButton,
    PasswordInput,
    PasswordSubmitButton,
    EmailVerificationInput,
    EmailVerificationSubmitButton,
}

impl LoginControl {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginControl::LoginButton => "LoginButton",
            LoginControl::EmailInput => "EmailInput",
            LoginControl::EmailSubmitButton => "EmailSubmitButton",
            LoginControl::PasswordInput => "PasswordInput",
            LoginControl::PasswordSubmitButton => "PasswordSubmitButton",
            LoginControl::EmailVerificationInput => "EmailVerificationInput",
            LoginControl::EmailVerificationSubmitButton => "EmailVerificationSubmitButton",
        }
    }
}

impl fmt::Display for LoginControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the login flow stopped without authenticating.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// A required control did not appear within the element timeout. The
    /// selector likely needs updating.
    #[error("{0} not found on the page")]
    ElementNotFound(LoginControl),

    /// The site redirected to its bot-mitigation page. Retrying from the same
    /// network egress will hit the same wall.
    #[error("request blocked by bot mitigation; change the network egress (proxy/IP) and rerun")]
    CaptchaRequired,

    /// Still on the login form after submitting the password.
    #[error("login form was shown again after submitting the password; check the credentials")]
    AuthFailed,

    /// The page matched none of the known login locations.
    #[error("unexpected page {location}; the login URLs may have changed")]
    UnexpectedError { location: String },

    /// The operator aborted the verification code prompt.
    #[error("interrupted by the operator")]
    Interrupted,

    /// A navigation or script failure outside an element lookup.
    #[error(transparent)]
    Page(#[from] PageError),
}

impl AuthError {
    /// Stable string tag, e.g. `ElementNotFound.PasswordInput`.
    pub fn tag(&self) -> String {
        match self {
            AuthError::ElementNotFound(control) => format!("ElementNotFound.{control}"),
            AuthError::CaptchaRequired => "Auth.CaptchaRequired".to_string(),
            AuthError::AuthFailed => "Auth.AuthFailed".to_string(),
            AuthError::UnexpectedError { .. } => "Generic.UnexpectedError".to_string(),
            AuthError::Interrupted => "Generic.Interrupted".to_string(),
            AuthError::Page(_) => "Generic.PageError".to_string(),
        }
    }
}

/// A chat page control the conversation driver depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatControl {
    ChatInput,
    ChatSendButton,
    ChatResponse,
}

impl fmt::Display for ChatControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChatControl::ChatInput => "ChatInput",
            ChatControl::ChatSendButton => "ChatSendButton",
            ChatControl::ChatResponse => "ChatResponse",
        };
        f.write_str(name)
    }
}

/// Why the conversation stopped before every prompt got a reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("{0} not found on the chat page")]
    ElementNotFound(ChatControl),

    #[error("no reply finished within {0:?}")]
    ResponseTimeout(Duration),

    #[error("the reply to prompt {prompt:?} was empty")]
    EmptyResponse { prompt: String },

    #[error(transparent)]
    Page(#[from] PageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_tags() {
        assert_eq!(
            AuthError::ElementNotFound(LoginControl::PasswordSubmitButton).tag(),
            "ElementNotFound.PasswordSubmitButton"
        );
        assert_eq!(AuthError::CaptchaRequired.tag(), "Auth.CaptchaRequired");
        assert_eq!(
            AuthError::UnexpectedError {
                location: "https://example.com".to_string()
            }
            .tag(),
            "Generic.UnexpectedError"
        );
    }

    #[test]
    fn test_messages_name_the_control() {
        let err = AuthError::ElementNotFound(LoginControl::EmailVerificationInput);
        assert_eq!(err.to_string(), "EmailVerificationInput not found on the page");

        let err = ChatError::ElementNotFound(ChatControl::ChatSendButton);
        assert_eq!(err.to_string(), "ChatSendButton not found on the chat page");
    }
}
