use crate::config::LoginUrls;

/// Which login branch a page URL belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLocationClass {
    /// Identity provider's email/password form.
    MainAuthForm,
    /// Bot-mitigation block page.
    AuthError,
    /// One-time email code challenge.
    EmailChallenge,
    /// Chat landing page; already signed in.
    ChatPage,
    Unrecognized,
}

/// Classify `location` against the known login URLs.
///
/// Checked in priority order. The auth error page lives under the chat host,
/// so it must be tested before the chat landing page.
pub fn classify_location(location: &str, urls: &LoginUrls) -> PageLocationClass {
    if location.contains(&urls.auth) {
        PageLocationClass::MainAuthForm
    } else if location.contains(&urls.auth_error) {
        PageLocationClass::AuthError
    } else if location.contains(&urls.auth_challenge_email) {
        PageLocationClass::EmailChallenge
    } else if location.contains(&urls.chat) {
        PageLocationClass::ChatPage
    } else {
        PageLocationClass::Unrecognized
    }
}
