//! Login flow controller.
//!
//! Drives the chat site's login UI through a [`PageDriver`]. After the
//! "Log in" click the site lands on one of a few known pages; the controller
//! classifies the current URL and runs the matching branch:
//!
//! - email/password form: submit email, submit password, then classify again
//! - bot-mitigation page: fail with [`AuthError::CaptchaRequired`]
//! - email code challenge: prompt the operator for the code until accepted
//! - chat page: already authenticated
//!
//! Anything else fails with [`AuthError::UnexpectedError`].

pub mod consent;
pub mod email;
mod location;
pub mod password;
pub mod verify;

pub use location::{classify_location, PageLocationClass};
pub use verify::{VerificationAttempt, VerificationCode};

use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::{Config, LoginSelectors, LoginUrls, SubmitStrategy, TimingConfig};
use crate::console::Console;
use crate::credentials::Credentials;
use crate::error::{AuthError, LoginControl};
use crate::page::PageDriver;

/// Terminal result of one login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    Authenticated,
    Failed(AuthError),
}

impl FlowOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, FlowOutcome::Authenticated)
    }
}

/// Where the flow is when it classifies the current location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Right after the "Log in" click.
    FormLoaded,
    /// After the password form was submitted.
    PasswordSubmitted,
}

/// Login flow over one page and one operator console.
pub struct LoginFlow<'a, P: PageDriver, C: Console> {
    page: &'a P,
    console: &'a C,
    urls: &'a LoginUrls,
    selectors: &'a LoginSelectors,
    submit_strategies: &'a [SubmitStrategy],
    timing: &'a TimingConfig,
}

impl<'a, P: PageDriver, C: Console> LoginFlow<'a, P, C> {
    pub fn new(page: &'a P, console: &'a C, config: &'a Config) -> Self {
        Self {
            page,
            console,
            urls: &config.urls,
            selectors: &config.selectors,
            submit_strategies: &config.password_submit.strategies,
            timing: &config.timing,
        }
    }

    /// Open the login page and sign in with `credentials`.
    ///
    /// Produces exactly one outcome; the first failure ends the flow. The
    /// caller owns the page and is responsible for closing it afterwards.
    pub async fn run(&self, credentials: &Credentials) -> FlowOutcome {
        match self.login(credentials).await {
            Ok(()) => {
                info!("Logged in");
                FlowOutcome::Authenticated
            }
            Err(err) => {
                error!(kind = %err.tag(), "Login failed: {err}");
                FlowOutcome::Failed(err)
            }
        }
    }

    async fn login(&self, credentials: &Credentials) -> Result<(), AuthError> {
        info!(url = %self.urls.login, "Navigating to login page");
        self.page.navigate(&self.urls.login).await?;

        consent::dismiss_cookie_consent(
            self.page,
            &self.selectors.cookie_reject_text,
            self.timing.element_timeout,
            self.timing.consent_settle,
        )
        .await;

        info!("Waiting for login button");
        let login_button = find_control(
            self.page,
            &self.selectors.login_button,
            self.timing.element_timeout,
            LoginControl::LoginButton,
        )
        .await?;
        self.page.click(&login_button).await?;

        info!("Waiting for login form to load");
        self.page.wait_for_navigation().await?;

        self.dispatch(credentials).await
    }

    /// Run branches until the flow reaches a terminal state.
    async fn dispatch(&self, credentials: &Credentials) -> Result<(), AuthError> {
        let mut stage = Stage::FormLoaded;

        loop {
            let location = self.page.current_url().await?;
            let class = classify_location(&location, self.urls);
            info!(%location, ?class, ?stage, "Classified page");

            match (class, stage) {
                (PageLocationClass::MainAuthForm, Stage::FormLoaded) => {
                    info!("Login form loaded");
                    self.main_auth_flow(credentials).await?;
                    stage = Stage::PasswordSubmitted;
                }
                (PageLocationClass::MainAuthForm, Stage::PasswordSubmitted) => {
                    return Err(AuthError::AuthFailed);
                }
                (PageLocationClass::AuthError, _) => {
                    error!("Request blocked by bot mitigation. Changing the IP address may help.");
                    return Err(AuthError::CaptchaRequired);
                }
                (PageLocationClass::EmailChallenge, _) => {
                    return verify::verify_email(
                        self.page,
                        self.console,
                        self.selectors,
                        self.timing,
                    )
                    .await;
                }
                (PageLocationClass::ChatPage, Stage::FormLoaded) => {
                    info!("Already signed in");
                    return Ok(());
                }
                (PageLocationClass::ChatPage, Stage::PasswordSubmitted) => {
                    info!("Email verification not required");
                    return Ok(());
                }
                (PageLocationClass::Unrecognized, _) => {
                    error!(
                        %location,
                        expected = %self.urls.auth,
                        "Not on an expected page; check the login URL configuration"
                    );
                    return Err(AuthError::UnexpectedError { location });
                }
            }
        }
    }

    async fn main_auth_flow(&self, credentials: &Credentials) -> Result<(), AuthError> {
        email::submit_email(self.page, credentials.email(), self.selectors, self.timing).await?;
        password::submit_password(
            self.page,
            credentials.password(),
            self.selectors,
            self.submit_strategies,
            self.timing,
        )
        .await
    }
}

/// Look up a required control, mapping any lookup failure to
/// [`AuthError::ElementNotFound`].
pub(crate) async fn find_control<P: PageDriver>(
    page: &P,
    selector: &str,
    timeout: Duration,
    control: LoginControl,
) -> Result<P::Element, AuthError> {
    page.find_element(selector, timeout).await.map_err(|err| {
        warn!(%control, selector, error = %err, "Required control not found");
        AuthError::ElementNotFound(control)
    })
}
