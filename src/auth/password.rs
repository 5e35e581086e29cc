//! Password step.
//!
//! The site serves two markup variants of the password form's submit control:
//! a plain `button[type="submit"]`, and a button with no distinguishing
//! attributes whose only stable feature is its "Continue" label. The step
//! tries the configured [`SubmitStrategy`] list in order and stops at the
//! first one that clicks something.

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use super::find_control;
use crate::config::{LoginSelectors, SubmitStrategy, TimingConfig};
use crate::error::{AuthError, LoginControl, PageError};
use crate::page::{click_button_by_text_script, PageDriver, TextMatch};

/// Type the password and submit it, then wait for the next page to load.
///
/// Expects the password form to be loaded already (the email step waits for
/// that navigation).
pub async fn submit_password<P: PageDriver>(
    page: &P,
    password: &SecretString,
    selectors: &LoginSelectors,
    strategies: &[SubmitStrategy],
    timing: &TimingConfig,
) -> Result<(), AuthError> {
    let input = find_control(
        page,
        &selectors.password_input,
        timing.element_timeout,
        LoginControl::PasswordInput,
    )
    .await?;

    info!("Entering password");
    page.type_text(&input, password.expose_secret(), timing.typing_pace).await?;
    info!("Password entered");

    if !click_submit(page, strategies, timing).await {
        warn!("Password submit button not found. Please check the selector configuration.");
        return Err(AuthError::ElementNotFound(
            LoginControl::PasswordSubmitButton,
        ));
    }

    info!("Waiting for verification");
    page.wait_for_navigation().await?;
    Ok(())
}

/// Try each strategy once, in order. Returns whether one of them clicked.
async fn click_submit<P: PageDriver>(
    page: &P,
    strategies: &[SubmitStrategy],
    timing: &TimingConfig,
) -> bool {
    for (index, strategy) in strategies.iter().enumerate() {
        let path = index + 1;
        info!(path, strategy = %strategy.label(), "Looking for the password submit button");

        match attempt(page, strategy, timing).await {
            Ok(()) => {
                info!(path, "Password submitted");
                return true;
            }
            Err(err) => {
                warn!(path, error = %err, "Password submit path failed");
            }
        }
    }
    false
}

async fn attempt<P: PageDriver>(
    page: &P,
    strategy: &SubmitStrategy,
    timing: &TimingConfig,
) -> Result<(), PageError> {
    match strategy {
        SubmitStrategy::Selector { selector } => {
            let button = page.find_element(selector, timing.element_timeout).await?;
            page.click(&button).await
        }
        SubmitStrategy::ButtonText { text } => {
            let script = click_button_by_text_script(text, TextMatch::Exact);
            let clicked = page.evaluate(&script).await?;
            if clicked.as_bool() == Some(true) {
                Ok(())
            } else {
                Err(PageError::NotFound {
                    selector: format!("button with text {text:?}"),
                })
            }
        }
    }
}
