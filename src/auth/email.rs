use tracing::info;

use super::find_control;
use crate::config::{LoginSelectors, TimingConfig};
use crate::error::{AuthError, LoginControl};
use crate::page::PageDriver;

/// Type the email into the login form, submit it, and wait for the password
/// form to load.
pub async fn submit_email<P: PageDriver>(
    page: &P,
    email: &str,
    selectors: &LoginSelectors,
    timing: &TimingConfig,
) -> Result<(), AuthError> {
    let input = find_control(
        page,
        &selectors.email_input,
        timing.element_timeout,
        LoginControl::EmailInput,
    )
    .await?;

    info!("Entering email");
    page.type_text(&input, email, timing.typing_pace).await?;

    let submit = find_control(
        page,
        &selectors.email_submit_button,
        timing.element_timeout,
        LoginControl::EmailSubmitButton,
    )
    .await?;
    page.click(&submit).await?;
    info!("Email submitted");

    info!("Waiting for password input to load");
    page.wait_for_navigation().await?;
    Ok(())
}
