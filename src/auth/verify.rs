//! Email code challenge.
//!
//! The site sends a 6-digit code by email and shows a form for it. The loop
//! below keeps asking the operator for a code until one is accepted or the
//! operator presses Ctrl+C; there is no attempt limit.
//!
//! The site never confirms acceptance. After submitting, the loop waits a
//! fixed settle delay and then probes for the inline error message; if none
//! shows up within the probe window the code is taken as accepted. A slow
//! rejection that arrives after the window is misread as success.

use std::fmt;

use tracing::{info, warn};

use super::find_control;
use crate::config::{LoginSelectors, TimingConfig};
use crate::console::{Console, ConsoleError};
use crate::error::{AuthError, LoginControl};
use crate::page::PageDriver;

const CODE_LEN: usize = 6;
const CODE_PROMPT: &str = "Enter the verification code";

/// A syntactically valid verification code: exactly six ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Parse operator input, ignoring surrounding whitespace.
    pub fn parse(input: &str) -> Option<Self> {
        let code = input.trim();
        if code.len() == CODE_LEN && code.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(code.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One submitted code and what the page made of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationAttempt {
    pub code: VerificationCode,
    pub accepted: bool,
}

fn print_exit_hint() {
    info!("If you want to end this process, press Ctrl+C.");
}

/// Prompt for codes and submit them until one is accepted.
pub async fn verify_email<P: PageDriver, C: Console>(
    page: &P,
    console: &C,
    selectors: &LoginSelectors,
    timing: &TimingConfig,
) -> Result<(), AuthError> {
    info!("Email verification required. Please check your email for the verification code.");

    loop {
        let line = match console.read_line(CODE_PROMPT).await {
            Ok(line) => line,
            Err(ConsoleError::Interrupted) => return Err(AuthError::Interrupted),
            Err(err @ ConsoleError::Unavailable(_)) => {
                warn!(error = %err, "Cannot read the verification code");
                return Err(AuthError::Interrupted);
            }
        };

        let Some(code) = VerificationCode::parse(&line) else {
            warn!("Invalid verification code. Please enter a 6-digit code.");
            print_exit_hint();
            continue;
        };

        let attempt = submit_code(page, code, selectors, timing).await?;
        if attempt.accepted {
            info!("Verification code accepted");
            return Ok(());
        }
    }
}

/// Fill in and submit one code, then look for the inline error message.
pub async fn submit_code<P: PageDriver>(
    page: &P,
    code: VerificationCode,
    selectors: &LoginSelectors,
    timing: &TimingConfig,
) -> Result<VerificationAttempt, AuthError> {
    let input = find_control(
        page,
        &selectors.email_verification_input,
        timing.element_timeout,
        LoginControl::EmailVerificationInput,
    )
    .await?;

    // A rejected attempt leaves its digits in the field.
    page.clear_value(&input).await?;
    page.type_text(&input, code.as_str(), timing.typing_pace).await?;

    let submit = find_control(
        page,
        &selectors.email_verification_submit_button,
        timing.element_timeout,
        LoginControl::EmailVerificationSubmitButton,
    )
    .await?;

    info!("Entered verification code. Submitting...");
    page.click(&submit).await?;

    info!("Waiting for verification");
    tokio::time::sleep(timing.settle_delay).await;

    match page
        .find_element(&selectors.email_verification_error, timing.error_probe)
        .await
    {
        Ok(error_element) => {
            let message = page
                .text_content(&error_element)
                .await
                .ok()
                .flatten()
                .unwrap_or_default();
            warn!(message = %message.trim(), "Failed to verify code");
            print_exit_hint();
            Ok(VerificationAttempt {
                code,
                accepted: false,
            })
        }
        Err(_) => Ok(VerificationAttempt {
            code,
            accepted: true,
        }),
    }
}
