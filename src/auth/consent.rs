//! Cookie consent banner.

use std::time::Duration;

use tracing::{info, warn};

use crate::page::{click_button_by_text_script, PageDriver, TextMatch};

/// Decline optional cookies if the consent banner is showing.
///
/// Waits up to `wait` for the page to render any button before scanning for
/// the banner's. Best-effort: a missing banner or a script failure never
/// stops the login. Returns whether the banner was found and dismissed.
pub async fn dismiss_cookie_consent<P: PageDriver>(
    page: &P,
    reject_text: &str,
    wait: Duration,
    settle: Duration,
) -> bool {
    if let Err(err) = page.find_element("button", wait).await {
        info!(error = %err, "No buttons rendered; skipping cookie consent");
        return false;
    }

    let script = click_button_by_text_script(reject_text, TextMatch::Contains);

    match page.evaluate(&script).await {
        Ok(value) if value.as_bool() == Some(true) => {
            info!("Cookie consent banner dismissed");
            // Let the page process the click.
            tokio::time::sleep(settle).await;
            true
        }
        Ok(_) => {
            info!("No cookie consent banner encountered");
            false
        }
        Err(err) => {
            warn!(error = %err, "Failed to dismiss the cookie consent banner");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{PageAction, ScriptedPage};

    #[tokio::test]
    async fn test_dismisses_banner() {
        let page = ScriptedPage::new("https://chat.openai.com/auth/login")
            .with_element("button")
            .with_script_result("reject non-essential", serde_json::Value::Bool(true));

        assert!(
            dismiss_cookie_consent(&page, "Reject non-essential", Duration::ZERO, Duration::ZERO)
                .await
        );
        let evaluated = page.evaluated();
        assert_eq!(evaluated.len(), 1);
        assert!(evaluated[0].contains("text.includes(needle)"));
    }

    #[tokio::test]
    async fn test_waits_for_buttons_before_scanning() {
        let page = ScriptedPage::new("https://chat.openai.com/auth/login")
            .with_presence_sequence("button", [true])
            .with_script_result("reject non-essential", serde_json::Value::Bool(true));

        dismiss_cookie_consent(&page, "Reject non-essential", Duration::ZERO, Duration::ZERO).await;

        let actions = page.actions();
        assert_eq!(actions[0], PageAction::Find("button".to_string()));
        assert!(matches!(actions[1], PageAction::Evaluate(_)));
    }

    #[tokio::test]
    async fn test_no_buttons_skips_scan() {
        let page = ScriptedPage::new("https://chat.openai.com/auth/login");

        assert!(
            !dismiss_cookie_consent(&page, "Reject non-essential", Duration::ZERO, Duration::ZERO)
                .await
        );
        assert!(page.evaluated().is_empty());
    }

    #[tokio::test]
    async fn test_no_banner() {
        let page = ScriptedPage::new("https://chat.openai.com/auth/login").with_element("button");
        assert!(
            !dismiss_cookie_consent(&page, "Reject non-essential", Duration::ZERO, Duration::ZERO)
                .await
        );
        assert_eq!(page.evaluated().len(), 1);
    }
}
