//! Page automation seam.
//!
//! The login flow and the conversation driver only talk to a live page through
//! [`PageDriver`]. The production implementation wraps a chromiumoxide page
//! (see `browser`); [`ScriptedPage`] replays a canned site for tests.

mod scripted;

pub use scripted::{PageAction, ScriptedElement, ScriptedPage};

use std::time::Duration;

use async_trait::async_trait;

use crate::error::PageError;

/// Navigation, element lookup, input, and script evaluation on one page.
///
/// Every call may suspend. Lookups are bounded by the timeout passed in and
/// fail with [`PageError::Timeout`] when it expires.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Handle to an element found on the page.
    type Element: Send + Sync;

    /// Load `url` and wait for it to finish loading.
    async fn navigate(&self, url: &str) -> Result<(), PageError>;

    /// Wait for the navigation triggered by the last interaction to finish.
    async fn wait_for_navigation(&self) -> Result<(), PageError>;

    /// URL of the page as currently loaded.
    async fn current_url(&self) -> Result<String, PageError>;

    /// Wait up to `timeout` for an element matching `selector`.
    async fn find_element(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Self::Element, PageError>;

    /// Type `text` into `element` one character at a time, `pace` apart.
    async fn type_text(
        &self,
        element: &Self::Element,
        text: &str,
        pace: Duration,
    ) -> Result<(), PageError>;

    async fn click(&self, element: &Self::Element) -> Result<(), PageError>;

    /// Empty an input's value (or an editable element's content).
    async fn clear_value(&self, element: &Self::Element) -> Result<(), PageError>;

    /// Visible text of `element`, if it has any.
    async fn text_content(&self, element: &Self::Element) -> Result<Option<String>, PageError>;

    /// Evaluate a JavaScript expression in the page and return its JSON value.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, PageError>;
}

/// How [`click_button_by_text_script`] compares button text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    Exact,
    Contains,
}

/// Script that clicks the first `button` whose trimmed text matches `text`
/// (case-insensitive) and evaluates to whether it clicked one.
pub fn click_button_by_text_script(text: &str, mode: TextMatch) -> String {
    let needle = serde_json::Value::String(text.trim().to_lowercase());
    let exact = mode == TextMatch::Exact;
    format!(
        r#"(() => {{
    const needle = {needle};
    const button = Array.from(document.querySelectorAll('button')).find((el) => {{
        const text = (el.innerText || '').trim().toLowerCase();
        return {exact} ? text === needle : text.includes(needle);
    }});
    if (!button) {{
        return false;
    }}
    button.click();
    return true;
}})()"#
    )
}

/// Script that evaluates to the trimmed inner HTML of the last element
/// matching `selector`, or `null` when nothing matches.
pub fn last_inner_html_script(selector: &str) -> String {
    let selector = serde_json::Value::String(selector.to_string());
    format!(
        r#"(() => {{
    const all = document.querySelectorAll({selector});
    if (all.length === 0) {{
        return null;
    }}
    return (all[all.length - 1].innerHTML || '').trim();
}})()"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_script_quotes_text() {
        let script = click_button_by_text_script(r#" Say "hi" "#, TextMatch::Exact);
        assert!(script.contains(r#"const needle = "say \"hi\"";"#));
        assert!(script.contains("return true ? text === needle"));
    }

    #[test]
    fn test_button_script_contains_mode() {
        let script = click_button_by_text_script("Reject non-essential", TextMatch::Contains);
        assert!(script.contains(r#""reject non-essential""#));
        assert!(script.contains("return false ? text === needle"));
    }

    #[test]
    fn test_last_inner_html_script_quotes_selector() {
        let script = last_inner_html_script(r#"div[class*="markdown"]"#);
        assert!(script.contains(r#"querySelectorAll("div[class*=\"markdown\"]")"#));
    }
}
