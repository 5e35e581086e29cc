//! Scripted page for testing.
//!
//! Replays a canned site: a queue of URLs reached by successive navigations,
//! a set of selectors that resolve, per-selector presence sequences, and
//! script results keyed by a fragment of the script text. Every interaction
//! is recorded so tests can assert on what the flow did.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::PageDriver;
use crate::error::PageError;

/// One recorded interaction with a [`ScriptedPage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction {
    Navigate(String),
    WaitForNavigation,
    CurrentUrl,
    Find(String),
    Type { selector: String, text: String },
    Click(String),
    Clear(String),
    ReadText(String),
    Evaluate(String),
}

/// Element handle returned by [`ScriptedPage`]; remembers how it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedElement {
    pub selector: String,
}

#[derive(Default)]
struct ScriptState {
    current_url: String,
    navigations: VecDeque<String>,
    present: HashSet<String>,
    presence_sequences: HashMap<String, VecDeque<bool>>,
    texts: HashMap<String, String>,
    script_results: Vec<(String, serde_json::Value)>,
    actions: Vec<PageAction>,
}

/// In-memory [`PageDriver`] for testing purposes.
pub struct ScriptedPage {
    state: Mutex<ScriptState>,
}

impl ScriptedPage {
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(ScriptState {
                current_url: start_url.into(),
                ..ScriptState::default()
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        self.state.lock().expect("scripted page lock poisoned")
    }

    /// URLs reached by successive `wait_for_navigation` calls. Once the queue
    /// is drained, waiting for navigation leaves the URL unchanged.
    pub fn with_navigations<I, S>(self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock()
            .navigations
            .extend(urls.into_iter().map(Into::into));
        self
    }

    /// Make `selector` resolve on every lookup.
    pub fn with_element(self, selector: impl Into<String>) -> Self {
        self.lock().present.insert(selector.into());
        self
    }

    /// Answer successive lookups of `selector` from `presence` (true means
    /// found). Falls back to [`with_element`](Self::with_element) once drained.
    pub fn with_presence_sequence(
        self,
        selector: impl Into<String>,
        presence: impl IntoIterator<Item = bool>,
    ) -> Self {
        self.lock()
            .presence_sequences
            .insert(selector.into(), presence.into_iter().collect());
        self
    }

    /// Text returned when reading an element found by `selector`.
    pub fn with_text(self, selector: impl Into<String>, text: impl Into<String>) -> Self {
        self.lock().texts.insert(selector.into(), text.into());
        self
    }

    /// Result of any evaluated script containing `fragment`. Scripts matching
    /// no fragment evaluate to `null`.
    pub fn with_script_result(
        self,
        fragment: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        self.lock().script_results.push((fragment.into(), value));
        self
    }

    pub fn actions(&self) -> Vec<PageAction> {
        self.lock().actions.clone()
    }

    /// Selectors of clicked elements, in order.
    pub fn clicks(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|action| match action {
                PageAction::Click(selector) => Some(selector),
                _ => None,
            })
            .collect()
    }

    /// Text typed into elements found by `selector`, in order.
    pub fn typed_into(&self, selector: &str) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|action| match action {
                PageAction::Type { selector: s, text } if s == selector => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Number of lookups of `selector`.
    pub fn lookups(&self, selector: &str) -> usize {
        self.actions()
            .iter()
            .filter(|action| matches!(action, PageAction::Find(s) if s == selector))
            .count()
    }

    /// Scripts evaluated so far, in order.
    pub fn evaluated(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|action| match action {
                PageAction::Evaluate(script) => Some(script),
                _ => None,
            })
            .collect()
    }

    pub fn url(&self) -> String {
        self.lock().current_url.clone()
    }
}

#[async_trait]
impl PageDriver for ScriptedPage {
    type Element = ScriptedElement;

    async fn navigate(&self, url: &str) -> Result<(), PageError> {
        let mut state = self.lock();
        state.actions.push(PageAction::Navigate(url.to_string()));
        state.current_url = url.to_string();
        Ok(())
    }

    async fn wait_for_navigation(&self) -> Result<(), PageError> {
        let mut state = self.lock();
        state.actions.push(PageAction::WaitForNavigation);
        if let Some(next) = state.navigations.pop_front() {
            state.current_url = next;
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String, PageError> {
        let mut state = self.lock();
        state.actions.push(PageAction::CurrentUrl);
        Ok(state.current_url.clone())
    }

    async fn find_element(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Self::Element, PageError> {
        let mut state = self.lock();
        state.actions.push(PageAction::Find(selector.to_string()));

        let scripted = state
            .presence_sequences
            .get_mut(selector)
            .and_then(VecDeque::pop_front);
        let found = scripted.unwrap_or_else(|| state.present.contains(selector));

        if found {
            Ok(ScriptedElement {
                selector: selector.to_string(),
            })
        } else {
            Err(PageError::Timeout {
                selector: selector.to_string(),
                timeout,
            })
        }
    }

    async fn type_text(
        &self,
        element: &Self::Element,
        text: &str,
        _pace: Duration,
    ) -> Result<(), PageError> {
        self.lock().actions.push(PageAction::Type {
            selector: element.selector.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn click(&self, element: &Self::Element) -> Result<(), PageError> {
        self.lock()
            .actions
            .push(PageAction::Click(element.selector.clone()));
        Ok(())
    }

    async fn clear_value(&self, element: &Self::Element) -> Result<(), PageError> {
        self.lock()
            .actions
            .push(PageAction::Clear(element.selector.clone()));
        Ok(())
    }

    async fn text_content(&self, element: &Self::Element) -> Result<Option<String>, PageError> {
        let mut state = self.lock();
        state
            .actions
            .push(PageAction::ReadText(element.selector.clone()));
        Ok(state.texts.get(&element.selector).cloned())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, PageError> {
        let mut state = self.lock();
        state.actions.push(PageAction::Evaluate(script.to_string()));
        let value = state
            .script_results
            .iter()
            .find(|(fragment, _)| script.contains(fragment.as_str()))
            .map(|(_, value)| value.clone())
            .unwrap_or(serde_json::Value::Null);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_navigation_queue_then_stays() {
        let page = ScriptedPage::new("https://a.test/").with_navigations(["https://b.test/"]);

        page.wait_for_navigation().await.unwrap();
        assert_eq!(page.current_url().await.unwrap(), "https://b.test/");

        page.wait_for_navigation().await.unwrap();
        assert_eq!(page.current_url().await.unwrap(), "https://b.test/");
    }

    #[tokio::test]
    async fn test_presence_sequence_falls_back_to_present_set() {
        let page = ScriptedPage::new("about:blank").with_presence_sequence("#err", [true, false]);

        assert!(page.find_element("#err", Duration::ZERO).await.is_ok());
        assert!(page.find_element("#err", Duration::ZERO).await.is_err());
        // Drained and never registered as present.
        assert!(page.find_element("#err", Duration::ZERO).await.is_err());
        assert_eq!(page.lookups("#err"), 3);
    }

    #[tokio::test]
    async fn test_script_results_match_by_fragment() {
        let page = ScriptedPage::new("about:blank")
            .with_script_result("continue", serde_json::Value::Bool(true));

        let hit = page.evaluate("find('continue')").await.unwrap();
        let miss = page.evaluate("find('other')").await.unwrap();
        assert_eq!(hit, serde_json::Value::Bool(true));
        assert_eq!(miss, serde_json::Value::Null);
        assert_eq!(page.evaluated().len(), 2);
    }
}
