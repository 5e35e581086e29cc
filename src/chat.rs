//! Conversation driver.
//!
//! Runs after login: sends each prompt through the chat composer, waits for
//! the reply to finish streaming, and collects the reply's rendered HTML.

use tracing::{error, info};

use crate::config::{ChatSelectors, Config, TimingConfig};
use crate::error::{ChatControl, ChatError};
use crate::page::{last_inner_html_script, PageDriver};

/// One prompt and the reply it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatExchange {
    pub prompt: String,
    /// Reply as rendered by the page (HTML).
    pub response_html: String,
}

pub struct Conversation<'a, P: PageDriver> {
    page: &'a P,
    chat_url: &'a str,
    selectors: &'a ChatSelectors,
    timing: &'a TimingConfig,
}

impl<'a, P: PageDriver> Conversation<'a, P> {
    pub fn new(page: &'a P, config: &'a Config) -> Self {
        Self {
            page,
            chat_url: &config.urls.chat,
            selectors: &config.chat,
            timing: &config.timing,
        }
    }

    /// Send `prompts` in order and collect one exchange per prompt.
    pub async fn run(&self, prompts: &[String]) -> Result<Vec<ChatExchange>, ChatError> {
        self.open().await?;

        let mut exchanges = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            if let Err(err) = self.submit_prompt(prompt).await {
                error!(%prompt, "Failed to submit prompt");
                return Err(err);
            }

            let response_html = match self.last_response(prompt).await {
                Ok(html) => html,
                Err(err) => {
                    error!(%prompt, "Failed to get response for prompt");
                    return Err(err);
                }
            };

            info!(%prompt, "Prompt processed");
            exchanges.push(ChatExchange {
                prompt: prompt.clone(),
                response_html,
            });
        }

        Ok(exchanges)
    }

    /// Make sure the chat landing page is loaded.
    async fn open(&self) -> Result<(), ChatError> {
        let location = self.page.current_url().await?;
        if !location.starts_with(self.chat_url) {
            info!(url = %self.chat_url, "Opening chat page");
            self.page.navigate(self.chat_url).await?;
        }
        Ok(())
    }

    async fn submit_prompt(&self, prompt: &str) -> Result<(), ChatError> {
        let input = self
            .page
            .find_element(&self.selectors.chat_input, self.timing.element_timeout)
            .await
            .map_err(|_| ChatError::ElementNotFound(ChatControl::ChatInput))?;

        info!("Entering prompt");
        self.page.clear_value(&input).await?;
        self.page
            .type_text(&input, prompt, self.timing.typing_pace)
            .await?;

        let send = self
            .page
            .find_element(
                &self.selectors.chat_submit_button,
                self.timing.element_timeout,
            )
            .await
            .map_err(|_| ChatError::ElementNotFound(ChatControl::ChatSendButton))?;
        self.page.click(&send).await?;
        info!("Prompt submitted");
        Ok(())
    }

    async fn last_response(&self, prompt: &str) -> Result<String, ChatError> {
        info!("Waiting for the response");
        self.page
            .find_element(
                &self.selectors.response_complete,
                self.timing.response_timeout,
            )
            .await
            .map_err(|_| ChatError::ResponseTimeout(self.timing.response_timeout))?;

        let value = self
            .page
            .evaluate(&last_inner_html_script(&self.selectors.chat_response))
            .await?;

        match value.as_str() {
            None => Err(ChatError::ElementNotFound(ChatControl::ChatResponse)),
            Some("") => Err(ChatError::EmptyResponse {
                prompt: prompt.to_string(),
            }),
            Some(html) => Ok(html.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{PageAction, ScriptedPage};

    fn config() -> Config {
        Config {
            timing: TimingConfig::immediate(),
            ..Config::default()
        }
    }

    fn chat_page(config: &Config) -> ScriptedPage {
        ScriptedPage::new("https://chatgpt.com/")
            .with_element(&config.chat.chat_input)
            .with_element(&config.chat.chat_submit_button)
            .with_element(&config.chat.response_complete)
    }

    #[tokio::test]
    async fn test_collects_one_exchange_per_prompt() {
        let config = config();
        let page = chat_page(&config).with_script_result(
            "querySelectorAll",
            serde_json::Value::String("<p>Hi</p>".to_string()),
        );
        let prompts = vec!["hello".to_string(), "again".to_string()];

        let exchanges = Conversation::new(&page, &config).run(&prompts).await.unwrap();

        assert_eq!(exchanges.len(), 2);
        assert_eq!(exchanges[0].prompt, "hello");
        assert_eq!(exchanges[1].prompt, "again");
        assert_eq!(exchanges[1].response_html, "<p>Hi</p>");
        assert_eq!(
            page.typed_into(&config.chat.chat_input),
            vec!["hello", "again"]
        );
        // Already on the chat page.
        assert!(!page
            .actions()
            .iter()
            .any(|a| matches!(a, PageAction::Navigate(_))));
    }

    #[tokio::test]
    async fn test_navigates_to_chat_when_elsewhere() {
        let config = config();
        let page = ScriptedPage::new("https://auth.openai.com/login_challenge")
            .with_element(&config.chat.chat_input)
            .with_element(&config.chat.chat_submit_button)
            .with_element(&config.chat.response_complete)
            .with_script_result(
                "querySelectorAll",
                serde_json::Value::String("<p>ok</p>".to_string()),
            );

        Conversation::new(&page, &config)
            .run(&["x".to_string()])
            .await
            .unwrap();

        assert_eq!(page.url(), "https://chatgpt.com/");
    }

    #[tokio::test]
    async fn test_reply_timeout() {
        let config = config();
        let page = ScriptedPage::new("https://chatgpt.com/")
            .with_element(&config.chat.chat_input)
            .with_element(&config.chat.chat_submit_button);

        let err = Conversation::new(&page, &config)
            .run(&["x".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::ResponseTimeout(_)));
    }

    #[tokio::test]
    async fn test_missing_reply_elements() {
        let config = config();
        let page = chat_page(&config);

        let err = Conversation::new(&page, &config)
            .run(&["x".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err, ChatError::ElementNotFound(ChatControl::ChatResponse));
    }

    #[tokio::test]
    async fn test_empty_reply() {
        let config = config();
        let page = chat_page(&config)
            .with_script_result("querySelectorAll", serde_json::Value::String(String::new()));

        let err = Conversation::new(&page, &config)
            .run(&["x".to_string()])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ChatError::EmptyResponse {
                prompt: "x".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_send_button() {
        let config = config();
        let page = ScriptedPage::new("https://chatgpt.com/").with_element(&config.chat.chat_input);

        let err = Conversation::new(&page, &config)
            .run(&["x".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err, ChatError::ElementNotFound(ChatControl::ChatSendButton));
    }
}
