use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::duration::{deserialize_duration, serialize_duration};

/// Well-known URLs of the chat site and its identity provider.
///
/// Location dispatch matches these as substrings of the current page URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginUrls {
    /// Page that hosts the "Log in" entry button.
    pub login: String,
    /// Chat landing page. Reaching it means the session is authenticated.
    pub chat: String,
    /// Email/password form served by the identity provider.
    pub auth: String,
    /// Bot-mitigation block page.
    pub auth_error: String,
    /// One-time email code challenge.
    pub auth_challenge_email: String,
}

impl Default for LoginUrls {
    fn default() -> Self {
        Self {
            login: "https://chat.openai.com/auth/login".to_string(),
            chat: "https://chatgpt.com/".to_string(),
            auth: "https://auth.openai.com/authorize".to_string(),
            auth_error: "https://chatgpt.com/api/auth/error".to_string(),
            auth_challenge_email: "https://auth.openai.com/login_challenge".to_string(),
        }
    }
}

/// CSS selectors for the login form controls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginSelectors {
    pub login_button: String,
    pub email_input: String,
    pub email_submit_button: String,
    pub password_input: String,
    pub email_verification_input: String,
    pub email_verification_error: String,
    pub email_verification_submit_button: String,

    /// Visible text of the cookie banner button that declines optional cookies.
    pub cookie_reject_text: String,
}

impl Default for LoginSelectors {
    fn default() -> Self {
        Self {
            login_button: r#"button[data-testid="login-button"]"#.to_string(),
            email_input: r#"input[type="email"]"#.to_string(),
            email_submit_button: r#"input[type="submit"]"#.to_string(),
            password_input: r#"input[type="password"]"#.to_string(),
            email_verification_input: r#"input[type="number"]"#.to_string(),
            email_verification_error: r#"[class*="errorMessage"]"#.to_string(),
            email_verification_submit_button: r#"button[type="submit"]"#.to_string(),
            cookie_reject_text: "Reject non-essential".to_string(),
        }
    }
}

/// One way of clicking the password form's submit control.
///
/// The site serves two markup variants of that control, so the flow tries a
/// list of these in order and stops at the first one that clicks something.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmitStrategy {
    /// Look the control up by CSS selector and click it.
    Selector { selector: String },
    /// Click the first `button` whose trimmed text equals `text`, ignoring case.
    ButtonText { text: String },
}

impl SubmitStrategy {
    /// Short label used in logs.
    pub fn label(&self) -> String {
        match self {
            SubmitStrategy::Selector { selector } => format!("selector {selector}"),
            SubmitStrategy::ButtonText { text } => format!("button text {text:?}"),
        }
    }
}

/// Password submit strategies, tried in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordSubmitConfig {
    pub strategies: Vec<SubmitStrategy>,
}

impl Default for PasswordSubmitConfig {
    fn default() -> Self {
        Self {
            strategies: vec![
                SubmitStrategy::Selector {
                    selector: r#"button[type="submit"]"#.to_string(),
                },
                SubmitStrategy::ButtonText {
                    text: "continue".to_string(),
                },
            ],
        }
    }
}

/// CSS selectors for the chat page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSelectors {
    pub chat_input: String,
    pub chat_submit_button: String,
    /// Appears once the assistant has finished streaming a reply.
    pub response_complete: String,
    /// Matches every rendered assistant reply; the last one is the newest.
    pub chat_response: String,
}

impl Default for ChatSelectors {
    fn default() -> Self {
        Self {
            chat_input: r#"div[contenteditable="true"]"#.to_string(),
            chat_submit_button: r#"button[id="composer-submit-button"]"#.to_string(),
            response_complete: r#"button[aria-label="Start voice mode"]"#.to_string(),
            chat_response: r#"div[class*="markdown"]"#.to_string(),
        }
    }
}

fn default_element_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_typing_pace() -> Duration {
    Duration::from_millis(50)
}

fn default_settle_delay() -> Duration {
    Duration::from_secs(3)
}

fn default_error_probe() -> Duration {
    Duration::from_secs(3)
}

fn default_response_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_consent_settle() -> Duration {
    Duration::from_secs(1)
}

/// Waits and delays used while driving the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// How long an element lookup waits before giving up.
    #[serde(
        default = "default_element_timeout",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub element_timeout: Duration,

    /// Delay between typed characters.
    #[serde(
        default = "default_typing_pace",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub typing_pace: Duration,

    /// Pause after submitting a verification code before probing for errors.
    #[serde(
        default = "default_settle_delay",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub settle_delay: Duration,

    /// How long to wait for the verification error element to show up.
    #[serde(
        default = "default_error_probe",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub error_probe: Duration,

    /// How long to wait for a chat reply to finish.
    #[serde(
        default = "default_response_timeout",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub response_timeout: Duration,

    /// Pause after dismissing the cookie banner.
    #[serde(
        default = "default_consent_settle",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub consent_settle: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            element_timeout: default_element_timeout(),
            typing_pace: default_typing_pace(),
            settle_delay: default_settle_delay(),
            error_probe: default_error_probe(),
            response_timeout: default_response_timeout(),
            consent_settle: default_consent_settle(),
        }
    }
}

impl TimingConfig {
    /// All waits set to zero. Used by tests driving a scripted page.
    pub fn immediate() -> Self {
        Self {
            element_timeout: Duration::ZERO,
            typing_pace: Duration::ZERO,
            settle_delay: Duration::ZERO,
            error_probe: Duration::ZERO,
            response_timeout: Duration::ZERO,
            consent_settle: Duration::ZERO,
        }
    }
}

/// Browser launch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run without a visible window. The login flow may need a human to watch
    /// it, so this defaults to false.
    pub headless: bool,

    /// Explicit Chrome/Chromium path. Searched for when unset.
    pub chrome_executable: Option<PathBuf>,

    pub window_width: u32,
    pub window_height: u32,

    /// Extra command line flags passed to the browser.
    pub extra_args: Vec<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: false,
            chrome_executable: None,
            window_width: 480,
            window_height: 853,
            extra_args: Vec::new(),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for exported CSV files. Relative paths resolve against the
    /// working directory.
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data").join("csv"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub urls: LoginUrls,
    pub selectors: LoginSelectors,
    pub password_submit: PasswordSubmitConfig,
    pub chat: ChatSelectors,
    pub timing: TimingConfig,
    pub browser: BrowserSettings,
    pub output: OutputConfig,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if config.password_submit.strategies.is_empty() {
            anyhow::bail!(
                "Config file {} lists no password submit strategies",
                path.display()
            );
        }

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Config path used when none is given on the command line.
///
/// Prefers `chatscribe.toml` in the working directory, then
/// `<config dir>/chatscribe/config.toml`. Falls back to the local name even if
/// it does not exist so that defaults apply.
pub fn default_config_path() -> PathBuf {
    let local = PathBuf::from("chatscribe.toml");
    if local.exists() {
        return local;
    }

    if let Some(dir) = dirs::config_dir() {
        let user = dir.join("chatscribe").join("config.toml");
        if user.exists() {
            return user;
        }
    }

    local
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.urls.auth, "https://auth.openai.com/authorize");
        assert_eq!(config.timing.settle_delay, Duration::from_secs(3));
        assert_eq!(config.timing.error_probe, Duration::from_secs(3));
        assert_eq!(config.timing.typing_pace, Duration::from_millis(50));
        assert_eq!(config.password_submit.strategies.len(), 2);
        assert!(!config.browser.headless);
    }

    #[test]
    fn test_load_partial_config() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            r#"
[urls]
chat = "https://chat.example.com/"

[timing]
settle_delay = "5s"
typing_pace = "10ms"

[browser]
headless = true
"#
        )?;

        let config = Config::load(file.path())?;
        assert_eq!(config.urls.chat, "https://chat.example.com/");
        // Unset fields within a present section keep their defaults.
        assert_eq!(config.urls.auth, "https://auth.openai.com/authorize");
        assert_eq!(config.timing.settle_delay, Duration::from_secs(5));
        assert_eq!(config.timing.typing_pace, Duration::from_millis(10));
        assert_eq!(config.timing.error_probe, Duration::from_secs(3));
        assert!(config.browser.headless);
        assert_eq!(config.browser.window_width, 480);

        Ok(())
    }

    #[test]
    fn test_load_submit_strategies() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            r#"
[[password_submit.strategies]]
kind = "button_text"
text = "Next"

[[password_submit.strategies]]
kind = "selector"
selector = "button.primary"
"#
        )?;

        let config = Config::load(file.path())?;
        assert_eq!(
            config.password_submit.strategies,
            vec![
                SubmitStrategy::ButtonText {
                    text: "Next".to_string()
                },
                SubmitStrategy::Selector {
                    selector: "button.primary".to_string()
                },
            ]
        );

        Ok(())
    }

    #[test]
    fn test_load_rejects_empty_strategy_list() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            r#"
[password_submit]
strategies = []
"#
        )?;

        assert!(Config::load(file.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_load_rejects_bad_duration() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            r#"
[timing]
settle_delay = "soon"
"#
        )?;

        assert!(Config::load(file.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_load_or_default_missing_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = Config::load_or_default(&dir.path().join("missing.toml"))?;
        assert_eq!(config.output.dir, PathBuf::from("data").join("csv"));
        Ok(())
    }

    #[test]
    fn test_serialized_config_loads_back() -> Result<()> {
        let rendered = toml::to_string(&Config::default())?;
        let parsed: Config = toml::from_str(&rendered)?;
        assert_eq!(parsed.timing.typing_pace, Duration::from_millis(50));
        assert_eq!(parsed.password_submit.strategies.len(), 2);
        Ok(())
    }
}
