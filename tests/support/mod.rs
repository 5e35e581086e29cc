#![allow(dead_code)]

use chatscribe::config::{Config, TimingConfig};
use chatscribe::page::ScriptedPage;

pub const EMAIL: &str = "a@b.com";
pub const PASSWORD: &str = "p";

/// Default config with every wait set to zero.
pub fn test_config() -> Config {
    Config {
        timing: TimingConfig::immediate(),
        ..Config::default()
    }
}

/// Any URL on the email/password form.
pub fn auth_url(config: &Config) -> String {
    format!("{}?client_id=test", config.urls.auth)
}

/// Login site where every form control resolves. `after_click` lists the
/// URLs reached by successive navigations, starting with the one that
/// follows the "Log in" click.
pub fn login_site(config: &Config, after_click: &[&str]) -> ScriptedPage {
    let s = &config.selectors;
    ScriptedPage::new("about:blank")
        .with_navigations(after_click.iter().copied())
        .with_element("button")
        .with_element(&s.login_button)
        .with_element(&s.email_input)
        .with_element(&s.email_submit_button)
        .with_element(&s.password_input)
        .with_element(r#"button[type="submit"]"#)
        .with_element(&s.email_verification_input)
        .with_element(&s.email_verification_submit_button)
}

/// Chat page controls, added on top of a login site.
pub fn with_chat(page: ScriptedPage, config: &Config, reply_html: &str) -> ScriptedPage {
    page.with_element(&config.chat.chat_input)
        .with_element(&config.chat.chat_submit_button)
        .with_element(&config.chat.response_complete)
        .with_script_result(
            "innerHTML",
            serde_json::Value::String(reply_html.to_string()),
        )
}
