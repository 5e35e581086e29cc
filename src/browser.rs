//! Chrome/Chromium page driver over the DevTools protocol.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::BrowserSettings;
use crate::error::PageError;
use crate::page::PageDriver;

/// Interval between element lookups while waiting for one to appear.
const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Empties an input, or the text of a contenteditable element.
const CLEAR_VALUE_FN: &str =
    "function() { if ('value' in this) { this.value = ''; } else { this.textContent = ''; } }";

const CHROME_BINARIES: [&str; 4] = [
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

const CHROME_PATHS: [&str; 9] = [
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    // NixOS
    "/run/current-system/sw/bin/google-chrome",
    "/run/current-system/sw/bin/chromium",
    // macOS
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];

/// Find a Chrome/Chromium executable on `PATH` or in well-known locations.
pub fn find_chrome() -> Option<PathBuf> {
    for binary in CHROME_BINARIES {
        let Ok(output) = Command::new("which").arg(binary).output() else {
            continue;
        };
        if !output.status.success() {
            continue;
        }
        let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    CHROME_PATHS
        .iter()
        .map(Path::new)
        .find(|path| path.exists())
        .map(Path::to_path_buf)
}

/// A launched browser with one open page.
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: ChromePage,
}

impl BrowserSession {
    /// Launch the browser and open a blank page.
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let chrome_path = match &settings.chrome_executable {
            Some(path) => path.clone(),
            None => find_chrome()
                .context("Chrome/Chromium not found. Please install Chrome or Chromium.")?,
        };
        info!(browser = %chrome_path.display(), "Launching browser");

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .viewport(None)
            .window_size(settings.window_width, settings.window_height)
            .incognito()
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--mute-audio")
            .arg("--window-position=0,0");
        if !settings.headless {
            builder = builder.with_head();
        }
        for arg in &settings.extra_args {
            builder = builder.arg(arg.clone());
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to configure browser: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;
        let handler_task = tokio::spawn(async move { while (handler.next().await).is_some() {} });

        let page = browser
            .new_page("about:blank")
            .await
            .context("Failed to open a browser page")?;

        Ok(Self {
            browser,
            handler_task,
            page: ChromePage::new(page),
        })
    }

    pub fn page(&self) -> &ChromePage {
        &self.page
    }

    /// Close the browser and stop the protocol handler.
    pub async fn close(mut self) -> Result<()> {
        let closed = self.browser.close().await;
        if let Err(err) = self.browser.wait().await {
            warn!(error = %err, "Failed waiting for the browser process to exit");
        }
        self.handler_task.abort();
        closed.context("Failed to close browser")?;
        Ok(())
    }
}

/// [`PageDriver`] backed by a chromiumoxide page.
#[derive(Debug, Clone)]
pub struct ChromePage {
    page: Page,
}

impl ChromePage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }
}

fn protocol(err: chromiumoxide::error::CdpError) -> PageError {
    PageError::Protocol(err.to_string())
}

#[async_trait]
impl PageDriver for ChromePage {
    type Element = Element;

    async fn navigate(&self, url: &str) -> Result<(), PageError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| PageError::Navigation(format!("{url}: {e}")))?;
        Ok(())
    }

    async fn wait_for_navigation(&self) -> Result<(), PageError> {
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| PageError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, PageError> {
        self.page
            .url()
            .await
            .map_err(protocol)?
            .ok_or_else(|| PageError::Navigation("page has no URL".to_string()))
    }

    async fn find_element(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Self::Element, PageError> {
        let poll = async {
            loop {
                if let Ok(element) = self.page.find_element(selector).await {
                    return element;
                }
                tokio::time::sleep(ELEMENT_POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| PageError::Timeout {
                selector: selector.to_string(),
                timeout,
            })
    }

    async fn type_text(
        &self,
        element: &Self::Element,
        text: &str,
        pace: Duration,
    ) -> Result<(), PageError> {
        element.focus().await.map_err(protocol)?;

        let mut buf = [0u8; 4];
        for ch in text.chars() {
            element
                .type_str(ch.encode_utf8(&mut buf))
                .await
                .map_err(protocol)?;
            tokio::time::sleep(pace).await;
        }
        Ok(())
    }

    async fn click(&self, element: &Self::Element) -> Result<(), PageError> {
        element.click().await.map_err(protocol)?;
        Ok(())
    }

    async fn clear_value(&self, element: &Self::Element) -> Result<(), PageError> {
        element
            .call_js_fn(CLEAR_VALUE_FN, false)
            .await
            .map_err(|e| PageError::Script(e.to_string()))?;
        Ok(())
    }

    async fn text_content(&self, element: &Self::Element) -> Result<Option<String>, PageError> {
        element.inner_text().await.map_err(protocol)
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, PageError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| PageError::Script(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }
}
