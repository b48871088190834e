use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use hangar_core::error::AppError;
use hangar_core::traits::PageFetcher;

/// Headless Chromium fetcher for career portals that render listings with
/// JavaScript (Workday, SuccessFactors and most SPA-based custom sites).
///
/// One browser process is shared by all clones; each fetch opens a tab,
/// waits for the body, reads the DOM and closes the tab.
#[derive(Clone)]
pub struct BrowserFetcher {
    browser: Arc<Browser>,
    timeout: Duration,
    settle: Duration,
}

impl BrowserFetcher {
    pub async fn new() -> Result<Self, AppError> {
        Self::with_timeout(Duration::from_secs(60)).await
    }

    /// Launch Chromium with a per-page navigation timeout.
    pub async fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        let mut builder = BrowserConfig::builder().no_sandbox().disable_default_args();
        if let Some(bin) = find_chrome_binary() {
            tracing::info!(binary = %bin.display(), "Using Chrome binary");
            builder = builder.chrome_executable(bin);
        }

        let config = builder
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--no-first-run")
            .build()
            .map_err(|e| AppError::RenderError(format!("Browser config error: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AppError::RenderError(format!("Failed to launch browser: {e}")))?;

        // CDP events must be drained for the connection to make progress.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::warn!(error = %e, "Browser handler stopped");
                    break;
                }
            }
        });

        Ok(Self {
            browser: Arc::new(browser),
            timeout,
            settle: Duration::from_secs(2),
        })
    }

    /// Extra wait after the body appears, for lazy-loaded job lists.
    pub fn with_settle_delay(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    async fn render(&self, url: &str) -> Result<String, AppError> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| AppError::RenderError(format!("Failed to open {url}: {e}")))?;

        page.find_element("body")
            .await
            .map_err(|e| AppError::RenderError(format!("No body rendered for {url}: {e}")))?;
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        let html = page
            .content()
            .await
            .map_err(|e| AppError::RenderError(format!("Failed to read DOM of {url}: {e}")));
        let _ = page.close().await;
        html
    }
}

/// `CHROME_BIN` first, then the usual install locations. The snap wrapper
/// drops headless flags, so the binary inside the snap is preferred.
fn find_chrome_binary() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("CHROME_BIN") {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }
    [
        "/snap/chromium/current/usr/lib/chromium-browser/chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/google-chrome",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
    ]
    .iter()
    .map(PathBuf::from)
    .find(|p| p.exists())
}

impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        match tokio::time::timeout(self.timeout, self.render(url)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(self.timeout.as_secs())),
        }
    }
}
