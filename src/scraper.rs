use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::ScraperConfig;
use crate::utils::error::AppError;
use crate::Result;

/// Loads a page in a browser and hands back the rendered DOM as HTML.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Navigates to `url`, waits `settle` for client-side rendering and
    /// returns the page content.
    async fn render(&self, url: &str, settle: Duration) -> Result<String>;
}

/// Headless Chrome renderer. Every call launches its own browser and closes
/// it before returning, so concurrent dates never share a session.
pub struct ChromeRenderer {
    config: ScraperConfig,
}

impl ChromeRenderer {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    fn launch_options(config: &ScraperConfig) -> Result<LaunchOptions<'static>> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false) // Often needed in containerized environments
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-extensions"),
            ])
            .build()
            .map_err(|e| AppError::Scraping(format!("Failed to create launch options: {}", e)))?;

        if let Some(chrome_path) = &config.chrome_path {
            launch_options.path = Some(PathBuf::from(chrome_path));
        }

        Ok(launch_options)
    }

    fn render_blocking(config: &ScraperConfig, url: &str, settle: Duration) -> Result<String> {
        let start_time = Instant::now();

        let browser = Browser::new(Self::launch_options(config)?)
            .map_err(|e| AppError::Scraping(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| AppError::Scraping(format!("Failed to create tab: {}", e)))?;

        tab.set_default_timeout(Duration::from_secs(config.navigation_timeout_secs));

        if let Some(user_agent) = &config.user_agent {
            tab.set_user_agent(user_agent, None, None)
                .map_err(|e| AppError::Scraping(format!("Failed to set user agent: {}", e)))?;
        }

        tab.navigate_to(url)
            .map_err(|e| AppError::Scraping(format!("Navigation failed: {}", e)))?;
        tab.wait_until_navigated()
            .map_err(|e| AppError::Scraping(format!("Page load failed: {}", e)))?;

        std::thread::sleep(settle);

        let html = tab
            .get_content()
            .map_err(|e| AppError::Scraping(format!("Failed to get page content: {}", e)))?;

        // Close tab to free resources; the browser process goes with `browser`.
        let _ = tab.close(true);

        tracing::debug!(
            "Rendered {} ({} bytes) in {}ms",
            url,
            html.len(),
            start_time.elapsed().as_millis()
        );

        Ok(html)
    }
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    // A blocking render cannot be aborted. If the caller stops waiting, the
    // browser is still closed once `render_blocking` returns.
    async fn render(&self, url: &str, settle: Duration) -> Result<String> {
        let config = self.config.clone();
        let url = url.to_string();

        tokio::task::spawn_blocking(move || Self::render_blocking(&config, &url, settle))
            .await
            .map_err(|e| AppError::Internal(format!("Renderer task failed: {}", e)))?
    }
}
