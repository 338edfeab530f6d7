//! WebDriver session wrapper. One browser, one tab, driven serially;
//! the sites' anti-automation defences are sensitive to burstiness.

use std::time::Duration;

use anyhow::{Context, Result};
use thirtyfour::prelude::*;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const FIRST_LOAD_TIMEOUT: Duration = Duration::from_secs(45);
const RETRY_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Session {
    driver: WebDriver,
}

impl Session {
    /// Connects to a running WebDriver endpoint (chromedriver) and opens
    /// a session with the launch flags the sites tolerate.
    pub async fn connect(webdriver_url: &str, headless: bool) -> Result<Self> {
        let mut caps = DesiredCapabilities::chrome();
        caps.add_arg("--disable-blink-features=AutomationControlled")?;
        caps.add_arg("--window-size=1920,1080")?;
        caps.add_arg(&format!("--user-agent={USER_AGENT}"))?;
        if headless {
            caps.add_arg("--headless=new")?;
        }

        let driver = WebDriver::new(webdriver_url, caps).await.with_context(|| {
            format!(
                "Failed to start browser session at {webdriver_url}. \
                 Is chromedriver running?"
            )
        })?;
        driver.set_page_load_timeout(FIRST_LOAD_TIMEOUT).await?;

        Ok(Session { driver })
    }

    /// Loads a URL with bounded retries and growing waits. The caller
    /// treats an error as "give up for this (keyword, city)".
    pub async fn goto_with_retry(&self, url: &str, attempts: u32) -> Result<()> {
        let attempts = attempts.max(1);
        for attempt in 1..=attempts {
            if attempt == 2 {
                // Shorter per-retry budget after the generous first load.
                self.driver.set_page_load_timeout(RETRY_LOAD_TIMEOUT).await.ok();
            }
            match self.driver.goto(url).await {
                Ok(()) => {
                    if attempt > 1 {
                        self.driver.set_page_load_timeout(FIRST_LOAD_TIMEOUT).await.ok();
                    }
                    return Ok(());
                }
                Err(err) if attempt < attempts => {
                    let wait = Duration::from_secs(attempt as u64 * 3);
                    eprintln!(
                        "    ⚠ 第{attempt}次访问失败 ({err})，{}秒后重试...",
                        wait.as_secs()
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(err) => {
                    self.driver.set_page_load_timeout(FIRST_LOAD_TIMEOUT).await.ok();
                    return Err(err).context(format!("Failed to load {url}"));
                }
            }
        }
        unreachable!("goto_with_retry loops at least once")
    }

    pub async fn page_source(&self) -> Result<String> {
        Ok(self.driver.source().await?)
    }

    pub async fn quit(self) -> Result<()> {
        self.driver.quit().await?;
        Ok(())
    }
}
