use anyhow::anyhow;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::driver::{
    DriverError, DriverResult, ElementHandle, FieldError, FieldFill, FormField, Locator,
    PageDriver, ScrollTarget,
};
use super::{cookies, launcher, scripts};
use crate::core::error::AutomationError;

/// What a run needs from the browser layer.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub headless: bool,
    pub timeout: Duration,
    /// Attach to `127.0.0.1:<port>` instead of launching.
    pub debug_port: Option<u16>,
    pub chrome_executable: Option<String>,
    /// Origin of the target site; used for tab reuse and the cookie jar.
    pub site_url: String,
}

/// Opens browser sessions for the supervisor. The CDP implementation is
/// [`CdpLauncher`]; tests plug in a scripted fake.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, options: &SessionOptions)
        -> Result<Arc<dyn PageDriver>, AutomationError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CdpLauncher;

#[async_trait]
impl BrowserLauncher for CdpLauncher {
    async fn launch(
        &self,
        options: &SessionOptions,
    ) -> Result<Arc<dyn PageDriver>, AutomationError> {
        let session = match options.debug_port {
            Some(port) => BrowserSession::attach(port, options).await,
            None => BrowserSession::open(options).await,
        }
        .map_err(|e| AutomationError::BrowserLaunchFailed(e.to_string()))?;
        Ok(Arc::new(session))
    }
}

// ── Diagnostics ──────────────────────────────────────────────────────────────

/// Screenshot and HTML-dump side channel.
///
/// File names are `<counter>_<label>_<unix-ts>.{png,html}` with a counter
/// shared by both kinds, so captures sort in the order they were taken.
#[derive(Debug)]
pub struct Diagnostics {
    screenshot_dir: PathBuf,
    html_dir: PathBuf,
    counter: AtomicU32,
}

impl Diagnostics {
    pub fn new(screenshot_dir: impl Into<PathBuf>, html_dir: impl Into<PathBuf>) -> Self {
        let screenshot_dir = screenshot_dir.into();
        let html_dir = html_dir.into();
        for dir in [&screenshot_dir, &html_dir] {
            if let Err(e) = std::fs::create_dir_all(dir) {
                warn!("diagnostics: cannot create {}: {}", dir.display(), e);
            }
        }
        Self {
            screenshot_dir,
            html_dir,
            counter: AtomicU32::new(0),
        }
    }

    fn file_name(&self, label: &str, ext: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let clean: String = label
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!(
            "{:04}_{}_{}.{}",
            n,
            clean,
            chrono::Utc::now().timestamp(),
            ext
        )
    }

    /// Full-page PNG. Failures are logged, never raised.
    pub async fn snapshot(&self, driver: &dyn PageDriver, label: &str) -> Option<PathBuf> {
        let path = self.screenshot_dir.join(self.file_name(label, "png"));
        let bytes = match driver.screenshot_png().await {
            Ok(b) => b,
            Err(e) => {
                warn!("📸 snapshot '{}' failed: {}", label, e);
                return None;
            }
        };
        write_capture(&path, &bytes).await
    }

    /// Current DOM source. Failures are logged, never raised.
    pub async fn dump_html(&self, driver: &dyn PageDriver, label: &str) -> Option<PathBuf> {
        let path = self.html_dir.join(self.file_name(label, "html"));
        let html = match driver.page_source().await {
            Ok(h) => h,
            Err(e) => {
                warn!("🧾 html dump '{}' failed: {}", label, e);
                return None;
            }
        };
        write_capture(&path, html.as_bytes()).await
    }

    pub fn screenshot_dir(&self) -> &Path {
        &self.screenshot_dir
    }

    pub fn html_dir(&self) -> &Path {
        &self.html_dir
    }
}

async fn write_capture(path: &Path, bytes: &[u8]) -> Option<PathBuf> {
    match tokio::fs::write(path, bytes).await {
        Ok(()) => {
            info!("🗂️ diagnostic written: {}", path.display());
            Some(path.to_path_buf())
        }
        Err(e) => {
            warn!("diagnostic write failed ({}): {}", path.display(), e);
            None
        }
    }
}

// ── CDP session ──────────────────────────────────────────────────────────────

/// One automated browser and the single tab the engine drives.
pub struct BrowserSession {
    browser: tokio::sync::Mutex<Browser>,
    page: Page,
    handler_task: tokio::task::JoinHandle<()>,
    closed: Arc<AtomicBool>,
    /// Launched sessions own a throwaway profile; attached ones do not.
    profile_dir: Option<PathBuf>,
    attached: bool,
    site_url: String,
}

fn spawn_handler_task(
    mut handler: chromiumoxide::Handler,
    closed: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                error!("CDP handler error: {}", e);
            }
        }
        closed.store(true, Ordering::SeqCst);
    })
}

impl BrowserSession {
    /// Fresh browser on an isolated, disposable profile.
    pub async fn open(options: &SessionOptions) -> anyhow::Result<Self> {
        let exe = launcher::find_chrome_executable(options.chrome_executable.as_deref())
            .ok_or_else(|| anyhow!("Browser executable not found (tried Chrome, Chromium, Brave)"))?;

        let profile_dir =
            std::env::temp_dir().join(format!("apply-scout-profile-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&profile_dir)?;

        let config = launcher::build_launch_config(
            &exe,
            &profile_dir,
            options.headless,
            options.timeout,
        )?;

        info!(
            "🚀 launching browser ({}; headless={})",
            exe, options.headless
        );
        let (browser, handler) = Browser::launch(config)
            .await
            .map_err(|e| anyhow!("Failed to launch browser ({}): {}", exe, e))?;

        let closed = Arc::new(AtomicBool::new(false));
        let handler_task = spawn_handler_task(handler, Arc::clone(&closed));

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| anyhow!("Failed to create page: {}", e))?;

        if let Some(raw) = cookies::load_raw(&options.site_url) {
            cookies::inject_into_page(&page, &raw).await;
        }

        Ok(Self {
            browser: tokio::sync::Mutex::new(browser),
            page,
            handler_task,
            closed,
            profile_dir: Some(profile_dir),
            attached: false,
            site_url: options.site_url.clone(),
        })
    }

    /// Attach to a browser already exposing a debug port. Reuses a tab that
    /// is already on the target site, otherwise opens a new one.
    pub async fn attach(port: u16, options: &SessionOptions) -> anyhow::Result<Self> {
        let ws_url = launcher::discover_ws_endpoint(port).await?;
        info!("🔌 attaching to running browser: {}", ws_url);

        let (browser, handler) = Browser::connect(ws_url)
            .await
            .map_err(|e| anyhow!("Browser connect failed: {}", e))?;

        let closed = Arc::new(AtomicBool::new(false));
        let handler_task = spawn_handler_task(handler, Arc::clone(&closed));

        let host = url::Url::parse(&options.site_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
            .unwrap_or_default();

        let mut reused = None;
        if let Ok(pages) = browser.pages().await {
            for p in pages {
                let on_site = p
                    .url()
                    .await
                    .ok()
                    .flatten()
                    .map(|u| !host.is_empty() && u.contains(&host))
                    .unwrap_or(false);
                if on_site {
                    reused = Some(p);
                    break;
                }
            }
        }

        let page = match reused {
            Some(p) => {
                info!("♻️ reusing open tab on {}", host);
                p
            }
            None => browser
                .new_page("about:blank")
                .await
                .map_err(|e| anyhow!("Failed to create page: {}", e))?,
        };

        Ok(Self {
            browser: tokio::sync::Mutex::new(browser),
            page,
            handler_task,
            closed,
            profile_dir: None,
            attached: true,
            site_url: options.site_url.clone(),
        })
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, js: String) -> DriverResult<T> {
        if self.is_closed() {
            return Err(DriverError::SessionClosed);
        }
        let result = self.page.evaluate(js).await.map_err(|e| self.map_cdp(e))?;
        result
            .into_value::<T>()
            .map_err(|e| DriverError::Script(e.to_string()))
    }

    fn map_cdp(&self, e: chromiumoxide::error::CdpError) -> DriverError {
        if self.is_closed() {
            DriverError::SessionClosed
        } else {
            DriverError::Cdp(e.to_string())
        }
    }

    async fn call_bool(&self, function: &str, el: &ElementHandle) -> DriverResult<()> {
        let ok: bool = self
            .eval(scripts::invoke(function, &[json!(el.selector())]))
            .await?;
        if ok {
            Ok(())
        } else {
            Err(DriverError::NotFound(el.selector().to_string()))
        }
    }
}

#[async_trait]
impl PageDriver for BrowserSession {
    async fn goto(&self, url: &str) -> DriverResult<()> {
        if self.is_closed() {
            return Err(DriverError::SessionClosed);
        }
        self.page
            .goto(url)
            .await
            .map(|_| ())
            .map_err(|e| DriverError::Navigation(format!("{}: {}", url, e)))
    }

    async fn current_url(&self) -> DriverResult<String> {
        if self.is_closed() {
            return Err(DriverError::SessionClosed);
        }
        self.page
            .url()
            .await
            .map(|u| u.unwrap_or_default())
            .map_err(|e| self.map_cdp(e))
    }

    async fn page_source(&self) -> DriverResult<String> {
        if self.is_closed() {
            return Err(DriverError::SessionClosed);
        }
        self.page.content().await.map_err(|e| self.map_cdp(e))
    }

    async fn screenshot_png(&self) -> DriverResult<Vec<u8>> {
        if self.is_closed() {
            return Err(DriverError::SessionClosed);
        }
        self.page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build(),
            )
            .await
            .map_err(|e| self.map_cdp(e))
    }

    async fn find(&self, locator: &Locator) -> DriverResult<Option<ElementHandle>> {
        let needles = match locator {
            Locator::Css(_) => json!([]),
            Locator::Caption { needles, .. } => json!(needles),
        };
        let sel: Option<String> = self
            .eval(scripts::invoke(
                scripts::RESOLVE,
                &[json!(null), json!(locator.css_part()), needles],
            ))
            .await?;
        Ok(sel.map(ElementHandle::new))
    }

    async fn find_within(
        &self,
        scope: &ElementHandle,
        locator: &Locator,
    ) -> DriverResult<Option<ElementHandle>> {
        let needles = match locator {
            Locator::Css(_) => json!([]),
            Locator::Caption { needles, .. } => json!(needles),
        };
        let sel: Option<String> = self
            .eval(scripts::invoke(
                scripts::RESOLVE,
                &[json!(scope.selector()), json!(locator.css_part()), needles],
            ))
            .await?;
        Ok(sel.map(ElementHandle::new))
    }

    async fn outer_html(&self, el: &ElementHandle) -> DriverResult<Option<String>> {
        self.eval(scripts::invoke(scripts::OUTER_HTML, &[json!(el.selector())]))
            .await
    }

    async fn text(&self, el: &ElementHandle) -> DriverResult<Option<String>> {
        self.eval(scripts::invoke(scripts::TEXT, &[json!(el.selector())]))
            .await
    }

    async fn scroll_into_view(&self, el: &ElementHandle) -> DriverResult<()> {
        self.call_bool(scripts::SCROLL_INTO_VIEW, el).await
    }

    async fn click(&self, el: &ElementHandle) -> DriverResult<()> {
        let unobstructed: bool = self
            .eval(scripts::invoke(scripts::HIT_TEST, &[json!(el.selector())]))
            .await?;
        if !unobstructed {
            return Err(DriverError::Intercepted(el.selector().to_string()));
        }
        let element = self
            .page
            .find_element(el.selector())
            .await
            .map_err(|_| DriverError::NotFound(el.selector().to_string()))?;
        element
            .click()
            .await
            .map(|_| ())
            .map_err(|e| self.map_cdp(e))
    }

    async fn script_click(&self, el: &ElementHandle) -> DriverResult<()> {
        self.call_bool(scripts::SCRIPT_CLICK, el).await
    }

    async fn dispatch_click(&self, el: &ElementHandle) -> DriverResult<()> {
        self.call_bool(scripts::DISPATCH_CLICK, el).await
    }

    async fn clear(&self, el: &ElementHandle) -> DriverResult<()> {
        self.call_bool(scripts::CLEAR, el).await
    }

    async fn send_text(&self, el: &ElementHandle, text: &str) -> DriverResult<()> {
        let element = self
            .page
            .find_element(el.selector())
            .await
            .map_err(|_| DriverError::NotFound(el.selector().to_string()))?;
        element
            .type_str(text)
            .await
            .map(|_| ())
            .map_err(|e| self.map_cdp(e))
    }

    async fn scroll_container(
        &self,
        container: &ElementHandle,
        to: ScrollTarget,
    ) -> DriverResult<()> {
        let to = match to {
            ScrollTarget::Top => "top",
            ScrollTarget::Bottom => "bottom",
            ScrollTarget::Step => "step",
        };
        let ok: bool = self
            .eval(scripts::invoke(
                scripts::SCROLL_CONTAINER,
                &[json!(container.selector()), json!(to)],
            ))
            .await?;
        if ok {
            Ok(())
        } else {
            Err(DriverError::NotFound(container.selector().to_string()))
        }
    }

    async fn scroll_page(&self, dy: i64) -> DriverResult<()> {
        let _: bool = self
            .eval(scripts::invoke(scripts::SCROLL_PAGE, &[json!(dy)]))
            .await?;
        Ok(())
    }

    async fn scan_fields(&self, modal: &ElementHandle) -> DriverResult<Vec<FormField>> {
        self.eval(scripts::invoke(scripts::SCAN_FIELDS, &[json!(modal.selector())]))
            .await
    }

    async fn apply_fill(&self, _modal: &ElementHandle, fill: &FieldFill) -> DriverResult<()> {
        match fill {
            FieldFill::Type { key, text } => {
                let el = ElementHandle::new(key.clone());
                self.clear(&el).await?;
                self.send_text(&el, text).await
            }
            other => {
                let payload =
                    serde_json::to_value(other).map_err(|e| DriverError::Script(e.to_string()))?;
                let ok: bool = self
                    .eval(scripts::invoke(scripts::APPLY_FILL, &[payload]))
                    .await?;
                if ok {
                    Ok(())
                } else {
                    Err(DriverError::NotFound(other.key().to_string()))
                }
            }
        }
    }

    async fn scan_errors(&self, modal: &ElementHandle) -> DriverResult<Vec<FieldError>> {
        self.eval(scripts::invoke(scripts::SCAN_ERRORS, &[json!(modal.selector())]))
            .await
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("🔚 closing browser session (attached={})", self.attached);

        let jar = cookies::read_from_page(&self.page).await;
        cookies::save_raw(&self.site_url, &cookies::cookies_for_site(&jar, &self.site_url));

        if !self.attached {
            let mut browser = self.browser.lock().await;
            if let Err(e) = browser.close().await {
                warn!("browser close failed: {}", e);
            }
            let _ = browser.wait().await;
        }
        self.handler_task.abort();

        if let Some(dir) = self.profile_dir.as_ref() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler_task.abort();
        if let Some(dir) = self.profile_dir.take() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}
