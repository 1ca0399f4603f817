//! Element interaction primitives.
//!
//! Everything above this layer talks to the browser through [`PageDriver`].
//! Implementors supply the low-level operations (find, click, type, scan);
//! the provided methods turn them into the explicit-timeout primitives the
//! engine branches on. None of the provided methods raise: a miss is `None`
//! or `false`.

use async_trait::async_trait;
use rand::distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

/// Poll cadence for every explicit wait.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Humanised typing delay bounds (inclusive), per key.
pub const TYPING_DELAY_MS: (u64, u64) = (50, 150);

pub type DriverResult<T> = Result<T, DriverError>;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("browser session closed")]
    SessionClosed,

    #[error("element not found: {0}")]
    NotFound(String),

    #[error("click intercepted on {0}")]
    Intercepted(String),

    #[error("script error: {0}")]
    Script(String),

    #[error("navigation error: {0}")]
    Navigation(String),

    #[error("cdp error: {0}")]
    Cdp(String),
}

// ── Locators & handles ───────────────────────────────────────────────────────

/// How to find an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Plain CSS selector; first visible match wins, else first match.
    Css(String),
    /// Elements matching `css` whose case-folded visible text or aria-label
    /// contains any of `needles` (already lowercase).
    Caption { css: String, needles: Vec<String> },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn caption(css: impl Into<String>, needles: &[&str]) -> Self {
        Locator::Caption {
            css: css.into(),
            needles: needles.iter().map(|n| n.to_lowercase()).collect(),
        }
    }

    /// The CSS part of the locator.
    pub fn css_part(&self) -> &str {
        match self {
            Locator::Css(s) => s,
            Locator::Caption { css, .. } => css,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "{}", s),
            Locator::Caption { css, needles } => write!(f, "{} ~ {:?}", css, needles),
        }
    }
}

/// A resolved element. Holds a CSS selector that uniquely re-resolves it, so
/// handles stay valid across calls without pinning a remote object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(String);

impl ElementHandle {
    pub fn new(selector: impl Into<String>) -> Self {
        Self(selector.into())
    }

    pub fn selector(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    Top,
    Bottom,
    /// One viewport-ish step (about 400px) further down.
    Step,
}

// ── Form snapshot types ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Select,
    Radio,
    Checkbox,
    Text,
    TextArea,
    Number,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    /// Handle of the option input (radio/checkbox); the option value for selects.
    pub key: String,
    pub value: String,
    pub text: String,
    #[serde(default)]
    pub selected: bool,
}

/// One question on the current form step, as scanned inside the modal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    /// Selector of the control (or of the group container for radios/checkboxes).
    pub key: String,
    pub kind: FieldKind,
    /// Label bundle: visible label, aria-label, placeholder, name, id and title.
    pub label: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub options: Vec<FieldOption>,
}

/// A single write the questionnaire wants performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FieldFill {
    SelectOption { key: String, value: String },
    Check { key: String },
    Type { key: String, text: String },
    /// Scripted assignment plus a synthetic `input` event; typing into
    /// `type=number` inputs trips the site's own validators.
    SetNumber { key: String, value: String },
}

impl FieldFill {
    pub fn key(&self) -> &str {
        match self {
            FieldFill::SelectOption { key, .. }
            | FieldFill::Check { key }
            | FieldFill::Type { key, .. }
            | FieldFill::SetNumber { key, .. } => key,
        }
    }
}

/// Inline validation message and the input it belongs to, when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field_key: Option<String>,
    pub message: String,
}

// ── The primitive set ────────────────────────────────────────────────────────

#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn goto(&self, url: &str) -> DriverResult<()>;
    async fn current_url(&self) -> DriverResult<String>;
    async fn page_source(&self) -> DriverResult<String>;
    async fn screenshot_png(&self) -> DriverResult<Vec<u8>>;

    /// Immediate lookup, no waiting.
    async fn find(&self, locator: &Locator) -> DriverResult<Option<ElementHandle>>;
    /// Immediate lookup restricted to the subtree of `scope`.
    async fn find_within(
        &self,
        scope: &ElementHandle,
        locator: &Locator,
    ) -> DriverResult<Option<ElementHandle>>;
    async fn outer_html(&self, el: &ElementHandle) -> DriverResult<Option<String>>;
    async fn text(&self, el: &ElementHandle) -> DriverResult<Option<String>>;

    async fn scroll_into_view(&self, el: &ElementHandle) -> DriverResult<()>;
    /// Native click. Returns `Intercepted` when another element receives it.
    async fn click(&self, el: &ElementHandle) -> DriverResult<()>;
    /// `element.click()` from script.
    async fn script_click(&self, el: &ElementHandle) -> DriverResult<()>;
    /// Synthetic `MouseEvent('click')` dispatched on the element.
    async fn dispatch_click(&self, el: &ElementHandle) -> DriverResult<()>;

    async fn clear(&self, el: &ElementHandle) -> DriverResult<()>;
    async fn send_text(&self, el: &ElementHandle, text: &str) -> DriverResult<()>;

    /// Scrolls the scrollable child of `container`, not the page.
    async fn scroll_container(&self, container: &ElementHandle, to: ScrollTarget)
        -> DriverResult<()>;
    async fn scroll_page(&self, dy: i64) -> DriverResult<()>;

    async fn scan_fields(&self, modal: &ElementHandle) -> DriverResult<Vec<FormField>>;
    async fn apply_fill(&self, modal: &ElementHandle, fill: &FieldFill) -> DriverResult<()>;
    async fn scan_errors(&self, modal: &ElementHandle) -> DriverResult<Vec<FieldError>>;

    fn is_closed(&self) -> bool;
    /// Idempotent.
    async fn close(&self);

    // ── provided ─────────────────────────────────────────────────────────────

    async fn wait_present(&self, locator: &Locator, timeout: Duration) -> Option<ElementHandle> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.find(locator).await {
                Ok(Some(el)) => return Some(el),
                Err(DriverError::SessionClosed) => return None,
                _ => {}
            }
            if Instant::now() >= deadline {
                debug!("wait_present: timeout on {}", locator);
                return None;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// First locator of `locators` that becomes present within `timeout`.
    async fn wait_any(&self, locators: &[Locator], timeout: Duration) -> Option<ElementHandle> {
        let deadline = Instant::now() + timeout;
        loop {
            for locator in locators {
                match self.find(locator).await {
                    Ok(Some(el)) => return Some(el),
                    Err(DriverError::SessionClosed) => return None,
                    _ => {}
                }
            }
            if Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_click(&self, locator: &Locator, timeout: Duration) -> bool {
        match self.wait_present(locator, timeout).await {
            Some(el) => self.robust_click(&el).await,
            None => false,
        }
    }

    async fn wait_type(&self, locator: &Locator, text: &str, timeout: Duration) -> bool {
        let Some(el) = self.wait_present(locator, timeout).await else {
            return false;
        };
        if self.clear(&el).await.is_err() {
            return false;
        }
        self.send_text(&el, text).await.is_ok()
    }

    /// Like [`wait_type`](Self::wait_type) but one key at a time with a
    /// uniform 50–150 ms pause between keys.
    async fn wait_type_humanised(&self, locator: &Locator, text: &str, timeout: Duration) -> bool {
        let Some(el) = self.wait_present(locator, timeout).await else {
            return false;
        };
        if self.clear(&el).await.is_err() {
            return false;
        }
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            if self.send_text(&el, ch.encode_utf8(&mut buf)).await.is_err() {
                return false;
            }
            let delay = jitter_ms(TYPING_DELAY_MS.0, TYPING_DELAY_MS.1);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        true
    }

    /// Scroll to centre, real click, then scripted click, then a synthetic
    /// mouse event.
    async fn robust_click(&self, el: &ElementHandle) -> bool {
        if let Err(DriverError::SessionClosed) = self.scroll_into_view(el).await {
            return false;
        }
        match self.click(el).await {
            Ok(()) => return true,
            Err(DriverError::SessionClosed) => return false,
            Err(e) => debug!("robust_click: native click failed on {:?}: {}", el, e),
        }
        if self.script_click(el).await.is_ok() {
            return true;
        }
        self.dispatch_click(el).await.is_ok()
    }

    async fn scroll_modal(&self, container: &Locator, to: ScrollTarget) -> bool {
        match self.find(container).await {
            Ok(Some(el)) => self.scroll_container(&el, to).await.is_ok(),
            _ => false,
        }
    }

    /// Logged pause. Pacing only; never a substitute for a wait.
    async fn safe_sleep(&self, seconds: f64, reason: &str) {
        let ms = (seconds.max(0.0) * 1000.0) as u64;
        debug!("⏳ pause {}ms ({})", ms, reason);
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Poll `probe` every [`POLL_INTERVAL`] until it yields `Some` or `timeout` passes.
pub async fn wait_for<T, F, Fut>(timeout: Duration, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(v) = probe().await {
            return Some(v);
        }
        if Instant::now() >= deadline {
            return None;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Uniform draw from `[min, max]` milliseconds.
pub fn jitter_ms(min: u64, max: u64) -> u64 {
    let mut rng = rand::rng();
    Uniform::new_inclusive(min, max.max(min))
        .map(|d| d.sample(&mut rng))
        .unwrap_or(min)
}
