//! Scripted stand-in for the CDP session. It plays a small LinkedIn: a feed,
//! a login form, an optional checkpoint, a result list, a detail panel and
//! an application modal whose steps and confirmation behaviour are set per
//! test.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use apply_scout::browser::{
    BrowserLauncher, Diagnostics, DriverError, DriverResult, ElementHandle, FieldError,
    FieldFill, FieldKind, FormField, Locator, PageDriver, ScrollTarget, SessionOptions,
};
use apply_scout::core::config::AutomationConfig;
use apply_scout::core::error::AutomationError;
use apply_scout::engine::{LogLevel, RunObserver, SelectorPolicy};

pub fn init_logger() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_test_writer()
        .try_init();
}

pub fn test_config(overrides: serde_json::Value) -> Arc<AutomationConfig> {
    let mut base = serde_json::json!({
        "answers": { "salary": "1900" },
        "save_on_discard": false
    });
    if let (Some(b), Some(o)) = (base.as_object_mut(), overrides.as_object()) {
        for (k, v) in o {
            b.insert(k.clone(), v.clone());
        }
    }
    Arc::new(serde_json::from_value(base).expect("test config"))
}

/// Diagnostics writing into a fresh directory under the system temp dir.
pub fn temp_diagnostics() -> Arc<Diagnostics> {
    let root = std::env::temp_dir().join(format!("apply-scout-test-{}", uuid::Uuid::new_v4()));
    Arc::new(Diagnostics::new(root.join("screenshots"), root.join("debug_html")))
}

pub fn files_in(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

// ── Script ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FakePosting {
    pub id: String,
    pub title: String,
    pub employer: String,
    pub one_click: bool,
    pub applied_badge: bool,
}

pub fn posting(id: &str, title: &str, employer: &str) -> FakePosting {
    FakePosting {
        id: id.to_string(),
        title: title.to_string(),
        employer: employer.to_string(),
        one_click: true,
        applied_badge: false,
    }
}

#[derive(Debug, Clone)]
pub struct FakeStep {
    pub caption: String,
    pub fields: Vec<FormField>,
}

pub fn text_field(key: &str, label: &str) -> FormField {
    FormField {
        key: key.to_string(),
        kind: FieldKind::Text,
        label: label.to_string(),
        value: String::new(),
        options: Vec::new(),
    }
}

pub fn submit_step(fields: Vec<FormField>) -> FakeStep {
    FakeStep {
        caption: "Enviar candidatura".to_string(),
        fields,
    }
}

pub fn next_step(fields: Vec<FormField>) -> FakeStep {
    FakeStep {
        caption: "Avançar".to_string(),
        fields,
    }
}

/// What the site shows after the submit click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// The success container appears and the modal closes.
    Container,
    /// A success phrase is added to the page and the modal closes.
    Phrase,
    /// The modal closes with no other evidence.
    CloseOnly,
    /// Nothing happens.
    Never,
}

/// An inline error the site raises on submit until `key` holds `accepts`.
#[derive(Debug, Clone)]
pub struct FieldRejection {
    pub key: String,
    pub message: String,
    pub accepts: String,
}

#[derive(Debug, Clone)]
pub struct FakeScript {
    pub logged_in: bool,
    /// A login submit lands on a checkpoint that clears after this long.
    pub challenge_for: Option<Duration>,
    /// After the first checkpoint clears, a second one appears for this long.
    pub rechallenge: Option<Duration>,
    pub postings: Vec<FakePosting>,
    pub steps: Vec<FakeStep>,
    pub confirmation: Confirmation,
    /// Clicking "next" raises the save-this-application dialog.
    pub discard_on_advance: bool,
    /// Clicking "next" changes nothing.
    pub stall: bool,
    /// The detail panel already mentions a sent application before submit.
    pub phrase_before_submit: bool,
    pub rejection: Option<FieldRejection>,
}

impl Default for FakeScript {
    fn default() -> Self {
        Self {
            logged_in: true,
            challenge_for: None,
            rechallenge: None,
            postings: Vec::new(),
            steps: vec![submit_step(Vec::new())],
            confirmation: Confirmation::Container,
            discard_on_advance: false,
            stall: false,
            phrase_before_submit: false,
            rejection: None,
        }
    }
}

// ── Driver ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum View {
    Blank,
    Feed,
    Login,
    Challenge,
    Search,
    Detail(String),
}

#[derive(Debug, Default, Clone)]
pub struct Counters {
    pub screenshots: usize,
    pub apply_clicks: usize,
    pub next_clicks: usize,
    pub submit_clicks: usize,
    pub discard_clicks: usize,
    pub save_clicks: usize,
    pub close_calls: usize,
}

struct FakeState {
    script: FakeScript,
    view: View,
    url: String,
    logged_in: bool,
    challenge_until: Option<Instant>,
    rechallenge_at: Option<(Instant, Duration)>,
    modal_step: Option<usize>,
    discard_open: bool,
    confirmed: bool,
    rejected: bool,
    values: HashMap<String, String>,
    fills: Vec<FieldFill>,
    visited: Vec<String>,
    counters: Counters,
}

type Hook = Box<dyn Fn() + Send + Sync>;

pub struct FakeDriver {
    policy: SelectorPolicy,
    state: Mutex<FakeState>,
    closed: AtomicBool,
    on_apply: Mutex<Option<Hook>>,
}

const PANEL: &str = "#fake-panel";
const BADGE: &str = "#fake-badge";
const APPLY: &str = "#fake-apply";
const MODAL: &str = "#fake-modal";
const MODAL_CONTENT: &str = "#fake-modal-content";
const STEP: &str = "#fake-step";
const DISMISS: &str = "#fake-dismiss";
const DISCARD_DIALOG: &str = "#fake-discard-dialog";
const DISCARD: &str = "#fake-discard";
const SAVE: &str = "#fake-save";
const CONFIRMATION: &str = "#fake-confirmation";
const PROFILE: &str = "#fake-profile";
const USERNAME: &str = "#username";
const PASSWORD: &str = "#password";
const LOGIN_SUBMIT: &str = "#fake-login-submit";
const CARD: &str = "#fake-card";

const FEED_URL: &str = "https://www.linkedin.com/feed/";
const CHALLENGE_URL: &str = "https://www.linkedin.com/checkpoint/challenge/AgHx";
const INTERSTITIAL_URL: &str = "https://www.linkedin.com/uas/login-submit";
const INTERSTITIAL: Duration = Duration::from_secs(1);

fn handle(s: &str) -> Option<ElementHandle> {
    Some(ElementHandle::new(s))
}

impl FakeDriver {
    pub fn new(script: FakeScript) -> Arc<Self> {
        let logged_in = script.logged_in;
        Arc::new(Self {
            policy: SelectorPolicy::linkedin(),
            state: Mutex::new(FakeState {
                script,
                view: View::Blank,
                url: "about:blank".to_string(),
                logged_in,
                challenge_until: None,
                rechallenge_at: None,
                modal_step: None,
                discard_open: false,
                confirmed: false,
                rejected: false,
                values: HashMap::new(),
                fills: Vec::new(),
                visited: Vec::new(),
                counters: Counters::default(),
            }),
            closed: AtomicBool::new(false),
            on_apply: Mutex::new(None),
        })
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Runs right after the apply control is clicked.
    pub fn on_apply(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_apply.lock().unwrap_or_else(|p| p.into_inner()) = Some(Box::new(hook));
    }

    pub fn fills(&self) -> Vec<FieldFill> {
        self.state().fills.clone()
    }

    pub fn visited(&self) -> Vec<String> {
        self.state().visited.clone()
    }

    pub fn counters(&self) -> Counters {
        self.state().counters.clone()
    }

    fn check_open(&self) -> DriverResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(DriverError::SessionClosed)
        } else {
            Ok(())
        }
    }

    fn settle_challenge(st: &mut FakeState) {
        let now = Instant::now();
        if let Some((at, again)) = st.rechallenge_at {
            if now >= at {
                st.rechallenge_at = None;
                st.view = View::Challenge;
                st.url = CHALLENGE_URL.to_string();
                st.challenge_until = Some(now + again);
            }
        }
        if let Some(until) = st.challenge_until {
            if now >= until {
                st.challenge_until = None;
                match st.script.rechallenge.take() {
                    Some(again) => {
                        st.view = View::Blank;
                        st.url = INTERSTITIAL_URL.to_string();
                        st.rechallenge_at = Some((now + INTERSTITIAL, again));
                    }
                    None => {
                        st.logged_in = true;
                        st.view = View::Feed;
                        st.url = FEED_URL.to_string();
                    }
                }
            }
        }
    }

    /// Error currently shown on the rejected field, if any.
    fn field_error(st: &FakeState) -> Option<FieldError> {
        let rejection = st.script.rejection.as_ref()?;
        let satisfied = st.values.get(&rejection.key) == Some(&rejection.accepts);
        (st.rejected && !satisfied).then(|| FieldError {
            field_key: Some(rejection.key.clone()),
            message: rejection.message.clone(),
        })
    }

    fn current_posting(st: &FakeState) -> Option<FakePosting> {
        match &st.view {
            View::Detail(id) => st.script.postings.iter().find(|p| &p.id == id).cloned(),
            _ => None,
        }
    }

    fn lookup(&self, st: &mut FakeState, locator: &Locator) -> Option<ElementHandle> {
        Self::settle_challenge(st);
        let p = &self.policy;
        let modal_open = st.modal_step.is_some();

        if p.profile_markers.contains(locator) {
            return (st.logged_in && st.view == View::Feed && locator == &p.profile_markers[0])
                .then(|| ElementHandle::new(PROFILE));
        }
        if locator == &p.username_input {
            return (st.view == View::Login).then(|| ElementHandle::new(USERNAME));
        }
        if locator == &p.password_input {
            return (st.view == View::Login).then(|| ElementHandle::new(PASSWORD));
        }
        if locator == &p.login_submit {
            return (st.view == View::Login).then(|| ElementHandle::new(LOGIN_SUBMIT));
        }
        if let Locator::Css(css) = locator {
            if p.card_selectors.contains(css) {
                let listed = matches!(st.view, View::Search | View::Detail(_));
                return (listed && !st.script.postings.is_empty() && css == &p.card_selectors[0])
                    .then(|| ElementHandle::new(CARD));
            }
        }
        if p.detail_panels.contains(locator) {
            let shown = matches!(st.view, View::Detail(_)) && locator == &p.detail_panels[0];
            return shown.then(|| ElementHandle::new(PANEL));
        }
        if locator == &p.applied_badge {
            return Self::current_posting(st)
                .filter(|post| post.applied_badge)
                .and_then(|_| handle(BADGE));
        }
        if p.apply_controls.contains(locator) {
            let ready = locator == &p.apply_controls[0] && !modal_open;
            return Self::current_posting(st)
                .filter(|post| ready && post.one_click)
                .and_then(|_| handle(APPLY));
        }
        if locator == &p.overlay_close || locator == &p.done_button {
            return None;
        }
        if p.modal_containers.contains(locator) {
            return (modal_open && locator == &p.modal_containers[0]).then(|| ElementHandle::new(MODAL));
        }
        if locator == &p.modal_scroll {
            return modal_open.then(|| ElementHandle::new(MODAL_CONTENT));
        }
        if p.step_button_primary.contains(locator) {
            return None;
        }
        if locator == &p.step_button_caption {
            return modal_open.then(|| ElementHandle::new(STEP));
        }
        if locator == &p.modal_dismiss {
            return modal_open.then(|| ElementHandle::new(DISMISS));
        }
        if p.discard_modals.contains(locator) {
            return (st.discard_open && locator == &p.discard_modals[0])
                .then(|| ElementHandle::new(DISCARD_DIALOG));
        }
        if locator == &p.discard_button {
            return st.discard_open.then(|| ElementHandle::new(DISCARD));
        }
        if locator == &p.save_button {
            return st.discard_open.then(|| ElementHandle::new(SAVE));
        }
        if p.confirmation_containers.contains(locator) {
            let shown = st.confirmed
                && st.script.confirmation == Confirmation::Container
                && locator == &p.confirmation_containers[0];
            return shown.then(|| ElementHandle::new(CONFIRMATION));
        }
        None
    }

    fn render(&self, st: &FakeState) -> String {
        let mut html = String::from("<html><body>");
        match &st.view {
            View::Blank => {}
            View::Feed => html.push_str("<main class=\"feed\">feed</main>"),
            View::Login => html.push_str("<form class=\"login\"><input id=\"username\"></form>"),
            View::Challenge => html.push_str("<div>Security verification</div>"),
            View::Search | View::Detail(_) => {
                html.push_str("<ul class=\"scaffold-layout__list-container\">");
                for post in &st.script.postings {
                    html.push_str(&format!(
                        "<li data-occludable-job-id=\"{id}\">\
                           <a class=\"job-card-container__link\" href=\"/jobs/view/{id}/?refId=fake\">\
                             <strong class=\"job-card-list__title\">{title}</strong></a>\
                           <div class=\"job-card-container__company-name\">{employer}</div>\
                           <span class=\"job-card-container__metadata-item\">São Paulo, SP</span>\
                           {badge}\
                         </li>",
                        id = post.id,
                        title = post.title,
                        employer = post.employer,
                        badge = if post.one_click { "<span>Candidatura simplificada</span>" } else { "" },
                    ));
                }
                html.push_str("</ul>");
                if matches!(st.view, View::Detail(_)) {
                    html.push_str("<div class=\"jobs-search__job-details\">");
                    if st.script.phrase_before_submit {
                        html.push_str("<p>Candidatura enviada para vagas parecidas</p>");
                    }
                    html.push_str("</div>");
                }
            }
        }
        if st.confirmed && st.script.confirmation == Confirmation::Phrase {
            html.push_str("<h3>Sua candidatura foi enviada</h3>");
        }
        html.push_str("</body></html>");
        html
    }

    fn click_step(&self, st: &mut FakeState) {
        let Some(step) = st.modal_step else {
            return;
        };
        let is_submit = step + 1 >= st.script.steps.len();
        if is_submit {
            st.counters.submit_clicks += 1;
            if let Some(rejection) = &st.script.rejection {
                if st.values.get(&rejection.key) != Some(&rejection.accepts) {
                    st.rejected = true;
                    return;
                }
            }
            st.rejected = false;
            match st.script.confirmation {
                Confirmation::Container | Confirmation::Phrase => {
                    st.confirmed = true;
                    st.modal_step = None;
                }
                Confirmation::CloseOnly => st.modal_step = None,
                Confirmation::Never => {}
            }
            return;
        }
        st.counters.next_clicks += 1;
        if st.script.discard_on_advance {
            st.discard_open = true;
        } else if !st.script.stall {
            st.modal_step = Some(step + 1);
        }
    }
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn goto(&self, url: &str) -> DriverResult<()> {
        self.check_open()?;
        let mut st = self.state();
        st.visited.push(url.to_string());
        st.url = url.to_string();
        st.view = if url.contains("/jobs/search") {
            View::Search
        } else if url.contains("/feed") {
            View::Feed
        } else if url.contains("/login") {
            View::Login
        } else if let Some(rest) = url.split("/jobs/view/").nth(1) {
            View::Detail(rest.trim_end_matches('/').to_string())
        } else {
            View::Blank
        };
        Ok(())
    }

    async fn current_url(&self) -> DriverResult<String> {
        self.check_open()?;
        let mut st = self.state();
        Self::settle_challenge(&mut st);
        Ok(st.url.clone())
    }

    async fn page_source(&self) -> DriverResult<String> {
        self.check_open()?;
        let mut st = self.state();
        Self::settle_challenge(&mut st);
        Ok(self.render(&st))
    }

    async fn screenshot_png(&self) -> DriverResult<Vec<u8>> {
        self.check_open()?;
        self.state().counters.screenshots += 1;
        Ok(b"\x89PNG fake".to_vec())
    }

    async fn find(&self, locator: &Locator) -> DriverResult<Option<ElementHandle>> {
        self.check_open()?;
        let mut st = self.state();
        Ok(self.lookup(&mut st, locator))
    }

    async fn find_within(
        &self,
        _scope: &ElementHandle,
        locator: &Locator,
    ) -> DriverResult<Option<ElementHandle>> {
        self.find(locator).await
    }

    async fn outer_html(&self, el: &ElementHandle) -> DriverResult<Option<String>> {
        self.check_open()?;
        Ok(Some(format!("<div data-fake=\"{}\"></div>", el.selector())))
    }

    async fn text(&self, el: &ElementHandle) -> DriverResult<Option<String>> {
        self.check_open()?;
        let st = self.state();
        if el.selector() == STEP {
            let caption = st
                .modal_step
                .and_then(|i| st.script.steps.get(i))
                .map(|s| s.caption.clone());
            return Ok(caption);
        }
        Ok(Some(String::new()))
    }

    async fn scroll_into_view(&self, _el: &ElementHandle) -> DriverResult<()> {
        self.check_open()
    }

    async fn click(&self, el: &ElementHandle) -> DriverResult<()> {
        self.check_open()?;
        let mut fire_apply = false;
        {
            let mut st = self.state();
            match el.selector() {
                LOGIN_SUBMIT => match st.script.challenge_for {
                    Some(delay) => {
                        st.view = View::Challenge;
                        st.url = CHALLENGE_URL.to_string();
                        st.challenge_until = Some(Instant::now() + delay);
                    }
                    None => {
                        st.logged_in = true;
                        st.view = View::Feed;
                        st.url = FEED_URL.to_string();
                    }
                },
                APPLY => {
                    st.counters.apply_clicks += 1;
                    st.modal_step = Some(0);
                    st.values.clear();
                    st.rejected = false;
                    fire_apply = true;
                }
                STEP => self.click_step(&mut st),
                DISMISS => {
                    st.modal_step = None;
                }
                DISCARD => {
                    st.counters.discard_clicks += 1;
                    st.discard_open = false;
                    st.modal_step = None;
                }
                SAVE => {
                    st.counters.save_clicks += 1;
                    st.discard_open = false;
                    st.modal_step = None;
                }
                other => {
                    let id = other
                        .strip_prefix("a[href*='/jobs/view/")
                        .and_then(|rest| rest.strip_suffix("']"));
                    match id {
                        Some(id) => {
                            st.view = View::Detail(id.to_string());
                            st.url = format!("https://www.linkedin.com/jobs/view/{}/", id);
                            st.confirmed = false;
                        }
                        None => return Err(DriverError::NotFound(other.to_string())),
                    }
                }
            }
        }
        if fire_apply {
            if let Some(hook) = self.on_apply.lock().unwrap_or_else(|p| p.into_inner()).as_ref() {
                hook();
            }
        }
        Ok(())
    }

    async fn script_click(&self, el: &ElementHandle) -> DriverResult<()> {
        self.click(el).await
    }

    async fn dispatch_click(&self, el: &ElementHandle) -> DriverResult<()> {
        self.click(el).await
    }

    async fn clear(&self, _el: &ElementHandle) -> DriverResult<()> {
        self.check_open()
    }

    async fn send_text(&self, _el: &ElementHandle, _text: &str) -> DriverResult<()> {
        self.check_open()
    }

    async fn scroll_container(&self, _container: &ElementHandle, _to: ScrollTarget) -> DriverResult<()> {
        self.check_open()
    }

    async fn scroll_page(&self, _dy: i64) -> DriverResult<()> {
        self.check_open()
    }

    async fn scan_fields(&self, _modal: &ElementHandle) -> DriverResult<Vec<FormField>> {
        self.check_open()?;
        let st = self.state();
        let Some(step) = st.modal_step.and_then(|i| st.script.steps.get(i)) else {
            return Ok(Vec::new());
        };
        Ok(step
            .fields
            .iter()
            .map(|f| {
                let mut f = f.clone();
                if let Some(v) = st.values.get(&f.key) {
                    f.value = v.clone();
                }
                f
            })
            .collect())
    }

    async fn apply_fill(&self, _modal: &ElementHandle, fill: &FieldFill) -> DriverResult<()> {
        self.check_open()?;
        let mut st = self.state();
        let value = match fill {
            FieldFill::SelectOption { value, .. } => value.clone(),
            FieldFill::Check { .. } => "on".to_string(),
            FieldFill::Type { text, .. } => text.clone(),
            FieldFill::SetNumber { value, .. } => value.clone(),
        };
        st.values.insert(fill.key().to_string(), value);
        st.fills.push(fill.clone());
        Ok(())
    }

    async fn scan_errors(&self, _modal: &ElementHandle) -> DriverResult<Vec<FieldError>> {
        self.check_open()?;
        Ok(Self::field_error(&self.state()).into_iter().collect())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.state().counters.close_calls += 1;
    }
}

// ── Launcher ─────────────────────────────────────────────────────────────────

/// Hands out the same scripted driver on every launch. With a gate, launch
/// waits until the test releases it.
pub struct FakeLauncher {
    pub driver: Arc<FakeDriver>,
    gate: Option<Arc<tokio::sync::Notify>>,
    launches: Mutex<Vec<SessionOptions>>,
}

impl FakeLauncher {
    pub fn new(driver: Arc<FakeDriver>) -> Arc<Self> {
        Arc::new(Self {
            driver,
            gate: None,
            launches: Mutex::new(Vec::new()),
        })
    }

    pub fn gated(driver: Arc<FakeDriver>, gate: Arc<tokio::sync::Notify>) -> Arc<Self> {
        Arc::new(Self {
            driver,
            gate: Some(gate),
            launches: Mutex::new(Vec::new()),
        })
    }

    pub fn launches(&self) -> usize {
        self.launches.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self, options: &SessionOptions) -> Result<Arc<dyn PageDriver>, AutomationError> {
        self.launches
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(options.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(self.driver.clone() as Arc<dyn PageDriver>)
    }
}

// ── Observer ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingObserver {
    pub entries: Mutex<Vec<(LogLevel, String)>>,
    pub cancelled: AtomicBool,
    pub found: Mutex<usize>,
    pub sent: Mutex<u32>,
    pub progress: Mutex<Vec<u8>>,
}

impl RecordingObserver {
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn count(&self, level: LogLevel, needle: &str) -> usize {
        self.entries()
            .iter()
            .filter(|(l, m)| *l == level && m.contains(needle))
            .count()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl RunObserver for RecordingObserver {
    fn log(&self, level: LogLevel, message: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((level, message.to_string()));
    }

    fn progress(&self, percent: u8) {
        self.progress.lock().unwrap_or_else(|p| p.into_inner()).push(percent);
    }

    fn postings_found(&self, count: usize) {
        *self.found.lock().unwrap_or_else(|p| p.into_inner()) += count;
    }

    fn application_sent(&self) {
        *self.sent.lock().unwrap_or_else(|p| p.into_inner()) += 1;
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

pub fn screenshot_dir(diagnostics: &Diagnostics) -> PathBuf {
    diagnostics.screenshot_dir().to_path_buf()
}
