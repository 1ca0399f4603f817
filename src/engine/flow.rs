//! Per-posting machine: `OPEN_POSTING → APPLY_CLICK → FORM_STEP → SUBMIT`.
//!
//! Every selector miss becomes a [`PostingOutcome`]; only a dead browser
//! escapes as an error.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::events::{LogLevel, RunObserver};
use super::harvester::PostingDescriptor;
use super::questionnaire::{plan_fills, recovery_fills, AnswerBank, AnsweredQuestion};
use super::selectors::SelectorPolicy;
use super::state::{log_state, FlowState, PostingOutcome};
use crate::browser::{
    wait_for, Diagnostics, DriverError, DriverResult, ElementHandle, FieldError, FieldFill,
    PageDriver, ScrollTarget,
};
use crate::core::error::AutomationError;

pub const DETAIL_PANEL_TIMEOUT: Duration = Duration::from_secs(10);
pub const APPLY_MODAL_TIMEOUT: Duration = Duration::from_secs(10);
/// No observable progress on the form for this long ends the posting.
pub const STALL_TIMEOUT: Duration = Duration::from_secs(18);
/// How long one click on "next" gets to change the step.
pub const ADVANCE_POLL: Duration = Duration::from_secs(3);
pub const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(15);
/// Passes through `FORM_STEP` allowed per posting, submits included.
pub const MAX_STEPS: u32 = 12;

const DISMISS_TIMEOUT: Duration = Duration::from_secs(2);
const MISSING_BUTTON_PAUSE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct PostingReport {
    pub outcome: PostingOutcome,
    pub questions: Vec<AnsweredQuestion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepKind {
    Next,
    Review,
    Submit,
}

struct StepButton {
    handle: ElementHandle,
    caption: String,
    kind: StepKind,
}

/// What the modal looks like from the outside: field values plus the
/// step button caption. Any change counts as progress.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StepFingerprint {
    fields: Vec<(String, String)>,
    caption: String,
}

enum Advance {
    Moved,
    Discard,
    Closed,
}

enum SubmitProbe {
    Confirmed,
    Rejected(Vec<FieldError>),
    Discard,
    Closed,
}

enum SubmitVerdict {
    Confirmed,
    Rejected(Vec<FieldError>),
    Discard,
    Timeout(Option<std::path::PathBuf>),
}

/// Lift a driver result: a closed session aborts, anything else degrades to
/// the default value.
fn soft<T: Default>(result: DriverResult<T>) -> Result<T, AutomationError> {
    match result {
        Ok(v) => Ok(v),
        Err(DriverError::SessionClosed) => Err(AutomationError::SessionLost),
        Err(e) => {
            debug!("flow: ignoring driver error: {}", e);
            Ok(T::default())
        }
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| !n.is_empty() && haystack.contains(n.as_str()))
}

pub struct ApplyFlow<'a> {
    driver: &'a dyn PageDriver,
    policy: &'a SelectorPolicy,
    answers: &'a AnswerBank,
    diagnostics: &'a Diagnostics,
    observer: &'a dyn RunObserver,
    save_on_discard: bool,
}

impl<'a> ApplyFlow<'a> {
    pub fn new(
        driver: &'a dyn PageDriver,
        policy: &'a SelectorPolicy,
        answers: &'a AnswerBank,
        diagnostics: &'a Diagnostics,
        observer: &'a dyn RunObserver,
        save_on_discard: bool,
    ) -> Self {
        Self {
            driver,
            policy,
            answers,
            diagnostics,
            observer,
            save_on_discard,
        }
    }

    pub async fn process(&self, posting: &PostingDescriptor) -> Result<PostingReport, AutomationError> {
        let mut questions = Vec::new();
        let label = posting.platform_id.clone().unwrap_or_else(|| "posting".to_string());
        let outcome = self.drive(posting, &label, &mut questions).await?;
        log_state(outcome.final_state());
        Ok(PostingReport { outcome, questions })
    }

    /// Screenshot plus HTML dump; the screenshot path goes on the attempt row.
    async fn capture(&self, label: &str) -> Option<std::path::PathBuf> {
        let shot = self.diagnostics.snapshot(self.driver, label).await;
        self.diagnostics.dump_html(self.driver, label).await;
        shot
    }

    fn ensure_alive(&self) -> Result<(), AutomationError> {
        if self.driver.is_closed() {
            Err(AutomationError::SessionLost)
        } else {
            Ok(())
        }
    }

    async fn drive(
        &self,
        posting: &PostingDescriptor,
        label: &str,
        questions: &mut Vec<AnsweredQuestion>,
    ) -> Result<PostingOutcome, AutomationError> {
        log_state(FlowState::OpenPosting);
        let Some(panel) = self.open_posting(posting).await? else {
            self.ensure_alive()?;
            return Ok(PostingOutcome::SelectorMiss("job detail panel not found".into()));
        };

        // Scoped to the detail panel: sidebar cards carry the same badge.
        if soft(self.driver.find_within(&panel, &self.policy.applied_badge).await)?.is_some() {
            info!("flow: {} already applied (panel badge)", label);
            return Ok(PostingOutcome::AlreadyApplied);
        }

        let Some(control) = self.find_apply_control(&panel).await? else {
            let screenshot = self.capture(&format!("no_apply_{}", label)).await;
            return Ok(PostingOutcome::NoApplyControl { screenshot });
        };

        log_state(FlowState::ApplyClick);
        if !self.driver.robust_click(&control).await {
            self.ensure_alive()?;
            return Ok(PostingOutcome::SelectorMiss("apply control not clickable".into()));
        }
        if self
            .driver
            .wait_any(&self.policy.modal_containers, APPLY_MODAL_TIMEOUT)
            .await
            .is_none()
        {
            self.ensure_alive()?;
            return Ok(PostingOutcome::SelectorMiss("application modal did not open".into()));
        }

        self.form_loop(label, questions).await
    }

    /// Close overlays, click the card (or navigate), wait for the panel.
    async fn open_posting(&self, posting: &PostingDescriptor) -> Result<Option<ElementHandle>, AutomationError> {
        if let Some(close) = soft(self.driver.find(&self.policy.overlay_close).await)? {
            let _ = self.driver.robust_click(&close).await;
        }

        let clicked = match &posting.handle {
            Some(handle) => self.driver.robust_click(handle).await,
            None => false,
        };
        if !clicked {
            self.ensure_alive()?;
            match self.driver.goto(&posting.detail_url).await {
                Ok(()) => {}
                Err(DriverError::SessionClosed) => return Err(AutomationError::SessionLost),
                Err(e) => {
                    warn!("flow: could not open {}: {}", posting.detail_url, e);
                    return Ok(None);
                }
            }
        }

        Ok(self
            .driver
            .wait_any(&self.policy.detail_panels, DETAIL_PANEL_TIMEOUT)
            .await)
    }

    /// Panel first, then the panel scrolled to the top, then page-wide.
    async fn find_apply_control(&self, panel: &ElementHandle) -> Result<Option<ElementHandle>, AutomationError> {
        for locator in &self.policy.apply_controls {
            if let Some(el) = soft(self.driver.find_within(panel, locator).await)? {
                return Ok(Some(el));
            }
        }
        soft(self.driver.scroll_container(panel, ScrollTarget::Top).await)?;
        for locator in &self.policy.apply_controls {
            if let Some(el) = soft(self.driver.find_within(panel, locator).await)? {
                return Ok(Some(el));
            }
        }
        for locator in &self.policy.apply_controls {
            if let Some(el) = soft(self.driver.find(locator).await)? {
                return Ok(Some(el));
            }
        }
        Ok(None)
    }

    async fn current_modal(&self) -> Result<Option<ElementHandle>, AutomationError> {
        for locator in &self.policy.modal_containers {
            if let Some(el) = soft(self.driver.find(locator).await)? {
                return Ok(Some(el));
            }
        }
        Ok(None)
    }

    async fn discard_dialog(&self) -> Result<Option<ElementHandle>, AutomationError> {
        for locator in &self.policy.discard_modals {
            if let Some(el) = soft(self.driver.find(locator).await)? {
                return Ok(Some(el));
            }
        }
        Ok(None)
    }

    async fn form_loop(
        &self,
        label: &str,
        questions: &mut Vec<AnsweredQuestion>,
    ) -> Result<PostingOutcome, AutomationError> {
        log_state(FlowState::FormStep);
        let mut steps = 0u32;
        let mut last_progress = Instant::now();
        let mut recovered = false;

        loop {
            self.ensure_alive()?;
            if self.observer.is_cancelled() {
                self.dismiss_modal().await?;
                return Ok(PostingOutcome::Cancelled);
            }
            if last_progress.elapsed() > STALL_TIMEOUT {
                warn!("flow: {} made no progress for {:?}", label, STALL_TIMEOUT);
                let screenshot = self.capture(&format!("stalled_{}", label)).await;
                self.dismiss_modal().await?;
                return Ok(PostingOutcome::Stalled { screenshot });
            }
            if let Some(outcome) = self.handle_discard().await? {
                return Ok(outcome);
            }

            let Some(modal) = self.current_modal().await? else {
                return Ok(PostingOutcome::SelectorMiss("application modal closed".into()));
            };
            if steps >= MAX_STEPS {
                warn!("flow: {} used all {} form steps", label, MAX_STEPS);
                let screenshot = self.capture(&format!("step_cap_{}", label)).await;
                self.dismiss_modal().await?;
                return Ok(PostingOutcome::StepCapExceeded { screenshot });
            }

            let fields = soft(self.driver.scan_fields(&modal).await)?;
            for planned in plan_fills(&fields, self.answers, self.policy) {
                match self.driver.apply_fill(&modal, &planned.fill).await {
                    Ok(()) => record(questions, planned.answer),
                    Err(DriverError::SessionClosed) => return Err(AutomationError::SessionLost),
                    Err(e) => debug!("flow: fill {:?} failed: {}", planned.fill.key(), e),
                }
            }
            let _ = self
                .driver
                .scroll_modal(&self.policy.modal_scroll, ScrollTarget::Bottom)
                .await;

            let Some(button) = self.find_step_button(&modal).await? else {
                debug!("flow: no step button yet");
                tokio::time::sleep(MISSING_BUTTON_PAUSE).await;
                continue;
            };
            steps += 1;

            if button.kind == StepKind::Submit {
                log_state(FlowState::Submit);
                match self.submit(&modal, &button.handle, label).await? {
                    SubmitVerdict::Confirmed => return Ok(PostingOutcome::Confirmed),
                    SubmitVerdict::Timeout(screenshot) => {
                        return Ok(PostingOutcome::ConfirmationTimeout { screenshot })
                    }
                    SubmitVerdict::Discard => continue,
                    SubmitVerdict::Rejected(errors) => {
                        if !recovered {
                            recovered = self.recover(&modal, &errors).await?;
                            if recovered {
                                continue;
                            }
                        }
                        // Unrecoverable: give the page a beat, the stall timer decides.
                        tokio::time::sleep(ADVANCE_POLL).await;
                        continue;
                    }
                }
            }

            let before = self.fingerprint(&button.caption).await?;
            debug!("flow: clicking '{}' ({:?})", button.caption, button.kind);
            if !self.driver.robust_click(&button.handle).await {
                self.ensure_alive()?;
            }

            let this = self;
            let before_ref = &before;
            let advance = wait_for(ADVANCE_POLL, move || async move {
                this.probe_advance(before_ref).await
            })
            .await;

            match advance {
                Some(Advance::Closed) => return Err(AutomationError::SessionLost),
                Some(Advance::Discard) => continue,
                Some(Advance::Moved) => {
                    last_progress = Instant::now();
                    recovered = false;
                }
                None => {
                    if !recovered {
                        let errors = soft(self.driver.scan_errors(&modal).await)?;
                        if !errors.is_empty() {
                            recovered = self.recover(&modal, &errors).await?;
                        }
                    }
                }
            }
        }
    }

    /// Primary data-attribute buttons first, then the caption match.
    async fn find_step_button(&self, modal: &ElementHandle) -> Result<Option<StepButton>, AutomationError> {
        let mut found = None;
        for locator in &self.policy.step_button_primary {
            if let Some(el) = soft(self.driver.find_within(modal, locator).await)? {
                found = Some((el, locator.css_part().contains("submit")));
                break;
            }
        }
        if found.is_none() {
            found = soft(
                self.driver
                    .find_within(modal, &self.policy.step_button_caption)
                    .await,
            )?
            .map(|el| (el, false));
        }
        let Some((handle, submit_attr)) = found else {
            return Ok(None);
        };
        let caption = soft(self.driver.text(&handle).await)?
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        let kind = if submit_attr || contains_any(&caption, &self.policy.submit_captions) {
            StepKind::Submit
        } else if contains_any(&caption, &self.policy.review_captions) {
            StepKind::Review
        } else {
            StepKind::Next
        };
        Ok(Some(StepButton { handle, caption, kind }))
    }

    async fn fingerprint(&self, fallback_caption: &str) -> Result<StepFingerprint, AutomationError> {
        let Some(modal) = self.current_modal().await? else {
            return Ok(StepFingerprint {
                fields: Vec::new(),
                caption: String::new(),
            });
        };
        let fields = soft(self.driver.scan_fields(&modal).await)?
            .into_iter()
            .map(|f| (f.key, f.value))
            .collect();
        let caption = match self.find_step_button(&modal).await? {
            Some(b) => b.caption,
            None => fallback_caption.to_string(),
        };
        Ok(StepFingerprint { fields, caption })
    }

    async fn probe_advance(&self, before: &StepFingerprint) -> Option<Advance> {
        if self.driver.is_closed() {
            return Some(Advance::Closed);
        }
        match self.discard_dialog().await {
            Ok(Some(_)) => return Some(Advance::Discard),
            Err(_) => return Some(Advance::Closed),
            Ok(None) => {}
        }
        match self.fingerprint(&before.caption).await {
            Ok(now) if now != *before => Some(Advance::Moved),
            Ok(_) => None,
            Err(_) => Some(Advance::Closed),
        }
    }

    /// One-shot rewrite of inputs whose inline error demands a number.
    async fn recover(&self, modal: &ElementHandle, errors: &[FieldError]) -> Result<bool, AutomationError> {
        let fields = soft(self.driver.scan_fields(modal).await)?;
        let fills: Vec<FieldFill> = recovery_fills(errors, &fields, self.answers);
        if fills.is_empty() {
            return Ok(false);
        }
        info!("flow: rewriting {} field(s) after validation errors", fills.len());
        for fill in &fills {
            match self.driver.apply_fill(modal, fill).await {
                Ok(()) => {}
                Err(DriverError::SessionClosed) => return Err(AutomationError::SessionLost),
                Err(e) => debug!("flow: recovery fill {} failed: {}", fill.key(), e),
            }
        }
        Ok(true)
    }

    fn phrase_count(&self, source: &str) -> usize {
        let s = source.to_lowercase();
        self.policy
            .confirmation_phrases
            .iter()
            .map(|p| s.matches(p.as_str()).count())
            .sum()
    }

    /// Click submit and wait for evidence. A phrase only counts when it was
    /// not already on the page before the click.
    async fn submit(
        &self,
        modal: &ElementHandle,
        button: &ElementHandle,
        label: &str,
    ) -> Result<SubmitVerdict, AutomationError> {
        let baseline = self.phrase_count(&soft(self.driver.page_source().await)?);
        if !self.driver.robust_click(button).await {
            self.ensure_alive()?;
        }

        let this = self;
        let verdict = wait_for(CONFIRMATION_TIMEOUT, move || async move {
            this.probe_confirmation(modal, baseline).await
        })
        .await;

        match verdict {
            Some(SubmitProbe::Confirmed) => {
                if let Ok(Some(done)) = self.driver.find(&self.policy.done_button).await {
                    let _ = self.driver.robust_click(&done).await;
                }
                Ok(SubmitVerdict::Confirmed)
            }
            Some(SubmitProbe::Rejected(errors)) => Ok(SubmitVerdict::Rejected(errors)),
            Some(SubmitProbe::Discard) => Ok(SubmitVerdict::Discard),
            Some(SubmitProbe::Closed) => Err(AutomationError::SessionLost),
            None => {
                warn!("flow: {} not confirmed within {:?}", label, CONFIRMATION_TIMEOUT);
                let shot = self.capture(&format!("confirmation_timeout_{}", label)).await;
                Ok(SubmitVerdict::Timeout(shot))
            }
        }
    }

    async fn probe_confirmation(&self, modal: &ElementHandle, baseline: usize) -> Option<SubmitProbe> {
        if self.driver.is_closed() {
            return Some(SubmitProbe::Closed);
        }
        for locator in &self.policy.confirmation_containers {
            if let Ok(Some(_)) = self.driver.find(locator).await {
                return Some(SubmitProbe::Confirmed);
            }
        }
        let source = self.driver.page_source().await.unwrap_or_default();
        if self.phrase_count(&source) > baseline {
            return Some(SubmitProbe::Confirmed);
        }
        if let Ok(Some(_)) = self.discard_dialog().await {
            return Some(SubmitProbe::Discard);
        }
        match self.current_modal().await {
            Ok(None) => {
                let url = self.driver.current_url().await.unwrap_or_default().to_lowercase();
                if contains_any(&url, &self.policy.confirmation_url_markers) {
                    return Some(SubmitProbe::Confirmed);
                }
                None
            }
            Ok(Some(_)) => match self.driver.scan_errors(modal).await {
                Ok(errors) if !errors.is_empty() => Some(SubmitProbe::Rejected(errors)),
                _ => None,
            },
            Err(_) => Some(SubmitProbe::Closed),
        }
    }

    /// Answer the "save this application?" interruption, if it is showing.
    async fn handle_discard(&self) -> Result<Option<PostingOutcome>, AutomationError> {
        let Some(dialog) = self.discard_dialog().await? else {
            return Ok(None);
        };
        let (button, saved) = if self.save_on_discard {
            (&self.policy.save_button, true)
        } else {
            (&self.policy.discard_button, false)
        };
        let target = match soft(self.driver.find_within(&dialog, button).await)? {
            Some(el) => Some(el),
            None => soft(self.driver.find(button).await)?,
        };
        match target {
            Some(el) => {
                if !self.driver.robust_click(&el).await {
                    self.ensure_alive()?;
                }
            }
            None => warn!("flow: discard dialog without a {} button", if saved { "save" } else { "discard" }),
        }
        self.observer.log(
            LogLevel::Info,
            if saved {
                "💾 Candidatura salva para depois."
            } else {
                "🗑️ Candidatura descartada."
            },
        );
        Ok(Some(PostingOutcome::Discarded { saved }))
    }

    /// Best-effort close of the application modal, discarding the draft.
    async fn dismiss_modal(&self) -> Result<(), AutomationError> {
        let Some(close) = soft(self.driver.find(&self.policy.modal_dismiss).await)? else {
            return Ok(());
        };
        let _ = self.driver.robust_click(&close).await;
        if self
            .driver
            .wait_any(&self.policy.discard_modals, DISMISS_TIMEOUT)
            .await
            .is_some()
        {
            if let Some(discard) = soft(self.driver.find(&self.policy.discard_button).await)? {
                let _ = self.driver.robust_click(&discard).await;
            }
        }
        self.ensure_alive()
    }
}

fn record(questions: &mut Vec<AnsweredQuestion>, answer: AnsweredQuestion) {
    match questions.iter_mut().find(|q| q.question == answer.question) {
        Some(existing) => *existing = answer,
        None => questions.push(answer),
    }
}
