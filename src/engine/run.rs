//! Run-level loop: `AUTH → SEARCH → LIST`, then one [`ApplyFlow`] per
//! eligible posting until the list, the cap or the operator runs out.

use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info};

use super::auth::{authenticate, LoginCredentials};
use super::events::{LogLevel, RunObserver};
use super::flow::ApplyFlow;
use super::harvester::{harvest_with_scroll, PostingDescriptor};
use super::pacing::PostingDelay;
use super::questionnaire::AnswerBank;
use super::relevance::{is_relevant, search_phrases, JobCategory};
use super::search_url::{build_search_url, SearchQuery, SortOrder};
use super::selectors::SelectorPolicy;
use super::state::{log_state, FlowState, PostingOutcome};
use crate::browser::{Diagnostics, Locator, PageDriver};
use crate::core::config::AutomationConfig;
use crate::core::error::AutomationError;
use crate::storage::{
    AttemptStatus, AttemptUpdate, Database, NewAttempt, NewPosting, StorageError,
};

/// Cards harvested per search phrase.
pub const HARVEST_LIMIT: usize = 30;

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub run_id: String,
    pub categories: BTreeSet<JobCategory>,
    pub max_applications: u32,
    pub region: Option<String>,
    pub distance_km: Option<u32>,
    pub sort: Option<SortOrder>,
    pub credentials: LoginCredentials,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub postings_found: usize,
    pub attempts: u32,
    pub applications_sent: u32,
    pub cancelled: bool,
}

pub struct Engine {
    driver: Arc<dyn PageDriver>,
    policy: SelectorPolicy,
    config: Arc<AutomationConfig>,
    db: Database,
    diagnostics: Arc<Diagnostics>,
    observer: Arc<dyn RunObserver>,
}

enum Gate {
    Go,
    Skip(String),
}

impl Engine {
    pub fn new(
        driver: Arc<dyn PageDriver>,
        policy: SelectorPolicy,
        config: Arc<AutomationConfig>,
        db: Database,
        diagnostics: Arc<Diagnostics>,
        observer: Arc<dyn RunObserver>,
    ) -> Self {
        Self {
            driver,
            policy,
            config,
            db,
            diagnostics,
            observer,
        }
    }

    fn search_query(&self, phrase: &str, req: &RunRequest) -> SearchQuery {
        let search = &self.config.search;
        SearchQuery {
            keywords: phrase.to_string(),
            region: req.region.clone().unwrap_or_else(|| search.resolve_region()),
            distance_km: req.distance_km.or_else(|| search.resolve_distance_km()),
            one_click_only: search.resolve_one_click_only(),
            sort: req.sort.unwrap_or_else(|| search.resolve_sort()),
        }
    }

    /// Cheap filters that never touch the browser.
    async fn gate(
        &self,
        posting: &PostingDescriptor,
        categories: &BTreeSet<JobCategory>,
        one_click_only: bool,
    ) -> Result<Gate, AutomationError> {
        let title = posting.title.as_deref().unwrap_or_default();
        if one_click_only && !posting.eligibility_hint {
            return Ok(Gate::Skip(format!("⏭️ Sem candidatura simplificada: {}", title)));
        }
        if posting.already_applied_hint {
            return Ok(Gate::Skip(format!("⏭️ Já candidatado: {}", title)));
        }
        if !is_relevant(title, None, categories) {
            return Ok(Gate::Skip(format!("⏭️ Vaga fora do perfil: {}", title)));
        }
        let window = self.config.resolve_duplicate_window_days();
        if let Some(dup) = self
            .db
            .check_recent_duplicate(
                posting.platform_id.as_deref(),
                Some(&posting.detail_url),
                window,
            )
            .await?
        {
            return Ok(Gate::Skip(format!(
                "⏭️ Candidatura recente ({}): {}",
                dup.attempted_at, title
            )));
        }
        Ok(Gate::Go)
    }

    pub async fn run(&self, req: &RunRequest) -> Result<RunSummary, AutomationError> {
        let driver = self.driver.as_ref();
        let observer = self.observer.as_ref();
        let page_timeout = self.config.browser.resolve_page_timeout();
        log_state(FlowState::Init);

        authenticate(driver, &self.policy, &req.credentials, observer, page_timeout).await?;
        observer.progress(30);

        let categories = if req.categories.is_empty() {
            BTreeSet::from([JobCategory::FinancialAnalyst])
        } else {
            req.categories.clone()
        };
        let answers = AnswerBank::from_settings(&self.config.answers);
        let pacing = PostingDelay::from_settings(&self.config.pacing);
        let one_click_only = self.config.search.resolve_one_click_only();
        let cap = req.max_applications;
        let flow = ApplyFlow::new(
            driver,
            &self.policy,
            &answers,
            &self.diagnostics,
            observer,
            self.config.resolve_save_on_discard(),
        );
        let cards: Vec<Locator> = self.policy.card_selectors.iter().map(Locator::css).collect();

        let mut summary = RunSummary::default();
        let mut last_posting = None;

        'phrases: for phrase in search_phrases(&categories) {
            if observer.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            if summary.applications_sent >= cap {
                break;
            }

            log_state(FlowState::Search);
            let url = build_search_url(&self.search_query(phrase, req));
            observer.log(LogLevel::Info, &format!("🔎 Buscando vagas: {}", phrase));
            driver.goto(&url).await?;
            if driver.wait_any(&cards, page_timeout).await.is_none() {
                if driver.is_closed() {
                    return Err(AutomationError::SessionLost);
                }
                observer.log(
                    LogLevel::Info,
                    &format!("📭 Nenhuma vaga encontrada para '{}'", phrase),
                );
                continue;
            }

            log_state(FlowState::List);
            let postings = harvest_with_scroll(driver, &self.policy, HARVEST_LIMIT).await?;
            summary.postings_found += postings.len();
            observer.postings_found(postings.len());
            observer.log(
                LogLevel::Info,
                &format!("📋 {} vagas encontradas para '{}'", postings.len(), phrase),
            );

            for posting in &postings {
                if observer.is_cancelled() {
                    summary.cancelled = true;
                    break 'phrases;
                }
                if summary.applications_sent >= cap {
                    break 'phrases;
                }
                if let Gate::Skip(reason) = self.gate(posting, &categories, one_click_only).await? {
                    observer.log(LogLevel::Info, &reason);
                    continue;
                }

                if let Some(last) = last_posting {
                    if !pacing.wait(last, || observer.is_cancelled()).await {
                        summary.cancelled = true;
                        break 'phrases;
                    }
                }
                let started = Instant::now();
                let outcome = self.attempt(&flow, posting, req).await?;
                summary.attempts += 1;
                last_posting = Some(started.elapsed());

                match &outcome {
                    PostingOutcome::Confirmed => {
                        summary.applications_sent += 1;
                        observer.application_sent();
                        observer.log(
                            LogLevel::Success,
                            &format!(
                                "✅ Candidatura enviada: {} | {}",
                                posting.title.as_deref().unwrap_or("?"),
                                posting.employer.as_deref().unwrap_or("?")
                            ),
                        );
                        if cap > 0 {
                            let pct = 30 + 70 * summary.applications_sent.min(cap) / cap;
                            observer.progress(pct.min(100) as u8);
                        }
                    }
                    PostingOutcome::Cancelled => {
                        summary.cancelled = true;
                        break 'phrases;
                    }
                    other if other.attempt_status() == AttemptStatus::Skipped => {
                        observer.log(
                            LogLevel::Info,
                            &format!(
                                "⏭️ Vaga ignorada ({:?}): {}",
                                other,
                                posting.title.as_deref().unwrap_or("?")
                            ),
                        );
                    }
                    other => {
                        observer.log(
                            LogLevel::Warning,
                            &format!(
                                "⚠️ Candidatura não concluída ({}): {}",
                                other.error_text().unwrap_or_default(),
                                posting.title.as_deref().unwrap_or("?")
                            ),
                        );
                    }
                }
            }
        }

        info!(
            "run {} finished: {} found, {} attempts, {} sent",
            req.run_id, summary.postings_found, summary.attempts, summary.applications_sent
        );
        Ok(summary)
    }

    /// One journal row per posting acted on. A dead browser leaves the row
    /// pending; any other abort marks it failed first.
    async fn attempt(
        &self,
        flow: &ApplyFlow<'_>,
        posting: &PostingDescriptor,
        req: &RunRequest,
    ) -> Result<PostingOutcome, AutomationError> {
        let platform = self.policy.platform.label();
        let job_id = posting
            .platform_id
            .clone()
            .unwrap_or_else(|| posting.detail_url.clone());
        self.db
            .upsert_posting(&NewPosting {
                platform: platform.to_string(),
                job_id: job_id.clone(),
                title: posting.title.clone().unwrap_or_default(),
                company: posting.employer.clone(),
                location: posting.location.clone(),
                url: posting.detail_url.clone(),
                ..Default::default()
            })
            .await?;

        let attempt_id = self
            .db
            .open_attempt(
                &NewAttempt {
                    job_title: posting.title.clone().unwrap_or_default(),
                    company_name: posting.employer.clone(),
                    job_url: Some(posting.detail_url.clone()),
                    job_id: posting.platform_id.clone(),
                    location: posting.location.clone(),
                    platform: platform.to_string(),
                    job_type: None,
                },
                Some(&req.run_id),
            )
            .await?;

        let report = match flow.process(posting).await {
            Ok(report) => report,
            Err(AutomationError::SessionLost) => {
                debug!("attempt {} left pending: browser gone", attempt_id);
                return Err(AutomationError::SessionLost);
            }
            Err(e) => {
                let _ = self
                    .db
                    .mark(
                        attempt_id,
                        AttemptUpdate::new(AttemptStatus::Failed).with_error(Some(e.to_string())),
                    )
                    .await;
                return Err(e);
            }
        };

        let questions = if report.questions.is_empty() {
            None
        } else {
            Some(serde_json::to_value(&report.questions).map_err(StorageError::from)?)
        };
        let outcome = report.outcome;
        self.db
            .mark(
                attempt_id,
                AttemptUpdate::new(outcome.attempt_status())
                    .with_error(outcome.error_text())
                    .with_questions(questions)
                    .with_screenshot(outcome.screenshot().map(|p| p.display().to_string())),
            )
            .await?;
        self.db
            .set_posting_status(platform, &job_id, outcome.posting_status())
            .await?;
        Ok(outcome)
    }
}
