//! Run supervisor: at most one engine worker per process, a status snapshot
//! and a bounded operator log.

use chrono::Local;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::browser::{BrowserLauncher, Diagnostics, SessionOptions};
use crate::core::config::AutomationConfig;
use crate::core::error::{AutomationError, SupervisorError};
use crate::engine::{
    Engine, JobCategory, LogLevel, LoginCredentials, Platform, RunObserver, RunRequest,
    RunSummary, SortOrder,
};
use crate::storage::{now_timestamp, Database};

pub const LOG_RING_CAPACITY: usize = 100;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlatformTally {
    pub found: u64,
    pub applied: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunResults {
    pub total_jobs: u64,
    pub applications_sent: u64,
    pub success_rate: f64,
    pub jobs_by_platform: BTreeMap<String, PlatformTally>,
}

/// Shallow copy of the run state handed to readers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStatus {
    pub running: bool,
    pub run_id: Option<String>,
    pub progress: u8,
    pub current_platform: Option<String>,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub last_error: Option<String>,
    pub results: RunResults,
}

/// What `start` needs; the HTTP layer builds it from the request body.
#[derive(Debug, Clone)]
pub struct StartRequest {
    pub platforms: BTreeSet<Platform>,
    pub categories: BTreeSet<JobCategory>,
    pub max_applications: u32,
    pub region: Option<String>,
    pub distance_km: Option<u32>,
    pub sort: Option<SortOrder>,
}

#[derive(Debug, Default)]
struct RunMeta {
    run_id: Option<String>,
    current_platform: Option<String>,
    started_at: Option<String>,
    finished_at: Option<String>,
    last_error: Option<String>,
}

/// The only state shared between the worker and the HTTP handlers.
#[derive(Debug, Default)]
struct RunShared {
    running: AtomicBool,
    progress: AtomicU8,
    found: AtomicU64,
    applied: AtomicU64,
    meta: RwLock<RunMeta>,
    logs: Mutex<VecDeque<LogEntry>>,
}

impl RunShared {
    fn push_log(&self, level: LogLevel, message: &str) {
        level.trace(message);
        let entry = LogEntry {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            level,
            message: message.to_string(),
        };
        let mut logs = lock(&self.logs);
        while logs.len() >= LOG_RING_CAPACITY {
            logs.pop_front();
        }
        logs.push_back(entry);
    }

    fn results(&self) -> RunResults {
        let found = self.found.load(Ordering::SeqCst);
        let applied = self.applied.load(Ordering::SeqCst);
        let success_rate = if found == 0 {
            0.0
        } else {
            (applied as f64 * 1000.0 / found as f64).round() / 10.0
        };
        let mut jobs_by_platform = BTreeMap::new();
        jobs_by_platform.insert(
            Platform::Linkedin.label().to_string(),
            PlatformTally { found, applied },
        );
        RunResults {
            total_jobs: found,
            applications_sent: applied,
            success_rate,
            jobs_by_platform,
        }
    }

    fn meta_mut(&self) -> std::sync::RwLockWriteGuard<'_, RunMeta> {
        self.meta.write().unwrap_or_else(|p| p.into_inner())
    }
}

/// Observer handed to one engine run. Cancellation is per run so a stopped
/// worker can never be revived by the next `start`.
#[derive(Clone)]
struct RunHandle {
    shared: Arc<RunShared>,
    cancelled: Arc<AtomicBool>,
}

impl RunObserver for RunHandle {
    fn log(&self, level: LogLevel, message: &str) {
        self.shared.push_log(level, message);
    }

    fn progress(&self, percent: u8) {
        self.shared.progress.store(percent.min(100), Ordering::SeqCst);
    }

    fn postings_found(&self, count: usize) {
        self.shared.found.fetch_add(count as u64, Ordering::SeqCst);
    }

    fn application_sent(&self) {
        self.shared.applied.fetch_add(1, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst) || !self.shared.running.load(Ordering::SeqCst)
    }
}

/// Everything the worker needs, cloned into the spawned task.
#[derive(Clone)]
struct WorkerContext {
    launcher: Arc<dyn BrowserLauncher>,
    db: Database,
    config: Arc<AutomationConfig>,
    diagnostics: Arc<Diagnostics>,
}

pub struct Supervisor {
    shared: Arc<RunShared>,
    ctx: WorkerContext,
    worker: Mutex<Option<JoinHandle<()>>>,
    cancel: Mutex<Arc<AtomicBool>>,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        db: Database,
        config: Arc<AutomationConfig>,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        Self {
            shared: Arc::new(RunShared::default()),
            ctx: WorkerContext {
                launcher,
                db,
                config,
                diagnostics,
            },
            worker: Mutex::new(None),
            cancel: Mutex::new(Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Spawn a worker and return its run id without waiting for it.
    pub fn start(&self, request: StartRequest) -> Result<String, SupervisorError> {
        let mut worker = lock(&self.worker);
        if worker.as_ref().is_some_and(|h| !h.is_finished()) {
            return Err(SupervisorError::AlreadyRunning);
        }
        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SupervisorError::AlreadyRunning);
        }

        let run_id = uuid::Uuid::new_v4().to_string();
        {
            let mut meta = self.shared.meta_mut();
            *meta = RunMeta {
                run_id: Some(run_id.clone()),
                started_at: Some(now_timestamp()),
                ..Default::default()
            };
        }
        lock(&self.shared.logs).clear();
        self.shared.progress.store(0, Ordering::SeqCst);
        self.shared.found.store(0, Ordering::SeqCst);
        self.shared.applied.store(0, Ordering::SeqCst);

        let cancelled = Arc::new(AtomicBool::new(false));
        *lock(&self.cancel) = Arc::clone(&cancelled);
        let handle = RunHandle {
            shared: Arc::clone(&self.shared),
            cancelled,
        };

        info!("supervisor: starting run {}", run_id);
        let ctx = self.ctx.clone();
        let id = run_id.clone();
        *worker = Some(tokio::spawn(async move {
            run_worker(ctx, handle, request, id).await;
        }));
        Ok(run_id)
    }

    /// Cooperative: the engine notices between postings and form steps.
    pub fn stop(&self) -> Result<(), SupervisorError> {
        if !self.is_running() {
            return Err(SupervisorError::NotRunning);
        }
        lock(&self.cancel).store(true, Ordering::SeqCst);
        self.shared.running.store(false, Ordering::SeqCst);
        self.shared
            .push_log(LogLevel::Warning, "⏹️ Parada solicitada; encerrando após a etapa atual.");
        Ok(())
    }

    pub fn status(&self) -> RunStatus {
        let meta = self.shared.meta.read().unwrap_or_else(|p| p.into_inner());
        RunStatus {
            running: self.is_running(),
            run_id: meta.run_id.clone(),
            progress: self.shared.progress.load(Ordering::SeqCst),
            current_platform: meta.current_platform.clone(),
            started_at: meta.started_at.clone(),
            finished_at: meta.finished_at.clone(),
            last_error: meta.last_error.clone(),
            results: self.shared.results(),
        }
    }

    pub fn results(&self) -> RunResults {
        self.shared.results()
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        lock(&self.shared.logs).iter().cloned().collect()
    }

    /// Append to the operator log outside of a run.
    pub fn log(&self, level: LogLevel, message: &str) {
        self.shared.push_log(level, message);
    }

    /// Wait for the current worker, if any, to exit.
    pub async fn join(&self) {
        let handle = lock(&self.worker).take();
        if let Some(h) = handle {
            if let Err(e) = h.await {
                error!("supervisor: worker join failed: {}", e);
            }
        }
    }

    /// Stop any live run and give it `grace` to release the browser.
    pub async fn shutdown(&self, grace: Duration) {
        if self.stop().is_ok() {
            info!("supervisor: stopping live run for shutdown");
        }
        if tokio::time::timeout(grace, self.join()).await.is_err() {
            warn!("supervisor: worker did not exit within {:?}", grace);
        }
    }
}

async fn run_worker(ctx: WorkerContext, handle: RunHandle, request: StartRequest, run_id: String) {
    handle.progress(10);
    handle.log(LogLevel::Info, "🚀 Automação iniciada.");

    match drive(&ctx, &handle, &request, &run_id).await {
        Ok(Some(summary)) => {
            let banner = if summary.cancelled {
                format!(
                    "⏹️ Automação interrompida: {} candidatura(s) enviada(s).",
                    summary.applications_sent
                )
            } else {
                format!(
                    "🏁 Automação concluída: {} candidatura(s) enviada(s).",
                    summary.applications_sent
                )
            };
            handle.log(LogLevel::Success, &banner);
        }
        Ok(None) => {}
        Err(e) => {
            handle.log(LogLevel::Error, &format!("❌ Automação encerrada: {}", e));
            handle.shared.meta_mut().last_error = Some(e.to_string());
        }
    }

    handle.progress(100);
    handle.shared.meta_mut().finished_at = Some(now_timestamp());
    handle.shared.running.store(false, Ordering::SeqCst);
    info!("supervisor: run {} ended", run_id);
}

async fn drive(
    ctx: &WorkerContext,
    handle: &RunHandle,
    request: &StartRequest,
    run_id: &str,
) -> Result<Option<RunSummary>, AutomationError> {
    for platform in request.platforms.iter().filter(|p| **p != Platform::Linkedin) {
        handle.log(
            LogLevel::Info,
            &format!("ℹ️ {} ainda não é suportado; ignorado.", platform.label()),
        );
    }
    if !request.platforms.contains(&Platform::Linkedin) {
        handle.log(LogLevel::Info, "ℹ️ LinkedIn não selecionado; nada a fazer.");
        return Ok(None);
    }

    let policy = Platform::Linkedin
        .selector_policy()
        .ok_or_else(|| AutomationError::UnsupportedPlatform(Platform::Linkedin.key().into()))?;
    let credential = ctx
        .db
        .get_credential(Platform::Linkedin.key())
        .await?
        .ok_or_else(|| AutomationError::MissingCredentials(Platform::Linkedin.key().into()))?;
    handle.shared.meta_mut().current_platform = Some(Platform::Linkedin.label().to_string());

    let browser = &ctx.config.browser;
    let options = SessionOptions {
        headless: browser.resolve_headless(),
        timeout: browser.resolve_page_timeout(),
        debug_port: browser.resolve_debug_port(),
        chrome_executable: browser.resolve_chrome_executable(),
        site_url: policy.base_url.clone(),
    };
    handle.log(LogLevel::Info, "🌐 Abrindo navegador...");
    let driver = ctx.launcher.launch(&options).await?;
    handle.progress(20);

    let engine = Engine::new(
        Arc::clone(&driver),
        policy,
        Arc::clone(&ctx.config),
        ctx.db.clone(),
        Arc::clone(&ctx.diagnostics),
        Arc::new(handle.clone()),
    );
    let run_request = RunRequest {
        run_id: run_id.to_string(),
        categories: request.categories.clone(),
        max_applications: request.max_applications,
        region: request.region.clone(),
        distance_km: request.distance_km,
        sort: request.sort,
        credentials: LoginCredentials {
            username: credential.username,
            password: credential.password,
        },
    };

    // A panic inside the engine still reaches the close below.
    let outcome = tokio::spawn(async move { engine.run(&run_request).await }).await;
    driver.close().await;

    match outcome {
        Ok(result) => result.map(Some),
        Err(join_error) => {
            error!("supervisor: engine task failed: {:?}", join_error);
            Err(AutomationError::Navigation(format!("engine crashed: {}", join_error)))
        }
    }
}
