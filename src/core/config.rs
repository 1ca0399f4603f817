use std::path::{Path, PathBuf};

use crate::engine::search_url::SortOrder;

// ---------------------------------------------------------------------------
// File-based config loader (apply-scout.json) with env-var fallback
// ---------------------------------------------------------------------------

pub const ENV_CONFIG_PATH: &str = "APPLY_SCOUT_CONFIG";
pub const ENV_CHROME_EXECUTABLE: &str = "CHROME_EXECUTABLE";
pub const ENV_HEADLESS: &str = "APPLY_SCOUT_HEADLESS";
pub const ENV_DEBUG_PORT: &str = "APPLY_SCOUT_DEBUG_PORT";
pub const ENV_SALARY: &str = "APPLY_SCOUT_SALARY";
pub const ENV_LANGUAGE_LEVEL: &str = "APPLY_SCOUT_LANGUAGE_LEVEL";
pub const ENV_SAVE_ON_DISCARD: &str = "APPLY_SCOUT_SAVE_ON_DISCARD";
pub const ENV_DATABASE: &str = "APPLY_SCOUT_DB";
pub const ENV_CAPTCHA_API_KEY: &str = "CAPTCHA_API_KEY";

pub const DEFAULT_SALARY: &str = "1900";
pub const DEFAULT_LANGUAGE_LEVEL: &str = "Basic";
pub const DEFAULT_YEARS_EXPERIENCE: &str = "2";
pub const DEFAULT_COVER_LETTER: &str = "Tenho interesse nesta oportunidade. Segue um breve resumo das minhas qualificações: experiência com rotinas financeiras, conciliações, análise de indicadores e ferramentas como Excel e ERP. Estou disponível para conversar e contribuir com a equipe.";
pub const DEFAULT_GENERIC_ANSWER: &str =
    "Tenho interesse nesta oportunidade e acredito que minha experiência é compatível.";
pub const DEFAULT_REGION: &str = "São Paulo, SP";
pub const DEFAULT_DUPLICATE_WINDOW_DAYS: i64 = 30;

/// Browser sub-config (mirrors the `browser` key in apply-scout.json).
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct BrowserSettings {
    /// Run without a visible window. Defaults to `false`: challenges need a human.
    pub headless: Option<bool>,
    /// Attach to an already-running browser on `127.0.0.1:<port>` instead of launching one.
    pub debug_port: Option<u16>,
    pub chrome_executable: Option<String>,
    /// Navigation / CDP request timeout. Default: 30.
    pub page_timeout_secs: Option<u64>,
}

impl BrowserSettings {
    /// JSON field → `APPLY_SCOUT_HEADLESS` → `false`.
    pub fn resolve_headless(&self) -> bool {
        if let Some(b) = self.headless {
            return b;
        }
        env_flag(ENV_HEADLESS).unwrap_or(false)
    }

    /// JSON field → `APPLY_SCOUT_DEBUG_PORT` → `None`.
    pub fn resolve_debug_port(&self) -> Option<u16> {
        self.debug_port.or_else(|| {
            std::env::var(ENV_DEBUG_PORT)
                .ok()
                .and_then(|v| v.trim().parse::<u16>().ok())
        })
    }

    /// JSON field → `CHROME_EXECUTABLE` → `None` (auto-discovery).
    ///
    /// Only returns paths that exist.
    pub fn resolve_chrome_executable(&self) -> Option<String> {
        let raw = self
            .chrome_executable
            .clone()
            .or_else(|| std::env::var(ENV_CHROME_EXECUTABLE).ok())?;
        let p = raw.trim();
        if !p.is_empty() && Path::new(p).exists() {
            Some(p.to_string())
        } else {
            None
        }
    }

    pub fn resolve_page_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.page_timeout_secs.unwrap_or(30))
    }
}

/// Questionnaire answer bank.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct AnswerSettings {
    pub salary: Option<String>,
    pub language_level: Option<String>,
    pub years_experience: Option<String>,
    pub cover_letter: Option<String>,
    pub default_text: Option<String>,
}

impl AnswerSettings {
    /// Salary expectation with every non-digit stripped: JSON → `APPLY_SCOUT_SALARY` → 1900.
    ///
    /// `"R$ 2.500,00"` becomes `"250000"`, so operators should configure whole units.
    pub fn resolve_salary(&self) -> String {
        let raw = self
            .salary
            .clone()
            .or_else(|| std::env::var(ENV_SALARY).ok())
            .unwrap_or_default();
        let digits = sanitize_salary(&raw);
        if digits.is_empty() {
            DEFAULT_SALARY.to_string()
        } else {
            digits
        }
    }

    pub fn resolve_language_level(&self) -> String {
        non_empty(self.language_level.clone())
            .or_else(|| non_empty(std::env::var(ENV_LANGUAGE_LEVEL).ok()))
            .unwrap_or_else(|| DEFAULT_LANGUAGE_LEVEL.to_string())
    }

    pub fn resolve_years_experience(&self) -> String {
        non_empty(self.years_experience.clone())
            .filter(|v| v.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or_else(|| DEFAULT_YEARS_EXPERIENCE.to_string())
    }

    pub fn resolve_cover_letter(&self) -> String {
        non_empty(self.cover_letter.clone()).unwrap_or_else(|| DEFAULT_COVER_LETTER.to_string())
    }

    pub fn resolve_default_text(&self) -> String {
        non_empty(self.default_text.clone()).unwrap_or_else(|| DEFAULT_GENERIC_ANSWER.to_string())
    }
}

/// Search defaults; `start` criteria may override region, distance and sort.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct SearchSettings {
    pub region: Option<String>,
    pub distance_km: Option<u32>,
    pub one_click_only: Option<bool>,
    pub sort: Option<SortOrder>,
}

impl SearchSettings {
    pub fn resolve_region(&self) -> String {
        non_empty(self.region.clone()).unwrap_or_else(|| DEFAULT_REGION.to_string())
    }

    pub fn resolve_distance_km(&self) -> Option<u32> {
        match self.distance_km {
            Some(0) => None,
            Some(d) => Some(d),
            None => Some(25),
        }
    }

    pub fn resolve_one_click_only(&self) -> bool {
        self.one_click_only.unwrap_or(true)
    }

    pub fn resolve_sort(&self) -> SortOrder {
        self.sort.unwrap_or_default()
    }
}

/// Pause between postings, drawn uniformly from `[min_secs, max_secs]`.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct PacingSettings {
    pub min_secs: Option<u64>,
    pub max_secs: Option<u64>,
    /// Skip the pause when the last posting already took longer than this.
    pub skip_after_secs: Option<u64>,
}

impl PacingSettings {
    pub fn resolve_range(&self) -> (u64, u64) {
        let min = self.min_secs.unwrap_or(15);
        let max = self.max_secs.unwrap_or(25).max(min);
        (min, max)
    }

    pub fn resolve_skip_after(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.skip_after_secs.unwrap_or(30))
    }
}

/// Top-level config loaded from `apply-scout.json`.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct AutomationConfig {
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default)]
    pub answers: AnswerSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub pacing: PacingSettings,
    pub save_on_discard: Option<bool>,
    pub duplicate_window_days: Option<i64>,
    pub screenshot_dir: Option<PathBuf>,
    pub debug_html_dir: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    /// Captcha-solver key. Read and reported at startup; the default flow hands
    /// challenges to the operator instead of a solver.
    pub captcha_api_key: Option<String>,
}

impl AutomationConfig {
    /// JSON field → `APPLY_SCOUT_SAVE_ON_DISCARD` → `false` (click "Discard").
    pub fn resolve_save_on_discard(&self) -> bool {
        if let Some(b) = self.save_on_discard {
            return b;
        }
        env_flag(ENV_SAVE_ON_DISCARD).unwrap_or(false)
    }

    pub fn resolve_duplicate_window_days(&self) -> i64 {
        self.duplicate_window_days
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_DUPLICATE_WINDOW_DAYS)
    }

    pub fn resolve_screenshot_dir(&self) -> PathBuf {
        self.screenshot_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("screenshots"))
    }

    pub fn resolve_debug_html_dir(&self) -> PathBuf {
        self.debug_html_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("debug_html"))
    }

    /// JSON field → `APPLY_SCOUT_DB` → `./apply_scout.db`.
    pub fn resolve_database_path(&self) -> PathBuf {
        if let Some(p) = &self.database_path {
            return p.clone();
        }
        std::env::var(ENV_DATABASE)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("apply_scout.db"))
    }

    /// JSON field → `CAPTCHA_API_KEY` → `None`. Never logged.
    pub fn resolve_captcha_api_key(&self) -> Option<String> {
        non_empty(self.captcha_api_key.clone())
            .or_else(|| non_empty(std::env::var(ENV_CAPTCHA_API_KEY).ok()))
    }
}

/// Load `apply-scout.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `APPLY_SCOUT_CONFIG` env var path
/// 2. `./apply-scout.json`
/// 3. `../apply-scout.json`
///
/// Missing file → `AutomationConfig::default()` (all env-var fallbacks apply).
/// Parse error → log a warning, return `AutomationConfig::default()`.
pub fn load_automation_config() -> AutomationConfig {
    let candidates: Vec<PathBuf> = {
        let mut v = vec![
            PathBuf::from("apply-scout.json"),
            PathBuf::from("../apply-scout.json"),
        ];
        if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
            v.insert(0, PathBuf::from(env_path));
        }
        v
    };

    for path in &candidates {
        let Ok(contents) = std::fs::read_to_string(path) else {
            continue;
        };
        return match serde_json::from_str::<AutomationConfig>(&contents) {
            Ok(cfg) => {
                tracing::info!("apply-scout.json loaded from {}", path.display());
                cfg
            }
            Err(e) => {
                tracing::warn!(
                    "apply-scout.json parse error at {}: {}; using defaults",
                    path.display(),
                    e
                );
                AutomationConfig::default()
            }
        };
    }

    AutomationConfig::default()
}

pub fn sanitize_salary(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn env_flag(key: &str) -> Option<bool> {
    let v = std::env::var(key).ok()?;
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
