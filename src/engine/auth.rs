//! `AUTH`: reuse a live session, otherwise log in, and hand any security
//! challenge to the human at the browser.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use super::events::{LogLevel, RunObserver};
use super::selectors::SelectorPolicy;
use super::state::{log_state, FlowState};
use crate::browser::{jitter_ms, wait_for, PageDriver, POLL_INTERVAL};
use crate::core::error::AutomationError;

/// How long a human gets to clear a checkpoint or captcha.
pub const CHALLENGE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Grace period for the profile affordance on an already-authenticated feed.
const SESSION_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

fn url_has_any(url: &str, markers: &[String]) -> bool {
    let u = url.to_lowercase();
    markers.iter().any(|m| u.contains(m.as_str()))
}

fn source_has_any(source: &str, tokens: &[String]) -> bool {
    let s = source.to_lowercase();
    tokens.iter().any(|t| s.contains(t.as_str()))
}

pub fn is_logged_in_url(policy: &SelectorPolicy, url: &str) -> bool {
    url_has_any(url, &policy.logged_in_url_markers) && !url_has_any(url, &policy.challenge_url_markers)
}

pub fn is_challenge(policy: &SelectorPolicy, url: &str, source: &str) -> bool {
    if url_has_any(url, &policy.challenge_url_markers) {
        return true;
    }
    !is_logged_in_url(policy, url) && source_has_any(source, &policy.challenge_page_tokens)
}

/// Wait, without cancellation, until the challenge is gone. Only the first
/// challenge of a login reaches the run log.
async fn wait_out_challenge(
    driver: &dyn PageDriver,
    policy: &SelectorPolicy,
    observer: &dyn RunObserver,
    announce: bool,
) -> Result<(), AutomationError> {
    if announce {
        observer.log(
            LogLevel::Warning,
            "⚠️ Verificação de segurança detectada. Resolva o desafio no navegador (até 5 minutos).",
        );
    }
    let cleared = wait_for(CHALLENGE_TIMEOUT, move || async move {
        if driver.is_closed() {
            return Some(false);
        }
        let url = driver.current_url().await.unwrap_or_default();
        let source = driver.page_source().await.unwrap_or_default();
        (!is_challenge(policy, &url, &source)).then_some(true)
    })
    .await;

    match cleared {
        Some(true) => {
            if announce {
                observer.log(LogLevel::Success, "✅ Verificação concluída, retomando automação.");
            } else {
                debug!("auth: repeated challenge cleared");
            }
            Ok(())
        }
        Some(false) => Err(AutomationError::SessionLost),
        None => {
            log_state(FlowState::Aborted);
            Err(AutomationError::ChallengeTimeout(CHALLENGE_TIMEOUT))
        }
    }
}

pub async fn authenticate(
    driver: &dyn PageDriver,
    policy: &SelectorPolicy,
    credentials: &LoginCredentials,
    observer: &dyn RunObserver,
    page_timeout: Duration,
) -> Result<(), AutomationError> {
    log_state(FlowState::Auth);

    driver.goto(&policy.feed_url).await?;
    if driver
        .wait_any(&policy.profile_markers, SESSION_PROBE_TIMEOUT)
        .await
        .is_some()
    {
        observer.log(LogLevel::Info, "🔐 Sessão do LinkedIn já autenticada.");
        return Ok(());
    }
    if driver.is_closed() {
        return Err(AutomationError::SessionLost);
    }

    observer.log(LogLevel::Info, "🔐 Iniciando login no LinkedIn...");
    driver.goto(&policy.login_url).await?;

    if !driver
        .wait_type_humanised(&policy.username_input, &credentials.username, page_timeout)
        .await
    {
        return Err(login_field_error(driver, "login username field"));
    }
    if !driver
        .wait_type_humanised(&policy.password_input, &credentials.password, page_timeout)
        .await
    {
        return Err(login_field_error(driver, "login password field"));
    }
    let pause = jitter_ms(1500, 3000) as f64 / 1000.0;
    driver.safe_sleep(pause, "before login submit").await;
    if !driver.wait_click(&policy.login_submit, page_timeout).await {
        return Err(login_field_error(driver, "login submit button"));
    }

    let mut deadline = Instant::now() + page_timeout;
    let mut challenge_seen = false;
    loop {
        let url = driver.current_url().await?;
        if is_logged_in_url(policy, &url) {
            observer.log(LogLevel::Success, "✅ Login realizado com sucesso.");
            return Ok(());
        }
        let source = driver.page_source().await?;
        if is_challenge(policy, &url, &source) {
            if challenge_seen {
                debug!("auth: challenge reappeared at {}", url);
            }
            wait_out_challenge(driver, policy, observer, !challenge_seen).await?;
            challenge_seen = true;
            deadline = Instant::now() + page_timeout;
            continue;
        }
        if source_has_any(&source, &policy.credential_error_phrases) {
            log_state(FlowState::Aborted);
            observer.log(LogLevel::Error, "❌ Login recusado: verifique usuário e senha.");
            return Err(AutomationError::LoginRejected(
                "credential error shown on login page".into(),
            ));
        }
        if Instant::now() >= deadline {
            log_state(FlowState::Aborted);
            info!("auth: no post-login redirect; last url {}", url);
            return Err(AutomationError::SelectorTimeout("post-login redirect".into()));
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn login_field_error(driver: &dyn PageDriver, label: &str) -> AutomationError {
    log_state(FlowState::Aborted);
    if driver.is_closed() {
        AutomationError::SessionLost
    } else {
        AutomationError::SelectorTimeout(label.into())
    }
}
