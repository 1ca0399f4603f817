//! Session cookie persistence for the target site.
//!
//! On close the session writes the site's cookies to
//! `~/.apply-scout/sessions/{host_key}.json`; on the next open they are
//! injected before the first navigation so an existing login survives
//! between runs. Nothing here ever fails a run: every error is a warning.

use chromiumoxide::cdp::browser_protocol::network::{CookieParam, SetCookiesParams};
use std::path::PathBuf;
use tracing::{info, warn};

/// Filesystem-safe key derived from a bare hostname string.
fn host_to_key(host: &str) -> String {
    host.trim_start_matches("www.")
        .replace('.', "_")
        .replace(':', "_")
}

/// e.g. `https://www.linkedin.com/feed/` → `"linkedin_com"`
pub fn domain_key(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(host_to_key))
}

fn session_path_by_key(key: &str) -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(
        home.join(".apply-scout")
            .join("sessions")
            .join(format!("{}.json", key)),
    )
}

pub fn session_path(url: &str) -> Option<PathBuf> {
    session_path_by_key(&domain_key(url)?)
}

/// Keep only cookies whose domain belongs to `url`'s site.
pub fn cookies_for_site(raw: &[serde_json::Value], url: &str) -> Vec<serde_json::Value> {
    let Some(key) = domain_key(url) else {
        return Vec::new();
    };
    let site = key.replace('_', ".");
    raw.iter()
        .filter(|c| {
            c.get("domain")
                .and_then(|d| d.as_str())
                .map(|d| d.trim_start_matches('.').ends_with(&site))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// Load stored cookies for `url` as raw JSON values.
pub fn load_raw(url: &str) -> Option<Vec<serde_json::Value>> {
    let path = session_path(url)?;
    let contents = std::fs::read_to_string(&path).ok()?;
    let cookies: Vec<serde_json::Value> = serde_json::from_str(&contents).ok()?;
    if cookies.is_empty() {
        return None;
    }
    info!(
        "cookies: 🍪 loaded {} cookies ({})",
        cookies.len(),
        path.display()
    );
    Some(cookies)
}

/// Persist `raw` (already filtered to the site) for `url`.
pub fn save_raw(url: &str, raw: &[serde_json::Value]) {
    let Some(path) = session_path(url) else {
        return;
    };
    if raw.is_empty() {
        return;
    }
    if let Some(dir) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!("cookies: cannot create {}: {}", dir.display(), e);
            return;
        }
    }
    match serde_json::to_string_pretty(raw) {
        Ok(body) => match std::fs::write(&path, body) {
            Ok(()) => info!("cookies: 💾 saved {} cookies to {}", raw.len(), path.display()),
            Err(e) => warn!("cookies: failed to write {}: {}", path.display(), e),
        },
        Err(e) => warn!("cookies: failed to serialise jar: {}", e),
    }
}

/// Inject stored cookies into a live CDP page **before** navigation.
///
/// Individual cookies that fail to deserialise are skipped.
pub async fn inject_into_page(page: &chromiumoxide::Page, raw_cookies: &[serde_json::Value]) {
    let cookie_params: Vec<CookieParam> = raw_cookies
        .iter()
        .filter_map(|v| serde_json::from_value::<CookieParam>(v.clone()).ok())
        .collect();

    if cookie_params.is_empty() {
        warn!("cookies: stored jar contained no valid CookieParams; skipping injection");
        return;
    }

    let count = cookie_params.len();
    match page.execute(SetCookiesParams::new(cookie_params)).await {
        Ok(_) => info!("cookies: 💉 injected {} cookies", count),
        Err(e) => warn!("cookies: failed to inject cookies: {}", e),
    }
}

/// Read the page's cookies as raw JSON values.
pub async fn read_from_page(page: &chromiumoxide::Page) -> Vec<serde_json::Value> {
    match page.get_cookies().await {
        Ok(cookies) => cookies
            .into_iter()
            .filter_map(|c| serde_json::to_value(c).ok())
            .collect(),
        Err(e) => {
            warn!("cookies: failed to read cookies: {}", e);
            Vec::new()
        }
    }
}
