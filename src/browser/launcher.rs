//! Finding, configuring and attaching to the Chromium that drives a run.

use anyhow::{anyhow, Result};
use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::handler::viewport::Viewport;
use rand::seq::IndexedRandom;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ── User agents ──────────────────────────────────────────────────────────────

/// `(platform token, Chrome major, Edge suffix)`. LinkedIn serves the same
/// Easy Apply markup to all of these.
const UA_PROFILES: &[(&str, u32, bool)] = &[
    ("Windows NT 10.0; Win64; x64", 132, false),
    ("Macintosh; Intel Mac OS X 10_15_7", 132, false),
    ("X11; Linux x86_64", 131, false),
    ("Windows NT 10.0; Win64; x64", 132, true),
];

fn user_agent(platform: &str, major: u32, edge: bool) -> String {
    let mut ua = format!(
        "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{}.0.0.0 Safari/537.36",
        platform, major
    );
    if edge {
        ua.push_str(&format!(" Edg/{}.0.0.0", major));
    }
    ua
}

/// A desktop Chromium user agent. Never a Firefox or Safari one: the engine
/// underneath is always Chromium.
pub fn random_user_agent() -> String {
    let mut rng = rand::rng();
    let (platform, major, edge) = UA_PROFILES
        .choose(&mut rng)
        .copied()
        .unwrap_or(UA_PROFILES[0]);
    user_agent(platform, major, edge)
}

// ── Executable discovery ─────────────────────────────────────────────────────

const PATH_NAMES: &[&str] = &["google-chrome", "chromium", "chromium-browser", "microsoft-edge", "chrome"];

#[cfg(target_os = "macos")]
const INSTALL_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
];
#[cfg(target_os = "linux")]
const INSTALL_PATHS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
];
#[cfg(target_os = "windows")]
const INSTALL_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
];
#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
const INSTALL_PATHS: &[&str] = &[];

fn path_candidates() -> Vec<PathBuf> {
    let Some(path_var) = std::env::var_os("PATH") else {
        return Vec::new();
    };
    std::env::split_paths(&path_var)
        .flat_map(|dir| PATH_NAMES.iter().map(move |exe| dir.join(exe)))
        .collect()
}

/// Chrome, Chromium or Edge: the configured path if it exists, then `PATH`,
/// then the usual install locations.
pub fn find_chrome_executable(explicit: Option<&str>) -> Option<String> {
    explicit
        .map(PathBuf::from)
        .into_iter()
        .chain(path_candidates())
        .chain(INSTALL_PATHS.iter().map(PathBuf::from))
        .find(|p| p.exists())
        .map(|p| p.to_string_lossy().into_owned())
}

// ── Launch config builder ────────────────────────────────────────────────────

/// Build a `BrowserConfig` for an application run.
///
/// The profile directory is disposable and owned by the caller. Notifications,
/// infobars and the popup blocker are disabled; `navigator.webdriver` is hidden
/// with `--disable-blink-features=AutomationControlled`.
pub fn build_launch_config(
    exe: &str,
    profile_dir: &Path,
    headless: bool,
    request_timeout: Duration,
) -> Result<BrowserConfig> {
    let ua = random_user_agent();
    let (width, height) = (1366, 900);

    let mut builder = BrowserConfig::builder()
        .chrome_executable(exe)
        .user_data_dir(profile_dir)
        .request_timeout(request_timeout)
        .viewport(Viewport {
            width,
            height,
            device_scale_factor: Some(1.0),
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        })
        .window_size(width, height)
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--disable-infobars")
        .arg("--disable-notifications")
        .arg("--disable-popup-blocking")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-blink-features=AutomationControlled")
        .arg("--lang=pt-BR")
        .arg(format!("--user-agent={}", ua));

    if !headless {
        builder = builder.with_head();
    }

    builder
        .build()
        .map_err(|e| anyhow!("Failed to build browser config: {}", e))
}

/// Discover the CDP websocket of a browser exposing `127.0.0.1:<port>`.
pub async fn discover_ws_endpoint(port: u16) -> Result<String> {
    let json_url = format!("http://127.0.0.1:{}/json/version", port);
    let response = reqwest::get(&json_url)
        .await
        .map_err(|e| anyhow!("HTTP request failed: {}", e))?;
    let json: serde_json::Value = response
        .json()
        .await
        .map_err(|e| anyhow!("JSON parse failed: {}", e))?;
    json["webSocketDebuggerUrl"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow!("No webSocketDebuggerUrl in response"))
}
