use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use apply_scout::browser::{CdpLauncher, Diagnostics};
use apply_scout::core::config::load_automation_config;
use apply_scout::{api, AppState, Database, Supervisor};

/// How long shutdown waits for a live run to release the browser.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(20);

fn parse_port_from_args() -> Option<u16> {
    let mut args = std::env::args().peekable();
    while let Some(a) = args.next() {
        if a == "--port" {
            if let Some(v) = args.next() {
                if let Ok(p) = v.parse::<u16>() {
                    return Some(p);
                }
            }
        } else if let Some(rest) = a.strip_prefix("--port=") {
            if let Ok(p) = rest.parse::<u16>() {
                return Some(p);
            }
        }
    }
    None
}

fn port_from_env() -> Option<u16> {
    for k in ["APPLY_SCOUT_PORT", "PORT"] {
        if let Ok(v) = std::env::var(k) {
            if let Ok(p) = v.trim().parse::<u16>() {
                return Some(p);
            }
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=warn"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    info!("Starting apply-scout");

    let config = Arc::new(load_automation_config());
    if config.resolve_captcha_api_key().is_some() {
        info!("Captcha-solver key configured (unused; challenges are handed to the operator)");
    } else {
        info!("No captcha-solver key configured");
    }

    let db_path = config.resolve_database_path();
    let db = Database::open(&db_path)?;
    info!("Database ready at {}", db_path.display());

    let diagnostics = Arc::new(Diagnostics::new(
        config.resolve_screenshot_dir(),
        config.resolve_debug_html_dir(),
    ));
    let supervisor = Arc::new(Supervisor::new(
        Arc::new(CdpLauncher),
        db.clone(),
        Arc::clone(&config),
        diagnostics,
    ));

    let state = AppState::new(db, Arc::clone(&supervisor)).with_config(config);
    let app = api::router(state);

    let port: u16 = parse_port_from_args()
        .or_else(port_from_env)
        .unwrap_or(5000);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            anyhow::bail!(
                "Address already in use: {}. Stop the existing process or run with --port {} (or set PORT/APPLY_SCOUT_PORT).",
                bind_addr,
                port.saturating_add(1)
            )
        }
        Err(e) => return Err(e.into()),
    };
    info!("apply-scout listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(supervisor))
        .await?;

    Ok(())
}

async fn shutdown_signal(supervisor: Arc<Supervisor>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).ok();
        let mut sigint = signal(SignalKind::interrupt()).ok();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = async {
                if let Some(ref mut s) = sigterm {
                    s.recv().await;
                } else {
                    futures::future::pending::<()>().await;
                }
            } => {},
            _ = async {
                if let Some(ref mut s) = sigint {
                    s.recv().await;
                } else {
                    futures::future::pending::<()>().await;
                }
            } => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("Shutdown requested");
    supervisor.shutdown(SHUTDOWN_GRACE).await;
}
