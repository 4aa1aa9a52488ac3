#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

use jobboard_server::api::MgmtState;
use jobboard_server::config::Config;
use jobboard_server::{App, Stores, telemetry};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    let telemetry_guard = telemetry::init_telemetry(&config.telemetry)?;

    jobboard_server::setup_panic_hook();

    let boot_span = tracing::info_span!("boot_server");
    let (api_listener, mgmt_listener, app_router, mgmt_app) = async {
        let stores = Stores::from_config(&config).await?;
        let app = App::new(&config, stores);

        let app_router = jobboard_server::api::app_router(&config, app.services);
        let mgmt_app = jobboard_server::api::mgmt_router(MgmtState { health_service: app.health_service });

        let api_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
        let mgmt_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.mgmt_port).parse()?;

        let api_listener = TcpListener::bind(api_addr).await?;
        let mgmt_listener = TcpListener::bind(mgmt_addr).await?;

        tracing::info!(address = %api_addr, "listening");
        tracing::info!(address = %mgmt_addr, "management server listening");

        Ok::<(TcpListener, TcpListener, axum::Router, axum::Router), anyhow::Error>((
            api_listener,
            mgmt_listener,
            app_router,
            mgmt_app,
        ))
    }
    .instrument(boot_span)
    .await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    jobboard_server::spawn_signal_handler(shutdown_tx);

    let mut api_rx = shutdown_rx.clone();
    let api_server = axum::serve(api_listener, app_router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            let _ = api_rx.wait_for(|&s| s).await;
        });

    let mut mgmt_rx = shutdown_rx.clone();
    let mgmt_server = axum::serve(mgmt_listener, mgmt_app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            let _ = mgmt_rx.wait_for(|&s| s).await;
        });

    let servers = async {
        if let Err(e) = tokio::try_join!(api_server, mgmt_server) {
            tracing::error!(error = %e, "Server error");
        }
    };

    // Draining starts once the signal fires; cap it at the configured timeout.
    let drain_timeout = Duration::from_secs(config.server.shutdown_timeout_secs);
    let mut drain_rx = shutdown_rx;
    let drain_deadline = async move {
        let _ = drain_rx.wait_for(|&s| s).await;
        tokio::time::sleep(drain_timeout).await;
    };

    tokio::select! {
        () = servers => tracing::info!("Servers stopped"),
        () = drain_deadline => tracing::warn!("Timed out waiting for in-flight requests to finish"),
    }

    telemetry_guard.shutdown();
    Ok(())
}
