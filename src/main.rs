// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use axum_server::{tls_rustls::RustlsConfig, Handle};
use chrono::Utc;
use tracing::{error, info, warn};

use gatehouse::{
    api,
    auth::{Authenticator, KeyStore, ROLE_ADMIN, ROLE_USER},
    config::Config,
    logging,
    models::NewUser,
    state::AppState,
    store::InMemoryUserStore,
};

const ISSUER: &str = "gatehouse";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "startup failed");
        eprintln!("gatehouse: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let cfg = Config::from_env()?;
    logging::init(cfg.log_format);

    info!(build = %cfg.build, "starting service");

    // =========================================================================
    // Authentication
    // =========================================================================
    let keys = KeyStore::from_dir(&cfg.keys_folder)?;
    info!(
        folder = %cfg.keys_folder.display(),
        kids = ?keys.kids(),
        active_kid = %cfg.active_kid,
        "key store loaded"
    );
    let auth = Arc::new(Authenticator::new(Arc::new(keys), cfg.active_kid.clone())?);

    // =========================================================================
    // User store
    // =========================================================================
    let users = InMemoryUserStore::new(ISSUER);
    if let Some(seed) = &cfg.seed_admin {
        let admin = users.insert(
            NewUser {
                name: "Admin".to_string(),
                email: seed.email.clone(),
                roles: vec![ROLE_ADMIN.to_string(), ROLE_USER.to_string()],
                password: seed.password.clone(),
            },
            Utc::now(),
        )?;
        info!(id = %admin.id, email = %admin.email, "seeded admin user");
    }

    let state = AppState::new(cfg.build.clone(), auth, Arc::new(users));

    // =========================================================================
    // Debug listener
    // =========================================================================
    let debug_router = api::debug_mux(state.clone());
    let debug_host = cfg.debug_host;
    tokio::spawn(async move {
        info!(addr = %debug_host, "debug listener started");
        if let Err(e) = axum_server::bind(debug_host)
            .serve(debug_router.into_make_service())
            .await
        {
            error!(error = %e, "debug listener closed");
        }
    });

    // =========================================================================
    // API listener
    // =========================================================================
    let app = api::api_mux(state.clone(), cfg.write_timeout)
        .into_make_service_with_connect_info::<SocketAddr>();
    let handle = Handle::new();

    let mut server = match &cfg.tls {
        Some(tls) => {
            // Must be installed before any TLS operation.
            if rustls::crypto::ring::default_provider().install_default().is_err() {
                warn!("rustls crypto provider already installed");
            }
            let tls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path).await?;
            info!(addr = %cfg.api_host, "API listening on https (docs at /docs)");
            tokio::spawn(
                axum_server::bind_rustls(cfg.api_host, tls_config)
                    .handle(handle.clone())
                    .serve(app),
            )
        }
        None => {
            info!(addr = %cfg.api_host, "API listening on http (docs at /docs)");
            tokio::spawn(
                axum_server::bind(cfg.api_host)
                    .handle(handle.clone())
                    .serve(app),
            )
        }
    };

    // =========================================================================
    // Shutdown
    // =========================================================================
    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        }
        reason = shutdown_requested(&state) => {
            info!(%reason, "shutdown started");
        }
    }

    handle.graceful_shutdown(Some(cfg.shutdown_timeout));
    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "server stopped with error"),
        Err(e) => warn!(error = %e, "server task failed"),
    }

    info!("service stopped");
    Ok(())
}

/// Resolves on SIGINT, SIGTERM or a pipeline shutdown signal.
async fn shutdown_requested(state: &AppState) -> String {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "listening for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "listening for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT".to_string(),
        _ = terminate => "SIGTERM".to_string(),
        _ = state.shutdown.signalled() => state
            .shutdown
            .reason()
            .unwrap_or("integrity error")
            .to_string(),
    }
}
