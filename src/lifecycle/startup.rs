//! Startup orchestration.
//!
//! Bootstrap runs strictly before any listener accepts a connection:
//! backend choice, certificate bundle, then both listeners. The phase
//! machine is forward-only; a failure in any phase terminates the process.
//! In particular an unusable bundle aborts startup rather than serving
//! plaintext on the TLS port.

use std::net::{IpAddr, SocketAddr};

use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::BootstrapError;
use crate::http::{build_router, AppState};
use crate::lifecycle::shutdown;
use crate::tls;
use crate::tls::backend::CryptoBackend;
use crate::tls::store::CertificateBundle;

/// Bootstrap phases, in order. No transition goes backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Uninitialized,
    CertificateReady,
    ListenersBound,
    Serving,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Uninitialized => write!(f, "uninitialized"),
            Phase::CertificateReady => write!(f, "certificate-ready"),
            Phase::ListenersBound => write!(f, "listeners-bound"),
            Phase::Serving => write!(f, "serving"),
        }
    }
}

/// Tracks the current phase and logs each transition.
struct PhaseTracker(Phase);

impl PhaseTracker {
    fn new() -> Self {
        Self(Phase::Uninitialized)
    }

    fn advance(&mut self, next: Phase) {
        debug_assert!(next > self.0, "phase machine must move forward");
        self.0 = next;
        tracing::info!(phase = %next, "bootstrap phase");
    }
}

/// Full startup: choose a backend, ensure the bundle, serve both listeners.
///
/// Only returns once the listeners stop (shutdown signal) or with a fatal
/// error before Serving.
pub async fn run(config: ServerConfig) -> Result<(), BootstrapError> {
    let backend = tls::backend::choose(config.tls.backend)?;
    tracing::info!(backend = %backend, "crypto backend selected");

    let bundle = tls::ensure_bundle(&config.tls, &config.certificate, backend)?;
    serve(&config, &bundle, backend).await
}

/// Bind the plaintext and TLS listeners and serve until shutdown.
///
/// The bundle is re-checked on entry: a missing or unloadable bundle is a
/// fatal [`BootstrapError`], never a downgrade to plaintext-only serving.
pub async fn serve(
    config: &ServerConfig,
    bundle: &CertificateBundle,
    backend: CryptoBackend,
) -> Result<(), BootstrapError> {
    let mut phase = PhaseTracker::new();

    if !bundle.key_path.exists() || !bundle.cert_path.exists() {
        return Err(BootstrapError::BundleUnusable(format!(
            "{} / {} missing at startup",
            bundle.key_path.display(),
            bundle.cert_path.display()
        )));
    }
    phase.advance(Phase::CertificateReady);
    tracing::info!(
        key = %bundle.key_path.display(),
        cert = %bundle.cert_path.display(),
        not_before = %bundle.not_before,
        not_after = %bundle.not_after,
        "certificate bundle ready"
    );

    let host: IpAddr = config
        .listener
        .bind_host
        .parse()
        .map_err(|e| BootstrapError::Bind {
            addr: config.listener.bind_host.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("{e}")),
        })?;
    let plain_addr = SocketAddr::new(host, config.listener.plain_port);
    let tls_addr = SocketAddr::new(host, config.listener.tls_port);

    let app = build_router(AppState::new(
        backend,
        config.listener.plain_port,
        config.listener.tls_port,
    ));

    // The TLS stack rejects the material before any socket is opened.
    let rustls_config = RustlsConfig::from_pem_file(&bundle.cert_path, &bundle.key_path)
        .await
        .map_err(BootstrapError::Tls)?;

    // Plaintext listener binds eagerly so port conflicts surface here.
    let plain_listener = TcpListener::bind(plain_addr)
        .await
        .map_err(|source| BootstrapError::Bind {
            addr: plain_addr.to_string(),
            source,
        })?;

    phase.advance(Phase::ListenersBound);
    tracing::info!(
        plaintext = %plain_addr,
        tls = %tls_addr,
        backend = %backend,
        "listeners bound"
    );

    let tls_handle = axum_server::Handle::new();
    shutdown::forward_to_handle(tls_handle.clone());

    let plain_server =
        axum::serve(plain_listener, app.clone()).with_graceful_shutdown(shutdown::shutdown_signal());
    let tls_server = axum_server::bind_rustls(tls_addr, rustls_config)
        .handle(tls_handle)
        .serve(app.into_make_service());

    phase.advance(Phase::Serving);

    tokio::try_join!(
        async {
            plain_server.await.map_err(|source| BootstrapError::Bind {
                addr: plain_addr.to_string(),
                source,
            })
        },
        async {
            tls_server.await.map_err(|source| BootstrapError::Bind {
                addr: tls_addr.to_string(),
                source,
            })
        },
    )?;

    tracing::info!("listeners stopped");
    Ok(())
}
