#![forbid(unsafe_code)]

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use filegate_core::{AdmissionRuntime, BlobStore, RandKeyMinter};
use filegate_relay::http::{self, AppState};
use filegate_relay::lifecycle::{DRAIN_MAX, FLUSH_INTERVAL, SHUTDOWN_ACK_DELAY};
use filegate_relay::{
    HttpBlobStore, Lifecycle, LifecyclePhase, RelayService, ServiceConfig, ShutdownHandle,
};
use filegate_storage::SnapshotStore;
use tokio::sync::Mutex;

fn main() {
    if let Err(err) = run() {
        eprintln!("filegate_http: {err}");
        std::process::exit(2);
    }
}

#[tokio::main]
async fn run() -> Result<(), String> {
    let config = ServiceConfig::from_args(env::args().skip(1))?;
    let lifecycle = Lifecycle::new();
    lifecycle.advance(LifecyclePhase::Loading);

    // The ledger must be loaded before any traffic is accepted; an
    // untrusted snapshot aborts startup.
    let store = SnapshotStore::new(config.statefile.clone());
    let ledger = store.load().map_err(|err| err.to_string())?;
    println!(
        "filegate_http loaded {} key(s) from '{}'",
        ledger.len(),
        config.statefile.display()
    );
    let ledger = Arc::new(Mutex::new(ledger));

    // Dirty-gated flush pass on a fixed cadence, started before the
    // listener binds.
    let flush_store = store.clone();
    let flush_ledger = ledger.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(FLUSH_INTERVAL);
        loop {
            ticker.tick().await;
            let mut ledger = flush_ledger.lock().await;
            if let Err(err) = flush_store.flush_if_dirty(&mut ledger) {
                eprintln!("filegate_http flush pass failed: {err}");
            }
        }
    });

    let blob_store: Arc<dyn BlobStore> = Arc::new(HttpBlobStore::new(
        &config.endpoint,
        &config.userid,
        &config.password,
        config.provider_timeout_ms,
    )?);
    let shutdown = ShutdownHandle::new();
    let service = Arc::new(RelayService::new(
        ledger.clone(),
        AdmissionRuntime::new(config.limits),
        Arc::new(RandKeyMinter),
        blob_store,
        config.password.clone(),
        shutdown.clone(),
        SHUTDOWN_ACK_DELAY,
    ));
    let app = http::router(AppState {
        service,
        lifecycle: lifecycle.clone(),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| format!("failed to bind {addr}: {err}"))?;
    lifecycle.advance(LifecyclePhase::Serving);
    println!("filegate_http listening on http://{addr}");

    let serve = axum::serve(listener, app)
        .with_graceful_shutdown(drain_signal(shutdown.clone(), lifecycle.clone()));
    let drained = tokio::select! {
        result = serve => {
            if let Err(err) = result {
                // Redirect top-level serve failures into the drain path
                // instead of crashing with unsaved state.
                eprintln!("filegate_http serve loop failed: {err}");
            }
            true
        }
        _ = drain_deadline(shutdown.clone()) => false,
    };
    if !drained {
        eprintln!(
            "filegate_http could not close connections within {}s; exiting",
            DRAIN_MAX.as_secs()
        );
        std::process::exit(1);
    }

    // Unconditional final flush, regardless of the dirty flag.
    lifecycle.advance(LifecyclePhase::Draining);
    let mut guard = ledger.lock().await;
    store
        .flush(&mut guard)
        .map_err(|err| format!("final snapshot flush failed: {err}"))?;
    lifecycle.advance(LifecyclePhase::Stopped);
    println!(
        "filegate_http stopped; snapshot flushed to '{}'",
        config.statefile.display()
    );
    Ok(())
}

async fn drain_signal(shutdown: ShutdownHandle, lifecycle: Lifecycle) {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            // If the hook cannot install, the shutdown route still drains us.
            std::future::pending::<()>().await;
        }
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = shutdown.triggered() => {}
    }
    // Whatever woke us, the drain marker starts the teardown budget.
    shutdown.trigger();
    lifecycle.advance(LifecyclePhase::Draining);
    println!("filegate_http draining: no longer accepting new connections");
}

async fn drain_deadline(shutdown: ShutdownHandle) {
    shutdown.triggered().await;
    tokio::time::sleep(DRAIN_MAX).await;
}
