use std::sync::atomic::{AtomicBool, Ordering};

use console::Term;

/// Set by the first Ctrl+C.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

#[inline]
pub(crate) fn is_shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::Acquire)
}

#[inline]
fn request_shutdown() {
    SHUTDOWN_REQUESTED.store(true, Ordering::Release);
}

/// Install the Ctrl+C handler.
///
/// The first Ctrl+C asks running syncs to pause at their next checkpoint so
/// the ledger row is finalized. A second one exits immediately with 130.
pub(crate) fn setup_shutdown_handler() {
    tokio::spawn(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            return;
        }

        let is_tty = Term::stdout().is_term();
        if is_tty {
            eprintln!("\n\nPause requested, finishing the current step...");
            eprintln!("Press Ctrl+C again to force quit.");
        } else {
            tracing::warn!("Pause requested, finishing the current step");
        }

        request_shutdown();

        if tokio::signal::ctrl_c().await.is_ok() {
            if is_tty {
                eprintln!("Force quit!");
            }
            std::process::exit(130);
        }
    });
}
