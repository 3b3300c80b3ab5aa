//! # Global Hook Attachment
//!
//! Process-wide capture of failures nobody handled: a panic hook that feeds
//! panics through the pipeline with a persistent notification, chaining to
//! whatever hook was installed before.
//!
//! Attachment happens at most once per process. A second call is a no-op,
//! so composition roots can call [`install_global_hooks`] unconditionally
//! without double-registering.

use keel_core::DisplayOverride;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::handler::ErrorPipeline;

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Installs the process-wide panic hook, feeding panics through `handle`
/// with `persistent: true`. Idempotent: returns `true` only for the call
/// that actually installed; later calls return `false` and change nothing.
///
/// The previously installed hook still runs afterwards, so default panic
/// output (and anything the host installed) is preserved.
pub fn install_global_hooks(pipeline: Arc<ErrorPipeline>) -> bool {
    if INSTALLED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        debug!("global hooks already installed, skipping");
        return false;
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let payload = panic_info.payload();
        let message = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "panic with non-string payload".to_string()
        };
        let message = match panic_info.location() {
            Some(location) => format!(
                "Unhandled panic at {}:{}: {message}",
                location.file(),
                location.line()
            ),
            None => format!("Unhandled panic: {message}"),
        };

        pipeline.handle(
            message,
            Some(DisplayOverride {
                persistent: Some(true),
                ..Default::default()
            }),
        );

        previous(panic_info);
    }));

    info!("global panic hook installed");
    true
}

/// Whether the hooks have been installed in this process.
pub fn hooks_installed() -> bool {
    INSTALLED.load(Ordering::SeqCst)
}

// =============================================================================
// Unit Tests
// =============================================================================
