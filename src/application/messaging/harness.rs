//! Isolation harness - contains plugin handler failures

use std::backtrace::Backtrace;
use std::panic::{self, AssertUnwindSafe};

use crate::application::errors::PluginError;
use crate::domain::entities::EventName;

/// Invoke one plugin handler, containing both error returns and panics.
///
/// On success the handler's value comes back in `Some`. On failure the
/// diagnostic is logged right here and the caller gets `None`, with
/// nothing else to do but move on to the next plugin.
pub fn invoke<T>(
    plugin: &str,
    event: EventName,
    thunk: impl FnOnce() -> Result<T, PluginError>,
) -> Option<T> {
    // AssertUnwindSafe: handlers are FnMut, so a panicking handler may
    // leave its own captured state torn. It stays registered regardless.
    match panic::catch_unwind(AssertUnwindSafe(thunk)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            report(plugin, event, &e.to_string());
            None
        }
        Err(payload) => {
            report(plugin, event, &panic_message(payload.as_ref()));
            None
        }
    }
}

/// One line per failure, backtrace captured where the failure surfaced.
fn report(plugin: &str, event: EventName, message: &str) {
    tracing::error!(
        backtrace = %Backtrace::force_capture(),
        "Module {} runtime error: {} in callback {}",
        plugin,
        message,
        event
    );
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
