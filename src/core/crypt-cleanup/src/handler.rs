//! Signal handler installation.

use std::io;
use std::ptr;

use tracing::debug;

use crate::context::SecurityContext;
use crate::error::CleanupError;

/// Signals that trigger cleanup before termination.
pub const CLEANUP_SIGNALS: [libc::c_int; 3] = [libc::SIGINT, libc::SIGTERM, libc::SIGQUIT];

/// Arms the global [`SecurityContext`] and installs the cleanup handler.
///
/// The handler is one-shot (`SA_RESETHAND`) and does not ask for interrupted
/// reads to be restarted. All cleanup signals are blocked while it runs, so a
/// second signal stays pending until the first has been re-raised.
///
/// Signals that were already ignored when the process started (as a shell
/// does for background jobs) keep their `SIG_IGN` disposition.
///
/// # Errors
///
/// Returns [`CleanupError::Install`] if `sigaction` fails for any signal.
pub fn install() -> Result<&'static SecurityContext, CleanupError> {
    let context = SecurityContext::global();
    context.arm();

    let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
    action.sa_sigaction = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
    action.sa_flags = libc::SA_RESETHAND;

    unsafe {
        libc::sigemptyset(&mut action.sa_mask);
        for signal in CLEANUP_SIGNALS {
            libc::sigaddset(&mut action.sa_mask, signal);
        }
    }

    for signal in CLEANUP_SIGNALS {
        if is_ignored(signal)? {
            debug!(signal, "signal ignored by parent, leaving it alone");
            continue;
        }

        if unsafe { libc::sigaction(signal, &action, ptr::null_mut()) } != 0 {
            return Err(CleanupError::Install {
                signal,
                source: io::Error::last_os_error(),
            });
        }
        debug!(signal, "cleanup handler installed");
    }

    Ok(context)
}

/// Whether `signal` is currently set to `SIG_IGN`.
fn is_ignored(signal: libc::c_int) -> Result<bool, CleanupError> {
    let mut current: libc::sigaction = unsafe { std::mem::zeroed() };
    if unsafe { libc::sigaction(signal, ptr::null(), &mut current) } != 0 {
        return Err(CleanupError::Install {
            signal,
            source: io::Error::last_os_error(),
        });
    }
    Ok(current.sa_sigaction == libc::SIG_IGN)
}

extern "C" fn on_signal(signal: libc::c_int) {
    SecurityContext::global().fire();

    // Pending until this handler returns, then delivered with the default
    // disposition.
    unsafe {
        libc::signal(signal, libc::SIG_DFL);
        libc::raise(signal);
    }
}
