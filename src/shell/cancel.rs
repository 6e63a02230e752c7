//! Run-wide cancellation.
//!
//! A [`CancelToken`] is polled by [`execute`](super::execute) while a child
//! runs. Tokens created with [`CancelToken::for_process`] also observe
//! SIGINT/SIGTERM once [`install_signal_handlers`] has been called.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    follows_signals: bool,
}

impl CancelToken {
    /// A token that is only cancelled explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that is also cancelled by SIGINT/SIGTERM.
    pub fn for_process() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            follows_signals: true,
        }
    }

    /// Request cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst) || (self.follows_signals && interrupted())
    }
}

/// Whether a termination signal has been received.
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

#[cfg(unix)]
extern "C" fn on_signal(_signal: libc::c_int) {
    // A second signal while the first is being handled exits immediately.
    if INTERRUPTED.swap(true, Ordering::SeqCst) {
        // SAFETY: _exit is async-signal-safe.
        unsafe { libc::_exit(130) };
    }
}

/// Route SIGINT and SIGTERM to the process-wide interrupt flag.
///
/// The first signal lets the in-flight command be killed and the run wind
/// down; a second one exits immediately.
pub fn install_signal_handlers() {
    #[cfg(unix)]
    {
        let handler = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
        // SAFETY: the handler only touches an atomic and calls _exit.
        unsafe {
            libc::signal(libc::SIGINT, handler);
            libc::signal(libc::SIGTERM, handler);
        }
    }
}
