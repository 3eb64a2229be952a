// SPDX-License-Identifier: Apache-2.0

//! Signal handling: the main loop checks a volatile interrupt
//! flag after every pend-event call. Handlers only ever record which
//! signal arrived; all policy decisions happen back on the main
//! thread, since handlers must stay async-signal-safe.

use std::sync::atomic::{AtomicI32, Ordering};

use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

static RECEIVED_SIGNAL: AtomicI32 = AtomicI32::new(0);

extern "C" fn record_signal(sig: i32) {
    RECEIVED_SIGNAL.store(sig, Ordering::SeqCst);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalClass {
    /// SIGINT/SIGTERM/SIGQUIT/SIGHUP: the main loop notices the flag
    /// after its next pend-event call and exits cleanly.
    Graceful,
    /// SIGILL/SIGABRT/SIGFPE/SIGSEGV/SIGBUS/SIGTRAP: the process exit
    /// handler still attempts to detach from CA and notify the
    /// supervisor before terminating.
    Fatal,
}

pub const GRACEFUL_SIGNALS: &[Signal] = &[Signal::SIGINT, Signal::SIGTERM, Signal::SIGQUIT, Signal::SIGHUP];
pub const FATAL_SIGNALS: &[Signal] = &[
    Signal::SIGILL,
    Signal::SIGABRT,
    Signal::SIGFPE,
    Signal::SIGSEGV,
    Signal::SIGBUS,
    Signal::SIGTRAP,
];

/// Installs the shared recording handler for every graceful and fatal
/// signal. Safe to call once at process startup.
pub fn install() -> Result<(), nix::Error> {
    let action = unsafe {
        SigAction::new(
            SigHandler::Handler(record_signal),
            SaFlags::empty(),
            SigSet::empty(),
        )
    };
    for sig in GRACEFUL_SIGNALS.iter().chain(FATAL_SIGNALS.iter()) {
        unsafe {
            signal::sigaction(*sig, &action)?;
        }
    }
    Ok(())
}

/// Drains the recorded signal, if any, classifying it. Call this once
/// per pend-event return.
pub fn take_signal() -> Option<(i32, SignalClass)> {
    let sig = RECEIVED_SIGNAL.swap(0, Ordering::SeqCst);
    if sig == 0 {
        return None;
    }
    let class = if FATAL_SIGNALS.iter().any(|s| *s as i32 == sig) {
        SignalClass::Fatal
    } else {
        SignalClass::Graceful
    };
    Some((sig, class))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_and_draining_a_signal_classifies_it() {
        record_signal(Signal::SIGINT as i32);
        let (sig, class) = take_signal().expect("signal recorded");
        assert_eq!(sig, Signal::SIGINT as i32);
        assert_eq!(class, SignalClass::Graceful);
        assert!(take_signal().is_none());
    }

    #[test]
    fn fatal_signal_classified_as_fatal() {
        record_signal(Signal::SIGSEGV as i32);
        let (_, class) = take_signal().expect("signal recorded");
        assert_eq!(class, SignalClass::Fatal);
    }
}
