//! Cooperative run state shared between the scheduler and whoever drives it
//! (signal handlers, tests).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

const SLEEP_SLICE: Duration = Duration::from_millis(50);

#[derive(Debug, Default)]
struct Flags {
    stop: AtomicBool,
    snapshot: AtomicBool,
}

/// Cheaply cloneable handle to the stop and snapshot flags of one run.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    flags: Arc<Flags>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.flags.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.flags.stop.load(Ordering::Relaxed)
    }

    /// Asks the coordinator to print interim totals without stopping the run.
    pub fn request_snapshot(&self) {
        self.flags.snapshot.store(true, Ordering::Relaxed);
    }

    /// Returns whether a snapshot was requested and clears the request.
    pub fn take_snapshot_request(&self) -> bool {
        self.flags.snapshot.swap(false, Ordering::Relaxed)
    }

    /// Sleeps for `duration`, waking early once the run is stopped.
    ///
    /// Returns `false` if the sleep was cut short.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_stopped() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_flags() {
        let control = RunControl::new();
        let handle = control.clone();
        assert!(!control.is_stopped());
        handle.stop();
        assert!(control.is_stopped());
    }

    #[test]
    fn test_snapshot_request_is_cleared_on_take() {
        let control = RunControl::new();
        assert!(!control.take_snapshot_request());
        control.request_snapshot();
        assert!(control.take_snapshot_request());
        assert!(!control.take_snapshot_request());
    }

    #[test]
    fn test_sleep_ends_early_when_stopped() {
        let control = RunControl::new();
        let stopper = control.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            stopper.stop();
        });

        let started = Instant::now();
        assert!(!control.sleep(Duration::from_secs(10)));
        assert!(started.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[test]
    fn test_sleep_completes_when_running() {
        let control = RunControl::new();
        assert!(control.sleep(Duration::from_millis(10)));
    }
}
