use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Callback invoked once per tick, on the clock's producer thread. The app
/// wires this to an event-channel send so tick handling itself always runs
/// on the game-logic thread.
pub type TickFn = Arc<dyn Fn() + Send + Sync>;

/// A periodic tick source the round engine subscribes to. Cadence is fixed
/// at one tick per second by the engine's contract.
pub trait Clock {
    fn subscribe(&self, on_tick: TickFn) -> TickHandle;
}

/// Cancellation handle for one subscription. Cancelling is explicit and
/// total: the producer checks the flag before every callback and exits the
/// first time it is set. Dropping the handle cancels too, so a replaced
/// subscription can never keep ticking.
#[derive(Debug)]
pub struct TickHandle {
    cancelled: Arc<AtomicBool>,
}

impl TickHandle {
    pub fn new(cancelled: Arc<AtomicBool>) -> Self {
        Self { cancelled }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Thread-backed wall clock.
pub struct SystemClock {
    period: Duration,
}

impl SystemClock {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Clock for SystemClock {
    fn subscribe(&self, on_tick: TickFn) -> TickHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let period = self.period;

        thread::spawn(move || {
            loop {
                thread::sleep(period);
                if flag.load(Ordering::Relaxed) {
                    return;
                }
                on_tick();
            }
        });

        TickHandle::new(cancelled)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn system_clock_ticks_until_cancelled() {
        let clock = SystemClock::new(Duration::from_millis(5));
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);

        let handle = clock.subscribe(Arc::new(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        }));

        thread::sleep(Duration::from_millis(60));
        assert!(count.load(Ordering::Relaxed) > 0);

        handle.cancel();
        // One callback may already be in flight; after it lands the count
        // must hold still.
        thread::sleep(Duration::from_millis(20));
        let settled = count.load(Ordering::Relaxed);
        thread::sleep(Duration::from_millis(40));
        assert_eq!(count.load(Ordering::Relaxed), settled);
    }

    #[test]
    fn dropping_the_handle_cancels_the_subscription() {
        let clock = SystemClock::new(Duration::from_millis(5));
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);

        let handle = clock.subscribe(Arc::new(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        }));
        let flag = Arc::clone(&handle.cancelled);
        drop(handle);

        assert!(flag.load(Ordering::Relaxed));
        thread::sleep(Duration::from_millis(20));
        let settled = count.load(Ordering::Relaxed);
        thread::sleep(Duration::from_millis(40));
        assert_eq!(count.load(Ordering::Relaxed), settled);
    }
}
