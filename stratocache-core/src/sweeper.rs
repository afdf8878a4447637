use parking_lot::{Condvar, Mutex};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// How long [`Sweeper::stop`] waits for the thread before detaching it.
pub(crate) const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

const JOIN_POLL: Duration = Duration::from_millis(5);

struct Signal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// A background thread that runs a tick function at a fixed period until
/// stopped, or until the tick function returns `false`.
pub(crate) struct Sweeper {
    signal: Arc<Signal>,
    thread: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Spawns the sweeper thread. The first tick runs one `interval` after start.
    pub(crate) fn start<F>(interval: Duration, mut tick: F) -> io::Result<Self>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let signal = Arc::new(Signal {
            stopped: Mutex::new(false),
            wake: Condvar::new(),
        });
        let thread_signal = Arc::clone(&signal);

        let thread = thread::Builder::new()
            .name("stratocache-sweeper".to_string())
            .spawn(move || {
                debug!(?interval, "sweeper started");
                loop {
                    {
                        let mut stopped = thread_signal.stopped.lock();
                        if !*stopped {
                            thread_signal.wake.wait_for(&mut stopped, interval);
                        }
                        if *stopped {
                            break;
                        }
                    }
                    if !tick() {
                        break;
                    }
                }
                debug!("sweeper stopped");
            })?;

        Ok(Self {
            signal,
            thread: Some(thread),
        })
    }

    /// Signals the thread to stop and waits up to `grace` for it to finish.
    ///
    /// A thread that does not finish in time is detached; it exits at its next
    /// wake-up. Calling `stop` from the sweeper thread itself only signals.
    /// Idempotent.
    pub(crate) fn stop(&mut self, grace: Duration) {
        *self.signal.stopped.lock() = true;
        self.signal.wake.notify_all();

        let Some(thread) = self.thread.take() else {
            return;
        };
        if thread.thread().id() == thread::current().id() {
            return;
        }

        let deadline = Instant::now() + grace;
        while !thread.is_finished() {
            if Instant::now() >= deadline {
                warn!(?grace, "sweeper did not stop within the grace period, detaching");
                return;
            }
            thread::sleep(JOIN_POLL);
        }
        if thread.join().is_err() {
            error!("sweeper thread panicked");
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop(SHUTDOWN_GRACE);
    }
}
