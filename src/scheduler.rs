// src/scheduler.rs
//
// Single-flight background downloader. One long-lived worker thread,
// one request slot. The state machine is Idle → Pending → Fetching →
// Idle, guarded by a single mutex; the condvar wakes the worker, which
// otherwise sleeps. The fetch itself always runs outside the lock, so
// scheduling (and anything else on the caller's thread) never waits on
// the network.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use crate::player::Player;
use crate::source::{SortOrder, SourceFetcher};

/// Completion callback, invoked on the worker thread on fetch success.
pub type OnReady = Box<dyn FnOnce(u32, Vec<Player>) + Send>;

struct Request {
    page_number: u32,
    sort: SortOrder,
    on_ready: OnReady,
}

enum State {
    Idle,
    Pending(Request),
    Fetching,
}

struct Slot {
    state: State,
    stopped: bool,
}

struct Shared {
    slot: Mutex<Slot>,
    wake: Condvar,
}

pub struct DownloadScheduler {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl DownloadScheduler {
    pub fn new<F>(fetcher: F) -> Self
    where
        F: SourceFetcher + 'static,
    {
        let shared = Arc::new(Shared {
            slot: Mutex::new(Slot { state: State::Idle, stopped: false }),
            wake: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::spawn(move || worker_loop(worker_shared, fetcher));

        Self { shared, worker: Some(worker) }
    }

    /// Hand the worker a page to fetch. Returns immediately in every
    /// state. `false` means a request is already pending or in flight
    /// and this one (callback included) was dropped; the caller is
    /// expected to ask again after the current fetch completes.
    pub fn schedule_download<F>(&self, page_number: u32, sort: SortOrder, on_ready: F) -> bool
    where
        F: FnOnce(u32, Vec<Player>) + Send + 'static,
    {
        {
            let mut slot = lock(&self.shared.slot);
            if slot.stopped || !matches!(slot.state, State::Idle) {
                return false;
            }
            slot.state = State::Pending(Request {
                page_number,
                sort,
                on_ready: Box::new(on_ready),
            });
        }
        self.shared.wake.notify_one();
        true
    }

    /// Ask the worker to exit and wait for it. A fetch in progress runs
    /// to completion first; there is no cancellation primitive.
    pub fn stop(&mut self) {
        {
            let mut slot = lock(&self.shared.slot);
            slot.stopped = true;
        }
        self.shared.wake.notify_one();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for DownloadScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop<F: SourceFetcher>(shared: Arc<Shared>, fetcher: F) {
    loop {
        // Sleep until there is a pending request (or we are told to stop),
        // then claim it and flip to Fetching while still under the lock.
        let request = {
            let mut slot = lock(&shared.slot);
            loop {
                if slot.stopped {
                    return;
                }
                match std::mem::replace(&mut slot.state, State::Idle) {
                    State::Pending(req) => {
                        slot.state = State::Fetching;
                        break req;
                    }
                    other => slot.state = other,
                }
                slot = match shared.wake.wait(slot) {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
            }
        };

        // I/O-bound part, never under the lock.
        logd!("download worker: fetching page {}", request.page_number);
        let result = fetcher.fetch(request.page_number, request.sort);

        {
            let mut slot = lock(&shared.slot);
            slot.state = State::Idle;
        }

        match result {
            Ok(page) => {
                logd!(
                    "download worker: page {} ready ({} players)",
                    request.page_number,
                    page.len()
                );
                (request.on_ready)(request.page_number, page);
            }
            // The cache stays untouched on failure; the worker is idle
            // again so later requests still go through.
            Err(e) => loge!("download worker: fetch failed: {e}"),
        }
    }
}

fn lock(m: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FetchError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    fn player(name: &str) -> Player {
        Player {
            name: s!(name),
            role: s!("Winger"),
            age: 21,
            nationality: s!("France"),
            club: s!("PSG"),
            price: s!("€90.00m"),
        }
    }

    /// Counts calls; optionally blocks each fetch until released.
    struct StubFetcher {
        calls: Arc<AtomicUsize>,
        gate: Option<Mutex<mpsc::Receiver<()>>>,
        fail: bool,
    }

    impl SourceFetcher for StubFetcher {
        fn fetch(&self, page_number: u32, _sort: SortOrder) -> Result<Vec<Player>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                let _ = gate.lock().unwrap().recv();
            }
            if self.fail {
                return Err(FetchError::new(page_number, "boom"));
            }
            Ok(vec![player(&format!("p{page_number}"))])
        }
    }

    #[test]
    fn accepted_request_completes_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sched = DownloadScheduler::new(StubFetcher {
            calls: Arc::clone(&calls),
            gate: None,
            fail: false,
        });

        let (tx, rx) = mpsc::channel();
        assert!(sched.schedule_download(3, SortOrder::Descending, move |page, players| {
            tx.send((page, players.len())).unwrap();
        }));

        let (page, n) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(page, 3);
        assert_eq!(n, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // No second firing.
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn requests_while_busy_are_dropped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (release_tx, release_rx) = mpsc::channel();
        let sched = DownloadScheduler::new(StubFetcher {
            calls: Arc::clone(&calls),
            gate: Some(Mutex::new(release_rx)),
            fail: false,
        });

        let (done_tx, done_rx) = mpsc::channel();
        let first_tx = done_tx.clone();
        assert!(sched.schedule_download(1, SortOrder::None, move |page, _| {
            first_tx.send(page).unwrap();
        }));

        // Wait until the worker has actually started the fetch.
        while calls.load(Ordering::SeqCst) == 0 {
            thread::sleep(Duration::from_millis(5));
        }

        // In flight: both a same-page and a different-page request drop.
        assert!(!sched.schedule_download(1, SortOrder::None, {
            let tx = done_tx.clone();
            move |page, _| tx.send(page + 100).unwrap()
        }));
        assert!(!sched.schedule_download(2, SortOrder::None, move |page, _| {
            done_tx.send(page + 100).unwrap();
        }));

        release_tx.send(()).unwrap();
        assert_eq!(done_rx.recv_timeout(Duration::from_secs(5)).unwrap(), 1);
        // Dropped callbacks never fire, and only one fetch ran.
        assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_fetch_leaves_worker_usable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sched = DownloadScheduler::new(StubFetcher {
            calls: Arc::clone(&calls),
            gate: None,
            fail: true,
        });

        let (tx, rx) = mpsc::channel::<u32>();
        let tx2 = tx.clone();
        assert!(sched.schedule_download(1, SortOrder::None, move |p, _| {
            tx2.send(p).unwrap();
        }));
        // Failure: no callback, but the worker must go idle again.
        assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());

        // Eventually the slot frees up and a new request is accepted.
        let mut accepted = false;
        for _ in 0..100 {
            if sched.schedule_download(2, SortOrder::None, {
                let tx = tx.clone();
                move |p, _| tx.send(p).unwrap()
            }) {
                accepted = true;
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert!(accepted);
        assert!(rx.recv_timeout(Duration::from_millis(300)).is_err()); // second also fails
        assert!(calls.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn stop_joins_idle_worker() {
        let mut sched = DownloadScheduler::new(StubFetcher {
            calls: Arc::new(AtomicUsize::new(0)),
            gate: None,
            fail: false,
        });
        sched.stop();
        // Stopped scheduler refuses new work.
        assert!(!sched.schedule_download(1, SortOrder::None, |_, _| {}));
    }
}
