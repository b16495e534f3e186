use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use lazyrx::{Observable, Teardown};
use tokio::time::{sleep, Duration};

/// Counts live timer tasks; decremented when the task finishes or is aborted.
struct Ticking(Arc<AtomicUsize>);

impl Ticking {
    fn start(live: &Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Ticking(Arc::clone(live))
    }
}

impl Drop for Ticking {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Emits 1, 2, 3, ... every `period_ms` from a Tokio task. Unsubscribing aborts
/// the task.
pub fn generate_interval_observable(period_ms: u64, live: Arc<AtomicUsize>) -> Observable<i32> {
    Observable::new(move |s| {
        let ticking = Ticking::start(&live);
        let task = tokio::spawn(async move {
            let _ticking = ticking;
            let mut i = 1;
            loop {
                sleep(Duration::from_millis(period_ms)).await;
                s.next(i);
                i += 1;
            }
        });
        Teardown::abort(task)
    })
}

/// Same as `generate_interval_observable` but the teardown forgets to stop
/// the task.
pub fn generate_leaky_interval_observable(
    period_ms: u64,
    live: Arc<AtomicUsize>,
) -> Observable<i32> {
    Observable::new(move |s| {
        let ticking = Ticking::start(&live);
        tokio::spawn(async move {
            let _ticking = ticking;
            let mut i = 1;
            loop {
                sleep(Duration::from_millis(period_ms)).await;
                s.next(i);
                i += 1;
            }
        });
        Teardown::Nil
    })
}
