use std::sync::{Arc, Mutex};

use lazyrx::FnObserver;

/// Recorded signals of every observer built by one `register_emissions_observer`
/// call, shared so tests can count across several subscriptions.
pub struct Emissions {
    pub nexts: Arc<Mutex<Vec<i32>>>,
    pub completes: Arc<Mutex<usize>>,
    pub errors: Arc<Mutex<Vec<String>>>,
}

impl Emissions {
    pub fn nexts(&self) -> Vec<i32> {
        self.nexts.lock().unwrap().clone()
    }

    pub fn completes(&self) -> usize {
        *self.completes.lock().unwrap()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

pub fn register_emissions_observer() -> (impl Fn() -> FnObserver<i32>, Emissions) {
    let nexts = Arc::new(Mutex::new(Vec::with_capacity(5)));
    let completes = Arc::new(Mutex::new(0));
    let errors = Arc::new(Mutex::new(Vec::with_capacity(5)));

    let emissions = Emissions {
        nexts: Arc::clone(&nexts),
        completes: Arc::clone(&completes),
        errors: Arc::clone(&errors),
    };

    let make_observer = move || {
        let nexts_c = Arc::clone(&nexts);
        let completes_c = Arc::clone(&completes);
        let errors_c = Arc::clone(&errors);
        FnObserver::new(
            move |n| {
                // Track next() calls.
                nexts_c.lock().unwrap().push(n);
            },
            move |e| {
                // Track error() calls.
                errors_c.lock().unwrap().push(e.to_string());
            },
            move || {
                // Track complete() calls.
                *completes_c.lock().unwrap() += 1;
            },
        )
    };
    (make_observer, emissions)
}
