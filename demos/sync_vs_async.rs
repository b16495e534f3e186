/**
 * Promise continuations are always asynchronous. An `Observable` can emit both
 * synchronously, while `subscribe` is still running, and later from a timer.
 */
use std::time::Duration;

use lazyrx::{FnObserver, Observable, Promise, Subscribeable, Teardown};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let promise = Promise::new(|r| {
        // Resolved synchronously, still delivered on a later turn.
        r.resolve(1);
    });
    let printed = promise.then(|v| println!("resolved promise value - {}", v));
    println!("call stack over");

    let observable = Observable::new(|s| {
        // Emitting value synchronously.
        s.next(1);

        let later = s.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            // Emitting value asynchronously.
            later.next(2);
        });

        s.next(3);
        Teardown::abort(timer)
    });

    let subscription = observable.subscribe(FnObserver::on_next(|v: i32| {
        println!("value emitted from observable - {}", v)
    }));
    println!("subscribe returned");

    if let Err(e) = printed.value().await {
        eprintln!("promise failed: {}", e);
    }
    tokio::time::sleep(Duration::from_millis(700)).await;

    // Keep the subscription alive until the timer has fired.
    drop(subscription);
}
