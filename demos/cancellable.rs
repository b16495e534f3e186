/**
 * An `Observable` can be cancelled by unsubscribing. The teardown it returned
 * stops the interval so no background work is left behind.
 */
use std::time::Duration;

use lazyrx::{FnObserver, Observable, Subscribeable, Teardown, Unsubscribeable};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let observable = Observable::new(|s| {
        // Emit a value every second.
        let interval = tokio::spawn(async move {
            let mut i = 1;
            let mut ticks = tokio::time::interval(Duration::from_secs(1));
            ticks.tick().await;
            loop {
                ticks.tick().await;
                s.next(i);
                i += 1;
            }
        });

        Teardown::from_fn(move || {
            println!("unsubscribed");
            interval.abort();
        })
    });

    let subscription = match observable.subscribe(FnObserver::on_next(|v: i32| {
        println!("value emitted from observable - {}", v)
    })) {
        Ok(subscription) => subscription,
        Err(e) => {
            eprintln!("subscribe failed: {}", e);
            return;
        }
    };

    tokio::time::sleep(Duration::from_millis(5500)).await;

    if let Err(e) = subscription.unsubscribe() {
        eprintln!("unsubscribe failed: {}", e);
    }

    // Nothing else is printed after unsubscribing.
    tokio::time::sleep(Duration::from_secs(2)).await;
    println!("`main` function done")
}
