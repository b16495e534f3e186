/**
 * A `Promise` starts working as soon as it is created, whether or not anyone
 * asks for its value. An `Observable` does nothing until it is subscribed to.
 */
use lazyrx::{FnObserver, Observable, Promise, Subscribeable, Teardown};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let promise = Promise::new(|r| {
        // Runs immediately, no continuation is registered yet.
        println!("promise is defined");
        r.resolve(1);
    });
    let printed = promise.then(|v| println!("value emitted from Promise -- {}", v));

    let observable = Observable::new(|s| {
        // Runs only once somebody subscribes.
        println!("observable is subscribed");
        s.next(1);
        Teardown::Nil
    });

    println!("both are defined");

    if let Err(e) = observable.subscribe(FnObserver::on_next(|v: i32| {
        println!("value emitted from Observable -- {}", v)
    })) {
        eprintln!("subscribe failed: {}", e);
    }

    // The promise continuation only runs once this task yields.
    if let Err(e) = printed.value().await {
        eprintln!("promise failed: {}", e);
    }
}
