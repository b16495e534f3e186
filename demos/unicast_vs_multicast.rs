/**
 * A `Promise` runs its producer once, however many continuations are attached.
 * Every subscription to an `Observable` runs its producer again.
 */
use lazyrx::{FnObserver, Observable, Promise, Subscribeable, Teardown};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let promise = Promise::new(|r| {
        println!("promise producer runs");
        r.resolve(1);
    });
    let first = promise.then(|v| println!("calling then 1st time - {}", v));
    let second = promise.then(|v| println!("calling then 2nd time - {}", v));

    for continuation in [first, second] {
        if let Err(e) = continuation.value().await {
            eprintln!("promise failed: {}", e);
        }
    }

    let observable = Observable::new(|s| {
        println!("observable producer runs");
        s.next(1);
        Teardown::Nil
    });

    for n in ["1st", "2nd"] {
        if let Err(e) = observable.subscribe(FnObserver::on_next(move |v: i32| {
            println!("subscribing {} time - {}", n, v)
        })) {
            eprintln!("subscribe failed: {}", e);
        }
    }
}
