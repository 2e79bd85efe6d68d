//! Integration tests for `publish_async`: groups, overlap, cancellation, limits.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::*;
use tokio::sync::Barrier;
use tokio::time::{sleep, timeout};
use typebus::{Config, DispatchError, HandlerError, Method};

const LIMIT: Duration = Duration::from_secs(5);

/// Async handler that records start/end around a short sleep.
fn timed(journal: &Journal, label: &'static str, group: &'static str) -> Method {
    let journal = journal.clone();
    Method::future(label, move |_: &Job| {
        let journal = journal.clone();
        async move {
            journal.push(format!("{label}:start"));
            sleep(Duration::from_millis(20)).await;
            journal.push(format!("{label}:end"));
            Ok(())
        }
    })
    .group(group)
}

/// Async handler that only completes once `barrier` is reached by its peers.
fn rendezvous(barrier: &Arc<Barrier>, label: &'static str, group: &'static str) -> Method {
    let barrier = Arc::clone(barrier);
    Method::future(label, move |_: &Job| {
        let barrier = Arc::clone(&barrier);
        async move {
            barrier.wait().await;
            Ok(())
        }
    })
    .group(group)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn different_groups_overlap() {
    let bus = quiet(Config::default()).build();
    let barrier = Arc::new(Barrier::new(2));

    bus.register(Table::new([
        rendezvous(&barrier, "left", "g1"),
        rendezvous(&barrier, "right", "g2"),
    ]));

    // Deadlocks unless both groups are in flight at once.
    timeout(LIMIT, bus.publish_async(Job::default()))
        .await
        .expect("groups did not overlap")
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn default_group_handlers_run_independently() {
    let bus = quiet(Config::default()).build();
    let barrier = Arc::new(Barrier::new(3));

    bus.register(Table::new([
        rendezvous(&barrier, "a", ""),
        rendezvous(&barrier, "b", ""),
        rendezvous(&barrier, "c", ""),
    ]));

    timeout(LIMIT, bus.publish_async(Job::default()))
        .await
        .expect("default group was serialized")
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn same_group_runs_sequentially_in_priority_order() {
    let journal = Journal::default();
    let bus = quiet(Config::default()).build();

    bus.register(Table::new([
        timed(&journal, "D", "g").priority(1),
        timed(&journal, "C", "g").priority(2),
    ]));

    timeout(LIMIT, bus.publish_async(Job::default()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(journal.take(), vec!["C:start", "C:end", "D:start", "D:end"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn synchronized_default_group_is_sequential() {
    let journal = Journal::default();
    let bus = quiet(Config::default()).build();

    bus.register(Table::new([
        timed(&journal, "low", "").priority(1),
        timed(&journal, "high", "").priority(9),
    ]));

    timeout(LIMIT, bus.publish_async(Job::serial()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        journal.take(),
        vec!["high:start", "high:end", "low:start", "low:end"]
    );
}

#[tokio::test]
async fn cancelled_token_skips_every_handler() {
    let journal = Journal::default();
    let bus = quiet(Config::default()).build();
    bus.register(Table::new([timed(&journal, "x", ""), timed(&journal, "y", "g")]));

    let job = Job::default();
    job.token.cancel();
    bus.publish_async(job).await.unwrap();

    assert!(journal.take().is_empty());
}

#[tokio::test]
async fn cancellation_mid_group_stops_the_rest_of_that_group() {
    let journal = Journal::default();
    let bus = quiet(Config::default()).build();

    let j = journal.clone();
    let canceller = Method::sync("cancel", move |job: &Job| {
        j.push("cancel");
        job.token.cancel();
        Ok(())
    })
    .group("g")
    .priority(5);

    bus.register(Table::new([canceller, timed(&journal, "after", "g")]));

    bus.publish_async(Job::default()).await.unwrap();
    assert_eq!(journal.take(), vec!["cancel"]);
}

#[tokio::test]
async fn internal_flag_is_honored_too() {
    let journal = Journal::default();
    let bus = quiet(Config::default()).build();

    let j = journal.clone();
    let stopper = Method::sync("stop", move |job: &Job| {
        j.push("stop");
        job.flag.cancel();
        Ok(())
    })
    .group("g")
    .priority(5);

    bus.register(Table::new([stopper, timed(&journal, "after", "g")]));

    let job = bus.publish_async(Job::default()).await.unwrap();
    assert!(typebus::Cancellable::is_cancelled(&job.flag));
    assert_eq!(journal.take(), vec!["stop"]);
}

#[tokio::test]
async fn failures_stay_inside_their_handler() {
    let journal = Journal::default();
    let bus = quiet(Config::default())
        .with_exception_handler(capture_errors(&journal))
        .build();

    let failing = Method::future("fails", |_: &Job| async {
        Err(HandlerError::fail("nope"))
    })
    .group("g")
    .priority(2);
    let panicking = Method::future("panics", |_: &Job| async {
        let armed = true;
        if armed {
            panic!("inside future");
        }
        Ok(())
    })
    .group("g")
    .priority(1);

    bus.register(Table::new([failing, panicking, timed(&journal, "next", "g")]));
    bus.publish_async(Job::default()).await.unwrap();

    assert_eq!(
        journal.take(),
        vec![
            "fails: handler_failed",
            "panics: handler_panicked",
            "next:start",
            "next:end"
        ]
    );
}

#[tokio::test]
async fn join_handles_are_awaited() {
    let journal = Journal::default();
    let bus = quiet(Config::default()).build();

    let j = journal.clone();
    let spawner = Method::returning("spawn", move |_: &Job| {
        let j = j.clone();
        Ok(tokio::spawn(async move {
            sleep(Duration::from_millis(10)).await;
            j.push("spawned");
        }))
    });
    bus.register(Table::new([spawner]));

    bus.publish_async(Job::default()).await.unwrap();
    assert_eq!(journal.take(), vec!["spawned"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn max_concurrent_caps_running_units() {
    let cfg = Config {
        max_concurrent: 1,
        ..Config::default()
    };
    let bus = quiet(cfg).build();

    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let mut methods = Vec::new();
    for (label, group) in [("a", "g1"), ("b", "g2"), ("c", ""), ("d", "")] {
        let running = Arc::clone(&running);
        let peak = Arc::clone(&peak);
        methods.push(
            Method::future(label, move |_: &Job| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .group(group),
        );
    }
    bus.register(Table::new(methods));

    timeout(LIMIT, bus.publish_async(Job::default()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn plain_events_are_rejected() {
    let bus = quiet(Config::default()).build();
    let err = bus.publish_async(Ping).await.unwrap_err();
    assert_eq!(
        err,
        DispatchError::MissingCapability {
            event: std::any::type_name::<Ping>(),
            capability: "async",
        }
    );
}
