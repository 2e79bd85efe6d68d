//! Integration tests for `publish_iterable`.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::*;
use tokio_util::sync::CancellationToken;
use typebus::{Config, DispatchError, HandlerError, Method, Sequence};

fn numbers(label: &'static str, items: Vec<Result<u32, HandlerError>>) -> Method {
    Method::sequence(label, move |_: &Query| items.clone())
}

#[test]
fn sequences_are_spliced_in_priority_order() {
    let journal = Journal::default();
    let bus = quiet(Config::default())
        .with_exception_handler(capture_errors(&journal))
        .build();

    bus.register(Table::new([
        numbers("low", vec![Ok(3)]).priority(1),
        numbers("high", vec![Ok(1), Ok(2), Err(HandlerError::fail("broke")), Ok(99)])
            .priority(10),
    ]));

    let out: Vec<u32> = bus.publish_iterable(Query::default()).unwrap().collect();
    assert_eq!(out, vec![1, 2, 3]);
    assert_eq!(journal.take(), vec!["high: handler_failed"]);
}

#[test]
fn handlers_run_lazily_and_only_once_per_traversal() {
    let calls = Arc::new(AtomicUsize::new(0));
    let bus = quiet(Config::default()).build();

    let counter = Arc::clone(&calls);
    bus.register(Table::new([Method::sequence("counted", move |_: &Query| {
        counter.fetch_add(1, Ordering::SeqCst);
        vec![Ok::<u32, HandlerError>(7)]
    })]));

    let mut seq = bus.publish_iterable::<_, u32>(Query::default()).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(seq.next(), Some(7));
    assert_eq!(seq.next(), None);
    assert_eq!(seq.next(), None);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // A new publish is a new traversal.
    let again: Vec<u32> = bus.publish_iterable(Query::default()).unwrap().collect();
    assert_eq!(again, vec![7]);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn non_iterable_results_yield_nothing_but_still_run() {
    let journal = Journal::default();
    let bus = quiet(Config::default()).build();

    let j = journal.clone();
    let plain = Method::returning("plain", move |_: &Query| {
        j.push("plain");
        Ok(42u32)
    })
    .priority(5);
    let boxed = Method::returning("boxed", |_: &Query| {
        let it: Box<dyn Iterator<Item = u32> + Send> = Box::new(10..12);
        Ok(it)
    });

    bus.register(Table::new([plain, boxed, record::<Query>(&journal, "unit")]));

    let out: Vec<u32> = bus.publish_iterable(Query::default()).unwrap().collect();
    assert_eq!(out, vec![10, 11]);
    assert_eq!(journal.take(), vec!["plain", "unit"]);
}

#[test]
fn cancel_flag_stops_pulling_mid_sequence() {
    let bus = quiet(Config::default()).build();
    bus.register(Table::new([
        numbers("first", vec![Ok(1), Ok(2), Ok(3)]).priority(1),
        numbers("second", vec![Ok(4)]),
    ]));

    let mut seq = bus.publish_iterable::<_, u32>(Query::default()).unwrap();
    assert_eq!(seq.next(), Some(1));
    seq.event().flag.cancel();
    assert_eq!(seq.next(), None);
    assert_eq!(seq.next(), None);
}

#[test]
fn external_token_is_checked_before_each_pull() {
    let token = CancellationToken::new();
    let bus = quiet(Config::default()).build();

    let trigger = token.clone();
    bus.register(Table::new([Method::sequence("endless", move |_: &Query| {
        let trigger = trigger.clone();
        let seq: Sequence<u32> = Box::new((0..).map(move |n| {
            if n == 2 {
                trigger.cancel();
            }
            Ok(n)
        }));
        seq
    })]));

    let query = Query {
        token: Some(token),
        ..Query::default()
    };
    let out: Vec<u32> = bus.publish_iterable(query).unwrap().collect();
    assert_eq!(out, vec![0, 1, 2]);
}

#[test]
fn panics_while_pulling_are_routed_once() {
    let journal = Journal::default();
    let bus = quiet(Config::default())
        .with_exception_handler(capture_errors(&journal))
        .build();

    bus.register(Table::new([
        Method::sequence("explodes", |_: &Query| {
            (0..3u32).map(|n| {
                if n == 1 {
                    panic!("pull failed");
                }
                Ok(n)
            })
        })
        .priority(1),
        numbers("after", vec![Ok(10)]),
    ]));

    let out: Vec<u32> = bus.publish_iterable(Query::default()).unwrap().collect();
    assert_eq!(out, vec![0, 10]);
    assert_eq!(journal.take(), vec!["explodes: handler_panicked"]);
}

#[test]
fn plain_events_are_rejected() {
    let bus = quiet(Config::default()).build();
    let err = bus.publish_iterable::<_, u32>(Ping).unwrap_err();
    assert!(matches!(
        err,
        DispatchError::MissingCapability {
            capability: "iterable",
            ..
        }
    ));
}
