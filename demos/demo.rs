//! # Example: Editor events
//!
//! Shows the three publish disciplines on one bus:
//! - sync: key presses reach `Input` listeners through the type hierarchy;
//! - async: a save fans out to independent groups;
//! - iterable: completions are collected lazily from several providers.
//!
//! Run with `RUST_LOG=typebus=debug cargo run --example demo` to see the
//! bus diagnostics.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use typebus::{
    AsyncEvent, Bus, Config, Event, HandlerError, IterableEvent, Method, Parent, Scan,
    StaticSubscribe, Subscribe,
};

// ---- events ----

struct Input {
    window: u32,
}
impl Event for Input {}

struct KeyPressed {
    base: Input,
    key: char,
}
impl Event for KeyPressed {
    fn parent() -> Option<Parent<Self>> {
        Some(Parent::of(|k: &Self| &k.base))
    }
}

struct Save {
    path: String,
    token: CancellationToken,
}
impl AsyncEvent for Save {
    fn cancellation(&self) -> &CancellationToken {
        &self.token
    }
}
impl Event for Save {
    fn as_async(&self) -> Option<&dyn AsyncEvent> {
        Some(self)
    }
}

struct Complete {
    prefix: &'static str,
}
impl IterableEvent for Complete {}
impl Event for Complete {
    fn as_iterable(&self) -> Option<&dyn IterableEvent> {
        Some(self)
    }
}

// ---- owners ----

struct Editor {
    name: &'static str,
}

impl Subscribe for Editor {
    fn handlers(self: Arc<Self>, scan: &mut Scan) {
        let me = Arc::clone(&self);
        scan.push(
            Method::sync("on_input", move |ev: &Input| {
                println!("[{}] input in window {}", me.name, ev.window);
                Ok(())
            })
            .priority(-10),
        );
        scan.push(
            Method::sync("on_key", move |ev: &KeyPressed| {
                if ev.key == '!' {
                    return Err(HandlerError::fail("unsupported key"));
                }
                println!("[{}] key {:?}", self.name, ev.key);
                Ok(())
            })
            .priority(10),
        );
        scan.push(
            Method::future("format", |ev: &Save| {
                let path = ev.path.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    println!("[format] {path}");
                    Ok(())
                }
            })
            .group("disk"),
        );
        scan.push(
            Method::future("write", |ev: &Save| {
                let path = ev.path.clone();
                async move {
                    println!("[write] {path}");
                    Ok(())
                }
            })
            .group("disk")
            .priority(-1),
        );
        scan.push(Method::future("notify", |ev: &Save| {
            let path = ev.path.clone();
            async move {
                println!("[notify] saving {path}");
                Ok(())
            }
        }));
    }
}

struct Keywords;

impl StaticSubscribe for Keywords {
    fn static_handlers(scan: &mut Scan) {
        scan.push(Method::sequence("keywords", |ev: &Complete| {
            let prefix = ev.prefix;
            ["fn", "for", "if", "impl"]
                .into_iter()
                .filter(move |k| k.starts_with(prefix))
                .map(|k| Ok(k.to_string()))
        }));
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let bus = Bus::new(Config::default());
    let editor = Arc::new(Editor { name: "main" });
    bus.register(&editor);
    bus.register(typebus::Owner::of_type::<Keywords>());

    for key in ['a', '!'] {
        bus.publish(KeyPressed {
            base: Input { window: 1 },
            key,
        })?;
    }

    bus.publish_async(Save {
        path: "src/lib.rs".into(),
        token: CancellationToken::new(),
    })
    .await?;

    let words: Vec<String> = bus.publish_iterable(Complete { prefix: "f" })?.collect();
    println!("[complete] {words:?}");

    bus.unregister(&editor);
    println!("owners left: {}", bus.owner_count());
    Ok(())
}
