//! Runtime core: registration, the dispatch tree and the three disciplines.
//!
//! The public API from this module is [`Bus`] (with [`BusBuilder`] and
//! [`Config`]) plus [`EventSequence`], the output of `publish_iterable`.
//!
//! Internal modules:
//! - [`node`]: per-type ordered handler list and its derived group index;
//! - [`registry`]: lazily derived type tree, owner records, copy-on-write mutation;
//! - [`runner`]: one handler invocation with the panic boundary;
//! - [`unit`]: one concurrent slice of an async publish;
//! - [`sequence`]: lazy iterator over iterable handlers.

mod builder;
mod bus;
mod config;
mod node;
mod registry;
mod runner;
mod sequence;
mod unit;

pub use builder::BusBuilder;
pub use bus::Bus;
pub use config::Config;
pub use sequence::EventSequence;
