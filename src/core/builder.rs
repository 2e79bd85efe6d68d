use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Semaphore;

use crate::extensions::{
    default_converters, AwaitableConverter, Awaitables, Chain, DirectInvocation,
    ExceptionHandler, ExcludeMarked, InvocationFactory, InvocationFilter, LogExceptions,
    RegistrantFilter,
};
use crate::log::{Diagnostics, Logger};

use super::bus::{Bus, Inner};
use super::config::Config;
use super::registry::Registry;

/// Builder for a [`Bus`] with custom extension chains.
///
/// Every `with_*` call inserts ahead of the entries added before it; the
/// defaults enabled in [`Config`] always stay at the tail.
pub struct BusBuilder {
    cfg: Config,
    registrant_filters: Vec<Arc<dyn RegistrantFilter>>,
    invocation_filters: Vec<Arc<dyn InvocationFilter>>,
    factories: Vec<Arc<dyn InvocationFactory>>,
    exceptions: Vec<Arc<dyn ExceptionHandler>>,
    converters: Vec<Arc<dyn AwaitableConverter>>,
    logger: Option<Arc<dyn Logger>>,
}

impl BusBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            registrant_filters: Vec::new(),
            invocation_filters: Vec::new(),
            factories: Vec::new(),
            exceptions: Vec::new(),
            converters: Vec::new(),
            logger: default_logger(),
        }
    }

    /// Adds a filter that can reject whole owners.
    pub fn with_registrant_filter(mut self, filter: impl RegistrantFilter) -> Self {
        self.registrant_filters.push(Arc::new(filter));
        self
    }

    /// Adds a filter that can reject single scanned methods.
    pub fn with_invocation_filter(mut self, filter: impl InvocationFilter) -> Self {
        self.invocation_filters.push(Arc::new(filter));
        self
    }

    /// Adds a factory building stored callables from accepted methods.
    pub fn with_invocation_factory(mut self, factory: impl InvocationFactory) -> Self {
        self.factories.push(Arc::new(factory));
        self
    }

    /// Adds a link to the exception chain.
    pub fn with_exception_handler(mut self, handler: impl ExceptionHandler) -> Self {
        self.exceptions.push(Arc::new(handler));
        self
    }

    /// Adds a converter for values returned by async handlers.
    pub fn with_awaitable_converter(mut self, converter: impl AwaitableConverter) -> Self {
        self.converters.push(Arc::new(converter));
        self
    }

    /// Replaces the diagnostics logger.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Disables diagnostics. Dispatch behavior is unchanged.
    pub fn without_logger(mut self) -> Self {
        self.logger = None;
        self
    }

    /// Builds the bus.
    ///
    /// Initializes:
    /// - the registry with its root node
    /// - every chain (custom entries first, most recent first; defaults last)
    /// - the concurrency semaphore if `max_concurrent > 0`
    pub fn build(self) -> Bus {
        let cfg = self.cfg;
        let diag = Diagnostics::new(self.logger);

        let mut registrant_filters = chain(self.registrant_filters);
        if cfg.default_filters {
            registrant_filters.push_default(Arc::new(ExcludeMarked));
        }

        let mut factories = chain(self.factories);
        factories.push_default(Arc::new(DirectInvocation));

        let mut exceptions = chain(self.exceptions);
        if cfg.default_exception_handler {
            exceptions.push_default(Arc::new(LogExceptions));
        }

        let mut converters = chain(self.converters);
        if cfg.default_converters {
            for converter in default_converters() {
                converters.push_default(converter);
            }
        }

        let semaphore = cfg.concurrency_limit().map(Semaphore::new);

        Bus::from_inner(Inner {
            registry: RwLock::new(Registry::new(diag.clone())),
            registrant_filters,
            invocation_filters: chain(self.invocation_filters),
            factories,
            exceptions,
            awaitables: Awaitables::new(converters),
            semaphore,
            diag,
            cfg,
        })
    }
}

/// Custom entries in "most recently added first" order.
fn chain<T: ?Sized>(added: Vec<Arc<T>>) -> Chain<T> {
    let mut chain = Chain::new();
    for entry in added {
        chain.push_front(entry);
    }
    chain
}

#[cfg(feature = "logging")]
fn default_logger() -> Option<Arc<dyn Logger>> {
    Some(Arc::new(crate::log::TracingLogger::new()))
}

#[cfg(not(feature = "logging"))]
fn default_logger() -> Option<Arc<dyn Logger>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_config_switches() {
        let bus = BusBuilder::new(Config::default()).without_logger().build();
        assert!(bus.logger().is_none());
        assert_eq!(bus.awaitables().len(), 4);

        let cfg = Config {
            default_converters: false,
            ..Config::default()
        };
        let bus = BusBuilder::new(cfg)
            .with_awaitable_converter(crate::TypedConverter::new(
                |_: u8| -> crate::Awaitable { Box::pin(async { Ok(()) }) },
            ))
            .build();
        assert_eq!(bus.awaitables().len(), 1);
    }

    #[cfg(feature = "logging")]
    #[test]
    fn tracing_logger_is_the_default() {
        assert!(Bus::new(Config::default()).logger().is_some());
    }
}
