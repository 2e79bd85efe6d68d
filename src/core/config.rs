//! # Bus configuration.
//!
//! Provides [`Config`], the settings consumed by [`Bus::builder`](crate::Bus::builder).
//!
//! ## Sentinel values
//! - `max_concurrent = 0` → unlimited (no semaphore created)

/// Global configuration for a bus instance.
///
/// ## Field semantics
/// - `max_concurrent`: cap on concurrently running async units (`0` = unlimited)
/// - `catch_panics`: turn handler panics into [`HandlerError::Panicked`](crate::HandlerError)
///   and contain panics raised while registering
/// - `default_*`: install the built-in chain entries at the tail of each chain
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors over
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of asynchronous dispatch units running at once.
    ///
    /// - `0` = unlimited (no semaphore)
    /// - `n > 0` = at most `n` units (one per ungrouped handler, one per group)
    ///
    /// Shared across every `publish_async` call on the bus. Waiting for a permit
    /// is abandoned as soon as the event's cancellation token fires.
    pub max_concurrent: usize,

    /// Catch panics raised by handlers, awaited completions, pulled sequences,
    /// filters and scans.
    ///
    /// When disabled a panicking handler unwinds through `publish`.
    pub catch_panics: bool,

    /// Install [`ExcludeMarked`](crate::ExcludeMarked) as the last registrant filter.
    pub default_filters: bool,

    /// Install the built-in awaitable converters (boxed futures, join handles).
    pub default_converters: bool,

    /// Install [`LogExceptions`](crate::LogExceptions) as the last exception handler.
    pub default_exception_handler: bool,
}

impl Config {
    /// Returns the concurrency limit as an `Option`.
    ///
    /// - `None` → unlimited (no semaphore)
    /// - `Some(n)` → at most `n` concurrent units
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_concurrent == 0 {
            None
        } else {
            Some(self.max_concurrent)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `max_concurrent = 0` (unlimited)
    /// - `catch_panics = true`
    /// - every default chain entry installed
    fn default() -> Self {
        Self {
            max_concurrent: 0,
            catch_panics: true,
            default_filters: true,
            default_converters: true,
            default_exception_handler: true,
        }
    }
}
