#[cfg(feature = "profile")]
pub use no_nonsense_flamegraphs::span;

#[cfg(not(feature = "profile"))]
#[macro_export]
macro_rules! __span {
    ($name:expr) => {
        let _span_guard = tracing::trace_span!($name).entered();
    };
}

// Call sites use `crate::infra::span` with or without profiling.
#[cfg(not(feature = "profile"))]
pub use crate::__span as span;
