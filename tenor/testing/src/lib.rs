mod builder;
mod mock;
mod result;
mod suite;
mod tracing;

pub use {builder::*, mock::*, result::*, suite::*, tracing::*};
