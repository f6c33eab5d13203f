mod error;
mod invariants;

pub use {error::*, invariants::*};
