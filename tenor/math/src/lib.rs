mod constants;
mod error;
mod exp_ln;
mod int;
mod multiply_ratio;
mod number;

pub use {constants::*, error::*, exp_ln::*, int::*, multiply_ratio::*, number::*};
