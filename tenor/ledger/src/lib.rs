pub mod calibration;
mod custody;
mod error;
mod events;
mod genesis;
mod governance;
mod ledger;
mod perpetual;
mod rollover;
mod settlement;
mod state;
mod trade;

pub use {
    custody::*, error::*, events::*, genesis::*, governance::*, ledger::*, perpetual::*,
    rollover::*, state::*, trade::*,
};
