#[macro_use]
extern crate serde;

mod address;
mod error;
mod ledger;
mod proposal;

pub use address::*;
pub use error::*;
pub use ledger::*;
pub use proposal::*;
