#[macro_use]
extern crate serde;

mod cast;
mod election;
mod error;
mod feed;
mod integrity;
mod store;
mod tally;
mod time;
mod verify;
mod vote;
mod voter;

pub use cast::*;
pub use election::*;
pub use error::*;
pub use feed::*;
pub use integrity::*;
pub use store::*;
pub use tally::*;
pub use time::*;
pub use verify::*;
pub use vote::*;
pub use voter::*;

#[cfg(test)]
mod tests;
