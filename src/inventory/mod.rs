//! Inventory domain logic. Everything here is a pure function of the records
//! handed in; fetching and persisting lives in `handlers`.

pub mod audit;
pub mod kit;
pub mod ledger;
pub mod parse;
pub mod review;
pub mod sku;
pub mod usage;
