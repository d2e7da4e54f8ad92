//! Bank statement mailing: fetch an account's transactions, render them into a
//! paginated PDF statement, email it to the customer and record the outcome.

pub mod config;
pub mod delivery;
pub mod error;
pub mod ledger;
pub mod model;
pub mod settings;
pub mod source;
pub mod statement;

pub use error::{Error, Result};
