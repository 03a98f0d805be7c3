//! Host environment for running vaults in-process
//!
//! Supplies the balance ledger that receives deposits and performs the
//! calls a vault authorizes.

pub mod ledger;

pub use ledger::{CallRecord, Ledger};
