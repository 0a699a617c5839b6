//! Ledger module containing split allocation, draft editing, expense recording
//! and balance aggregation

pub mod balance;
pub mod core;
pub mod draft;
pub mod expense;
pub mod group;
pub mod split;

pub use balance::*;
pub use self::core::*;
pub use draft::*;
pub use expense::*;
pub use group::*;
pub use split::*;
