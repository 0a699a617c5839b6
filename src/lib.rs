//! # Split Ledger
//!
//! A shared-expense library: split a bill among a group, check the split adds
//! up, and keep every member's running balance.
//!
//! ## Features
//!
//! - **Split allocation**: equal, exact-amount and percentage splits with
//!   minor-unit rounding that always sums to the bill
//! - **Validation**: every broken rule reported at once, with a stricter
//!   validator available
//! - **Balances**: zero-sum net positions per group and across groups
//! - **Draft editing**: allocations recomputed on every edit, with a guard
//!   against double submission
//! - **Storage abstraction**: database-agnostic design with trait-based storage
//!
//! ## Quick Start
//!
//! ```rust
//! use split_ledger::{allocate, ParticipantId, SplitInputs};
//! use bigdecimal::BigDecimal;
//!
//! let people: Vec<ParticipantId> = vec!["1".into(), "2".into(), "3".into()];
//! let shares = allocate(&BigDecimal::from(100), &people, &SplitInputs::Equal);
//!
//! assert_eq!(shares.len(), 3);
//! assert_eq!(split_ledger::total_allocated(&shares), BigDecimal::from(100));
//! ```

pub mod config;
pub mod ledger;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use ledger::*;
pub use traits::*;
pub use types::*;
pub use utils::memory_storage::MemoryStorage;
pub use utils::validation::StrictExpenseValidator;
