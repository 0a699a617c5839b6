//! Traits for storage abstraction and extensibility

use async_trait::async_trait;

use crate::config::LedgerConfig;
use crate::types::*;

/// Storage abstraction for the expense ledger
///
/// This trait allows the ledger to work with any storage backend
/// (PostgreSQL, SQLite, a remote API, in-memory, etc.) by implementing these
/// methods. Expenses are append-only: there is no update or delete.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    /// Save a participant to storage
    async fn save_participant(&mut self, participant: &Participant) -> LedgerResult<()>;

    /// Get a participant by ID
    async fn get_participant(&self, participant_id: &str) -> LedgerResult<Option<Participant>>;

    /// List all known participants
    async fn list_participants(&self) -> LedgerResult<Vec<Participant>>;

    /// Save a group to storage
    async fn save_group(&mut self, group: &Group) -> LedgerResult<()>;

    /// Get a group by ID
    async fn get_group(&self, group_id: &str) -> LedgerResult<Option<Group>>;

    /// List all groups
    async fn list_groups(&self) -> LedgerResult<Vec<Group>>;

    /// Append an expense. Fails if the ID is already taken.
    async fn save_expense(&mut self, expense: &Expense) -> LedgerResult<()>;

    /// Get an expense by ID
    async fn get_expense(&self, expense_id: &str) -> LedgerResult<Option<Expense>>;

    /// List expenses in insertion order, optionally restricted to one group
    async fn list_expenses(&self, group_id: Option<&str>) -> LedgerResult<Vec<Expense>>;

    /// List expenses the participant paid for or shares in
    async fn get_participant_expenses(&self, participant_id: &str) -> LedgerResult<Vec<Expense>>;
}

/// Trait for implementing custom expense validation rules
///
/// Validators return every broken rule at once instead of stopping at the
/// first one.
pub trait ExpenseValidator: Send + Sync {
    /// Check a draft on its own
    fn validate_draft(&self, draft: &ExpenseDraft, config: &LedgerConfig) -> ValidationReport;

    /// Check a draft against the group it is recorded in
    fn validate_membership(&self, draft: &ExpenseDraft, group: &Group) -> ValidationReport;
}

/// Default validator: the basic split rules plus the shape of each allocation
pub struct DefaultExpenseValidator;

impl ExpenseValidator for DefaultExpenseValidator {
    fn validate_draft(&self, draft: &ExpenseDraft, config: &LedgerConfig) -> ValidationReport {
        let mut report = draft.validate(config);
        report.merge(crate::utils::validation::check_allocations(draft));
        report
    }

    fn validate_membership(&self, draft: &ExpenseDraft, group: &Group) -> ValidationReport {
        crate::utils::validation::check_membership(draft, group)
    }
}
