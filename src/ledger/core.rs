//! Main ledger orchestrator that coordinates groups, expenses and balances

use bigdecimal::BigDecimal;

use crate::config::LedgerConfig;
use crate::ledger::{
    BalanceAggregator, DraftEditor, ExpenseManager, GroupManager, SplitAllocator, SplitInputs,
};
use crate::traits::*;
use crate::types::*;

/// Main ledger system that orchestrates all expense-sharing operations
pub struct Ledger<S: LedgerStorage> {
    group_manager: GroupManager<S>,
    expense_manager: ExpenseManager<S>,
    aggregator: BalanceAggregator,
}

impl<S: LedgerStorage + Clone> Ledger<S> {
    /// Create a new ledger with the given storage backend
    pub fn new(storage: S) -> Self {
        Self {
            group_manager: GroupManager::new(storage.clone()),
            expense_manager: ExpenseManager::new(storage, LedgerConfig::default()),
            aggregator: BalanceAggregator::default(),
        }
    }

    /// Create a new ledger with a custom configuration
    pub fn with_config(storage: S, config: LedgerConfig) -> LedgerResult<Self> {
        Self::with_validator(storage, Box::new(DefaultExpenseValidator), config)
    }

    /// Create a new ledger with a custom validator
    pub fn with_validator(
        storage: S,
        validator: Box<dyn ExpenseValidator>,
        config: LedgerConfig,
    ) -> LedgerResult<Self> {
        config.validate()?;
        Ok(Self {
            group_manager: GroupManager::new(storage.clone()),
            aggregator: BalanceAggregator::new(&config),
            expense_manager: ExpenseManager::with_validator(storage, validator, config),
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        self.expense_manager.config()
    }

    // Directory operations
    /// Register a participant
    pub async fn register_participant(&mut self, participant: Participant) -> LedgerResult<Participant> {
        self.group_manager.register_participant(participant).await
    }

    /// Get a participant by ID
    pub async fn get_participant(&self, participant_id: &str) -> LedgerResult<Option<Participant>> {
        self.group_manager.get_participant(participant_id).await
    }

    /// List all participants
    pub async fn list_participants(&self) -> LedgerResult<Vec<Participant>> {
        self.group_manager.list_participants().await
    }

    // Group operations
    /// Create a new group
    pub async fn create_group(
        &mut self,
        id: String,
        name: String,
        description: String,
        members: Vec<ParticipantId>,
    ) -> LedgerResult<Group> {
        self.group_manager
            .create_group(id, name, description, members)
            .await
    }

    /// Get a group by ID
    pub async fn get_group(&self, group_id: &str) -> LedgerResult<Option<Group>> {
        self.group_manager.get_group(group_id).await
    }

    /// List all groups
    pub async fn list_groups(&self) -> LedgerResult<Vec<Group>> {
        self.group_manager.list_groups().await
    }

    /// Groups a participant belongs to
    pub async fn groups_of(&self, participant_id: &str) -> LedgerResult<Vec<Group>> {
        self.group_manager.groups_of(participant_id).await
    }

    // Expense operations
    /// Compute shares with this ledger's rounding settings
    pub fn allocate(
        &self,
        total: &BigDecimal,
        participants: &[ParticipantId],
        inputs: &SplitInputs,
    ) -> Vec<Allocation> {
        SplitAllocator::new(self.config()).allocate(total, participants, inputs)
    }

    /// Start a draft over the members of a group
    pub async fn draft_for_group(&self, group_id: &str) -> LedgerResult<DraftEditor> {
        let members = self.group_manager.members_of(group_id).await?;
        Ok(DraftEditor::with_config(&members, self.config()).in_group(group_id))
    }

    /// Validate a draft without recording it
    pub async fn validate_draft(&self, draft: &ExpenseDraft) -> LedgerResult<ValidationReport> {
        self.expense_manager.validate(draft).await
    }

    /// Validate and record a draft
    pub async fn submit_expense(&mut self, draft: ExpenseDraft) -> Result<Expense, SubmitError> {
        self.expense_manager.record_expense(draft).await
    }

    /// Submit the current state of an editor.
    ///
    /// At most one submission per editor runs at a time. On success the editor
    /// is reset; on any failure it is left exactly as it was.
    pub async fn submit_draft(&mut self, editor: &mut DraftEditor) -> Result<Expense, SubmitError> {
        let Some(_permit) = editor.gate().try_begin() else {
            tracing::warn!("submission already in progress, ignoring");
            return Err(SubmitError::AlreadySubmitting);
        };

        match self.expense_manager.record_expense(editor.to_draft()).await {
            Ok(expense) => {
                editor.reset();
                Ok(expense)
            }
            Err(SubmitError::Transport(error)) => {
                tracing::warn!(%error, "failed to add expense");
                Err(SubmitError::Transport(error))
            }
            Err(error) => Err(error),
        }
    }

    /// Get an expense by ID
    pub async fn get_expense(&self, expense_id: &str) -> LedgerResult<Option<Expense>> {
        self.expense_manager.get_expense(expense_id).await
    }

    /// Get an expense by ID, returning an error if not found
    pub async fn get_expense_required(&self, expense_id: &str) -> LedgerResult<Expense> {
        self.expense_manager.get_expense_required(expense_id).await
    }

    /// Expenses of a group, newest first
    pub async fn group_expenses(&self, group_id: &str) -> LedgerResult<Vec<Expense>> {
        self.group_manager.get_group_required(group_id).await?;
        self.expense_manager.group_expenses(group_id).await
    }

    /// Expenses a participant paid for or shares in
    pub async fn participant_expenses(&self, participant_id: &str) -> LedgerResult<Vec<Expense>> {
        self.expense_manager.participant_expenses(participant_id).await
    }

    // Balance operations
    /// Non-zero net balances within a group, ordered by participant id
    pub async fn group_balances(&self, group_id: &str) -> LedgerResult<Vec<Balance>> {
        self.group_manager.get_group_required(group_id).await?;
        let expenses = self
            .expense_manager
            .storage
            .list_expenses(Some(group_id))
            .await?;
        Ok(self.aggregator.group_balances(group_id, &expenses))
    }

    /// Net position of a participant across every group
    pub async fn participant_balance(&self, participant_id: &str) -> LedgerResult<BigDecimal> {
        let expenses = self
            .expense_manager
            .participant_expenses(participant_id)
            .await?;
        Ok(self.aggregator.participant_balance(participant_id, &expenses))
    }

    /// A participant's net position in each group they belong to
    pub async fn participant_group_balances(
        &self,
        participant_id: &str,
    ) -> LedgerResult<Vec<GroupPosition>> {
        let groups = self.group_manager.groups_of(participant_id).await?;
        let mut positions = Vec::with_capacity(groups.len());

        for group in groups {
            let expenses = self
                .expense_manager
                .storage
                .list_expenses(Some(&group.id))
                .await?;
            positions.push(GroupPosition {
                amount: self.aggregator.participant_balance(participant_id, &expenses),
                group_id: group.id,
                group_name: group.name,
            });
        }

        Ok(positions)
    }

    /// Group balances with display names attached
    pub async fn group_balance_summary(&self, group_id: &str) -> LedgerResult<Vec<BalanceLine>> {
        let balances = self.group_balances(group_id).await?;
        let mut lines = Vec::with_capacity(balances.len());

        for balance in balances {
            lines.push(BalanceLine {
                name: self.group_manager.display_name(&balance.participant_id).await?,
                participant_id: balance.participant_id,
                amount: balance.amount,
            });
        }

        Ok(lines)
    }
}
