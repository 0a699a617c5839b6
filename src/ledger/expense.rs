//! Expense recording and retrieval

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::LedgerConfig;
use crate::ledger::split::{SplitAllocator, SplitInputs};
use crate::traits::*;
use crate::types::*;

/// Expense manager for validating and recording expenses
pub struct ExpenseManager<S: LedgerStorage> {
    pub(crate) storage: S,
    validator: Box<dyn ExpenseValidator>,
    config: LedgerConfig,
}

impl<S: LedgerStorage> ExpenseManager<S> {
    /// Create a new expense manager
    pub fn new(storage: S, config: LedgerConfig) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultExpenseValidator),
            config,
        }
    }

    /// Create a new expense manager with custom validator
    pub fn with_validator(
        storage: S,
        validator: Box<dyn ExpenseValidator>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            storage,
            validator,
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Validate a draft, including group membership when it names a group.
    ///
    /// Broken rules come back in the report; only a missing group or a
    /// storage failure is an error.
    pub async fn validate(&self, draft: &ExpenseDraft) -> LedgerResult<ValidationReport> {
        let mut report = self.validator.validate_draft(draft, &self.config);

        if let Some(group_id) = &draft.group_id {
            let group = self
                .storage
                .get_group(group_id)
                .await?
                .ok_or_else(|| LedgerError::GroupNotFound(group_id.clone()))?;
            report.merge(self.validator.validate_membership(draft, &group));
        }

        Ok(report)
    }

    /// Validate and persist a draft, returning the accepted expense
    pub async fn record_expense(&mut self, draft: ExpenseDraft) -> Result<Expense, SubmitError> {
        let report = self.validate(&draft).await?;
        if !report.is_ok() {
            tracing::warn!(
                violations = report.violations.len(),
                "expense rejected: {}",
                report
            );
            return Err(SubmitError::Rejected(report));
        }

        // Verify all referenced participants exist
        if self.storage.get_participant(&draft.payer_id).await?.is_none() {
            return Err(LedgerError::ParticipantNotFound(draft.payer_id.clone()).into());
        }
        for participant_id in draft.participant_ids() {
            if self.storage.get_participant(participant_id).await?.is_none() {
                return Err(LedgerError::ParticipantNotFound(participant_id.to_string()).into());
            }
        }

        let expense = Expense::from_draft(Uuid::new_v4().to_string(), draft)?;
        self.storage.save_expense(&expense).await?;

        tracing::info!(
            expense_id = %expense.id,
            group_id = expense.group_id.as_deref().unwrap_or("-"),
            amount = %expense.amount,
            "expense recorded"
        );

        Ok(expense)
    }

    /// Get an expense by ID
    pub async fn get_expense(&self, expense_id: &str) -> LedgerResult<Option<Expense>> {
        self.storage.get_expense(expense_id).await
    }

    /// Get an expense by ID, returning an error if not found
    pub async fn get_expense_required(&self, expense_id: &str) -> LedgerResult<Expense> {
        self.storage
            .get_expense(expense_id)
            .await?
            .ok_or_else(|| LedgerError::ExpenseNotFound(expense_id.to_string()))
    }

    /// Expenses of a group, newest first
    pub async fn group_expenses(&self, group_id: &str) -> LedgerResult<Vec<Expense>> {
        let mut expenses = self.storage.list_expenses(Some(group_id)).await?;
        expenses.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(expenses)
    }

    /// Expenses a participant paid for or shares in
    pub async fn participant_expenses(&self, participant_id: &str) -> LedgerResult<Vec<Expense>> {
        self.storage.get_participant_expenses(participant_id).await
    }

    /// Every recorded expense, in recording order
    pub async fn list_expenses(&self) -> LedgerResult<Vec<Expense>> {
        self.storage.list_expenses(None).await
    }
}

/// Builder for assembling expense drafts in code
///
/// Shares are computed on [`build`](Self::build); validation happens when the
/// draft is submitted.
#[derive(Debug, Clone)]
pub struct ExpenseBuilder {
    draft: ExpenseDraft,
    participants: Vec<ParticipantId>,
    inputs: SplitInputs,
    allocator: SplitAllocator,
}

impl ExpenseBuilder {
    /// Create a new expense builder, split equally among nobody yet
    pub fn new(
        description: impl Into<String>,
        amount: BigDecimal,
        payer_id: impl Into<ParticipantId>,
    ) -> Self {
        Self {
            draft: ExpenseDraft {
                description: description.into(),
                total_amount: Some(amount),
                payer_id: payer_id.into(),
                group_id: None,
                policy: SplitPolicy::Equal,
                allocations: Vec::new(),
                category: None,
                date: chrono::Utc::now().date_naive(),
            },
            participants: Vec::new(),
            inputs: SplitInputs::Equal,
            allocator: SplitAllocator::default(),
        }
    }

    /// Record the expense in a group
    pub fn group(mut self, group_id: impl Into<GroupId>) -> Self {
        self.draft.group_id = Some(group_id.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.draft.category = Some(category.into());
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.draft.date = date;
        self
    }

    /// Use the rounding settings of a config
    pub fn config(mut self, config: &LedgerConfig) -> Self {
        self.allocator = SplitAllocator::new(config);
        self
    }

    /// Split the total equally among the given participants
    pub fn split_equally<I, P>(mut self, participants: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ParticipantId>,
    {
        self.participants = participants.into_iter().map(Into::into).collect();
        self.inputs = SplitInputs::Equal;
        self
    }

    /// Give each participant a fixed share
    pub fn split_exact<P: Into<ParticipantId>>(mut self, shares: Vec<(P, BigDecimal)>) -> Self {
        let (participants, amounts) = keyed(shares);
        self.participants = participants;
        self.inputs = SplitInputs::Exact(amounts);
        self
    }

    /// Give each participant a percentage of the total
    pub fn split_by_percentage<P: Into<ParticipantId>>(
        mut self,
        percentages: Vec<(P, BigDecimal)>,
    ) -> Self {
        let (participants, values) = keyed(percentages);
        self.participants = participants;
        self.inputs = SplitInputs::Percentage(values);
        self
    }

    /// Build the draft
    pub fn build(mut self) -> ExpenseDraft {
        let total = self
            .draft
            .total_amount
            .clone()
            .unwrap_or_else(|| BigDecimal::from(0));
        self.draft.policy = self.inputs.policy();
        self.draft.allocations = self
            .allocator
            .allocate(&total, &self.participants, &self.inputs);
        self.draft
    }
}

fn keyed<P: Into<ParticipantId>>(
    values: Vec<(P, BigDecimal)>,
) -> (Vec<ParticipantId>, HashMap<ParticipantId, BigDecimal>) {
    let mut order = Vec::with_capacity(values.len());
    let mut map = HashMap::with_capacity(values.len());
    for (id, value) in values {
        let id = id.into();
        if !map.contains_key(&id) {
            order.push(id.clone());
            map.insert(id, value);
        }
    }
    (order, map)
}
