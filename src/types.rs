//! Core types and data structures for the expense ledger

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::LedgerConfig;

/// Opaque, stable identifier of a participant
pub type ParticipantId = String;
/// Identifier of a group
pub type GroupId = String;
/// Identifier of a recorded expense
pub type ExpenseId = String;

/// A person who can pay for or share in expenses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Unique identifier for the participant
    pub id: ParticipantId,
    /// Display name
    pub name: String,
    /// Optional contact email
    pub email: Option<String>,
}

impl Participant {
    /// Create a new participant
    pub fn new(id: impl Into<ParticipantId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
        }
    }

    /// Attach a contact email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// A set of participants sharing expenses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Unique identifier for the group
    pub id: GroupId,
    /// Human-readable group name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Member ids in membership order, no duplicates
    pub members: Vec<ParticipantId>,
    /// When the group was created
    pub created_at: NaiveDate,
}

impl Group {
    /// Create a new group. Repeated member ids keep their first position.
    pub fn new(
        id: impl Into<GroupId>,
        name: impl Into<String>,
        description: impl Into<String>,
        members: Vec<ParticipantId>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            members: dedup_ordered(members),
            created_at: chrono::Utc::now().date_naive(),
        }
    }

    /// Whether the participant belongs to this group
    pub fn is_member(&self, participant_id: &str) -> bool {
        self.members.iter().any(|m| m == participant_id)
    }
}

/// Rule for dividing an expense among its selected participants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitPolicy {
    /// Everyone selected pays the same share
    #[default]
    Equal,
    /// Shares are entered directly per participant
    Exact,
    /// Shares derive from a percentage per participant
    Percentage,
}

impl fmt::Display for SplitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitPolicy::Equal => write!(f, "equal"),
            SplitPolicy::Exact => write!(f, "exact"),
            SplitPolicy::Percentage => write!(f, "percentage"),
        }
    }
}

/// One participant's share of an expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Participant owing this share
    pub participant_id: ParticipantId,
    /// Share amount
    pub amount: BigDecimal,
    /// Percentage of the total; zero unless the policy is `Percentage`
    pub percentage: BigDecimal,
}

impl Allocation {
    /// Create an allocation without a percentage
    pub fn share(participant_id: impl Into<ParticipantId>, amount: BigDecimal) -> Self {
        Self {
            participant_id: participant_id.into(),
            amount,
            percentage: BigDecimal::from(0),
        }
    }

    /// Create an allocation carrying the percentage it was derived from
    pub fn with_percentage(
        participant_id: impl Into<ParticipantId>,
        amount: BigDecimal,
        percentage: BigDecimal,
    ) -> Self {
        Self {
            participant_id: participant_id.into(),
            amount,
            percentage,
        }
    }
}

/// Sum the share amounts of a set of allocations
pub fn total_allocated(allocations: &[Allocation]) -> BigDecimal {
    allocations.iter().map(|a| &a.amount).sum()
}

/// Sum the percentages of a set of allocations
pub fn total_percentage(allocations: &[Allocation]) -> BigDecimal {
    allocations.iter().map(|a| &a.percentage).sum()
}

/// An expense that has not been accepted yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseDraft {
    pub description: String,
    /// `None` when the caller has not entered an amount
    pub total_amount: Option<BigDecimal>,
    pub payer_id: ParticipantId,
    pub group_id: Option<GroupId>,
    pub policy: SplitPolicy,
    /// Selected participants only
    pub allocations: Vec<Allocation>,
    pub category: Option<String>,
    pub date: NaiveDate,
}

impl ExpenseDraft {
    /// Ids of the selected participants, in selection order
    pub fn participant_ids(&self) -> impl Iterator<Item = &str> {
        self.allocations.iter().map(|a| a.participant_id.as_str())
    }

    /// Check the basic split rules. Every rule is evaluated.
    pub fn validate(&self, config: &LedgerConfig) -> ValidationReport {
        let mut report = ValidationReport::new();
        let zero = BigDecimal::from(0);

        if self.description.trim().is_empty() {
            report.push(Violation::EmptyDescription);
        }

        let total = self.total_amount.clone().unwrap_or_else(|| zero.clone());
        if total <= zero {
            report.push(Violation::InvalidAmount);
        }

        if self.allocations.is_empty() {
            report.push(Violation::NoParticipants);
        }

        let difference = &total - total_allocated(&self.allocations);
        if !config.within_tolerance(&difference) {
            report.push(Violation::AllocationMismatch { difference });
        }

        if self.policy == SplitPolicy::Percentage {
            let percentage = total_percentage(&self.allocations);
            if !config.within_tolerance(&(&percentage - BigDecimal::from(100))) {
                report.push(Violation::PercentageMismatch { total: percentage });
            }
        }

        report
    }
}

/// An accepted, immutable expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Unique identifier for the expense
    pub id: ExpenseId,
    pub description: String,
    /// Total amount paid
    pub amount: BigDecimal,
    /// Who paid
    pub payer_id: ParticipantId,
    /// Owning group, if any
    pub group_id: Option<GroupId>,
    /// Policy the shares were computed under
    pub policy: SplitPolicy,
    /// Per-participant shares
    pub allocations: Vec<Allocation>,
    pub category: Option<String>,
    /// Date the expense occurred
    pub date: NaiveDate,
    /// When the expense was recorded
    pub created_at: NaiveDateTime,
}

impl Expense {
    /// Shape an accepted draft into an expense
    pub fn from_draft(id: impl Into<ExpenseId>, draft: ExpenseDraft) -> LedgerResult<Self> {
        let amount = draft.total_amount.ok_or_else(|| {
            LedgerError::Validation("Expense amount is required".to_string())
        })?;

        Ok(Self {
            id: id.into(),
            description: draft.description.trim().to_string(),
            amount,
            payer_id: draft.payer_id,
            group_id: draft.group_id,
            policy: draft.policy,
            allocations: draft.allocations,
            category: draft.category,
            date: draft.date,
            created_at: chrono::Utc::now().naive_utc(),
        })
    }

    /// Ids of the participants sharing this expense
    pub fn participant_ids(&self) -> impl Iterator<Item = &str> {
        self.allocations.iter().map(|a| a.participant_id.as_str())
    }

    /// Recorded share of a participant, if they are part of the split
    pub fn share_of(&self, participant_id: &str) -> Option<&BigDecimal> {
        self.allocations
            .iter()
            .find(|a| a.participant_id == participant_id)
            .map(|a| &a.amount)
    }

    /// Whether the participant paid for or shares in this expense
    pub fn involves(&self, participant_id: &str) -> bool {
        self.payer_id == participant_id || self.share_of(participant_id).is_some()
    }

    /// Whether the expense belongs to the given group
    pub fn in_group(&self, group_id: &str) -> bool {
        self.group_id.as_deref() == Some(group_id)
    }
}

/// Net position of a participant within a scope.
///
/// Positive means the participant is owed money, negative means they owe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub participant_id: ParticipantId,
    pub amount: BigDecimal,
}

impl Balance {
    pub fn new(participant_id: impl Into<ParticipantId>, amount: BigDecimal) -> Self {
        Self {
            participant_id: participant_id.into(),
            amount,
        }
    }

    /// Others owe this participant
    pub fn is_owed(&self) -> bool {
        self.amount > BigDecimal::from(0)
    }

    /// This participant owes others
    pub fn owes(&self) -> bool {
        self.amount < BigDecimal::from(0)
    }

    pub fn is_settled(&self) -> bool {
        self.amount == BigDecimal::from(0)
    }
}

/// Balance line resolved against the participant directory for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceLine {
    pub participant_id: ParticipantId,
    /// Display name, `"Unknown"` when the directory has no entry
    pub name: String,
    pub amount: BigDecimal,
}

/// A participant's net position inside one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupPosition {
    pub group_id: GroupId,
    pub group_name: String,
    /// Zero when the participant is settled in this group
    pub amount: BigDecimal,
}

/// A single broken validation rule
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Violation {
    #[error("Description is required")]
    EmptyDescription,
    #[error("Description cannot exceed {max} characters")]
    DescriptionTooLong { max: usize },
    #[error("Please enter a valid amount")]
    InvalidAmount,
    #[error("Select at least one participant")]
    NoParticipants,
    /// `difference` is the total minus the allocated sum
    #[error("Amounts don't add up. Difference: {difference}")]
    AllocationMismatch { difference: BigDecimal },
    #[error("Percentages must add up to 100%. Current total: {total}%")]
    PercentageMismatch { total: BigDecimal },
    #[error("Participant '{0}' is selected more than once")]
    DuplicateParticipant(ParticipantId),
    #[error("Share of participant '{0}' cannot be negative")]
    NegativeShare(ParticipantId),
    #[error("Percentage of participant '{0}' must be between 0 and 100")]
    PercentageOutOfRange(ParticipantId),
    #[error("Payer '{0}' is not a member of the group")]
    PayerNotMember(ParticipantId),
    #[error("Participant '{0}' is not a member of the group")]
    ParticipantNotMember(ParticipantId),
}

/// Outcome of validating a draft; empty means valid
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    /// Record a violation
    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Append another report's violations
    pub fn merge(&mut self, other: ValidationReport) {
        self.violations.extend(other.violations);
    }

    pub fn contains(&self, predicate: impl Fn(&Violation) -> bool) -> bool {
        self.violations.iter().any(predicate)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.violations.iter().map(|v| v.to_string()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// Errors that can occur in the ledger system
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Participant not found: {0}")]
    ParticipantNotFound(String),
    #[error("Group not found: {0}")]
    GroupNotFound(String),
    #[error("Expense not found: {0}")]
    ExpenseNotFound(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors returned when submitting a draft. The draft stays editable.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Expense rejected: {0}")]
    Rejected(ValidationReport),
    #[error("A submission is already in progress")]
    AlreadySubmitting,
    #[error("Failed to add expense: {0}")]
    Transport(#[from] LedgerError),
}

pub(crate) fn dedup_ordered(ids: Vec<ParticipantId>) -> Vec<ParticipantId> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
