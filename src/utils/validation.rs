//! Validation utilities

use bigdecimal::BigDecimal;
use std::collections::HashSet;

use crate::config::LedgerConfig;
use crate::traits::*;
use crate::types::*;

/// Validate that a participant or group ID is valid
pub fn validate_id(id: &str) -> LedgerResult<()> {
    if id.trim().is_empty() {
        return Err(LedgerError::Validation("ID cannot be empty".to_string()));
    }

    if id.len() > 50 {
        return Err(LedgerError::Validation(
            "ID cannot exceed 50 characters".to_string(),
        ));
    }

    // Check for valid characters (alphanumeric, dashes, underscores)
    if !id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(LedgerError::Validation(
            "ID can only contain alphanumeric characters, dashes, and underscores".to_string(),
        ));
    }

    Ok(())
}

/// Validate that a display name is valid
pub fn validate_name(name: &str) -> LedgerResult<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation("Name cannot be empty".to_string()));
    }

    if name.chars().count() > 100 {
        return Err(LedgerError::Validation(
            "Name cannot exceed 100 characters".to_string(),
        ));
    }

    Ok(())
}

/// Check the payer and every split participant belong to the group
pub fn check_membership(draft: &ExpenseDraft, group: &Group) -> ValidationReport {
    let mut report = ValidationReport::new();

    if !group.is_member(&draft.payer_id) {
        report.push(Violation::PayerNotMember(draft.payer_id.clone()));
    }

    for participant_id in draft.participant_ids() {
        if !group.is_member(participant_id) {
            report.push(Violation::ParticipantNotMember(participant_id.to_string()));
        }
    }

    report
}

/// Check the shape of individual allocations: duplicates, negative shares and
/// percentages outside 0-100
pub fn check_allocations(draft: &ExpenseDraft) -> ValidationReport {
    let mut report = ValidationReport::new();
    let zero = BigDecimal::from(0);
    let hundred = BigDecimal::from(100);
    let mut seen = HashSet::new();

    for allocation in &draft.allocations {
        let id = &allocation.participant_id;

        if !seen.insert(id.as_str()) {
            report.push(Violation::DuplicateParticipant(id.clone()));
        }

        if allocation.amount < zero {
            report.push(Violation::NegativeShare(id.clone()));
        }

        if draft.policy == SplitPolicy::Percentage
            && (allocation.percentage < zero || allocation.percentage > hundred)
        {
            report.push(Violation::PercentageOutOfRange(id.clone()));
        }
    }

    report
}

/// Strict validator: the default rules plus a description length limit
pub struct StrictExpenseValidator;

impl ExpenseValidator for StrictExpenseValidator {
    fn validate_draft(&self, draft: &ExpenseDraft, config: &LedgerConfig) -> ValidationReport {
        let mut report = DefaultExpenseValidator.validate_draft(draft, config);

        if draft.description.trim().chars().count() > config.max_description_len {
            report.push(Violation::DescriptionTooLong {
                max: config.max_description_len,
            });
        }

        report
    }

    fn validate_membership(&self, draft: &ExpenseDraft, group: &Group) -> ValidationReport {
        check_membership(draft, group)
    }
}
