//! Live editing of an expense before it is submitted
//!
//! Every setter on [`DraftEditor`] recomputes the allocation snapshot before
//! returning, so whatever is read next (display, validation, submission)
//! always reflects the current inputs.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::LedgerConfig;
use crate::ledger::split::{SplitAllocator, SplitInputs};
use crate::traits::ExpenseValidator;
use crate::types::*;

/// One row of the participant roster in a draft
#[derive(Debug, Clone, PartialEq)]
pub struct DraftParticipant {
    pub id: ParticipantId,
    pub name: String,
    pub selected: bool,
    /// Current share; user-entered under `Exact`, derived otherwise
    pub amount: BigDecimal,
    /// Only meaningful under `Percentage`
    pub percentage: BigDecimal,
}

impl DraftParticipant {
    fn new(participant: &Participant) -> Self {
        Self {
            id: participant.id.clone(),
            name: participant.name.clone(),
            selected: true,
            amount: BigDecimal::from(0),
            percentage: BigDecimal::from(0),
        }
    }
}

/// Shared flag marking a submission as outstanding.
///
/// Clones observe the same flag, so a presentation layer can keep one to
/// disable its submit action.
#[derive(Debug, Clone, Default)]
pub struct SubmissionGate {
    in_flight: Arc<AtomicBool>,
}

impl SubmissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Claim the gate. Returns `None` while another submission holds it.
    pub fn try_begin(&self) -> Option<SubmissionPermit> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SubmissionPermit {
                in_flight: Arc::clone(&self.in_flight),
            })
    }
}

/// Held for the duration of one submission; releases the gate on drop
#[derive(Debug)]
pub struct SubmissionPermit {
    in_flight: Arc<AtomicBool>,
}

impl Drop for SubmissionPermit {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

/// In-progress expense with continuously consistent allocations
#[derive(Debug, Clone)]
pub struct DraftEditor {
    description: String,
    total_amount: Option<BigDecimal>,
    payer_id: ParticipantId,
    default_payer_id: ParticipantId,
    group_id: Option<GroupId>,
    category: Option<String>,
    date: NaiveDate,
    policy: SplitPolicy,
    participants: Vec<DraftParticipant>,
    allocations: Vec<Allocation>,
    allocator: SplitAllocator,
    gate: SubmissionGate,
}

impl DraftEditor {
    /// Start a draft over a roster. The first participant pays by default and
    /// everyone starts selected.
    pub fn new(roster: &[Participant]) -> Self {
        Self::with_config(roster, &LedgerConfig::default())
    }

    /// Start a draft using the rounding settings of a config
    pub fn with_config(roster: &[Participant], config: &LedgerConfig) -> Self {
        let mut seen = std::collections::HashSet::new();
        let participants: Vec<DraftParticipant> = roster
            .iter()
            .filter(|p| seen.insert(p.id.as_str()))
            .map(DraftParticipant::new)
            .collect();
        let default_payer_id = participants
            .first()
            .map(|p| p.id.clone())
            .unwrap_or_default();

        let mut editor = Self {
            description: String::new(),
            total_amount: None,
            payer_id: default_payer_id.clone(),
            default_payer_id,
            group_id: None,
            category: None,
            date: chrono::Utc::now().date_naive(),
            policy: SplitPolicy::Equal,
            participants,
            allocations: Vec::new(),
            allocator: SplitAllocator::new(config),
            gate: SubmissionGate::new(),
        };
        editor.recompute();
        editor
    }

    /// Scope the draft to a group
    pub fn in_group(mut self, group_id: impl Into<GroupId>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_total_amount(&mut self, amount: Option<BigDecimal>) {
        self.total_amount = amount;
        self.recompute();
    }

    /// Set the total from raw text input; blank or unparsable text clears it
    pub fn set_amount_input(&mut self, input: &str) {
        let trimmed = input.trim();
        let amount = if trimmed.is_empty() {
            None
        } else {
            BigDecimal::from_str(trimmed).ok()
        };
        self.set_total_amount(amount);
    }

    /// Change who paid
    pub fn set_payer(&mut self, payer_id: &str) -> LedgerResult<()> {
        self.roster_index(payer_id)?;
        self.payer_id = payer_id.to_string();
        Ok(())
    }

    pub fn set_policy(&mut self, policy: SplitPolicy) {
        self.policy = policy;
        self.recompute();
    }

    /// Include or exclude a participant from the split
    pub fn set_selected(&mut self, participant_id: &str, selected: bool) -> LedgerResult<()> {
        let index = self.roster_index(participant_id)?;
        self.participants[index].selected = selected;
        self.recompute();
        Ok(())
    }

    /// Enter a share directly; used by the `Exact` policy
    pub fn set_exact_amount(
        &mut self,
        participant_id: &str,
        amount: BigDecimal,
    ) -> LedgerResult<()> {
        let index = self.roster_index(participant_id)?;
        self.participants[index].amount = amount;
        self.recompute();
        Ok(())
    }

    /// Enter a percentage; used by the `Percentage` policy
    pub fn set_percentage(
        &mut self,
        participant_id: &str,
        percentage: BigDecimal,
    ) -> LedgerResult<()> {
        let index = self.roster_index(participant_id)?;
        self.participants[index].percentage = percentage;
        self.recompute();
        Ok(())
    }

    pub fn set_category(&mut self, category: Option<String>) {
        self.category = category;
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = date;
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn total_amount(&self) -> Option<&BigDecimal> {
        self.total_amount.as_ref()
    }

    pub fn payer_id(&self) -> &str {
        &self.payer_id
    }

    pub fn policy(&self) -> SplitPolicy {
        self.policy
    }

    pub fn participants(&self) -> &[DraftParticipant] {
        &self.participants
    }

    /// Current allocation snapshot of the selected participants
    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    pub fn total_allocated(&self) -> BigDecimal {
        total_allocated(&self.allocations)
    }

    pub fn selected_count(&self) -> usize {
        self.allocations.len()
    }

    /// Snapshot the draft for validation or submission
    pub fn to_draft(&self) -> ExpenseDraft {
        ExpenseDraft {
            description: self.description.clone(),
            total_amount: self.total_amount.clone(),
            payer_id: self.payer_id.clone(),
            group_id: self.group_id.clone(),
            policy: self.policy,
            allocations: self.allocations.clone(),
            category: self.category.clone(),
            date: self.date,
        }
    }

    /// Run a validator over the current state without changing it
    pub fn validate(
        &self,
        validator: &dyn ExpenseValidator,
        config: &LedgerConfig,
    ) -> ValidationReport {
        validator.validate_draft(&self.to_draft(), config)
    }

    /// Gate guarding submission of this draft
    pub fn gate(&self) -> &SubmissionGate {
        &self.gate
    }

    pub fn is_submitting(&self) -> bool {
        self.gate.is_in_flight()
    }

    /// Return to a blank draft: everyone selected, default payer, equal split
    pub fn reset(&mut self) {
        self.description.clear();
        self.total_amount = None;
        self.payer_id = self.default_payer_id.clone();
        self.category = None;
        self.policy = SplitPolicy::Equal;
        for participant in &mut self.participants {
            participant.selected = true;
            participant.amount = BigDecimal::from(0);
            participant.percentage = BigDecimal::from(0);
        }
        self.recompute();
    }

    fn roster_index(&self, participant_id: &str) -> LedgerResult<usize> {
        self.participants
            .iter()
            .position(|p| p.id == participant_id)
            .ok_or_else(|| LedgerError::ParticipantNotFound(participant_id.to_string()))
    }

    fn recompute(&mut self) {
        let total = self
            .total_amount
            .clone()
            .unwrap_or_else(|| BigDecimal::from(0));
        let selected: Vec<&DraftParticipant> =
            self.participants.iter().filter(|p| p.selected).collect();
        let ids: Vec<ParticipantId> = selected.iter().map(|p| p.id.clone()).collect();

        let inputs = match self.policy {
            SplitPolicy::Equal => SplitInputs::Equal,
            SplitPolicy::Exact => SplitInputs::Exact(
                selected
                    .iter()
                    .map(|p| (p.id.clone(), p.amount.clone()))
                    .collect::<HashMap<_, _>>(),
            ),
            SplitPolicy::Percentage => SplitInputs::Percentage(
                selected
                    .iter()
                    .map(|p| (p.id.clone(), p.percentage.clone()))
                    .collect::<HashMap<_, _>>(),
            ),
        };

        self.allocations = self.allocator.allocate(&total, &ids, &inputs);

        let policy = self.policy;
        for participant in &mut self.participants {
            let share = self
                .allocations
                .iter()
                .find(|a| a.participant_id == participant.id);
            match share {
                Some(allocation) => participant.amount = allocation.amount.clone(),
                None if policy == SplitPolicy::Equal => participant.amount = BigDecimal::from(0),
                None => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::DefaultExpenseValidator;

    fn roster() -> Vec<Participant> {
        vec![
            Participant::new("1", "You"),
            Participant::new("2", "Priya"),
            Participant::new("3", "Rohit"),
            Participant::new("4", "Kavya"),
        ]
    }

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    #[test]
    fn test_new_draft_selects_everyone() {
        let editor = DraftEditor::new(&roster());

        assert_eq!(editor.selected_count(), 4);
        assert_eq!(editor.payer_id(), "1");
        assert_eq!(editor.policy(), SplitPolicy::Equal);
        assert_eq!(editor.total_allocated(), BigDecimal::from(0));
    }

    #[test]
    fn test_amount_change_recomputes_equal_shares() {
        let mut editor = DraftEditor::new(&roster());
        editor.set_amount_input("8000");

        assert!(editor
            .allocations()
            .iter()
            .all(|a| a.amount == BigDecimal::from(2000)));
        assert_eq!(editor.participants()[3].amount, BigDecimal::from(2000));
    }

    #[test]
    fn test_deselecting_zeroes_share_and_redivides() {
        let mut editor = DraftEditor::new(&roster());
        editor.set_total_amount(Some(BigDecimal::from(900)));
        editor.set_selected("4", false).unwrap();

        assert_eq!(editor.selected_count(), 3);
        assert_eq!(editor.participants()[3].amount, BigDecimal::from(0));
        assert!(editor
            .allocations()
            .iter()
            .all(|a| a.amount == BigDecimal::from(300)));
    }

    #[test]
    fn test_exact_amounts_are_kept() {
        let mut editor = DraftEditor::new(&roster());
        editor.set_total_amount(Some(BigDecimal::from(450)));
        editor.set_selected("4", false).unwrap();
        editor.set_policy(SplitPolicy::Exact);
        editor.set_exact_amount("1", BigDecimal::from(150)).unwrap();
        editor.set_exact_amount("2", BigDecimal::from(150)).unwrap();
        editor.set_exact_amount("3", BigDecimal::from(149)).unwrap();

        assert_eq!(editor.total_allocated(), BigDecimal::from(449));

        let report = editor.validate(&DefaultExpenseValidator, &LedgerConfig::default());
        assert!(report.contains(|v| *v
            == Violation::AllocationMismatch {
                difference: BigDecimal::from(1)
            }));
    }

    #[test]
    fn test_switching_to_exact_keeps_equal_shares_as_starting_point() {
        let mut editor = DraftEditor::new(&roster());
        editor.set_total_amount(Some(BigDecimal::from(100)));
        editor.set_policy(SplitPolicy::Exact);

        assert_eq!(editor.total_allocated(), BigDecimal::from(100));
    }

    #[test]
    fn test_percentage_shares_follow_total() {
        let mut editor = DraftEditor::new(&roster());
        editor.set_selected("3", false).unwrap();
        editor.set_selected("4", false).unwrap();
        editor.set_policy(SplitPolicy::Percentage);
        editor.set_total_amount(Some(BigDecimal::from(1000)));
        editor.set_percentage("1", BigDecimal::from(60)).unwrap();
        editor.set_percentage("2", BigDecimal::from(40)).unwrap();

        assert_eq!(editor.allocations()[0].amount, BigDecimal::from(600));

        editor.set_total_amount(Some(BigDecimal::from(1200)));

        assert_eq!(editor.allocations()[0].amount, BigDecimal::from(720));
        assert_eq!(editor.allocations()[1].amount, BigDecimal::from(480));
        assert_eq!(editor.allocations()[0].percentage, BigDecimal::from(60));
    }

    #[test]
    fn test_unparsable_amount_clears_total() {
        let mut editor = DraftEditor::new(&roster());
        editor.set_amount_input("12.50");
        assert_eq!(editor.total_amount(), Some(&dec("12.50")));

        editor.set_amount_input("abc");
        assert_eq!(editor.total_amount(), None);
        assert_eq!(editor.total_allocated(), BigDecimal::from(0));
    }

    #[test]
    fn test_unknown_participant_is_rejected() {
        let mut editor = DraftEditor::new(&roster());
        assert!(matches!(
            editor.set_selected("99", false),
            Err(LedgerError::ParticipantNotFound(_))
        ));
        assert!(editor.set_payer("99").is_err());
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut editor = DraftEditor::new(&roster());
        editor.set_description("Taxi");
        editor.set_total_amount(Some(BigDecimal::from(800)));
        editor.set_payer("2").unwrap();
        editor.set_policy(SplitPolicy::Percentage);
        editor.set_selected("1", false).unwrap();

        editor.reset();

        assert_eq!(editor.description(), "");
        assert_eq!(editor.total_amount(), None);
        assert_eq!(editor.payer_id(), "1");
        assert_eq!(editor.policy(), SplitPolicy::Equal);
        assert_eq!(editor.selected_count(), 4);
    }

    #[test]
    fn test_gate_allows_one_submission_at_a_time() {
        let editor = DraftEditor::new(&roster());
        let observer = editor.gate().clone();

        let permit = editor.gate().try_begin().unwrap();
        assert!(observer.is_in_flight());
        assert!(editor.is_submitting());
        assert!(observer.try_begin().is_none());

        drop(permit);
        assert!(!editor.is_submitting());
        assert!(observer.try_begin().is_some());
    }
}
