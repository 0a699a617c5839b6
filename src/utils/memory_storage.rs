//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::*;
use crate::types::*;

/// In-memory storage implementation for testing and development
///
/// Clones share the same underlying data.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    participants: Arc<RwLock<HashMap<ParticipantId, Participant>>>,
    groups: Arc<RwLock<HashMap<GroupId, Group>>>,
    expenses: Arc<RwLock<Vec<Expense>>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self {
            participants: Arc::new(RwLock::new(HashMap::new())),
            groups: Arc::new(RwLock::new(HashMap::new())),
            expenses: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> LedgerResult<()> {
        write(&self.participants)?.clear();
        write(&self.groups)?.clear();
        write(&self.expenses)?.clear();
        Ok(())
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn read<T>(lock: &RwLock<T>) -> LedgerResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| LedgerError::Storage("storage lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> LedgerResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| LedgerError::Storage("storage lock poisoned".to_string()))
}

#[async_trait]
impl LedgerStorage for MemoryStorage {
    async fn save_participant(&mut self, participant: &Participant) -> LedgerResult<()> {
        write(&self.participants)?.insert(participant.id.clone(), participant.clone());
        Ok(())
    }

    async fn get_participant(&self, participant_id: &str) -> LedgerResult<Option<Participant>> {
        Ok(read(&self.participants)?.get(participant_id).cloned())
    }

    async fn list_participants(&self) -> LedgerResult<Vec<Participant>> {
        let mut participants: Vec<Participant> =
            read(&self.participants)?.values().cloned().collect();
        participants.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(participants)
    }

    async fn save_group(&mut self, group: &Group) -> LedgerResult<()> {
        write(&self.groups)?.insert(group.id.clone(), group.clone());
        Ok(())
    }

    async fn get_group(&self, group_id: &str) -> LedgerResult<Option<Group>> {
        Ok(read(&self.groups)?.get(group_id).cloned())
    }

    async fn list_groups(&self) -> LedgerResult<Vec<Group>> {
        let mut groups: Vec<Group> = read(&self.groups)?.values().cloned().collect();
        groups.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(groups)
    }

    async fn save_expense(&mut self, expense: &Expense) -> LedgerResult<()> {
        let mut expenses = write(&self.expenses)?;
        if expenses.iter().any(|e| e.id == expense.id) {
            return Err(LedgerError::Storage(format!(
                "Expense '{}' already exists",
                expense.id
            )));
        }
        expenses.push(expense.clone());
        Ok(())
    }

    async fn get_expense(&self, expense_id: &str) -> LedgerResult<Option<Expense>> {
        Ok(read(&self.expenses)?
            .iter()
            .find(|e| e.id == expense_id)
            .cloned())
    }

    async fn list_expenses(&self, group_id: Option<&str>) -> LedgerResult<Vec<Expense>> {
        let expenses = read(&self.expenses)?;
        let filtered: Vec<Expense> = expenses
            .iter()
            .filter(|expense| group_id.is_none_or(|id| expense.in_group(id)))
            .cloned()
            .collect();
        Ok(filtered)
    }

    async fn get_participant_expenses(&self, participant_id: &str) -> LedgerResult<Vec<Expense>> {
        let expenses = read(&self.expenses)?;
        let filtered: Vec<Expense> = expenses
            .iter()
            .filter(|expense| expense.involves(participant_id))
            .cloned()
            .collect();
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn expense(id: &str, group_id: Option<&str>, payer: &str, split: &[&str]) -> Expense {
        let share = BigDecimal::from(100) / BigDecimal::from(split.len() as u64);
        Expense {
            id: id.to_string(),
            description: format!("Expense {}", id),
            amount: BigDecimal::from(100),
            payer_id: payer.to_string(),
            group_id: group_id.map(str::to_string),
            policy: SplitPolicy::Equal,
            allocations: split
                .iter()
                .map(|p| Allocation::share(*p, share.clone()))
                .collect(),
            category: None,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    #[tokio::test]
    async fn test_expense_filters() {
        let mut storage = MemoryStorage::new();
        storage
            .save_expense(&expense("e1", Some("g1"), "a", &["a", "b"]))
            .await
            .unwrap();
        storage
            .save_expense(&expense("e2", Some("g2"), "c", &["c", "d"]))
            .await
            .unwrap();
        storage
            .save_expense(&expense("e3", None, "d", &["a", "d"]))
            .await
            .unwrap();

        assert_eq!(storage.list_expenses(None).await.unwrap().len(), 3);

        let g1 = storage.list_expenses(Some("g1")).await.unwrap();
        assert_eq!(g1.len(), 1);
        assert_eq!(g1[0].id, "e1");

        let for_a: Vec<String> = storage
            .get_participant_expenses("a")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(for_a, vec!["e1", "e3"]);
    }

    #[tokio::test]
    async fn test_duplicate_expense_id_rejected() {
        let mut storage = MemoryStorage::new();
        let e1 = expense("e1", None, "a", &["a"]);
        storage.save_expense(&e1).await.unwrap();

        let result = storage.save_expense(&e1).await;
        assert!(matches!(result, Err(LedgerError::Storage(_))));
    }

    #[tokio::test]
    async fn test_clones_share_data() {
        let storage = MemoryStorage::new();
        let mut handle = storage.clone();
        handle
            .save_participant(&Participant::new("1", "Arjun"))
            .await
            .unwrap();

        assert!(storage.get_participant("1").await.unwrap().is_some());

        storage.clear().unwrap();
        assert!(handle.list_participants().await.unwrap().is_empty());
    }
}
