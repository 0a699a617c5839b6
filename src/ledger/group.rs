//! Participant directory and group management

use crate::traits::*;
use crate::types::*;
use crate::utils::validation::{validate_id, validate_name};

/// Manager for participants and the groups they belong to
pub struct GroupManager<S: LedgerStorage> {
    pub(crate) storage: S,
}

impl<S: LedgerStorage> GroupManager<S> {
    /// Create a new group manager
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Add a participant to the directory
    pub async fn register_participant(&mut self, participant: Participant) -> LedgerResult<Participant> {
        validate_id(&participant.id)?;
        validate_name(&participant.name)?;

        if self.storage.get_participant(&participant.id).await?.is_some() {
            return Err(LedgerError::Validation(format!(
                "Participant with ID '{}' already exists",
                participant.id
            )));
        }

        self.storage.save_participant(&participant).await?;

        Ok(participant)
    }

    /// Get a participant by ID
    pub async fn get_participant(&self, participant_id: &str) -> LedgerResult<Option<Participant>> {
        self.storage.get_participant(participant_id).await
    }

    /// Get a participant by ID, returning an error if not found
    pub async fn get_participant_required(&self, participant_id: &str) -> LedgerResult<Participant> {
        self.storage
            .get_participant(participant_id)
            .await?
            .ok_or_else(|| LedgerError::ParticipantNotFound(participant_id.to_string()))
    }

    /// List all participants
    pub async fn list_participants(&self) -> LedgerResult<Vec<Participant>> {
        self.storage.list_participants().await
    }

    /// Create a group of existing participants
    pub async fn create_group(
        &mut self,
        id: String,
        name: String,
        description: String,
        members: Vec<ParticipantId>,
    ) -> LedgerResult<Group> {
        let group = Group::new(id, name, description, members);

        validate_id(&group.id)?;
        validate_name(&group.name)?;

        if group.members.is_empty() {
            return Err(LedgerError::Validation(
                "Group must have at least one member".to_string(),
            ));
        }

        // Check if group already exists
        if self.storage.get_group(&group.id).await?.is_some() {
            return Err(LedgerError::Validation(format!(
                "Group with ID '{}' already exists",
                group.id
            )));
        }

        for member in &group.members {
            if self.storage.get_participant(member).await?.is_none() {
                return Err(LedgerError::ParticipantNotFound(member.clone()));
            }
        }

        self.storage.save_group(&group).await?;

        Ok(group)
    }

    /// Get a group by ID
    pub async fn get_group(&self, group_id: &str) -> LedgerResult<Option<Group>> {
        self.storage.get_group(group_id).await
    }

    /// Get a group by ID, returning an error if not found
    pub async fn get_group_required(&self, group_id: &str) -> LedgerResult<Group> {
        self.storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| LedgerError::GroupNotFound(group_id.to_string()))
    }

    /// List all groups
    pub async fn list_groups(&self) -> LedgerResult<Vec<Group>> {
        self.storage.list_groups().await
    }

    /// List the groups a participant is a member of
    pub async fn groups_of(&self, participant_id: &str) -> LedgerResult<Vec<Group>> {
        let groups = self.storage.list_groups().await?;
        Ok(groups
            .into_iter()
            .filter(|group| group.is_member(participant_id))
            .collect())
    }

    /// Resolve the members of a group against the directory, in membership order
    pub async fn members_of(&self, group_id: &str) -> LedgerResult<Vec<Participant>> {
        let group = self.get_group_required(group_id).await?;
        let mut members = Vec::with_capacity(group.members.len());
        for member in &group.members {
            members.push(self.get_participant_required(member).await?);
        }
        Ok(members)
    }

    /// Display name of a participant, `"Unknown"` if the directory has none
    pub async fn display_name(&self, participant_id: &str) -> LedgerResult<String> {
        Ok(self
            .storage
            .get_participant(participant_id)
            .await?
            .map(|p| p.name)
            .unwrap_or_else(|| "Unknown".to_string()))
    }
}
