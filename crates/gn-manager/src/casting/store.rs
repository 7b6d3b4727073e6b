use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::domain::{
    CastingProposal, Event, EventId, Participant, ParticipantId, ProposalId, ProposalRef, Role,
    RoleId, User, UserId,
};

/// Storage failure surfaced to callers as a 500. The only failure mode of the
/// in-memory backend is a poisoned lock left behind by a panicking writer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// One scored slot in a casting column: the participant occupying a role in
/// that column. Main-column slots never carry a score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentSlot {
    pub participant_id: ParticipantId,
    pub score: Option<i32>,
}

/// The whole persisted state, arena style: entities live in id-ordered maps
/// and reference each other by id only. The canonical role↔participant pairing
/// is not stored twice; it is exactly the set of `ProposalRef::Main` ledger
/// rows, so the two back-references of the relational schema cannot drift.
#[derive(Debug, Clone, Default)]
pub struct CastingState {
    next_user_id: i64,
    next_event_id: i64,
    next_role_id: i64,
    next_participant_id: i64,
    next_proposal_id: i64,
    pub users: BTreeMap<UserId, User>,
    pub events: BTreeMap<EventId, Event>,
    pub roles: BTreeMap<RoleId, Role>,
    pub participants: BTreeMap<ParticipantId, Participant>,
    pub proposals: BTreeMap<ProposalId, CastingProposal>,
    /// Ledger rows keyed by (column, role). Uniqueness per (column, role) is
    /// structural; uniqueness per (column, participant) is maintained by the
    /// ledger's clear-then-write path.
    pub assignments: BTreeMap<(ProposalRef, RoleId), AssignmentSlot>,
}

impl CastingState {
    pub fn allocate_user_id(&mut self) -> UserId {
        self.next_user_id += 1;
        UserId(self.next_user_id)
    }

    pub fn allocate_event_id(&mut self) -> EventId {
        self.next_event_id += 1;
        EventId(self.next_event_id)
    }

    pub fn allocate_role_id(&mut self) -> RoleId {
        self.next_role_id += 1;
        RoleId(self.next_role_id)
    }

    pub fn allocate_participant_id(&mut self) -> ParticipantId {
        self.next_participant_id += 1;
        ParticipantId(self.next_participant_id)
    }

    pub fn allocate_proposal_id(&mut self) -> ProposalId {
        self.next_proposal_id += 1;
        ProposalId(self.next_proposal_id)
    }

    /// Canonical assignee of a role, read off the main column.
    pub fn assigned_participant(&self, role_id: RoleId) -> Option<ParticipantId> {
        self.assignments
            .get(&(ProposalRef::Main, role_id))
            .map(|slot| slot.participant_id)
    }

    /// Canonical role of a participant, read off the main column.
    pub fn role_of(&self, participant_id: ParticipantId) -> Option<RoleId> {
        self.assignments
            .iter()
            .find(|((column, _), slot)| {
                *column == ProposalRef::Main && slot.participant_id == participant_id
            })
            .map(|((_, role_id), _)| *role_id)
    }

    /// Participant occupying a role in a given column, if any.
    pub fn occupant(&self, column: ProposalRef, role_id: RoleId) -> Option<ParticipantId> {
        self.assignments
            .get(&(column, role_id))
            .map(|slot| slot.participant_id)
    }
}

/// Shared transactional store. Every operation of the casting service runs
/// inside exactly one transaction; the solver's aggregate-then-commit runs in
/// one too, which is what makes its commit all-or-nothing.
pub trait TransactionalStore: Send + Sync {
    /// Run a read-only closure against a consistent view of the state.
    fn read<T>(&self, f: impl FnOnce(&CastingState) -> T) -> Result<T, StoreError>;

    /// Run a closure against a working copy of the state. The copy replaces
    /// the live state only when the closure returns `Ok`; an `Err` discards
    /// every mutation the closure made.
    fn write<T, E>(&self, f: impl FnOnce(&mut CastingState) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>;
}

/// Mutex-serialized in-memory backend. A transaction is a clone of the state:
/// mutations land on the clone and publishing the clone is the commit. Holding
/// the lock across the whole closure gives each operation the isolation a
/// request-scoped database transaction would.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    inner: Arc<Mutex<CastingState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed helper for demos and tests: mutate the live state directly,
    /// outside any request.
    pub fn seed(&self, f: impl FnOnce(&mut CastingState)) {
        let mut guard = self.inner.lock().expect("store mutex poisoned");
        f(&mut guard);
    }
}

impl TransactionalStore for InMemoryStore {
    fn read<T>(&self, f: impl FnOnce(&CastingState) -> T) -> Result<T, StoreError> {
        let guard = self
            .inner
            .lock()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(f(&guard))
    }

    fn write<T, E>(&self, f: impl FnOnce(&mut CastingState) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut guard = self
            .inner
            .lock()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        let mut working = guard.clone();
        let value = f(&mut working)?;
        *guard = working;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::casting::domain::{ParticipantType, RegistrationStatus};
    use chrono::NaiveDate;

    fn sample_event(state: &mut CastingState) -> EventId {
        let id = state.allocate_event_id();
        state.events.insert(
            id,
            Event {
                id,
                name: "Les Brumes d'Avalon".to_string(),
                date_start: NaiveDate::from_ymd_opt(2026, 5, 1).expect("valid date"),
                date_end: NaiveDate::from_ymd_opt(2026, 5, 3).expect("valid date"),
                is_casting_validated: false,
            },
        );
        id
    }

    #[test]
    fn write_publishes_only_on_ok() {
        let store = InMemoryStore::new();

        let created: Result<EventId, StoreError> = store.write(|state| Ok(sample_event(state)));
        let event_id = created.expect("commit succeeds");

        let failed: Result<(), StoreError> = store.write(|state| {
            sample_event(state);
            Err(StoreError::Unavailable("simulated".to_string()))
        });
        assert!(failed.is_err());

        let count = store.read(|state| state.events.len()).expect("readable");
        assert_eq!(count, 1);
        let found = store
            .read(|state| state.events.contains_key(&event_id))
            .expect("readable");
        assert!(found);
    }

    #[test]
    fn canonical_projection_reads_main_rows() {
        let mut state = CastingState::default();
        let event_id = sample_event(&mut state);
        let role_id = state.allocate_role_id();
        state.roles.insert(
            role_id,
            Role {
                id: role_id,
                event_id,
                name: "Dame du Lac".to_string(),
                kind: ParticipantType::Pj,
                genre: None,
                group: None,
                comment: None,
                google_doc_url: None,
                pdf_url: None,
            },
        );
        let user_id = state.allocate_user_id();
        state.users.insert(
            user_id,
            User {
                id: user_id,
                email: "viviane@example.org".to_string(),
                nom: "Lac".to_string(),
                prenom: "Viviane".to_string(),
            },
        );
        let participant_id = state.allocate_participant_id();
        state.participants.insert(
            participant_id,
            Participant {
                id: participant_id,
                event_id,
                user_id,
                kind: ParticipantType::Pj,
                group: None,
                registration_status: RegistrationStatus::Validated,
            },
        );

        assert_eq!(state.assigned_participant(role_id), None);
        state.assignments.insert(
            (ProposalRef::Main, role_id),
            AssignmentSlot {
                participant_id,
                score: None,
            },
        );
        assert_eq!(state.assigned_participant(role_id), Some(participant_id));
        assert_eq!(state.role_of(participant_id), Some(role_id));
    }
}
