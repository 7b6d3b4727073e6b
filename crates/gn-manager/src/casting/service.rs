use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use super::domain::{
    CastingProposal, Event, EventId, Participant, ParticipantId, ParticipantType, ProposalRef,
    RegistrationStatus, Role, RoleDraft, RoleId, RoleUpdate, StatusAction, User, UserId,
};
use super::error::CastingError;
use super::ledger;
use super::snapshot::{self, CastingSnapshot};
use super::solver::{self, AssignedPair};
use super::store::TransactionalStore;

/// Outcome of an automatic casting run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AutoAssignOutcome {
    pub assigned: usize,
    pub pairs: Vec<AssignedPair>,
}

/// Service facade over the casting store. Every public operation is one
/// transaction: it either commits whole or leaves the store untouched.
pub struct CastingService<S> {
    store: Arc<S>,
}

impl<S> CastingService<S>
where
    S: TransactionalStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    // --- account / event substrate -------------------------------------

    pub fn create_user(
        &self,
        email: &str,
        nom: &str,
        prenom: &str,
    ) -> Result<User, CastingError> {
        if email.trim().is_empty() {
            return Err(CastingError::validation("email must not be empty"));
        }
        self.store.write(|state| {
            let id = state.allocate_user_id();
            let user = User {
                id,
                email: email.trim().to_string(),
                nom: nom.to_string(),
                prenom: prenom.to_string(),
            };
            state.users.insert(id, user.clone());
            Ok(user)
        })
    }

    pub fn create_event(
        &self,
        name: &str,
        date_start: NaiveDate,
        date_end: NaiveDate,
    ) -> Result<Event, CastingError> {
        if name.trim().is_empty() {
            return Err(CastingError::validation("event name must not be empty"));
        }
        if date_end < date_start {
            return Err(CastingError::validation("event ends before it starts"));
        }
        self.store.write(|state| {
            let id = state.allocate_event_id();
            let event = Event {
                id,
                name: name.trim().to_string(),
                date_start,
                date_end,
                is_casting_validated: false,
            };
            state.events.insert(id, event.clone());
            Ok(event)
        })
    }

    pub fn get_event(&self, event_id: EventId) -> Result<Event, CastingError> {
        self.store
            .read(|state| state.events.get(&event_id).cloned())?
            .ok_or(CastingError::NotFound("event"))
    }

    /// Register a user to an event. Registrations start in `À valider` except
    /// for organizers, who join validated (they created or run the event).
    pub fn register_participant(
        &self,
        event_id: EventId,
        user_id: UserId,
        kind: ParticipantType,
        group: Option<&str>,
    ) -> Result<Participant, CastingError> {
        self.store.write(|state| {
            if !state.events.contains_key(&event_id) {
                return Err(CastingError::NotFound("event"));
            }
            if !state.users.contains_key(&user_id) {
                return Err(CastingError::NotFound("user"));
            }
            let already = state
                .participants
                .values()
                .any(|p| p.event_id == event_id && p.user_id == user_id);
            if already {
                return Err(CastingError::validation("user already registered"));
            }
            let id = state.allocate_participant_id();
            let registration_status = if kind == ParticipantType::Organisateur {
                RegistrationStatus::Validated
            } else {
                RegistrationStatus::ToValidate
            };
            let participant = Participant {
                id,
                event_id,
                user_id,
                kind,
                group: group.map(str::to_string),
                registration_status,
            };
            state.participants.insert(id, participant.clone());
            Ok(participant)
        })
    }

    pub fn get_participant(
        &self,
        participant_id: ParticipantId,
    ) -> Result<Participant, CastingError> {
        self.store
            .read(|state| state.participants.get(&participant_id).cloned())?
            .ok_or(CastingError::NotFound("participant"))
    }

    /// Remove a registration, clearing the canonical projection and every
    /// proposal slot the participant occupies.
    pub fn remove_participant(
        &self,
        event_id: EventId,
        participant_id: ParticipantId,
    ) -> Result<(), CastingError> {
        self.store.write(|state| {
            ledger::participant_in_event(state, event_id, participant_id)?;
            ledger::purge_participant(state, participant_id);
            state.participants.remove(&participant_id);
            Ok(())
        })
    }

    // --- registration status machine ------------------------------------

    /// Apply an organizer action (`validate` / `reject` / `pending`) to a
    /// registration. Moving a participant away from `Validé` deliberately
    /// leaves any role they already hold in place.
    pub fn change_status(
        &self,
        event_id: EventId,
        participant_id: ParticipantId,
        action: &str,
    ) -> Result<Participant, CastingError> {
        let action = StatusAction::parse(action)
            .ok_or_else(|| CastingError::validation(format!("unknown action '{action}'")))?;
        self.store.write(|state| {
            ledger::participant_in_event(state, event_id, participant_id)?;
            let participant = state
                .participants
                .get_mut(&participant_id)
                .ok_or(CastingError::NotFound("participant"))?;
            participant.registration_status = action.target_status();
            Ok(participant.clone())
        })
    }

    // --- role registry ---------------------------------------------------

    pub fn create_role(&self, event_id: EventId, draft: RoleDraft) -> Result<Role, CastingError> {
        if draft.name.trim().is_empty() {
            return Err(CastingError::validation("role name must not be empty"));
        }
        self.store.write(|state| {
            if !state.events.contains_key(&event_id) {
                return Err(CastingError::NotFound("event"));
            }
            let id = state.allocate_role_id();
            let role = Role {
                id,
                event_id,
                name: draft.name.trim().to_string(),
                kind: draft.kind,
                genre: draft.genre,
                group: draft.group,
                comment: draft.comment,
                google_doc_url: draft.google_doc_url,
                pdf_url: draft.pdf_url,
            };
            state.roles.insert(id, role.clone());
            Ok(role)
        })
    }

    pub fn update_role(
        &self,
        event_id: EventId,
        role_id: RoleId,
        update: RoleUpdate,
    ) -> Result<Role, CastingError> {
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(CastingError::validation("role name must not be empty"));
            }
        }
        self.store.write(|state| {
            ledger::role_in_event(state, event_id, role_id)?;
            let role = state
                .roles
                .get_mut(&role_id)
                .ok_or(CastingError::NotFound("role"))?;
            if let Some(name) = update.name {
                role.name = name.trim().to_string();
            }
            if let Some(kind) = update.kind {
                role.kind = kind;
            }
            if let Some(genre) = update.genre {
                role.genre = Some(genre);
            }
            if let Some(group) = update.group {
                role.group = Some(group);
            }
            if let Some(comment) = update.comment {
                role.comment = Some(comment);
            }
            if let Some(url) = update.google_doc_url {
                role.google_doc_url = Some(url);
            }
            if let Some(url) = update.pdf_url {
                role.pdf_url = Some(url);
            }
            Ok(role.clone())
        })
    }

    /// Delete a role, first clearing the canonical projection and every
    /// ledger row referencing it so no registration keeps a dangling slot.
    pub fn delete_role(&self, event_id: EventId, role_id: RoleId) -> Result<(), CastingError> {
        self.store.write(|state| {
            ledger::role_in_event(state, event_id, role_id)?;
            ledger::purge_role(state, role_id);
            state.roles.remove(&role_id);
            Ok(())
        })
    }

    /// Roles of an event ordered by (group, name, id) for stable rendering.
    pub fn list_roles(&self, event_id: EventId) -> Result<Vec<Role>, CastingError> {
        self.store.read(|state| {
            if !state.events.contains_key(&event_id) {
                return Err(CastingError::NotFound("event"));
            }
            let mut roles: Vec<Role> = state
                .roles
                .values()
                .filter(|role| role.event_id == event_id)
                .cloned()
                .collect();
            roles.sort_by(|a, b| (&a.group, &a.name, a.id).cmp(&(&b.group, &b.name, b.id)));
            Ok(roles)
        })?
    }

    // --- proposal store --------------------------------------------------

    pub fn create_proposal(
        &self,
        event_id: EventId,
        name: &str,
    ) -> Result<CastingProposal, CastingError> {
        if name.trim().is_empty() {
            return Err(CastingError::validation("proposal name must not be empty"));
        }
        self.store.write(|state| {
            if !state.events.contains_key(&event_id) {
                return Err(CastingError::NotFound("event"));
            }
            let id = state.allocate_proposal_id();
            let proposal = CastingProposal {
                id,
                event_id,
                name: name.trim().to_string(),
            };
            state.proposals.insert(id, proposal.clone());
            Ok(proposal)
        })
    }

    /// Proposals of an event in creation order.
    pub fn list_proposals(&self, event_id: EventId) -> Result<Vec<CastingProposal>, CastingError> {
        self.store.read(|state| {
            if !state.events.contains_key(&event_id) {
                return Err(CastingError::NotFound("event"));
            }
            Ok(state
                .proposals
                .values()
                .filter(|proposal| proposal.event_id == event_id)
                .cloned()
                .collect())
        })?
    }

    /// Delete a proposal column and its rows. The definitive column is not a
    /// proposal and refuses deletion.
    pub fn delete_proposal(
        &self,
        event_id: EventId,
        column: ProposalRef,
    ) -> Result<(), CastingError> {
        let proposal_id = match column {
            ProposalRef::Main => {
                return Err(CastingError::validation(
                    "the definitive casting column cannot be deleted",
                ))
            }
            ProposalRef::Named(id) => id,
        };
        self.store.write(|state| {
            ledger::proposal_in_event(state, event_id, proposal_id)?;
            ledger::purge_proposal(state, proposal_id);
            state.proposals.remove(&proposal_id);
            Ok(())
        })
    }

    // --- assignment ledger -----------------------------------------------

    pub fn assign(
        &self,
        event_id: EventId,
        column: ProposalRef,
        role_id: RoleId,
        participant_id: ParticipantId,
    ) -> Result<(), CastingError> {
        self.store
            .write(|state| ledger::assign(state, event_id, column, role_id, participant_id))
    }

    pub fn unassign(
        &self,
        event_id: EventId,
        column: ProposalRef,
        role_id: RoleId,
    ) -> Result<(), CastingError> {
        self.store
            .write(|state| ledger::unassign(state, event_id, column, role_id))
    }

    pub fn update_score(
        &self,
        event_id: EventId,
        column: ProposalRef,
        role_id: RoleId,
        score: i32,
    ) -> Result<(), CastingError> {
        self.store
            .write(|state| ledger::update_score(state, event_id, column, role_id, score))
    }

    pub fn snapshot(&self, event_id: EventId) -> Result<CastingSnapshot, CastingError> {
        self.store.read(|state| {
            if !state.events.contains_key(&event_id) {
                return Err(CastingError::NotFound("event"));
            }
            Ok(snapshot::build(state, event_id))
        })?
    }

    // --- auto-assignment solver -------------------------------------------

    /// Compute the maximum-weight matching between role-less validated
    /// participants and unfilled roles, and commit it to the definitive
    /// column. Planning and committing share one transaction, so the result
    /// lands whole or not at all.
    pub fn auto_assign(&self, event_id: EventId) -> Result<AutoAssignOutcome, CastingError> {
        let outcome = self.store.write(|state| {
            if !state.events.contains_key(&event_id) {
                return Err(CastingError::NotFound("event"));
            }
            let pairs = solver::plan_assignments(state, event_id);
            for pair in &pairs {
                ledger::assign(
                    state,
                    event_id,
                    ProposalRef::Main,
                    pair.role_id,
                    pair.participant_id,
                )?;
            }
            Ok(AutoAssignOutcome {
                assigned: pairs.len(),
                pairs,
            })
        })?;
        info!(
            event = event_id.0,
            assigned = outcome.assigned,
            "automatic casting committed"
        );
        Ok(outcome)
    }

    // --- validation gate ---------------------------------------------------

    /// Flip the advisory casting lock. Re-validating after later edits is
    /// allowed; the ledger itself stays writable.
    pub fn toggle_validation(
        &self,
        event_id: EventId,
        validated: bool,
    ) -> Result<bool, CastingError> {
        self.store.write(|state| {
            let event = state
                .events
                .get_mut(&event_id)
                .ok_or(CastingError::NotFound("event"))?;
            event.is_casting_validated = validated;
            Ok(event.is_casting_validated)
        })
    }

    // --- authorization ------------------------------------------------------

    /// Casting mutations are organizer-only: the caller must hold an
    /// Organisateur registration on the event. Unknown events stay 404 so the
    /// route layer can distinguish the two refusals.
    pub fn ensure_organizer(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<(), CastingError> {
        self.store.read(|state| {
            if !state.events.contains_key(&event_id) {
                return Err(CastingError::NotFound("event"));
            }
            let is_organizer = state.participants.values().any(|p| {
                p.event_id == event_id
                    && p.user_id == user_id
                    && p.kind == ParticipantType::Organisateur
            });
            if is_organizer {
                Ok(())
            } else {
                Err(CastingError::Permission)
            }
        })?
    }
}
