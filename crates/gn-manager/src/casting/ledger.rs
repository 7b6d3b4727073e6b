//! Assignment ledger: the scored (column, role) → participant rows both the
//! drag-and-drop board and the solver operate on.
//!
//! Writes enforce two invariants per column: a role holds at most one
//! participant, and a participant occupies at most one role. Dropping a
//! participant on a new role vacates whatever they held before, so the last
//! write wins. The canonical casting is simply the `main` column; there is no
//! second pair of back-reference fields to keep in sync.

use super::domain::{EventId, ParticipantId, ProposalId, ProposalRef, RoleId};
use super::error::CastingError;
use super::store::{AssignmentSlot, CastingState};

/// Resolve a role id, checking it belongs to the event the caller is acting
/// on. Cross-event references read as absent.
pub(crate) fn role_in_event(
    state: &CastingState,
    event_id: EventId,
    role_id: RoleId,
) -> Result<RoleId, CastingError> {
    match state.roles.get(&role_id) {
        Some(role) if role.event_id == event_id => Ok(role_id),
        _ => Err(CastingError::NotFound("role")),
    }
}

pub(crate) fn participant_in_event(
    state: &CastingState,
    event_id: EventId,
    participant_id: ParticipantId,
) -> Result<ParticipantId, CastingError> {
    match state.participants.get(&participant_id) {
        Some(participant) if participant.event_id == event_id => Ok(participant_id),
        _ => Err(CastingError::NotFound("participant")),
    }
}

pub(crate) fn proposal_in_event(
    state: &CastingState,
    event_id: EventId,
    proposal_id: ProposalId,
) -> Result<ProposalId, CastingError> {
    match state.proposals.get(&proposal_id) {
        Some(proposal) if proposal.event_id == event_id => Ok(proposal_id),
        _ => Err(CastingError::NotFound("proposal")),
    }
}

/// Check a column reference against the event before touching its rows.
pub(crate) fn column_in_event(
    state: &CastingState,
    event_id: EventId,
    column: ProposalRef,
) -> Result<ProposalRef, CastingError> {
    if let ProposalRef::Named(proposal_id) = column {
        proposal_in_event(state, event_id, proposal_id)?;
    }
    Ok(column)
}

/// Put `participant_id` on `role_id` in `column`, vacating the role's current
/// occupant and the participant's current slot in that column first.
pub(crate) fn assign(
    state: &mut CastingState,
    event_id: EventId,
    column: ProposalRef,
    role_id: RoleId,
    participant_id: ParticipantId,
) -> Result<(), CastingError> {
    role_in_event(state, event_id, role_id)?;
    participant_in_event(state, event_id, participant_id)?;
    column_in_event(state, event_id, column)?;

    state.assignments.remove(&(column, role_id));
    if let Some(previous_role) = occupied_role(state, column, participant_id) {
        state.assignments.remove(&(column, previous_role));
    }

    state.assignments.insert(
        (column, role_id),
        AssignmentSlot {
            participant_id,
            score: None,
        },
    );
    Ok(())
}

/// Clear the (column, role) slot. Clearing an empty slot is a no-op, which
/// makes repeated unassign clicks harmless.
pub(crate) fn unassign(
    state: &mut CastingState,
    event_id: EventId,
    column: ProposalRef,
    role_id: RoleId,
) -> Result<(), CastingError> {
    role_in_event(state, event_id, role_id)?;
    column_in_event(state, event_id, column)?;
    state.assignments.remove(&(column, role_id));
    Ok(())
}

/// Upsert the preference score of an existing proposal-column slot. A score
/// without an assignment is meaningless, and the main column never carries
/// scores at all.
pub(crate) fn update_score(
    state: &mut CastingState,
    event_id: EventId,
    column: ProposalRef,
    role_id: RoleId,
    score: i32,
) -> Result<(), CastingError> {
    if column == ProposalRef::Main {
        return Err(CastingError::validation(
            "the definitive casting column does not take scores",
        ));
    }
    role_in_event(state, event_id, role_id)?;
    column_in_event(state, event_id, column)?;

    match state.assignments.get_mut(&(column, role_id)) {
        Some(slot) => {
            slot.score = Some(score);
            Ok(())
        }
        None => Err(CastingError::NotFound("assignment")),
    }
}

/// Delete every ledger row referencing a role, across the main column and all
/// proposals. Used by role deletion.
pub(crate) fn purge_role(state: &mut CastingState, role_id: RoleId) {
    state.assignments.retain(|(_, r), _| *r != role_id);
}

/// Delete every ledger row occupied by a participant, across all columns.
/// Used when a registration is removed.
pub(crate) fn purge_participant(state: &mut CastingState, participant_id: ParticipantId) {
    state
        .assignments
        .retain(|_, slot| slot.participant_id != participant_id);
}

/// Delete every row of one proposal column. Used by proposal deletion.
pub(crate) fn purge_proposal(state: &mut CastingState, proposal_id: ProposalId) {
    state
        .assignments
        .retain(|(column, _), _| *column != ProposalRef::Named(proposal_id));
}

fn occupied_role(
    state: &CastingState,
    column: ProposalRef,
    participant_id: ParticipantId,
) -> Option<RoleId> {
    state
        .assignments
        .iter()
        .find(|((c, _), slot)| *c == column && slot.participant_id == participant_id)
        .map(|((_, role_id), _)| *role_id)
}
