//! Read-only aggregate of one event's casting board: every validated
//! participant partitioned by type, every role, every proposal column, and the
//! assignment/score cells. This is the single query contract the board UI
//! renders from.

use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{EventId, ParticipantId, ProposalId, ProposalRef, RoleId};
use super::store::CastingState;

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantView {
    pub id: ParticipantId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub group: Option<String>,
    pub role_id: Option<RoleId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleView {
    pub id: RoleId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub genre: Option<String>,
    pub group: Option<String>,
    pub comment: Option<String>,
    pub assigned_participant_id: Option<ParticipantId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProposalView {
    pub id: ProposalId,
    pub name: String,
}

/// Column-indexed cells: outer key is `"main"` or the proposal id, inner key
/// is the role id. Stringly keys because these maps go straight into JSON
/// objects the board indexes by column.
pub type ColumnCells<T> = BTreeMap<String, BTreeMap<String, T>>;

#[derive(Debug, Clone, Serialize)]
pub struct CastingSnapshot {
    pub participants_by_type: BTreeMap<&'static str, Vec<ParticipantView>>,
    pub roles: Vec<RoleView>,
    pub proposals: Vec<ProposalView>,
    pub assignments: ColumnCells<ParticipantId>,
    pub scores: ColumnCells<i32>,
    pub is_casting_validated: bool,
}

/// Assemble the board for one event. Only `Validé` participants appear in the
/// pool; roles are ordered by (group, name, id) so the board renders stably.
pub(crate) fn build(state: &CastingState, event_id: EventId) -> CastingSnapshot {
    let mut participants_by_type: BTreeMap<&'static str, Vec<ParticipantView>> = BTreeMap::new();
    for participant in state.participants.values() {
        if participant.event_id != event_id || !participant.is_validated() {
            continue;
        }
        let name = state
            .users
            .get(&participant.user_id)
            .map(|user| user.display_name())
            .unwrap_or_default();
        participants_by_type
            .entry(participant.kind.label())
            .or_default()
            .push(ParticipantView {
                id: participant.id,
                name,
                kind: participant.kind.label(),
                group: participant.group.clone(),
                role_id: state.role_of(participant.id),
            });
    }

    let mut roles: Vec<RoleView> = state
        .roles
        .values()
        .filter(|role| role.event_id == event_id)
        .map(|role| RoleView {
            id: role.id,
            name: role.name.clone(),
            kind: role.kind.label(),
            genre: role.genre.clone(),
            group: role.group.clone(),
            comment: role.comment.clone(),
            assigned_participant_id: state.assigned_participant(role.id),
        })
        .collect();
    roles.sort_by(|a, b| {
        (&a.group, &a.name, a.id).cmp(&(&b.group, &b.name, b.id))
    });

    let proposals: Vec<ProposalView> = state
        .proposals
        .values()
        .filter(|proposal| proposal.event_id == event_id)
        .map(|proposal| ProposalView {
            id: proposal.id,
            name: proposal.name.clone(),
        })
        .collect();

    let mut assignments: ColumnCells<ParticipantId> = BTreeMap::new();
    let mut scores: ColumnCells<i32> = BTreeMap::new();
    for ((column, role_id), slot) in &state.assignments {
        if !column_belongs_to_event(state, *column, event_id)
            || !role_belongs_to_event(state, *role_id, event_id)
        {
            continue;
        }
        let column_key = column.column_key();
        assignments
            .entry(column_key.clone())
            .or_default()
            .insert(role_id.0.to_string(), slot.participant_id);
        if let Some(score) = slot.score {
            scores
                .entry(column_key)
                .or_default()
                .insert(role_id.0.to_string(), score);
        }
    }

    let is_casting_validated = state
        .events
        .get(&event_id)
        .map(|event| event.is_casting_validated)
        .unwrap_or(false);

    CastingSnapshot {
        participants_by_type,
        roles,
        proposals,
        assignments,
        scores,
        is_casting_validated,
    }
}

fn column_belongs_to_event(state: &CastingState, column: ProposalRef, event_id: EventId) -> bool {
    match column {
        ProposalRef::Main => true,
        ProposalRef::Named(proposal_id) => state
            .proposals
            .get(&proposal_id)
            .map(|proposal| proposal.event_id == event_id)
            .unwrap_or(false),
    }
}

fn role_belongs_to_event(state: &CastingState, role_id: RoleId, event_id: EventId) -> bool {
    state
        .roles
        .get(&role_id)
        .map(|role| role.event_id == event_id)
        .unwrap_or(false)
}
