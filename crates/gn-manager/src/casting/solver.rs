//! Automatic casting: a maximum-weight one-to-one matching between validated
//! participants without a role and roles without an assignee.
//!
//! Preference weights are the per-pair sums of scores recorded across every
//! proposal column of the event. The matrix is solved with the Hungarian
//! algorithm (potentials + augmenting paths, O(n³)), not a greedy sort: two
//! organizers scoring 10/1/10 across columns must end with both roles filled
//! at total 20, which greedy choices do not guarantee.
//!
//! Determinism: participants and roles enter the matrix sorted by ascending
//! id and the algorithm itself is deterministic over that ordering, so ties
//! between equal-total matchings always resolve the same way.

use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{EventId, ParticipantId, ProposalRef, RoleId};
use super::store::CastingState;

/// One committed pairing, reported back for board feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AssignedPair {
    pub role_id: RoleId,
    pub participant_id: ParticipantId,
}

/// Build the candidate sets and solve. Returns the pairs to commit, ordered
/// by ascending role id; an empty side yields an empty plan rather than an
/// error.
pub(crate) fn plan_assignments(state: &CastingState, event_id: EventId) -> Vec<AssignedPair> {
    let participants: Vec<ParticipantId> = state
        .participants
        .values()
        .filter(|p| p.event_id == event_id && p.is_validated() && state.role_of(p.id).is_none())
        .map(|p| p.id)
        .collect();

    let roles: Vec<RoleId> = state
        .roles
        .values()
        .filter(|r| r.event_id == event_id && state.assigned_participant(r.id).is_none())
        .map(|r| r.id)
        .collect();

    if participants.is_empty() || roles.is_empty() {
        return Vec::new();
    }

    let weights = aggregate_weights(state, event_id);
    let weight_of = |p: ParticipantId, r: RoleId| weights.get(&(p, r)).copied().unwrap_or(0);

    // Hungarian wants rows <= columns; flip the matrix when roles are the
    // scarcer side.
    let pairs: Vec<AssignedPair> = if participants.len() <= roles.len() {
        let matrix: Vec<Vec<i64>> = participants
            .iter()
            .map(|&p| roles.iter().map(|&r| -weight_of(p, r)).collect())
            .collect();
        hungarian_min(&matrix)
            .into_iter()
            .enumerate()
            .map(|(row, col)| AssignedPair {
                role_id: roles[col],
                participant_id: participants[row],
            })
            .collect()
    } else {
        let matrix: Vec<Vec<i64>> = roles
            .iter()
            .map(|&r| participants.iter().map(|&p| -weight_of(p, r)).collect())
            .collect();
        hungarian_min(&matrix)
            .into_iter()
            .enumerate()
            .map(|(row, col)| AssignedPair {
                role_id: roles[row],
                participant_id: participants[col],
            })
            .collect()
    };

    let mut pairs = pairs;
    pairs.sort_by_key(|pair| pair.role_id);
    pairs
}

/// Sum the recorded scores per (participant, role) pair over every proposal
/// column of the event. Pairs nobody scored stay absent and default to 0 at
/// lookup, keeping them eligible but unpreferred.
fn aggregate_weights(
    state: &CastingState,
    event_id: EventId,
) -> BTreeMap<(ParticipantId, RoleId), i64> {
    let mut weights = BTreeMap::new();
    for ((column, role_id), slot) in &state.assignments {
        let ProposalRef::Named(proposal_id) = column else {
            continue;
        };
        let in_event = state
            .proposals
            .get(proposal_id)
            .map(|p| p.event_id == event_id)
            .unwrap_or(false);
        if !in_event {
            continue;
        }
        if let Some(score) = slot.score {
            *weights
                .entry((slot.participant_id, *role_id))
                .or_insert(0i64) += i64::from(score);
        }
    }
    weights
}

/// Rectangular assignment problem, minimization form: `cost` has n rows and
/// m >= n columns, every row ends up matched. Returns the column chosen for
/// each row. Classic potentials formulation; `INF` guards the virtual column 0.
fn hungarian_min(cost: &[Vec<i64>]) -> Vec<usize> {
    let n = cost.len();
    let m = cost.first().map(Vec::len).unwrap_or(0);
    debug_assert!(n <= m, "matrix must be wide: {n} rows, {m} columns");

    const INF: i64 = i64::MAX / 4;
    let mut u = vec![0i64; n + 1];
    let mut v = vec![0i64; m + 1];
    // p[j] = 1-based row currently matched to column j; 0 = free.
    let mut p = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0usize;
        let mut minv = vec![INF; m + 1];
        let mut used = vec![false; m + 1];

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = INF;
            let mut j1 = 0usize;
            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let reduced = cost[i0 - 1][j - 1] - u[i0] - v[j];
                if reduced < minv[j] {
                    minv[j] = reduced;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            for j in 0..=m {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        // Walk the augmenting path back, flipping matches along the way.
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0usize; n];
    for j in 1..=m {
        if p[j] > 0 {
            assignment[p[j] - 1] = j - 1;
        }
    }
    assignment
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(cost: &[Vec<i64>], assignment: &[usize]) -> i64 {
        assignment
            .iter()
            .enumerate()
            .map(|(row, &col)| cost[row][col])
            .sum()
    }

    #[test]
    fn square_matrix_finds_the_cheapest_assignment() {
        let cost = vec![
            vec![4, 1, 3],
            vec![2, 0, 5],
            vec![3, 2, 2],
        ];
        let assignment = hungarian_min(&cost);
        assert_eq!(total(&cost, &assignment), 5);

        let mut seen = assignment.clone();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 3, "no column is used twice");
    }

    #[test]
    fn rectangular_matrix_matches_every_row() {
        // One row, two columns: the cheaper column wins.
        let cost = vec![vec![7, 2]];
        assert_eq!(hungarian_min(&cost), vec![1]);
    }

    #[test]
    fn refuses_locally_greedy_choices() {
        // Row 0 prefers column 0 slightly less than column 1, but taking
        // column 1 greedily forces row 1 into a terrible slot. Minimization
        // mirror of the 10/1/10 casting scenario.
        let cost = vec![
            vec![-10, -1],
            vec![0, -10],
        ];
        let assignment = hungarian_min(&cost);
        assert_eq!(assignment, vec![0, 1]);
        assert_eq!(total(&cost, &assignment), -20);
    }

    #[test]
    fn unscored_pairs_still_get_matched() {
        // Zero rows everywhere: any complete matching is optimal, and the
        // result must still be a permutation.
        let cost = vec![vec![0, 0], vec![0, 0]];
        let mut assignment = hungarian_min(&cost);
        assignment.sort_unstable();
        assert_eq!(assignment, vec![0, 1]);
    }
}
