//! Command-line walkthrough: seeds a small event, records two competing
//! proposal columns, runs the automatic casting, and prints the board.

use std::sync::Arc;

use chrono::NaiveDate;
use gn_manager::casting::{
    CastingService, InMemoryStore, ParticipantType, ProposalRef, RoleDraft,
};
use gn_manager::error::AppError;

pub(crate) fn run_demo() -> Result<(), AppError> {
    let store = Arc::new(InMemoryStore::new());
    let service = CastingService::new(store);

    let event = service.create_event(
        "Les Lames du Cardinal",
        NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date"),
        NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date"),
    )?;

    let organizer = service.create_user("mj@gn.example", "Maître", "Jeu")?;
    service.register_participant(
        event.id,
        organizer.id,
        ParticipantType::Organisateur,
        None,
    )?;

    let mut participants = Vec::new();
    for (email, nom, prenom) in [
        ("alice@gn.example", "Durand", "Alice"),
        ("benoit@gn.example", "Morel", "Benoît"),
        ("chloe@gn.example", "Petit", "Chloé"),
    ] {
        let user = service.create_user(email, nom, prenom)?;
        let participant =
            service.register_participant(event.id, user.id, ParticipantType::Pj, None)?;
        service.change_status(event.id, participant.id, "validate")?;
        participants.push(participant);
    }

    let mut roles = Vec::new();
    for (name, group) in [
        ("Capitaine de la Garde", "Noblesse"),
        ("Espionne du Cardinal", "Ombre"),
        ("Tavernier", "Peuple"),
    ] {
        let role = service.create_role(
            event.id,
            RoleDraft {
                name: name.to_string(),
                group: Some(group.to_string()),
                ..RoleDraft::default()
            },
        )?;
        roles.push(role);
    }

    // Two organizers, two reading grids for the same troupe.
    let grid_a = service.create_proposal(event.id, "Lecture MJ")?;
    let grid_b = service.create_proposal(event.id, "Lecture scénariste")?;
    let scored = [
        (grid_a.id, roles[0].id, participants[0].id, 9),
        (grid_a.id, roles[1].id, participants[1].id, 7),
        (grid_a.id, roles[2].id, participants[2].id, 8),
        (grid_b.id, roles[1].id, participants[0].id, 3),
        (grid_b.id, roles[2].id, participants[1].id, 4),
    ];
    for (proposal_id, role_id, participant_id, score) in scored {
        let column = ProposalRef::Named(proposal_id);
        service.assign(event.id, column, role_id, participant_id)?;
        service.update_score(event.id, column, role_id, score)?;
    }

    let outcome = service.auto_assign(event.id)?;
    println!(
        "Casting automatique : {} rôle(s) attribué(s)\n",
        outcome.assigned
    );

    let snapshot = service.snapshot(event.id)?;
    for role in &snapshot.roles {
        let holder = role
            .assigned_participant_id
            .and_then(|id| {
                snapshot
                    .participants_by_type
                    .values()
                    .flatten()
                    .find(|p| p.id == id)
            })
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "—".to_string());
        println!(
            "{:<24} [{}]  {}",
            role.name,
            role.group.as_deref().unwrap_or("sans groupe"),
            holder
        );
    }

    service.toggle_validation(event.id, true)?;
    let event = service.get_event(event.id)?;
    println!(
        "\nCasting validé : {}",
        if event.is_casting_validated {
            "oui"
        } else {
            "non"
        }
    );

    Ok(())
}
