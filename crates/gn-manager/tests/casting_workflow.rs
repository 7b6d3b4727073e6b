//! Integration specifications for the casting workflow: registry, proposal
//! columns, the assignment ledger, the automatic matcher, the validation
//! gate, and the registration status machine, all driven through the public
//! service facade.

mod common {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use gn_manager::casting::{
        CastingService, Event, InMemoryStore, Participant, ParticipantType, Role, RoleDraft,
    };

    pub(crate) type Service = CastingService<InMemoryStore>;

    pub(crate) fn service() -> Service {
        CastingService::new(Arc::new(InMemoryStore::new()))
    }

    pub(crate) fn sample_event(service: &Service) -> Event {
        service
            .create_event(
                "Les Brumes d'Avalon",
                NaiveDate::from_ymd_opt(2026, 5, 1).expect("valid date"),
                NaiveDate::from_ymd_opt(2026, 5, 3).expect("valid date"),
            )
            .expect("event created")
    }

    /// Register a PJ and walk them to `Validé`, the only status castable.
    pub(crate) fn validated_pj(service: &Service, event: &Event, email: &str) -> Participant {
        let user = service
            .create_user(email, "Joueur", email.split('@').next().unwrap_or("pj"))
            .expect("user created");
        let participant = service
            .register_participant(event.id, user.id, ParticipantType::Pj, None)
            .expect("registered");
        service
            .change_status(event.id, participant.id, "validate")
            .expect("validated")
    }

    pub(crate) fn role(service: &Service, event: &Event, name: &str) -> Role {
        service
            .create_role(
                event.id,
                RoleDraft {
                    name: name.to_string(),
                    ..RoleDraft::default()
                },
            )
            .expect("role created")
    }
}

mod registry {
    use super::common::*;
    use gn_manager::casting::{CastingError, ProposalRef, RoleDraft, RoleUpdate};

    #[test]
    fn role_names_must_not_be_empty() {
        let service = service();
        let event = sample_event(&service);

        let err = service
            .create_role(
                event.id,
                RoleDraft {
                    name: "   ".to_string(),
                    ..RoleDraft::default()
                },
            )
            .expect_err("blank name refused");
        assert!(matches!(err, CastingError::Validation(_)));
    }

    #[test]
    fn duplicate_role_names_are_allowed() {
        let service = service();
        let event = sample_event(&service);

        role(&service, &event, "Garde");
        role(&service, &event, "Garde");
        let roles = service.list_roles(event.id).expect("listable");
        assert_eq!(roles.len(), 2);
    }

    #[test]
    fn roles_list_ordered_by_group_then_name() {
        let service = service();
        let event = sample_event(&service);

        for (name, group) in [
            ("Héraut", Some("Noblesse")),
            ("Capitaine", Some("Garde")),
            ("Sergent", Some("Garde")),
            ("Errant", None),
        ] {
            service
                .create_role(
                    event.id,
                    RoleDraft {
                        name: name.to_string(),
                        group: group.map(str::to_string),
                        ..RoleDraft::default()
                    },
                )
                .expect("role created");
        }

        let names: Vec<String> = service
            .list_roles(event.id)
            .expect("listable")
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, ["Errant", "Capitaine", "Sergent", "Héraut"]);
    }

    #[test]
    fn updating_a_role_from_another_event_is_not_found() {
        let service = service();
        let event = sample_event(&service);
        let other = service
            .create_event(
                "Autre GN",
                chrono::NaiveDate::from_ymd_opt(2027, 1, 8).expect("valid date"),
                chrono::NaiveDate::from_ymd_opt(2027, 1, 10).expect("valid date"),
            )
            .expect("event created");
        let foreign = role(&service, &other, "Intrus");

        let err = service
            .update_role(
                event.id,
                foreign.id,
                RoleUpdate {
                    name: Some("Renommé".to_string()),
                    ..RoleUpdate::default()
                },
            )
            .expect_err("cross-event update refused");
        assert!(matches!(err, CastingError::NotFound("role")));
    }

    #[test]
    fn deleting_a_role_clears_every_reference() {
        let service = service();
        let event = sample_event(&service);
        let r = role(&service, &event, "Capitaine");
        let p = validated_pj(&service, &event, "alice@gn.example");
        let proposal = service
            .create_proposal(event.id, "Scénario A")
            .expect("proposal created");

        service
            .assign(event.id, ProposalRef::Main, r.id, p.id)
            .expect("main assign");
        service
            .assign(event.id, ProposalRef::Named(proposal.id), r.id, p.id)
            .expect("proposal assign");

        service.delete_role(event.id, r.id).expect("deleted");

        let snapshot = service.snapshot(event.id).expect("snapshot");
        assert!(snapshot.roles.is_empty());
        assert!(snapshot.assignments.is_empty());
        let pool = &snapshot.participants_by_type["PJ"];
        assert_eq!(pool[0].role_id, None, "participant keeps no dangling role");
    }
}

mod ledger {
    use super::common::*;
    use gn_manager::casting::{CastingError, ProposalRef};

    #[test]
    fn assign_main_twice_is_idempotent() {
        let service = service();
        let event = sample_event(&service);
        let r = role(&service, &event, "Capitaine");
        let p = validated_pj(&service, &event, "alice@gn.example");

        service
            .assign(event.id, ProposalRef::Main, r.id, p.id)
            .expect("first");
        service
            .assign(event.id, ProposalRef::Main, r.id, p.id)
            .expect("second");

        let snapshot = service.snapshot(event.id).expect("snapshot");
        assert_eq!(snapshot.roles[0].assigned_participant_id, Some(p.id));
        assert_eq!(snapshot.assignments["main"].len(), 1);
    }

    #[test]
    fn reassignment_vacates_the_prior_role() {
        let service = service();
        let event = sample_event(&service);
        let r1 = role(&service, &event, "Capitaine");
        let r2 = role(&service, &event, "Héraut");
        let p = validated_pj(&service, &event, "alice@gn.example");

        service
            .assign(event.id, ProposalRef::Main, r1.id, p.id)
            .expect("assign r1");
        service
            .assign(event.id, ProposalRef::Main, r2.id, p.id)
            .expect("assign r2");

        let snapshot = service.snapshot(event.id).expect("snapshot");
        let by_id = |id| {
            snapshot
                .roles
                .iter()
                .find(|role| role.id == id)
                .expect("role present")
                .assigned_participant_id
        };
        assert_eq!(by_id(r1.id), None, "old slot vacated");
        assert_eq!(by_id(r2.id), Some(p.id));
    }

    #[test]
    fn a_role_holds_one_participant_per_column() {
        let service = service();
        let event = sample_event(&service);
        let r = role(&service, &event, "Capitaine");
        let p1 = validated_pj(&service, &event, "alice@gn.example");
        let p2 = validated_pj(&service, &event, "benoit@gn.example");
        let proposal = service
            .create_proposal(event.id, "Scénario A")
            .expect("proposal");
        let column = ProposalRef::Named(proposal.id);

        service.assign(event.id, column, r.id, p1.id).expect("p1");
        service.assign(event.id, column, r.id, p2.id).expect("p2");

        let snapshot = service.snapshot(event.id).expect("snapshot");
        let cells = &snapshot.assignments[&proposal.id.0.to_string()];
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[&r.id.0.to_string()], p2.id);
    }

    #[test]
    fn scores_need_an_assignment_first() {
        let service = service();
        let event = sample_event(&service);
        let r = role(&service, &event, "Capitaine");
        let p = validated_pj(&service, &event, "alice@gn.example");
        let proposal = service
            .create_proposal(event.id, "Scénario A")
            .expect("proposal");
        let column = ProposalRef::Named(proposal.id);

        let err = service
            .update_score(event.id, column, r.id, 5)
            .expect_err("no assignment yet");
        assert!(matches!(err, CastingError::NotFound("assignment")));

        service.assign(event.id, column, r.id, p.id).expect("assign");
        service
            .update_score(event.id, column, r.id, 5)
            .expect("scored");

        let snapshot = service.snapshot(event.id).expect("snapshot");
        assert_eq!(
            snapshot.scores[&proposal.id.0.to_string()][&r.id.0.to_string()],
            5
        );
    }

    #[test]
    fn unassign_clears_the_canonical_pair() {
        let service = service();
        let event = sample_event(&service);
        let r = role(&service, &event, "Capitaine");
        let p = validated_pj(&service, &event, "alice@gn.example");

        service
            .assign(event.id, ProposalRef::Main, r.id, p.id)
            .expect("assign");
        service
            .unassign(event.id, ProposalRef::Main, r.id)
            .expect("unassign");
        service
            .unassign(event.id, ProposalRef::Main, r.id)
            .expect("unassign again is a no-op");

        let snapshot = service.snapshot(event.id).expect("snapshot");
        assert_eq!(snapshot.roles[0].assigned_participant_id, None);
        let pool = &snapshot.participants_by_type["PJ"];
        assert_eq!(pool[0].role_id, None);
    }
}

mod proposals {
    use super::common::*;
    use gn_manager::casting::{CastingError, ProposalRef};

    #[test]
    fn proposals_list_in_creation_order() {
        let service = service();
        let event = sample_event(&service);

        for name in ["Scénario A", "Scénario B", "Scénario C"] {
            service.create_proposal(event.id, name).expect("created");
        }
        let names: Vec<String> = service
            .list_proposals(event.id)
            .expect("listable")
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["Scénario A", "Scénario B", "Scénario C"]);
    }

    #[test]
    fn deleting_a_proposal_drops_its_rows_only() {
        let service = service();
        let event = sample_event(&service);
        let r = role(&service, &event, "Capitaine");
        let p = validated_pj(&service, &event, "alice@gn.example");
        let keep = service.create_proposal(event.id, "Garde").expect("keep");
        let drop = service.create_proposal(event.id, "Jetée").expect("drop");

        service
            .assign(event.id, ProposalRef::Named(keep.id), r.id, p.id)
            .expect("kept row");
        service
            .assign(event.id, ProposalRef::Named(drop.id), r.id, p.id)
            .expect("dropped row");

        service
            .delete_proposal(event.id, ProposalRef::Named(drop.id))
            .expect("deleted");

        let snapshot = service.snapshot(event.id).expect("snapshot");
        assert!(snapshot.assignments.contains_key(&keep.id.0.to_string()));
        assert!(!snapshot.assignments.contains_key(&drop.id.0.to_string()));
        assert_eq!(snapshot.proposals.len(), 1);
    }

    #[test]
    fn the_main_column_refuses_deletion() {
        let service = service();
        let event = sample_event(&service);

        let err = service
            .delete_proposal(event.id, ProposalRef::Main)
            .expect_err("main is not a proposal");
        assert!(matches!(err, CastingError::Validation(_)));
    }
}

mod solver {
    use super::common::*;
    use gn_manager::casting::ProposalRef;

    #[test]
    fn cross_proposal_scores_yield_the_optimal_pairing() {
        // Two roles, two participants. One grid pairs P1→R1 and P2→R2 at 10
        // each; a second grid pairs P1→R2 at 1. Total 20 beats the locally
        // tempting P1→R2 alone, so both roles must fill.
        let service = service();
        let event = sample_event(&service);
        let r1 = role(&service, &event, "Rôle 1");
        let r2 = role(&service, &event, "Rôle 2");
        let p1 = validated_pj(&service, &event, "p1@gn.example");
        let p2 = validated_pj(&service, &event, "p2@gn.example");

        let grid1 = service
            .create_proposal(event.id, "Préférences")
            .expect("grid 1");
        let grid2 = service
            .create_proposal(event.id, "Préférences 2")
            .expect("grid 2");

        let cells = [
            (grid1.id, r1.id, p1.id, 10),
            (grid1.id, r2.id, p2.id, 10),
            (grid2.id, r2.id, p1.id, 1),
        ];
        for (proposal_id, role_id, participant_id, score) in cells {
            let column = ProposalRef::Named(proposal_id);
            service
                .assign(event.id, column, role_id, participant_id)
                .expect("proposal assign");
            service
                .update_score(event.id, column, role_id, score)
                .expect("score");
        }

        let outcome = service.auto_assign(event.id).expect("solved");
        assert_eq!(outcome.assigned, 2);

        let snapshot = service.snapshot(event.id).expect("snapshot");
        let main = &snapshot.assignments["main"];
        assert_eq!(main[&r1.id.0.to_string()], p1.id);
        assert_eq!(main[&r2.id.0.to_string()], p2.id);
    }

    #[test]
    fn auto_assign_without_candidates_is_a_no_op() {
        let service = service();
        let event = sample_event(&service);
        let r = role(&service, &event, "Capitaine");
        let p = validated_pj(&service, &event, "alice@gn.example");
        service
            .assign(event.id, ProposalRef::Main, r.id, p.id)
            .expect("pre-assigned");

        let outcome = service.auto_assign(event.id).expect("runs");
        assert_eq!(outcome.assigned, 0);
        assert!(outcome.pairs.is_empty());

        let snapshot = service.snapshot(event.id).expect("snapshot");
        assert_eq!(snapshot.assignments["main"].len(), 1, "nothing written");
    }

    #[test]
    fn only_validated_participants_are_candidates() {
        let service = service();
        let event = sample_event(&service);
        role(&service, &event, "Capitaine");

        let user = service
            .create_user("attente@gn.example", "Attente", "En")
            .expect("user");
        service
            .register_participant(event.id, user.id, gn_manager::casting::ParticipantType::Pj, None)
            .expect("registered but never validated");

        let outcome = service.auto_assign(event.id).expect("runs");
        assert_eq!(outcome.assigned, 0);
    }

    #[test]
    fn extra_participants_stay_unassigned() {
        let service = service();
        let event = sample_event(&service);
        let r = role(&service, &event, "Capitaine");
        let p1 = validated_pj(&service, &event, "alice@gn.example");
        let p2 = validated_pj(&service, &event, "benoit@gn.example");
        let grid = service.create_proposal(event.id, "Lecture").expect("grid");
        service
            .assign(event.id, ProposalRef::Named(grid.id), r.id, p2.id)
            .expect("assign");
        service
            .update_score(event.id, ProposalRef::Named(grid.id), r.id, 4)
            .expect("score");

        let outcome = service.auto_assign(event.id).expect("solved");
        assert_eq!(outcome.assigned, 1);
        assert_eq!(outcome.pairs[0].role_id, r.id);
        assert_eq!(outcome.pairs[0].participant_id, p2.id);

        let snapshot = service.snapshot(event.id).expect("snapshot");
        let pool = &snapshot.participants_by_type["PJ"];
        let unplaced = pool.iter().find(|view| view.id == p1.id).expect("present");
        assert_eq!(unplaced.role_id, None);
    }
}

mod gate {
    use super::common::*;

    #[test]
    fn validation_flag_toggles_freely() {
        let service = service();
        let event = sample_event(&service);

        assert!(service
            .toggle_validation(event.id, true)
            .expect("validated"));
        assert!(service.get_event(event.id).expect("event").is_casting_validated);

        // Editing after validation is allowed, and so is re-validating.
        assert!(!service
            .toggle_validation(event.id, false)
            .expect("reopened"));
        assert!(service
            .toggle_validation(event.id, true)
            .expect("re-validated"));
    }
}

mod status_machine {
    use super::common::*;
    use gn_manager::casting::{CastingError, ParticipantType, ProposalRef, RegistrationStatus};

    #[test]
    fn actions_walk_the_registration_lifecycle() {
        let service = service();
        let event = sample_event(&service);
        let user = service
            .create_user("pj@gn.example", "Joueur", "Un")
            .expect("user");
        let p = service
            .register_participant(event.id, user.id, ParticipantType::Pj, None)
            .expect("registered");
        assert_eq!(p.registration_status, RegistrationStatus::ToValidate);

        let p = service
            .change_status(event.id, p.id, "validate")
            .expect("validated");
        assert_eq!(p.registration_status, RegistrationStatus::Validated);

        let p = service
            .change_status(event.id, p.id, "pending")
            .expect("pending");
        assert_eq!(p.registration_status, RegistrationStatus::Pending);

        let p = service
            .change_status(event.id, p.id, "reject")
            .expect("rejected");
        assert_eq!(p.registration_status, RegistrationStatus::Rejected);

        // Rejection is not enforced as terminal.
        let p = service
            .change_status(event.id, p.id, "validate")
            .expect("flipped back");
        assert_eq!(p.registration_status, RegistrationStatus::Validated);
    }

    #[test]
    fn unknown_actions_are_validation_errors() {
        let service = service();
        let event = sample_event(&service);
        let p = validated_pj(&service, &event, "alice@gn.example");

        let err = service
            .change_status(event.id, p.id, "approve")
            .expect_err("unknown token");
        assert!(matches!(err, CastingError::Validation(_)));
    }

    #[test]
    fn non_validated_participants_never_reach_the_board_pool() {
        let service = service();
        let event = sample_event(&service);
        let p = validated_pj(&service, &event, "alice@gn.example");
        service
            .change_status(event.id, p.id, "pending")
            .expect("moved away from Validé");

        let snapshot = service.snapshot(event.id).expect("snapshot");
        assert!(snapshot.participants_by_type.get("PJ").is_none());
    }

    #[test]
    fn losing_validation_keeps_an_existing_role() {
        // Deliberate behavior: a temporary status flip must not throw away
        // casting work.
        let service = service();
        let event = sample_event(&service);
        let r = role(&service, &event, "Capitaine");
        let p = validated_pj(&service, &event, "alice@gn.example");
        service
            .assign(event.id, ProposalRef::Main, r.id, p.id)
            .expect("assigned");

        service
            .change_status(event.id, p.id, "pending")
            .expect("status changed");

        let snapshot = service.snapshot(event.id).expect("snapshot");
        assert_eq!(snapshot.roles[0].assigned_participant_id, Some(p.id));
    }
}

mod registrations {
    use super::common::*;
    use gn_manager::casting::ProposalRef;

    #[test]
    fn removing_a_registration_clears_its_slots() {
        let service = service();
        let event = sample_event(&service);
        let r = role(&service, &event, "Capitaine");
        let p = validated_pj(&service, &event, "alice@gn.example");
        let grid = service.create_proposal(event.id, "Lecture").expect("grid");

        service
            .assign(event.id, ProposalRef::Main, r.id, p.id)
            .expect("main");
        service
            .assign(event.id, ProposalRef::Named(grid.id), r.id, p.id)
            .expect("proposal");

        service
            .remove_participant(event.id, p.id)
            .expect("removed");

        let snapshot = service.snapshot(event.id).expect("snapshot");
        assert!(snapshot.assignments.is_empty());
        assert_eq!(snapshot.roles[0].assigned_participant_id, None);
    }
}
