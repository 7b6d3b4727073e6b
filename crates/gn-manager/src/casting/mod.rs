//! Casting core: role registry, proposal columns, the scored assignment
//! ledger, the automatic matcher, and the board HTTP surface.
//!
//! Registration status gates who is castable, the ledger records both the
//! definitive casting and any number of what-if proposal columns, and the
//! solver turns the accumulated proposal scores into the best definitive
//! casting it can find.

pub mod domain;
mod error;
pub(crate) mod ledger;
pub mod router;
pub mod service;
pub mod snapshot;
pub(crate) mod solver;
pub mod store;

pub use domain::{
    CastingProposal, Event, EventId, Participant, ParticipantId, ParticipantType, ProposalId,
    ProposalRef, RegistrationStatus, Role, RoleDraft, RoleId, RoleUpdate, StatusAction, User,
    UserId,
};
pub use error::CastingError;
pub use router::casting_router;
pub use service::{AutoAssignOutcome, CastingService};
pub use snapshot::{CastingSnapshot, ParticipantView, ProposalView, RoleView};
pub use solver::AssignedPair;
pub use store::{AssignmentSlot, CastingState, InMemoryStore, StoreError, TransactionalStore};
