use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for user accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

/// Identifier wrapper for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub i64);

/// Identifier wrapper for roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoleId(pub i64);

/// Identifier wrapper for event registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub i64);

/// Identifier wrapper for casting proposal columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProposalId(pub i64);

/// Reference to a casting column: either the canonical assignment or a named
/// proposal. The wire format uses the literal string `"main"` next to integer
/// proposal ids; this is resolved once at the router boundary so everything
/// below works on the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProposalRef {
    Main,
    Named(ProposalId),
}

impl ProposalRef {
    /// Key used when serializing column-indexed maps (`"main"` or the id).
    pub fn column_key(&self) -> String {
        match self {
            ProposalRef::Main => "main".to_string(),
            ProposalRef::Named(id) => id.0.to_string(),
        }
    }
}

/// Participation type, shared by roles and registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParticipantType {
    Organisateur,
    #[serde(rename = "PJ")]
    Pj,
    #[serde(rename = "PNJ")]
    Pnj,
}

impl ParticipantType {
    pub fn label(&self) -> &'static str {
        match self {
            ParticipantType::Organisateur => "Organisateur",
            ParticipantType::Pj => "PJ",
            ParticipantType::Pnj => "PNJ",
        }
    }
}

impl Default for ParticipantType {
    fn default() -> Self {
        ParticipantType::Pj
    }
}

/// Registration lifecycle of a participant. Labels keep the French wording the
/// rest of the tooling (exports, board UI) expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationStatus {
    #[serde(rename = "À valider")]
    ToValidate,
    #[serde(rename = "En attente")]
    Pending,
    #[serde(rename = "Validé")]
    Validated,
    #[serde(rename = "Rejeté")]
    Rejected,
}

impl RegistrationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RegistrationStatus::ToValidate => "À valider",
            RegistrationStatus::Pending => "En attente",
            RegistrationStatus::Validated => "Validé",
            RegistrationStatus::Rejected => "Rejeté",
        }
    }
}

/// Organizer actions on a registration. There is deliberately no source-state
/// restriction: organizers may re-validate or un-reject at will, and changing
/// a status away from `Validé` never retracts an already assigned role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    Validate,
    Reject,
    Pending,
}

impl StatusAction {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "validate" => Some(StatusAction::Validate),
            "reject" => Some(StatusAction::Reject),
            "pending" => Some(StatusAction::Pending),
            _ => None,
        }
    }

    pub fn target_status(&self) -> RegistrationStatus {
        match self {
            StatusAction::Validate => RegistrationStatus::Validated,
            StatusAction::Reject => RegistrationStatus::Rejected,
            StatusAction::Pending => RegistrationStatus::Pending,
        }
    }
}

/// User account slice the casting board needs for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub nom: String,
    pub prenom: String,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.prenom, self.nom)
    }
}

/// A GN event. `is_casting_validated` is the advisory lock closing the casting
/// phase; downstream role-communication tooling reads it, nothing here
/// enforces a freeze.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub is_casting_validated: bool,
}

/// A character or function slot within one event.
///
/// There is intentionally no uniqueness constraint on `name`; organizers often
/// stage several identically named PNJ slots. The canonical assignee is not a
/// field here: it is derived from the ledger's main column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub event_id: EventId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParticipantType,
    pub genre: Option<String>,
    pub group: Option<String>,
    pub comment: Option<String>,
    pub google_doc_url: Option<String>,
    pub pdf_url: Option<String>,
}

/// One user's registration to one event. The assigned role is not a field
/// here either; see [`Role`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub event_id: EventId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: ParticipantType,
    pub group: Option<String>,
    pub registration_status: RegistrationStatus,
}

impl Participant {
    pub fn is_validated(&self) -> bool {
        self.registration_status == RegistrationStatus::Validated
    }
}

/// A named what-if column on the casting board, distinct from the canonical
/// assignment. Creation order is the ascending id order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastingProposal {
    pub id: ProposalId,
    pub event_id: EventId,
    pub name: String,
}

/// Fields accepted when creating a role.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleDraft {
    pub name: String,
    #[serde(rename = "type", default = "default_role_kind")]
    pub kind: ParticipantType,
    pub genre: Option<String>,
    pub group: Option<String>,
    pub comment: Option<String>,
    pub google_doc_url: Option<String>,
    pub pdf_url: Option<String>,
}

fn default_role_kind() -> ParticipantType {
    ParticipantType::Pj
}

/// Partial update for a role; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleUpdate {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<ParticipantType>,
    pub genre: Option<String>,
    pub group: Option<String>,
    pub comment: Option<String>,
    pub google_doc_url: Option<String>,
    pub pdf_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_actions_map_to_target_statuses() {
        assert_eq!(
            StatusAction::parse("validate").map(|a| a.target_status()),
            Some(RegistrationStatus::Validated)
        );
        assert_eq!(
            StatusAction::parse("reject").map(|a| a.target_status()),
            Some(RegistrationStatus::Rejected)
        );
        assert_eq!(
            StatusAction::parse("pending").map(|a| a.target_status()),
            Some(RegistrationStatus::Pending)
        );
        assert_eq!(StatusAction::parse("approve"), None);
    }

    #[test]
    fn proposal_refs_render_column_keys() {
        assert_eq!(ProposalRef::Main.column_key(), "main");
        assert_eq!(ProposalRef::Named(ProposalId(7)).column_key(), "7");
    }

    #[test]
    fn registration_labels_keep_french_wording() {
        assert_eq!(RegistrationStatus::Validated.label(), "Validé");
        assert_eq!(RegistrationStatus::ToValidate.label(), "À valider");
    }
}
