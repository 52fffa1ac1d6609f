use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// Identifier wrapper for admitted patients.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PatientId(pub String);

impl PatientId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-owning reference to a staff member (caregiver, triage nurse, administrator).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StaffId(pub String);

impl StaffId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-facing sequential admission number, e.g. `URG-2026-004`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdmissionNumber(pub String);

impl AdmissionNumber {
    pub fn format(prefix: &str, year: i32, sequence: u64) -> Self {
        Self(format!("{prefix}-{year}-{sequence:03}"))
    }
}

impl fmt::Display for AdmissionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Finalized urgency score, always within `1..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::ScoreOutOfRange(i64::from(value)))
        }
    }

    /// Saturating constructor used by score finalization.
    pub(crate) const fn clamped(value: u8) -> Self {
        if value < Self::MIN {
            Self(Self::MIN)
        } else if value > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(value)
        }
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    /// Every admissible score, lowest first.
    pub fn all() -> impl Iterator<Item = Score> {
        (Self::MIN..=Self::MAX).map(Score)
    }
}

impl TryFrom<u8> for Score {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Score::new(value)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/10", self.0)
    }
}

/// Severity class derived from a finalized score. Declaration order is most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyTier {
    Critical,
    High,
    Moderate,
    Low,
}

impl UrgencyTier {
    pub const fn ordered() -> [UrgencyTier; 4] {
        [
            UrgencyTier::Critical,
            UrgencyTier::High,
            UrgencyTier::Moderate,
            UrgencyTier::Low,
        ]
    }

    pub const fn code(self) -> &'static str {
        match self {
            UrgencyTier::Critical => "critical",
            UrgencyTier::High => "high",
            UrgencyTier::Moderate => "moderate",
            UrgencyTier::Low => "low",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            UrgencyTier::Critical => "Critique",
            UrgencyTier::High => "Élevé",
            UrgencyTier::Moderate => "Modéré",
            UrgencyTier::Low => "Faible",
        }
    }
}

/// Position of a patient in the care lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    Waiting,
    InConsultation,
    Discharged,
    Transferred,
}

impl LifecycleStatus {
    pub const fn ordered() -> [LifecycleStatus; 4] {
        [
            LifecycleStatus::Waiting,
            LifecycleStatus::InConsultation,
            LifecycleStatus::Discharged,
            LifecycleStatus::Transferred,
        ]
    }

    pub const fn code(self) -> &'static str {
        match self {
            LifecycleStatus::Waiting => "waiting",
            LifecycleStatus::InConsultation => "in_consultation",
            LifecycleStatus::Discharged => "discharged",
            LifecycleStatus::Transferred => "transferred",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            LifecycleStatus::Waiting => "En attente",
            LifecycleStatus::InConsultation => "En consultation",
            LifecycleStatus::Discharged => "Sorti",
            LifecycleStatus::Transferred => "Transféré",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            LifecycleStatus::Discharged | LifecycleStatus::Transferred
        )
    }

    /// Accepts the English codes as well as the ward's French codes and labels
    /// (`en_attente`, `En attente`, `transféré`, ...).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().replace(' ', "_").as_str() {
            "waiting" | "en_attente" => Some(LifecycleStatus::Waiting),
            "in_consultation" | "en_consultation" => Some(LifecycleStatus::InConsultation),
            "discharged" | "sorti" => Some(LifecycleStatus::Discharged),
            "transferred" | "transfere" | "transféré" => Some(LifecycleStatus::Transferred),
            _ => None,
        }
    }
}

/// Professional roles of the emergency department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Urgentiste,
    Receptionniste,
    Medecin,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Urgentiste => "Urgentiste",
            Role::Receptionniste => "Réceptionniste",
            Role::Medecin => "Médecin",
            Role::Admin => "Administrateur",
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Role::Urgentiste => "urgentiste",
            Role::Receptionniste => "receptionniste",
            Role::Medecin => "medecin",
            Role::Admin => "admin",
        }
    }

    /// Returns `None` for anything outside the closed role set.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "urgentiste" => Some(Role::Urgentiste),
            "receptionniste" | "réceptionniste" => Some(Role::Receptionniste),
            "medecin" | "médecin" => Some(Role::Medecin),
            "admin" | "administrateur" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Identity fields captured at the triage desk.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PatientIdentity {
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub age: Option<u16>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub contact: String,
}

impl PatientIdentity {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.given_name.trim(), self.surname.trim())
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.surname.trim().is_empty() {
            return Err(ValidationError::MissingSurname);
        }
        if self.given_name.trim().is_empty() {
            return Err(ValidationError::MissingGivenName);
        }
        Ok(())
    }
}
