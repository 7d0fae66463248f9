use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::Role;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    User,
    City,
    Center,
    Doctor,
    Staff,
    Medicine,
    Disease,
    Patient,
    PatientDisease,
    Test,
    Treatment,
    Surgery,
    Visit,
    Report,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 14] = [
        ResourceKind::User,
        ResourceKind::City,
        ResourceKind::Center,
        ResourceKind::Doctor,
        ResourceKind::Staff,
        ResourceKind::Medicine,
        ResourceKind::Disease,
        ResourceKind::Patient,
        ResourceKind::PatientDisease,
        ResourceKind::Test,
        ResourceKind::Treatment,
        ResourceKind::Surgery,
        ResourceKind::Visit,
        ResourceKind::Report,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::User => "user",
            ResourceKind::City => "city",
            ResourceKind::Center => "center",
            ResourceKind::Doctor => "doctor",
            ResourceKind::Staff => "staff",
            ResourceKind::Medicine => "medicine",
            ResourceKind::Disease => "disease",
            ResourceKind::Patient => "patient",
            ResourceKind::PatientDisease => "patient_disease",
            ResourceKind::Test => "test",
            ResourceKind::Treatment => "treatment",
            ResourceKind::Surgery => "surgery",
            ResourceKind::Visit => "visit",
            ResourceKind::Report => "report",
        }
    }

    /// Globally visible lookup tables.
    pub fn is_reference_data(self) -> bool {
        matches!(
            self,
            ResourceKind::City | ResourceKind::Medicine | ResourceKind::Disease
        )
    }

    /// The patient itself and everything reachable through `patient`.
    pub fn is_patient_record(self) -> bool {
        self == ResourceKind::Patient || ClinicalKind::from_kind(self).is_some()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records that hang off a patient and inherit its scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClinicalKind {
    PatientDisease,
    Test,
    Treatment,
    Surgery,
    Visit,
}

impl ClinicalKind {
    pub fn from_kind(kind: ResourceKind) -> Option<Self> {
        match kind {
            ResourceKind::PatientDisease => Some(ClinicalKind::PatientDisease),
            ResourceKind::Test => Some(ClinicalKind::Test),
            ResourceKind::Treatment => Some(ClinicalKind::Treatment),
            ResourceKind::Surgery => Some(ClinicalKind::Surgery),
            ResourceKind::Visit => Some(ClinicalKind::Visit),
            _ => None,
        }
    }
}

impl From<ClinicalKind> for ResourceKind {
    fn from(value: ClinicalKind) -> Self {
        match value {
            ClinicalKind::PatientDisease => ResourceKind::PatientDisease,
            ClinicalKind::Test => ResourceKind::Test,
            ClinicalKind::Treatment => ResourceKind::Treatment,
            ClinicalKind::Surgery => ResourceKind::Surgery,
            ClinicalKind::Visit => ResourceKind::Visit,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Read,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn is_write(self) -> bool {
        self != Operation::Read
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields through which a resource is traced back to its scope unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeKey {
    /// The resource's own identifier.
    Id,
    /// The center reached by traversal (`doctor.center`, `patient.doctor.center`).
    Center,
    /// The doctor reached by traversal (`patient.doctor`).
    Doctor,
    /// The user owning the record (`patient.user`, `report.generated_by`).
    Owner,
}

/// Scope of a patient record, resolved by walking `patient -> doctor -> center`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientScope {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub center_id: Uuid,
    /// The user who created the patient record.
    pub owner_id: Uuid,
}

/// A concrete instance as the evaluator sees it: its kind plus the scope
/// fields reachable from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resource {
    User { id: Uuid, role: Role },
    City { id: Uuid },
    Center { id: Uuid },
    Doctor { id: Uuid, center_id: Uuid },
    Staff { id: Uuid, center_id: Uuid },
    Medicine { id: Uuid },
    Disease { id: Uuid },
    Patient(PatientScope),
    Clinical {
        kind: ClinicalKind,
        id: Uuid,
        patient: PatientScope,
    },
    Report { id: Uuid, generated_by: Uuid },
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::User { .. } => ResourceKind::User,
            Resource::City { .. } => ResourceKind::City,
            Resource::Center { .. } => ResourceKind::Center,
            Resource::Doctor { .. } => ResourceKind::Doctor,
            Resource::Staff { .. } => ResourceKind::Staff,
            Resource::Medicine { .. } => ResourceKind::Medicine,
            Resource::Disease { .. } => ResourceKind::Disease,
            Resource::Patient(_) => ResourceKind::Patient,
            Resource::Clinical { kind, .. } => (*kind).into(),
            Resource::Report { .. } => ResourceKind::Report,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Resource::User { id, .. }
            | Resource::City { id }
            | Resource::Center { id }
            | Resource::Doctor { id, .. }
            | Resource::Staff { id, .. }
            | Resource::Medicine { id }
            | Resource::Disease { id }
            | Resource::Clinical { id, .. }
            | Resource::Report { id, .. } => *id,
            Resource::Patient(scope) => scope.patient_id,
        }
    }

    /// Value of a scope key, or `None` when the kind has no such traversal.
    pub fn key(&self, key: ScopeKey) -> Option<Uuid> {
        match (key, self) {
            (ScopeKey::Id, _) => Some(self.id()),
            (ScopeKey::Center, Resource::Center { id }) => Some(*id),
            (ScopeKey::Center, Resource::Doctor { center_id, .. })
            | (ScopeKey::Center, Resource::Staff { center_id, .. }) => Some(*center_id),
            (ScopeKey::Doctor, Resource::Doctor { id, .. }) => Some(*id),
            (ScopeKey::Owner, Resource::Report { generated_by, .. }) => Some(*generated_by),
            (key, _) => self.patient_scope().and_then(|scope| match key {
                ScopeKey::Center => Some(scope.center_id),
                ScopeKey::Doctor => Some(scope.doctor_id),
                ScopeKey::Owner => Some(scope.owner_id),
                ScopeKey::Id => None,
            }),
        }
    }

    pub fn patient_scope(&self) -> Option<&PatientScope> {
        match self {
            Resource::Patient(scope) => Some(scope),
            Resource::Clinical { patient, .. } => Some(patient),
            _ => None,
        }
    }

    /// Role of the account a `User` resource describes.
    pub fn subject_role(&self) -> Option<Role> {
        match self {
            Resource::User { role, .. } => Some(*role),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> PatientScope {
        PatientScope {
            patient_id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            center_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn clinical_records_traverse_through_their_patient() {
        let patient = scope();
        let visit = Resource::Clinical {
            kind: ClinicalKind::Visit,
            id: Uuid::new_v4(),
            patient,
        };
        assert_eq!(visit.kind(), ResourceKind::Visit);
        assert_eq!(visit.key(ScopeKey::Doctor), Some(patient.doctor_id));
        assert_eq!(visit.key(ScopeKey::Center), Some(patient.center_id));
        assert_eq!(visit.key(ScopeKey::Owner), Some(patient.owner_id));
        assert_ne!(visit.key(ScopeKey::Id), Some(patient.patient_id));
    }

    #[test]
    fn reference_data_has_no_scope_traversal() {
        let city = Resource::City { id: Uuid::new_v4() };
        assert_eq!(city.key(ScopeKey::Center), None);
        assert_eq!(city.key(ScopeKey::Doctor), None);
        assert_eq!(city.key(ScopeKey::Owner), None);
        assert!(ResourceKind::City.is_reference_data());
        assert!(!ResourceKind::Center.is_reference_data());
    }

    #[test]
    fn patient_record_kinds() {
        let record_kinds: Vec<_> = ResourceKind::ALL
            .into_iter()
            .filter(|kind| kind.is_patient_record())
            .collect();
        assert_eq!(
            record_kinds,
            vec![
                ResourceKind::Patient,
                ResourceKind::PatientDisease,
                ResourceKind::Test,
                ResourceKind::Treatment,
                ResourceKind::Surgery,
                ResourceKind::Visit,
            ]
        );
    }
}
