use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Doctor,
    Staff,
    Patient,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Doctor, Role::Staff, Role::Patient];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Doctor => "DOCTOR",
            Role::Staff => "STAFF",
            Role::Patient => "PATIENT",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "ADMIN" => Some(Role::Admin),
            "DOCTOR" => Some(Role::Doctor),
            "STAFF" => Some(Role::Staff),
            "PATIENT" => Some(Role::Patient),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated principal together with the profile links its role
/// scopes it to.
///
/// Links are resolved by the caller when the actor is loaded; the evaluator
/// only reads them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
    pub doctor_id: Option<Uuid>,
    pub staff_center_id: Option<Uuid>,
}

impl Actor {
    pub fn admin(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::Admin,
            doctor_id: None,
            staff_center_id: None,
        }
    }

    pub fn doctor(user_id: Uuid, doctor_id: Option<Uuid>) -> Self {
        Self {
            user_id,
            role: Role::Doctor,
            doctor_id,
            staff_center_id: None,
        }
    }

    pub fn staff(user_id: Uuid, center_id: Option<Uuid>) -> Self {
        Self {
            user_id,
            role: Role::Staff,
            doctor_id: None,
            staff_center_id: center_id,
        }
    }

    pub fn patient(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::Patient,
            doctor_id: None,
            staff_center_id: None,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// The doctor profile this actor acts as. Only doctors have one.
    pub fn linked_doctor(&self) -> Option<Uuid> {
        match self.role {
            Role::Doctor => self.doctor_id,
            _ => None,
        }
    }

    /// The center of this actor's staff profile. Only staff have one.
    pub fn linked_staff_center(&self) -> Option<Uuid> {
        match self.role {
            Role::Staff => self.staff_center_id,
            _ => None,
        }
    }

    /// Reports a role whose scope link is missing. Such an actor is denied
    /// every scoped resource rather than failing the request.
    pub fn misconfiguration(&self) -> Option<MisconfiguredScope> {
        match self.role {
            Role::Doctor if self.doctor_id.is_none() => {
                Some(MisconfiguredScope::MissingDoctorProfile(self.user_id))
            }
            Role::Staff if self.staff_center_id.is_none() => {
                Some(MisconfiguredScope::MissingStaffCenter(self.user_id))
            }
            _ => None,
        }
    }
}

pub fn role_of(actor: &Actor) -> Role {
    actor.role()
}

pub fn linked_doctor(actor: &Actor) -> Option<Uuid> {
    actor.linked_doctor()
}

pub fn linked_staff_center(actor: &Actor) -> Option<Uuid> {
    actor.linked_staff_center()
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MisconfiguredScope {
    #[error("doctor account {0} has no doctor profile")]
    MissingDoctorProfile(Uuid),
    #[error("staff account {0} is not assigned to a center")]
    MissingStaffCenter(Uuid),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projections_are_gated_by_role() {
        let center = Uuid::new_v4();
        let mut actor = Actor::staff(Uuid::new_v4(), Some(center));
        assert_eq!(linked_staff_center(&actor), Some(center));
        assert_eq!(linked_doctor(&actor), None);

        actor.doctor_id = Some(Uuid::new_v4());
        assert_eq!(linked_doctor(&actor), None);

        let doctor = Uuid::new_v4();
        let actor = Actor::doctor(Uuid::new_v4(), Some(doctor));
        assert_eq!(role_of(&actor), Role::Doctor);
        assert_eq!(linked_doctor(&actor), Some(doctor));
        assert_eq!(linked_staff_center(&actor), None);
    }

    #[test]
    fn missing_links_are_reported() {
        let user = Uuid::new_v4();
        assert_eq!(
            Actor::staff(user, None).misconfiguration(),
            Some(MisconfiguredScope::MissingStaffCenter(user))
        );
        assert_eq!(
            Actor::doctor(user, None).misconfiguration(),
            Some(MisconfiguredScope::MissingDoctorProfile(user))
        );
        assert_eq!(Actor::patient(user).misconfiguration(), None);
        assert_eq!(Actor::admin(user).misconfiguration(), None);
    }

    #[test]
    fn role_names_round_trip_through_storage_strings() {
        for role in Role::ALL {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_str("admin"), None);
        assert_eq!(
            serde_json::to_string(&Role::Patient).unwrap(),
            "\"PATIENT\""
        );
    }
}
