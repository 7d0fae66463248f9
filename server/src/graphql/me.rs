use async_graphql::SimpleObject;
use uuid::Uuid;

use super::{RequestUser, types::RoleGql};

/// The signed-in user and the scope links their role resolves to.
#[derive(Clone, Debug, SimpleObject)]
pub struct MePayload {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: RoleGql,
    pub doctor_id: Option<Uuid>,
    pub center_id: Option<Uuid>,
}

impl From<&RequestUser> for MePayload {
    fn from(user: &RequestUser) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.actor.role().into(),
            doctor_id: user.actor.linked_doctor(),
            center_id: user.actor.linked_staff_center(),
        }
    }
}
