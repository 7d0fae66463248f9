use entity::{doctors, staff, users};
use platform_authz::{Actor, ResourceKind, Role};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use tracing::warn;
use uuid::Uuid;

use crate::{DbError, DbResult};

pub fn authz_role(role: users::Role) -> Role {
    match role {
        users::Role::Admin => Role::Admin,
        users::Role::Doctor => Role::Doctor,
        users::Role::Staff => Role::Staff,
        users::Role::Patient => Role::Patient,
    }
}

pub fn entity_role(role: Role) -> users::Role {
    match role {
        Role::Admin => users::Role::Admin,
        Role::Doctor => users::Role::Doctor,
        Role::Staff => users::Role::Staff,
        Role::Patient => users::Role::Patient,
    }
}

/// Build the [`Actor`] for `user_id`, resolving the profile its role is
/// scoped through.
///
/// A missing user row is a precondition violation. A doctor without a profile
/// or a staff member without a center still loads; the evaluator denies such
/// an actor every scoped resource.
pub async fn load_actor<C: ConnectionTrait>(db: &C, user_id: Uuid) -> DbResult<Actor> {
    let user = users::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| DbError::not_found(ResourceKind::User, user_id))?;
    actor_for(db, &user).await
}

pub async fn actor_for<C: ConnectionTrait>(db: &C, user: &users::Model) -> DbResult<Actor> {
    let actor = match authz_role(user.role) {
        Role::Admin => Actor::admin(user.id),
        Role::Patient => Actor::patient(user.id),
        Role::Doctor => {
            let profile = doctors::Entity::find()
                .filter(doctors::Column::UserId.eq(user.id))
                .one(db)
                .await?;
            Actor::doctor(user.id, profile.map(|doctor| doctor.id))
        }
        Role::Staff => {
            let profile = staff::Entity::find()
                .filter(staff::Column::UserId.eq(user.id))
                .one(db)
                .await?;
            Actor::staff(user.id, profile.map(|member| member.center_id))
        }
    };
    if let Some(problem) = actor.misconfiguration() {
        warn!(user_id = %user.id, %problem, "actor has no scope link");
    }
    Ok(actor)
}
