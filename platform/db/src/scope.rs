//! Query scoping adapter.
//!
//! Every entity declares its [`ResourceKind`] and how each [`ScopeKey`] maps
//! onto its columns. [`scoped_collection`] turns the evaluator's read
//! predicate into a `WHERE` clause, and [`authorize_or_deny`] resolves a
//! single row's scope before asking the evaluator about it.

use entity::{
    centers, cities, diseases, doctors, lab_tests, medicines, patient_diseases, patients, reports,
    staff, surgeries, treatments, users, visits,
};
use platform_authz::{
    Actor, ClinicalKind, Operation, PatientScope, PolicyEngine, Predicate, Resource, ResourceKind,
    Role, ScopeKey,
};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, Select,
    sea_query::{Expr, Query, SelectStatement, SimpleExpr},
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{DbError, DbResult, actor::entity_role};

/// Where a row's scope fields come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Traversal {
    /// Every scope field is on the row itself.
    Resolved(Resource),
    /// A patient row; its center is reached through the doctor.
    Patient {
        id: Uuid,
        doctor_id: Uuid,
        owner_id: Uuid,
    },
    /// A record hanging off a patient.
    Clinical {
        kind: ClinicalKind,
        id: Uuid,
        patient_id: Uuid,
    },
}

/// An entity the access policy knows how to scope.
pub trait ScopedEntity: EntityTrait {
    const KIND: ResourceKind;

    fn id_column() -> Self::Column;

    /// Filter for `key == value` on keys other than [`ScopeKey::Id`]. `None`
    /// when the kind has no such traversal.
    fn traversal_expr(key: ScopeKey, value: Uuid) -> Option<SimpleExpr>;

    /// Filter on the role of the account a row describes.
    fn role_expr(_role: Role) -> Option<SimpleExpr> {
        None
    }

    fn traversal(model: &Self::Model) -> Traversal;
}

pub fn key_expr<E: ScopedEntity>(key: ScopeKey, value: Uuid) -> Option<SimpleExpr> {
    match key {
        ScopeKey::Id => Some(E::id_column().eq(value)),
        key => E::traversal_expr(key, value),
    }
}

fn never() -> SimpleExpr {
    Expr::val(1).eq(0)
}

/// Translate a predicate into a condition over `E`'s table.
pub fn condition<E: ScopedEntity>(predicate: &Predicate) -> Condition {
    match predicate {
        Predicate::Always => Condition::all(),
        Predicate::Never => Condition::all().add(never()),
        Predicate::KeyEquals(key, value) => {
            Condition::all().add(key_expr::<E>(*key, *value).unwrap_or_else(never))
        }
        Predicate::RoleIs(role) => Condition::all().add(E::role_expr(*role).unwrap_or_else(never)),
        Predicate::Any(parts) => parts
            .iter()
            .fold(Condition::any(), |acc, part| acc.add(condition::<E>(part))),
        Predicate::All(parts) => parts
            .iter()
            .fold(Condition::all(), |acc, part| acc.add(condition::<E>(part))),
    }
}

/// Base query selecting exactly the rows of `E` the actor may read. Further
/// filters, ordering, paging and counting compose on top.
pub fn scoped_collection<E: ScopedEntity>(
    engine: &PolicyEngine,
    actor: Option<&Actor>,
) -> Select<E> {
    let predicate = engine.scope_predicate(actor, E::KIND);
    if predicate.is_always() {
        return E::find();
    }
    if predicate.is_never() {
        debug!(kind = %E::KIND, "scope is empty");
    }
    E::find().filter(condition::<E>(&predicate))
}

/// Detail lookup through the read scope. Rows outside it look absent.
pub async fn find_scoped<E, C>(
    db: &C,
    engine: &PolicyEngine,
    actor: Option<&Actor>,
    id: Uuid,
) -> DbResult<Option<E::Model>>
where
    E: ScopedEntity,
    C: ConnectionTrait,
{
    let row = scoped_collection::<E>(engine, actor)
        .filter(E::id_column().eq(id))
        .one(db)
        .await?;
    Ok(row)
}

/// Load a row by id without scoping, failing with `NotFound` when absent.
pub async fn find_existing<E, C>(db: &C, id: Uuid) -> DbResult<E::Model>
where
    E: ScopedEntity,
    C: ConnectionTrait,
{
    E::find()
        .filter(E::id_column().eq(id))
        .one(db)
        .await?
        .ok_or_else(|| DbError::not_found(E::KIND, id))
}

/// Resolve the scope fields of a row of `E`.
pub async fn resource_of<E, C>(db: &C, model: &E::Model) -> DbResult<Resource>
where
    E: ScopedEntity,
    C: ConnectionTrait,
{
    resolve(db, E::traversal(model)).await
}

pub async fn resolve<C: ConnectionTrait>(db: &C, traversal: Traversal) -> DbResult<Resource> {
    match traversal {
        Traversal::Resolved(resource) => Ok(resource),
        Traversal::Patient {
            id,
            doctor_id,
            owner_id,
        } => Ok(Resource::Patient(
            patient_scope(db, id, doctor_id, owner_id).await?,
        )),
        Traversal::Clinical {
            kind,
            id,
            patient_id,
        } => {
            let patient = patients::Entity::find_by_id(patient_id)
                .one(db)
                .await?
                .ok_or_else(|| DbError::not_found(ResourceKind::Patient, patient_id))?;
            let scope = patient_scope(db, patient.id, patient.doctor_id, patient.user_id).await?;
            Ok(Resource::Clinical {
                kind,
                id,
                patient: scope,
            })
        }
    }
}

async fn patient_scope<C: ConnectionTrait>(
    db: &C,
    patient_id: Uuid,
    doctor_id: Uuid,
    owner_id: Uuid,
) -> DbResult<PatientScope> {
    let doctor = doctors::Entity::find_by_id(doctor_id)
        .one(db)
        .await?
        .ok_or_else(|| DbError::not_found(ResourceKind::Doctor, doctor_id))?;
    Ok(PatientScope {
        patient_id,
        doctor_id,
        center_id: doctor.center_id,
        owner_id,
    })
}

/// Return `model` when `actor` may apply `operation` to it. Every write path
/// runs a row through here before touching storage.
pub async fn authorize_or_deny<E, C>(
    db: &C,
    engine: &PolicyEngine,
    actor: Option<&Actor>,
    operation: Operation,
    model: E::Model,
) -> DbResult<E::Model>
where
    E: ScopedEntity,
    C: ConnectionTrait,
{
    if let Some(problem) = actor.and_then(Actor::misconfiguration) {
        if operation.is_write() {
            warn!(kind = %E::KIND, %operation, %problem, "write attempted by misconfigured actor");
        }
    }
    let resource = resource_of::<E, C>(db, &model).await?;
    engine.authorize(actor, operation, &resource)?;
    Ok(model)
}

fn doctors_in_center(center_id: Uuid) -> SelectStatement {
    Query::select()
        .column(doctors::Column::Id)
        .from(doctors::Entity)
        .and_where(doctors::Column::CenterId.eq(center_id))
        .to_owned()
}

fn patient_expr(key: ScopeKey, value: Uuid) -> SimpleExpr {
    match key {
        ScopeKey::Id => patients::Column::Id.eq(value),
        ScopeKey::Doctor => patients::Column::DoctorId.eq(value),
        ScopeKey::Owner => patients::Column::UserId.eq(value),
        ScopeKey::Center => patients::Column::DoctorId.in_subquery(doctors_in_center(value)),
    }
}

fn patients_matching(key: ScopeKey, value: Uuid) -> SelectStatement {
    Query::select()
        .column(patients::Column::Id)
        .from(patients::Entity)
        .and_where(patient_expr(key, value))
        .to_owned()
}

impl ScopedEntity for users::Entity {
    const KIND: ResourceKind = ResourceKind::User;

    fn id_column() -> Self::Column {
        users::Column::Id
    }

    fn traversal_expr(_key: ScopeKey, _value: Uuid) -> Option<SimpleExpr> {
        None
    }

    fn role_expr(role: Role) -> Option<SimpleExpr> {
        Some(users::Column::Role.eq(entity_role(role)))
    }

    fn traversal(model: &users::Model) -> Traversal {
        Traversal::Resolved(Resource::User {
            id: model.id,
            role: crate::actor::authz_role(model.role),
        })
    }
}

impl ScopedEntity for cities::Entity {
    const KIND: ResourceKind = ResourceKind::City;

    fn id_column() -> Self::Column {
        cities::Column::Id
    }

    fn traversal_expr(_key: ScopeKey, _value: Uuid) -> Option<SimpleExpr> {
        None
    }

    fn traversal(model: &cities::Model) -> Traversal {
        Traversal::Resolved(Resource::City { id: model.id })
    }
}

impl ScopedEntity for medicines::Entity {
    const KIND: ResourceKind = ResourceKind::Medicine;

    fn id_column() -> Self::Column {
        medicines::Column::Id
    }

    fn traversal_expr(_key: ScopeKey, _value: Uuid) -> Option<SimpleExpr> {
        None
    }

    fn traversal(model: &medicines::Model) -> Traversal {
        Traversal::Resolved(Resource::Medicine { id: model.id })
    }
}

impl ScopedEntity for diseases::Entity {
    const KIND: ResourceKind = ResourceKind::Disease;

    fn id_column() -> Self::Column {
        diseases::Column::Id
    }

    fn traversal_expr(_key: ScopeKey, _value: Uuid) -> Option<SimpleExpr> {
        None
    }

    fn traversal(model: &diseases::Model) -> Traversal {
        Traversal::Resolved(Resource::Disease { id: model.id })
    }
}

impl ScopedEntity for centers::Entity {
    const KIND: ResourceKind = ResourceKind::Center;

    fn id_column() -> Self::Column {
        centers::Column::Id
    }

    fn traversal_expr(key: ScopeKey, value: Uuid) -> Option<SimpleExpr> {
        match key {
            ScopeKey::Center => Some(centers::Column::Id.eq(value)),
            _ => None,
        }
    }

    fn traversal(model: &centers::Model) -> Traversal {
        Traversal::Resolved(Resource::Center { id: model.id })
    }
}

impl ScopedEntity for doctors::Entity {
    const KIND: ResourceKind = ResourceKind::Doctor;

    fn id_column() -> Self::Column {
        doctors::Column::Id
    }

    fn traversal_expr(key: ScopeKey, value: Uuid) -> Option<SimpleExpr> {
        match key {
            ScopeKey::Center => Some(doctors::Column::CenterId.eq(value)),
            ScopeKey::Doctor => Some(doctors::Column::Id.eq(value)),
            _ => None,
        }
    }

    fn traversal(model: &doctors::Model) -> Traversal {
        Traversal::Resolved(Resource::Doctor {
            id: model.id,
            center_id: model.center_id,
        })
    }
}

impl ScopedEntity for staff::Entity {
    const KIND: ResourceKind = ResourceKind::Staff;

    fn id_column() -> Self::Column {
        staff::Column::Id
    }

    fn traversal_expr(key: ScopeKey, value: Uuid) -> Option<SimpleExpr> {
        match key {
            ScopeKey::Center => Some(staff::Column::CenterId.eq(value)),
            _ => None,
        }
    }

    fn traversal(model: &staff::Model) -> Traversal {
        Traversal::Resolved(Resource::Staff {
            id: model.id,
            center_id: model.center_id,
        })
    }
}

impl ScopedEntity for patients::Entity {
    const KIND: ResourceKind = ResourceKind::Patient;

    fn id_column() -> Self::Column {
        patients::Column::Id
    }

    fn traversal_expr(key: ScopeKey, value: Uuid) -> Option<SimpleExpr> {
        Some(patient_expr(key, value))
    }

    fn traversal(model: &patients::Model) -> Traversal {
        Traversal::Patient {
            id: model.id,
            doctor_id: model.doctor_id,
            owner_id: model.user_id,
        }
    }
}

macro_rules! scoped_through_patient {
    ($module:ident, $kind:ident) => {
        impl ScopedEntity for $module::Entity {
            const KIND: ResourceKind = ResourceKind::$kind;

            fn id_column() -> Self::Column {
                $module::Column::Id
            }

            fn traversal_expr(key: ScopeKey, value: Uuid) -> Option<SimpleExpr> {
                Some($module::Column::PatientId.in_subquery(patients_matching(key, value)))
            }

            fn traversal(model: &$module::Model) -> Traversal {
                Traversal::Clinical {
                    kind: ClinicalKind::$kind,
                    id: model.id,
                    patient_id: model.patient_id,
                }
            }
        }
    };
}

scoped_through_patient!(patient_diseases, PatientDisease);
scoped_through_patient!(lab_tests, Test);
scoped_through_patient!(treatments, Treatment);
scoped_through_patient!(surgeries, Surgery);
scoped_through_patient!(visits, Visit);

impl ScopedEntity for reports::Entity {
    const KIND: ResourceKind = ResourceKind::Report;

    fn id_column() -> Self::Column {
        reports::Column::Id
    }

    fn traversal_expr(key: ScopeKey, value: Uuid) -> Option<SimpleExpr> {
        match key {
            ScopeKey::Owner => Some(reports::Column::GeneratedBy.eq(value)),
            _ => None,
        }
    }

    fn traversal(model: &reports::Model) -> Traversal {
        Traversal::Resolved(Resource::Report {
            id: model.id,
            generated_by: model.generated_by,
        })
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DbBackend, QueryTrait};

    use super::*;

    fn sql<E: ScopedEntity>(predicate: &Predicate) -> String {
        E::find()
            .filter(condition::<E>(predicate))
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn admin_collection_has_no_filter() {
        let admin = Actor::admin(Uuid::new_v4());
        let rendered = scoped_collection::<patients::Entity>(&PolicyEngine::new(), Some(&admin))
            .build(DbBackend::Postgres)
            .to_string();
        assert!(!rendered.contains("WHERE"), "{rendered}");
    }

    #[test]
    fn anonymous_collection_is_filtered_out() {
        let rendered = scoped_collection::<patients::Entity>(&PolicyEngine::new(), None)
            .build(DbBackend::Postgres)
            .to_string();
        assert!(rendered.contains("WHERE 1 = 0"), "{rendered}");
    }

    #[test]
    fn empty_scope_renders_a_false_filter() {
        let rendered = sql::<patients::Entity>(&Predicate::Never);
        assert!(rendered.contains("WHERE 1 = 0"), "{rendered}");
    }

    #[test]
    fn center_scope_on_records_nests_through_patient_and_doctor() {
        let center = Uuid::new_v4();
        let rendered = sql::<visits::Entity>(&Predicate::key(ScopeKey::Center, center));
        assert!(
            rendered.contains(r#""visits"."patient_id" IN (SELECT "id" FROM "patients""#)
                || rendered.contains(r#""visits"."patient_id" IN (SELECT "patients"."id""#),
            "{rendered}"
        );
        assert!(rendered.contains(r#""doctors"."center_id" = "#), "{rendered}");
        assert!(rendered.contains(&center.to_string()), "{rendered}");
    }

    #[test]
    fn untraversable_key_matches_nothing() {
        let rendered = sql::<cities::Entity>(&Predicate::key(ScopeKey::Doctor, Uuid::new_v4()));
        assert!(rendered.contains("1 = 0"), "{rendered}");
    }

    #[test]
    fn user_visibility_combines_role_and_self() {
        let me = Uuid::new_v4();
        let predicate = Predicate::RoleIs(Role::Patient).or(Predicate::key(ScopeKey::Id, me));
        let rendered = sql::<users::Entity>(&predicate);
        assert!(rendered.contains(r#""users"."role" = 'PATIENT'"#), "{rendered}");
        assert!(rendered.contains(" OR "), "{rendered}");
    }
}
