use chrono::Utc;
use entity::{lab_tests, patients, surgeries, treatments, visits};
use platform_authz::{Actor, PolicyEngine};
use sea_orm::{ColumnTrait, ConnectionTrait, PaginatorTrait, QueryFilter, prelude::DateTimeWithTimeZone};
use serde::Serialize;

use crate::{DbResult, scope::scoped_collection};

/// Headline counts for the landing page, each taken over the caller's scope.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub patients: u64,
    pub pending_tests: u64,
    pub active_treatments: u64,
    pub upcoming_surgeries: u64,
    pub scheduled_visits: u64,
}

pub async fn dashboard<C: ConnectionTrait>(
    db: &C,
    engine: &PolicyEngine,
    actor: Option<&Actor>,
) -> DbResult<DashboardCounts> {
    let now: DateTimeWithTimeZone = Utc::now().into();

    let patients = scoped_collection::<patients::Entity>(engine, actor)
        .filter(patients::Column::IsActive.eq(true))
        .count(db)
        .await?;
    let pending_tests = scoped_collection::<lab_tests::Entity>(engine, actor)
        .filter(lab_tests::Column::Status.eq(lab_tests::Status::Pending))
        .count(db)
        .await?;
    let active_treatments = scoped_collection::<treatments::Entity>(engine, actor)
        .filter(treatments::Column::Status.eq(treatments::Status::Active))
        .count(db)
        .await?;
    let upcoming_surgeries = scoped_collection::<surgeries::Entity>(engine, actor)
        .filter(surgeries::Column::Status.eq(surgeries::Status::Scheduled))
        .filter(surgeries::Column::ScheduledDate.gte(now))
        .count(db)
        .await?;
    let scheduled_visits = scoped_collection::<visits::Entity>(engine, actor)
        .filter(visits::Column::Status.eq(visits::Status::Scheduled))
        .count(db)
        .await?;

    Ok(DashboardCounts {
        patients,
        pending_tests,
        active_treatments,
        upcoming_surgeries,
        scheduled_visits,
    })
}
