use async_graphql::{Context, Object, Result, SimpleObject};
use entity::{
    centers, cities, diseases, doctors, lab_tests, medicines, patient_diseases, patients, reports,
    staff, surgeries, treatments, users, visits,
};
use platform_api::IntoGraphql;
use platform_db::dashboard;
use sea_orm::{ColumnTrait, Condition, QueryFilter, QueryOrder};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use super::{
    MePayload, Scope, optional,
    types::{
        CenterNode, CityNode, DashboardNode, DiseaseNode, DoctorNode, MedicineNode,
        OperationGql, PatientDiseaseNode, PatientNode, ReportNode, ResourceKindGql, RoleGql,
        StaffNode, SurgeryNode, TestNode, TreatmentNode, UserNode, VisitNode, parse_status,
    },
};

#[derive(Default)]
pub struct QueryRoot;

#[derive(Clone, Debug, SimpleObject, Serialize)]
pub struct HealthPayload {
    pub ok: bool,
}

fn nodes<M, N: From<M>>(rows: Vec<M>) -> Vec<N> {
    rows.into_iter().map(N::from).collect()
}

#[Object]
impl QueryRoot {
    #[instrument(name = "graphql.health", skip_all)]
    async fn health(&self) -> HealthPayload {
        HealthPayload { ok: true }
    }

    #[instrument(name = "graphql.version", skip_all)]
    async fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    #[instrument(name = "graphql.me", skip_all)]
    async fn me(&self, ctx: &Context<'_>) -> Option<MePayload> {
        ctx.data_opt::<super::RequestUser>().map(MePayload::from)
    }

    /// Whether the caller could perform `operation` on some `kind` record.
    /// Only meant for hiding UI affordances.
    #[instrument(name = "graphql.can", skip_all)]
    async fn can(
        &self,
        ctx: &Context<'_>,
        kind: ResourceKindGql,
        operation: OperationGql,
    ) -> Result<bool> {
        let scope = Scope::of(ctx)?;
        Ok(scope
            .engine()
            .can_perform(scope.actor(), kind.into(), operation.into(), None)
            .is_allowed())
    }

    #[instrument(name = "graphql.dashboard", skip_all)]
    async fn dashboard(&self, ctx: &Context<'_>) -> Result<DashboardNode> {
        let scope = Scope::of(ctx)?;
        dashboard(scope.db(), scope.engine(), scope.actor())
            .await
            .map(DashboardNode::from)
            .gql()
    }

    #[instrument(name = "graphql.users", skip_all)]
    async fn users(
        &self,
        ctx: &Context<'_>,
        q: Option<String>,
        role: Option<RoleGql>,
        first: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<UserNode>> {
        let scope = Scope::of(ctx)?;
        let q = optional(q);
        scope
            .page::<users::Entity>(first, offset, |select| {
                let select = match q {
                    Some(q) => select.filter(
                        Condition::any()
                            .add(users::Column::Email.contains(q.as_str()))
                            .add(users::Column::FirstName.contains(q.as_str()))
                            .add(users::Column::LastName.contains(q.as_str())),
                    ),
                    None => select,
                };
                let select = match role {
                    Some(role) => select.filter(users::Column::Role.eq(users::Role::from(role))),
                    None => select,
                };
                select.order_by_asc(users::Column::Email)
            })
            .await
            .map(nodes)
            .gql()
    }

    async fn user(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<UserNode>> {
        let scope = Scope::of(ctx)?;
        scope
            .one::<users::Entity>(id)
            .await
            .map(|row| row.map(UserNode::from))
            .gql()
    }

    #[instrument(name = "graphql.cities", skip_all)]
    async fn cities(
        &self,
        ctx: &Context<'_>,
        q: Option<String>,
        first: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<CityNode>> {
        let scope = Scope::of(ctx)?;
        let q = optional(q);
        scope
            .page::<cities::Entity>(first, offset, |select| {
                let select = match q {
                    Some(q) => select.filter(cities::Column::Name.contains(q.as_str())),
                    None => select,
                };
                select.order_by_asc(cities::Column::Name)
            })
            .await
            .map(nodes)
            .gql()
    }

    async fn city(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<CityNode>> {
        let scope = Scope::of(ctx)?;
        scope
            .one::<cities::Entity>(id)
            .await
            .map(|row| row.map(CityNode::from))
            .gql()
    }

    #[instrument(name = "graphql.centers", skip_all)]
    async fn centers(
        &self,
        ctx: &Context<'_>,
        city_id: Option<Uuid>,
        first: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<CenterNode>> {
        let scope = Scope::of(ctx)?;
        scope
            .page::<centers::Entity>(first, offset, |select| {
                let select = match city_id {
                    Some(city_id) => select.filter(centers::Column::CityId.eq(city_id)),
                    None => select,
                };
                select.order_by_asc(centers::Column::Name)
            })
            .await
            .map(nodes)
            .gql()
    }

    async fn center(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<CenterNode>> {
        let scope = Scope::of(ctx)?;
        scope
            .one::<centers::Entity>(id)
            .await
            .map(|row| row.map(CenterNode::from))
            .gql()
    }

    #[instrument(name = "graphql.doctors", skip_all)]
    async fn doctors(
        &self,
        ctx: &Context<'_>,
        q: Option<String>,
        center_id: Option<Uuid>,
        first: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<DoctorNode>> {
        let scope = Scope::of(ctx)?;
        let q = optional(q);
        scope
            .page::<doctors::Entity>(first, offset, |select| {
                let select = match q {
                    Some(q) => select.filter(doctors::Column::Specialization.contains(q.as_str())),
                    None => select,
                };
                let select = match center_id {
                    Some(center_id) => select.filter(doctors::Column::CenterId.eq(center_id)),
                    None => select,
                };
                select.order_by_asc(doctors::Column::Specialization)
            })
            .await
            .map(nodes)
            .gql()
    }

    async fn doctor(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<DoctorNode>> {
        let scope = Scope::of(ctx)?;
        scope
            .one::<doctors::Entity>(id)
            .await
            .map(|row| row.map(DoctorNode::from))
            .gql()
    }

    #[instrument(name = "graphql.staff", skip_all)]
    async fn staff_members(
        &self,
        ctx: &Context<'_>,
        center_id: Option<Uuid>,
        first: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<StaffNode>> {
        let scope = Scope::of(ctx)?;
        scope
            .page::<staff::Entity>(first, offset, |select| {
                let select = match center_id {
                    Some(center_id) => select.filter(staff::Column::CenterId.eq(center_id)),
                    None => select,
                };
                select.order_by_asc(staff::Column::EmployeeId)
            })
            .await
            .map(nodes)
            .gql()
    }

    async fn staff_member(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<StaffNode>> {
        let scope = Scope::of(ctx)?;
        scope
            .one::<staff::Entity>(id)
            .await
            .map(|row| row.map(StaffNode::from))
            .gql()
    }

    #[instrument(name = "graphql.medicines", skip_all)]
    async fn medicines(
        &self,
        ctx: &Context<'_>,
        q: Option<String>,
        first: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<MedicineNode>> {
        let scope = Scope::of(ctx)?;
        let q = optional(q);
        scope
            .page::<medicines::Entity>(first, offset, |select| {
                let select = match q {
                    Some(q) => select.filter(
                        Condition::any()
                            .add(medicines::Column::Name.contains(q.as_str()))
                            .add(medicines::Column::GenericName.contains(q.as_str())),
                    ),
                    None => select,
                };
                select.order_by_asc(medicines::Column::Name)
            })
            .await
            .map(nodes)
            .gql()
    }

    async fn medicine(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<MedicineNode>> {
        let scope = Scope::of(ctx)?;
        scope
            .one::<medicines::Entity>(id)
            .await
            .map(|row| row.map(MedicineNode::from))
            .gql()
    }

    #[instrument(name = "graphql.diseases", skip_all)]
    async fn diseases(
        &self,
        ctx: &Context<'_>,
        q: Option<String>,
        first: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<DiseaseNode>> {
        let scope = Scope::of(ctx)?;
        let q = optional(q);
        scope
            .page::<diseases::Entity>(first, offset, |select| {
                let select = match q {
                    Some(q) => select.filter(diseases::Column::Name.contains(q.as_str())),
                    None => select,
                };
                select.order_by_asc(diseases::Column::Name)
            })
            .await
            .map(nodes)
            .gql()
    }

    async fn disease(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<DiseaseNode>> {
        let scope = Scope::of(ctx)?;
        scope
            .one::<diseases::Entity>(id)
            .await
            .map(|row| row.map(DiseaseNode::from))
            .gql()
    }

    /// Patients visible to the caller, searchable by name or code.
    #[instrument(name = "graphql.patients", skip_all)]
    async fn patients(
        &self,
        ctx: &Context<'_>,
        q: Option<String>,
        doctor_id: Option<Uuid>,
        first: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<PatientNode>> {
        let scope = Scope::of(ctx)?;
        let q = optional(q);
        scope
            .page::<patients::Entity>(first, offset, |select| {
                let select = match q {
                    Some(q) => select.filter(
                        Condition::any()
                            .add(patients::Column::PatientName.contains(q.as_str()))
                            .add(patients::Column::PatientCode.contains(q.as_str())),
                    ),
                    None => select,
                };
                let select = match doctor_id {
                    Some(doctor_id) => select.filter(patients::Column::DoctorId.eq(doctor_id)),
                    None => select,
                };
                select.order_by_desc(patients::Column::CreatedAt)
            })
            .await
            .map(nodes)
            .gql()
    }

    async fn patient(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<PatientNode>> {
        let scope = Scope::of(ctx)?;
        scope
            .one::<patients::Entity>(id)
            .await
            .map(|row| row.map(PatientNode::from))
            .gql()
    }

    #[instrument(name = "graphql.patient_diseases", skip_all)]
    async fn patient_diseases(
        &self,
        ctx: &Context<'_>,
        patient_id: Option<Uuid>,
        first: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<PatientDiseaseNode>> {
        let scope = Scope::of(ctx)?;
        scope
            .page::<patient_diseases::Entity>(first, offset, |select| {
                let select = match patient_id {
                    Some(patient_id) => {
                        select.filter(patient_diseases::Column::PatientId.eq(patient_id))
                    }
                    None => select,
                };
                select.order_by_desc(patient_diseases::Column::DiagnosedDate)
            })
            .await
            .map(nodes)
            .gql()
    }

    async fn patient_disease(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
    ) -> Result<Option<PatientDiseaseNode>> {
        let scope = Scope::of(ctx)?;
        scope
            .one::<patient_diseases::Entity>(id)
            .await
            .map(|row| row.map(PatientDiseaseNode::from))
            .gql()
    }

    #[instrument(name = "graphql.tests", skip_all)]
    async fn tests(
        &self,
        ctx: &Context<'_>,
        patient_id: Option<Uuid>,
        status: Option<String>,
        first: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<TestNode>> {
        let scope = Scope::of(ctx)?;
        let status = status
            .as_deref()
            .map(parse_status::<lab_tests::Status>)
            .transpose()
            .gql()?;
        scope
            .page::<lab_tests::Entity>(first, offset, |select| {
                let select = match patient_id {
                    Some(patient_id) => select.filter(lab_tests::Column::PatientId.eq(patient_id)),
                    None => select,
                };
                let select = match status {
                    Some(status) => select.filter(lab_tests::Column::Status.eq(status)),
                    None => select,
                };
                select.order_by_desc(lab_tests::Column::TestDate)
            })
            .await
            .map(nodes)
            .gql()
    }

    async fn test(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<TestNode>> {
        let scope = Scope::of(ctx)?;
        scope
            .one::<lab_tests::Entity>(id)
            .await
            .map(|row| row.map(TestNode::from))
            .gql()
    }

    #[instrument(name = "graphql.treatments", skip_all)]
    async fn treatments(
        &self,
        ctx: &Context<'_>,
        patient_id: Option<Uuid>,
        first: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<TreatmentNode>> {
        let scope = Scope::of(ctx)?;
        scope
            .page::<treatments::Entity>(first, offset, |select| {
                let select = match patient_id {
                    Some(patient_id) => {
                        select.filter(treatments::Column::PatientId.eq(patient_id))
                    }
                    None => select,
                };
                select.order_by_desc(treatments::Column::StartDate)
            })
            .await
            .map(nodes)
            .gql()
    }

    async fn treatment(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<TreatmentNode>> {
        let scope = Scope::of(ctx)?;
        scope
            .one::<treatments::Entity>(id)
            .await
            .map(|row| row.map(TreatmentNode::from))
            .gql()
    }

    #[instrument(name = "graphql.surgeries", skip_all)]
    async fn surgeries(
        &self,
        ctx: &Context<'_>,
        patient_id: Option<Uuid>,
        first: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<SurgeryNode>> {
        let scope = Scope::of(ctx)?;
        scope
            .page::<surgeries::Entity>(first, offset, |select| {
                let select = match patient_id {
                    Some(patient_id) => select.filter(surgeries::Column::PatientId.eq(patient_id)),
                    None => select,
                };
                select.order_by_asc(surgeries::Column::ScheduledDate)
            })
            .await
            .map(nodes)
            .gql()
    }

    async fn surgery(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<SurgeryNode>> {
        let scope = Scope::of(ctx)?;
        scope
            .one::<surgeries::Entity>(id)
            .await
            .map(|row| row.map(SurgeryNode::from))
            .gql()
    }

    #[instrument(name = "graphql.visits", skip_all)]
    async fn visits(
        &self,
        ctx: &Context<'_>,
        patient_id: Option<Uuid>,
        doctor_id: Option<Uuid>,
        first: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<VisitNode>> {
        let scope = Scope::of(ctx)?;
        scope
            .page::<visits::Entity>(first, offset, |select| {
                let select = match patient_id {
                    Some(patient_id) => select.filter(visits::Column::PatientId.eq(patient_id)),
                    None => select,
                };
                let select = match doctor_id {
                    Some(doctor_id) => select.filter(visits::Column::DoctorId.eq(doctor_id)),
                    None => select,
                };
                select.order_by_desc(visits::Column::VisitDate)
            })
            .await
            .map(nodes)
            .gql()
    }

    async fn visit(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<VisitNode>> {
        let scope = Scope::of(ctx)?;
        scope
            .one::<visits::Entity>(id)
            .await
            .map(|row| row.map(VisitNode::from))
            .gql()
    }

    #[instrument(name = "graphql.reports", skip_all)]
    async fn reports(
        &self,
        ctx: &Context<'_>,
        first: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Vec<ReportNode>> {
        let scope = Scope::of(ctx)?;
        scope
            .page::<reports::Entity>(first, offset, |select| {
                select.order_by_desc(reports::Column::CreatedAt)
            })
            .await
            .map(nodes)
            .gql()
    }

    async fn report(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<ReportNode>> {
        let scope = Scope::of(ctx)?;
        scope
            .one::<reports::Entity>(id)
            .await
            .map(|row| row.map(ReportNode::from))
            .gql()
    }
}
