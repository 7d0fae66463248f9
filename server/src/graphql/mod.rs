use async_graphql::{Context, EmptySubscription, Schema};
use platform_api::{ApiError, ApiResult};
use platform_authz::{Actor, AuthzError, Operation, PolicyEngine};
use platform_db::{DbPool, ScopedEntity, authorize_or_deny, find_scoped, scoped_collection};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, Iterable,
    QueryFilter, QuerySelect, Select, TransactionTrait,
};
use uuid::Uuid;

use crate::reports::ReportQueue;

mod me;
mod mutation;
mod query;
pub mod types;

pub use me::MePayload;
pub use mutation::MutationRoot;
pub use query::QueryRoot;

pub type SchemaType = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub const DEFAULT_PAGE_SIZE: u64 = 50;
pub const MAX_PAGE_SIZE: u64 = 200;

/// Shared services handed to every resolver.
#[derive(Clone)]
pub struct GraphqlData {
    pub pool: DbPool,
    pub engine: PolicyEngine,
    pub reports: ReportQueue,
}

/// The authenticated caller, attached per request by the HTTP layer.
#[derive(Clone, Debug)]
pub struct RequestUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub actor: Actor,
}

pub fn build_schema(data: GraphqlData) -> SchemaType {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(data)
        .finish()
}

/// Schema definition without any runtime data, for `schema:print`.
pub fn sdl() -> String {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .finish()
        .sdl()
}

/// Clamp client paging arguments to `(limit, offset)`.
pub fn page_bounds(first: Option<i32>, offset: Option<i32>) -> (u64, u64) {
    let limit = first
        .map(|value| u64::try_from(value).unwrap_or(0))
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = offset
        .map(|value| u64::try_from(value).unwrap_or(0))
        .unwrap_or(0);
    (limit, offset)
}

/// The calling actor plus the services a resolver needs. Every read goes
/// through the actor's scope and every write through `authorize_or_deny`.
pub(crate) struct Scope<'a> {
    pub data: &'a GraphqlData,
    pub user: Option<&'a RequestUser>,
}

impl<'a> Scope<'a> {
    pub fn of(ctx: &Context<'a>) -> async_graphql::Result<Self> {
        Ok(Self {
            data: ctx.data::<GraphqlData>()?,
            user: ctx.data_opt::<RequestUser>(),
        })
    }

    pub fn actor(&self) -> Option<&'a Actor> {
        self.user.map(|user| &user.actor)
    }

    pub fn db(&self) -> &'a DbPool {
        &self.data.pool
    }

    pub fn engine(&self) -> &'a PolicyEngine {
        &self.data.engine
    }

    /// Fails unless `operation` could be allowed on some row of `E`. Runs
    /// ahead of any lookup whose answer would reveal stored data.
    pub fn may<E: ScopedEntity>(&self, operation: Operation) -> ApiResult<()> {
        let Some(actor) = self.actor() else {
            return Err(AuthzError::Unauthenticated.into());
        };
        if self
            .engine()
            .can_perform(Some(actor), E::KIND, operation, None)
            .is_allowed()
        {
            Ok(())
        } else {
            Err(AuthzError::Denied {
                operation,
                kind: E::KIND,
            }
            .into())
        }
    }

    /// Instance check outside a transaction, for writes that must pass the
    /// policy before uniqueness lookups run.
    pub async fn permit<E: ScopedEntity>(
        &self,
        operation: Operation,
        model: E::Model,
    ) -> ApiResult<E::Model> {
        Ok(
            authorize_or_deny::<E, _>(self.db(), self.engine(), self.actor(), operation, model)
                .await?,
        )
    }

    /// The actor's visible rows of `E`, narrowed by `refine`.
    pub async fn page<E>(
        &self,
        first: Option<i32>,
        offset: Option<i32>,
        refine: impl FnOnce(Select<E>) -> Select<E>,
    ) -> ApiResult<Vec<E::Model>>
    where
        E: ScopedEntity,
    {
        let (limit, offset) = page_bounds(first, offset);
        let select = refine(scoped_collection::<E>(self.engine(), self.actor()));
        Ok(select.limit(limit).offset(offset).all(self.db()).await?)
    }

    /// Detail lookup. Rows outside the scope are reported as missing.
    pub async fn one<E: ScopedEntity>(&self, id: Uuid) -> ApiResult<Option<E::Model>> {
        Ok(find_scoped::<E, _>(self.db(), self.engine(), self.actor(), id).await?)
    }

    pub async fn create<E, A>(&self, model: E::Model) -> ApiResult<E::Model>
    where
        E: ScopedEntity,
        E::Model: IntoActiveModel<A>,
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
    {
        let txn = self.db().begin().await?;
        let model = authorize_or_deny::<E, _>(
            &txn,
            self.engine(),
            self.actor(),
            Operation::Create,
            model,
        )
        .await?;
        let saved = model.into_active_model().insert(&txn).await?;
        txn.commit().await?;
        Ok(saved)
    }

    /// Update a visible row. Both the stored row and the edited row must pass
    /// the Update check, so an edit cannot move a record out of scope.
    pub async fn update<E, A>(
        &self,
        id: Uuid,
        edit: impl FnOnce(&mut E::Model) -> ApiResult<()>,
    ) -> ApiResult<E::Model>
    where
        E: ScopedEntity,
        E::Model: IntoActiveModel<A>,
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
    {
        let txn = self.db().begin().await?;
        let current = find_scoped::<E, _>(&txn, self.engine(), self.actor(), id)
            .await?
            .ok_or(ApiError::NotFound)?;
        let mut next = authorize_or_deny::<E, _>(
            &txn,
            self.engine(),
            self.actor(),
            Operation::Update,
            current,
        )
        .await?;
        edit(&mut next)?;
        let next = authorize_or_deny::<E, _>(
            &txn,
            self.engine(),
            self.actor(),
            Operation::Update,
            next,
        )
        .await?;
        let saved = mark_all(next.into_active_model()).update(&txn).await?;
        txn.commit().await?;
        Ok(saved)
    }

    pub async fn delete<E>(&self, id: Uuid) -> ApiResult<bool>
    where
        E: ScopedEntity,
    {
        let txn = self.db().begin().await?;
        let current = find_scoped::<E, _>(&txn, self.engine(), self.actor(), id)
            .await?
            .ok_or(ApiError::NotFound)?;
        authorize_or_deny::<E, _>(
            &txn,
            self.engine(),
            self.actor(),
            Operation::Delete,
            current,
        )
        .await?;
        let result = E::delete_many()
            .filter(E::id_column().eq(id))
            .exec(&txn)
            .await?;
        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }
}

/// Mark every column as set so the full edited row is written back.
fn mark_all<A: ActiveModelTrait>(mut active: A) -> A {
    for column in <A::Entity as EntityTrait>::Column::iter() {
        if let Some(value) = active.get(column).into_value() {
            active.set(column, value);
        }
    }
    active
}

/// Trimmed, non-empty text or `InvalidInput` naming the field.
pub(crate) fn required(field: &str, value: String) -> ApiResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::invalid(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_is_clamped() {
        assert_eq!(page_bounds(None, None), (DEFAULT_PAGE_SIZE, 0));
        assert_eq!(page_bounds(Some(500), Some(20)), (MAX_PAGE_SIZE, 20));
        assert_eq!(page_bounds(Some(-3), Some(-1)), (1, 0));
    }

    #[test]
    fn blank_text_is_rejected() {
        assert_eq!(required("name", "  Dhaka ".into()).unwrap(), "Dhaka");
        assert!(matches!(
            required("name", "   ".into()),
            Err(ApiError::InvalidInput(_))
        ));
        assert_eq!(optional(Some(" ".into())), None);
    }

    #[test]
    fn sdl_lists_scoped_queries() {
        let sdl = sdl();
        assert!(sdl.contains("type QueryRoot"));
        assert!(sdl.contains("patients("));
        assert!(sdl.contains("requestReport("));
    }
}
