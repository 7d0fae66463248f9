//! Authorization primitives for the hospital back office: the four-role
//! identity model and the access policy every admin and API path consults.

use thiserror::Error;

mod policy;
mod predicate;
mod resource;
mod role;

pub use policy::{Decision, PolicyEngine};
pub use predicate::Predicate;
pub use resource::{ClinicalKind, Operation, PatientScope, Resource, ResourceKind, ScopeKey};
pub use role::{Actor, MisconfiguredScope, Role, linked_doctor, linked_staff_center, role_of};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AuthzError {
    #[error("{operation} denied for resource {kind}")]
    Denied {
        operation: Operation,
        kind: ResourceKind,
    },
    #[error("authentication required")]
    Unauthenticated,
}
