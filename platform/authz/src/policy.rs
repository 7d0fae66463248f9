use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    AuthzError,
    predicate::Predicate,
    resource::{Operation, Resource, ResourceKind, ScopeKey},
    role::{Actor, Role},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

impl From<bool> for Decision {
    fn from(value: bool) -> Self {
        if value { Decision::Allow } else { Decision::Deny }
    }
}

/// Stateless access policy shared by every list, detail and mutation path.
///
/// All decisions come from one table, [`PolicyEngine::rule`], which yields a
/// [`Predicate`] per (actor, kind, operation). Read scoping and instance
/// checks evaluate the same predicate, so they cannot disagree.
#[derive(Clone, Copy, Debug, Default)]
pub struct PolicyEngine;

impl PolicyEngine {
    pub fn new() -> Self {
        Self
    }

    /// Decide whether `actor` may apply `operation` to `instance`.
    ///
    /// Without an instance the answer is whether any instance of `kind` could
    /// be allowed. That answer only gates UI affordances; rows still have to
    /// be fetched through [`PolicyEngine::scope_predicate`].
    pub fn can_perform(
        &self,
        actor: Option<&Actor>,
        kind: ResourceKind,
        operation: Operation,
        instance: Option<&Resource>,
    ) -> Decision {
        let Some(actor) = actor else {
            return Decision::Deny;
        };
        if actor.role == Role::Admin {
            return Decision::Allow;
        }
        let rule = self.rule(actor, kind, operation);
        match instance {
            None => (!rule.is_never()).into(),
            Some(resource) if resource.kind() != kind => {
                debug!(
                    requested = %kind,
                    actual = %resource.kind(),
                    "instance kind does not match requested kind"
                );
                Decision::Deny
            }
            Some(resource) => rule.matches(resource).into(),
        }
    }

    /// Filter selecting exactly the `kind` rows `actor` may read.
    pub fn scope_predicate(&self, actor: Option<&Actor>, kind: ResourceKind) -> Predicate {
        match actor {
            None => Predicate::Never,
            Some(actor) if actor.role == Role::Admin => Predicate::Always,
            Some(actor) => self.rule(actor, kind, Operation::Read),
        }
    }

    pub fn authorize(
        &self,
        actor: Option<&Actor>,
        operation: Operation,
        resource: &Resource,
    ) -> Result<(), AuthzError> {
        if actor.is_none() {
            return Err(AuthzError::Unauthenticated);
        }
        let kind = resource.kind();
        if self
            .can_perform(actor, kind, operation, Some(resource))
            .is_allowed()
        {
            Ok(())
        } else {
            debug!(%kind, %operation, id = %resource.id(), "access denied");
            Err(AuthzError::Denied { operation, kind })
        }
    }

    /// Pass `resource` through when allowed. Every write path calls this
    /// before touching storage.
    pub fn authorize_or_deny(
        &self,
        actor: Option<&Actor>,
        operation: Operation,
        resource: Resource,
    ) -> Result<Resource, AuthzError> {
        self.authorize(actor, operation, &resource)?;
        Ok(resource)
    }

    fn rule(&self, actor: &Actor, kind: ResourceKind, operation: Operation) -> Predicate {
        use Operation::{Create, Delete, Read, Update};
        use ResourceKind as K;

        let me = actor.user_id;
        match (kind, operation) {
            (K::City | K::Medicine | K::Disease | K::Center, Read) => Predicate::Always,
            (K::City | K::Medicine | K::Disease | K::Center, _) => Predicate::Never,

            (K::Doctor, Read) => match actor.role {
                Role::Doctor => Predicate::Always,
                Role::Staff => Predicate::key_opt(ScopeKey::Center, actor.linked_staff_center()),
                _ => Predicate::Never,
            },
            (K::Doctor, Update) if actor.role == Role::Doctor => {
                Predicate::key_opt(ScopeKey::Id, actor.linked_doctor())
            }
            (K::Doctor, _) => Predicate::Never,

            (K::Staff, Read | Update) if actor.role == Role::Staff => {
                Predicate::key_opt(ScopeKey::Center, actor.linked_staff_center())
            }
            (K::Staff, _) => Predicate::Never,

            (K::Patient | K::PatientDisease | K::Test | K::Treatment | K::Surgery | K::Visit, _) => {
                match actor.role {
                    Role::Doctor => Predicate::key_opt(ScopeKey::Doctor, actor.linked_doctor()),
                    Role::Staff if operation == Read || staff_may_write(kind) => {
                        Predicate::key_opt(ScopeKey::Center, actor.linked_staff_center())
                    }
                    Role::Patient if operation == Read => Predicate::key(ScopeKey::Owner, me),
                    _ => Predicate::Never,
                }
            }

            (K::User, Read) => match actor.role {
                Role::Doctor | Role::Staff => {
                    Predicate::RoleIs(Role::Patient).or(Predicate::key(ScopeKey::Id, me))
                }
                Role::Patient => Predicate::key(ScopeKey::Id, me),
                Role::Admin => Predicate::Always,
            },
            (K::User, Create | Update | Delete) => Predicate::Never,

            (K::Report, Read | Create) => Predicate::key(ScopeKey::Owner, me),
            (K::Report, Update | Delete) => Predicate::Never,
        }
    }
}

/// Staff register patients and book visits; diagnosis and treatment records
/// stay with doctors.
fn staff_may_write(kind: ResourceKind) -> bool {
    matches!(kind, ResourceKind::Patient | ResourceKind::Visit)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::resource::{ClinicalKind, PatientScope};

    const ENGINE: PolicyEngine = PolicyEngine;

    struct Fixture {
        center_a: Uuid,
        center_b: Uuid,
        doctor_a: Uuid,
        doctor_b: Uuid,
        admin: Actor,
        doc_a: Actor,
        doc_b: Actor,
        staff_a: Actor,
        staff_b: Actor,
        patient_user: Actor,
    }

    impl Fixture {
        fn new() -> Self {
            let center_a = Uuid::new_v4();
            let center_b = Uuid::new_v4();
            let doctor_a = Uuid::new_v4();
            let doctor_b = Uuid::new_v4();
            Self {
                center_a,
                center_b,
                doctor_a,
                doctor_b,
                admin: Actor::admin(Uuid::new_v4()),
                doc_a: Actor::doctor(Uuid::new_v4(), Some(doctor_a)),
                doc_b: Actor::doctor(Uuid::new_v4(), Some(doctor_b)),
                staff_a: Actor::staff(Uuid::new_v4(), Some(center_a)),
                staff_b: Actor::staff(Uuid::new_v4(), Some(center_b)),
                patient_user: Actor::patient(Uuid::new_v4()),
            }
        }

        /// Patient of `doctor_a` in `center_a`, created by `patient_user`.
        fn patient(&self) -> PatientScope {
            PatientScope {
                patient_id: Uuid::new_v4(),
                doctor_id: self.doctor_a,
                center_id: self.center_a,
                owner_id: self.patient_user.user_id,
            }
        }

        fn actors(&self) -> Vec<&Actor> {
            vec![
                &self.admin,
                &self.doc_a,
                &self.doc_b,
                &self.staff_a,
                &self.staff_b,
                &self.patient_user,
            ]
        }

        /// One representative instance per kind.
        fn instances(&self) -> Vec<Resource> {
            let patient = self.patient();
            let mut all = vec![
                Resource::User {
                    id: Uuid::new_v4(),
                    role: Role::Doctor,
                },
                Resource::City { id: Uuid::new_v4() },
                Resource::Center { id: self.center_a },
                Resource::Doctor {
                    id: self.doctor_a,
                    center_id: self.center_a,
                },
                Resource::Staff {
                    id: Uuid::new_v4(),
                    center_id: self.center_a,
                },
                Resource::Medicine { id: Uuid::new_v4() },
                Resource::Disease { id: Uuid::new_v4() },
                Resource::Patient(patient),
                Resource::Report {
                    id: Uuid::new_v4(),
                    generated_by: Uuid::new_v4(),
                },
            ];
            for kind in [
                ClinicalKind::PatientDisease,
                ClinicalKind::Test,
                ClinicalKind::Treatment,
                ClinicalKind::Surgery,
                ClinicalKind::Visit,
            ] {
                all.push(Resource::Clinical {
                    kind,
                    id: Uuid::new_v4(),
                    patient,
                });
            }
            all
        }
    }

    fn allowed(actor: &Actor, op: Operation, resource: &Resource) -> bool {
        ENGINE
            .can_perform(Some(actor), resource.kind(), op, Some(resource))
            .is_allowed()
    }

    #[test]
    fn admin_is_allowed_everything() {
        let fx = Fixture::new();
        for resource in fx.instances() {
            for op in Operation::ALL {
                assert!(allowed(&fx.admin, op, &resource), "{op} {:?}", resource);
                assert!(
                    ENGINE
                        .can_perform(Some(&fx.admin), resource.kind(), op, None)
                        .is_allowed()
                );
            }
        }
        for kind in ResourceKind::ALL {
            assert!(ENGINE.scope_predicate(Some(&fx.admin), kind).is_always());
        }
    }

    #[test]
    fn anonymous_callers_are_denied() {
        let fx = Fixture::new();
        for resource in fx.instances() {
            for op in Operation::ALL {
                assert_eq!(
                    ENGINE.can_perform(None, resource.kind(), op, Some(&resource)),
                    Decision::Deny
                );
            }
            assert!(ENGINE.scope_predicate(None, resource.kind()).is_never());
        }
        assert_eq!(
            ENGINE.authorize(None, Operation::Read, &Resource::City { id: Uuid::new_v4() }),
            Err(AuthzError::Unauthenticated)
        );
    }

    #[test]
    fn patients_read_only_their_own_records() {
        let fx = Fixture::new();
        let own = Resource::Patient(fx.patient());
        let foreign = Resource::Patient(PatientScope {
            owner_id: Uuid::new_v4(),
            ..fx.patient()
        });
        assert!(allowed(&fx.patient_user, Operation::Read, &own));
        assert!(!allowed(&fx.patient_user, Operation::Read, &foreign));
        for op in [Operation::Create, Operation::Update, Operation::Delete] {
            assert!(!allowed(&fx.patient_user, op, &own));
            assert_eq!(
                ENGINE.can_perform(Some(&fx.patient_user), ResourceKind::Patient, op, None),
                Decision::Deny
            );
        }
    }

    #[test]
    fn doctors_follow_the_patients_doctor() {
        let fx = Fixture::new();
        for resource in fx.instances() {
            if !resource.kind().is_patient_record() {
                continue;
            }
            for op in Operation::ALL {
                assert!(allowed(&fx.doc_a, op, &resource), "{op} {:?}", resource.kind());
                assert!(!allowed(&fx.doc_b, op, &resource), "{op} {:?}", resource.kind());
            }
        }
        let predicate = ENGINE.scope_predicate(Some(&fx.doc_a), ResourceKind::Test);
        assert_eq!(predicate, Predicate::key(ScopeKey::Doctor, fx.doctor_a));
    }

    #[test]
    fn doctor_of_another_center_cannot_read_patient() {
        let fx = Fixture::new();
        let p1 = Resource::Patient(fx.patient());
        assert_eq!(
            ENGINE.can_perform(Some(&fx.doc_a), ResourceKind::Patient, Operation::Read, Some(&p1)),
            Decision::Allow
        );
        assert_eq!(
            ENGINE.can_perform(Some(&fx.doc_b), ResourceKind::Patient, Operation::Read, Some(&p1)),
            Decision::Deny
        );
    }

    #[test]
    fn staff_register_and_book_but_do_not_diagnose() {
        let fx = Fixture::new();
        for resource in fx.instances() {
            if !resource.kind().is_patient_record() {
                continue;
            }
            assert!(allowed(&fx.staff_a, Operation::Read, &resource));
            assert!(!allowed(&fx.staff_b, Operation::Read, &resource));
            let may_write = matches!(resource.kind(), ResourceKind::Patient | ResourceKind::Visit);
            for op in [Operation::Create, Operation::Update, Operation::Delete] {
                assert_eq!(allowed(&fx.staff_a, op, &resource), may_write, "{op} {:?}", resource.kind());
                assert!(!allowed(&fx.staff_b, op, &resource));
            }
        }
    }

    #[test]
    fn staff_see_doctors_and_colleagues_of_their_center() {
        let fx = Fixture::new();
        let doctor_here = Resource::Doctor {
            id: fx.doctor_a,
            center_id: fx.center_a,
        };
        let doctor_elsewhere = Resource::Doctor {
            id: fx.doctor_b,
            center_id: fx.center_b,
        };
        assert!(allowed(&fx.staff_a, Operation::Read, &doctor_here));
        assert!(!allowed(&fx.staff_a, Operation::Read, &doctor_elsewhere));
        assert!(!allowed(&fx.staff_a, Operation::Update, &doctor_here));

        let colleague = Resource::Staff {
            id: Uuid::new_v4(),
            center_id: fx.center_a,
        };
        assert!(allowed(&fx.staff_a, Operation::Read, &colleague));
        assert!(allowed(&fx.staff_a, Operation::Update, &colleague));
        assert!(!allowed(&fx.staff_a, Operation::Create, &colleague));
        assert!(!allowed(&fx.staff_a, Operation::Delete, &colleague));
        assert!(!allowed(&fx.staff_b, Operation::Update, &colleague));
        assert!(!allowed(&fx.doc_a, Operation::Read, &colleague));
    }

    #[test]
    fn doctors_edit_only_their_own_profile() {
        let fx = Fixture::new();
        let own = Resource::Doctor {
            id: fx.doctor_a,
            center_id: fx.center_a,
        };
        let other = Resource::Doctor {
            id: fx.doctor_b,
            center_id: fx.center_b,
        };
        assert!(allowed(&fx.doc_a, Operation::Read, &other));
        assert!(allowed(&fx.doc_a, Operation::Update, &own));
        assert!(!allowed(&fx.doc_a, Operation::Update, &other));
        assert!(!allowed(&fx.doc_a, Operation::Create, &own));
        assert!(!allowed(&fx.doc_a, Operation::Delete, &own));
        assert!(!allowed(&fx.patient_user, Operation::Read, &own));
    }

    #[test]
    fn user_visibility_for_clinicians() {
        let fx = Fixture::new();
        let patient_account = Resource::User {
            id: Uuid::new_v4(),
            role: Role::Patient,
        };
        let colleague = Resource::User {
            id: Uuid::new_v4(),
            role: Role::Doctor,
        };
        let myself = Resource::User {
            id: fx.staff_a.user_id,
            role: Role::Staff,
        };
        assert!(allowed(&fx.doc_a, Operation::Read, &patient_account));
        assert!(!allowed(&fx.doc_a, Operation::Read, &colleague));
        assert!(allowed(&fx.staff_a, Operation::Read, &myself));
        assert!(!allowed(&fx.staff_a, Operation::Update, &myself));
        assert!(!allowed(&fx.patient_user, Operation::Read, &patient_account));
    }

    #[test]
    fn reports_belong_to_whoever_generated_them() {
        let fx = Fixture::new();
        let mine = Resource::Report {
            id: Uuid::new_v4(),
            generated_by: fx.staff_a.user_id,
        };
        assert!(allowed(&fx.staff_a, Operation::Read, &mine));
        assert!(allowed(&fx.staff_a, Operation::Create, &mine));
        assert!(!allowed(&fx.staff_a, Operation::Delete, &mine));
        assert!(!allowed(&fx.staff_b, Operation::Read, &mine));
        assert!(
            ENGINE
                .can_perform(Some(&fx.patient_user), ResourceKind::Report, Operation::Create, None)
                .is_allowed()
        );
    }

    #[test]
    fn reference_data_is_readable_but_admin_managed() {
        let fx = Fixture::new();
        for resource in fx.instances() {
            if !(resource.kind().is_reference_data() || resource.kind() == ResourceKind::Center) {
                continue;
            }
            for actor in fx.actors().into_iter().skip(1) {
                assert!(allowed(actor, Operation::Read, &resource));
                for op in [Operation::Create, Operation::Update, Operation::Delete] {
                    assert!(!allowed(actor, op, &resource));
                }
            }
        }
    }

    #[test]
    fn missing_scope_links_deny_instead_of_failing() {
        let fx = Fixture::new();
        let orphan_staff = Actor::staff(Uuid::new_v4(), None);
        let orphan_doctor = Actor::doctor(Uuid::new_v4(), None);
        for resource in fx.instances() {
            if resource.kind().is_patient_record() {
                for op in Operation::ALL {
                    assert!(!allowed(&orphan_staff, op, &resource));
                    assert!(!allowed(&orphan_doctor, op, &resource));
                }
            }
        }
        assert!(
            ENGINE
                .scope_predicate(Some(&orphan_staff), ResourceKind::Doctor)
                .is_never()
        );
        assert_eq!(
            ENGINE.can_perform(Some(&orphan_staff), ResourceKind::Doctor, Operation::Read, None),
            Decision::Deny
        );
    }

    #[test]
    fn reads_agree_with_scope_predicates() {
        let fx = Fixture::new();
        for actor in fx.actors() {
            for resource in fx.instances() {
                let predicate = ENGINE.scope_predicate(Some(actor), resource.kind());
                assert_eq!(
                    predicate.matches(&resource),
                    allowed(actor, Operation::Read, &resource),
                    "{:?} reading {:?}",
                    actor.role,
                    resource.kind()
                );
            }
        }
    }

    #[test]
    fn non_admins_are_denied_outside_their_scope() {
        let fx = Fixture::new();
        let stranger_patient = PatientScope {
            patient_id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            center_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
        };
        let out_of_scope = vec![
            Resource::Patient(stranger_patient),
            Resource::Clinical {
                kind: ClinicalKind::Surgery,
                id: Uuid::new_v4(),
                patient: stranger_patient,
            },
            Resource::Doctor {
                id: Uuid::new_v4(),
                center_id: Uuid::new_v4(),
            },
            Resource::Staff {
                id: Uuid::new_v4(),
                center_id: Uuid::new_v4(),
            },
            Resource::Report {
                id: Uuid::new_v4(),
                generated_by: Uuid::new_v4(),
            },
            Resource::User {
                id: Uuid::new_v4(),
                role: Role::Admin,
            },
        ];
        for actor in fx.actors().into_iter().skip(1) {
            for resource in &out_of_scope {
                for op in Operation::ALL {
                    if op == Operation::Read
                        && actor.role == Role::Doctor
                        && resource.kind() == ResourceKind::Doctor
                    {
                        continue;
                    }
                    assert!(
                        !allowed(actor, op, resource),
                        "{:?} {op} {:?}",
                        actor.role,
                        resource.kind()
                    );
                }
            }
        }
    }

    #[test]
    fn mismatched_instance_kind_is_denied() {
        let fx = Fixture::new();
        let patient = Resource::Patient(fx.patient());
        assert_eq!(
            ENGINE.can_perform(Some(&fx.doc_a), ResourceKind::Visit, Operation::Read, Some(&patient)),
            Decision::Deny
        );
    }

    #[test]
    fn decisions_are_repeatable() {
        let fx = Fixture::new();
        let resource = Resource::Patient(fx.patient());
        let first = ENGINE.can_perform(Some(&fx.staff_a), ResourceKind::Patient, Operation::Update, Some(&resource));
        for _ in 0..16 {
            assert_eq!(
                ENGINE.can_perform(Some(&fx.staff_a), ResourceKind::Patient, Operation::Update, Some(&resource)),
                first
            );
            assert_eq!(
                ENGINE.scope_predicate(Some(&fx.staff_a), ResourceKind::Patient),
                Predicate::key(ScopeKey::Center, fx.center_a)
            );
        }
    }

    #[test]
    fn authorize_or_deny_returns_the_instance() {
        let fx = Fixture::new();
        let resource = Resource::Patient(fx.patient());
        assert_eq!(
            ENGINE.authorize_or_deny(Some(&fx.doc_a), Operation::Update, resource),
            Ok(resource)
        );
        assert_eq!(
            ENGINE.authorize_or_deny(Some(&fx.patient_user), Operation::Update, resource),
            Err(AuthzError::Denied {
                operation: Operation::Update,
                kind: ResourceKind::Patient,
            })
        );
    }
}
