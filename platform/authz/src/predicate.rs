use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    resource::{Resource, ScopeKey},
    role::Role,
};

/// Boolean filter over a resource's scope fields.
///
/// Storage independent: [`Predicate::matches`] evaluates it in memory, and the
/// persistence layer translates the same value into a native query filter.
/// The combinators keep `Always`/`Never` normalised so that
/// [`Predicate::is_never`] is an exact emptiness test.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Predicate {
    Always,
    Never,
    KeyEquals(ScopeKey, Uuid),
    /// Matches `User` resources whose account has the given role.
    RoleIs(Role),
    Any(Vec<Predicate>),
    All(Vec<Predicate>),
}

impl Predicate {
    pub fn key(key: ScopeKey, value: Uuid) -> Self {
        Predicate::KeyEquals(key, value)
    }

    /// Equality on a key whose expected value may be unknown; an unknown
    /// value matches nothing.
    pub fn key_opt(key: ScopeKey, value: Option<Uuid>) -> Self {
        value.map_or(Predicate::Never, |value| Predicate::key(key, value))
    }

    pub fn is_always(&self) -> bool {
        matches!(self, Predicate::Always)
    }

    pub fn is_never(&self) -> bool {
        matches!(self, Predicate::Never)
    }

    pub fn or(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::Always, _) | (_, Predicate::Always) => Predicate::Always,
            (Predicate::Never, other) | (other, Predicate::Never) => other,
            (Predicate::Any(mut left), Predicate::Any(right)) => {
                left.extend(right);
                Predicate::Any(left)
            }
            (Predicate::Any(mut left), other) | (other, Predicate::Any(mut left)) => {
                left.push(other);
                Predicate::Any(left)
            }
            (left, right) => Predicate::Any(vec![left, right]),
        }
    }

    pub fn and(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::Never, _) | (_, Predicate::Never) => Predicate::Never,
            (Predicate::Always, other) | (other, Predicate::Always) => other,
            (Predicate::All(mut left), Predicate::All(right)) => {
                left.extend(right);
                Predicate::All(left)
            }
            (Predicate::All(mut left), other) | (other, Predicate::All(mut left)) => {
                left.push(other);
                Predicate::All(left)
            }
            (left, right) => Predicate::All(vec![left, right]),
        }
    }

    pub fn matches(&self, resource: &Resource) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::Never => false,
            Predicate::KeyEquals(key, value) => resource.key(*key) == Some(*value),
            Predicate::RoleIs(role) => resource.subject_role() == Some(*role),
            Predicate::Any(parts) => parts.iter().any(|part| part.matches(resource)),
            Predicate::All(parts) => parts.iter().all(|part| part.matches(resource)),
        }
    }
}
