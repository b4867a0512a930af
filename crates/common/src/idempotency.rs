//! Idempotency keys and replay-aware results.

use serde::{Deserialize, Serialize};

/// Client-supplied token ensuring repeated identical requests produce one
/// logical effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Wraps a raw key. Blank keys are treated as absent.
    pub fn parse(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// Derives the key used for one downstream call, e.g. `abc` →
    /// `abc_reservation`. Deterministic, so a retried client request reaches
    /// each downstream service with the same key as the first attempt.
    pub fn scoped(&self, scope: &str) -> IdempotencyKey {
        IdempotencyKey(format!("{}_{}", self.0, scope))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of an idempotent create: either a new record or the one that was
/// already stored under the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Idempotent<T> {
    Created(T),
    Replayed(T),
}

impl<T> Idempotent<T> {
    /// Returns true if the value came from an earlier request.
    pub fn is_replay(&self) -> bool {
        matches!(self, Idempotent::Replayed(_))
    }

    /// Returns the wrapped value.
    pub fn into_inner(self) -> T {
        match self {
            Idempotent::Created(value) | Idempotent::Replayed(value) => value,
        }
    }

    /// Returns a reference to the wrapped value.
    pub fn value(&self) -> &T {
        match self {
            Idempotent::Created(value) | Idempotent::Replayed(value) => value,
        }
    }

    /// Maps the wrapped value, keeping the created/replayed distinction.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Idempotent<U> {
        match self {
            Idempotent::Created(value) => Idempotent::Created(f(value)),
            Idempotent::Replayed(value) => Idempotent::Replayed(f(value)),
        }
    }
}
