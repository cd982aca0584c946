//! Values that may have been produced by a fallback path.
//!
//! Upstream services (the language model, the vector index) are allowed to
//! fail without failing the caller. Instead of hiding the failure entirely,
//! operations return an [`Outcome`]: the caller always gets a usable value,
//! and can still ask whether it came from the real service or a default.

use serde::{Deserialize, Serialize};

/// A value that is either fresh from upstream or a substituted default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    /// The upstream call succeeded.
    Fresh(T),
    /// The upstream call failed and `value` is the safe default.
    Degraded { value: T, reason: String },
}

impl<T> Outcome<T> {
    /// Wrap a degraded value with the reason it was substituted.
    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        Self::Degraded {
            value,
            reason: reason.into(),
        }
    }

    /// Borrow the carried value regardless of provenance.
    pub fn value(&self) -> &T {
        match self {
            Self::Fresh(value) | Self::Degraded { value, .. } => value,
        }
    }

    /// Take the carried value regardless of provenance.
    pub fn into_value(self) -> T {
        match self {
            Self::Fresh(value) | Self::Degraded { value, .. } => value,
        }
    }

    /// True when the value is a fallback.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// The failure reason, if degraded.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Fresh(_) => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }

    /// Transform the carried value, keeping the provenance.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Fresh(value) => Outcome::Fresh(f(value)),
            Self::Degraded { value, reason } => Outcome::Degraded {
                value: f(value),
                reason,
            },
        }
    }
}
