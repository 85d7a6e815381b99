//! # Profile Validators
//!
//! Semantic validation layered on top of GF0.
//!
//! A frame names its profile through the root node's `profile` attribute.
//! Validators are looked up in an immutable [`ProfileRegistry`] built once at
//! startup; there is no global mutable table.

mod specframe_k1;

pub use specframe_k1::SpecFrameK1;

use crate::frame::Frame;
use crate::types::Violation;
use std::collections::BTreeMap;

/// A semantic validator for one profile.
///
/// Implementations are pure: the same frame always yields the same
/// violations in the same order.
pub trait ProfileValidator: Send + Sync {
    /// Profile identifier this validator handles (e.g. `specframe-k1`).
    fn profile(&self) -> &'static str;

    /// Validate a frame that already passed GF0.
    fn validate(&self, frame: &Frame, path: &str) -> Vec<Violation>;
}

/// Immutable lookup table from profile id to validator.
pub struct ProfileRegistry {
    validators: BTreeMap<&'static str, Box<dyn ProfileValidator>>,
}

impl ProfileRegistry {
    /// A registry with no validators.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            validators: BTreeMap::new(),
        }
    }

    /// The registry of built-in profiles.
    #[must_use]
    pub fn standard() -> Self {
        Self::empty().with(Box::new(SpecFrameK1))
    }

    /// Add a validator, replacing any previous one for the same profile.
    #[must_use]
    pub fn with(mut self, validator: Box<dyn ProfileValidator>) -> Self {
        self.validators.insert(validator.profile(), validator);
        self
    }

    /// Validator for `profile`, if registered.
    #[must_use]
    pub fn get(&self, profile: &str) -> Option<&dyn ProfileValidator> {
        self.validators.get(profile).map(Box::as_ref)
    }

    /// Registered profile ids, sorted.
    pub fn profiles(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.validators.keys().copied()
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for ProfileRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.profiles()).finish()
    }
}

/// The profile a frame declares: its root node's `profile`, or `""`.
#[must_use]
pub fn infer_profile(frame: &Frame) -> &str {
    frame
        .root()
        .and_then(|root| root.resolve_text("profile"))
        .unwrap_or("")
}
