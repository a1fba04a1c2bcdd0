//! Partial updates
//!
//! PATCH handlers apply each submitted field through a [`FieldDiff`]; an
//! update that leaves every field as it was is rejected.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Model was not changed.")]
pub struct Unchanged;

#[derive(Debug, Default)]
pub struct FieldDiff {
    changed: usize,
}

impl FieldDiff {
    pub fn new() -> Self { Self::default() }

    /// `true` when `submitted` is present and differs from `current`.
    pub fn differs<T: PartialEq>(current: &T, submitted: Option<&T>) -> bool {
        submitted.is_some_and(|value| value != current)
    }

    /// Overwrites `current` when the submitted value differs. Returns whether it did.
    pub fn apply<T: PartialEq>(&mut self, current: &mut T, submitted: Option<T>) -> bool {
        match submitted {
            Some(value) if value != *current => {
                *current = value;
                self.changed += 1;
                true
            }
            _ => false,
        }
    }

    /// Counts a change made outside [`FieldDiff::apply`].
    pub fn record(&mut self) { self.changed += 1; }

    pub fn changed(&self) -> usize { self.changed }

    pub fn finish(self) -> Result<usize, Unchanged> {
        if self.changed == 0 { Err(Unchanged) } else { Ok(self.changed) }
    }
}
