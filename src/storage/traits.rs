use crate::errors::StateError;
use crate::storage::SeenState;

#[cfg_attr(test, mockall::automock)]
pub trait StateStore: Send + Sync {
    /// Read persisted state; an absent store yields an empty state
    fn load(&self) -> Result<SeenState, StateError>;
    /// Persist state so a crash mid-write never leaves a truncated document
    fn save(&self, state: &SeenState) -> Result<(), StateError>;
    /// Replace persisted state with an empty one
    fn reset(&self) -> Result<(), StateError>;
}
