pub mod traits;
pub mod seen_state;
pub mod json_store;

pub use traits::StateStore;
pub use seen_state::{SeenRecord, SeenState, StateStats};
pub use json_store::JsonStateStore;
