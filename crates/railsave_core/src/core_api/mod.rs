mod engine;
mod types;

pub use crate::error::{Result, SaveError, SaveErrorCode};
pub use engine::{Engine, Session};
pub use types::{Collection, OrderedEntry, SaveSummary};
