#![forbid(unsafe_code)]

pub mod engagement;
pub mod guards;
pub mod identity;
pub mod ids;
pub mod relation;
pub mod target;
pub mod visibility;

pub use engagement::{Like, Pin, PinLimits, PinOutcome, PinToggle};
pub use guards::{Guard, RelationAction, RelationLookup};
pub use identity::Identity;
pub use ids::{CommentId, IdError, IdentityId, PostId};
pub use relation::{Relation, RelationState};
pub use target::{TargetKind, TargetRef};

#[cfg(test)]
mod tests;
