//! Domain layer: entities and business rules
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod entities;
pub mod error;
pub mod identifier;
pub mod rewards;

pub use arena::{MemberArena, MemberNode, NodeData};
pub use entities::*;
pub use error::DomainError;
pub use identifier::PublicIdScheme;
pub use rewards::RewardSchedule;
