//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic and depends on the repository boundary trait.

pub mod error;
pub mod services;
pub mod views;

pub use error::{ApplicationError, ApplicationResult};
pub use views::{
    IncomeSummary, LevelSummary, MemberProfile, ReferralSummary, Statistics, TeamSummary, TreeNode,
};
