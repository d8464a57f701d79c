//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on the `MemberRepository` boundary trait
//! but are themselves concrete structs, not traits.

mod network;
mod registration;

pub use network::ReferralNetworkService;
pub use registration::{hash_password, RegistrationService};
