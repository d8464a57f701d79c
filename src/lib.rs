//! refnet: referral network engine
//!
//! Members register under a sponsor and form a tree through that single
//! parent pointer. The engine answers direct referral, team size, income,
//! generation level and tree queries on top of a `MemberRepository`.
//!
//! Layers:
//! - `domain`: entities, id scheme, reward schedule, arena tree
//! - `application`: services and JSON views
//! - `infrastructure`: repositories, file store, dependency wiring
//! - `cli`: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
