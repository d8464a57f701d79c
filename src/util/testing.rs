//! Test support: tracing setup and member fixtures.

use std::env;
use std::sync::{Arc, Once};

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::Member;
use crate::infrastructure::InMemoryMemberRepository;

/// 2024-01-01T00:00:00Z
const FIXTURE_EPOCH: i64 = 1_704_067_200;

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "trace");
        }
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    debug!("INIT: Attempting logger init from testing.rs");
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "trace");
    }

    // Create a filter for noisy modules
    let noisy_modules = [""];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    // Set up the subscriber with environment filter
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    // Build and set the subscriber
    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::ENTER)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Active member with deterministic contact data; registration time grows
/// with `internal_id`.
pub fn member(internal_id: u64, public_id: &str, sponsor: Option<&str>) -> Member {
    let offset = i64::try_from(internal_id).unwrap_or(i64::MAX / 120) * 60;
    Member {
        internal_id,
        public_id: public_id.to_string(),
        full_name: format!("Member {public_id}"),
        email: format!("{}@example.com", public_id.to_lowercase()),
        mobile_number: format!("900000{internal_id:04}"),
        password_hash: String::new(),
        sponsor_public_id: sponsor.map(str::to_string),
        is_active: true,
        is_admin: false,
        registered_at: DateTime::<Utc>::from_timestamp(FIXTURE_EPOCH + offset, 0)
            .unwrap_or_default(),
    }
}

/// Repository seeded with `(public_id, sponsor)` pairs in registration order.
pub fn seeded_repository(edges: &[(&str, Option<&str>)]) -> Arc<InMemoryMemberRepository> {
    let members = edges
        .iter()
        .zip(1u64..)
        .map(|((public_id, sponsor), internal_id)| member(internal_id, public_id, *sponsor))
        .collect();
    Arc::new(InMemoryMemberRepository::from_members(members))
}
