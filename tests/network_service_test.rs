//! Integration tests for ReferralNetworkService over an in-memory repository.

use std::collections::HashSet;
use std::sync::Arc;

use rstest::{fixture, rstest};
use rust_decimal::Decimal;
use serde_json::json;

use refnet::application::services::ReferralNetworkService;
use refnet::application::TreeNode;
use refnet::domain::RewardSchedule;
use refnet::infrastructure::{InMemoryMemberRepository, MemberRepository};
use refnet::util::testing::{init_test_setup, member, seeded_repository};

/// REG1000 -> REG1001, REG1016, REG1017 and REG1001 -> REG1002, REG1003, REG1004,
/// in registration order.
const NETWORK: &[(&str, Option<&str>)] = &[
    ("REG1000", None),
    ("REG1001", Some("REG1000")),
    ("REG1002", Some("REG1001")),
    ("REG1003", Some("REG1001")),
    ("REG1004", Some("REG1001")),
    ("REG1016", Some("REG1000")),
    ("REG1017", Some("REG1000")),
];

#[fixture]
fn repo() -> Arc<InMemoryMemberRepository> {
    init_test_setup();
    seeded_repository(NETWORK)
}

fn service(repo: &Arc<InMemoryMemberRepository>) -> ReferralNetworkService {
    ReferralNetworkService::new(repo.clone(), RewardSchedule::default())
}

fn ids<'a>(members: impl IntoIterator<Item = &'a refnet::domain::Member>) -> Vec<String> {
    members.into_iter().map(|m| m.public_id.clone()).collect()
}

fn set_active(repo: &InMemoryMemberRepository, public_id: &str, is_active: bool) {
    let mut member = repo.find_by_public_id(public_id).unwrap().unwrap();
    member.is_active = is_active;
    repo.update(&member).unwrap();
}

// ============================================================
// Direct referrals
// ============================================================

#[rstest]
fn given_root_with_three_referrals_when_direct_referrals_then_registration_order(
    repo: Arc<InMemoryMemberRepository>,
) {
    let network = service(&repo);

    let referrals = network.direct_referrals("REG1000").unwrap();

    assert_eq!(ids(&referrals), vec!["REG1001", "REG1016", "REG1017"]);
}

#[rstest]
fn given_inactive_members_when_direct_referrals_then_contains_member_iff_active(
    repo: Arc<InMemoryMemberRepository>,
) {
    set_active(&repo, "REG1003", false);
    set_active(&repo, "REG1017", false);
    let network = service(&repo);

    for member in repo.find_all().unwrap() {
        let Some(sponsor) = &member.sponsor_public_id else {
            continue;
        };
        let referrals = ids(&network.direct_referrals(sponsor).unwrap());
        assert_eq!(
            referrals.contains(&member.public_id),
            member.is_active,
            "{} under {}",
            member.public_id,
            sponsor
        );
    }
}

#[rstest]
fn given_referrals_when_summarized_then_listing_shape(repo: Arc<InMemoryMemberRepository>) {
    let network = service(&repo);

    let summaries = network.direct_referral_summaries("REG1001").unwrap();

    assert_eq!(summaries.len(), 3);
    assert_eq!(summaries[0].user_id, "REG1002");
    assert_eq!(summaries[0].registration_date, "01/01/2024");
    assert!(summaries.iter().all(|s| s.is_active));
}

// ============================================================
// Team size and income
// ============================================================

#[rstest]
#[case(0, 0)]
#[case(1, 3)]
#[case(2, 6)]
#[case(3, 6)]
fn given_network_when_count_team_then_counts_members_within_levels(
    repo: Arc<InMemoryMemberRepository>,
    #[case] max_levels: usize,
    #[case] expected: usize,
) {
    let network = service(&repo);
    assert_eq!(network.count_team("REG1000", max_levels).unwrap(), expected);
}

#[rstest]
fn given_growing_max_levels_when_count_team_then_never_decreases(
    repo: Arc<InMemoryMemberRepository>,
) {
    let network = service(&repo);

    let counts: Vec<usize> = (0..6)
        .map(|levels| network.count_team("REG1000", levels).unwrap())
        .collect();

    assert!(counts.windows(2).all(|w| w[0] <= w[1]), "{counts:?}");
}

#[rstest]
fn given_network_when_calculate_income_then_level_one_and_two_contribute(
    repo: Arc<InMemoryMemberRepository>,
) {
    let network = service(&repo);

    let income = network.calculate_income("REG1000").unwrap();

    // 3 x 100 + 3 x 50
    assert_eq!(income, Decimal::from(450));
    assert_eq!(network.calculate_income("REG1000").unwrap(), income);
}

#[rstest]
fn given_third_level_member_when_calculate_income_then_adds_level_three_rate(
    repo: Arc<InMemoryMemberRepository>,
) {
    let deeper = {
        let mut members = repo.find_all().unwrap();
        members.push(member(8, "REG1018", Some("REG1002")));
        Arc::new(InMemoryMemberRepository::from_members(members))
    };
    let network = service(&deeper);

    assert_eq!(network.calculate_income("REG1000").unwrap(), Decimal::from(475));
}

#[rstest]
fn given_custom_schedule_when_calculate_income_then_uses_its_rates_and_depth(
    repo: Arc<InMemoryMemberRepository>,
) {
    let network = ReferralNetworkService::new(
        repo.clone(),
        RewardSchedule::new(vec![Decimal::from(10)]),
    );

    assert_eq!(network.rewards().depth(), 1);
    assert_eq!(network.calculate_income("REG1000").unwrap(), Decimal::from(30));
}

// ============================================================
// Generation levels and statistics
// ============================================================

#[rstest]
fn given_network_when_generation_levels_then_counts_and_income_per_level(
    repo: Arc<InMemoryMemberRepository>,
) {
    let network = service(&repo);

    let levels = network.generation_levels("REG1000", 3).unwrap();

    assert_eq!(levels.len(), 2, "empty third level is omitted");
    assert_eq!(levels[0].level, 1);
    assert_eq!(levels[0].member_count, 3);
    assert_eq!(levels[0].income_per_member, Decimal::from(100));
    assert_eq!(levels[0].total_income, Decimal::from(300));
    assert_eq!(levels[1].level, 2);
    assert_eq!(levels[1].member_count, 3);
    assert_eq!(levels[1].total_income, Decimal::from(150));
    assert_eq!(ids(&levels[1].members), vec!["REG1002", "REG1003", "REG1004"]);
}

#[rstest]
fn given_deactivated_referral_when_querying_then_hidden_from_sponsor_but_own_levels_intact(
    repo: Arc<InMemoryMemberRepository>,
) {
    set_active(&repo, "REG1001", false);
    let network = service(&repo);

    assert_eq!(
        ids(&network.direct_referrals("REG1000").unwrap()),
        vec!["REG1016", "REG1017"]
    );
    let own = network.generation_levels("REG1001", 3).unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].member_count, 3);
    assert_eq!(network.count_team("REG1000", 3).unwrap(), 2);
}

#[rstest]
fn given_network_when_statistics_then_dashboard_json(repo: Arc<InMemoryMemberRepository>) {
    let network = service(&repo);

    let stats = network.statistics("REG1000", 3).unwrap();

    assert_eq!(
        serde_json::to_value(&stats).unwrap(),
        json!({
            "totalDirectReferrals": 3,
            "totalTeamMembers": 6,
            "totalIncome": 450.0,
            "generationLevels": [
                {"level": 1, "memberCount": 3, "incomePerMember": 100.0, "totalIncome": 300.0},
                {"level": 2, "memberCount": 3, "incomePerMember": 50.0, "totalIncome": 150.0}
            ]
        })
    );
}

#[test]
fn given_levels_beyond_schedule_when_generation_levels_then_reported_with_zero_rate() {
    init_test_setup();
    let repo = seeded_repository(&[
        ("REG1", None),
        ("REG2", Some("REG1")),
        ("REG3", Some("REG2")),
        ("REG4", Some("REG3")),
        ("REG5", Some("REG4")),
    ]);
    let network = service(&repo);

    let levels = network.generation_levels("REG1", 5).unwrap();

    assert_eq!(levels.len(), 4);
    assert_eq!(levels[3].level, 4);
    assert_eq!(levels[3].member_count, 1);
    assert_eq!(levels[3].income_per_member, Decimal::ZERO);
    assert_eq!(levels[3].total_income, Decimal::ZERO);
    assert_eq!(network.count_team("REG1", 5).unwrap(), 4);
    assert_eq!(network.calculate_income("REG1").unwrap(), Decimal::from(175));
}

#[test]
fn given_children_registered_out_of_sponsor_order_when_walking_then_grouped_by_sponsor() {
    init_test_setup();
    let repo = seeded_repository(&[
        ("REG1", None),
        ("REG2", Some("REG1")),
        ("REG3", Some("REG1")),
        ("REG4", Some("REG3")),
        ("REG5", Some("REG2")),
    ]);
    let network = service(&repo);

    let levels = network.generation_levels("REG1", 2).unwrap();
    assert_eq!(ids(&levels[1].members), vec!["REG5", "REG4"]);

    let tree = network.build_tree("REG1", 2).unwrap();
    assert_eq!(tree.flatten(), vec!["REG1", "REG2", "REG5", "REG3", "REG4"]);
}

// ============================================================
// Tree
// ============================================================

#[rstest]
fn given_network_when_build_tree_then_children_match_direct_referrals(
    repo: Arc<InMemoryMemberRepository>,
) {
    let network = service(&repo);

    let tree = network.build_tree("REG1000", 3).unwrap();

    assert_eq!(tree.user_id, "REG1000");
    let children: Vec<&str> = tree.children.iter().map(|c| c.user_id.as_str()).collect();
    assert_eq!(
        children,
        ids(&network.direct_referrals("REG1000").unwrap())
    );
    assert_eq!(tree.children[0].children.len(), 3);
    assert!(tree.depth() <= 3);
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(2)]
#[case(3)]
fn given_max_levels_when_build_tree_then_flatten_equals_team_plus_root(
    repo: Arc<InMemoryMemberRepository>,
    #[case] max_levels: usize,
) {
    let network = service(&repo);

    let tree = network.build_tree("REG1000", max_levels).unwrap();
    let flattened: HashSet<String> = tree.flatten().into_iter().collect();

    let mut expected: HashSet<String> = network
        .generation_levels("REG1000", max_levels)
        .unwrap()
        .iter()
        .flat_map(|level| ids(&level.members))
        .collect();
    expected.insert("REG1000".to_string());

    assert!(tree.depth() <= max_levels);
    assert_eq!(flattened, expected);
    assert_eq!(
        flattened.len(),
        network.count_team("REG1000", max_levels).unwrap() + 1
    );
}

#[rstest]
fn given_inactive_root_when_build_tree_then_root_still_rendered(
    repo: Arc<InMemoryMemberRepository>,
) {
    set_active(&repo, "REG1001", false);
    let network = service(&repo);

    let tree = network.build_tree("REG1001", 3).unwrap();

    assert_eq!(tree.user_id, "REG1001");
    assert!(!tree.is_active);
    assert_eq!(tree.children.len(), 3);
}

#[rstest]
fn given_network_when_rendering_termtree_then_lists_members(
    repo: Arc<InMemoryMemberRepository>,
) {
    let network = service(&repo);

    let rendered = network
        .materialize("REG1000", 1)
        .unwrap()
        .to_termtree()
        .unwrap()
        .to_string();

    assert!(rendered.starts_with("REG1000 (Member REG1000)"));
    assert!(rendered.contains("REG1017 (Member REG1017)"));
    assert!(!rendered.contains("REG1002"));
}

// ============================================================
// Unknown roots and cycles
// ============================================================

#[rstest]
fn given_unknown_root_when_querying_then_empty_results(repo: Arc<InMemoryMemberRepository>) {
    let network = service(&repo);

    assert!(network.direct_referrals("REG9999").unwrap().is_empty());
    assert_eq!(network.count_team("REG9999", 3).unwrap(), 0);
    assert_eq!(network.calculate_income("REG9999").unwrap(), Decimal::ZERO);
    assert!(network.generation_levels("REG9999", 3).unwrap().is_empty());

    let tree = network.build_tree("REG9999", 3).unwrap();
    assert!(tree.is_empty());
    assert_eq!(tree, TreeNode::default());
    assert!(network.materialize("REG9999", 3).unwrap().is_empty());
}

#[test]
fn given_sponsor_cycle_when_traversing_then_terminates_without_revisiting() {
    init_test_setup();
    let repo = seeded_repository(&[
        ("REG1", Some("REG2")),
        ("REG2", Some("REG1")),
        ("REG3", Some("REG2")),
    ]);
    let network = service(&repo);

    assert_eq!(network.count_team("REG1", 10).unwrap(), 2);
    assert_eq!(network.generation_levels("REG1", 10).unwrap().len(), 2);
    assert_eq!(
        network.build_tree("REG1", 10).unwrap().flatten(),
        vec!["REG1", "REG2", "REG3"]
    );
    // depth-bounded and counted per path: REG2, then REG1 and REG3, then REG2 again
    assert_eq!(network.calculate_income("REG1").unwrap(), Decimal::from(225));
}

#[rstest]
fn given_lookups_when_querying_then_expose_repository_records(
    repo: Arc<InMemoryMemberRepository>,
) {
    let network = service(&repo);

    let member = network.member("REG1016").unwrap().unwrap();
    assert_eq!(
        network.member_by_internal_id(member.internal_id).unwrap(),
        Some(member)
    );
    assert!(network.member("REG9999").unwrap().is_none());
    assert_eq!(
        ids(&network.all_members().unwrap()),
        NETWORK.iter().map(|(id, _)| id.to_string()).collect::<Vec<_>>()
    );
}
