//! Presentation shapes returned by the engine and serialized as JSON.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{Member, MemberArena};

/// Date format of `registrationDate` in referral listings.
pub const REGISTRATION_DATE_FORMAT: &str = "%d/%m/%Y";

/// Node of the materialized referral tree.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    pub is_active: bool,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Nested rendering of an arena; an empty arena yields the default node.
    pub fn from_arena(arena: &MemberArena) -> Self {
        arena
            .fold(|node, children| TreeNode {
                user_id: node.data.public_id.clone(),
                full_name: node.data.full_name.clone(),
                email: node.data.email.clone(),
                is_active: node.data.is_active,
                children,
            })
            .unwrap_or_default()
    }

    /// All user ids in the tree, pre-order, the root included.
    pub fn flatten(&self) -> Vec<String> {
        let mut ids = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            ids.push(node.user_id.clone());
            stack.extend(node.children.iter().rev());
        }
        ids
    }

    /// Levels below this node (a leaf has depth 0).
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 0)];
        while let Some((node, level)) = stack.pop() {
            max = max.max(level);
            stack.extend(node.children.iter().map(|c| (c, level + 1)));
        }
        max
    }

    /// True for the placeholder returned for unknown roots.
    pub fn is_empty(&self) -> bool {
        self.user_id.is_empty()
    }
}

/// Members found at one generation level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSummary {
    pub level: usize,
    pub member_count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub income_per_member: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_income: Decimal,
    #[serde(skip)]
    pub members: Vec<Member>,
}

/// Dashboard statistics for one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_direct_referrals: usize,
    pub total_team_members: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_income: Decimal,
    pub generation_levels: Vec<LevelSummary>,
}

/// Entry of a direct referral listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralSummary {
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    pub mobile_number: String,
    pub registration_date: String,
    pub is_active: bool,
}

impl From<&Member> for ReferralSummary {
    fn from(member: &Member) -> Self {
        Self {
            user_id: member.public_id.clone(),
            full_name: member.full_name.clone(),
            email: member.email.clone(),
            mobile_number: member.mobile_number.clone(),
            registration_date: member
                .registered_at
                .format(REGISTRATION_DATE_FORMAT)
                .to_string(),
            is_active: member.is_active,
        }
    }
}

/// Full member record without credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
    pub id: u64,
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    pub mobile_number: String,
    pub sponsor_id: Option<String>,
    pub registration_date: String,
    pub is_active: bool,
    pub is_admin: bool,
}

impl From<&Member> for MemberProfile {
    fn from(member: &Member) -> Self {
        Self {
            id: member.internal_id,
            user_id: member.public_id.clone(),
            full_name: member.full_name.clone(),
            email: member.email.clone(),
            mobile_number: member.mobile_number.clone(),
            sponsor_id: member.sponsor_public_id.clone(),
            registration_date: member
                .registered_at
                .format(REGISTRATION_DATE_FORMAT)
                .to_string(),
            is_active: member.is_active,
            is_admin: member.is_admin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    pub user_id: String,
    pub max_levels: usize,
    pub total_team_members: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeSummary {
    pub user_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_income: Decimal,
}
