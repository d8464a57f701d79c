//! Referral network service
//!
//! Reconstructs the sponsor hierarchy on every call from the parent pointers
//! stored in the repository and derives team sizes, levels and income.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use itertools::Itertools;
use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use crate::application::views::{LevelSummary, ReferralSummary, Statistics, TreeNode};
use crate::application::ApplicationResult;
use crate::domain::{Member, MemberArena, NodeData, RewardSchedule};
use crate::infrastructure::traits::MemberRepository;

/// Service answering tree, team and income queries for one member.
pub struct ReferralNetworkService {
    repo: Arc<dyn MemberRepository>,
    rewards: RewardSchedule,
}

impl ReferralNetworkService {
    pub fn new(repo: Arc<dyn MemberRepository>, rewards: RewardSchedule) -> Self {
        Self { repo, rewards }
    }

    pub fn rewards(&self) -> &RewardSchedule {
        &self.rewards
    }

    /// Look up a member regardless of status.
    pub fn member(&self, public_id: &str) -> ApplicationResult<Option<Member>> {
        Ok(self.repo.find_by_public_id(public_id)?)
    }

    pub fn member_by_internal_id(&self, internal_id: u64) -> ApplicationResult<Option<Member>> {
        Ok(self.repo.find_by_internal_id(internal_id)?)
    }

    /// All members, oldest registration first.
    pub fn all_members(&self) -> ApplicationResult<Vec<Member>> {
        Ok(self.repo.find_all()?)
    }

    /// Active members sponsored by `public_id`, oldest registration first.
    ///
    /// Unknown ids have no referrals.
    #[instrument(level = "debug", skip(self))]
    pub fn direct_referrals(&self, public_id: &str) -> ApplicationResult<Vec<Member>> {
        let referrals = self.repo.find_by_sponsor(public_id, true)?;
        debug!("direct_referrals: {} found", referrals.len());
        Ok(referrals)
    }

    /// Direct referrals in listing form.
    pub fn direct_referral_summaries(
        &self,
        public_id: &str,
    ) -> ApplicationResult<Vec<ReferralSummary>> {
        Ok(self
            .direct_referrals(public_id)?
            .iter()
            .map(ReferralSummary::from)
            .collect())
    }

    /// Number of distinct active members at most `max_levels` hops below
    /// `root`. The root itself is not counted.
    #[instrument(level = "debug", skip(self))]
    pub fn count_team(&self, root: &str, max_levels: usize) -> ApplicationResult<usize> {
        let levels = self.walk_levels(root, max_levels, true)?;
        let total: usize = levels.iter().map(Vec::len).sum();
        debug!("count_team: {} members in {} levels", total, levels.len());
        Ok(total)
    }

    /// Income from the reward schedule: per paying level, members at that
    /// level times the level's rate.
    ///
    /// The depth is the schedule's depth, independent of any `max_levels`.
    /// Members are counted per path, without de-duplication.
    #[instrument(level = "debug", skip(self))]
    pub fn calculate_income(&self, root: &str) -> ApplicationResult<Decimal> {
        let levels = self.walk_levels(root, self.rewards.depth(), false)?;
        let income: Decimal = levels
            .iter()
            .enumerate()
            .map(|(idx, members)| self.rewards.income_for(idx + 1, members.len()))
            .sum();
        debug!("calculate_income: {}", income);
        Ok(income)
    }

    /// Per-level member counts and income down to `max_levels`.
    ///
    /// Levels without members are omitted. Levels beyond the reward
    /// schedule are reported with a zero rate.
    #[instrument(level = "debug", skip(self))]
    pub fn generation_levels(
        &self,
        root: &str,
        max_levels: usize,
    ) -> ApplicationResult<Vec<LevelSummary>> {
        let levels = self.walk_levels(root, max_levels, true)?;
        Ok(levels
            .into_iter()
            .enumerate()
            .map(|(idx, members)| {
                let level = idx + 1;
                LevelSummary {
                    level,
                    member_count: members.len(),
                    income_per_member: self.rewards.rate_for(level),
                    total_income: self.rewards.income_for(level, members.len()),
                    members,
                }
            })
            .collect())
    }

    /// Referral tree below `root`, at most `max_levels` deep.
    ///
    /// Unknown roots yield an empty node.
    pub fn build_tree(&self, root: &str, max_levels: usize) -> ApplicationResult<TreeNode> {
        Ok(TreeNode::from_arena(&self.materialize(root, max_levels)?))
    }

    /// Depth-first materialization into an arena, driven by an explicit stack.
    #[instrument(level = "debug", skip(self))]
    pub fn materialize(&self, root: &str, max_levels: usize) -> ApplicationResult<MemberArena> {
        let mut arena = MemberArena::new();
        let Some(member) = self.repo.find_by_public_id(root)? else {
            debug!("materialize: unknown root");
            return Ok(arena);
        };

        let mut visited = HashSet::from([member.public_id.clone()]);
        let root_idx = arena.insert_node(NodeData::from(&member), None);
        let mut stack = vec![(member.public_id, root_idx, 0usize)];

        while let Some((public_id, idx, level)) = stack.pop() {
            if level >= max_levels {
                continue;
            }
            let mut pending = Vec::new();
            for referral in self.direct_referrals(&public_id)? {
                if !visited.insert(referral.public_id.clone()) {
                    warn!(
                        "sponsor cycle: {} reached again below {}",
                        referral.public_id, public_id
                    );
                    continue;
                }
                let child_idx = arena.insert_node(NodeData::from(&referral), Some(idx));
                pending.push((referral.public_id, child_idx, level + 1));
            }
            // first referral is expanded first
            stack.extend(pending.into_iter().rev());
        }

        debug!("materialize: {} nodes, depth {}", arena.len(), arena.depth());
        Ok(arena)
    }

    /// Dashboard numbers for `root`.
    #[instrument(level = "debug", skip(self))]
    pub fn statistics(&self, root: &str, max_levels: usize) -> ApplicationResult<Statistics> {
        Ok(Statistics {
            total_direct_referrals: self.direct_referrals(root)?.len(),
            total_team_members: self.count_team(root, max_levels)?,
            total_income: self.calculate_income(root)?,
            generation_levels: self.generation_levels(root, max_levels)?,
        })
    }

    /// Breadth-first walk, one repository query per level.
    ///
    /// Returns the members of levels 1..=max_levels, stopping at the first
    /// empty level. With `dedupe`, a member (or the root) seen before is not
    /// reported or expanded again.
    fn walk_levels(
        &self,
        root: &str,
        max_levels: usize,
        dedupe: bool,
    ) -> ApplicationResult<Vec<Vec<Member>>> {
        let mut visited = HashSet::from([root.to_string()]);
        let mut frontier = vec![root.to_string()];
        let mut levels = Vec::new();

        while levels.len() < max_levels && !frontier.is_empty() {
            let mut members = self.expand(&frontier)?;
            if dedupe {
                members.retain(|m| visited.insert(m.public_id.clone()));
            }
            if members.is_empty() {
                break;
            }
            debug!("level {}: {} members", levels.len() + 1, members.len());
            frontier = members.iter().map(|m| m.public_id.clone()).collect();
            levels.push(members);
        }

        Ok(levels)
    }

    /// Active referrals of a whole frontier, grouped by sponsor in frontier
    /// order, each group in registration order.
    fn expand(&self, frontier: &[String]) -> ApplicationResult<Vec<Member>> {
        let children = self.repo.find_by_sponsors(frontier, true)?;
        let mut position: HashMap<&str, usize> = HashMap::new();
        for (idx, id) in frontier.iter().enumerate() {
            position.entry(id.as_str()).or_insert(idx);
        }
        Ok(children
            .into_iter()
            .sorted_by_key(|m| {
                m.sponsor_public_id
                    .as_deref()
                    .and_then(|s| position.get(s).copied())
                    .unwrap_or(usize::MAX)
            })
            .collect())
    }
}
