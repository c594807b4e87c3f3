use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::amount::TokenAmount;
use crate::identity::UserId;
use crate::user::User;

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

/// Which figure a leaderboard ranks by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeaderboardMetric {
    /// Total tips received.
    TopEarners,
    /// Total tips sent.
    TopTippers,
    /// Agent earnings; humans are excluded.
    Agents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: UserId,
    pub username: String,
    pub display_name: String,
    pub is_agent: bool,
    pub value: TokenAmount,
    pub count: u64,
}

impl LeaderboardMetric {
    fn measure(self, user: &User) -> Option<(TokenAmount, u64)> {
        match self {
            Self::TopEarners => Some((user.total_tips_received, user.tips_received_count)),
            Self::TopTippers => Some((user.total_tips_given, user.tips_given_count)),
            Self::Agents => user
                .agent
                .as_ref()
                .map(|agent| (agent.total_earned, agent.tip_count)),
        }
    }
}

/// Clamp a requested `limit` into `1..=MAX_LIMIT`.
pub fn clamp_limit(requested: Option<usize>) -> usize {
    requested.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Rank users by `metric`, highest first. Ties go to the older account,
/// then to the smaller id, so the order is fully deterministic.
pub fn rank<'a>(
    users: impl IntoIterator<Item = &'a User>,
    metric: LeaderboardMetric,
    limit: usize,
) -> Vec<LeaderboardEntry> {
    let mut rows: Vec<(&User, TokenAmount, u64)> = users
        .into_iter()
        .filter_map(|user| metric.measure(user).map(|(value, count)| (user, value, count)))
        .collect();
    rows.sort_by_key(|(user, value, _)| (Reverse(*value), user.created_at, user.id.clone()));
    rows.into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, (user, value, count))| LeaderboardEntry {
            rank: i as u32 + 1,
            user_id: user.id.clone(),
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            is_agent: user.is_agent(),
            value,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::AgentProfile;
    use chrono::{Duration, Utc};

    fn user(name: &str, received: u64, given: u64, age_minutes: i64) -> User {
        let mut user = User::new(
            name.into(),
            name.to_uppercase(),
            Utc::now() - Duration::minutes(age_minutes),
        );
        user.total_tips_received = TokenAmount::from_whole(received);
        user.total_tips_given = TokenAmount::from_whole(given);
        user
    }

    #[test]
    fn sorts_descending_by_metric() {
        let users = [user("a", 5, 50, 1), user("b", 30, 0, 2), user("c", 10, 20, 3)];
        let earners = rank(&users, LeaderboardMetric::TopEarners, 10);
        let names: Vec<_> = earners.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(names, ["b", "c", "a"]);
        assert_eq!(earners[0].rank, 1);
        assert_eq!(earners[0].value, TokenAmount::from_whole(30));

        let tippers = rank(&users, LeaderboardMetric::TopTippers, 10);
        let names: Vec<_> = tippers.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(names, ["a", "c", "b"]);
    }

    #[test]
    fn ties_go_to_older_account() {
        let users = [user("young", 7, 0, 1), user("old", 7, 0, 60)];
        let ranked = rank(&users, LeaderboardMetric::TopEarners, 10);
        assert_eq!(ranked[0].username, "old");
        assert_eq!(ranked[1].username, "young");
    }

    #[test]
    fn agents_board_skips_humans() {
        let mut bot = user("bot", 0, 0, 1);
        let mut profile = AgentProfile::new("m", "");
        profile.total_earned = TokenAmount::from_whole(9);
        bot.agent = Some(profile);
        let users = [user("human", 100, 0, 1), bot];
        let ranked = rank(&users, LeaderboardMetric::Agents, 10);
        assert_eq!(ranked.len(), 1);
        assert!(ranked[0].is_agent);
        assert_eq!(ranked[0].value, TokenAmount::from_whole(9));
    }

    #[test]
    fn limit_is_applied_and_clamped() {
        let users: Vec<User> = (0..5).map(|i| user(&format!("u{i}"), i, 0, 1)).collect();
        assert_eq!(rank(&users, LeaderboardMetric::TopEarners, 2).len(), 2);
        assert_eq!(clamp_limit(None), DEFAULT_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(1_000)), MAX_LIMIT);
    }
}
