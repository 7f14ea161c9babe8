//! Rank / XP progression
//!
//! Linear-delta curve: each rank costs 500 XP more than the previous one.
//! XP to next rank = 1500 + (rank - 1) * 500, so the cumulative score to reach
//! a rank has the closed form (rank - 1) * (1000 + 250 * rank).
//!
//! Rank 2: 1,500 | Rank 5: 9,000 | Rank 10: 31,500 | Rank 100: 2,574,000

use serde::{Deserialize, Serialize};

/// Highest attainable rank
pub const MAX_RANK: u32 = 100;
/// Spacing between milestone ranks
pub const MILESTONE_STEP: u32 = 10;

/// Derived rank information for a cumulative score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankDetails {
    pub rank: u32,
    /// Score earned inside the current rank
    pub progress: u64,
    /// Width of the current rank band
    pub to_next_rank: u64,
    pub total_score: u64,
    pub is_max_rank: bool,
}

/// Cumulative score required to reach `rank`
pub fn get_score_for_rank(rank: u32) -> u64 {
    if rank <= 1 {
        return 0;
    }
    let rank = rank as u64;
    (rank - 1) * (1000 + 250 * rank)
}

/// XP needed to advance from `rank` to `rank + 1`
pub fn get_xp_to_next_rank(rank: u32) -> u64 {
    if rank == 0 {
        return 1500;
    }
    if rank >= MAX_RANK {
        return 0;
    }
    1500 + (rank as u64 - 1) * 500
}

/// Score at the halfway point of `rank`
pub fn get_score_for_mid_rank(rank: u32) -> u64 {
    if rank == 0 {
        return 0;
    }
    if rank >= MAX_RANK {
        return get_score_for_rank(MAX_RANK);
    }
    let base = get_score_for_rank(rank);
    let next = get_score_for_rank(rank + 1);
    base + (next - base) / 2
}

/// All milestone ranks: 10, 20, ... MAX_RANK
pub fn get_milestone_ranks() -> Vec<u32> {
    (MILESTONE_STEP..=MAX_RANK).step_by(MILESTONE_STEP as usize).collect()
}

/// First milestone strictly above `current_rank`, if any remain
pub fn get_next_milestone(current_rank: u32) -> Option<u32> {
    let next = (current_rank / MILESTONE_STEP + 1) * MILESTONE_STEP;
    (next <= MAX_RANK).then_some(next)
}

/// Milestones crossed going from `from_rank` (exclusive) to `to_rank` (inclusive)
pub fn get_milestones_in_range(from_rank: u32, to_rank: u32) -> Vec<u32> {
    if to_rank <= from_rank {
        return Vec::new();
    }
    get_milestone_ranks()
        .into_iter()
        .filter(|&m| m > from_rank && m <= to_rank)
        .collect()
}

/// Resolve a cumulative score to its rank.
///
/// A non-positive score is rank 0 (nothing earned yet).
pub fn calculate_rank_details(total_score: u64) -> RankDetails {
    if total_score == 0 {
        return RankDetails {
            rank: 0,
            progress: 0,
            to_next_rank: get_xp_to_next_rank(0),
            total_score: 0,
            is_max_rank: false,
        };
    }

    let mut rank = 1;
    while rank < MAX_RANK && total_score >= get_score_for_rank(rank + 1) {
        rank += 1;
    }

    let base = get_score_for_rank(rank);
    let next = get_score_for_rank(rank + 1);

    RankDetails {
        rank,
        progress: total_score - base,
        to_next_rank: next - base,
        total_score,
        is_max_rank: rank >= MAX_RANK,
    }
}
