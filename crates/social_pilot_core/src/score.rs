//! crates/social_pilot_core/src/score.rs
//!
//! The viral score heuristic: a 0-98 popularity-potential estimate computed
//! exactly once per item, at plan creation time.

use crate::domain::{ContentType, PlanItemDraft};
use rand::Rng;

/// Scores never exceed this cap, regardless of bonuses and jitter.
pub const MAX_VIRAL_SCORE: u8 = 98;

const BASE_SCORE: u32 = 50;
const CONCISE_HOOK_BONUS: u32 = 15;
const REEL_FORMAT_BONUS: u32 = 10;
const TAG_DENSITY_BONUS: u32 = 10;
const JITTER_RANGE: u8 = 15;

/// Scores a synthesized item from its structural features plus a small
/// random jitter for plausibility.
pub fn viral_score(draft: &PlanItemDraft) -> u8 {
    let jitter = rand::thread_rng().gen_range(0..JITTER_RANGE);
    score_with_jitter(draft, jitter)
}

/// The deterministic part of the heuristic, with the jitter supplied by the
/// caller. Jitter values at or above `JITTER_RANGE` are clamped into range.
pub fn score_with_jitter(draft: &PlanItemDraft, jitter: u8) -> u8 {
    let mut score = BASE_SCORE;

    // A short hook rewards concision.
    if draft.hook.chars().count() < 50 {
        score += CONCISE_HOOK_BONUS;
    }
    if draft.content_type == ContentType::Reel {
        score += REEL_FORMAT_BONUS;
    }
    // Optimal tag density band: strictly between 5 and 15 hashtags.
    let tags = draft.hashtags.len();
    if tags > 5 && tags < 15 {
        score += TAG_DENSITY_BONUS;
    }

    score += u32::from(jitter.min(JITTER_RANGE - 1));
    score.min(u32::from(MAX_VIRAL_SCORE)) as u8
}
