//! crates/social_pilot_core/src/plan.rs
//!
//! The plan repository: owns the ordered content-item sequence and enforces
//! the publication/generation state machine. All mutation of campaign items
//! goes through this type; callers never read-modify-write item state on
//! their own, which is what keeps the scheduler and the batch pipeline from
//! losing each other's updates.

use crate::domain::{ContentItem, ContentStatus, PlanItemDraft};
use crate::score::viral_score;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Errors produced by plan construction and per-item operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("plan contains no items")]
    Empty,
    #[error("plan covers {got} days, expected {expected}")]
    WrongLength { got: usize, expected: u32 },
    #[error("day {0} is outside the campaign range 1..={1}")]
    DayOutOfRange(u32, u32),
    #[error("day {0} appears more than once in the plan")]
    DuplicateDay(u32),
    #[error("item index {0} is out of bounds")]
    IndexOutOfBounds(usize),
    #[error("day {0} has already been posted")]
    AlreadyPosted(u32),
    #[error("no generation is in flight for day {0}")]
    NotGenerating(u32),
}

/// The outcome of a generation request for a single item. The two no-op
/// variants make repeated requests idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStart {
    Started,
    AlreadyHasImage,
    InFlight,
}

/// Aggregate campaign numbers for the dashboard header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CampaignStats {
    pub posted: usize,
    pub remaining: usize,
    pub average_viral_score: u32,
}

/// An ordered, day-unique sequence of content items plus the in-flight
/// generation bookkeeping.
///
/// Items are kept sorted ascending by day, so "lowest day first" selection
/// is just a front-to-back scan. The `in_flight` set covers every item with
/// a pending generation request, including `Posted` items backfilling an
/// image, so no item is ever targeted by two concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct CampaignPlan {
    items: Vec<ContentItem>,
    in_flight: BTreeSet<usize>,
}

impl CampaignPlan {
    /// An empty plan: the pre-campaign state.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a plan atomically from synthesized drafts: validates the day
    /// coverage, scores every item exactly once and initializes every
    /// status to `Scheduled`. On any validation failure nothing is kept.
    pub fn from_drafts(drafts: Vec<PlanItemDraft>, expected_days: u32) -> Result<Self, PlanError> {
        Self::validate_drafts(&drafts, expected_days)?;

        let mut items: Vec<ContentItem> = drafts
            .into_iter()
            .map(|draft| {
                let score = viral_score(&draft);
                ContentItem {
                    day: draft.day,
                    content_type: draft.content_type,
                    topic: draft.topic,
                    hook: draft.hook,
                    caption: draft.caption,
                    hashtags: draft.hashtags,
                    visual_prompt: draft.visual_prompt,
                    image_url: None,
                    status: ContentStatus::Scheduled,
                    posted_at: None,
                    viral_score: score,
                }
            })
            .collect();
        items.sort_by_key(|item| item.day);

        Ok(Self { items, in_flight: BTreeSet::new() })
    }

    /// Checks that the drafts cover exactly the days `1..=expected_days`,
    /// with no gaps, duplicates or out-of-range days. The provider gateway
    /// runs this check so schema violations surface before a plan is built.
    pub fn validate_drafts(drafts: &[PlanItemDraft], expected_days: u32) -> Result<(), PlanError> {
        if drafts.is_empty() {
            return Err(PlanError::Empty);
        }
        if drafts.len() != expected_days as usize {
            return Err(PlanError::WrongLength { got: drafts.len(), expected: expected_days });
        }

        let mut seen = BTreeSet::new();
        for draft in drafts {
            if draft.day == 0 || draft.day > expected_days {
                return Err(PlanError::DayOutOfRange(draft.day, expected_days));
            }
            if !seen.insert(draft.day) {
                return Err(PlanError::DuplicateDay(draft.day));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Result<&ContentItem, PlanError> {
        self.items.get(index).ok_or(PlanError::IndexOutOfBounds(index))
    }

    /// The lowest-day item still awaiting publication, or `None` when the
    /// campaign is complete.
    pub fn find_next_scheduled(&self) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.status == ContentStatus::Scheduled)
    }

    /// Up to `limit` imageless items in ascending day order, skipping any
    /// with a generation already in flight. A `Posted` item without an
    /// image is still eligible for backfill.
    pub fn find_next_imageless(&self, limit: usize) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(index, item)| item.image_url.is_none() && !self.in_flight.contains(index))
            .map(|(index, _)| index)
            .take(limit)
            .collect()
    }

    /// Starts a generation request for one item.
    ///
    /// Idempotent: an item that already has an image, or already has a
    /// request in flight, yields a no-op outcome and no state change. A
    /// `Scheduled` item transitions to `Processing`; a `Posted` item keeps
    /// its status, since nothing ever leaves `Posted`.
    pub fn begin_generation(&mut self, index: usize) -> Result<GenerationStart, PlanError> {
        let item = self.items.get_mut(index).ok_or(PlanError::IndexOutOfBounds(index))?;

        if item.image_url.is_some() {
            return Ok(GenerationStart::AlreadyHasImage);
        }
        if self.in_flight.contains(&index) {
            return Ok(GenerationStart::InFlight);
        }

        if item.status == ContentStatus::Scheduled {
            item.status = ContentStatus::Processing;
        }
        self.in_flight.insert(index);
        Ok(GenerationStart::Started)
    }

    /// Records a successful generation: stores the asset reference and
    /// reconciles the status. An item published while its generation was in
    /// flight stays `Posted` (publication wins); otherwise it settles back
    /// to `Scheduled`.
    pub fn complete_generation(&mut self, index: usize, url: String) -> Result<(), PlanError> {
        let item = self.items.get_mut(index).ok_or(PlanError::IndexOutOfBounds(index))?;
        if !self.in_flight.remove(&index) {
            return Err(PlanError::NotGenerating(item.day));
        }

        item.image_url = Some(url);
        if item.status == ContentStatus::Processing {
            item.status = ContentStatus::Scheduled;
        }
        Ok(())
    }

    /// Records a failed generation: the item is released and rolled back to
    /// `Scheduled` so it is never stuck at `Processing`. A `Posted` item
    /// keeps its status and simply stays imageless.
    pub fn fail_generation(&mut self, index: usize) -> Result<(), PlanError> {
        let item = self.items.get_mut(index).ok_or(PlanError::IndexOutOfBounds(index))?;
        if !self.in_flight.remove(&index) {
            return Err(PlanError::NotGenerating(item.day));
        }

        if item.status == ContentStatus::Processing {
            item.status = ContentStatus::Scheduled;
        }
        Ok(())
    }

    /// Publishes one item, stamping `posted_at` exactly once. Publication
    /// is irreversible and takes precedence over an in-flight generation:
    /// a `Processing` item moves straight to `Posted` and the late image
    /// result is reconciled by `complete_generation`.
    pub fn mark_posted(
        &mut self,
        index: usize,
        at: DateTime<Utc>,
    ) -> Result<&ContentItem, PlanError> {
        let item = self.items.get_mut(index).ok_or(PlanError::IndexOutOfBounds(index))?;
        if item.status == ContentStatus::Posted {
            return Err(PlanError::AlreadyPosted(item.day));
        }

        item.status = ContentStatus::Posted;
        item.posted_at = Some(at);
        Ok(&self.items[index])
    }

    pub fn stats(&self) -> CampaignStats {
        let posted = self
            .items
            .iter()
            .filter(|item| item.status == ContentStatus::Posted)
            .count();
        let total_score: u32 = self.items.iter().map(|item| u32::from(item.viral_score)).sum();
        let average_viral_score = if self.items.is_empty() {
            0
        } else {
            total_score / self.items.len() as u32
        };

        CampaignStats {
            posted,
            remaining: self.items.len() - posted,
            average_viral_score,
        }
    }
}
