//! crates/social_pilot_core/src/domain.rs
//!
//! Defines the pure, core data structures for the campaign engine.
//! These structs are independent of any provider or serialization target.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A researched audience archetype used to steer tone and visual style.
///
/// Personas are created in bulk by persona research and are immutable for
/// the rest of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Persona {
    pub name: String,
    pub handle: String,
    pub strategy: String,
    pub hook_style: String,
    pub visual_aesthetic: String,
}

/// The closed set of content formats a planned item can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    Reel,
    Post,
    Story,
    Carousel,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentType::Reel => "Reel",
            ContentType::Post => "Post",
            ContentType::Story => "Story",
            ContentType::Carousel => "Carousel",
        };
        write!(f, "{}", name)
    }
}

/// The publication lifecycle of a content item.
///
/// `Scheduled` is the initial state, `Processing` means an asset generation
/// request is in flight, and `Posted` is terminal for the publication
/// dimension (an item may still lack an image while `Posted`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentStatus {
    Scheduled,
    Processing,
    Posted,
}

/// One synthesized plan item as returned by the provider, before a status
/// and viral score are attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlanItemDraft {
    pub day: u32,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub topic: String,
    pub hook: String,
    pub caption: String,
    pub hashtags: Vec<String>,
    pub visual_prompt: String,
}

/// One scheduled unit of content, tracked through the publication state
/// machine for the lifetime of a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub day: u32,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub topic: String,
    pub hook: String,
    pub caption: String,
    pub hashtags: Vec<String>,
    pub visual_prompt: String,
    pub image_url: Option<String>,
    pub status: ContentStatus,
    pub posted_at: Option<DateTime<Utc>>,
    pub viral_score: u8,
}

/// The four campaign archetypes offered by the input form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampaignGoal {
    ThemePage,
    Creator,
    ProductSales,
    B2bMarketing,
}

impl fmt::Display for CampaignGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CampaignGoal::ThemePage => "Instagram Theme Page",
            CampaignGoal::Creator => "Personal Brand/Creator",
            CampaignGoal::ProductSales => "Product Sales",
            CampaignGoal::B2bMarketing => "B2B Marketing",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for CampaignGoal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "theme-page" | "instagram theme page" => Ok(CampaignGoal::ThemePage),
            "creator" | "personal brand/creator" => Ok(CampaignGoal::Creator),
            "product-sales" | "product sales" => Ok(CampaignGoal::ProductSales),
            "b2b" | "b2b marketing" => Ok(CampaignGoal::B2bMarketing),
            other => Err(format!("'{}' is not a recognized campaign goal", other)),
        }
    }
}

/// Campaign length and funnel phase boundaries.
///
/// These are configuration, not policy: the reference campaign runs 30 days
/// with growth on days 1..=7, trust on days 8..=21 and conversion afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CampaignShape {
    pub days: u32,
    pub growth_until: u32,
    pub trust_until: u32,
}

impl CampaignShape {
    pub fn new(days: u32, growth_until: u32, trust_until: u32) -> Result<Self, String> {
        if days == 0 {
            return Err("campaign length must be at least one day".to_string());
        }
        if growth_until == 0 || growth_until >= trust_until || trust_until >= days {
            return Err(format!(
                "phase boundaries {}/{} do not fit a {}-day campaign",
                growth_until, trust_until, days
            ));
        }
        Ok(Self { days, growth_until, trust_until })
    }
}

impl Default for CampaignShape {
    fn default() -> Self {
        Self { days: 30, growth_until: 7, trust_until: 21 }
    }
}

/// Process-wide simulated campaign time.
///
/// `simulation_day` starts at 1 and jumps to the posted item's day plus one
/// on every publish. `next_post_timer` is a countdown in scheduler ticks,
/// reset to the full interval whenever it reaches zero. Only the auto-pilot
/// scheduler mutates the clock; campaign regeneration resets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignClock {
    pub simulation_day: u32,
    pub next_post_timer: u32,
}

impl CampaignClock {
    pub fn new(interval_ticks: u32) -> Self {
        Self { simulation_day: 1, next_post_timer: interval_ticks }
    }

    /// Counts down one tick. Returns true when the countdown has expired
    /// and the scheduler should publish.
    pub fn tick(&mut self) -> bool {
        self.next_post_timer = self.next_post_timer.saturating_sub(1);
        self.next_post_timer == 0
    }

    /// Advances simulated time past a just-published day and restarts the
    /// countdown at the full interval.
    pub fn advance_past(&mut self, posted_day: u32, interval_ticks: u32) {
        self.simulation_day = posted_day + 1;
        self.next_post_timer = interval_ticks;
    }

    /// Restarts the countdown at the full interval, discarding any partial
    /// countdown (re-arming never carries ticks over).
    pub fn rewind(&mut self, interval_ticks: u32) {
        self.next_post_timer = interval_ticks;
    }
}

/// The image aspect ratio hint passed to the asset generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    /// 9:16, used for full-screen vertical formats.
    Portrait,
    /// 1:1, used for feed formats.
    Square,
}

impl AspectRatio {
    /// Vertical formats get a portrait canvas, everything else is square.
    pub fn for_content(content_type: ContentType) -> Self {
        match content_type {
            ContentType::Reel | ContentType::Story => AspectRatio::Portrait,
            ContentType::Post | ContentType::Carousel => AspectRatio::Square,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_by_content_type() {
        assert_eq!(AspectRatio::for_content(ContentType::Reel), AspectRatio::Portrait);
        assert_eq!(AspectRatio::for_content(ContentType::Story), AspectRatio::Portrait);
        assert_eq!(AspectRatio::for_content(ContentType::Post), AspectRatio::Square);
        assert_eq!(AspectRatio::for_content(ContentType::Carousel), AspectRatio::Square);
    }

    #[test]
    fn test_clock_tick_and_reset() {
        let mut clock = CampaignClock::new(3);
        assert!(!clock.tick());
        assert!(!clock.tick());
        assert!(clock.tick());
        clock.advance_past(5, 3);
        assert_eq!(clock.simulation_day, 6);
        assert_eq!(clock.next_post_timer, 3);
    }

    #[test]
    fn test_clock_rewind_discards_partial_countdown() {
        let mut clock = CampaignClock::new(10);
        clock.tick();
        clock.tick();
        clock.rewind(10);
        assert_eq!(clock.next_post_timer, 10);
    }

    #[test]
    fn test_campaign_shape_rejects_bad_boundaries() {
        assert!(CampaignShape::new(30, 7, 21).is_ok());
        assert!(CampaignShape::new(0, 7, 21).is_err());
        assert!(CampaignShape::new(30, 21, 7).is_err());
        assert!(CampaignShape::new(10, 4, 12).is_err());
    }

    #[test]
    fn test_campaign_goal_round_trip() {
        let goal: CampaignGoal = "b2b".parse().unwrap();
        assert_eq!(goal, CampaignGoal::B2bMarketing);
        assert_eq!(goal.to_string(), "B2B Marketing");
        assert!("influencer".parse::<CampaignGoal>().is_err());
    }

    #[test]
    fn test_draft_parses_provider_field_names() {
        let json = r##"{
            "day": 3,
            "type": "Reel",
            "topic": "Morning routines",
            "hook": "Stop wasting your mornings",
            "caption": "Three changes that stuck.",
            "hashtags": ["#morning", "#habits"],
            "visualPrompt": "Sunrise over a desk"
        }"##;
        let draft: PlanItemDraft = serde_json::from_str(json).unwrap();
        assert_eq!(draft.day, 3);
        assert_eq!(draft.content_type, ContentType::Reel);
    }
}
