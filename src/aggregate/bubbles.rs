//! Bubble overview aggregation.
//!
//! Produces one simplified circular summary per calendar bucket for the
//! zoomed-out overview: who was there, what dominated, and how big to
//! draw the bubble.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::{bucket_key, ZoomTier};
use crate::geometry::Color;
use crate::model::TimelineEvent;

/// Fallback for buckets whose tags match no registered category.
const NEUTRAL_COLOR: Color = Color::rgb(148, 155, 164);

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Simplified per-bucket summary for the overview visualization.
#[derive(Debug, Clone, Serialize)]
pub struct BubbleData {
    /// Deterministic bucket id, same form as cluster node ids.
    pub id: String,
    pub start: chrono::DateTime<chrono::Utc>,
    pub end: chrono::DateTime<chrono::Utc>,
    pub event_count: usize,
    pub label: String,
    pub color: Color,
    pub dominant_category: String,
    pub participant_ids: BTreeSet<i64>,
    /// Events attended per participant within the bucket.
    pub participant_counts: BTreeMap<i64, usize>,
    pub tier: ZoomTier,
    /// Discrete render-size factor derived from the event count.
    pub size_multiplier: f64,
}

/// One bubble per calendar bucket, sorted by bucket start time.
pub fn aggregate_bubbles(events: &[TimelineEvent], tier: ZoomTier) -> Vec<BubbleData> {
    let mut buckets: BTreeMap<String, Vec<&TimelineEvent>> = BTreeMap::new();
    for event in events {
        buckets
            .entry(bucket_key(tier, event.timestamp))
            .or_default()
            .push(event);
    }

    let mut bubbles: Vec<BubbleData> = buckets
        .into_iter()
        .map(|(key, members)| build_bubble(key, members, tier))
        .collect();
    bubbles.sort_by(|a, b| a.start.cmp(&b.start).then(a.id.cmp(&b.id)));
    bubbles
}

/// `members` is non-empty; the bucket map only creates entries on insert.
fn build_bubble(key: String, members: Vec<&TimelineEvent>, tier: ZoomTier) -> BubbleData {
    let mut start = members[0].timestamp;
    let mut end = start;
    for event in &members {
        start = start.min(event.timestamp);
        end = end.max(event.timestamp);
    }

    let mut participant_ids = BTreeSet::new();
    let mut participant_counts: BTreeMap<i64, usize> = BTreeMap::new();
    for event in &members {
        for pid in event.everyone() {
            participant_ids.insert(pid);
            *participant_counts.entry(pid).or_default() += 1;
        }
    }

    let dominant_category = dominant_category(&members);
    let color = category_color(&dominant_category).unwrap_or(NEUTRAL_COLOR);

    BubbleData {
        id: format!("{}:{}", tier.as_str(), key),
        start,
        end,
        event_count: members.len(),
        label: bucket_label(tier, start),
        color,
        dominant_category,
        participant_ids,
        participant_counts,
        tier,
        size_multiplier: size_multiplier(members.len()),
    }
}

/// Most frequent tag that maps to a registered color; ties resolve to
/// the lexicographically smaller tag. "Other" when nothing matches.
fn dominant_category(members: &[&TimelineEvent]) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for event in members {
        for tag in &event.tags {
            if category_color(tag).is_some() {
                *counts.entry(tag.as_str()).or_default() += 1;
            }
        }
    }

    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(tag, _)| tag.to_string())
        .unwrap_or_else(|| "Other".to_string())
}

/// Fixed category palette. Unregistered categories fall back to the
/// neutral color at the call site.
pub fn category_color(category: &str) -> Option<Color> {
    let color = match category {
        "family" => Color::rgb(76, 175, 80),
        "travel" => Color::rgb(33, 150, 243),
        "celebration" => Color::rgb(255, 193, 7),
        "work" => Color::rgb(96, 125, 139),
        "pets" => Color::rgb(255, 152, 0),
        "food" => Color::rgb(244, 67, 54),
        "sports" => Color::rgb(0, 150, 136),
        "music" => Color::rgb(156, 39, 176),
        _ => return None,
    };
    Some(color)
}

fn size_multiplier(count: usize) -> f64 {
    match count {
        0..=1 => 0.6,
        2..=3 => 0.8,
        4..=5 => 1.0,
        6..=10 => 1.2,
        _ => 1.4,
    }
}

fn bucket_label(tier: ZoomTier, start: chrono::DateTime<chrono::Utc>) -> String {
    use chrono::Datelike;
    let month = MONTH_NAMES[(start.month0()) as usize];
    match tier {
        ZoomTier::Year => format!("{}", start.year()),
        ZoomTier::Month => format!("{} {}", month, start.year()),
        ZoomTier::Week => {
            let week = start.iso_week();
            format!("Week {}, {}", week.week(), week.year())
        }
        ZoomTier::Day | ZoomTier::Focus => {
            format!("{} {} {}", start.day(), month, start.year())
        }
    }
}
