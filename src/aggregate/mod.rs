//! Zoom-tier aggregation - bucket events into calendar clusters.
//!
//! The timeline is viewed at one of five tiers. Each tier buckets the
//! visible events by a calendar key; buckets over the tier's threshold
//! collapse into a single cluster node unless the caller has manually
//! expanded them. Bucket keys are built from integer date parts so they
//! are identical on every platform and locale.

pub mod bubbles;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;
use tracing::debug;

use crate::config::TierThresholds;
use crate::model::{RenderNode, TimelineEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomTier {
    Year,
    Month,
    Week,
    Day,
    /// Fully zoomed in; events are never aggregated.
    Focus,
}

impl ZoomTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoomTier::Year => "year",
            ZoomTier::Month => "month",
            ZoomTier::Week => "week",
            ZoomTier::Day => "day",
            ZoomTier::Focus => "focus",
        }
    }

    /// Cluster collapse threshold for this tier, if it aggregates at all.
    pub fn threshold(&self, thresholds: &TierThresholds) -> Option<usize> {
        match self {
            ZoomTier::Year => Some(thresholds.year),
            ZoomTier::Month => Some(thresholds.month),
            ZoomTier::Week => Some(thresholds.week),
            ZoomTier::Day => Some(thresholds.day),
            ZoomTier::Focus => None,
        }
    }
}

impl FromStr for ZoomTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "year" => Ok(ZoomTier::Year),
            "month" => Ok(ZoomTier::Month),
            "week" => Ok(ZoomTier::Week),
            "day" => Ok(ZoomTier::Day),
            "focus" => Ok(ZoomTier::Focus),
            other => Err(format!("unknown zoom tier: {}", other)),
        }
    }
}

/// Calendar bucket key for a timestamp at the given tier. Focus shares
/// the day key; the aggregator never buckets at focus tier, but the
/// bubble overview still needs a stable key there.
pub fn bucket_key(tier: ZoomTier, ts: DateTime<Utc>) -> String {
    match tier {
        ZoomTier::Year => format!("{:04}", ts.year()),
        ZoomTier::Month => format!("{:04}-{:02}", ts.year(), ts.month()),
        ZoomTier::Week => {
            let week = ts.iso_week();
            format!("{:04}-W{:02}", week.year(), week.week())
        }
        ZoomTier::Day | ZoomTier::Focus => {
            format!("{:04}-{:02}-{:02}", ts.year(), ts.month(), ts.day())
        }
    }
}

/// Aggregate events into render nodes for one zoom tier.
///
/// Every event inside the window lands in exactly one node: its own
/// event node, or the single cluster node of its calendar bucket. Ids
/// in `expanded` that no longer match any bucket are ignored.
pub fn aggregate_tiers(
    events: &[TimelineEvent],
    tier: ZoomTier,
    window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    expanded: &HashSet<String>,
    thresholds: &TierThresholds,
) -> Vec<RenderNode> {
    let mut visible: Vec<&TimelineEvent> = events
        .iter()
        .filter(|e| match window {
            Some((start, end)) => e.timestamp >= start && e.timestamp <= end,
            None => true,
        })
        .collect();
    visible.sort_by_key(|e| (e.timestamp, e.id));

    let threshold = match tier.threshold(thresholds) {
        Some(t) => t,
        None => {
            // Focus tier: one node per event, nothing collapses.
            return visible
                .into_iter()
                .map(|e| RenderNode::Event(e.clone()))
                .collect();
        }
    };

    let mut buckets: BTreeMap<String, Vec<&TimelineEvent>> = BTreeMap::new();
    for event in visible {
        buckets
            .entry(bucket_key(tier, event.timestamp))
            .or_default()
            .push(event);
    }

    let mut nodes = Vec::new();
    for (key, members) in buckets {
        let cluster_id = format!("{}:{}", tier.as_str(), key);
        if members.len() <= threshold || expanded.contains(&cluster_id) {
            nodes.extend(members.into_iter().map(|e| RenderNode::Event(e.clone())));
        } else {
            // Bucket members kept their timestamp ordering.
            nodes.push(RenderNode::Cluster {
                id: cluster_id,
                start: members[0].timestamp,
                end: members[members.len() - 1].timestamp,
                member_ids: members.iter().map(|e| e.id).collect(),
                count: members.len(),
            });
        }
    }

    debug!(tier = tier.as_str(), nodes = nodes.len(), "aggregated timeline");
    nodes
}

/// Summary counters over a timeline, used by the CLI report.
#[derive(Debug, Clone, Default)]
pub struct TimelineStats {
    pub event_count: usize,
    pub asset_count: usize,
    pub first: Option<DateTime<Utc>>,
    pub last: Option<DateTime<Utc>>,
    /// Bucket key and event count of the fullest bucket at the tier.
    pub busiest_bucket: Option<(String, usize)>,
}

pub fn timeline_stats(events: &[TimelineEvent], tier: ZoomTier) -> TimelineStats {
    let mut buckets: BTreeMap<String, usize> = BTreeMap::new();
    for event in events {
        *buckets.entry(bucket_key(tier, event.timestamp)).or_default() += 1;
    }

    TimelineStats {
        event_count: events.len(),
        asset_count: events.iter().map(|e| e.assets.len()).sum(),
        first: events.iter().map(|e| e.timestamp).min(),
        last: events.iter().map(|e| e.timestamp).max(),
        busiest_bucket: buckets
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EventKind;
    use chrono::TimeZone;

    fn event(id: i64, y: i32, m: u32, d: u32) -> TimelineEvent {
        TimelineEvent {
            id,
            owner_id: 1,
            context_id: None,
            timestamp: Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
            kind: EventKind::Photo,
            title: None,
            description: None,
            assets: Vec::new(),
            participant_ids: Default::default(),
            location: None,
            privacy: Default::default(),
            tags: Vec::new(),
        }
    }

    fn no_expanded() -> HashSet<String> {
        HashSet::new()
    }

    #[test]
    fn test_bucket_keys_are_zero_padded() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 8, 0, 0).unwrap();
        assert_eq!(bucket_key(ZoomTier::Year, ts), "2024");
        assert_eq!(bucket_key(ZoomTier::Month, ts), "2024-03");
        assert_eq!(bucket_key(ZoomTier::Week, ts), "2024-W10");
        assert_eq!(bucket_key(ZoomTier::Day, ts), "2024-03-05");
    }

    #[test]
    fn test_iso_week_year_boundary() {
        // 2024-12-30 belongs to ISO week 1 of 2025.
        let ts = Utc.with_ymd_and_hms(2024, 12, 30, 0, 0, 0).unwrap();
        assert_eq!(bucket_key(ZoomTier::Week, ts), "2025-W01");
    }

    #[test]
    fn test_small_buckets_stay_individual() {
        let events = vec![event(1, 2024, 1, 1), event(2, 2024, 3, 1)];
        let nodes = aggregate_tiers(
            &events,
            ZoomTier::Month,
            None,
            &no_expanded(),
            &TierThresholds::default(),
        );

        assert_eq!(nodes.len(), 2);
        assert!(matches!(nodes[0], RenderNode::Event(_)));
        assert!(matches!(nodes[1], RenderNode::Event(_)));
    }

    #[test]
    fn test_distinct_months_never_share_a_bucket() {
        // Many events in January and March; each month collapses into
        // its own cluster, never a combined one.
        let mut events = Vec::new();
        for i in 0..40 {
            events.push(event(i, 2024, 1, 1 + (i % 28) as u32));
        }
        for i in 40..80 {
            events.push(event(i, 2024, 3, 1 + (i % 28) as u32));
        }

        let nodes = aggregate_tiers(
            &events,
            ZoomTier::Month,
            None,
            &no_expanded(),
            &TierThresholds::default(),
        );

        assert_eq!(nodes.len(), 2);
        match (&nodes[0], &nodes[1]) {
            (
                RenderNode::Cluster { id: a, count: ca, .. },
                RenderNode::Cluster { id: b, count: cb, .. },
            ) => {
                assert_eq!(a, "month:2024-01");
                assert_eq!(b, "month:2024-03");
                assert_eq!((*ca, *cb), (40, 40));
            }
            _ => panic!("expected two cluster nodes"),
        }
    }

    #[test]
    fn test_every_event_in_exactly_one_node() {
        let mut events = Vec::new();
        for i in 0..50 {
            events.push(event(i, 2024, 1 + (i % 6) as u32, 1 + (i % 28) as u32));
        }
        let nodes = aggregate_tiers(
            &events,
            ZoomTier::Month,
            None,
            &no_expanded(),
            &TierThresholds::default(),
        );

        let mut seen: Vec<i64> = nodes.iter().flat_map(|n| n.member_event_ids()).collect();
        seen.sort_unstable();
        let expected: Vec<i64> = (0..50).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_expanded_bucket_stays_individual() {
        let events: Vec<TimelineEvent> =
            (0..12).map(|i| event(i, 2024, 5, 1 + i as u32)).collect();
        let mut thresholds = TierThresholds::default();
        thresholds.month = 10;

        let mut expanded = HashSet::new();
        expanded.insert("month:2024-05".to_string());

        let nodes = aggregate_tiers(&events, ZoomTier::Month, None, &expanded, &thresholds);
        assert_eq!(nodes.len(), 12);
        assert!(nodes.iter().all(|n| matches!(n, RenderNode::Event(_))));
    }

    #[test]
    fn test_stale_expanded_id_is_ignored() {
        let events = vec![event(1, 2024, 5, 1)];
        let mut expanded = HashSet::new();
        expanded.insert("month:2019-01".to_string());

        let nodes = aggregate_tiers(
            &events,
            ZoomTier::Month,
            None,
            &expanded,
            &TierThresholds::default(),
        );
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_focus_never_aggregates() {
        let events: Vec<TimelineEvent> =
            (0..30).map(|i| event(i, 2024, 5, 1)).collect();
        let nodes = aggregate_tiers(
            &events,
            ZoomTier::Focus,
            None,
            &no_expanded(),
            &TierThresholds::default(),
        );

        assert_eq!(nodes.len(), 30);
    }

    #[test]
    fn test_window_filters_events() {
        let events = vec![event(1, 2023, 6, 1), event(2, 2024, 6, 1), event(3, 2025, 6, 1)];
        let window = Some((
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap(),
        ));

        let nodes = aggregate_tiers(
            &events,
            ZoomTier::Year,
            window,
            &no_expanded(),
            &TierThresholds::default(),
        );
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].member_event_ids(), vec![2]);
    }

    #[test]
    fn test_timeline_stats() {
        let events = vec![event(1, 2024, 1, 1), event(2, 2024, 1, 2), event(3, 2024, 2, 1)];
        let stats = timeline_stats(&events, ZoomTier::Month);

        assert_eq!(stats.event_count, 3);
        assert_eq!(stats.busiest_bucket, Some(("2024-01".to_string(), 2)));
    }
}
