//! Swimlane layout.
//!
//! Each selected participant owns a fixed horizontal lane. Events land
//! as cards in their participant's lane; events shared across lanes
//! become bridge rectangles spanning every involved lane. A final 1D
//! sweep nudges colliding rectangles apart along the time axis.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::SwimlaneConfig;
use crate::geometry::Rect;
use crate::model::TimelineEvent;

/// One positioned rectangle in the swimlane view.
#[derive(Debug, Clone)]
pub struct SwimlaneItem {
    pub event_id: i64,
    pub rect: Rect,
    /// Topmost lane the rectangle touches.
    pub start_lane: usize,
    /// Bottommost lane the rectangle touches.
    pub end_lane: usize,
    pub is_bridge: bool,
}

/// Lay out events across fixed per-participant lanes. Events involving
/// none of the lane owners are skipped.
pub fn layout_swimlanes(
    events: &[TimelineEvent],
    lane_owners: &[i64],
    start_date: DateTime<Utc>,
    config: &SwimlaneConfig,
) -> Vec<SwimlaneItem> {
    let mut ordered: Vec<&TimelineEvent> = events.iter().collect();
    ordered.sort_by_key(|e| (e.timestamp, e.id));

    let mut items: Vec<SwimlaneItem> = Vec::new();
    for event in ordered {
        let mut lanes: Vec<usize> = event
            .everyone()
            .iter()
            .filter_map(|id| lane_owners.iter().position(|owner| owner == id))
            .collect();
        if lanes.is_empty() {
            continue;
        }
        lanes.sort_unstable();

        let start_lane = lanes[0];
        let end_lane = *lanes.last().unwrap();
        let x = elapsed_px(event.timestamp, start_date, config);

        let rect = if start_lane == end_lane {
            // Standard card centered in its lane's band.
            let band_top = start_lane as f64 * config.lane_height;
            Rect::new(
                x,
                band_top + (config.lane_height - config.card_height) / 2.0,
                config.card_width,
                config.card_height,
            )
        } else {
            // Bridge spanning from near the top of the first lane to
            // near the bottom of the last, inset from the band edges.
            let top = start_lane as f64 * config.lane_height + config.bridge_inset;
            let bottom = (end_lane + 1) as f64 * config.lane_height - config.bridge_inset;
            Rect::new(x, top, config.card_width, bottom - top)
        };

        items.push(SwimlaneItem {
            event_id: event.id,
            rect,
            start_lane,
            end_lane,
            is_bridge: start_lane != end_lane,
        });
    }

    resolve_collisions(&mut items, config);

    debug!(items = items.len(), lanes = lane_owners.len(), "swimlane layout complete");
    items
}

fn elapsed_px(ts: DateTime<Utc>, start_date: DateTime<Utc>, config: &SwimlaneConfig) -> f64 {
    let days = (ts - start_date).num_seconds() as f64 / 86_400.0;
    days * config.pixels_per_day
}

/// Push overlapping rectangles apart along x. Only pairs whose lane
/// ranges intersect can actually collide; the later rectangle moves
/// right past the earlier one plus a fixed gap.
fn resolve_collisions(items: &mut [SwimlaneItem], config: &SwimlaneConfig) {
    items.sort_by(|a, b| {
        a.rect
            .x
            .partial_cmp(&b.rect.x)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.event_id.cmp(&b.event_id))
    });

    for i in 1..items.len() {
        let mut j = 0;
        while j < i {
            let earlier = items[j].rect;
            let lanes_overlap =
                items[i].start_lane <= items[j].end_lane && items[j].start_lane <= items[i].end_lane;
            let x_overlap = items[i].rect.x < earlier.right() && earlier.x < items[i].rect.right();

            if lanes_overlap && x_overlap {
                let overlap = earlier.right() - items[i].rect.x;
                items[i].rect.x += overlap + config.collision_gap;
                // Restart against everything placed before; the shift
                // may have created a new conflict further right.
                j = 0;
            } else {
                j += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EventKind;
    use chrono::{Duration, TimeZone};

    fn start_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn event(id: i64, hours: i64, owner: i64, participants: &[i64]) -> TimelineEvent {
        TimelineEvent {
            id,
            owner_id: owner,
            context_id: None,
            timestamp: start_date() + Duration::hours(hours),
            kind: EventKind::Photo,
            title: None,
            description: None,
            assets: Vec::new(),
            participant_ids: participants.iter().copied().collect(),
            location: None,
            privacy: Default::default(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_single_lane_card_centered_in_band() {
        let events = vec![event(1, 0, 7, &[])];
        let items = layout_swimlanes(&events, &[7, 8], start_date(), &SwimlaneConfig::default());
        let config = SwimlaneConfig::default();

        assert_eq!(items.len(), 1);
        assert!(!items[0].is_bridge);
        assert_eq!(items[0].start_lane, 0);
        let expected_y = (config.lane_height - config.card_height) / 2.0;
        assert!((items[0].rect.y - expected_y).abs() < 1e-9);
    }

    #[test]
    fn test_shared_event_becomes_bridge() {
        let events = vec![event(1, 0, 7, &[9])];
        let items = layout_swimlanes(&events, &[7, 8, 9], start_date(), &SwimlaneConfig::default());
        let config = SwimlaneConfig::default();

        assert_eq!(items.len(), 1);
        let bridge = &items[0];
        assert!(bridge.is_bridge);
        assert_eq!((bridge.start_lane, bridge.end_lane), (0, 2));
        assert!((bridge.rect.y - config.bridge_inset).abs() < 1e-9);
        let expected_bottom = 3.0 * config.lane_height - config.bridge_inset;
        assert!((bridge.rect.bottom() - expected_bottom).abs() < 1e-9);
    }

    #[test]
    fn test_irrelevant_events_skipped() {
        let events = vec![event(1, 0, 5, &[6])];
        let items = layout_swimlanes(&events, &[7, 8], start_date(), &SwimlaneConfig::default());
        assert!(items.is_empty());
    }

    #[test]
    fn test_same_lane_collisions_resolved() {
        // Three events within the same hour pile onto lane 0.
        let events = vec![event(1, 0, 7, &[]), event(2, 0, 7, &[]), event(3, 0, 7, &[])];
        let items = layout_swimlanes(&events, &[7], start_date(), &SwimlaneConfig::default());

        for (i, a) in items.iter().enumerate() {
            for b in items.iter().skip(i + 1) {
                assert!(
                    !a.rect.intersects(&b.rect),
                    "{:?} overlaps {:?}",
                    a.rect,
                    b.rect
                );
            }
        }
        // Ordering preserved by id for identical timestamps.
        assert!(items[0].rect.x < items[1].rect.x);
        assert!(items[1].rect.x < items[2].rect.x);
    }

    #[test]
    fn test_disjoint_lanes_may_share_x() {
        let events = vec![event(1, 0, 7, &[]), event(2, 0, 8, &[])];
        let items = layout_swimlanes(&events, &[7, 8], start_date(), &SwimlaneConfig::default());

        // Different lanes never collide, so both keep their time x.
        assert!((items[0].rect.x - items[1].rect.x).abs() < 1e-9);
    }

    #[test]
    fn test_bridge_collides_with_lane_cards() {
        // A bridge across both lanes overlaps a same-time card in lane 1.
        let events = vec![event(1, 0, 7, &[8]), event(2, 0, 8, &[])];
        let items = layout_swimlanes(&events, &[7, 8], start_date(), &SwimlaneConfig::default());

        assert_eq!(items.len(), 2);
        assert!(!items[0].rect.intersects(&items[1].rect));
    }
}
