//! Multi-stream flow layout.
//!
//! One continuous curve per selected participant, flowing down the time
//! axis. Streams bend toward each other at shared events (junctions)
//! and separate afterward. When two participants stay together across
//! consecutive shared events, the connecting span is drawn as an
//! interleaved double-helix weave instead of a plain line; the weave is
//! purely decorative and has no layout semantics.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::debug;

use crate::config::FlowConfig;
use crate::geometry::{CubicSegment, Curve, Point};
use crate::model::TimelineEvent;

#[derive(Debug, Clone)]
pub struct FlowParticipant {
    pub id: i64,
    pub display_name: String,
}

/// One event occurrence along a participant's stream.
#[derive(Debug, Clone)]
pub struct FlowNode {
    pub event_id: i64,
    pub position: Point,
    /// Shared with at least one other selected participant.
    pub is_junction: bool,
    /// Selected participants present at the event, lane order.
    pub participant_ids: Vec<i64>,
    pub thumbnail_asset_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct FlowPath {
    pub participant_id: i64,
    pub display_name: String,
    pub curve: Curve,
    /// Fixed stream origin above the first event.
    pub origin: Point,
    pub nodes: Vec<FlowNode>,
}

/// An event shared by two or more selected participants, listed for
/// external highlighting.
#[derive(Debug, Clone)]
pub struct FlowIntersection {
    pub event_id: i64,
    pub position: Point,
    pub participant_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct FlowLayout {
    pub paths: Vec<FlowPath>,
    pub intersections: Vec<FlowIntersection>,
}

/// Presence of selected participants at one event, precomputed once and
/// shared read-only across the per-lane path builders.
struct EventStop {
    event_id: i64,
    timestamp: DateTime<Utc>,
    y: f64,
    /// Selected participant ids present, ordered by lane.
    present: Vec<i64>,
    /// Averaged lane x when the event is shared.
    junction_x: f64,
    thumbnail_asset_id: Option<i64>,
}

/// Compute one flow path per selected participant. Paths are
/// independent of each other and built in parallel.
pub fn layout_flow(
    events: &[TimelineEvent],
    participants: &[FlowParticipant],
    start_date: DateTime<Utc>,
    viewport_width: f64,
    config: &FlowConfig,
) -> FlowLayout {
    if participants.is_empty() {
        return FlowLayout::default();
    }

    let lane_of: HashMap<i64, usize> = participants
        .iter()
        .enumerate()
        .map(|(lane, p)| (p.id, lane))
        .collect();
    let base_x: Vec<f64> = (0..participants.len())
        .map(|lane| lane_x(lane, participants.len(), viewport_width, config))
        .collect();

    let mut stops: Vec<EventStop> = events
        .iter()
        .filter_map(|event| {
            let mut lanes: Vec<usize> = event
                .everyone()
                .iter()
                .filter_map(|id| lane_of.get(id).copied())
                .collect();
            if lanes.is_empty() {
                return None;
            }
            lanes.sort_unstable();

            let junction_x =
                lanes.iter().map(|&lane| base_x[lane]).sum::<f64>() / lanes.len() as f64;
            Some(EventStop {
                event_id: event.id,
                timestamp: event.timestamp,
                y: elapsed_px(event.timestamp, start_date, config),
                present: lanes.iter().map(|&lane| participants[lane].id).collect(),
                junction_x,
                thumbnail_asset_id: event.key_asset().map(|a| a.id),
            })
        })
        .collect();
    stops.sort_by_key(|s| (s.timestamp, s.event_id));

    let paths: Vec<FlowPath> = participants
        .par_iter()
        .enumerate()
        .map(|(lane, participant)| build_path(participant, lane, &base_x, &stops, config))
        .collect();

    let intersections: Vec<FlowIntersection> = stops
        .iter()
        .filter(|s| s.present.len() >= 2)
        .map(|s| FlowIntersection {
            event_id: s.event_id,
            position: Point::new(s.junction_x, s.y),
            participant_ids: s.present.clone(),
        })
        .collect();

    debug!(
        paths = paths.len(),
        intersections = intersections.len(),
        "flow layout complete"
    );

    FlowLayout {
        paths,
        intersections,
    }
}

/// Lanes are centered as a block in the viewport.
fn lane_x(lane: usize, lanes: usize, viewport_width: f64, config: &FlowConfig) -> f64 {
    let block = lanes as f64 * config.lane_width;
    viewport_width / 2.0 - block / 2.0 + (lane as f64 + 0.5) * config.lane_width
}

fn elapsed_px(ts: DateTime<Utc>, start_date: DateTime<Utc>, config: &FlowConfig) -> f64 {
    let days = (ts - start_date).num_seconds() as f64 / 86_400.0;
    days * config.pixels_per_day
}

fn build_path(
    participant: &FlowParticipant,
    lane: usize,
    base_x: &[f64],
    stops: &[EventStop],
    config: &FlowConfig,
) -> FlowPath {
    let home_x = base_x[lane];

    let nodes: Vec<FlowNode> = stops
        .iter()
        .filter(|s| s.present.contains(&participant.id))
        .map(|s| {
            let is_junction = s.present.len() >= 2;
            FlowNode {
                event_id: s.event_id,
                position: Point::new(if is_junction { s.junction_x } else { home_x }, s.y),
                is_junction,
                participant_ids: s.present.clone(),
                thumbnail_asset_id: s.thumbnail_asset_id,
            }
        })
        .collect();

    let origin = Point::new(
        home_x,
        nodes.first().map(|n| n.position.y).unwrap_or(0.0) - config.origin_lead,
    );

    let mut curve = Curve::default();
    if let Some(first) = nodes.first() {
        curve.push(flow_segment(origin, first.position));
    }
    for pair in nodes.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if is_shared_pair_run(a, b) {
            let sign = helix_phase(participant.id, &a.participant_ids);
            for seg in helix_segments(a.position, b.position, sign, config) {
                curve.push(seg);
            }
        } else {
            curve.push(flow_segment(a.position, b.position));
        }
    }
    if let Some(last) = nodes.last() {
        let tail = Point::new(last.position.x, last.position.y + config.tail_lead);
        curve.push(CubicSegment::line(last.position, tail));
    }

    FlowPath {
        participant_id: participant.id,
        display_name: participant.display_name.clone(),
        curve,
        origin,
        nodes,
    }
}

/// Two consecutive junctions shared by the same two participants form a
/// sustained run that gets the helix treatment.
fn is_shared_pair_run(a: &FlowNode, b: &FlowNode) -> bool {
    a.is_junction
        && b.is_junction
        && a.participant_ids.len() == 2
        && a.participant_ids == b.participant_ids
}

/// The participant listed first in the pair weaves right first; the
/// other starts mirrored, giving the two curves a half-turn offset.
fn helix_phase(participant_id: i64, pair: &[i64]) -> f64 {
    if pair.first() == Some(&participant_id) {
        1.0
    } else {
        -1.0
    }
}

/// Straight drop when x is unchanged, otherwise an S-curve whose
/// control points hang vertically from both endpoints: entering a
/// junction bends inward, leaving bends back outward.
fn flow_segment(from: Point, to: Point) -> CubicSegment {
    if (from.x - to.x).abs() < 1e-9 {
        return CubicSegment::line(from, to);
    }
    let mid_y = (from.y + to.y) / 2.0;
    CubicSegment {
        from,
        c1: Point::new(from.x, mid_y),
        c2: Point::new(to.x, mid_y),
        to,
    }
}

/// Oscillating weave between two sustained junction points. The span is
/// divided into half-waves; each bulges alternately left and right by
/// the helix radius. Control points overshoot the radius by 4/3 so the
/// cubic apex lands close to it.
fn helix_segments(from: Point, to: Point, start_sign: f64, config: &FlowConfig) -> Vec<CubicSegment> {
    let length = to.y - from.y;
    let waves = ((length / config.helix_half_wave) as i64).clamp(1, 5);
    let step = length / waves as f64;

    let mut segments = Vec::with_capacity(waves as usize);
    let mut sign = start_sign;
    for k in 0..waves {
        let t0 = k as f64 / waves as f64;
        let t1 = (k + 1) as f64 / waves as f64;
        let p0 = Point::new(from.x + (to.x - from.x) * t0, from.y + step * k as f64);
        let p1 = Point::new(from.x + (to.x - from.x) * t1, from.y + step * (k + 1) as f64);
        let bulge = sign * config.helix_radius * 4.0 / 3.0;

        segments.push(CubicSegment {
            from: p0,
            c1: Point::new(p0.x + bulge, p0.y + step / 3.0),
            c2: Point::new(p1.x + bulge, p1.y - step / 3.0),
            to: p1,
        });
        sign = -sign;
    }
    segments
}
