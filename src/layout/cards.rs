//! Collision-free card placement along the time axis.
//!
//! Cards alternate sides of the axis in traversal order. Placement is
//! greedy: each card is proposed at its true time offset and pushed
//! forward along the axis just far enough to clear anything already
//! placed on its side. Cheap enough to rerun on every viewport or zoom
//! change; no global optimization.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{DisplayMode, LayoutNode, Orientation, Viewport};
use crate::config::CardLayoutConfig;
use crate::geometry::{Point, Rect};
use crate::model::RenderNode;

/// Position render nodes as non-overlapping cards (maximal mode) or as
/// bare markers with thinned labels (minimal mode). `nodes` must
/// already be ordered along the time axis.
pub fn layout_cards(
    nodes: &[RenderNode],
    mode: DisplayMode,
    orientation: Orientation,
    viewport: Viewport,
    px_per_hour: f64,
    min_date: DateTime<Utc>,
    config: &CardLayoutConfig,
) -> Vec<LayoutNode> {
    let axis = match orientation {
        Orientation::Vertical => viewport.width / 2.0,
        Orientation::Horizontal => viewport.height / 2.0,
    };

    match mode {
        DisplayMode::Maximal => layout_maximal(nodes, orientation, axis, px_per_hour, min_date, config),
        DisplayMode::Minimal => layout_minimal(nodes, orientation, axis, px_per_hour, min_date, config),
    }
}

fn primary_offset(node: &RenderNode, min_date: DateTime<Utc>, px_per_hour: f64) -> f64 {
    let elapsed = (node.timestamp() - min_date).num_seconds() as f64 / 3600.0;
    elapsed * px_per_hour
}

/// Card extent along the time axis, estimated from node type: cluster
/// chips are compact, events with media need room for a thumbnail.
fn card_extent(node: &RenderNode, config: &CardLayoutConfig) -> f64 {
    match node {
        RenderNode::Cluster { .. } => config.cluster_extent,
        RenderNode::Event(e) if !e.assets.is_empty() => config.media_extent,
        RenderNode::Event(_) => config.event_extent,
    }
}

fn layout_maximal(
    nodes: &[RenderNode],
    orientation: Orientation,
    axis: f64,
    px_per_hour: f64,
    min_date: DateTime<Utc>,
    config: &CardLayoutConfig,
) -> Vec<LayoutNode> {
    // Occupied rectangles per side, in placement order.
    let mut near_side: Vec<Rect> = Vec::new();
    let mut far_side: Vec<Rect> = Vec::new();
    let mut placed = Vec::with_capacity(nodes.len());
    let mut shifted = 0usize;

    for (i, node) in nodes.iter().enumerate() {
        let offset = primary_offset(node, min_date, px_per_hour);
        let extent = card_extent(node, config);
        let near = i % 2 == 0;

        let mut rect = match orientation {
            Orientation::Vertical => {
                let x = if near {
                    axis - config.axis_gap - config.card_width
                } else {
                    axis + config.axis_gap
                };
                Rect::new(x, offset, config.card_width, extent)
            }
            Orientation::Horizontal => {
                let y = if near {
                    axis - config.axis_gap - config.card_width
                } else {
                    axis + config.axis_gap
                };
                Rect::new(offset, y, extent, config.card_width)
            }
        };

        let occupied = if near { &mut near_side } else { &mut far_side };
        let mut moved = false;
        loop {
            let blocking = occupied.iter().find(|other| rect.intersects(other));
            match blocking {
                Some(other) => {
                    // Slide forward along the time axis to just past the
                    // blocking card.
                    match orientation {
                        Orientation::Vertical => rect.y = other.bottom() + config.card_spacing,
                        Orientation::Horizontal => rect.x = other.right() + config.card_spacing,
                    }
                    moved = true;
                }
                None => break,
            }
        }
        if moved {
            shifted += 1;
        }
        occupied.push(rect);

        let marker = match orientation {
            Orientation::Vertical => Point::new(axis, offset),
            Orientation::Horizontal => Point::new(offset, axis),
        };

        placed.push(LayoutNode {
            node: node.clone(),
            card: Some(rect),
            marker,
            label_visible: true,
        });
    }

    debug!(nodes = placed.len(), shifted, "card layout complete");
    placed
}

fn layout_minimal(
    nodes: &[RenderNode],
    orientation: Orientation,
    axis: f64,
    px_per_hour: f64,
    min_date: DateTime<Utc>,
    config: &CardLayoutConfig,
) -> Vec<LayoutNode> {
    let mut placed = Vec::with_capacity(nodes.len());
    let mut last_visible: Option<f64> = None;

    for node in nodes {
        let offset = primary_offset(node, min_date, px_per_hour);
        let visible = match last_visible {
            Some(prev) => offset - prev >= config.min_label_spacing,
            None => true,
        };
        if visible {
            last_visible = Some(offset);
        }

        let marker = match orientation {
            Orientation::Vertical => Point::new(axis, offset),
            Orientation::Horizontal => Point::new(offset, axis),
        };

        placed.push(LayoutNode {
            node: node.clone(),
            card: None,
            marker,
            label_visible: visible,
        });
    }

    placed
}
