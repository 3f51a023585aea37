//! Spatial layout engines for the timeline views.
//!
//! Three independent engines, each a pure function from events (or
//! render nodes) to positioned geometry: collision-free cards along a
//! time axis, multi-stream participant flows, and per-participant
//! swimlanes. None of them draw anything; the rendering layer consumes
//! the rectangles, points, and curves they return.

pub mod cards;
pub mod flow;
pub mod swimlane;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};
use crate::model::RenderNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Markers and thinned labels only; no card rectangles.
    Minimal,
    /// Full cards, alternating sides of the axis, collision-free.
    Maximal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Time runs top to bottom.
    Vertical,
    /// Time runs left to right.
    Horizontal,
}

/// Viewport dimensions in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// A render node with its computed position.
#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub node: RenderNode,
    /// Card rectangle; absent in minimal mode.
    pub card: Option<Rect>,
    /// Marker point on the time axis.
    pub marker: Point,
    pub label_visible: bool,
}
