use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub clustering: ClusteringConfig,

    #[serde(default)]
    pub tiers: TierThresholds,

    #[serde(default)]
    pub cards: CardLayoutConfig,

    #[serde(default)]
    pub flow: FlowConfig,

    #[serde(default)]
    pub swimlane: SwimlaneConfig,
}

/// Context categories carry their own clustering presets: a pet's walk
/// produces tight photo runs near home, a business trip spreads sparse
/// photos across a whole city.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContextCategory {
    #[default]
    Personal,
    Family,
    Pet,
    Travel,
    Business,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Maximum elapsed time between a cluster's first and last asset.
    #[serde(default = "default_temporal_threshold_minutes")]
    pub temporal_threshold_minutes: i64,

    /// Maximum distance between any two geotagged assets in a cluster.
    #[serde(default = "default_spatial_threshold_meters")]
    pub spatial_threshold_meters: f64,

    /// Maximum gap between consecutive captures inside a burst.
    #[serde(default = "default_burst_threshold_seconds")]
    pub burst_threshold_seconds: i64,

    #[serde(default = "default_min_burst_size")]
    pub min_burst_size: usize,

    #[serde(default = "default_max_burst_size")]
    pub max_burst_size: usize,
}

fn default_temporal_threshold_minutes() -> i64 {
    120
}

fn default_spatial_threshold_meters() -> f64 {
    500.0
}

fn default_burst_threshold_seconds() -> i64 {
    30
}

fn default_min_burst_size() -> usize {
    3
}

fn default_max_burst_size() -> usize {
    50
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            temporal_threshold_minutes: default_temporal_threshold_minutes(),
            spatial_threshold_meters: default_spatial_threshold_meters(),
            burst_threshold_seconds: default_burst_threshold_seconds(),
            min_burst_size: default_min_burst_size(),
            max_burst_size: default_max_burst_size(),
        }
    }
}

impl ClusteringConfig {
    /// Preset thresholds per context category.
    pub fn for_category(category: ContextCategory) -> Self {
        let mut config = Self::default();
        match category {
            ContextCategory::Pet => {
                config.temporal_threshold_minutes = 45;
                config.spatial_threshold_meters = 200.0;
            }
            ContextCategory::Travel => {
                config.temporal_threshold_minutes = 240;
                config.spatial_threshold_meters = 2000.0;
            }
            ContextCategory::Business => {
                config.temporal_threshold_minutes = 300;
                config.spatial_threshold_meters = 3000.0;
            }
            ContextCategory::Personal | ContextCategory::Family => {}
        }
        config
    }
}

/// Per-tier cluster collapse thresholds: a calendar bucket with more
/// events than its tier threshold is rendered as one cluster node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierThresholds {
    #[serde(default = "default_year_threshold")]
    pub year: usize,

    #[serde(default = "default_month_threshold")]
    pub month: usize,

    #[serde(default = "default_week_threshold")]
    pub week: usize,

    #[serde(default = "default_day_threshold")]
    pub day: usize,
}

fn default_year_threshold() -> usize {
    20
}

fn default_month_threshold() -> usize {
    30
}

fn default_week_threshold() -> usize {
    15
}

fn default_day_threshold() -> usize {
    8
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            year: default_year_threshold(),
            month: default_month_threshold(),
            week: default_week_threshold(),
            day: default_day_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardLayoutConfig {
    #[serde(default = "default_card_width")]
    pub card_width: f64,

    /// Card extent for events without media.
    #[serde(default = "default_event_extent")]
    pub event_extent: f64,

    /// Card extent for events carrying media thumbnails.
    #[serde(default = "default_media_extent")]
    pub media_extent: f64,

    /// Card extent for collapsed cluster nodes.
    #[serde(default = "default_cluster_extent")]
    pub cluster_extent: f64,

    /// Gap between the time axis and the near edge of a card.
    #[serde(default = "default_axis_gap")]
    pub axis_gap: f64,

    /// Minimum separation between cards on the same side.
    #[serde(default = "default_card_spacing")]
    pub card_spacing: f64,

    /// Labels closer than this along the time axis are hidden in
    /// minimal mode.
    #[serde(default = "default_min_label_spacing")]
    pub min_label_spacing: f64,
}

fn default_card_width() -> f64 {
    220.0
}

fn default_event_extent() -> f64 {
    88.0
}

fn default_media_extent() -> f64 {
    148.0
}

fn default_cluster_extent() -> f64 {
    56.0
}

fn default_axis_gap() -> f64 {
    28.0
}

fn default_card_spacing() -> f64 {
    12.0
}

fn default_min_label_spacing() -> f64 {
    48.0
}

impl Default for CardLayoutConfig {
    fn default() -> Self {
        Self {
            card_width: default_card_width(),
            event_extent: default_event_extent(),
            media_extent: default_media_extent(),
            cluster_extent: default_cluster_extent(),
            axis_gap: default_axis_gap(),
            card_spacing: default_card_spacing(),
            min_label_spacing: default_min_label_spacing(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    #[serde(default = "default_pixels_per_day")]
    pub pixels_per_day: f64,

    #[serde(default = "default_lane_width")]
    pub lane_width: f64,

    /// Sideways amplitude of the helix weave.
    #[serde(default = "default_helix_radius")]
    pub helix_radius: f64,

    /// Vertical span of one helix half-wave.
    #[serde(default = "default_helix_half_wave")]
    pub helix_half_wave: f64,

    /// How far above its first event a stream originates.
    #[serde(default = "default_origin_lead")]
    pub origin_lead: f64,

    /// How far past its last event a stream continues.
    #[serde(default = "default_tail_lead")]
    pub tail_lead: f64,

    /// Seed reserved for weave jitter. Jitter is currently disabled;
    /// the seed is kept so enabling it stays reproducible.
    #[serde(default)]
    pub jitter_seed: u64,
}

fn default_pixels_per_day() -> f64 {
    12.0
}

fn default_lane_width() -> f64 {
    160.0
}

fn default_helix_radius() -> f64 {
    18.0
}

fn default_helix_half_wave() -> f64 {
    150.0
}

fn default_origin_lead() -> f64 {
    80.0
}

fn default_tail_lead() -> f64 {
    60.0
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            pixels_per_day: default_pixels_per_day(),
            lane_width: default_lane_width(),
            helix_radius: default_helix_radius(),
            helix_half_wave: default_helix_half_wave(),
            origin_lead: default_origin_lead(),
            tail_lead: default_tail_lead(),
            jitter_seed: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwimlaneConfig {
    #[serde(default = "default_lane_height")]
    pub lane_height: f64,

    #[serde(default = "default_swimlane_card_width")]
    pub card_width: f64,

    #[serde(default = "default_swimlane_card_height")]
    pub card_height: f64,

    /// Vertical inset of a bridge card from the outer lane edges.
    #[serde(default = "default_bridge_inset")]
    pub bridge_inset: f64,

    /// Horizontal gap inserted when resolving collisions.
    #[serde(default = "default_collision_gap")]
    pub collision_gap: f64,

    #[serde(default = "default_swimlane_pixels_per_day")]
    pub pixels_per_day: f64,
}

fn default_lane_height() -> f64 {
    120.0
}

fn default_swimlane_card_width() -> f64 {
    96.0
}

fn default_swimlane_card_height() -> f64 {
    72.0
}

fn default_bridge_inset() -> f64 {
    10.0
}

fn default_collision_gap() -> f64 {
    16.0
}

fn default_swimlane_pixels_per_day() -> f64 {
    14.0
}

impl Default for SwimlaneConfig {
    fn default() -> Self {
        Self {
            lane_height: default_lane_height(),
            card_width: default_swimlane_card_width(),
            card_height: default_swimlane_card_height(),
            bridge_inset: default_bridge_inset(),
            collision_gap: default_collision_gap(),
            pixels_per_day: default_swimlane_pixels_per_day(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            // Create default config
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("momenta")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}
