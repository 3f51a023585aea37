use anyhow::Result;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::aggregate::bubbles::BubbleData;
use crate::model::TimelineEvent;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Json => "JSON",
            ExportFormat::Csv => "CSV",
        }
    }
}

/// Flattened event row for export
#[derive(Debug, Serialize)]
pub struct ExportedEvent {
    pub id: i64,
    pub timestamp: String,
    pub kind: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub asset_count: usize,
    pub participants: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub tags: String,
}

impl ExportedEvent {
    fn from_event(event: &TimelineEvent) -> Self {
        Self {
            id: event.id,
            timestamp: event.timestamp.to_rfc3339(),
            kind: format!("{:?}", event.kind).to_lowercase(),
            title: event.title.clone(),
            description: event.description.clone(),
            asset_count: event.assets.len(),
            participants: event
                .participant_ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(";"),
            latitude: event.location.map(|p| p.lat),
            longitude: event.location.map(|p| p.lon),
            tags: event.tags.join(";"),
        }
    }
}

/// Export events to a file, sorted by timestamp.
pub fn export_events(
    events: &[TimelineEvent],
    output_path: &Path,
    format: ExportFormat,
) -> Result<usize> {
    let mut rows: Vec<ExportedEvent> = events.iter().map(ExportedEvent::from_event).collect();
    rows.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
    let count = rows.len();

    match format {
        ExportFormat::Json => export_json(&rows, output_path)?,
        ExportFormat::Csv => export_csv(&rows, output_path)?,
    }

    Ok(count)
}

/// Export a bubble overview as JSON. Bubbles are a point-in-time
/// summary; they are regenerated on each run, never read back.
pub fn export_bubbles(bubbles: &[BubbleData], output_path: &Path) -> Result<usize> {
    export_json(bubbles, output_path)?;
    Ok(bubbles.len())
}

fn export_json<T: Serialize>(rows: &[T], output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(rows)?;
    let mut file = File::create(output_path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

fn export_csv(rows: &[ExportedEvent], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EventKind;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn event(id: i64, day: u32) -> TimelineEvent {
        TimelineEvent {
            id,
            owner_id: 1,
            context_id: None,
            timestamp: Utc.with_ymd_and_hms(2024, 7, day, 9, 0, 0).unwrap(),
            kind: EventKind::Photo,
            title: Some("Morning walk".to_string()),
            description: None,
            assets: Vec::new(),
            participant_ids: [4, 5].into_iter().collect(),
            location: None,
            privacy: Default::default(),
            tags: vec!["pets".to_string()],
        }
    }

    #[test]
    fn test_export_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("timeline.json");

        let count = export_events(&[event(2, 10), event(1, 5)], &path, ExportFormat::Json).unwrap();
        assert_eq!(count, 2);

        let content = std::fs::read_to_string(&path).unwrap();
        let rows: Vec<serde_json::Value> = serde_json::from_str(&content).unwrap();
        assert_eq!(rows.len(), 2);
        // Sorted by timestamp, not input order.
        assert_eq!(rows[0]["id"], 1);
        assert_eq!(rows[0]["participants"], "4;5");
    }

    #[test]
    fn test_export_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("timeline.csv");

        export_events(&[event(1, 5)], &path, ExportFormat::Csv).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert!(lines.next().unwrap().starts_with("id,timestamp,kind"));
        assert!(lines.next().unwrap().contains("Morning walk"));
    }
}
