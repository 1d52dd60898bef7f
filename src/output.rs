//! Result serialization: GeoJSON overlays, the results table, run reports.
//!
//! Everything here consumes the prisms produced by
//! [`crate::generator::prisms_from_boxes`], so coordinates are already in
//! Web-Mercator meters and only need unprojecting for the geographic
//! columns and polygon rings.

use std::fs;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde::Serialize;
use serde_json::Map;

use crate::engine::MergeOutcome;
use crate::error::{PrismergeError, Result};
use crate::projection::unproject;
use prismerge_types::prism::Prism;

/// Fill styling applied to every result polygon, readable by
/// simplestyle-aware viewers.
const FILL_COLOR: &str = "#00ff00";
const FILL_OPACITY: f64 = 0.6;

/// Default feature name for merged volumes, which carry no label.
const DEFAULT_FEATURE_NAME: &str = "query volume";

/// Format epoch seconds as an RFC 3339 UTC timestamp.
///
/// Sub-second precision is kept when present, so `0.5` renders as
/// `1970-01-01T00:00:00.500Z`.
///
/// # Errors
///
/// Returns a serialization error when the value is outside the range a
/// datetime can represent.
pub fn iso8601(epoch_seconds: f64) -> Result<String> {
    let micros = (epoch_seconds * 1e6).round();
    if !micros.is_finite() || micros >= i64::MAX as f64 || micros <= i64::MIN as f64 {
        return Err(PrismergeError::Serialization(format!(
            "timestamp {epoch_seconds} is outside the datetime range"
        )));
    }
    let datetime = DateTime::<Utc>::from_timestamp_micros(micros as i64).ok_or_else(|| {
        PrismergeError::Serialization(format!(
            "timestamp {epoch_seconds} is outside the datetime range"
        ))
    })?;
    Ok(datetime.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

fn prism_to_feature(prism: &Prism) -> Result<Feature> {
    let (lon_min, lat_min) = unproject(prism.xmin(), prism.ymin())?;
    let (lon_max, lat_max) = unproject(prism.xmax(), prism.ymax())?;

    // Counterclockwise exterior ring, closed on the first corner.
    let ring = vec![
        vec![lon_min, lat_min],
        vec![lon_max, lat_min],
        vec![lon_max, lat_max],
        vec![lon_min, lat_max],
        vec![lon_min, lat_min],
    ];
    let geometry = Geometry::new(Value::Polygon(vec![ring]));

    let name = if prism.name.is_empty() {
        DEFAULT_FEATURE_NAME
    } else {
        prism.name.as_str()
    };
    let mut properties = Map::new();
    properties.insert("name".to_string(), serde_json::Value::from(name));
    properties.insert("uuid".to_string(), serde_json::Value::from(prism.uuid));
    properties.insert(
        "begin".to_string(),
        serde_json::Value::from(iso8601(prism.tmin())?),
    );
    properties.insert(
        "end".to_string(),
        serde_json::Value::from(iso8601(prism.tmax())?),
    );
    properties.insert("fill".to_string(), serde_json::Value::from(FILL_COLOR));
    properties.insert(
        "fill-opacity".to_string(),
        serde_json::Value::from(FILL_OPACITY),
    );

    Ok(Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}

/// Build a GeoJSON FeatureCollection of the prisms' ground footprints.
///
/// Each prism becomes one polygon in lon/lat with `begin`/`end`
/// timestamps in its properties; the temporal axis has no geometric
/// representation in GeoJSON.
pub fn feature_collection(prisms: &[Prism]) -> Result<FeatureCollection> {
    let mut features = Vec::with_capacity(prisms.len());
    for prism in prisms {
        features.push(prism_to_feature(prism)?);
    }
    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// Write the prisms to `path` as a GeoJSON FeatureCollection.
pub fn write_geojson(path: impl AsRef<Path>, prisms: &[Prism]) -> Result<()> {
    let path = path.as_ref();
    let collection = feature_collection(prisms)?;
    let json = serde_json::to_string_pretty(&collection).map_err(|e| {
        PrismergeError::Serialization(format!("failed to serialize feature collection: {e}"))
    })?;
    fs::write(path, json)?;
    log::info!("wrote {} features to {}", prisms.len(), path.display());
    Ok(())
}

#[derive(Debug, Serialize)]
struct ResultRow<'a> {
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
    lon_min: f64,
    lat_min: f64,
    lon_max: f64,
    lat_max: f64,
    begin: String,
    end: String,
    status: &'a str,
    update_time: &'a str,
    justification: &'a str,
    job_name: &'a str,
}

/// Write the tabular result file.
///
/// One row per prism: projected extents, geographic extents, the time
/// window, and the run metadata every row shares. `update_time` is
/// stamped once for the whole file.
pub fn write_results_csv(
    path: impl AsRef<Path>,
    prisms: &[Prism],
    justification: &str,
    job_name: &str,
) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;
    let update_time = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    for prism in prisms {
        let (lon_min, lat_min) = unproject(prism.xmin(), prism.ymin())?;
        let (lon_max, lat_max) = unproject(prism.xmax(), prism.ymax())?;
        writer.serialize(ResultRow {
            xmin: prism.xmin(),
            ymin: prism.ymin(),
            xmax: prism.xmax(),
            ymax: prism.ymax(),
            lon_min,
            lat_min,
            lon_max,
            lat_max,
            begin: iso8601(prism.tmin())?,
            end: iso8601(prism.tmax())?,
            status: "created",
            update_time: &update_time,
            justification,
            job_name,
        })?;
    }
    writer.flush()?;
    log::info!("wrote {} result rows to {}", prisms.len(), path.display());
    Ok(())
}

/// Summary of one consolidation run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub job_name: String,
    pub input_count: usize,
    pub duplicates_removed: usize,
    pub merges_applied: usize,
    pub output_count: usize,
    pub input_volume: f64,
    pub output_volume: f64,
}

impl RunReport {
    /// Collect run statistics from the inputs and the merge outcome.
    pub fn new(job_name: impl Into<String>, input_prisms: &[Prism], outcome: &MergeOutcome) -> Self {
        let input_volume = input_prisms.iter().map(Prism::volume).sum();
        let output_volume = outcome.boxes().iter().map(|b| b.bounds.volume()).sum();
        Self {
            job_name: job_name.into(),
            input_count: input_prisms.len(),
            duplicates_removed: outcome.duplicates_removed(),
            merges_applied: outcome.merges_applied(),
            output_count: outcome.boxes().len(),
            input_volume,
            output_volume,
        }
    }

    /// Human-readable summary for terminal output.
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!(
                "job {}: {} observations in, {} query volumes out",
                self.job_name, self.input_count, self.output_count
            ),
            format!(
                "{} duplicates collapsed, {} merges applied",
                self.duplicates_removed, self.merges_applied
            ),
        ];
        if self.input_volume > 0.0 {
            let change = 100.0 * (self.output_volume - self.input_volume) / self.input_volume;
            lines.push(format!(
                "total volume {:.3} -> {:.3} ({change:+.1}%)",
                self.input_volume, self.output_volume
            ));
        } else {
            lines.push(format!(
                "total volume {:.3} -> {:.3}",
                self.input_volume, self.output_volume
            ));
        }
        lines.join("\n")
    }

    /// Write the report to `path` as pretty-printed JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            PrismergeError::Serialization(format!("failed to serialize run report: {e}"))
        })?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }
}
