//! Prism construction: geographic observations in, result volumes out.
//!
//! Two directions through the same projected space. On the way in, each
//! observation is projected and wrapped in buffers to become a prism; on
//! the way out, the bounds that survived merging are turned back into
//! prisms whose centers carry the lon/lat for reporting.

use crate::engine::QueryBox;
use crate::error::Result;
use crate::ids::IdSource;
use crate::ingest::Observation;
use crate::projection::{WEB_MERCATOR_CRS, project, unproject};
use prismerge_types::prism::{Buffers, Prism};

/// Build prisms from raw observations.
///
/// Each observation is projected to Web-Mercator meters, buffered with the
/// same half-widths, and assigned an id from `ids` in input order. The ids
/// are what the merge outcome's lineage later refers to.
pub fn prisms_from_observations(
    observations: &[Observation],
    buffers: Buffers,
    ids: &mut dyn IdSource,
) -> Result<Vec<Prism>> {
    let mut prisms = Vec::with_capacity(observations.len());
    for obs in observations {
        let (x, y) = project(obs.lon, obs.lat)?;
        let prism = Prism::new(
            obs.lon,
            obs.lat,
            x,
            y,
            obs.timestamp,
            obs.name.clone(),
            buffers,
            WEB_MERCATOR_CRS,
            ids.next_id(),
        )?;
        prisms.push(prism);
    }
    log::info!("generated {} prisms", prisms.len());
    Ok(prisms)
}

/// Rebuild prisms from merged bounds.
///
/// Centers and per-axis half-widths are recovered from each box's bounds,
/// and the center is unprojected for the geographic fields. Boxes keep
/// their engine ids, so a result prism's provenance stays addressable in
/// the merge outcome; merged boxes have no label of their own and get an
/// empty name.
pub fn prisms_from_boxes(boxes: &[QueryBox]) -> Result<Vec<Prism>> {
    let mut prisms = Vec::with_capacity(boxes.len());
    for b in boxes {
        let (x, y, t) = b.bounds.center();
        let buffers = Buffers::new(x - b.bounds.xmin, y - b.bounds.ymin, t - b.bounds.tmin);
        let (lon, lat) = unproject(x, y)?;
        let prism = Prism::new(
            lon,
            lat,
            x,
            y,
            t,
            b.label.clone().unwrap_or_default(),
            buffers,
            WEB_MERCATOR_CRS,
            b.id,
        )?;
        prisms.push(prism);
    }
    Ok(prisms)
}

/// Convert prisms to the boxes the merge engine consumes.
pub fn boxes_from_prisms(prisms: &[Prism]) -> Vec<QueryBox> {
    prisms.iter().map(QueryBox::from_prism).collect()
}
