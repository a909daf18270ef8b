// src/trajectory.rs

use crate::model::AnchorPoint;
use crate::store::InteractionStore;

/// One anchored interaction together with the image it was recorded on
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryStep {
    pub image_id: String,
    pub anchor: AnchorPoint,
}

/// Walks a dataset's records in lexical image id order and returns every
/// record that has an anchor.
///
/// Records without grounding and slides with fewer than two endpoints are
/// left out; they stay in the store but take no part in the path.
pub fn extract_trajectory(store: &InteractionStore, test_id: &str) -> Vec<TrajectoryStep> {
    let Some(records) = store.records(test_id) else {
        return Vec::new();
    };

    // BTreeMap iteration order is the lexical image id order
    records
        .iter()
        .filter_map(|(image_id, record)| {
            record.anchor().map(|anchor| TrajectoryStep {
                image_id: image_id.clone(),
                anchor,
            })
        })
        .collect()
}

pub fn extract_anchor_points(store: &InteractionStore, test_id: &str) -> Vec<AnchorPoint> {
    extract_trajectory(store, test_id)
        .into_iter()
        .map(|step| step.anchor)
        .collect()
}
