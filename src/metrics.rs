// src/metrics.rs

use crate::model::{AnchorPoint, Dimensions, Point};

/// Mean and sample standard deviation of a distance series
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SummaryStatistics {
    /// `None` for an empty series
    pub mean: Option<f64>,
    /// `None` for fewer than two values
    pub std: Option<f64>,
}

/// Euclidean distance in pixels between two normalized points
pub fn pixel_distance(from: Point, to: Point, dimensions: Dimensions) -> f64 {
    let dx = (to.x - from.x) * dimensions.width as f64;
    let dy = (to.y - from.y) * dimensions.height as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Gap between the end of each interaction and the start of the next.
///
/// For slides this measures how far the following action began from where
/// the slide ended, not the length of the slide itself.
pub fn pairwise_distances(anchors: &[AnchorPoint], dimensions: Dimensions) -> Vec<f64> {
    anchors
        .windows(2)
        .map(|pair| pixel_distance(pair[0].end, pair[1].start, dimensions))
        .collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Standard deviation with the N-1 denominator
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

pub fn summary_statistics(distances: &[f64]) -> SummaryStatistics {
    SummaryStatistics {
        mean: mean(distances),
        std: sample_std(distances),
    }
}

/// Distance indices touching the anchor at `step_index`: the segment ending
/// at it and the segment starting from it
fn adjacent_segments(len: usize, step_index: usize) -> Vec<usize> {
    let mut indices = Vec::with_capacity(2);
    if step_index > 0 && step_index - 1 < len {
        indices.push(step_index - 1);
    }
    if step_index < len {
        indices.push(step_index);
    }
    indices
}

/// Relative change of the mean distance when the anchor at `step_index` is
/// left out.
///
/// Positive means the rest of the path averages longer without this step,
/// i.e. the step was efficient; negative means it lengthened the path.
/// `None` when the step touches no segment or no segment would remain.
pub fn operation_quality_score(distances: &[f64], step_index: usize) -> Option<f64> {
    let removed = adjacent_segments(distances.len(), step_index);
    if removed.is_empty() {
        return None;
    }

    let remaining: Vec<f64> = distances
        .iter()
        .enumerate()
        .filter(|(i, _)| !removed.contains(i))
        .map(|(_, d)| *d)
        .collect();

    let mean_without = mean(&remaining)?;
    let mean_all = mean(distances)?;

    if mean_all > 0.0 {
        Some((mean_without - mean_all) / mean_all)
    } else {
        Some(0.0)
    }
}

/// Mean of every defined per-step score for anchors `0..num_anchor_points`
pub fn average_operation_quality_score(distances: &[f64], num_anchor_points: usize) -> Option<f64> {
    let scores: Vec<f64> = (0..num_anchor_points)
        .filter_map(|step| operation_quality_score(distances, step))
        .collect();
    mean(&scores)
}
