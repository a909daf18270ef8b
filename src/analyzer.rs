// src/analyzer.rs

use crate::dataset::Workspace;
use crate::metrics::{self, SummaryStatistics};
use crate::model::Dimensions;
use crate::store::InteractionStore;
use crate::trajectory::{extract_trajectory, TrajectoryStep};
use log::{debug, warn};
use rayon::prelude::*;
use std::fmt;

/// Path metrics of one dataset, recomputed from the store on every request
#[derive(Debug, Clone)]
pub struct PathAnalysis {
    pub test_id: String,
    pub dimensions: Dimensions,
    pub steps: Vec<TrajectoryStep>,
    /// `distances[i]` is the gap between `steps[i]` and `steps[i + 1]`
    pub distances: Vec<f64>,
    pub statistics: SummaryStatistics,
    /// Leave-one-out score of every step, `None` where undefined
    pub step_scores: Vec<Option<f64>>,
    pub average_score: Option<f64>,
}

pub fn analyze_dataset(
    store: &InteractionStore,
    test_id: &str,
    dimensions: Dimensions,
) -> PathAnalysis {
    let steps = extract_trajectory(store, test_id);
    let anchors: Vec<_> = steps.iter().map(|s| s.anchor).collect();
    let distances = metrics::pairwise_distances(&anchors, dimensions);
    let statistics = metrics::summary_statistics(&distances);
    let step_scores = (0..steps.len())
        .map(|step| metrics::operation_quality_score(&distances, step))
        .collect();
    let average_score = metrics::average_operation_quality_score(&distances, steps.len());

    debug!(
        "{}: {} anchors, {} distances",
        test_id,
        steps.len(),
        distances.len()
    );

    PathAnalysis {
        test_id: test_id.to_string(),
        dimensions,
        steps,
        distances,
        statistics,
        step_scores,
        average_score,
    }
}

/// Analyzes every dataset of a workspace that has known image dimensions
pub fn analyze_workspace(workspace: &Workspace) -> Vec<PathAnalysis> {
    let datasets: Vec<_> = workspace.datasets.values().collect();
    datasets
        .par_iter()
        .filter_map(|dataset| match dataset.dimensions {
            Some(dimensions) => Some(analyze_dataset(
                &workspace.store,
                &dataset.test_id,
                dimensions,
            )),
            None => {
                warn!("Skipping {}: image dimensions unknown", dataset.test_id);
                None
            }
        })
        .collect()
}

impl PathAnalysis {
    /// Whether there are enough anchors for at least one distance
    pub fn has_path(&self) -> bool {
        !self.distances.is_empty()
    }

    /// Labels of the distance series: `"1-2"`, `"2-3"`, ...
    pub fn step_labels(&self) -> Vec<String> {
        (1..=self.distances.len())
            .map(|i| format!("{}-{}", i, i + 1))
            .collect()
    }

    /// Distance index marked as the "current image" while browsing.
    ///
    /// This is the segment arriving at position `current_image_index` of
    /// the distance series; the first image has no incoming segment.
    pub fn highlight_step(&self, current_image_index: usize) -> Option<usize> {
        if current_image_index > 0 && current_image_index <= self.distances.len() {
            Some(current_image_index - 1)
        } else {
            None
        }
    }

    pub fn score_for_image(&self, image_id: &str) -> Option<f64> {
        let index = self.steps.iter().position(|s| s.image_id == image_id)?;
        self.step_scores.get(index).copied().flatten()
    }
}

fn fmt_optional(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "n/a".to_string(),
    }
}

impl fmt::Display for PathAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Interaction distances for {} ({} anchors, {}x{} px)",
            self.test_id,
            self.steps.len(),
            self.dimensions.width,
            self.dimensions.height
        )?;

        if !self.has_path() {
            return writeln!(f, "  Not enough interaction points to compute a path.");
        }

        for (i, (label, distance)) in self.step_labels().iter().zip(&self.distances).enumerate() {
            writeln!(
                f,
                "  {:<7} {} -> {}  {:>10.2} px",
                label,
                self.steps[i].image_id,
                self.steps[i + 1].image_id,
                distance
            )?;
        }

        writeln!(f, "Descriptive statistics:")?;
        writeln!(f, "  Mean: {}", fmt_optional(self.statistics.mean, 2))?;
        writeln!(f, "  Std Dev: {}", fmt_optional(self.statistics.std, 2))?;

        writeln!(f, "Operation quality (leave-one-out):")?;
        for (step, score) in self.steps.iter().zip(&self.step_scores) {
            writeln!(f, "  {:<20} {:>9}", step.image_id, fmt_optional(*score, 4))?;
        }
        writeln!(f, "  Average: {}", fmt_optional(self.average_score, 4))
    }
}
