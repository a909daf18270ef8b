// src/session.rs

use crate::dataset::Dataset;
use crate::interaction::{grounding_text, retype_existing, upsert_point, ToolSettings};
use crate::model::{InteractionRecord, InteractionType, Point};
use crate::store::InteractionStore;
use log::debug;

/// What the annotator is looking at and which tool is selected.
///
/// The store is not owned here; every operation receives it explicitly so
/// the caller decides when edits are flushed and saved.
#[derive(Debug, Clone)]
pub struct AnnotationSession {
    test_id: String,
    index: usize,
    pub tool: InteractionType,
    pub settings: ToolSettings,
    defaults: ToolSettings,
}

/// Everything needed to display the current image
#[derive(Debug, Clone, PartialEq)]
pub struct ImageView {
    pub image_id: String,
    /// e.g. `"003.png (3/12)"`
    pub label: String,
    pub grounding_text: String,
    pub tool: InteractionType,
    pub settings: ToolSettings,
    pub can_go_previous: bool,
    pub can_go_next: bool,
    pub can_export: bool,
}

impl AnnotationSession {
    /// Opens `dataset` at its first image with the tool of the record found there
    pub fn new(store: &InteractionStore, dataset: &Dataset, defaults: ToolSettings) -> Self {
        let mut session = AnnotationSession {
            test_id: dataset.test_id.clone(),
            index: 0,
            tool: InteractionType::Tap,
            settings: defaults,
            defaults,
        };
        session.restore_tool(store, dataset);
        session
    }

    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Switches to another dataset, starting again at its first image
    pub fn select_dataset(&mut self, store: &InteractionStore, dataset: &Dataset) {
        self.test_id = dataset.test_id.clone();
        self.index = 0;
        self.restore_tool(store, dataset);
    }

    /// Jumps directly to `index`; out of range is a no-op returning false
    pub fn jump_to(&mut self, store: &InteractionStore, dataset: &Dataset, index: usize) -> bool {
        if !self.is_current(dataset) || index >= dataset.len() {
            return false;
        }
        self.index = index;
        self.restore_tool(store, dataset);
        true
    }

    fn is_current(&self, dataset: &Dataset) -> bool {
        dataset.test_id == self.test_id
    }

    fn current_image_id(&self, dataset: &Dataset) -> Option<String> {
        if !self.is_current(dataset) {
            return None;
        }
        dataset.image_id(self.index)
    }

    /// Loads tool type and field values from the current image's record,
    /// falling back to the defaults for anything it does not carry
    fn restore_tool(&mut self, store: &InteractionStore, dataset: &Dataset) {
        let record = self
            .current_image_id(dataset)
            .and_then(|image_id| store.get(&self.test_id, &image_id));
        match record {
            Some(record) => {
                self.tool = record.interaction_type();
                self.settings = self.defaults.with_record(record);
            }
            None => {
                self.tool = InteractionType::Tap;
                self.settings = self.defaults;
            }
        }
    }

    /// Records a click on the current image with the selected tool
    pub fn record_click(
        &self,
        store: &mut InteractionStore,
        dataset: &Dataset,
        point: Point,
    ) -> Option<InteractionRecord> {
        let image_id = self.current_image_id(dataset)?;
        let record = upsert_point(
            store.get(&self.test_id, &image_id),
            self.tool,
            point,
            &self.settings,
        );
        debug!("{}/{}: {:?}", self.test_id, image_id, record);
        store.set(&self.test_id, &image_id, record.clone());
        Some(record)
    }

    /// Applies the selected tool and field values to the current image's
    /// record without a click. Returns whether the store changed.
    pub fn commit_pending_edit(&self, store: &mut InteractionStore, dataset: &Dataset) -> bool {
        let Some(image_id) = self.current_image_id(dataset) else {
            return false;
        };
        let Some(existing) = store.get(&self.test_id, &image_id) else {
            return false;
        };
        let updated = retype_existing(existing, self.tool, &self.settings);
        if &updated == existing {
            return false;
        }
        store.set(&self.test_id, &image_id, updated);
        true
    }

    /// Moves `delta` images forward or back. Pending edits are not flushed;
    /// call [`commit_pending_edit`](Self::commit_pending_edit) first.
    pub fn navigate(&mut self, store: &InteractionStore, dataset: &Dataset, delta: isize) -> bool {
        let Some(target) = self.index.checked_add_signed(delta) else {
            return false;
        };
        self.jump_to(store, dataset, target)
    }

    pub fn view(&self, store: &InteractionStore, dataset: &Dataset) -> Option<ImageView> {
        let image_id = self.current_image_id(dataset)?;
        let record = store.get(&self.test_id, &image_id);
        let in_progress = record.is_some_and(InteractionRecord::is_in_progress);

        Some(ImageView {
            label: format!("{} ({}/{})", image_id, self.index + 1, dataset.len()),
            grounding_text: record.map(grounding_text).unwrap_or_default(),
            tool: self.tool,
            settings: self.settings,
            can_go_previous: self.index > 0 && !in_progress,
            can_go_next: self.index + 1 < dataset.len() && !in_progress,
            can_export: !in_progress,
            image_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn dataset(n: usize) -> Dataset {
        Dataset {
            test_id: "t".to_string(),
            images: (1..=n)
                .map(|i| PathBuf::from(format!("/data/test_img/t/imgs/{:02}.png", i)))
                .collect(),
            dimensions: None,
        }
    }

    #[test]
    fn click_then_navigate_restores_tools() {
        let ds = dataset(3);
        let mut store = InteractionStore::new();
        let mut session = AnnotationSession::new(&store, &ds, ToolSettings::default());

        session.tool = InteractionType::MultiTap;
        session.settings.clicks = 4;
        session.record_click(&mut store, &ds, Point::new(0.5, 0.5));

        assert!(session.navigate(&store, &ds, 1));
        assert_eq!(session.tool, InteractionType::Tap);
        assert_eq!(session.settings.clicks, 2);

        assert!(session.navigate(&store, &ds, -1));
        assert_eq!(session.tool, InteractionType::MultiTap);
        assert_eq!(session.settings.clicks, 4);
        let view = session.view(&store, &ds).unwrap();
        assert_eq!(view.label, "01.png (1/3)");
        assert_eq!(view.grounding_text, "(0.5000, 0.5000)");
    }

    #[test]
    fn select_dataset_resets_index_and_restores_tool() {
        let first = dataset(3);
        let mut second = dataset(2);
        second.test_id = "u".to_string();
        let mut store = InteractionStore::new();
        store.set(
            "u",
            "01.png",
            InteractionRecord::LongPress {
                grounding: Some(Point::new(0.2, 0.4)),
                duration_ms: 1500,
            },
        );
        let mut session = AnnotationSession::new(&store, &first, ToolSettings::default());
        assert!(session.jump_to(&store, &first, 2));
        session.tool = InteractionType::Slide;

        session.select_dataset(&store, &second);

        assert_eq!(session.test_id(), "u");
        assert_eq!(session.index(), 0);
        assert_eq!(session.tool, InteractionType::LongPress);
        assert_eq!(session.settings.longpress_duration_ms, 1500);
        assert!(!session.navigate(&store, &first, 1));
        assert_eq!(session.view(&store, &second).unwrap().label, "01.png (1/2)");
    }

    #[test]
    fn navigation_out_of_range_is_noop() {
        let ds = dataset(2);
        let store = InteractionStore::new();
        let mut session = AnnotationSession::new(&store, &ds, ToolSettings::default());
        assert!(!session.navigate(&store, &ds, -1));
        assert_eq!(session.index(), 0);
        assert!(session.navigate(&store, &ds, 1));
        assert!(!session.navigate(&store, &ds, 1));
        assert_eq!(session.index(), 1);
    }

    #[test]
    fn navigation_does_not_flush_edits() {
        let ds = dataset(2);
        let mut store = InteractionStore::new();
        let mut session = AnnotationSession::new(&store, &ds, ToolSettings::default());
        session.record_click(&mut store, &ds, Point::new(0.1, 0.1));

        session.tool = InteractionType::LongPress;
        session.navigate(&store, &ds, 1);
        assert_eq!(
            store.get("t", "01.png").map(InteractionRecord::interaction_type),
            Some(InteractionType::Tap)
        );
    }

    #[test]
    fn commit_then_navigate_retypes_record() {
        let ds = dataset(2);
        let mut store = InteractionStore::new();
        let mut session = AnnotationSession::new(&store, &ds, ToolSettings::default());
        session.record_click(&mut store, &ds, Point::new(0.1, 0.1));

        session.tool = InteractionType::LongPress;
        session.settings.longpress_duration_ms = 3000;
        assert!(session.commit_pending_edit(&mut store, &ds));
        session.navigate(&store, &ds, 1);

        assert_eq!(
            store.get("t", "01.png"),
            Some(&InteractionRecord::LongPress {
                grounding: Some(Point::new(0.1, 0.1)),
                duration_ms: 3000,
            })
        );
    }

    #[test]
    fn commit_without_record_creates_nothing() {
        let ds = dataset(1);
        let mut store = InteractionStore::new();
        let mut session = AnnotationSession::new(&store, &ds, ToolSettings::default());
        session.tool = InteractionType::Slide;
        assert!(!session.commit_pending_edit(&mut store, &ds));
        assert!(store.is_empty());
    }

    #[test]
    fn half_finished_slide_locks_navigation() {
        let ds = dataset(3);
        let mut store = InteractionStore::new();
        let mut session = AnnotationSession::new(&store, &ds, ToolSettings::default());
        session.navigate(&store, &ds, 1);
        session.tool = InteractionType::Slide;

        session.record_click(&mut store, &ds, Point::new(0.2, 0.8));
        let view = session.view(&store, &ds).unwrap();
        assert!(!view.can_go_previous && !view.can_go_next && !view.can_export);

        session.record_click(&mut store, &ds, Point::new(0.2, 0.1));
        let view = session.view(&store, &ds).unwrap();
        assert!(view.can_go_previous && view.can_go_next && view.can_export);
        assert_eq!(view.grounding_text, "(0.2000, 0.8000), (0.2000, 0.1000)");
    }

    #[test]
    fn other_dataset_is_ignored() {
        let ds = dataset(2);
        let mut other = dataset(2);
        other.test_id = "other".to_string();
        let mut store = InteractionStore::new();
        let session = AnnotationSession::new(&store, &ds, ToolSettings::default());
        assert!(session
            .record_click(&mut store, &other, Point::new(0.5, 0.5))
            .is_none());
        assert!(session.view(&store, &other).is_none());
        assert!(store.is_empty());
    }
}
