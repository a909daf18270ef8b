// src/interaction.rs

use crate::model::*;
use serde::{Deserialize, Serialize};

/// Values of the annotator's Clicks / Duration fields at the time of an edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub clicks: u32,
    pub longpress_duration_ms: u64,
    pub slide_duration_ms: u64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        ToolSettings {
            clicks: DEFAULT_CLICKS,
            longpress_duration_ms: DEFAULT_DURATION_MS,
            slide_duration_ms: DEFAULT_DURATION_MS,
        }
    }
}

impl ToolSettings {
    /// Copies the type-specific field of `record` over these settings
    pub fn with_record(mut self, record: &InteractionRecord) -> Self {
        match record {
            InteractionRecord::Tap { .. } => {}
            InteractionRecord::MultiTap { clicks, .. } => self.clicks = *clicks,
            InteractionRecord::LongPress { duration_ms, .. } => {
                self.longpress_duration_ms = *duration_ms
            }
            InteractionRecord::Slide { duration_ms, .. } => self.slide_duration_ms = *duration_ms,
        }
        self
    }
}

/// Converts a click in pixels on the displayed image into a normalized point.
///
/// `displayed` must be the size of the image the click happened on, not the
/// dataset's stored dimensions, since the two differ when display is scaled.
/// Clicks outside `[0, width] x [0, height]` yield `None`.
pub fn normalize_click(pixel_x: f64, pixel_y: f64, displayed: Dimensions) -> Option<Point> {
    if displayed.width == 0 || displayed.height == 0 {
        return None;
    }
    let (width, height) = (displayed.width as f64, displayed.height as f64);
    if !(0.0..=width).contains(&pixel_x) || !(0.0..=height).contains(&pixel_y) {
        return None;
    }
    Some(Point::new(
        pixel_x / width,
        pixel_y / height,
    ))
}

/// Records `point` on an image, merging it with the record already there.
///
/// A record of a different type is discarded, so changing tools resets the
/// point history of that image. Slides keep the two most recent endpoints;
/// every other type keeps only the latest point.
pub fn upsert_point(
    existing: Option<&InteractionRecord>,
    kind: InteractionType,
    point: Point,
    settings: &ToolSettings,
) -> InteractionRecord {
    match kind {
        InteractionType::Tap => InteractionRecord::Tap {
            grounding: Some(point),
        },
        InteractionType::MultiTap => InteractionRecord::MultiTap {
            grounding: Some(point),
            clicks: settings.clicks.max(1),
        },
        InteractionType::LongPress => InteractionRecord::LongPress {
            grounding: Some(point),
            duration_ms: settings.longpress_duration_ms,
        },
        InteractionType::Slide => {
            let stroke = match existing {
                Some(InteractionRecord::Slide { stroke, .. }) => *stroke,
                _ => SlideStroke::Empty,
            };
            InteractionRecord::Slide {
                stroke: stroke.push(point),
                duration_ms: settings.slide_duration_ms,
            }
        }
    }
}

/// Applies a tool change to an already annotated image without a new click.
///
/// Records without any grounding are returned unchanged. A single point
/// becomes the first endpoint of an in-progress slide; a slide turned into
/// a single-point gesture keeps its most recent endpoint.
pub fn retype_existing(
    record: &InteractionRecord,
    kind: InteractionType,
    settings: &ToolSettings,
) -> InteractionRecord {
    let Some(latest) = record.grounding_points().last().copied() else {
        return record.clone();
    };

    match kind {
        InteractionType::Slide => {
            let stroke = match record {
                InteractionRecord::Slide { stroke, .. } => *stroke,
                _ => SlideStroke::Started(latest),
            };
            InteractionRecord::Slide {
                stroke,
                duration_ms: settings.slide_duration_ms,
            }
        }
        other => upsert_point(None, other, latest, settings),
    }
}

/// Text shown in the Grounding field: every point as `(x.xxxx, y.xxxx)`,
/// oldest first
pub fn grounding_text(record: &InteractionRecord) -> String {
    record
        .grounding_points()
        .iter()
        .map(Point::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn switching_type_resets_parameters() {
        let settings = ToolSettings {
            clicks: 3,
            ..Default::default()
        };
        let tap = upsert_point(None, InteractionType::Tap, p(0.1, 0.1), &settings);
        let record = upsert_point(Some(&tap), InteractionType::MultiTap, p(0.4, 0.6), &settings);
        assert_eq!(
            record,
            InteractionRecord::MultiTap {
                grounding: Some(p(0.4, 0.6)),
                clicks: 3,
            }
        );
    }

    #[test]
    fn switching_to_slide_discards_previous_point() {
        let settings = ToolSettings::default();
        let tap = upsert_point(None, InteractionType::Tap, p(0.1, 0.1), &settings);
        let slide = upsert_point(Some(&tap), InteractionType::Slide, p(0.2, 0.2), &settings);
        assert_eq!(slide.grounding_points(), vec![p(0.2, 0.2)]);
    }

    #[test]
    fn third_slide_click_evicts_oldest_point() {
        let settings = ToolSettings {
            slide_duration_ms: 450,
            ..Default::default()
        };
        let mut record = None;
        for point in [p(0.1, 0.1), p(0.2, 0.2), p(0.3, 0.3)] {
            record = Some(upsert_point(
                record.as_ref(),
                InteractionType::Slide,
                point,
                &settings,
            ));
        }
        assert_eq!(
            record,
            Some(InteractionRecord::Slide {
                stroke: SlideStroke::Complete(p(0.2, 0.2), p(0.3, 0.3)),
                duration_ms: 450,
            })
        );
    }

    #[test]
    fn repeated_tap_overwrites_point() {
        let settings = ToolSettings::default();
        let first = upsert_point(None, InteractionType::LongPress, p(0.1, 0.1), &settings);
        let second = upsert_point(Some(&first), InteractionType::LongPress, p(0.9, 0.9), &settings);
        assert_eq!(second.grounding_points(), vec![p(0.9, 0.9)]);
    }

    #[test]
    fn zero_clicks_clamped_to_one() {
        let settings = ToolSettings {
            clicks: 0,
            ..Default::default()
        };
        let record = upsert_point(None, InteractionType::MultiTap, p(0.5, 0.5), &settings);
        assert!(matches!(record, InteractionRecord::MultiTap { clicks: 1, .. }));
    }

    #[test]
    fn retype_without_grounding_is_untouched() {
        let record = InteractionRecord::Slide {
            stroke: SlideStroke::Empty,
            duration_ms: 1000,
        };
        let settings = ToolSettings::default();
        assert_eq!(
            retype_existing(&record, InteractionType::Tap, &settings),
            record
        );
    }

    #[test]
    fn retype_strips_foreign_fields() {
        let record = InteractionRecord::MultiTap {
            grounding: Some(p(0.3, 0.3)),
            clicks: 4,
        };
        let settings = ToolSettings {
            longpress_duration_ms: 2500,
            ..Default::default()
        };
        assert_eq!(
            retype_existing(&record, InteractionType::LongPress, &settings),
            InteractionRecord::LongPress {
                grounding: Some(p(0.3, 0.3)),
                duration_ms: 2500,
            }
        );
    }

    #[test]
    fn retype_between_point_and_slide_shapes() {
        let settings = ToolSettings::default();
        let tap = InteractionRecord::Tap {
            grounding: Some(p(0.3, 0.3)),
        };
        let slide = retype_existing(&tap, InteractionType::Slide, &settings);
        assert!(slide.is_in_progress());

        let full = InteractionRecord::Slide {
            stroke: SlideStroke::Complete(p(0.1, 0.1), p(0.7, 0.7)),
            duration_ms: 1000,
        };
        let tap = retype_existing(&full, InteractionType::Tap, &settings);
        assert_eq!(
            tap,
            InteractionRecord::Tap {
                grounding: Some(p(0.7, 0.7))
            }
        );
    }

    #[test]
    fn grounding_text_formats() {
        let tap = InteractionRecord::Tap {
            grounding: Some(p(0.12345, 0.5)),
        };
        assert_eq!(grounding_text(&tap), "(0.1235, 0.5000)");

        let slide = InteractionRecord::Slide {
            stroke: SlideStroke::Complete(p(0.1, 0.2), p(0.3, 0.4)),
            duration_ms: 1000,
        };
        assert_eq!(grounding_text(&slide), "(0.1000, 0.2000), (0.3000, 0.4000)");

        let empty = InteractionRecord::Tap { grounding: None };
        assert_eq!(grounding_text(&empty), "");
    }

    #[test]
    fn normalizes_against_displayed_size() {
        let point = normalize_click(50.0, 30.0, Dimensions::new(200, 60)).unwrap();
        assert_eq!(point, p(0.25, 0.5));
        assert_eq!(normalize_click(1.0, 1.0, Dimensions::new(0, 10)), None);
    }

    #[test]
    fn rejects_clicks_outside_the_image() {
        let displayed = Dimensions::new(200, 100);
        assert_eq!(normalize_click(200.0, 100.0, displayed), Some(p(1.0, 1.0)));
        assert_eq!(normalize_click(0.0, 0.0, displayed), Some(p(0.0, 0.0)));
        for (x, y) in [(-10.0, 50.0), (500.0, 50.0), (20.0, -1.0), (20.0, 100.5), (f64::NAN, 5.0)] {
            assert_eq!(normalize_click(x, y, displayed), None, "({x}, {y})");
        }
    }
}
