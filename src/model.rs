// src/model.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Used when a persisted multiclick record carries no `clicks` field
pub const DEFAULT_CLICKS: u32 = 2;
/// Used when a persisted longpress/slide record carries no `duration` field
pub const DEFAULT_DURATION_MS: u64 = 1000;

/// The gesture recorded on one screenshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionType {
    #[serde(rename = "click")]
    Tap,
    #[serde(rename = "multiclick")]
    MultiTap,
    #[serde(rename = "longpress")]
    LongPress,
    #[serde(rename = "slide")]
    Slide,
}

impl InteractionType {
    /// Name used in the persisted JSON
    pub fn wire_name(&self) -> &'static str {
        match self {
            InteractionType::Tap => "click",
            InteractionType::MultiTap => "multiclick",
            InteractionType::LongPress => "longpress",
            InteractionType::Slide => "slide",
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A position normalized to [0,1] against one image's pixel width and height.
///
/// Coordinates read as JSON integers (`[1, 0]`) are written back as integers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "[Coord; 2]", into = "[Coord; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
    integer_input: [bool; 2],
}

/// One coordinate as it appears on the wire
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
enum Coord {
    Int(i64),
    Float(f64),
}

impl Coord {
    fn value(self) -> f64 {
        match self {
            Coord::Int(v) => v as f64,
            Coord::Float(v) => v,
        }
    }

    fn encode(value: f64, integer: bool) -> Coord {
        let whole = value.is_finite()
            && value.fract() == 0.0
            && value >= i64::MIN as f64
            && value <= i64::MAX as f64;
        if integer && whole {
            Coord::Int(value as i64)
        } else {
            Coord::Float(value)
        }
    }
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            integer_input: [false; 2],
        }
    }

    /// Position in pixels for an image of the given size
    pub fn to_pixels(&self, dimensions: Dimensions) -> (f64, f64) {
        (
            self.x * dimensions.width as f64,
            self.y * dimensions.height as f64,
        )
    }
}

// Wire formatting is not part of a point's value
impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl From<[Coord; 2]> for Point {
    fn from([x, y]: [Coord; 2]) -> Self {
        Point {
            x: x.value(),
            y: y.value(),
            integer_input: [
                matches!(x, Coord::Int(_)),
                matches!(y, Coord::Int(_)),
            ],
        }
    }
}

impl From<Point> for [Coord; 2] {
    fn from(p: Point) -> Self {
        [
            Coord::encode(p.x, p.integer_input[0]),
            Coord::encode(p.y, p.integer_input[1]),
        ]
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.x, self.y)
    }
}

/// Pixel size of the images in one dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Endpoints recorded so far for a slide, oldest first
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SlideStroke {
    #[default]
    Empty,
    /// One endpoint recorded; the slide is still being annotated
    Started(Point),
    Complete(Point, Point),
}

impl SlideStroke {
    /// Records a new endpoint. A third point evicts the oldest one.
    pub fn push(self, point: Point) -> Self {
        match self {
            SlideStroke::Empty => SlideStroke::Started(point),
            SlideStroke::Started(start) => SlideStroke::Complete(start, point),
            SlideStroke::Complete(_, end) => SlideStroke::Complete(end, point),
        }
    }

    pub fn points(&self) -> Vec<Point> {
        match *self {
            SlideStroke::Empty => Vec::new(),
            SlideStroke::Started(p) => vec![p],
            SlideStroke::Complete(a, b) => vec![a, b],
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SlideStroke::Empty => 0,
            SlideStroke::Started(_) => 1,
            SlideStroke::Complete(..) => 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SlideStroke::Empty)
    }
}

impl TryFrom<Vec<Point>> for SlideStroke {
    type Error = String;

    fn try_from(points: Vec<Point>) -> Result<Self, Self::Error> {
        match points.as_slice() {
            [] => Ok(SlideStroke::Empty),
            [p] => Ok(SlideStroke::Started(*p)),
            [a, b] => Ok(SlideStroke::Complete(*a, *b)),
            _ => Err(format!(
                "slide grounding holds {} points, at most 2 are allowed",
                points.len()
            )),
        }
    }
}

/// One annotation attached to exactly one image.
///
/// Each variant carries only the fields meaningful for its gesture, so a
/// record can never hold e.g. a `clicks` count while being a long-press.
/// The persisted shape is the nested `interaction_type` /
/// `interaction_parameters` object written to `interactions.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireRecord", into = "WireRecord")]
pub enum InteractionRecord {
    Tap {
        grounding: Option<Point>,
    },
    MultiTap {
        grounding: Option<Point>,
        clicks: u32,
    },
    LongPress {
        grounding: Option<Point>,
        duration_ms: u64,
    },
    Slide {
        stroke: SlideStroke,
        duration_ms: u64,
    },
}

impl InteractionRecord {
    pub fn interaction_type(&self) -> InteractionType {
        match self {
            InteractionRecord::Tap { .. } => InteractionType::Tap,
            InteractionRecord::MultiTap { .. } => InteractionType::MultiTap,
            InteractionRecord::LongPress { .. } => InteractionType::LongPress,
            InteractionRecord::Slide { .. } => InteractionType::Slide,
        }
    }

    /// Every recorded grounding point, oldest first
    pub fn grounding_points(&self) -> Vec<Point> {
        match self {
            InteractionRecord::Tap { grounding }
            | InteractionRecord::MultiTap { grounding, .. }
            | InteractionRecord::LongPress { grounding, .. } => grounding.iter().copied().collect(),
            InteractionRecord::Slide { stroke, .. } => stroke.points(),
        }
    }

    pub fn has_grounding(&self) -> bool {
        match self {
            InteractionRecord::Tap { grounding }
            | InteractionRecord::MultiTap { grounding, .. }
            | InteractionRecord::LongPress { grounding, .. } => grounding.is_some(),
            InteractionRecord::Slide { stroke, .. } => !stroke.is_empty(),
        }
    }

    /// A slide with only its first endpoint recorded
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            InteractionRecord::Slide {
                stroke: SlideStroke::Started(_),
                ..
            }
        )
    }

    /// Effective start/end used for distance calculation, if the record has one
    pub fn anchor(&self) -> Option<AnchorPoint> {
        match self {
            InteractionRecord::Tap { grounding }
            | InteractionRecord::MultiTap { grounding, .. }
            | InteractionRecord::LongPress { grounding, .. } => grounding.map(AnchorPoint::at),
            InteractionRecord::Slide {
                stroke: SlideStroke::Complete(start, end),
                ..
            } => Some(AnchorPoint {
                start: *start,
                end: *end,
            }),
            InteractionRecord::Slide { .. } => None,
        }
    }
}

/// Where one interaction starts and ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPoint {
    pub start: Point,
    pub end: Point,
}

impl AnchorPoint {
    /// Anchor of a single-point gesture
    pub fn at(point: Point) -> Self {
        AnchorPoint {
            start: point,
            end: point,
        }
    }
}

/// Persisted form of an [`InteractionRecord`]
#[derive(Debug, Serialize, Deserialize)]
struct WireRecord {
    interaction_type: InteractionType,
    #[serde(default)]
    interaction_parameters: WireParameters,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireParameters {
    #[serde(default)]
    grounding: WireGrounding,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    clicks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<u64>,
}

/// `[x, y]` for single-point gestures, `[[x0, y0], ...]` or `[]` otherwise
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum WireGrounding {
    Single(Point),
    Many(Vec<Point>),
}

impl Default for WireGrounding {
    fn default() -> Self {
        WireGrounding::Many(Vec::new())
    }
}

impl WireGrounding {
    fn into_single(self) -> Result<Option<Point>, String> {
        match self {
            WireGrounding::Single(p) => Ok(Some(p)),
            WireGrounding::Many(points) if points.is_empty() => Ok(None),
            WireGrounding::Many(points) => Err(format!(
                "expected a single grounding point, found a list of {}",
                points.len()
            )),
        }
    }
}

impl TryFrom<WireRecord> for InteractionRecord {
    type Error = String;

    fn try_from(wire: WireRecord) -> Result<Self, Self::Error> {
        let params = wire.interaction_parameters;
        let duration_ms = params.duration.unwrap_or(DEFAULT_DURATION_MS);

        let record = match wire.interaction_type {
            InteractionType::Tap => InteractionRecord::Tap {
                grounding: params.grounding.into_single()?,
            },
            InteractionType::MultiTap => {
                let clicks = params.clicks.unwrap_or(DEFAULT_CLICKS);
                if clicks == 0 {
                    return Err("multiclick record with zero clicks".to_string());
                }
                InteractionRecord::MultiTap {
                    grounding: params.grounding.into_single()?,
                    clicks,
                }
            }
            InteractionType::LongPress => InteractionRecord::LongPress {
                grounding: params.grounding.into_single()?,
                duration_ms,
            },
            InteractionType::Slide => {
                let stroke = match params.grounding {
                    WireGrounding::Many(points) => SlideStroke::try_from(points)?,
                    WireGrounding::Single(_) => {
                        return Err("slide grounding must be a list of points".to_string())
                    }
                };
                InteractionRecord::Slide {
                    stroke,
                    duration_ms,
                }
            }
        };
        Ok(record)
    }
}

impl From<InteractionRecord> for WireRecord {
    fn from(record: InteractionRecord) -> Self {
        let interaction_type = record.interaction_type();
        let single = |grounding: Option<Point>| match grounding {
            Some(p) => WireGrounding::Single(p),
            None => WireGrounding::Many(Vec::new()),
        };

        let interaction_parameters = match record {
            InteractionRecord::Tap { grounding } => WireParameters {
                grounding: single(grounding),
                ..Default::default()
            },
            InteractionRecord::MultiTap { grounding, clicks } => WireParameters {
                grounding: single(grounding),
                clicks: Some(clicks),
                duration: None,
            },
            InteractionRecord::LongPress {
                grounding,
                duration_ms,
            } => WireParameters {
                grounding: single(grounding),
                clicks: None,
                duration: Some(duration_ms),
            },
            InteractionRecord::Slide {
                stroke,
                duration_ms,
            } => WireParameters {
                grounding: WireGrounding::Many(stroke.points()),
                clicks: None,
                duration: Some(duration_ms),
            },
        };

        WireRecord {
            interaction_type,
            interaction_parameters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn slide_stroke_keeps_two_most_recent_points() {
        let stroke = SlideStroke::Empty
            .push(p(0.1, 0.1))
            .push(p(0.2, 0.2))
            .push(p(0.3, 0.3));
        assert_eq!(stroke, SlideStroke::Complete(p(0.2, 0.2), p(0.3, 0.3)));
        assert_eq!(stroke.len(), 2);
    }

    #[test]
    fn serializes_only_fields_of_the_variant() {
        let record = InteractionRecord::LongPress {
            grounding: Some(p(0.5, 0.25)),
            duration_ms: 1500,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "interaction_type": "longpress",
                "interaction_parameters": { "grounding": [0.5, 0.25], "duration": 1500 }
            })
        );
    }

    #[test]
    fn tap_without_grounding_serializes_empty_list() {
        let record = InteractionRecord::Tap { grounding: None };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["interaction_parameters"], json!({ "grounding": [] }));
    }

    #[test]
    fn parses_slide_with_one_point_as_in_progress() {
        let record: InteractionRecord = serde_json::from_value(json!({
            "interaction_type": "slide",
            "interaction_parameters": { "grounding": [[0.1, 0.2]], "duration": 700 }
        }))
        .unwrap();
        assert!(record.is_in_progress());
        assert_eq!(record.anchor(), None);
        assert!(record.has_grounding());
    }

    #[test]
    fn missing_parameters_fall_back_to_defaults() {
        let record: InteractionRecord = serde_json::from_value(json!({
            "interaction_type": "multiclick",
            "interaction_parameters": { "grounding": [0.3, 0.4] }
        }))
        .unwrap();
        assert_eq!(
            record,
            InteractionRecord::MultiTap {
                grounding: Some(p(0.3, 0.4)),
                clicks: DEFAULT_CLICKS,
            }
        );
    }

    #[test]
    fn rejects_malformed_records() {
        let bad = [
            json!({ "interaction_type": "swipe", "interaction_parameters": {} }),
            json!({ "interaction_type": "slide", "interaction_parameters": { "grounding": [0.1, 0.2] } }),
            json!({ "interaction_type": "click", "interaction_parameters": { "grounding": [[0.1, 0.2], [0.3, 0.4]] } }),
            json!({ "interaction_type": "multiclick", "interaction_parameters": { "grounding": [0.1, 0.2], "clicks": 0 } }),
            json!({ "interaction_type": "slide", "interaction_parameters": { "grounding": [[0.0, 0.0], [0.1, 0.1], [0.2, 0.2]] } }),
        ];
        for value in bad {
            assert!(
                serde_json::from_value::<InteractionRecord>(value.clone()).is_err(),
                "accepted {value}"
            );
        }
    }

    #[test]
    fn anchor_of_complete_slide_uses_both_endpoints() {
        let record = InteractionRecord::Slide {
            stroke: SlideStroke::Complete(p(0.1, 0.2), p(0.8, 0.9)),
            duration_ms: 1000,
        };
        assert_eq!(
            record.anchor(),
            Some(AnchorPoint {
                start: p(0.1, 0.2),
                end: p(0.8, 0.9)
            })
        );
    }

    #[test]
    fn point_display_uses_four_decimals() {
        assert_eq!(p(0.5, 1.0 / 3.0).to_string(), "(0.5000, 0.3333)");
    }

    #[test]
    fn integer_coordinates_stay_integers() {
        let point: Point = serde_json::from_str("[1, 0.5]").unwrap();
        assert_eq!(point, p(1.0, 0.5));
        assert_eq!(serde_json::to_string(&point).unwrap(), "[1,0.5]");
        assert_eq!(serde_json::to_string(&p(1.0, 0.0)).unwrap(), "[1.0,0.0]");
    }
}
