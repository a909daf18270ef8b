// src/renderer.rs

use crate::config::OverlayConfig;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::model::{Dimensions, InteractionRecord, InteractionType, SlideStroke};
use crate::store::InteractionStore;
use image::{Rgb, RgbImage};
use indicatif::{ParallelProgressIterator, ProgressBar};
use palette::{named, Srgb};
use rayon::prelude::*;
use std::fs;
use std::path::Path;

/// Overlay color of each gesture type
pub fn type_color(kind: InteractionType) -> Rgb<u8> {
    let color: Srgb<u8> = match kind {
        InteractionType::Tap => named::RED,
        InteractionType::MultiTap => named::ORANGE,
        InteractionType::LongPress => named::BLUE,
        InteractionType::Slide => named::GREEN,
    };
    let (r, g, b) = color.into_components();
    Rgb([r, g, b])
}

/// Renders every image of `dataset` with its annotation drawn on top into
/// `output`, keeping file names. Returns the number of images written.
pub fn render_dataset(
    dataset: &Dataset,
    store: &InteractionStore,
    output: &Path,
    overlay: &OverlayConfig,
) -> Result<usize> {
    fs::create_dir_all(output).map_err(Error::io(output))?;

    let bar = ProgressBar::new(dataset.len() as u64);
    bar.set_message(format!("Rendering {}", dataset.test_id));

    let written = dataset
        .images
        .par_iter()
        .progress_with(bar)
        .filter_map(|path| {
            let image_id = path.file_name()?.to_string_lossy().into_owned();
            Some((path, image_id))
        })
        .map(|(path, image_id)| -> Result<()> {
            let mut image = image::open(path)?.to_rgb8();
            if let Some(record) = store.get(&dataset.test_id, &image_id) {
                draw_record(&mut image, record, overlay);
            }
            image.save(output.join(&image_id))?;
            Ok(())
        })
        .collect::<Result<Vec<()>>>()?;

    Ok(written.len())
}

/// Draws the grounding points of `record` and, for a complete slide, an
/// arrow from its start to its end
pub fn draw_record(image: &mut RgbImage, record: &InteractionRecord, overlay: &OverlayConfig) {
    let dimensions = Dimensions::new(image.width(), image.height());
    let color = type_color(record.interaction_type());

    for point in record.grounding_points() {
        let center = point.to_pixels(dimensions);
        draw_soft_disc(image, center, color, overlay);
    }

    if let InteractionRecord::Slide {
        stroke: SlideStroke::Complete(start, end),
        ..
    } = record
    {
        draw_arrow(
            image,
            start.to_pixels(dimensions),
            end.to_pixels(dimensions),
            color,
            overlay,
        );
    }
}

fn blend(pixel: &mut Rgb<u8>, color: Rgb<u8>, alpha: f64) {
    for c in 0..3 {
        let base = pixel.0[c] as f64;
        let top = color.0[c] as f64;
        pixel.0[c] = (base * (1.0 - alpha) + top * alpha).round() as u8;
    }
}

/// Pixel bounds `[x0, x1) x [y0, y1)` of a box clamped to the image
fn clamp_box(image: &RgbImage, min: (f64, f64), max: (f64, f64)) -> (u32, u32, u32, u32) {
    let clamp = |v: f64, limit: u32| v.max(0.0).min(limit as f64) as u32;
    (
        clamp(min.0.floor(), image.width()),
        clamp(min.1.floor(), image.height()),
        clamp(max.0.ceil() + 1.0, image.width()),
        clamp(max.1.ceil() + 1.0, image.height()),
    )
}

/// An opaque dot with a halo fading out as `(1 - r/R)^1.5`
fn draw_soft_disc(image: &mut RgbImage, center: (f64, f64), color: Rgb<u8>, overlay: &OverlayConfig) {
    let radius = overlay.total_radius.max(overlay.solid_radius);
    if radius <= 0.0 {
        return;
    }
    let (x0, y0, x1, y1) = clamp_box(
        image,
        (center.0 - radius, center.1 - radius),
        (center.0 + radius, center.1 + radius),
    );

    for y in y0..y1 {
        for x in x0..x1 {
            let d = ((x as f64 - center.0).powi(2) + (y as f64 - center.1).powi(2)).sqrt();
            if d > radius {
                continue;
            }
            let alpha = if d <= overlay.solid_radius {
                1.0
            } else {
                let ring = d.ceil().max(1.0);
                (1.0 - ring / radius).max(0.0).powf(1.5)
            };
            blend(image.get_pixel_mut(x, y), color, alpha);
        }
    }
}

fn distance_to_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}

fn in_triangle(p: (f64, f64), a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> bool {
    let cross = |u: (f64, f64), v: (f64, f64), w: (f64, f64)| {
        (v.0 - u.0) * (w.1 - u.1) - (v.1 - u.1) * (w.0 - u.0)
    };
    let d1 = cross(p, a, b);
    let d2 = cross(p, b, c);
    let d3 = cross(p, c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

fn draw_arrow(
    image: &mut RgbImage,
    from: (f64, f64),
    to: (f64, f64),
    color: Rgb<u8>,
    overlay: &OverlayConfig,
) {
    let half_width = overlay.arrow_line_width / 2.0;
    let (x0, y0, x1, y1) = clamp_box(
        image,
        (from.0.min(to.0) - half_width, from.1.min(to.1) - half_width),
        (from.0.max(to.0) + half_width, from.1.max(to.1) + half_width),
    );
    for y in y0..y1 {
        for x in x0..x1 {
            if distance_to_segment((x as f64, y as f64), from, to) <= half_width {
                image.put_pixel(x, y, color);
            }
        }
    }

    // Arrowhead: two barbs pointing back along the line from the tip
    let angle = (from.1 - to.1).atan2(from.0 - to.0);
    let spread = overlay.arrowhead_angle_deg.to_radians();
    let length = overlay.arrowhead_length;
    let barb1 = (
        to.0 + length * (angle - spread).cos(),
        to.1 + length * (angle - spread).sin(),
    );
    let barb2 = (
        to.0 + length * (angle + spread).cos(),
        to.1 + length * (angle + spread).sin(),
    );

    let (x0, y0, x1, y1) = clamp_box(
        image,
        (
            to.0.min(barb1.0).min(barb2.0),
            to.1.min(barb1.1).min(barb2.1),
        ),
        (
            to.0.max(barb1.0).max(barb2.0),
            to.1.max(barb1.1).max(barb2.1),
        ),
    );
    for y in y0..y1 {
        for x in x0..x1 {
            if in_triangle((x as f64, y as f64), to, barb1, barb2) {
                image.put_pixel(x, y, color);
            }
        }
    }
}
