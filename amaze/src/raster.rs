// raster.rs - Minimal CPU rasterizer for maze walls, passages and markers
//
// Coordinates are in pixels with (0, 0) at the top-left pixel center. Every shape is
// rasterized by testing pixel centers inside its clipped bounding box, so drawing is
// deterministic and independent of any display backend.

use std::fs;
use std::path::Path;

use image::{DynamicImage, GrayImage, ImageBuffer, ImageFormat, Pixel, RgbImage};

use crate::error_handling::Result;

pub type Vec2 = (f64, f64);

/// End treatment for thick line segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCap {
    /// Stops exactly at the endpoints.
    Butt,
    /// Extends by half the width with a round end, so consecutive segments join cleanly.
    Round,
}

/// Axis aligned box in pixel space, inclusive on both ends.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    min: Vec2,
    max: Vec2,
}

impl Bounds {
    fn around(points: &[Vec2], pad: f64) -> Self {
        let mut min = (f64::INFINITY, f64::INFINITY);
        let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for &(x, y) in points {
            min = (min.0.min(x), min.1.min(y));
            max = (max.0.max(x), max.1.max(y));
        }
        Self {
            min: (min.0 - pad, min.1 - pad),
            max: (max.0 + pad, max.1 + pad),
        }
    }

    /// Clip to the buffer; `None` when nothing overlaps.
    fn clip(self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        if width == 0 || height == 0 {
            return None;
        }
        let x0 = self.min.0.ceil().max(0.0);
        let y0 = self.min.1.ceil().max(0.0);
        let x1 = self.max.0.floor().min(f64::from(width - 1));
        let y1 = self.max.1.floor().min(f64::from(height - 1));
        if x0 > x1 || y0 > y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

fn fill_where<P, F>(img: &mut ImageBuffer<P, Vec<P::Subpixel>>, bounds: Bounds, value: P, inside: F)
where
    P: Pixel,
    F: Fn(f64, f64) -> bool,
{
    let (width, height) = img.dimensions();
    let Some((x0, y0, x1, y1)) = bounds.clip(width, height) else {
        return;
    };
    for y in y0..=y1 {
        for x in x0..=x1 {
            if inside(f64::from(x), f64::from(y)) {
                img.put_pixel(x, y, value);
            }
        }
    }
}

/// Distance from `p` to segment `a`-`b` and the clamped projection parameter along it.
pub fn segment_distance(p: Vec2, a: Vec2, b: Vec2) -> (f64, f64) {
    let (abx, aby) = (b.0 - a.0, b.1 - a.1);
    let (apx, apy) = (p.0 - a.0, p.1 - a.1);
    let len_sq = abx * abx + aby * aby;
    if len_sq <= f64::EPSILON {
        return (apx.hypot(apy), 0.0);
    }
    let t = ((apx * abx + apy * aby) / len_sq).clamp(0.0, 1.0);
    let (cx, cy) = (a.0 + abx * t - p.0, a.1 + aby * t - p.1);
    (cx.hypot(cy), t)
}

/// Unclamped projection parameter and perpendicular distance, used for flat caps.
fn segment_frame(p: Vec2, a: Vec2, b: Vec2) -> Option<(f64, f64)> {
    let (abx, aby) = (b.0 - a.0, b.1 - a.1);
    let len = abx.hypot(aby);
    if len <= f64::EPSILON {
        return None;
    }
    let (apx, apy) = (p.0 - a.0, p.1 - a.1);
    let along = (apx * abx + apy * aby) / (len * len);
    let across = (apx * aby - apy * abx).abs() / len;
    Some((along, across))
}

/// Draws a segment of the given total `width`.
pub fn draw_line<P: Pixel>(
    img: &mut ImageBuffer<P, Vec<P::Subpixel>>,
    a: Vec2,
    b: Vec2,
    width: f64,
    cap: LineCap,
    value: P,
) {
    let half = width / 2.0;
    let bounds = Bounds::around(&[a, b], half);
    match cap {
        LineCap::Round => fill_where(img, bounds, value, |x, y| {
            segment_distance((x, y), a, b).0 <= half
        }),
        LineCap::Butt => fill_where(img, bounds, value, |x, y| match segment_frame((x, y), a, b) {
            Some((along, across)) => (0.0..=1.0).contains(&along) && across <= half,
            None => false,
        }),
    }
}

/// Draws the part of an annulus between `outer_radius - width` and `outer_radius`
/// whose angle lies in `[start_deg, end_deg]`.
///
/// Angles are in degrees, measured clockwise from the positive x axis (image y points
/// down), so -90 is straight up.
pub fn draw_arc<P: Pixel>(
    img: &mut ImageBuffer<P, Vec<P::Subpixel>>,
    center: Vec2,
    outer_radius: f64,
    width: f64,
    start_deg: f64,
    end_deg: f64,
    value: P,
) {
    let inner_radius = (outer_radius - width).max(0.0);
    let span = end_deg - start_deg;
    if span <= 0.0 {
        return;
    }
    let full_turn = span >= 360.0;
    let bounds = Bounds::around(&[center], outer_radius);
    fill_where(img, bounds, value, |x, y| {
        let (dx, dy) = (x - center.0, y - center.1);
        let r = dx.hypot(dy);
        if r < inner_radius || r > outer_radius {
            return false;
        }
        if full_turn {
            return true;
        }
        let angle = dy.atan2(dx).to_degrees();
        (angle - start_deg).rem_euclid(360.0) <= span
    });
}

/// Ring outline of the given stroke width, drawn inwards from `radius`.
pub fn draw_circle<P: Pixel>(
    img: &mut ImageBuffer<P, Vec<P::Subpixel>>,
    center: Vec2,
    radius: f64,
    width: f64,
    value: P,
) {
    draw_arc(img, center, radius, width, 0.0, 360.0, value);
}

pub fn fill_disc<P: Pixel>(
    img: &mut ImageBuffer<P, Vec<P::Subpixel>>,
    center: Vec2,
    radius: f64,
    value: P,
) {
    let bounds = Bounds::around(&[center], radius);
    fill_where(img, bounds, value, |x, y| {
        (x - center.0).hypot(y - center.1) <= radius
    });
}

/// Photographic negative of a single channel buffer.
pub fn inverted(gray: &GrayImage) -> GrayImage {
    let mut out = gray.clone();
    image::imageops::invert(&mut out);
    out
}

/// Replicates a single channel buffer into three channels.
pub fn gray_to_rgb(gray: &GrayImage) -> RgbImage {
    DynamicImage::ImageLuma8(gray.clone()).to_rgb8()
}

/// Writes a frame as PNG regardless of the file extension, creating missing parent directories.
pub fn save_png<P: AsRef<Path>>(frame: &RgbImage, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    frame.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
