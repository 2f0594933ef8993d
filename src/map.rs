use std::path::Path;

use image::{Rgb, RgbImage};

use crate::error::Result;
use crate::models::EnrichedPair;

/// Changes beyond this magnitude get the end colour of the scale.
const CLAMP_PCT: f64 = 100.0;
const MARGIN: f64 = 10.0;
const POINT_RADIUS: i64 = 2;
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Blue for a fall, white for no change, red for a rise.
pub fn change_colour(percent_change: f64) -> Rgb<u8> {
    let t = (percent_change / CLAMP_PCT).clamp(-1.0, 1.0);
    let fade = |v: f64| (255.0 * (1.0 - v.abs())).round() as u8;
    if t >= 0.0 {
        Rgb([255, fade(t), fade(t)])
    } else {
        Rgb([fade(t), fade(t), 255])
    }
}

/// Plot every located pair as a small square on an equirectangular
/// projection, longitude scaled by cos(mean latitude). Returns false (and
/// writes nothing) when no pair has a location.
pub fn render_change_map(pairs: &[EnrichedPair], width: u32, height: u32, path: &Path) -> Result<bool> {
    let points: Vec<(f64, f64, f64)> = pairs
        .iter()
        .filter_map(|p| p.location.map(|(lat, long)| (lat, long, p.priced.percent_change)))
        .collect();
    if points.is_empty() {
        return Ok(false);
    }

    let mean_lat = points.iter().map(|p| p.0).sum::<f64>() / points.len() as f64;
    let x_scale = mean_lat.to_radians().cos();
    let project = |lat: f64, long: f64| (long * x_scale, lat);

    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for (lat, long, _) in &points {
        let (x, y) = project(*lat, *long);
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    let usable_w = (width as f64 - 2.0 * MARGIN).max(1.0);
    let usable_h = (height as f64 - 2.0 * MARGIN).max(1.0);
    let span_x = (max_x - min_x).max(1e-9);
    let span_y = (max_y - min_y).max(1e-9);
    let scale = (usable_w / span_x).min(usable_h / span_y);
    let offset_x = MARGIN + (usable_w - span_x * scale) / 2.0;
    let offset_y = MARGIN + (usable_h - span_y * scale) / 2.0;

    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);
    for (lat, long, change) in &points {
        let (x, y) = project(*lat, *long);
        let px = (offset_x + (x - min_x) * scale).round() as i64;
        // north up
        let py = (offset_y + (max_y - y) * scale).round() as i64;
        let colour = change_colour(*change);
        for dy in -POINT_RADIUS..=POINT_RADIUS {
            for dx in -POINT_RADIUS..=POINT_RADIUS {
                let (cx, cy) = (px + dx, py + dy);
                if cx >= 0 && cy >= 0 && (cx as u32) < width && (cy as u32) < height {
                    img.put_pixel(cx as u32, cy as u32, colour);
                }
            }
        }
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    img.save(path)?;
    Ok(true)
}
