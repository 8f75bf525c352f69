//! Screen reads: pixel reads and template search over xcap captures.

use std::path::Path;

use anyhow::Context;
use image::RgbaImage;
use xcap::Monitor;

/// Convert a global logical point into physical pixel coordinates of `monitor`'s capture.
fn to_local(monitor: &Monitor, x: i32, y: i32) -> (u32, u32) {
    let scale = monitor.scale_factor().max(1.0);
    let lx = ((x - monitor.x()).max(0) as f32 * scale) as u32;
    let ly = ((y - monitor.y()).max(0) as f32 * scale) as u32;
    (lx, ly)
}

fn to_global(monitor: &Monitor, lx: u32, ly: u32) -> (i32, i32) {
    let scale = monitor.scale_factor().max(1.0);
    (
        monitor.x() + (lx as f32 / scale) as i32,
        monitor.y() + (ly as f32 / scale) as i32,
    )
}

/// Pixel color at a global screen point as lowercase `rrggbb`.
pub fn pixel_color(x: i32, y: i32) -> anyhow::Result<String> {
    let monitor = Monitor::from_point(x, y)
        .map_err(|e| anyhow::anyhow!("no monitor contains ({x}, {y}): {e}"))?;
    let img = monitor
        .capture_image()
        .map_err(|e| anyhow::anyhow!("screen capture failed: {e}"))?;
    let (lx, ly) = to_local(&monitor, x, y);
    if lx >= img.width() || ly >= img.height() {
        anyhow::bail!("point ({x}, {y}) is outside the captured monitor area");
    }
    let p = img.get_pixel(lx, ly);
    Ok(format!("{:02x}{:02x}{:02x}", p[0], p[1], p[2]))
}

/// Search every monitor for `path` and return the global centre of the first match.
pub fn locate_image(path: &Path, tolerance: u8) -> anyhow::Result<Option<(i32, i32)>> {
    if !path.exists() {
        anyhow::bail!("image file not found: {}", path.display());
    }
    let needle = image::open(path)
        .with_context(|| format!("failed to open image {}", path.display()))?
        .to_rgba8();

    let monitors = Monitor::all().map_err(|e| anyhow::anyhow!("failed to list monitors: {e}"))?;
    for monitor in monitors {
        let haystack = match monitor.capture_image() {
            Ok(img) => img,
            Err(e) => {
                log::warn!("Skipping monitor {:?}: capture failed: {e}", monitor.name());
                continue;
            }
        };
        if let Some((lx, ly)) = find_template(&haystack, &needle, tolerance) {
            let centre = to_global(&monitor, lx + needle.width() / 2, ly + needle.height() / 2);
            log::info!("Image {} found at {:?}", path.display(), centre);
            return Ok(Some(centre));
        }
    }
    log::info!("Image {} not found on screen", path.display());
    Ok(None)
}

/// Top-left corner of the first placement of `needle` inside `haystack`
/// where every RGB channel is within `tolerance`. Alpha-transparent needle
/// pixels match anything.
pub fn find_template(haystack: &RgbaImage, needle: &RgbaImage, tolerance: u8) -> Option<(u32, u32)> {
    let (hw, hh) = haystack.dimensions();
    let (nw, nh) = needle.dimensions();
    if nw == 0 || nh == 0 || nw > hw || nh > hh {
        return None;
    }

    let close = |a: &image::Rgba<u8>, b: &image::Rgba<u8>| {
        b[3] == 0 || (0..3).all(|c| a[c].abs_diff(b[c]) <= tolerance)
    };

    for y in 0..=(hh - nh) {
        for x in 0..=(hw - nw) {
            // Cheap first-pixel reject before the full scan.
            if !close(haystack.get_pixel(x, y), needle.get_pixel(0, 0)) {
                continue;
            }
            let matched = (0..nh).all(|ny| {
                (0..nw).all(|nx| close(haystack.get_pixel(x + nx, y + ny), needle.get_pixel(nx, ny)))
            });
            if matched {
                return Some((x, y));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn canvas() -> RgbaImage {
        let mut img = RgbaImage::from_pixel(20, 10, Rgba([255, 255, 255, 255]));
        img.put_pixel(12, 4, Rgba([200, 0, 0, 255]));
        img.put_pixel(13, 4, Rgba([0, 200, 0, 255]));
        img.put_pixel(12, 5, Rgba([0, 0, 200, 255]));
        img.put_pixel(13, 5, Rgba([10, 10, 10, 255]));
        img
    }

    fn needle() -> RgbaImage {
        let mut n = RgbaImage::new(2, 2);
        n.put_pixel(0, 0, Rgba([200, 0, 0, 255]));
        n.put_pixel(1, 0, Rgba([0, 200, 0, 255]));
        n.put_pixel(0, 1, Rgba([0, 0, 200, 255]));
        n.put_pixel(1, 1, Rgba([10, 10, 10, 255]));
        n
    }

    #[test]
    fn exact_match_found() {
        assert_eq!(find_template(&canvas(), &needle(), 0), Some((12, 4)));
    }

    #[test]
    fn tolerance_allows_near_colors() {
        let mut n = needle();
        n.put_pixel(1, 1, Rgba([14, 7, 10, 255]));
        assert_eq!(find_template(&canvas(), &n, 0), None);
        assert_eq!(find_template(&canvas(), &n, 5), Some((12, 4)));
    }

    #[test]
    fn oversized_needle_never_matches() {
        let big = RgbaImage::new(30, 30);
        assert_eq!(find_template(&canvas(), &big, 255), None);
    }
}
