//! Presentation helpers shared by the terminal UI and the headless printer.

use crate::models::DetailRecord;
use image::imageops::FilterType;

pub const THUMB_W: u32 = 48;
pub const THUMB_H: u32 = 48;

/// Upper-case the first character, leave the rest alone: `mr-mime` -> `Mr-mime`.
pub fn capitalize(name: &str) -> String {
    let mut chs = name.chars();
    match chs.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chs.as_str(),
    }
}

pub fn title_line(p: &DetailRecord) -> String {
    format!("{} (#{})", capitalize(&p.name), p.id)
}

pub fn types_line(p: &DetailRecord) -> String {
    format!("Type: {}", p.types.join(", "))
}

pub fn height_line(p: &DetailRecord) -> String {
    format!("Height: {} m", p.height_m())
}

pub fn weight_line(p: &DetailRecord) -> String {
    format!("Weight: {} kg", p.weight_kg())
}

/// Everything the detail panel shows, one line each.
pub fn detail_lines(p: &DetailRecord) -> Vec<String> {
    let mut lines = vec![
        title_line(p),
        types_line(p),
        height_line(p),
        weight_line(p),
        "Stats:".to_string(),
    ];
    lines.extend(p.stats.iter().map(|s| format!("{}: {}", s.name, s.base)));
    lines
}

pub fn card_label(p: &DetailRecord) -> String {
    format!("#{} {}", p.id, capitalize(&p.name))
}

/// Compact RGB thumbnail kept in the UI's sprite cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteThumb {
    pub w: u32,
    pub h: u32,
    /// RGB pixels in row-major order (len = w*h*3)
    pub pixels: Vec<u8>,
}

impl SpriteThumb {
    /// Decode an encoded image (PNG from the API) into a `THUMB_W` x `THUMB_H` thumbnail.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let img = match image::load_from_memory(bytes) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("undecodable sprite: {}", e);
                return None;
            }
        };
        let small = image::imageops::resize(&img.to_rgba8(), THUMB_W, THUMB_H, FilterType::Lanczos3);
        let mut pixels = Vec::with_capacity((THUMB_W * THUMB_H * 3) as usize);
        for p in small.pixels() {
            pixels.extend_from_slice(&[p[0], p[1], p[2]]);
        }
        Some(SpriteThumb {
            w: THUMB_W,
            h: THUMB_H,
            pixels,
        })
    }

    /// Pixel rows at `w` x `h`, resizing in memory when the size differs.
    pub fn rows(&self, w: u32, h: u32) -> Vec<Vec<(u8, u8, u8)>> {
        if self.w == w && self.h == h {
            return self
                .pixels
                .chunks(3 * w as usize)
                .map(|row| row.chunks(3).map(|p| (p[0], p[1], p[2])).collect())
                .collect();
        }

        let mut buf = image::RgbaImage::new(self.w, self.h);
        for y in 0..self.h {
            for x in 0..self.w {
                let idx = ((y * self.w + x) * 3) as usize;
                let (r, g, b) = (self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]);
                buf.put_pixel(x, y, image::Rgba([r, g, b, 255]));
            }
        }
        let resized = image::imageops::resize(&buf, w, h, FilterType::Lanczos3);
        let mut rows: Vec<Vec<(u8, u8, u8)>> = Vec::with_capacity(resized.height() as usize);
        for y in 0..resized.height() {
            let mut row = Vec::with_capacity(resized.width() as usize);
            for x in 0..resized.width() {
                let p = resized.get_pixel(x, y);
                row.push((p[0], p[1], p[2]));
            }
            rows.push(row);
        }
        rows
    }
}
