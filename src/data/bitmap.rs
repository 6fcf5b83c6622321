//! Binary glyph bitmaps and their PNG representation

use crate::core::errors::{FileContext, FusionResult};
use image::{Rgba, RgbaImage};
use std::fs;
use std::path::Path;

/// Alpha at or above this value counts as an opaque pixel
pub const ALPHA_THRESHOLD: u8 = 128;

/// A binary alpha mask, row-major with the top row first
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlyphBitmap {
    width: u32,
    height: u32,
    mask: Vec<bool>,
}

impl GlyphBitmap {
    /// A fully transparent bitmap
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            mask: vec![false; (width * height) as usize],
        }
    }

    /// Build from rows of `0`/`1` flags; every row must have the same length
    pub fn from_rows(rows: &[Vec<u8>]) -> Self {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.len() as u32);
        let mut bitmap = Self::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, value) in row.iter().enumerate().take(width as usize) {
                bitmap.set(x as u32, y as u32, *value != 0);
            }
        }
        bitmap
    }

    /// Binarize an RGBA image by its alpha channel
    pub fn from_rgba(image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let mask = image
            .pixels()
            .map(|pixel| pixel.0[3] >= ALPHA_THRESHOLD)
            .collect();
        Self {
            width,
            height,
            mask,
        }
    }

    /// Opaque pixels become solid black, the rest fully transparent
    pub fn to_rgba(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            if self.get(x, y) {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        })
    }

    pub fn load_png(path: &Path) -> FusionResult<Self> {
        let image = image::open(path).with_file_context("decode", path)?;
        Ok(Self::from_rgba(&image.to_rgba8()))
    }

    /// Write as a canonical black-on-transparent PNG, creating parent dirs
    pub fn save_png(&self, path: &Path) -> FusionResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_file_context("create", parent)?;
        }
        self.to_rgba().save(path).with_file_context("write", path)?;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.mask[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, opaque: bool) {
        if x < self.width && y < self.height {
            self.mask[(y * self.width + x) as usize] = opaque;
        }
    }

    /// Row `y` as a slice of opacity flags
    pub fn row(&self, y: u32) -> &[bool] {
        let start = (y * self.width) as usize;
        &self.mask[start..start + self.width as usize]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> + '_ {
        (0..self.height).map(move |y| self.row(y))
    }

    pub fn is_blank(&self) -> bool {
        !self.mask.iter().any(|&opaque| opaque)
    }

    pub fn opaque_count(&self) -> usize {
        self.mask.iter().filter(|&&opaque| opaque).count()
    }

    /// Coordinates of every opaque pixel, top row first
    pub fn opaque_pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (0..self.height)
            .flat_map(move |y| (0..self.width).map(move |x| (x, y)))
            .filter(move |&(x, y)| self.get(x, y))
    }

    /// Keep only the leftmost `width` columns
    pub fn cropped_to_width(&self, width: u32) -> Self {
        if width >= self.width {
            return self.clone();
        }
        let mut cropped = Self::new(width, self.height);
        for (x, y) in self.opaque_pixels().filter(|&(x, _)| x < width) {
            cropped.set(x, y, true);
        }
        cropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GlyphBitmap {
        GlyphBitmap::from_rows(&[vec![0, 1, 0], vec![1, 1, 1], vec![1, 0, 1]])
    }

    #[test]
    fn test_from_rows() {
        let bitmap = sample();
        assert_eq!(bitmap.width(), 3);
        assert_eq!(bitmap.height(), 3);
        assert!(bitmap.get(1, 0));
        assert!(!bitmap.get(0, 0));
        assert!(!bitmap.get(5, 5));
        assert_eq!(bitmap.opaque_count(), 6);
    }

    #[test]
    fn test_alpha_threshold() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([0, 0, 0, 127]));
        image.put_pixel(1, 0, Rgba([255, 255, 255, 128]));
        let bitmap = GlyphBitmap::from_rgba(&image);
        assert_eq!(bitmap.row(0), &[false, true]);
    }

    #[test]
    fn test_png_keeps_mask() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("0041.png");
        sample().save_png(&path).unwrap();
        assert_eq!(GlyphBitmap::load_png(&path).unwrap(), sample());
    }

    #[test]
    fn test_crop() {
        let cropped = sample().cropped_to_width(2);
        assert_eq!(cropped.width(), 2);
        assert_eq!(cropped.row(2), &[true, false]);
        assert_eq!(sample().cropped_to_width(8), sample());
    }
}
