//! Coarse "did the screen change?" detection.
//!
//! An 8×8 average hash: cheap, tolerant of compression noise, and blind to small
//! local changes. Similar-but-different screens may compare as unchanged.
use image::imageops::{self, FilterType};
use image::RgbImage;

const HASH_SIDE: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    pub fn of(image: &RgbImage) -> Self {
        let gray = imageops::grayscale(image);
        let small = imageops::resize(&gray, HASH_SIDE, HASH_SIDE, FilterType::Triangle);
        let pixels: Vec<u32> = small.pixels().map(|p| p[0] as u32).collect();
        let sum: u32 = pixels.iter().sum();
        let count = pixels.len().max(1) as u32;

        // p >= mean, compared without rounding: p * n >= sum
        let mut bits = 0u64;
        for (i, p) in pixels.iter().enumerate() {
            if p * count >= sum {
                bits |= 1 << i;
            }
        }
        Fingerprint(bits)
    }

    /// Hamming distance between two fingerprints.
    pub fn distance(&self, other: &Fingerprint) -> u32 {
        (self.0 ^ other.0).count_ones()
    }
}
