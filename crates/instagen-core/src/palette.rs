//! Dominant color extraction for brand palettes.
//!
//! Median-cut quantization: the pixel set is split repeatedly along its
//! widest channel at the median until `count` boxes exist, and each box
//! contributes its mean color. Transparent pixels are flattened onto white
//! first so cut-out product shots do not report their empty background as
//! black.

use std::collections::BTreeMap;

use crate::decode::{flatten_alpha, SourceImage, WHITE};

/// Upper bound on pixels sampled; larger images are strided.
const MAX_SAMPLES: usize = 1 << 16;

/// An axis-aligned box of pixels in RGB space.
struct ColorBox {
    pixels: Vec<[u8; 3]>,
}

impl ColorBox {
    /// Widest channel and its span.
    fn widest_channel(&self) -> (usize, u8) {
        let mut lo = [u8::MAX; 3];
        let mut hi = [u8::MIN; 3];
        for px in &self.pixels {
            for c in 0..3 {
                lo[c] = lo[c].min(px[c]);
                hi[c] = hi[c].max(px[c]);
            }
        }
        (0..3)
            .map(|c| (c, hi[c] - lo[c]))
            .max_by_key(|&(c, span)| (span, std::cmp::Reverse(c)))
            .unwrap_or((0, 0))
    }

    /// Split at the median of the widest channel. Pixels sharing the median
    /// value stay together, so the box must span more than one value.
    fn split(mut self) -> (ColorBox, ColorBox) {
        let (channel, _) = self.widest_channel();
        self.pixels.sort_unstable_by_key(|px| px[channel]);

        let pivot = self.pixels[self.pixels.len() / 2][channel];
        let mut at = self.pixels.partition_point(|px| px[channel] < pivot);
        if at == 0 {
            at = self.pixels.partition_point(|px| px[channel] <= pivot);
        }

        let upper = self.pixels.split_off(at);
        (self, ColorBox { pixels: upper })
    }

    fn mean(&self) -> [u8; 3] {
        let mut sum = [0u64; 3];
        for px in &self.pixels {
            for c in 0..3 {
                sum[c] += px[c] as u64;
            }
        }
        let n = self.pixels.len().max(1) as u64;
        [
            ((sum[0] + n / 2) / n) as u8,
            ((sum[1] + n / 2) / n) as u8,
            ((sum[2] + n / 2) / n) as u8,
        ]
    }
}

/// Extract up to `count` dominant colors, most common first.
///
/// Fewer colors are returned when the image has fewer distinct colors than
/// requested. Empty images and `count == 0` yield an empty vector.
pub fn dominant_colors(image: &SourceImage, count: usize) -> Vec<[u8; 3]> {
    if count == 0 || !image.is_well_formed() {
        return Vec::new();
    }

    let rgb = flatten_alpha(image, WHITE);
    let total = rgb.pixel_count() as usize;
    let stride = total.div_ceil(MAX_SAMPLES).max(1);
    let samples: Vec<[u8; 3]> = rgb
        .pixels
        .chunks_exact(3)
        .step_by(stride)
        .map(|px| [px[0], px[1], px[2]])
        .collect();

    let mut boxes = vec![ColorBox { pixels: samples }];
    while boxes.len() < count {
        // Split the box with the widest spread; stop once every box is a single color.
        let candidate = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.pixels.len() > 1)
            .map(|(i, b)| (i, b.widest_channel().1))
            .filter(|&(_, span)| span > 0)
            .max_by_key(|&(i, span)| (span, std::cmp::Reverse(i)));

        let Some((index, _)) = candidate else {
            break;
        };
        let (lower, upper) = boxes.swap_remove(index).split();
        boxes.push(lower);
        boxes.push(upper);
    }

    rank_by_population(boxes.iter().map(|b| (b.mean(), b.pixels.len())))
}

/// Merge boxes that averaged to the same color, then order by population
/// (ties broken by color so output is deterministic).
fn rank_by_population(boxes: impl IntoIterator<Item = ([u8; 3], usize)>) -> Vec<[u8; 3]> {
    let mut population: BTreeMap<[u8; 3], usize> = BTreeMap::new();
    for (color, count) in boxes {
        *population.entry(color).or_default() += count;
    }

    let mut colors: Vec<([u8; 3], usize)> = population.into_iter().collect();
    colors.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    colors.into_iter().map(|(color, _)| color).collect()
}

/// Format a color as upper-case `#RRGGBB`.
pub fn to_hex(color: [u8; 3]) -> String {
    format!("#{:02X}{:02X}{:02X}", color[0], color[1], color[2])
}

/// Dominant colors as hex strings.
pub fn hex_palette(image: &SourceImage, count: usize) -> Vec<String> {
    dominant_colors(image, count).into_iter().map(to_hex).collect()
}
