//! Dominant color extraction.

use std::collections::HashMap;

use tracing::debug;

use rgb_everywhere_core::{ColorSample, Error, Result};

use crate::PixelBuffer;

/// Reduces a pixel buffer to its dominant colors.
pub trait ColorExtractor: Send + Sync {
    /// Return up to `count` dominant colors, most dominant first.
    ///
    /// Fewer than `count` colors come back when the buffer does not contain
    /// enough distinct colors.
    fn extract_dominant(&self, buffer: &PixelBuffer, count: usize) -> Result<Vec<ColorSample>>;
}

type Point = [f32; 3];

/// Deterministic k-means clustering in RGB space.
///
/// The buffer is first downscaled (nearest-neighbour) so that its longest
/// side is at most `max_dimension`. Seeds are the most frequent pixel
/// followed by successive farthest points, so identical input always
/// produces identical output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KMeansExtractor {
    max_iterations: usize,
    max_dimension: u32,
}

impl Default for KMeansExtractor {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            max_dimension: 80,
        }
    }
}

impl KMeansExtractor {
    /// Create an extractor with default settings (20 iterations, 80 px).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the downscale target (0 disables downscaling).
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }
}

impl ColorExtractor for KMeansExtractor {
    fn extract_dominant(&self, buffer: &PixelBuffer, count: usize) -> Result<Vec<ColorSample>> {
        if count == 0 {
            return Err(Error::Extraction("cluster count must be > 0".to_string()));
        }
        if buffer.is_empty() {
            return Err(Error::Extraction("pixel buffer is empty".to_string()));
        }

        let small = buffer.downscale(self.max_dimension);
        let samples: Vec<ColorSample> = small.samples().collect();
        let points: Vec<Point> = samples.iter().map(|c| to_point(*c)).collect();

        let mut centroids = seed(&samples, &points, count);
        let mut assignment = assign(&points, &centroids);

        for iteration in 0..self.max_iterations {
            centroids = recenter(&points, &assignment, &centroids);
            let next = assign(&points, &centroids);
            if next == assignment {
                debug!("k-means converged after {} iteration(s)", iteration + 1);
                break;
            }
            assignment = next;
        }
        let centroids = recenter(&points, &assignment, &centroids);

        let mut population = vec![0usize; centroids.len()];
        for &cluster in &assignment {
            population[cluster] += 1;
        }

        // Stable sort keeps seed order between equally sized clusters.
        let mut ranked: Vec<(usize, Point)> = population
            .into_iter()
            .zip(centroids)
            .filter(|(size, _)| *size > 0)
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0));

        let mut colors: Vec<ColorSample> = Vec::with_capacity(ranked.len());
        for (_, centroid) in ranked {
            let color = to_color(centroid);
            if !colors.contains(&color) {
                colors.push(color);
            }
        }

        debug!(
            "Extracted {} of {} requested color(s) from {}x{} buffer",
            colors.len(),
            count,
            buffer.width(),
            buffer.height()
        );
        Ok(colors)
    }
}

fn to_point(color: ColorSample) -> Point {
    [f32::from(color.r), f32::from(color.g), f32::from(color.b)]
}

fn to_color(point: Point) -> ColorSample {
    let channel = |v: f32| v.round().clamp(0.0, 255.0) as u8;
    ColorSample::new(channel(point[0]), channel(point[1]), channel(point[2]))
}

fn distance_sq(a: &Point, b: &Point) -> f32 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr * dr + dg * dg + db * db
}

/// Most frequent pixel first, then repeatedly the pixel farthest from every
/// chosen seed. Stops early once every pixel coincides with a seed.
fn seed(samples: &[ColorSample], points: &[Point], count: usize) -> Vec<Point> {
    let mut frequency: HashMap<ColorSample, usize> = HashMap::new();
    for color in samples {
        *frequency.entry(*color).or_insert(0) += 1;
    }

    // Scan in pixel order so ties resolve to the first occurrence.
    let mut first = 0;
    let mut best = 0;
    for (i, color) in samples.iter().enumerate() {
        let n = frequency[color];
        if n > best {
            best = n;
            first = i;
        }
    }

    let mut seeds = vec![points[first]];
    let mut nearest: Vec<f32> = points.iter().map(|p| distance_sq(p, &points[first])).collect();

    while seeds.len() < count {
        let mut far_index = 0;
        let mut far_distance = 0.0f32;
        for (i, d) in nearest.iter().enumerate() {
            if *d > far_distance {
                far_distance = *d;
                far_index = i;
            }
        }
        if far_distance == 0.0 {
            break;
        }

        let next = points[far_index];
        seeds.push(next);
        for (d, p) in nearest.iter_mut().zip(points) {
            *d = d.min(distance_sq(p, &next));
        }
    }

    seeds
}

fn assign(points: &[Point], centroids: &[Point]) -> Vec<usize> {
    points
        .iter()
        .map(|p| {
            let mut best = 0;
            let mut best_distance = f32::MAX;
            for (i, c) in centroids.iter().enumerate() {
                let d = distance_sq(p, c);
                if d < best_distance {
                    best_distance = d;
                    best = i;
                }
            }
            best
        })
        .collect()
}

/// Mean of each cluster; empty clusters keep their previous centroid.
fn recenter(points: &[Point], assignment: &[usize], previous: &[Point]) -> Vec<Point> {
    let mut sums = vec![[0f64; 3]; previous.len()];
    let mut counts = vec![0usize; previous.len()];

    for (p, &cluster) in points.iter().zip(assignment) {
        for channel in 0..3 {
            sums[cluster][channel] += f64::from(p[channel]);
        }
        counts[cluster] += 1;
    }

    previous
        .iter()
        .enumerate()
        .map(|(i, old)| {
            if counts[i] == 0 {
                return *old;
            }
            let n = counts[i] as f64;
            [
                (sums[i][0] / n) as f32,
                (sums[i][1] / n) as f32,
                (sums[i][2] / n) as f32,
            ]
        })
        .collect()
}
