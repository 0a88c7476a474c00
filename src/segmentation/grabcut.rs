//! Iterative GrabCut over an RGB image and a seed label map.

use image::RgbImage;

use super::CancelToken;
use super::gmm::{Color, Gmm};
use super::graph::FlowGraph;
use super::label::{LabelMap, SegLabel};
use crate::error::{MissingClass, Result, SegmenterError};

/// Smoothness weight of neighbouring pixels.
const GAMMA: f64 = 50.0;

/// Terminal weight pinning definite labels, larger than any pixel's n-link sum.
const LAMBDA: f64 = 8.0 * GAMMA + 1.0;

/// Neighbour offsets with a link weight each: left, up-left, up, up-right.
const NEIGHBOURS: [(i64, i64); 4] = [(-1, 0), (-1, -1), (0, -1), (1, -1)];

/// Pairwise weights of each pixel to its already-visited neighbours,
/// in the order of [`NEIGHBOURS`].
struct NeighbourWeights {
    weights: Vec<[f64; 4]>,
}

impl NeighbourWeights {
    fn compute(colors: &[Color], width: usize, height: usize) -> Self {
        let beta = compute_beta(colors, width, height);
        let diagonal_gamma = GAMMA / std::f64::consts::SQRT_2;

        let mut weights = vec![[0.0; 4]; colors.len()];
        for y in 0..height {
            for x in 0..width {
                let idx = y * width + x;
                for (n, &(dx, dy)) in NEIGHBOURS.iter().enumerate() {
                    let Some(other) = neighbour_index(x, y, dx, dy, width) else {
                        continue;
                    };
                    let gamma = if dx != 0 && dy != 0 { diagonal_gamma } else { GAMMA };
                    weights[idx][n] = gamma * (-beta * color_distance_sq(&colors[idx], &colors[other])).exp();
                }
            }
        }
        Self { weights }
    }
}

fn neighbour_index(x: usize, y: usize, dx: i64, dy: i64, width: usize) -> Option<usize> {
    let nx = x as i64 + dx;
    let ny = y as i64 + dy;
    if nx < 0 || ny < 0 || nx >= width as i64 {
        return None;
    }
    Some(ny as usize * width + nx as usize)
}

fn color_distance_sq(a: &Color, b: &Color) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}

/// `beta = 1 / (2 * mean squared colour difference)` over all neighbour pairs.
fn compute_beta(colors: &[Color], width: usize, height: usize) -> f64 {
    let mut total = 0.0;
    let mut pairs = 0usize;
    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            for &(dx, dy) in &NEIGHBOURS {
                if let Some(other) = neighbour_index(x, y, dx, dy, width) {
                    total += color_distance_sq(&colors[idx], &colors[other]);
                    pairs += 1;
                }
            }
        }
    }
    if total <= f64::EPSILON || pairs == 0 {
        0.0
    } else {
        1.0 / (2.0 * total / pairs as f64)
    }
}

/// Refine `labels` in place, running `iterations` rounds of model fitting
/// and min-cut.
///
/// Definite labels are kept; probable pixels are relabelled by the side of
/// the cut they land on.
pub fn grabcut(
    image: &RgbImage,
    labels: &mut LabelMap,
    iterations: usize,
    cancel: &CancelToken,
) -> Result<()> {
    let (width, height) = image.dimensions();
    if (width, height) != (labels.width(), labels.height()) {
        return Err(SegmenterError::SizeMismatch {
            image_width: width,
            image_height: height,
            mask_width: labels.width(),
            mask_height: labels.height(),
        });
    }
    if !labels.labels().iter().any(|l| !l.is_foreground()) {
        return Err(SegmenterError::InsufficientSeed(MissingClass::Background));
    }
    if !labels.labels().iter().any(|l| l.is_foreground()) {
        return Err(SegmenterError::InsufficientSeed(MissingClass::Foreground));
    }

    let (w, h) = (width as usize, height as usize);
    let colors: Vec<Color> = image
        .pixels()
        .map(|p| [f64::from(p[0]), f64::from(p[1]), f64::from(p[2])])
        .collect();
    let neighbours = NeighbourWeights::compute(&colors, w, h);

    let (mut fg_gmm, mut bg_gmm) = initial_models(&colors, labels.labels());
    let mut components = vec![0usize; colors.len()];

    for iteration in 0..iterations {
        if cancel.is_cancelled() {
            log::info!("🛑 Refinement cancelled before iteration {}", iteration + 1);
            return Err(SegmenterError::Cancelled);
        }

        // Assign every pixel to its class model's best component, then refit
        for ((component, color), label) in components.iter_mut().zip(&colors).zip(labels.labels()) {
            let gmm = if label.is_foreground() { &fg_gmm } else { &bg_gmm };
            *component = gmm.most_likely_component(color);
        }
        let (fg_samples, fg_assign) = class_samples(&colors, &components, labels.labels(), true);
        let (bg_samples, bg_assign) = class_samples(&colors, &components, labels.labels(), false);
        fg_gmm.learn(&fg_samples, &fg_assign);
        bg_gmm.learn(&bg_samples, &bg_assign);

        let mut graph = build_graph(&colors, labels.labels(), &neighbours, w, h, &fg_gmm, &bg_gmm);
        let flow = graph.max_flow();
        let source_side = graph.source_side();

        let mut changed = 0usize;
        for (label, &is_fg) in labels.labels_mut().iter_mut().zip(&source_side) {
            if label.is_definite() {
                continue;
            }
            let next = if is_fg {
                SegLabel::ProbableForeground
            } else {
                SegLabel::ProbableBackground
            };
            if *label != next {
                *label = next;
                changed += 1;
            }
        }
        log::debug!(
            "✂️ GrabCut iteration {}: flow {:.1}, {} pixels relabelled",
            iteration + 1,
            flow,
            changed
        );
    }
    Ok(())
}

fn initial_models(colors: &[Color], labels: &[SegLabel]) -> (Gmm, Gmm) {
    let mut fg = Vec::new();
    let mut bg = Vec::new();
    for (color, label) in colors.iter().zip(labels) {
        if label.is_foreground() {
            fg.push(*color);
        } else {
            bg.push(*color);
        }
    }
    (Gmm::from_kmeans(&fg), Gmm::from_kmeans(&bg))
}

fn class_samples(
    colors: &[Color],
    components: &[usize],
    labels: &[SegLabel],
    foreground: bool,
) -> (Vec<Color>, Vec<usize>) {
    colors
        .iter()
        .zip(components)
        .zip(labels)
        .filter(|(_, label)| label.is_foreground() == foreground)
        .map(|((color, &component), _)| (*color, component))
        .unzip()
}

fn build_graph(
    colors: &[Color],
    labels: &[SegLabel],
    neighbours: &NeighbourWeights,
    width: usize,
    height: usize,
    fg_gmm: &Gmm,
    bg_gmm: &Gmm,
) -> FlowGraph {
    let mut graph = FlowGraph::new(colors.len(), colors.len() * 5);

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let (from_source, to_sink) = match labels[idx] {
                SegLabel::Foreground => (LAMBDA, 0.0),
                SegLabel::Background => (0.0, LAMBDA),
                SegLabel::ProbableForeground | SegLabel::ProbableBackground => {
                    let color = &colors[idx];
                    (
                        -bg_gmm.probability(color).max(f64::MIN_POSITIVE).ln(),
                        -fg_gmm.probability(color).max(f64::MIN_POSITIVE).ln(),
                    )
                }
            };
            graph.add_terminal_weights(idx, from_source, to_sink);

            for (n, &(dx, dy)) in NEIGHBOURS.iter().enumerate() {
                if let Some(other) = neighbour_index(x, y, dx, dy, width) {
                    let weight = neighbours.weights[idx][n];
                    graph.add_edge(idx, other, weight, weight);
                }
            }
        }
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn two_tone(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |_, y| {
            if y < height / 2 {
                Rgb([220, 40, 40])
            } else {
                Rgb([30, 60, 200])
            }
        })
    }

    #[test]
    fn test_beta_of_flat_image_is_zero() {
        let colors = vec![[5.0, 5.0, 5.0]; 16];
        assert_eq!(compute_beta(&colors, 4, 4), 0.0);
    }

    #[test]
    fn test_hard_labels_are_kept() {
        let image = two_tone(10, 10);
        let mut labels = LabelMap::filled(10, 10, SegLabel::ProbableBackground).unwrap();
        // Deliberately "wrong" hard labels
        labels.set(0, 9, SegLabel::Foreground);
        labels.set(0, 0, SegLabel::Background);

        grabcut(&image, &mut labels, 2, &CancelToken::new()).unwrap();
        assert_eq!(labels.get(0, 9), SegLabel::Foreground);
        assert_eq!(labels.get(0, 0), SegLabel::Background);
    }

    #[test]
    fn test_probable_pixels_follow_colour() {
        let image = two_tone(12, 12);
        let mut labels = LabelMap::filled(12, 12, SegLabel::ProbableBackground).unwrap();
        for x in 0..12 {
            labels.set(x, 1, SegLabel::Foreground);
            labels.set(x, 10, SegLabel::Background);
        }

        grabcut(&image, &mut labels, 2, &CancelToken::new()).unwrap();
        assert_eq!(labels.get(6, 3), SegLabel::ProbableForeground);
        assert_eq!(labels.get(6, 8), SegLabel::ProbableBackground);
    }

    #[test]
    fn test_missing_class_rejected() {
        let image = two_tone(4, 4);
        let mut labels = LabelMap::filled(4, 4, SegLabel::ProbableBackground).unwrap();
        let err = grabcut(&image, &mut labels, 1, &CancelToken::new()).unwrap_err();
        assert!(matches!(err, SegmenterError::InsufficientSeed(MissingClass::Foreground)));
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let image = two_tone(4, 4);
        let mut labels = LabelMap::filled(5, 4, SegLabel::Foreground).unwrap();
        let err = grabcut(&image, &mut labels, 1, &CancelToken::new()).unwrap_err();
        assert!(matches!(err, SegmenterError::SizeMismatch { .. }));
    }

    #[test]
    fn test_cancelled_before_first_iteration() {
        let image = two_tone(6, 6);
        let mut labels = LabelMap::filled(6, 6, SegLabel::ProbableBackground).unwrap();
        labels.set(0, 0, SegLabel::Foreground);
        let before = labels.clone();

        let token = CancelToken::new();
        token.cancel();
        let err = grabcut(&image, &mut labels, 2, &token).unwrap_err();
        assert!(matches!(err, SegmenterError::Cancelled));
        assert_eq!(labels, before);
    }
}
