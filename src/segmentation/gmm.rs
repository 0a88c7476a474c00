//! Gaussian mixture colour model with full 3x3 covariances.

/// Number of Gaussian components per class.
pub const COMPONENT_COUNT: usize = 5;

/// Added to the covariance diagonal when it is singular.
const COVARIANCE_REGULARIZATION: f64 = 0.01;

/// Lloyd iterations used when seeding the components.
const KMEANS_ITERATIONS: usize = 10;

/// An RGB colour as floating point.
pub type Color = [f64; 3];

#[derive(Debug, Clone, Copy, Default)]
struct Component {
    weight: f64,
    mean: Color,
    inverse_covariance: [[f64; 3]; 3],
    determinant: f64,
}

impl Component {
    /// Unweighted density, without the constant `(2π)^-3/2` factor.
    fn density(&self, color: &Color) -> f64 {
        if self.weight <= 0.0 {
            return 0.0;
        }
        let d = [
            color[0] - self.mean[0],
            color[1] - self.mean[1],
            color[2] - self.mean[2],
        ];
        let inv = &self.inverse_covariance;
        let mut mahalanobis = 0.0;
        for (i, row) in inv.iter().enumerate() {
            mahalanobis += d[i] * (row[0] * d[0] + row[1] * d[1] + row[2] * d[2]);
        }
        (-0.5 * mahalanobis).exp() / self.determinant.sqrt()
    }
}

/// Colour model of one class (foreground or background).
#[derive(Debug, Clone, Default)]
pub struct Gmm {
    components: [Component; COMPONENT_COUNT],
}

impl Gmm {
    /// Mixture density at `color`.
    pub fn probability(&self, color: &Color) -> f64 {
        self.components
            .iter()
            .map(|c| c.weight * c.density(color))
            .sum()
    }

    /// Index of the component that explains `color` best.
    pub fn most_likely_component(&self, color: &Color) -> usize {
        let mut best = 0;
        let mut best_density = f64::NEG_INFINITY;
        for (i, component) in self.components.iter().enumerate() {
            if component.weight <= 0.0 {
                continue;
            }
            let density = component.density(color);
            if density > best_density {
                best = i;
                best_density = density;
            }
        }
        best
    }

    /// Fit from samples and their component assignments.
    ///
    /// Components without samples get zero weight. With no samples at all the
    /// model is left unchanged.
    pub fn learn(&mut self, samples: &[Color], assignments: &[usize]) {
        let mut learner = GmmLearner::default();
        for (color, &component) in samples.iter().zip(assignments) {
            learner.add_sample(component, color);
        }
        learner.finish(self);
    }

    /// Build a model by clustering `samples` with k-means.
    pub fn from_kmeans(samples: &[Color]) -> Self {
        let assignments = kmeans(samples, COMPONENT_COUNT);
        let mut gmm = Gmm::default();
        gmm.learn(samples, &assignments);
        gmm
    }

    /// Number of components with non-zero weight.
    pub fn active_components(&self) -> usize {
        self.components.iter().filter(|c| c.weight > 0.0).count()
    }
}

/// Running sums for one learning pass.
#[derive(Debug, Default)]
struct GmmLearner {
    sums: [Color; COMPONENT_COUNT],
    products: [[[f64; 3]; 3]; COMPONENT_COUNT],
    counts: [usize; COMPONENT_COUNT],
    total: usize,
}

impl GmmLearner {
    fn add_sample(&mut self, component: usize, color: &Color) {
        let component = component.min(COMPONENT_COUNT - 1);
        for i in 0..3 {
            self.sums[component][i] += color[i];
            for j in 0..3 {
                self.products[component][i][j] += color[i] * color[j];
            }
        }
        self.counts[component] += 1;
        self.total += 1;
    }

    fn finish(self, gmm: &mut Gmm) {
        if self.total == 0 {
            return;
        }
        for (k, component) in gmm.components.iter_mut().enumerate() {
            let n = self.counts[k];
            if n == 0 {
                *component = Component::default();
                continue;
            }
            let n_f = n as f64;
            let mean = [
                self.sums[k][0] / n_f,
                self.sums[k][1] / n_f,
                self.sums[k][2] / n_f,
            ];
            let mut covariance = [[0.0; 3]; 3];
            for i in 0..3 {
                for j in 0..3 {
                    covariance[i][j] = self.products[k][i][j] / n_f - mean[i] * mean[j];
                }
            }

            let mut determinant = determinant3(&covariance);
            if determinant <= f64::EPSILON {
                for (i, row) in covariance.iter_mut().enumerate() {
                    row[i] += COVARIANCE_REGULARIZATION;
                }
                determinant = determinant3(&covariance);
            }

            *component = Component {
                weight: n_f / self.total as f64,
                mean,
                inverse_covariance: inverse3(&covariance, determinant),
                determinant,
            };
        }
    }
}

fn determinant3(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

fn inverse3(m: &[[f64; 3]; 3], det: f64) -> [[f64; 3]; 3] {
    let inv_det = 1.0 / det;
    [
        [
            (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det,
            (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det,
            (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
        ],
        [
            (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det,
            (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
            (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det,
        ],
        [
            (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det,
            (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det,
            (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det,
        ],
    ]
}

fn distance_sq(a: &Color, b: &Color) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}

/// Deterministic k-means: farthest-point seeding followed by Lloyd iterations.
/// Returns the cluster index of every sample.
fn kmeans(samples: &[Color], k: usize) -> Vec<usize> {
    if samples.is_empty() {
        return Vec::new();
    }

    let mut centers: Vec<Color> = vec![samples[0]];
    let mut nearest: Vec<f64> = samples.iter().map(|s| distance_sq(s, &samples[0])).collect();
    while centers.len() < k {
        let (farthest, &dist) = nearest
            .iter()
            .enumerate()
            .fold((0, &f64::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best });
        if dist <= 0.0 {
            break;
        }
        let center = samples[farthest];
        for (n, s) in nearest.iter_mut().zip(samples) {
            *n = n.min(distance_sq(s, &center));
        }
        centers.push(center);
    }

    let mut assignments = vec![0; samples.len()];
    for _ in 0..KMEANS_ITERATIONS {
        let mut changed = false;
        for (assignment, sample) in assignments.iter_mut().zip(samples) {
            let closest = centers
                .iter()
                .enumerate()
                .map(|(i, c)| (i, distance_sq(sample, c)))
                .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
                .0;
            if *assignment != closest {
                *assignment = closest;
                changed = true;
            }
        }

        let mut sums = vec![[0.0; 3]; centers.len()];
        let mut counts = vec![0usize; centers.len()];
        for (&a, s) in assignments.iter().zip(samples) {
            for i in 0..3 {
                sums[a][i] += s[i];
            }
            counts[a] += 1;
        }
        for ((center, sum), &count) in centers.iter_mut().zip(&sums).zip(&counts) {
            if count > 0 {
                let n = count as f64;
                *center = [sum[0] / n, sum[1] / n, sum[2] / n];
            }
        }

        if !changed {
            break;
        }
    }
    assignments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(center: Color, count: usize) -> Vec<Color> {
        (0..count)
            .map(|i| {
                let jitter = (i % 7) as f64 - 3.0;
                [center[0] + jitter, center[1] - jitter, center[2] + jitter * 0.5]
            })
            .collect()
    }

    #[test]
    fn test_kmeans_separates_clusters() {
        let mut samples = cluster([20.0, 20.0, 20.0], 50);
        samples.extend(cluster([230.0, 230.0, 230.0], 50));

        let assignments = kmeans(&samples, 2);
        let first = assignments[0];
        assert!(assignments[..50].iter().all(|&a| a == first));
        assert!(assignments[50..].iter().all(|&a| a != first));
    }

    #[test]
    fn test_kmeans_fewer_distinct_samples_than_clusters() {
        let samples = vec![[10.0, 10.0, 10.0]; 8];
        let assignments = kmeans(&samples, COMPONENT_COUNT);
        assert!(assignments.iter().all(|&a| a == 0));

        let gmm = Gmm::from_kmeans(&samples);
        assert_eq!(gmm.active_components(), 1);
        assert!(gmm.probability(&[10.0, 10.0, 10.0]).is_finite());
    }

    #[test]
    fn test_probability_prefers_own_colors() {
        let red = Gmm::from_kmeans(&cluster([200.0, 40.0, 40.0], 60));
        let blue = Gmm::from_kmeans(&cluster([40.0, 40.0, 200.0], 60));

        let sample = [198.0, 42.0, 39.0];
        assert!(red.probability(&sample) > blue.probability(&sample));
    }

    #[test]
    fn test_learn_without_samples_keeps_model() {
        let mut gmm = Gmm::from_kmeans(&cluster([100.0, 100.0, 100.0], 30));
        let before = gmm.probability(&[100.0, 100.0, 100.0]);
        gmm.learn(&[], &[]);
        assert_eq!(gmm.probability(&[100.0, 100.0, 100.0]), before);
    }

    #[test]
    fn test_inverse_of_diagonal() {
        let m = [[2.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 8.0]];
        let det = determinant3(&m);
        assert_eq!(det, 64.0);
        let inv = inverse3(&m, det);
        assert!((inv[0][0] - 0.5).abs() < 1e-12);
        assert!((inv[1][1] - 0.25).abs() < 1e-12);
        assert!((inv[2][2] - 0.125).abs() < 1e-12);
    }
}
