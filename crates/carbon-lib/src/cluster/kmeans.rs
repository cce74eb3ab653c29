//! K-means over fixed-length feature vectors

use crate::stats::euclidean_distance;
use rand::Rng;

/// Outcome of one k-means run
#[derive(Debug, Clone)]
pub struct KMeansResult<const D: usize> {
    pub centroids: Vec<[f64; D]>,
    /// Cluster index of every input point, from the last assignment step
    pub assignments: Vec<usize>,
    pub iterations: usize,
    pub converged: bool,
}

/// Run k-means with centroids seeded by sampling input points
///
/// `points` must be non-empty and `k` at least 1. Empty clusters keep their
/// previous centroid. Stops when every centroid moves less than `tolerance`
/// or after `max_iterations` assignment steps.
pub fn run<const D: usize, R: Rng + ?Sized>(
    points: &[[f64; D]],
    k: usize,
    max_iterations: usize,
    tolerance: f64,
    rng: &mut R,
) -> KMeansResult<D> {
    let mut centroids: Vec<[f64; D]> = (0..k)
        .map(|_| points[rng.gen_range(0..points.len())])
        .collect();
    let mut assignments = vec![0; points.len()];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iterations {
        assign(points, &centroids, &mut assignments);
        let updated = recompute(points, &assignments, &centroids);
        iterations += 1;

        let settled = centroids
            .iter()
            .zip(&updated)
            .all(|(old, new)| euclidean_distance(old, new) < tolerance);
        centroids = updated;
        if settled {
            converged = true;
            break;
        }
    }

    KMeansResult {
        centroids,
        assignments,
        iterations,
        converged,
    }
}

/// Index of the nearest centroid; ties go to the lowest index
pub fn nearest<const D: usize>(point: &[f64; D], centroids: &[[f64; D]]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let distance = euclidean_distance(point, centroid);
        if distance < best_distance {
            best_distance = distance;
            best = i;
        }
    }
    best
}

fn assign<const D: usize>(points: &[[f64; D]], centroids: &[[f64; D]], assignments: &mut [usize]) {
    for (point, slot) in points.iter().zip(assignments.iter_mut()) {
        *slot = nearest(point, centroids);
    }
}

fn recompute<const D: usize>(
    points: &[[f64; D]],
    assignments: &[usize],
    previous: &[[f64; D]],
) -> Vec<[f64; D]> {
    let mut sums = vec![[0.0; D]; previous.len()];
    let mut counts = vec![0usize; previous.len()];
    for (point, &cluster) in points.iter().zip(assignments) {
        counts[cluster] += 1;
        for (sum, value) in sums[cluster].iter_mut().zip(point) {
            *sum += value;
        }
    }

    sums.into_iter()
        .zip(counts)
        .zip(previous)
        .map(|((sum, count), old)| {
            if count == 0 {
                return *old;
            }
            sum.map(|s| s / count as f64)
        })
        .collect()
}
