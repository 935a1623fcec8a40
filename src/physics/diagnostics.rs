//! Numeric diagnostics over force fields.

use std::cmp::Ordering;

use glam::DVec3;

/// L2 norm of a per-vertex force field, sqrt(Σ |F_i|²)
pub fn l2_error_norm(forces: &[DVec3]) -> f64 {
    forces.iter().map(|f| f.length_squared()).sum::<f64>().sqrt()
}

/// Index of the median of the inclusive range [l, r]
fn median_index(l: usize, r: usize) -> usize {
    (r - l + 2) / 2 - 1 + l
}

/// Values near the top and bottom 1/128 quantiles of a descending-sorted slice
fn quantile_range(sorted: &[f64]) -> (f64, f64) {
    let n = sorted.len();
    let mid = median_index(0, n);

    let mut upper = mid;
    for _ in 0..6 {
        upper = median_index(0, upper);
    }

    let mut lower = median_index(mid + 1, n);
    for _ in 0..5 {
        lower = median_index(lower, n);
    }

    (sorted[upper], sorted[lower.min(n - 1)])
}

/// Whether the extremes lie further than `threshold` times the inner range
/// beyond the near-extreme quantiles
pub fn has_outlier(values: &[f64], threshold: f64) -> bool {
    if values.len() < 3 {
        return false;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));

    let (upper, lower) = quantile_range(&sorted);
    let range = upper - lower;
    sorted[0] - upper > threshold * range || lower - sorted[sorted.len() - 1] > threshold * range
}

/// Subtract the mean so the field exerts no net force
pub fn remove_translation(forces: &mut [DVec3]) {
    if forces.is_empty() {
        return;
    }
    let mean = forces.iter().sum::<DVec3>() / forces.len() as f64;
    for f in forces.iter_mut() {
        *f -= mean;
    }
}

/// Subtract the mean torque Σ x × F / n from every force
///
/// The torque is subtracted as if it were a force (the units differ by a
/// length), so the result is not torque-free in general.
pub fn remove_rotation(positions: &[DVec3], forces: &mut [DVec3]) {
    if forces.is_empty() {
        return;
    }
    let torque: DVec3 = positions
        .iter()
        .zip(forces.iter())
        .map(|(x, f)| x.cross(*f))
        .sum();
    let mean = torque / forces.len() as f64;
    for f in forces.iter_mut() {
        *f -= mean;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_error_norm() {
        let forces = [DVec3::new(3.0, 0.0, 0.0), DVec3::new(0.0, 0.0, 4.0)];
        assert_eq!(l2_error_norm(&forces), 5.0);
        assert_eq!(l2_error_norm(&[]), 0.0);
    }

    #[test]
    fn test_uniform_values_have_no_outlier() {
        let values: Vec<f64> = (0..200).map(|i| (i as f64 * 0.37).sin()).collect();
        assert!(!has_outlier(&values, 0.5));
        assert!(!has_outlier(&[1.0; 50], 0.5));
    }

    #[test]
    fn test_spike_is_an_outlier() {
        let mut values: Vec<f64> = (0..200).map(|i| (i as f64 * 0.37).sin()).collect();
        values[17] = 40.0;
        assert!(has_outlier(&values, 0.5));

        values[17] = 0.0;
        values[90] = -40.0;
        assert!(has_outlier(&values, 0.5));
    }

    #[test]
    fn test_quantile_indices_stay_in_bounds() {
        for n in 3..300 {
            let values: Vec<f64> = (0..n).map(|i| i as f64).collect();
            let _ = has_outlier(&values, 0.5);
        }
    }

    #[test]
    fn test_remove_translation() {
        let mut forces = vec![DVec3::X, DVec3::new(3.0, 2.0, 0.0)];
        remove_translation(&mut forces);
        assert_eq!(forces[0] + forces[1], DVec3::ZERO);
        assert_eq!(forces[0], DVec3::new(-1.0, -1.0, 0.0));
    }

    #[test]
    fn test_remove_rotation() {
        let positions = [DVec3::X, -DVec3::X];
        let mut forces = vec![DVec3::Y, -DVec3::Y];
        // Pure couple about z
        remove_rotation(&positions, &mut forces);
        assert_eq!(forces[0], DVec3::new(0.0, 1.0, -1.0));
        assert_eq!(forces[1], DVec3::new(0.0, -1.0, -1.0));
    }
}
