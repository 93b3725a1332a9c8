//! Reduction of an extracted data block.
//!
//! The pipeline order is fixed: average over the flagged dimensions, squeeze
//! collapsed dimensions, scale by the data unit factor, then filter. Filters
//! operate on the already-reduced block so a smoothing sigma always refers
//! to indices of the plotted block.

use ndarray::{ArrayD, Axis};

use crate::selection::FilterMode;

/// Arithmetic mean over exactly the given dimensions, as one batched
/// reduction: sums are accumulated per remaining element and divided once by
/// the total count, so the result does not depend on the order the
/// dimensions are listed in. The output rank drops by `positions.len()`.
pub fn mean_over(block: ArrayD<f64>, positions: &[usize]) -> ArrayD<f64> {
    if positions.is_empty() {
        return block;
    }
    let count: usize = positions
        .iter()
        .map(|&p| block.len_of(Axis(p)))
        .product();

    // Summing from the highest position down keeps the remaining positions
    // stable while dimensions disappear.
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    let mut summed = block;
    for &position in sorted.iter().rev() {
        summed = summed.sum_axis(Axis(position));
    }
    summed.mapv_into(|v| v / count as f64)
}

/// Drop every length-1 dimension, keeping at least one dimension so a fully
/// collapsed block stays addressable as a single-element array.
pub fn squeeze(mut block: ArrayD<f64>) -> ArrayD<f64> {
    for position in (0..block.ndim()).rev() {
        if block.ndim() > 1 && block.len_of(Axis(position)) == 1 {
            block = block.index_axis_move(Axis(position), 0);
        }
    }
    block
}

/// Elementwise scale by the data unit factor.
pub fn scale(block: ArrayD<f64>, factor: f64) -> ArrayD<f64> {
    if factor == 1.0 {
        return block;
    }
    block.mapv_into(|v| v * factor)
}

/// Apply the selected filter to a reduced, unit-scaled block.
pub fn apply_filter(block: ArrayD<f64>, mode: FilterMode, sigma: f64) -> ArrayD<f64> {
    match mode {
        FilterMode::None => block,
        FilterMode::Lowpass => gaussian_smooth(&block, sigma),
        FilterMode::Highpass => {
            let lowpass = gaussian_smooth(&block, sigma);
            block - lowpass
        }
    }
}

/// Separable Gaussian smoothing along every dimension of the block.
///
/// The kernel standard deviation is `sigma` in index units, truncated at
/// four sigma and normalized; boundaries are handled by reflection.
pub fn gaussian_smooth(block: &ArrayD<f64>, sigma: f64) -> ArrayD<f64> {
    let kernel = gaussian_kernel(sigma);
    let mut smoothed = block.clone();
    for position in 0..smoothed.ndim() {
        smooth_along(&mut smoothed, Axis(position), &kernel);
    }
    smoothed
}

/// Normalized 1D Gaussian kernel of standard deviation `sigma`, truncated
/// at four sigma.
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (4.0 * sigma).ceil().max(1.0) as isize;
    let mut kernel = Vec::with_capacity((2 * radius + 1) as usize);
    for offset in -radius..=radius {
        let u = offset as f64 / sigma;
        kernel.push((-0.5 * u * u).exp());
    }
    let sum: f64 = kernel.iter().sum();
    for weight in &mut kernel {
        *weight /= sum;
    }
    kernel
}

/// Convolve every lane along `axis` with `kernel`, in place.
fn smooth_along(block: &mut ArrayD<f64>, axis: Axis, kernel: &[f64]) {
    let radius = (kernel.len() / 2) as isize;
    let mut lane_buf: Vec<f64> = Vec::new();
    for mut lane in block.lanes_mut(axis) {
        let len = lane.len() as isize;
        lane_buf.clear();
        lane_buf.extend(lane.iter().copied());
        for (i, value) in lane.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (k, &weight) in kernel.iter().enumerate() {
                let j = i as isize + k as isize - radius;
                acc += weight * lane_buf[reflect(j, len)];
            }
            *value = acc;
        }
    }
}

/// Reflect an out-of-range index back into `[0, len)`, edge-repeating:
/// `-1 -> 0`, `-2 -> 1`, `len -> len - 1`.
fn reflect(index: isize, len: isize) -> usize {
    let mut i = index;
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= len {
            i = 2 * len - i - 1;
        } else {
            return i as usize;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{ArrayD, IxDyn};

    fn block_3d() -> ArrayD<f64> {
        // shape (2, 3, 4), values 0..24 in row-major order
        ArrayD::from_shape_vec(IxDyn(&[2, 3, 4]), (0..24).map(f64::from).collect()).unwrap()
    }

    #[test]
    fn test_mean_over_drops_rank_by_count() {
        let reduced = mean_over(block_3d(), &[1]);
        assert_eq!(reduced.shape(), &[2, 4]);
        // mean over axis 1 at [0, 0] is mean of 0, 4, 8
        assert_relative_eq!(reduced[[0, 0]], 4.0);

        let reduced = mean_over(block_3d(), &[0, 2]);
        assert_eq!(reduced.shape(), &[3]);
    }

    #[test]
    fn test_mean_over_order_independent() {
        let forward = mean_over(block_3d(), &[0, 2]);
        let backward = mean_over(block_3d(), &[2, 0]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_mean_over_matches_elementwise_average() {
        let reduced = mean_over(block_3d(), &[0]);
        let block = block_3d();
        for i in 0..3 {
            for j in 0..4 {
                let expected = (block[[0, i, j]] + block[[1, i, j]]) / 2.0;
                assert_relative_eq!(reduced[[i, j]], expected);
            }
        }
    }

    #[test]
    fn test_squeeze_drops_unit_dimensions() {
        let block = ArrayD::from_shape_vec(IxDyn(&[1, 3, 1, 2]), vec![0.0; 6]).unwrap();
        let squeezed = squeeze(block);
        assert_eq!(squeezed.shape(), &[3, 2]);
    }

    #[test]
    fn test_squeeze_keeps_last_dimension() {
        let block = ArrayD::from_shape_vec(IxDyn(&[1, 1]), vec![7.0]).unwrap();
        let squeezed = squeeze(block);
        assert_eq!(squeezed.shape(), &[1]);
        assert_eq!(squeezed[[0]], 7.0);
    }

    #[test]
    fn test_scale() {
        let scaled = scale(block_3d(), 2.0);
        assert_relative_eq!(scaled[[0, 0, 1]], 2.0);
    }

    #[test]
    fn test_kernel_is_normalized_and_symmetric() {
        let kernel = gaussian_kernel(1.5);
        let sum: f64 = kernel.iter().sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        let n = kernel.len();
        for k in 0..n / 2 {
            assert_relative_eq!(kernel[k], kernel[n - 1 - k]);
        }
    }

    #[test]
    fn test_lowpass_preserves_constant_block() {
        let block = ArrayD::from_elem(IxDyn(&[8, 8]), 3.5);
        let smoothed = apply_filter(block, FilterMode::Lowpass, 2.0);
        for &v in smoothed.iter() {
            assert_relative_eq!(v, 3.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_highpass_removes_constant_offset() {
        let block = ArrayD::from_elem(IxDyn(&[16]), 2.0);
        let filtered = apply_filter(block, FilterMode::Highpass, 1.0);
        for &v in filtered.iter() {
            assert_relative_eq!(v, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_lowpass_reduces_peak() {
        let mut block = ArrayD::from_elem(IxDyn(&[15]), 0.0);
        block[[7]] = 1.0;
        let smoothed = apply_filter(block.clone(), FilterMode::Lowpass, 1.0);
        assert!(smoothed[[7]] < 1.0);
        assert!(smoothed[[6]] > 0.0);
        // mass is conserved under reflection handling
        assert_relative_eq!(smoothed.sum(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reflect() {
        assert_eq!(reflect(-1, 5), 0);
        assert_eq!(reflect(-2, 5), 1);
        assert_eq!(reflect(5, 5), 4);
        assert_eq!(reflect(6, 5), 3);
        assert_eq!(reflect(3, 5), 3);
    }
}
