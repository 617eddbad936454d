//! Gain and windowing applied to each sample buffer before the transform.

use crate::config;
use crate::math::{ScaleBy, Truncate};
use fixed::types::I32F32;

/// Scale samples around the conversion midpoint by `gain_percent / 100`, clipping to the conversion range.
///
/// Gains above `config::conditioner::MAX_GAIN_PERCENT` are clamped.
#[inline(never)]
pub fn apply_gain(samples: &mut [u16], gain_percent: u16) {
    let gain = i32::from(gain_percent.min(config::conditioner::MAX_GAIN_PERCENT));
    let midpoint = i32::from(config::adc::MIDPOINT);
    let max = i32::from(config::adc::MAX_SAMPLE);

    for sample in samples {
        let centered = i32::from(*sample) - midpoint;
        let scaled = midpoint + centered * gain / 100;
        *sample = scaled.clamp(0, max).truncate();
    }
}

/// Window weights, where `u16::MAX` represents a weight of 1.
///
/// Built once at startup and only read afterwards.
#[derive(Clone)]
pub struct WindowTable<const N: usize> {
    weights: [u16; N],
}

impl<const N: usize> WindowTable<N> {
    pub fn weights(&self) -> &[u16; N] {
        &self.weights
    }
}

/// Hamming window: `0.54 - 0.46 * cos(2 pi i / (N - 1))`.
pub fn hamming<const N: usize>() -> WindowTable<N> {
    let alpha = I32F32::from_num(0.54);
    let beta = I32F32::from_num(0.46);
    let full_scale = I32F32::from_num(u16::MAX);
    let denominator = I32F32::from_num(N.saturating_sub(1).max(1));

    let mut weights = [0; N];
    for (i, weight) in weights.iter_mut().enumerate() {
        let angle = I32F32::from_num(2 * i) * I32F32::PI / denominator;
        let w = alpha - beta * cordic::cos(angle);
        *weight = (w * full_scale).saturating_to_num::<u16>();
    }
    WindowTable { weights }
}

/// Multiply each sample by its window weight, in place.
#[inline(never)]
pub fn apply_window<const N: usize>(samples: &mut [u16; N], window: &WindowTable<N>) {
    for (sample, &weight) in samples.iter_mut().zip(window.weights()) {
        *sample = sample.scale_by(weight);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gain_output_stays_in_conversion_range() {
        let inputs = [0, 1, 1000, 2047, 2048, 2049, 3000, 4094, 4095];
        for gain in [0, 1, 50, 99, 100, 101, 150, 400, 1000, 5000, u16::MAX] {
            let mut samples = inputs;
            apply_gain(&mut samples, gain);
            for &s in &samples {
                assert!(s <= config::adc::MAX_SAMPLE, "gain {} produced {}", gain, s);
            }
        }
    }

    #[test]
    fn unity_gain_is_identity() {
        let mut samples: [u16; 64] = core::array::from_fn(|i| (i * 64) as u16);
        let expected = samples;
        apply_gain(&mut samples, 100);
        assert_eq!(samples, expected);
    }

    #[test]
    fn gain_scales_around_midpoint() {
        let mut samples = [2048, 2148, 1948, 4000, 0];
        apply_gain(&mut samples, 150);
        assert_eq!(samples, [2048, 2198, 1898, 4095, 0]);

        let mut samples = [2048, 2148, 1948];
        apply_gain(&mut samples, 0);
        assert_eq!(samples, [2048, 2048, 2048]);
    }

    #[test]
    fn window_tapers_at_edges() {
        let window = hamming::<1024>();
        let w = window.weights();
        let mid = w[511].max(w[512]);
        assert!(mid > 65_000, "mid {}", mid);
        assert!(w[0] < mid / 8, "first {}", w[0]);
        assert!(w[1023] < mid / 8, "last {}", w[1023]);
        // 0.08 of full scale
        assert!((5_000..5_500).contains(&w[0]), "first {}", w[0]);
    }

    #[test]
    fn window_is_symmetric() {
        let window = hamming::<256>();
        let w = window.weights();
        for i in 0..128 {
            let diff = i32::from(w[i]) - i32::from(w[255 - i]);
            assert!(diff.abs() <= 2, "{}: {} vs {}", i, w[i], w[255 - i]);
        }
    }

    #[test]
    fn window_is_a_pure_function_of_length() {
        assert_eq!(hamming::<128>().weights(), hamming::<128>().weights());
    }

    #[test]
    fn window_scales_samples() {
        let mut window = hamming::<4>();
        window.weights = [u16::MAX, u16::MAX / 2 + 1, 0, u16::MAX];
        let mut samples = [4000, 4000, 4000, 0];
        apply_window(&mut samples, &window);
        assert_eq!(samples, [3999, 2000, 0, 0]);
    }
}
