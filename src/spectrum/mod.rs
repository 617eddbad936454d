//! Spectral Analyzer: packs conditioned samples for the transform kernel,
//! then reduces the kernel's complex output to per-bin magnitudes.
//!
//! Bins are exchanged with the kernel as packed 32-bit words:
//! the signed real part in the low half, the signed imaginary part in the high half.

use crate::config;
use crate::math::{amplitude_sqrt, amplitude_squared};
use num_complex::Complex;

pub mod radix2;

/// Fixed-length, in-place transform over packed complex bins.
///
/// Implementations must be pure: no state may carry over between calls.
pub trait TransformKernel<const N: usize> {
    fn transform(&mut self, bins: &mut [u32; N]);
}

pub fn pack(bin: Complex<i16>) -> u32 {
    let [re0, re1] = bin.re.to_le_bytes();
    let [im0, im1] = bin.im.to_le_bytes();
    u32::from_le_bytes([re0, re1, im0, im1])
}

pub fn unpack(word: u32) -> Complex<i16> {
    let [re0, re1, im0, im1] = word.to_le_bytes();
    Complex::new(i16::from_le_bytes([re0, re1]), i16::from_le_bytes([im0, im1]))
}

/// Run `kernel` over the conditioned `input`, leaving the complex spectrum in `spectrum`.
#[inline(never)]
pub fn transform<K, const N: usize>(kernel: &mut K, input: &[u16; N], spectrum: &mut [u32; N])
where
    K: TransformKernel<N>,
{
    for (bin, &sample) in spectrum.iter_mut().zip(input) {
        // conditioned samples never exceed the conversion range, so this only saturates on bad input
        let re = i16::try_from(sample << config::fft::INPUT_SHIFT).unwrap_or(i16::MAX);
        *bin = pack(Complex::new(re, 0));
    }
    kernel.transform(spectrum);
}

/// Overwrite each packed complex bin with its (integer) magnitude.
#[inline(never)]
pub fn magnitude(bins: &mut [u32]) {
    for bin in bins {
        *bin = u32::from(amplitude_sqrt(amplitude_squared(unpack(*bin))));
    }
}

/// First bin outside the window's main lobe around DC.
/// With the input offset at the conversion midpoint, bins below this are dominated by that offset.
pub const FIRST_SIGNAL_BIN: usize = 2;

/// Strongest bin, ignoring DC and its leakage into the neighbouring bin.
pub fn peak(magnitudes: &[u32]) -> Option<(usize, u32)> {
    magnitudes
        .iter()
        .copied()
        .enumerate()
        .skip(FIRST_SIGNAL_BIN)
        .max_by_key(|&(_, m)| m)
}

#[cfg(test)]
mod tests {
    use super::radix2::Radix2;
    use super::*;

    const N: usize = config::fft::LEN;

    #[test]
    fn packing_puts_real_part_in_low_half() {
        assert_eq!(pack(Complex::new(1, 0)), 0x0000_0001);
        assert_eq!(pack(Complex::new(0, 1)), 0x0001_0000);
        assert_eq!(pack(Complex::new(-1, 0)), 0x0000_ffff);
        assert_eq!(unpack(0xffff_8000), Complex::new(i16::MIN, -1));
    }

    #[test]
    fn magnitude_of_packed_bins() {
        let mut bins = [
            pack(Complex::new(3, 4)),
            pack(Complex::new(-3, -4)),
            pack(Complex::new(0, 0)),
            pack(Complex::new(i16::MIN, 0)),
        ];
        magnitude(&mut bins);
        assert_eq!(bins, [5, 5, 0, 32768]);
    }

    #[test]
    fn silence_yields_zero_spectrum() {
        let input = [0; N];
        let mut spectrum = [u32::MAX; N];
        transform(&mut Radix2, &input, &mut spectrum);
        magnitude(&mut spectrum[..config::fft::BINS]);
        assert!(spectrum[..config::fft::BINS].iter().all(|&m| m == 0));
    }

    #[test]
    fn tone_peaks_at_its_bin() {
        for k in [2, 37, 100, 511] {
            let input: [u16; N] = core::array::from_fn(|i| {
                let phase = 2.0 * core::f64::consts::PI * (k * i) as f64 / N as f64;
                (2048.0 + 1000.0 * phase.cos()).round() as u16
            });
            let mut spectrum = [0; N];
            transform(&mut Radix2, &input, &mut spectrum);
            magnitude(&mut spectrum[..config::fft::BINS]);
            let (bin, mag) = peak(&spectrum[..config::fft::BINS]).unwrap();
            assert_eq!(bin, k);
            // half the amplitude of the (shifted) tone lands in each of the two mirrored bins
            let expected = (1000u32 << config::fft::INPUT_SHIFT) / 2;
            assert!(mag.abs_diff(expected) < expected / 50, "bin {}: {}", k, mag);
        }
    }

    #[test]
    fn peak_ignores_dc_lobe() {
        assert_eq!(peak(&[100, 3, 7, 2]), Some((2, 7)));
        assert_eq!(peak(&[100, 50, 7, 2]), Some((2, 7)));
        assert_eq!(peak(&[100, 50]), None);
    }
}
