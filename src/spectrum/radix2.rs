use crate::config;
use crate::spectrum::{pack, unpack, TransformKernel};
use num_complex::Complex;

const N: usize = config::fft::LEN;
const N_LOG2: usize = usize::BITS as usize - 1 - N.leading_zeros() as usize;
const _: () = assert!(N.is_power_of_two());

const SCALE: i16 = 1;

static SIN_TABLE: [i16; N * 3 / 4] = {
    const SIN_TABLE: [i16; N] = include!(concat!(env!("OUT_DIR"), "/fft_sin_table.rs"));

    let mut sin = [0; N * 3 / 4];

    let mut i = 0;
    while i < sin.len() {
        sin[i] = SIN_TABLE[i];

        i += 1;
    }

    sin
};

/// Fixed point radix-2 FFT, scaled by `1/N`.
///
/// Based on fix_fft.c: https://gist.github.com/Tomwi/3842231
pub struct Radix2;

impl TransformKernel<N> for Radix2 {
    fn transform(&mut self, bins: &mut [u32; N]) {
        radix2(bins);
    }
}

#[inline(never)]
fn radix2(f: &mut [u32; N]) {
    // decimation in time - re-order data
    let mut mr = 0;
    for m in 1..N {
        let l = isolate_highest_set_bit(N - 1 - mr);
        mr = (mr & (l - 1)) + l;
        if mr > m {
            f.swap(m, mr);
        }
    }

    // specialize code for each stage
    fn run_stage<const STAGE: usize>(f: &mut [u32; N]) {
        let inverse_stage = N_LOG2 - 1 - STAGE;
        let stride = 1 << STAGE;
        let step = stride << 1;
        for m in 0..stride {
            // compute twiddle factors
            let iw = m << inverse_stage;
            let wr = i32::from(SIN_TABLE[iw + N / 4] >> SCALE);
            let wi = i32::from(-SIN_TABLE[iw] >> SCALE);
            #[allow(clippy::cast_possible_truncation)]
            (m..N).step_by(step).for_each(|i| {
                let j = i + stride;
                let (fi, fj) = (unpack(f[i]), unpack(f[j]));
                // apply twiddle factors
                // round up based on the last bit that's about to be shifted out
                let round = 1 << 14;
                let tr = (((wr * i32::from(fj.re) - wi * i32::from(fj.im)) + round) >> 15) as i16;
                let ti = (((wr * i32::from(fj.im) + wi * i32::from(fj.re)) + round) >> 15) as i16;
                // fixed scaling, for proper normalization --
                // there will be log2(n) passes, so this results
                // in an overall factor of 1/n, distributed to
                // maximize arithmetic accuracy.
                let qr = fi.re >> SCALE;
                let qi = fi.im >> SCALE;
                f[j] = pack(Complex::new(qr - tr, qi - ti));
                f[i] = pack(Complex::new(qr + tr, qi + ti));
            });
        }
    }

    run_stage::<0>(f);
    run_stage::<1>(f);
    run_stage::<2>(f);
    run_stage::<3>(f);
    run_stage::<4>(f);
    run_stage::<5>(f);
    run_stage::<6>(f);
    run_stage::<7>(f);
    run_stage::<8>(f);
    run_stage::<9>(f);
    const _: () = assert!(N_LOG2 == 10);
}

fn isolate_highest_set_bit(x: usize) -> usize {
    (1 << (usize::BITS - 1)) >> x.leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_spreads_evenly() {
        let mut bins = [0; N];
        bins[0] = pack(Complex::new(i16::MAX, 0));
        Radix2.transform(&mut bins);
        // i16::MAX / 1024, truncated at each stage
        for &bin in &bins {
            assert_eq!(unpack(bin), Complex::new(31, 0));
        }
    }

    #[test]
    fn constant_input_lands_in_dc() {
        let mut bins = [pack(Complex::new(8192, 0)); N];
        Radix2.transform(&mut bins);
        assert_eq!(unpack(bins[0]), Complex::new(8192, 0));
        for &bin in &bins[1..] {
            let c = unpack(bin);
            assert!(c.re.abs() <= 1 && c.im.abs() <= 1, "{:?}", c);
        }
    }
}
