use fixed::types::U32F0;
use fixed_sqrt::FixedSqrt;
use num_complex::Complex;

/// Squared amplitude of a complex number.
///
/// Since integer exponentiation / rooting is monotonic,
/// comparing squared amplitudes is equivalent to comparing amplitudes,
/// and is more efficient, since it avoids a `sqrt` to compute the amplitude.
///
/// Cannot overflow: the largest possible value is `2 * 32768^2 = 2^31`.
pub fn amplitude_squared(x: Complex<i16>) -> u32 {
    let re_2 = i32::from(x.re).unsigned_abs().pow(2);
    let im_2 = i32::from(x.im).unsigned_abs().pow(2);
    re_2 + im_2
}

/// Square root of a large amplitude value.
///
/// Intended to be used with `amplitude_squared`, which returns large already-squared values.
/// Since all fractional bits are discarded, the result is the floor of the true root,
/// which is monotonic in its input.
pub fn amplitude_sqrt(x: u32) -> u16 {
    let x = U32F0::from_num(x);
    let sqrt = FixedSqrt::sqrt(x);
    // truncate sqrt, which should fit into half the bits
    let bits: u32 = sqrt.to_bits();
    let bits: u16 = bits.truncate();
    bits
}

/// Fixed point scaling.
///
/// The `factor` argument represents scaling from 0 (at `0`) to 1 (at `T::MAX`).
pub trait ScaleBy<Factor> {
    fn scale_by(self, by: Factor) -> Self;
}

macro_rules! impl_scaleby {
    ($this:ty, by: $factor:ty, via: $intermediate:ty) => {
        impl ScaleBy<$factor> for $this {
            fn scale_by(self, by: $factor) -> Self {
                #[allow(clippy::cast_possible_truncation, clippy::cast_lossless)]
                let scaled = ((self as $intermediate * by as $intermediate) >> <$factor>::BITS) as $this;
                scaled
            }
        }
    };
}

impl_scaleby!(u16, by: u16, via: u32);
impl_scaleby!(u32, by: u16, via: u64);

/// Integer truncation, checked in debug mode.
pub trait Truncate<To> {
    fn truncate(self) -> To;
}

macro_rules! impl_truncate {
    ($from:ty => $to:ty) => {
        const _: () = assert!(<$to>::BITS <= <$from>::BITS);

        impl Truncate<$to> for $from {
            fn truncate(self) -> $to {
                debug_assert!(self <= <$to>::MAX as $from);
                #[allow(clippy::cast_possible_truncation)]
                let truncated = self as $to;
                truncated
            }
        }
    };
}

impl_truncate!(usize => u16);
impl_truncate!(u32 => u16);
impl_truncate!(i32 => u16);
