//! Peripheral handles for the Acquisition Trigger, the sampler and the Sample Transfer Engine.
//!
//! The firmware implements these on top of TIM2, ADC1 and DMA1 channel 1;
//! `crate::sim` implements them for host tests.

use embedded_hal::blocking::delay::DelayUs;
use fugit::MicrosDurationU32;

/// Periodic hardware trigger that starts one conversion per edge.
pub trait SampleTrigger {
    /// Start producing edges. Must only be called once the sampler and transfer engine are ready.
    fn start(&mut self);
}

/// Sampler which converts on each trigger edge.
pub trait Sampler {
    /// Power on the converter and calibrate it.
    fn power_up<S: Settle>(&mut self, settle: &mut S);
}

/// One-shot transfer of conversions into a sample buffer.
///
/// After `arm`, the engine owns the buffer until it raises transfer-complete;
/// it then halts and must be re-armed for the next buffer.
pub trait SampleTransfer {
    /// Point the engine at `buffer`, reset the transfer length, and enable it.
    fn arm(&mut self, buffer: &mut [u16]);
    /// Disable the engine. Trigger edges arriving while disabled are dropped.
    fn disable(&mut self);
    fn transfer_complete(&self) -> bool;
    fn clear_transfer_complete(&mut self);
}

/// Wait for a peripheral to settle.
pub trait Settle {
    fn settle(&mut self, duration: MicrosDurationU32);
}

impl<D: DelayUs<u32>> Settle for D {
    fn settle(&mut self, duration: MicrosDurationU32) {
        self.delay_us(duration.to_micros());
    }
}

/// Prescaler and period for a timer producing one edge every `prescaler * period` clock ticks.
///
/// Both are stored as divisors, i.e. the register values are one less.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TriggerTiming {
    pub prescaler: u16,
    pub period: u16,
}

impl TriggerTiming {
    /// Smallest prescaler which divides the edge interval evenly
    /// and leaves a period that fits into the 16-bit auto-reload register.
    ///
    /// Falls back to an inexact period when no such prescaler exists; check with `is_exact`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_lossless)]
    pub const fn for_rate(clock_hz: u32, rate_hz: u32) -> Self {
        let ticks = clock_hz / rate_hz;
        let min_prescaler = ticks / (u16::MAX as u32 + 1) + 1;
        let mut prescaler = min_prescaler;
        while ticks % prescaler != 0 {
            prescaler += 1;
            if prescaler > u16::MAX as u32 {
                prescaler = min_prescaler;
                break;
            }
        }
        let period = ticks / prescaler;
        Self {
            prescaler: prescaler as u16,
            period: period as u16,
        }
    }

    #[allow(clippy::cast_lossless)]
    pub const fn ticks(&self) -> u32 {
        self.prescaler as u32 * self.period as u32
    }

    /// Whether this timing produces exactly `rate_hz` from `clock_hz`.
    #[allow(clippy::cast_lossless)]
    pub const fn is_exact(&self, clock_hz: u32, rate_hz: u32) -> bool {
        self.ticks() as u64 * rate_hz as u64 == clock_hz as u64
    }
}
