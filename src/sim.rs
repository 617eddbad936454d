//! Simulated peripheral handles, for running the pipeline without hardware.

use crate::acquisition::{SampleTransfer, SampleTrigger, Sampler, Settle};
use crate::config;
use crate::scheduler::ByteSink;
use embedded_hal::blocking::delay::DelayUs;

#[derive(Default)]
pub struct SimTrigger {
    running: bool,
    starts: u32,
}

impl SimTrigger {
    pub fn running(&self) -> bool {
        self.running
    }

    pub fn starts(&self) -> u32 {
        self.starts
    }
}

impl SampleTrigger for SimTrigger {
    fn start(&mut self) {
        self.running = true;
        self.starts += 1;
    }
}

#[derive(Default)]
pub struct SimSampler {
    powered: bool,
}

impl SimSampler {
    pub fn powered(&self) -> bool {
        self.powered
    }
}

impl Sampler for SimSampler {
    fn power_up<S: Settle>(&mut self, settle: &mut S) {
        settle.settle(config::adc::POWER_UP_SETTLE);
        self.powered = true;
    }
}

/// Transfer engine which fills the whole buffer from `source` when armed,
/// and completes when `finish` is called.
pub struct SimTransfer<F> {
    source: F,
    enabled: bool,
    complete: bool,
    arms: u32,
    dropped_edges: u32,
}

impl<F: FnMut() -> u16> SimTransfer<F> {
    pub fn new(source: F) -> Self {
        Self {
            source,
            enabled: false,
            complete: false,
            arms: 0,
            dropped_edges: 0,
        }
    }

    /// Deliver the last conversion of the buffer.
    ///
    /// While the engine is disabled this is a dropped trigger edge instead, and returns `false`.
    pub fn finish(&mut self) -> bool {
        if !self.enabled {
            self.dropped_edges += 1;
            return false;
        }
        self.enabled = false;
        self.complete = true;
        true
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn arms(&self) -> u32 {
        self.arms
    }

    pub fn dropped_edges(&self) -> u32 {
        self.dropped_edges
    }
}

impl<F: FnMut() -> u16> SampleTransfer for SimTransfer<F> {
    fn arm(&mut self, buffer: &mut [u16]) {
        for sample in buffer {
            *sample = (self.source)();
        }
        self.arms += 1;
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn transfer_complete(&self) -> bool {
        self.complete
    }

    fn clear_transfer_complete(&mut self) {
        self.complete = false;
    }
}

/// Delay which only counts.
#[derive(Default)]
pub struct SimDelay {
    elapsed_us: u32,
}

impl SimDelay {
    pub fn elapsed_us(&self) -> u32 {
        self.elapsed_us
    }
}

impl DelayUs<u32> for SimDelay {
    fn delay_us(&mut self, us: u32) {
        self.elapsed_us += us;
    }
}

/// Output sink which accepts up to `capacity` bytes, then reports saturation.
pub struct SimSink {
    capacity: usize,
    bytes: usize,
    writes: usize,
}

impl SimSink {
    pub fn unbounded() -> Self {
        Self::with_capacity(usize::MAX)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            bytes: 0,
            writes: 0,
        }
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ByteSink for SimSink {
    fn send(&mut self, bytes: &[u8]) -> usize {
        self.writes += 1;
        let accepted = bytes.len().min(self.capacity - self.bytes);
        self.bytes += accepted;
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_before_arming_are_dropped() {
        let mut transfer = SimTransfer::new(|| 7);
        let mut buffer = [0; 4];

        assert!(!transfer.finish());
        assert_eq!(transfer.dropped_edges(), 1);

        transfer.arm(&mut buffer);
        assert_eq!(buffer, [7; 4]);
        assert!(transfer.finish());
        assert!(transfer.transfer_complete());

        // halted until re-armed
        assert!(!transfer.finish());
        assert_eq!(transfer.dropped_edges(), 2);
    }

    #[test]
    fn sampler_settles_before_calibration() {
        let mut sampler = SimSampler::default();
        let mut delay = SimDelay::default();
        assert!(!sampler.powered());

        sampler.power_up(&mut delay);

        assert!(sampler.powered());
        assert_eq!(delay.elapsed_us(), config::adc::POWER_UP_SETTLE.to_micros());
    }

    #[test]
    fn sink_accepts_up_to_capacity() {
        let mut sink = SimSink::with_capacity(5);
        assert_eq!(sink.send(b"abc"), 3);
        assert_eq!(sink.send(b"defg"), 2);
        assert_eq!(sink.send(b"h"), 0);
        assert_eq!(sink.bytes(), 5);
        assert_eq!(sink.writes(), 3);
    }
}
