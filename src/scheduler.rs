//! Pipeline Scheduler: runs one conditioning / transform / transmit pass per filled sample buffer.
//!
//! ```text
//!  Idle --start--> Armed --transfer complete--> Processing --re-arm--> Armed
//! ```
//!
//! A pass runs to completion once started. The transfer engine is disabled for the whole pass,
//! so a second transfer-complete event cannot arrive until the buffer has been re-armed.

use crate::acquisition::{SampleTransfer, SampleTrigger};
use crate::conditioner::{self, WindowTable};
use crate::config;
use crate::spectrum::{self, TransformKernel};
use core::fmt::Write;
use heapless::String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Not started yet
    Idle,
    /// Buffer filling
    Armed,
    /// Buffer full, pass in progress
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PipelineError {
    /// Transfer event without a completed transfer
    Spurious,
    /// Transfer event while not waiting for a buffer
    NotArmed(State),
}

/// Counters exposed for diagnostics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Diagnostics {
    /// Completed passes
    pub passes: u32,
    /// Transfer events that did not start a pass
    pub spurious_events: u32,
    /// Passes that took longer than one buffer period
    pub overruns: u32,
    /// Passes whose output was cut short because the transport was saturated
    pub saturated_passes: u32,
    /// Output lines that did not fit the line buffer
    pub truncated_lines: u32,
}

/// Outcome of one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PassReport {
    pub lines_sent: usize,
    pub bytes_sent: usize,
    /// Output stopped early because a line was not fully accepted
    pub saturated: bool,
}

/// Destination for formatted output.
pub trait ByteSink {
    /// Send `bytes`, returning how many were accepted.
    fn send(&mut self, bytes: &[u8]) -> usize;
}

impl<F: FnMut(&[u8]) -> usize> ByteSink for F {
    fn send(&mut self, bytes: &[u8]) -> usize {
        self(bytes)
    }
}

pub struct Pipeline<'a, K, const N: usize> {
    samples: &'a mut [u16; N],
    spectrum: &'a mut [u32; N],
    window: &'a WindowTable<N>,
    kernel: K,
    gain_percent: u16,
    state: State,
    diagnostics: Diagnostics,
}

impl<'a, K: TransformKernel<N>, const N: usize> Pipeline<'a, K, N> {
    pub fn new(
        samples: &'a mut [u16; N],
        spectrum: &'a mut [u32; N],
        window: &'a WindowTable<N>,
        kernel: K,
    ) -> Self {
        Self {
            samples,
            spectrum,
            window,
            kernel,
            gain_percent: config::conditioner::GAIN_PERCENT,
            state: State::Idle,
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    pub fn set_gain(&mut self, gain_percent: u16) {
        self.gain_percent = gain_percent;
    }

    /// Arm the transfer engine on the sample buffer, then start the trigger.
    ///
    /// The trigger starts last, so no edge reaches an unconfigured transfer.
    pub fn start(&mut self, transfer: &mut impl SampleTransfer, trigger: &mut impl SampleTrigger) {
        if self.state != State::Idle {
            warn!("Pipeline already started ({})", self.state);
            return;
        }
        transfer.clear_transfer_complete();
        transfer.arm(&mut self.samples[..]);
        self.state = State::Armed;
        trigger.start();
    }

    /// Handle a transfer-complete event: process the filled buffer, send the spectrum to `sink`,
    /// then re-arm `transfer` for the next buffer.
    #[inline(never)]
    pub fn on_transfer_complete(
        &mut self,
        transfer: &mut impl SampleTransfer,
        sink: &mut impl ByteSink,
    ) -> Result<PassReport, PipelineError> {
        if self.state != State::Armed {
            self.diagnostics.spurious_events = self.diagnostics.spurious_events.wrapping_add(1);
            return Err(PipelineError::NotArmed(self.state));
        }
        if !transfer.transfer_complete() {
            self.diagnostics.spurious_events = self.diagnostics.spurious_events.wrapping_add(1);
            return Err(PipelineError::Spurious);
        }

        // the buffer belongs to this pass until it is re-armed
        transfer.disable();
        self.state = State::Processing;

        conditioner::apply_gain(&mut self.samples[..], self.gain_percent);
        conditioner::apply_window(&mut *self.samples, self.window);
        spectrum::transform(&mut self.kernel, &*self.samples, &mut *self.spectrum);
        spectrum::magnitude(&mut self.spectrum[..N / 2]);

        if config::debug::LOG_SPECTRUM_PEAK {
            if let Some((bin, magnitude)) = spectrum::peak(&self.spectrum[..N / 2]) {
                debug!("Spectrum peak at bin {} ({})", bin, magnitude);
            }
        }

        let report = self.emit(sink);

        transfer.clear_transfer_complete();
        transfer.arm(&mut self.samples[..]);
        self.state = State::Armed;

        self.diagnostics.passes = self.diagnostics.passes.wrapping_add(1);
        if report.saturated {
            self.diagnostics.saturated_passes = self.diagnostics.saturated_passes.wrapping_add(1);
        }

        Ok(report)
    }

    /// Send one `"<bin> <magnitude>\r\n"` line per bin, stopping at the first line the sink does not accept.
    fn emit(&mut self, sink: &mut impl ByteSink) -> PassReport {
        let mut report = PassReport {
            lines_sent: 0,
            bytes_sent: 0,
            saturated: false,
        };

        for (i, magnitude) in self.spectrum[..N / 2].iter().enumerate() {
            let mut line: String<{ config::usb::OUTPUT_LINE_CAP }> = String::new();
            if write!(line, "{} {}\r\n", i, magnitude).is_err() {
                self.diagnostics.truncated_lines = self.diagnostics.truncated_lines.wrapping_add(1);
            }

            let sent = sink.send(line.as_bytes());
            report.bytes_sent += sent;
            if sent < line.len() {
                report.saturated = true;
                break;
            }
            report.lines_sent += 1;
        }

        report
    }

    /// Record how long the last pass took. Returns whether it overran the buffer period.
    pub fn record_pass_duration(&mut self, elapsed_us: u32) -> bool {
        let overrun = elapsed_us > config::adc::BUFFER_PERIOD_US;
        if overrun {
            self.diagnostics.overruns = self.diagnostics.overruns.wrapping_add(1);
        }
        overrun
    }
}
