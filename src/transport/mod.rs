//! Transport Channel: a virtual serial port over the USB peripheral.
//!
//! The port is serviced by calling `SerialPort::poll` at a steady cadence.
//! Input arrives as lines (see `framing`), output is split into packet-sized frames (see `tx`).

use crate::acquisition::Settle;
use crate::config;
use embedded_hal::digital::v2::OutputPin;
use heapless::Vec;
use usb_device::bus::{UsbBus, UsbBusAllocator};
use usb_device::device::{UsbDevice, UsbDeviceBuilder, UsbDeviceState, UsbVidPid};
use usb_device::UsbError;

pub mod class;
pub mod control;
pub mod framing;
pub mod tx;

use class::SerialClass;
use control::LineCoding;

pub type Line = Vec<u8, { config::usb::RX_LINE_CAP }>;

pub struct SerialPort<'a, B: UsbBus> {
    class: SerialClass<'a, B>,
    device: UsbDevice<'a, B>,
}

impl<'a, B: UsbBus> SerialPort<'a, B> {
    pub fn new(alloc: &'a UsbBusAllocator<B>) -> Result<Self, UsbError> {
        // the class must allocate its endpoints before the device freezes the allocator
        let class = SerialClass::new(alloc, config::usb::ECHO)?;

        let device = UsbDeviceBuilder::new(alloc, UsbVidPid(config::usb::VID, config::usb::PID))
            .manufacturer(config::usb::MANUFACTURER)
            .product(config::usb::PRODUCT)
            .serial_number(config::usb::SERIAL_NUMBER)
            .device_class(control::USB_CLASS_CDC)
            .max_packet_size_0(config::usb::CONTROL_PACKET_SIZE)
            .device_release(config::usb::DEVICE_RELEASE)
            .max_power(config::usb::MAX_POWER_MA)
            .build();

        Ok(Self { class, device })
    }

    /// Service pending USB transactions. Never blocks.
    ///
    /// Returns whether any class event was handled.
    pub fn poll(&mut self) -> bool {
        self.device.poll(&mut [&mut self.class])
    }

    /// Poll for `config::usb::ENUMERATION_WINDOW`, so the host can enumerate the device
    /// before the periodic poll task takes over.
    ///
    /// Returns whether the device was configured within the window.
    pub fn enumerate<S: Settle>(&mut self, settle: &mut S) -> bool {
        let interval = config::usb::ENUMERATION_POLL_INTERVAL;
        let polls = config::usb::ENUMERATION_WINDOW.to_micros() / interval.to_micros();

        for _ in 0..polls {
            self.poll();
            if self.state() == UsbDeviceState::Configured {
                return true;
            }
            settle.settle(interval);
        }

        false
    }

    pub fn state(&self) -> UsbDeviceState {
        self.device.state()
    }

    /// The last completed line, if it has not been taken yet.
    pub fn receive_line(&mut self) -> Option<Line> {
        self.class.framer().take_line()
    }

    /// Send `bytes`, returning how many were sent before the endpoint filled up.
    pub fn send(&mut self, bytes: &[u8]) -> usize {
        tx::send_frames(&mut self.class, bytes)
    }

    pub fn line_coding(&self) -> LineCoding {
        self.class.line_coding()
    }

    pub fn dtr(&self) -> bool {
        self.class.dtr()
    }

    /// Bytes dropped so far because received lines exceeded `config::usb::RX_LINE_CAP`.
    pub fn dropped_rx_bytes(&mut self) -> u32 {
        self.class.framer().dropped_bytes()
    }
}

/// Hold D+ low for `config::usb::REENUMERATE_HOLD`, so the host sees a disconnect.
///
/// The caller must release the pin (return it to the USB peripheral) afterwards.
pub fn signal_disconnect<P: OutputPin, S: Settle>(d_plus: &mut P, settle: &mut S) {
    // infallible on the target
    let _ = d_plus.set_low();
    settle.settle(config::usb::REENUMERATE_HOLD);
}
