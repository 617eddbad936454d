//! Register-level peripheral handles, and extensions to the `stm32f1xx-hal` Hardware Abstraction Layer.

pub mod adc;
pub mod dma;
pub mod trigger;

#[allow(non_camel_case_types)]
pub mod pins {
    use stm32f1xx_hal::gpio::{Analog, Output, Pin, PushPull};

    /// Analog input
    pub type A0_ADC1C0 = Pin<'A', 0, Analog>;

    /// USB D+, driven low at startup so the host re-enumerates
    pub type A12_USB_DP_PULLDOWN = Pin<'A', 12, Output<PushPull>>;

    /// Status LED output (blinks while USB is being polled)
    pub type C13_STATUS_LED = Pin<'C', 13, Output<PushPull>>;
}
