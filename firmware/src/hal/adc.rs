use crate::hal::pins;
use fftserial::acquisition::{Sampler, Settle};
use fftserial::config;
use stm32f1xx_hal::device::{ADC1, RCC};
use stm32f1xx_hal::rcc::{Enable, Reset};

/// EXTSEL = TIM2 CC2 event
const CR2_EXTSEL_TIM2_CC2: u32 = 0b011 << 17;
const CR2_EXTSEL_MASK: u32 = 0b111 << 17;
const CR2_EXTTRIG: u32 = 1 << 20;
const CR2_ALIGN_LEFT: u32 = 1 << 11;
const CR2_DMA: u32 = 1 << 8;
const CR2_CONT: u32 = 1 << 1;
const CR1_SCAN: u32 = 1 << 8;
/// SQR1.L: number of conversions in the regular sequence, minus one
const SQR1_L_MASK: u32 = 0b1111 << 20;

/// ADC1 converting one channel per external trigger edge, with DMA requests enabled.
pub struct AdcSampler {
    adc: ADC1,
    _pin: pins::A0_ADC1C0,
}

impl AdcSampler {
    /// The converter stays powered down until `power_up`.
    #[allow(unused_unsafe)]
    pub fn new(adc: ADC1, pin: pins::A0_ADC1C0) -> Self {
        unsafe {
            //NOTE(unsafe) this reference will only be used for atomic writes with no side effects
            let rcc = &(*RCC::ptr());
            ADC1::enable(rcc);
            ADC1::reset(rcc);
        }

        // ADC should not run during configuration
        adc.cr2.modify(|_, w| w.adon().clear_bit());

        // single channel, no scan
        adc.cr1.modify(|r, w| unsafe { w.bits(r.bits() & !CR1_SCAN) });

        // sample time for the input channel
        let shift = 3 * u32::from(config::adc::CHANNEL);
        adc.smpr2.modify(|r, w| unsafe {
            w.bits((r.bits() & !(0b111 << shift)) | (u32::from(config::adc::SAMPLE_TIME_BITS) << shift))
        });

        // regular sequence of length 1
        adc.sqr1.modify(|r, w| unsafe { w.bits(r.bits() & !SQR1_L_MASK) });
        adc.sqr3.write(|w| unsafe { w.bits(u32::from(config::adc::CHANNEL)) });

        // right-aligned, single conversion, external trigger, DMA requests
        adc.cr2.modify(|r, w| unsafe {
            w.bits(
                (r.bits() & !(CR2_EXTSEL_MASK | CR2_ALIGN_LEFT | CR2_CONT))
                    | CR2_EXTSEL_TIM2_CC2
                    | CR2_EXTTRIG
                    | CR2_DMA,
            )
        });

        Self { adc, _pin: pin }
    }

    /// Address of the data register, for the transfer engine.
    pub fn data_register_address(&self) -> u32 {
        &self.adc.dr as *const _ as u32
    }
}

impl Sampler for AdcSampler {
    fn power_up<S: Settle>(&mut self, settle: &mut S) {
        self.adc.cr2.modify(|_, w| w.adon().set_bit());
        settle.settle(config::adc::POWER_UP_SETTLE);

        self.adc.cr2.modify(|_, w| w.rstcal().set_bit());
        while self.adc.cr2.read().rstcal().bit_is_set() {}

        self.adc.cr2.modify(|_, w| w.cal().set_bit());
        while self.adc.cr2.read().cal().bit_is_set() {}
    }
}
