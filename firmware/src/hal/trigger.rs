use fftserial::acquisition::{SampleTrigger, TriggerTiming};
use stm32f1xx_hal::device::{RCC, TIM2};
use stm32f1xx_hal::rcc::{Enable, Reset};
use stm32f1xx_hal::timer::Ocm;

/// TIM2 producing a compare event on channel 2 once per period,
/// which the ADC uses as its external trigger (EXTSEL = TIM2_CC2).
pub struct Tim2Trigger {
    tim: TIM2,
}

impl Tim2Trigger {
    /// `timing` must be derived from the TIM2 clock.
    pub fn new(tim: TIM2, timing: TriggerTiming) -> Self {
        unsafe {
            //NOTE(unsafe) this reference will only be used for atomic writes with no side effects
            let rcc = &(*RCC::ptr());
            // Enable and reset the timer peripheral
            TIM2::enable(rcc);
            TIM2::reset(rcc);
        }

        let t = Self { tim };
        t.configure(timing);
        t
    }

    #[allow(unused_unsafe)]
    fn configure(&self, timing: TriggerTiming) {
        assert!(timing.prescaler > 0 && timing.period > 1);

        // both registers hold the divisor minus one
        self.tim
            .psc
            .write(|w| unsafe { w.bits(u32::from(timing.prescaler - 1)) });
        self.tim
            .arr
            .write(|w| unsafe { w.bits(u32::from(timing.period - 1)) });

        // 0 -> 1 at CCR, so the compare event fires once per period
        self.tim
            .ccmr1_output()
            .modify(|_, w| w.oc2pe().set_bit().oc2m().bits(Ocm::PwmMode1 as _));
        self.tim
            .ccr2
            .write(|w| unsafe { w.bits(u32::from(timing.period - 1)) });
        self.tim.ccer.modify(|_, w| w.cc2e().set_bit());

        // Enable preload for ARR, and load PSC / ARR / CCR now
        self.tim.cr1.modify(|_, w| w.arpe().set_bit());
        self.tim.egr.write(|w| w.ug().set_bit());
    }
}

impl SampleTrigger for Tim2Trigger {
    fn start(&mut self) {
        self.tim.cr1.modify(|_, w| w.cen().set_bit());
    }
}
