use embedded_hal::digital::v2::ToggleableOutputPin;

/// Divides a fast periodic tick down to a visible status LED blink.
pub struct Heartbeat {
    every: u32,
    count: u32,
}

impl Heartbeat {
    /// Toggle once per `every` ticks.
    pub const fn new(every: u32) -> Self {
        Self { every, count: 0 }
    }

    /// Count one tick, toggling `led` when the divider rolls over.
    ///
    /// Returns whether the LED was toggled.
    pub fn tick<P: ToggleableOutputPin>(&mut self, led: &mut P) -> bool {
        self.count += 1;
        if self.count < self.every {
            return false;
        }
        self.count = 0;
        // infallible on the target
        let _ = led.toggle();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    struct Led {
        toggles: u32,
    }

    impl ToggleableOutputPin for Led {
        type Error = Infallible;

        fn toggle(&mut self) -> Result<(), Self::Error> {
            self.toggles += 1;
            Ok(())
        }
    }

    #[test]
    fn toggles_once_per_period() {
        let mut led = Led { toggles: 0 };
        let mut heartbeat = Heartbeat::new(500);
        let toggled = (0..1750).filter(|_| heartbeat.tick(&mut led)).count();
        assert_eq!(toggled, 3);
        assert_eq!(led.toggles, 3);
    }

    #[test]
    fn period_of_one_toggles_every_tick() {
        let mut led = Led { toggles: 0 };
        let mut heartbeat = Heartbeat::new(1);
        for _ in 0..4 {
            assert!(heartbeat.tick(&mut led));
        }
        assert_eq!(led.toggles, 4);
    }
}
