#![no_main]
#![no_std]
#![allow(
    clippy::assertions_on_constants,
    clippy::let_and_return,
    clippy::let_unit_value,
    clippy::redundant_pattern_matching,
    clippy::type_complexity
)]
#![warn(
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::ptr_as_ptr
)]

use defmt_rtt as _; // global logger
use stm32f1xx_hal as _; // memory layout

use panic_probe as _; // panicking-behavior

// same panicking *behavior* as `panic-probe` but doesn't print a panic message
// this prevents the panic message being printed *twice* when `defmt::panic` is invoked
#[defmt::panic_handler]
fn panic() -> ! {
    cortex_m::asm::udf()
}

mod hal;

#[rtic::app(device = stm32f1xx_hal::pac, peripherals = true)]
mod app {
    use crate::hal::adc::AdcSampler;
    use crate::hal::dma::AdcTransfer;
    use crate::hal::pins;
    use crate::hal::trigger::Tim2Trigger;
    use cortex_m::singleton;
    use dwt_systick_monotonic::DwtSystick;
    use embedded_hal::blocking::delay::DelayUs;
    use fftserial::acquisition::Sampler;
    use fftserial::conditioner::{self, WindowTable};
    use fftserial::config;
    use fftserial::indicator::Heartbeat;
    use fftserial::scheduler::Pipeline;
    use fftserial::spectrum::radix2::Radix2;
    use fftserial::transport::{self, tx, SerialPort};
    use stm32f1xx_hal::device::TIM4;
    use stm32f1xx_hal::gpio::PinState;
    use stm32f1xx_hal::prelude::*;
    use stm32f1xx_hal::timer::{CounterHz, Event};
    use stm32f1xx_hal::usb::{Peripheral, UsbBus, UsbBusType};
    use usb_device::bus::UsbBusAllocator;

    #[shared]
    struct Shared {
        serial: SerialPort<'static, UsbBusType>,
    }

    #[local]
    struct Local {
        pipeline: Pipeline<'static, Radix2, { config::fft::LEN }>,
        transfer: AdcTransfer,
        poll_timer: CounterHz<TIM4>,
        status_led: pins::C13_STATUS_LED,
        heartbeat: Heartbeat,
    }

    #[init]
    fn init(mut cx: init::Context) -> (Shared, Local, init::Monotonics) {
        defmt::info!("Dumping config...");

        config::dump_to_log();

        defmt::info!("Starting init...");

        let dma1 = cx.device.DMA1.split();
        let mut flash = cx.device.FLASH.constrain();
        let mut gpioa = cx.device.GPIOA.split();
        let mut gpioc = cx.device.GPIOC.split();
        let rcc = cx.device.RCC.constrain();

        defmt::info!("Configuring clocks...");

        let clocks = rcc
            .cfgr
            .use_hse(config::clk::HSE_FREQ)
            .sysclk(config::clk::SYSCLK)
            .pclk1(config::clk::PCLK1)
            .pclk2(config::clk::PCLK2)
            .adcclk(config::clk::ADCCLK)
            .freeze(&mut flash.acr);

        assert!(config::clk::SYSCLK == clocks.sysclk());
        assert!(config::clk::PCLK1 == clocks.pclk1());
        assert!(config::clk::PCLK2 == clocks.pclk2());
        assert!(config::clk::ADCCLK == clocks.adcclk());
        assert!(config::clk::TIM2CLK_HZ == clocks.pclk1_tim().to_Hz());
        assert!(clocks.usbclk_valid());

        // blocking delay for peripheral bring-up, only used during init
        let mut delay = cx.device.TIM3.delay_us(&clocks);

        defmt::info!("Configuring status LED...");

        let status_led: pins::C13_STATUS_LED = gpioc
            .pc13
            .into_push_pull_output_with_state(&mut gpioc.crh, PinState::High);

        defmt::info!("Signalling USB disconnect...");

        let mut usb_dp: pins::A12_USB_DP_PULLDOWN =
            gpioa.pa12.into_push_pull_output(&mut gpioa.crh);
        transport::signal_disconnect(&mut usb_dp, &mut delay);

        defmt::info!("Configuring USB serial port...");

        let usb = Peripheral {
            usb: cx.device.USB,
            pin_dm: gpioa.pa11,
            pin_dp: usb_dp.into_floating_input(&mut gpioa.crh),
        };
        let usb_bus = singleton!(: UsbBusAllocator<UsbBusType> = UsbBus::new(usb)).unwrap();

        let mut serial = SerialPort::new(usb_bus).unwrap();

        if serial.enumerate(&mut delay) {
            defmt::info!("USB configured by host");
        } else {
            defmt::warn!("USB not configured yet, continuing");
        }

        defmt::info!("Configuring ADC1...");

        let adc_pin: pins::A0_ADC1C0 = gpioa.pa0.into_analog(&mut gpioa.crl);
        let mut sampler = AdcSampler::new(cx.device.ADC1, adc_pin);
        sampler.power_up(&mut delay);

        defmt::info!("Configuring ADC1 DMA transfer...");

        let mut transfer = AdcTransfer::new(dma1.1, &sampler);

        defmt::info!("Configuring sample trigger timer...");

        let mut trigger = Tim2Trigger::new(cx.device.TIM2, config::adc::TRIGGER);

        defmt::info!("Preparing buffers...");

        let samples = singleton!(: [u16; config::fft::LEN] = [0; config::fft::LEN]).unwrap();

        let spectrum = singleton!(: [u32; config::fft::LEN] = [0; config::fft::LEN]).unwrap();

        let window =
            singleton!(: WindowTable<{ config::fft::LEN }> = conditioner::hamming()).unwrap();

        let mut pipeline = Pipeline::new(samples, spectrum, window, Radix2);

        defmt::info!("Configuring USB poll timer...");

        let mut poll_timer = cx.device.TIM4.counter_hz(&clocks);
        poll_timer.start(config::usb::POLL_RATE).unwrap();
        poll_timer.listen(Event::Update);

        defmt::info!("Configuring monotonic timer...");

        let mono = DwtMono::new(
            &mut cx.core.DCB,
            cx.core.DWT,
            cx.core.SYST,
            clocks.sysclk().to_Hz(),
        );

        defmt::info!("Starting sampling...");

        pipeline.start(&mut transfer, &mut trigger);

        // the peripherals keep running after their handles are dropped

        defmt::info!("Finished init.");

        (
            Shared { serial },
            Local {
                pipeline,
                transfer,
                poll_timer,
                status_led,
                heartbeat: Heartbeat::new(config::usb::HEARTBEAT_POLLS),
            },
            init::Monotonics(mono),
        )
    }

    // Task priorities
    //
    // Prio | Task     | Description
    //    3 | DwtMono  | monotonic timer interrupt
    //    2 | usb_poll | services the USB peripheral (triggered by timer interrupt)
    //    1 | process  | conditions, transforms and sends each filled sample buffer
    //    0 | idle     | logs received lines

    /// This provides a monotonic timer used to measure pass durations.
    #[monotonic(
        binds = SysTick,
        priority = 3,
        default = true
    )]
    type DwtMono = DwtSystick<{ config::clk::SYSCLK_HZ }>;

    /// This task services the USB peripheral at a fixed cadence.
    ///
    /// It has a higher priority than `process`, so output queued by a long pass keeps draining.
    #[task(
        binds = TIM4,
        shared = [
            serial,
        ],
        local = [
            poll_timer,
            status_led,
            heartbeat,
        ],
        priority = 2,
    )]
    fn usb_poll(mut cx: usb_poll::Context) {
        cx.local.poll_timer.clear_interrupt(Event::Update);

        cx.shared.serial.lock(|serial| {
            serial.poll();
        });

        cx.local.heartbeat.tick(cx.local.status_led);
    }

    /// This task runs one pipeline pass per filled sample buffer.
    ///
    /// The transfer engine stays disabled until the pass re-arms it,
    /// so this task cannot be re-entered by its own interrupt.
    #[task(
        binds = DMA1_CHANNEL1,
        shared = [
            serial,
        ],
        local = [
            pipeline,
            transfer,
        ],
        priority = 1,
    )]
    fn process(cx: process::Context) {
        let start = monotonics::now();

        let mut serial = cx.shared.serial;

        // the serial port is only locked per attempt, so `usb_poll` can drain the endpoint in between
        let mut retry_delay = MonoDelay;
        let mut sink = |bytes: &[u8]| {
            tx::send_with_retry(bytes, &mut retry_delay, |rest: &[u8]| {
                serial.lock(|serial| serial.send(rest))
            })
        };

        let pipeline = cx.local.pipeline;

        match pipeline.on_transfer_complete(cx.local.transfer, &mut sink) {
            Ok(report) => {
                if report.saturated {
                    defmt::debug!(
                        "Output saturated after {} lines ({} bytes)",
                        report.lines_sent,
                        report.bytes_sent
                    );
                }
            }
            Err(e) => {
                defmt::warn!("Ignoring transfer event: {}", e);
                return;
            }
        }

        let elapsed = monotonics::now() - start;
        let elapsed_us = u32::try_from(elapsed.to_micros()).unwrap_or(u32::MAX);

        if config::debug::LOG_TIMING {
            defmt::println!("Pass finished after {}us", elapsed_us);
        }

        if pipeline.record_pass_duration(elapsed_us) {
            defmt::warn!(
                "Pass did not complete within one buffer period (took {} us).",
                elapsed_us
            );
        }

        let diagnostics = pipeline.diagnostics();
        if config::debug::STATS_EVERY_N_PASSES != 0
            && diagnostics.passes % config::debug::STATS_EVERY_N_PASSES == 0
        {
            let dropped_rx_bytes = serial.lock(|serial| serial.dropped_rx_bytes());
            defmt::info!("{}, dropped rx bytes: {}", diagnostics, dropped_rx_bytes);
        }
    }

    #[idle(
        shared = [
            serial,
        ],
    )]
    fn idle(mut cx: idle::Context) -> ! {
        loop {
            // Note that using `wfi` here breaks debugging,
            // so if desired we should only do that in release mode.
            if let Some(line) = cx.shared.serial.lock(|serial| serial.receive_line()) {
                defmt::info!("Received line: {=[u8]:a}", line.as_slice());
            }
        }
    }

    /// Blocking delay on the monotonic timer, for waits outside of init.
    struct MonoDelay;

    impl DelayUs<u32> for MonoDelay {
        fn delay_us(&mut self, us: u32) {
            let start = monotonics::now();
            while (monotonics::now() - start).to_micros() < u64::from(us) {}
        }
    }
}
