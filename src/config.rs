pub fn dump_to_log() {
    info!(
        "\n\
        Clocks:\n\
        - HSE_FREQ: {} Hz\n\
        - SYSCLK:   {} Hz\n\
        - PCLK1:    {} Hz\n\
        - PCLK2:    {} Hz\n\
        - ADCCLK:   {} Hz\n\
        ADC:\n\
        - CHANNEL: {}\n\
        - RESOLUTION_BITS: {}\n\
        - SAMPLE_RATE: {} Hz\n\
        - TRIGGER: prescaler {} / period {}\n\
        - BUFFER_PERIOD: {} us\n\
        Conditioner:\n\
        - GAIN: {}%\n\
        FFT:\n\
        - LEN:  {}\n\
        - BINS: {}\n\
        - FREQ_RESOLUTION: {}.{} Hz\n\
        USB:\n\
        - VID:PID: {=u16:#x}:{=u16:#x}\n\
        - POLL_RATE: {} Hz\n\
        - ECHO: {}\n\
        ",
        clk::HSE_FREQ.to_Hz(),
        clk::SYSCLK.to_Hz(),
        clk::PCLK1.to_Hz(),
        clk::PCLK2.to_Hz(),
        clk::ADCCLK.to_Hz(),
        adc::CHANNEL,
        adc::RESOLUTION_BITS,
        adc::SAMPLE_RATE_HZ,
        adc::TRIGGER.prescaler,
        adc::TRIGGER.period,
        adc::BUFFER_PERIOD_US,
        conditioner::GAIN_PERCENT,
        fft::LEN,
        fft::BINS,
        fft::FREQ_RESOLUTION_X1000 / 1000,
        fft::FREQ_RESOLUTION_X1000 % 1000,
        usb::VID,
        usb::PID,
        usb::POLL_RATE.to_Hz(),
        usb::ECHO,
    );
}

/// Debugging flags
pub mod debug {
    /// Log how long each stage of a pipeline pass takes.
    pub const LOG_TIMING: bool = false;

    /// Log the strongest non-DC bin of every spectrum.
    pub const LOG_SPECTRUM_PEAK: bool = false;

    /// Log pipeline diagnostics every this many passes (0 to disable).
    pub const STATS_EVERY_N_PASSES: u32 = 64;
}

/// Clock configuration
///
/// See clock tree in https://www.st.com/resource/en/datasheet/stm32f103c8.pdf
/// Rough layout:
///
///   SYSCLK -> AHB prescaler -> APB1 prescaler -> PCLK1 (x2 -> TIM2..4 clock)
///              / 1,2..512   |   / 1,2,4,8,16
///                           |
///                           -> APB2 prescaler -> PCLK2
///                               / 1,2,4,8,16  |
///                                             |
///                                             -> ADC prescaler -> ADCCLK
///                                                 / 2,4,6,8
///
///   SYSCLK -> USB prescaler (/1.5) -> USBCLK (must be 48MHz)
pub mod clk {
    use fugit::Rate;

    /// Use external oscillator (required to get max 72MHz sysclk)
    pub const HSE_FREQ: Rate<u32, 1, 1> = Rate::<u32, 1, 1>::MHz(8);

    /// PLLMUL @ x9 (max 72MHz), which also gives 48MHz USBCLK via the /1.5 prescaler
    pub const SYSCLK: Rate<u32, 1, 1> = Rate::<u32, 1, 1>::MHz(72);
    pub const SYSCLK_HZ: u32 = SYSCLK.to_Hz();

    /// APB1 prescaler @ /2 (max 36MHz)
    pub const PCLK1: Rate<u32, 1, 1> = Rate::<u32, 1, 1>::MHz(36);
    /// APB2 prescaler @ /1 (max 72MHz)
    pub const PCLK2: Rate<u32, 1, 1> = Rate::<u32, 1, 1>::MHz(72);

    /// APB1 timers run at twice PCLK1 whenever the APB1 prescaler is not 1
    pub const TIM2CLK_HZ: u32 = 2 * PCLK1.to_Hz();

    /// ADC prescaler @ /6 (max 14MHz)
    pub const ADCCLK: Rate<u32, 1, 1> = Rate::<u32, 1, 1>::MHz(12);
}

/// Sampler and trigger configuration
pub mod adc {
    use crate::acquisition::TriggerTiming;
    use crate::config;
    use fugit::MicrosDurationU32;

    /// Microphone input on PA0
    pub const CHANNEL: u8 = 0;

    pub const RESOLUTION_BITS: u32 = 12;

    /// Largest value a conversion can produce
    pub const MAX_SAMPLE: u16 = (1 << RESOLUTION_BITS) - 1;

    /// Conversion result for an input at Vcc/2
    pub const MIDPOINT: u16 = 1 << (RESOLUTION_BITS - 1);

    /// SMPx field value for 55.5 cycles.
    /// With a 12MHz ADCCLK, one conversion takes (55.5 + 12.5) / 12MHz = ~5.7us,
    /// comfortably inside the 25us trigger period.
    pub const SAMPLE_TIME_BITS: u8 = 0b101;

    /// One conversion per trigger edge
    pub const SAMPLE_RATE_HZ: u32 = 40_000;

    /// TIM2 prescaler / period, derived from the timer clock
    pub const TRIGGER: TriggerTiming =
        TriggerTiming::for_rate(config::clk::TIM2CLK_HZ, SAMPLE_RATE_HZ);
    const _: () = assert!(
        TRIGGER.is_exact(config::clk::TIM2CLK_HZ, SAMPLE_RATE_HZ),
        "sample rate must divide the timer clock exactly"
    );

    /// Conversions per buffer (one per transform input)
    pub const BUF_LEN: usize = config::fft::LEN;

    /// Time the transfer engine takes to fill one buffer.
    /// A processing pass that takes longer than this is counted as an overrun.
    #[allow(clippy::cast_possible_truncation)]
    pub const BUFFER_PERIOD_US: u32 =
        (BUF_LEN as u64 * 1_000_000 / SAMPLE_RATE_HZ as u64) as u32;

    /// Wait between powering on the ADC and starting calibration
    pub const POWER_UP_SETTLE: MicrosDurationU32 = MicrosDurationU32::millis(1);
}

/// Signal conditioner configuration
pub mod conditioner {
    /// Fixed gain applied to every buffer: 100 is unity.
    pub const GAIN_PERCENT: u16 = 150;

    /// Gains above this are clamped
    pub const MAX_GAIN_PERCENT: u16 = 1000;
}

/// FFT configuration
pub mod fft {
    use crate::config;

    pub const LEN: usize = 1024;
    const _: () = assert!(LEN.is_power_of_two());

    /// Bins emitted per spectrum: the upper half mirrors the lower half for real input
    pub const BINS: usize = LEN / 2;

    /// Conditioned samples are shifted up by this much to use 15 bits of the (signed) real part
    pub const INPUT_SHIFT: u32 = 15 - config::adc::RESOLUTION_BITS;

    /// Each FFT bin is this many Hz apart
    pub const FREQ_RESOLUTION_X1000: usize = config::adc::SAMPLE_RATE_HZ as usize * 1000 / LEN;
}

/// USB configuration
pub mod usb {
    use fugit::{MicrosDurationU32, Rate};

    /// STMicroelectronics virtual COM port
    pub const VID: u16 = 0x0483;
    pub const PID: u16 = 0x5740;
    pub const DEVICE_RELEASE: u16 = 0x0200;

    pub const MANUFACTURER: &str = "fftserial";
    pub const PRODUCT: &str = "Spectrum streamer";
    pub const SERIAL_NUMBER: &str = "FFT0001";

    pub const MAX_POWER_MA: usize = 100;

    pub const CONTROL_PACKET_SIZE: u8 = 64;

    /// Endpoint addresses, as host drivers for this VID:PID expect them
    pub const NOTIFY_EP: u8 = 0x83;
    pub const READ_EP: u8 = 0x01;
    pub const WRITE_EP: u8 = 0x82;

    pub const NOTIFY_PACKET_SIZE: u16 = 16;
    pub const NOTIFY_INTERVAL_MS: u8 = 255;
    pub const BULK_PACKET_SIZE: u16 = 64;
    #[allow(clippy::cast_lossless)]
    pub const BULK_PACKET_LEN: usize = BULK_PACKET_SIZE as usize;

    /// Outgoing data is split into frames of this size.
    /// One less than the bulk packet size, so a transfer is always terminated by a short packet.
    pub const TX_FRAME_LEN: usize = BULK_PACKET_LEN - 1;

    /// Longest output line: `"511 4294967295\r\n"` plus slack
    pub const OUTPUT_LINE_CAP: usize = 24;

    /// Attempts per output line before the rest of the spectrum is given up on
    pub const TX_ATTEMPTS: u32 = 50;
    /// Wait between attempts, for the poll task to drain the endpoint
    pub const TX_RETRY_INTERVAL: MicrosDurationU32 = MicrosDurationU32::micros(10);

    /// Capacity of the line accumulator and of a completed line
    pub const RX_LINE_CAP: usize = 256;

    /// Echo every received chunk back to the host
    pub const ECHO: bool = true;

    /// How often the poll task services the USB peripheral
    pub const POLL_RATE: Rate<u32, 1, 1> = Rate::<u32, 1, 1>::kHz(1);

    /// Toggle the status LED every this many polls (~1Hz blink at 1kHz polling)
    pub const HEARTBEAT_POLLS: u32 = 500;

    /// How long D+ is held low to force the host to notice a (re)connect
    pub const REENUMERATE_HOLD: MicrosDurationU32 = MicrosDurationU32::millis(10);

    /// How long init keeps polling so the host can enumerate before the poll task takes over
    pub const ENUMERATION_WINDOW: MicrosDurationU32 = MicrosDurationU32::millis(500);
    pub const ENUMERATION_POLL_INTERVAL: MicrosDurationU32 = MicrosDurationU32::micros(100);
}
