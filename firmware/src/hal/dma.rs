use crate::hal::adc::AdcSampler;
use core::sync::atomic::{compiler_fence, Ordering};
use fftserial::acquisition::SampleTransfer;
use stm32f1xx_hal::dma::{dma1, Event};

/// DMA1 channel 1, copying ADC1 conversions into a sample buffer.
///
/// One-shot: the channel halts after the buffer is full and must be re-armed.
pub struct AdcTransfer {
    channel: dma1::C1,
}

impl AdcTransfer {
    pub fn new(mut channel: dma1::C1, source: &AdcSampler) -> Self {
        channel.set_peripheral_address(source.data_register_address(), false);
        channel.ch().cr.modify(|_, w| {
            w.mem2mem()
                .clear_bit()
                .pl()
                .high()
                .msize()
                .bits16()
                .psize()
                .bits16()
                .circ()
                .clear_bit()
                .dir()
                .clear_bit()
        });
        // Enable interrupts on DMA1_CHANNEL1
        channel.listen(Event::TransferComplete);

        Self { channel }
    }
}

impl SampleTransfer for AdcTransfer {
    fn arm(&mut self, buffer: &mut [u16]) {
        self.channel
            .set_memory_address(buffer.as_mut_ptr() as u32, true);
        self.channel.set_transfer_length(buffer.len());
        // buffer accesses must not be reordered past the start of the transfer
        compiler_fence(Ordering::Release);
        self.channel.ch().cr.modify(|_, w| w.en().set_bit());
    }

    fn disable(&mut self) {
        self.channel.ch().cr.modify(|_, w| w.en().clear_bit());
        // ...or before its end
        compiler_fence(Ordering::Acquire);
    }

    fn transfer_complete(&self) -> bool {
        self.channel.isr().tcif1().bit_is_set()
    }

    fn clear_transfer_complete(&mut self) {
        self.channel.ifcr().write(|w| w.ctcif1().set_bit());
    }
}
