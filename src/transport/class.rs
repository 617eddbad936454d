//! USB CDC-ACM class: one communications interface with a notification endpoint,
//! and one data interface with a bulk endpoint pair.

use crate::config;
use crate::transport::control::{
    serial_state_notification, ClassRequest, LineCoding, CDC_PROTOCOL_AT, CDC_SUBCLASS_ACM,
    CDC_TYPE_ACM, CDC_TYPE_CALL_MANAGEMENT, CDC_TYPE_HEADER, CDC_TYPE_UNION, CDC_VERSION,
    CS_INTERFACE, USB_CLASS_CDC, USB_CLASS_DATA,
};
use crate::transport::framing::LineFramer;
use crate::transport::tx::PacketWriter;
use usb_device::class_prelude::*;
use usb_device::control::{Recipient, RequestType};
use usb_device::Result;

pub struct SerialClass<'a, B: UsbBus> {
    comm_if: InterfaceNumber,
    data_if: InterfaceNumber,
    comm_ep: EndpointIn<'a, B>,
    read_ep: EndpointOut<'a, B>,
    write_ep: EndpointIn<'a, B>,
    framer: LineFramer<{ config::usb::RX_LINE_CAP }>,
    line_coding: LineCoding,
    dtr: bool,
    echo: bool,
}

impl<'a, B: UsbBus> SerialClass<'a, B> {
    /// Allocate the class's interfaces and endpoints.
    ///
    /// Fails if the bus cannot provide the fixed endpoint addresses.
    pub fn new(alloc: &'a UsbBusAllocator<B>, echo: bool) -> Result<Self> {
        let comm_if = alloc.interface();
        let data_if = alloc.interface();
        let comm_ep = alloc.alloc(
            Some(EndpointAddress::from(config::usb::NOTIFY_EP)),
            EndpointType::Interrupt,
            config::usb::NOTIFY_PACKET_SIZE,
            config::usb::NOTIFY_INTERVAL_MS,
        )?;
        let read_ep = alloc.alloc(
            Some(EndpointAddress::from(config::usb::READ_EP)),
            EndpointType::Bulk,
            config::usb::BULK_PACKET_SIZE,
            0,
        )?;
        let write_ep = alloc.alloc(
            Some(EndpointAddress::from(config::usb::WRITE_EP)),
            EndpointType::Bulk,
            config::usb::BULK_PACKET_SIZE,
            0,
        )?;

        Ok(Self {
            comm_if,
            data_if,
            comm_ep,
            read_ep,
            write_ep,
            framer: LineFramer::new(),
            line_coding: LineCoding::default(),
            dtr: false,
            echo,
        })
    }

    pub fn framer(&mut self) -> &mut LineFramer<{ config::usb::RX_LINE_CAP }> {
        &mut self.framer
    }

    /// Last line coding accepted from the host.
    pub fn line_coding(&self) -> LineCoding {
        self.line_coding
    }

    /// Whether the host has asserted DTR, i.e. has a terminal open.
    pub fn dtr(&self) -> bool {
        self.dtr
    }

    fn handle(&mut self, request: ClassRequest) {
        match request {
            ClassRequest::SetLineCoding(coding) => {
                debug!(
                    "Line coding set to {} baud, {} data bits",
                    coding.baud,
                    coding.data_bits
                );
                self.line_coding = coding;
            }
            ClassRequest::SetControlLineState { dtr, rts } => {
                self.dtr = dtr;
                let notification = serial_state_notification(self.comm_if.into(), dtr, rts);
                // best-effort: the host does not require it to arrive
                if self.comm_ep.write(&notification).is_err() {
                    trace!("Notification endpoint busy, skipping serial state");
                }
            }
        }
    }
}

impl<B: UsbBus> UsbClass<B> for SerialClass<'_, B> {
    fn get_configuration_descriptors(&self, writer: &mut DescriptorWriter) -> Result<()> {
        writer.interface(self.comm_if, USB_CLASS_CDC, CDC_SUBCLASS_ACM, CDC_PROTOCOL_AT)?;
        writer.write(
            CS_INTERFACE,
            &[CDC_TYPE_HEADER, CDC_VERSION[0], CDC_VERSION[1]],
        )?;
        // no call management capabilities
        writer.write(
            CS_INTERFACE,
            &[CDC_TYPE_CALL_MANAGEMENT, 0x00, self.data_if.into()],
        )?;
        // no ACM capabilities advertised, but SET_LINE_CODING / SET_CONTROL_LINE_STATE are handled anyway
        writer.write(CS_INTERFACE, &[CDC_TYPE_ACM, 0x00])?;
        writer.write(
            CS_INTERFACE,
            &[CDC_TYPE_UNION, self.comm_if.into(), self.data_if.into()],
        )?;
        writer.endpoint(&self.comm_ep)?;

        writer.interface(self.data_if, USB_CLASS_DATA, 0x00, 0x00)?;
        writer.endpoint(&self.read_ep)?;
        writer.endpoint(&self.write_ep)?;

        Ok(())
    }

    fn reset(&mut self) {
        self.framer.reset();
        self.line_coding = LineCoding::default();
        self.dtr = false;
    }

    fn control_out(&mut self, xfer: ControlOut<B>) {
        let req = *xfer.request();

        if !(req.request_type == RequestType::Class
            && req.recipient == Recipient::Interface
            && req.index == u16::from(u8::from(self.comm_if)))
        {
            return;
        }

        match ClassRequest::parse(req.request, req.value, xfer.data()) {
            Ok(request) => {
                self.handle(request);
                xfer.accept().ok();
            }
            Err(e) => {
                warn!("Rejecting class request: {}", e);
                xfer.reject().ok();
            }
        }
    }

    fn endpoint_out(&mut self, addr: EndpointAddress) {
        if addr != self.read_ep.address() {
            return;
        }

        let mut buf = [0; config::usb::BULK_PACKET_LEN];
        let len = match self.read_ep.read(&mut buf) {
            Ok(len) => len,
            Err(UsbError::WouldBlock) => return,
            Err(_) => {
                warn!("Failed to read from the data endpoint");
                return;
            }
        };
        let chunk = &buf[..len];

        self.framer.feed(chunk);

        if self.echo && !chunk.is_empty() {
            // best-effort, like any other output
            let _ = self.write_ep.write(chunk);
        }
    }
}

impl<B: UsbBus> PacketWriter for SerialClass<'_, B> {
    type Error = UsbError;

    fn write_packet(&mut self, packet: &[u8]) -> Result<usize> {
        self.write_ep.write(packet)
    }
}
