//! CDC-ACM class constants and class request decoding.

pub const USB_CLASS_CDC: u8 = 0x02;
pub const USB_CLASS_DATA: u8 = 0x0a;
pub const CDC_SUBCLASS_ACM: u8 = 0x02;
pub const CDC_PROTOCOL_AT: u8 = 0x01;

pub const CS_INTERFACE: u8 = 0x24;
pub const CDC_TYPE_HEADER: u8 = 0x00;
pub const CDC_TYPE_CALL_MANAGEMENT: u8 = 0x01;
pub const CDC_TYPE_ACM: u8 = 0x02;
pub const CDC_TYPE_UNION: u8 = 0x06;

/// CDC 1.10, little-endian
pub const CDC_VERSION: [u8; 2] = [0x10, 0x01];

pub const REQ_SET_LINE_CODING: u8 = 0x20;
pub const REQ_SET_CONTROL_LINE_STATE: u8 = 0x22;

pub const NOTIFY_SERIAL_STATE: u8 = 0x20;
/// Device-to-host, class, interface
const NOTIFY_REQUEST_TYPE: u8 = 0xa1;

/// Size of the line coding structure
pub const LINE_CODING_LEN: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlError {
    /// Class request this device does not implement
    Unsupported(u8),
    /// Line coding payload shorter than `LINE_CODING_LEN`
    ShortLineCoding { len: usize },
}

/// Serial parameters requested by the host.
///
/// These are only recorded: the data endpoints run at bus speed regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineCoding {
    pub baud: u32,
    /// 0 = 1 stop bit, 1 = 1.5, 2 = 2
    pub stop_bits: u8,
    /// 0 = none, 1 = odd, 2 = even, 3 = mark, 4 = space
    pub parity: u8,
    pub data_bits: u8,
}

impl LineCoding {
    pub fn parse(data: &[u8]) -> Result<Self, ControlError> {
        match *data {
            [b0, b1, b2, b3, stop_bits, parity, data_bits, ..] => Ok(Self {
                baud: u32::from_le_bytes([b0, b1, b2, b3]),
                stop_bits,
                parity,
                data_bits,
            }),
            _ => Err(ControlError::ShortLineCoding { len: data.len() }),
        }
    }
}

impl Default for LineCoding {
    /// 115200 8N1
    fn default() -> Self {
        Self {
            baud: 115_200,
            stop_bits: 0,
            parity: 0,
            data_bits: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClassRequest {
    SetLineCoding(LineCoding),
    SetControlLineState { dtr: bool, rts: bool },
}

impl ClassRequest {
    /// Decode a host-to-device class request addressed to the communications interface.
    pub fn parse(request: u8, value: u16, data: &[u8]) -> Result<Self, ControlError> {
        match request {
            REQ_SET_LINE_CODING => LineCoding::parse(data).map(ClassRequest::SetLineCoding),
            REQ_SET_CONTROL_LINE_STATE => Ok(ClassRequest::SetControlLineState {
                dtr: value & 0b01 != 0,
                rts: value & 0b10 != 0,
            }),
            other => Err(ControlError::Unsupported(other)),
        }
    }
}

/// SERIAL_STATE notification reporting the control line state back to the host.
///
/// Some host drivers wait for this after setting the control lines.
pub fn serial_state_notification(interface: u8, dtr: bool, rts: bool) -> [u8; 10] {
    let state = u8::from(dtr) | (u8::from(rts) << 1);
    [
        NOTIFY_REQUEST_TYPE,
        NOTIFY_SERIAL_STATE,
        // wValue
        0,
        0,
        // wIndex
        interface,
        0,
        // wLength
        2,
        0,
        // data
        state,
        0,
    ]
}
