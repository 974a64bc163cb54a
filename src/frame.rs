//!# CAN frame and hardware buffer layout
//!
//! [`CanFrame`] is a classic CAN 2.0 frame with standard or extended
//! identifier. The buffer codec reproduces the TXBnSIDH../RXBnSIDH..
//! register layout of the controller bit for bit.
use crate::registers::{RXBDLC_RTR, RXBSIDL_IDE, RXBSIDL_SRR};
use embedded_can::{ExtendedId, Frame, Id, StandardId};

/// Maximum number of payload bytes of a classic CAN frame
pub const MAX_PAYLOAD: usize = 8;

/// Raw buffer image size: SIDH, SIDL, EID8, EID0, DLC and 8 data bytes
pub const BUFFER_SIZE: usize = 13;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CanFrame {
    pub identifier: Id,
    pub rtr: bool,
    pub dlc: usize,
    pub data: [u8; MAX_PAYLOAD],
}

impl Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        if data.len() > MAX_PAYLOAD {
            return None;
        }

        let mut frame = CanFrame {
            identifier: id.into(),
            rtr: false,
            dlc: data.len(),
            data: [0; MAX_PAYLOAD],
        };
        frame.data[..data.len()].copy_from_slice(data);
        Some(frame)
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        if dlc > MAX_PAYLOAD {
            return None;
        }

        Some(CanFrame {
            identifier: id.into(),
            rtr: true,
            dlc,
            data: [0; MAX_PAYLOAD],
        })
    }

    fn is_extended(&self) -> bool {
        matches!(self.identifier, Id::Extended(_))
    }

    fn is_remote_frame(&self) -> bool {
        self.rtr
    }

    fn id(&self) -> Id {
        self.identifier
    }

    fn dlc(&self) -> usize {
        self.dlc
    }

    fn data(&self) -> &[u8] {
        &self.data[..self.dlc]
    }
}

impl CanFrame {
    /// Encodes the frame into the transmit buffer image, starting at
    /// TXBnSIDH. Returns the number of significant bytes (5 + DLC).
    pub(crate) fn to_transmit_buffer(&self, buf: &mut [u8; BUFFER_SIZE]) -> usize {
        match self.identifier {
            Id::Extended(eid) => {
                let raw = eid.as_raw();
                buf[0] = (raw >> 21) as u8;
                // EID17/EID16 share SIDL with the EXIDE format bit
                buf[1] = ((raw >> 13) as u8 & 0xE0) | RXBSIDL_IDE | ((raw >> 16) as u8 & 0x03);
                buf[2] = (raw >> 8) as u8;
                buf[3] = raw as u8;
            }
            Id::Standard(sid) => {
                let raw = sid.as_raw();
                buf[0] = (raw >> 3) as u8;
                buf[1] = (raw << 5) as u8;
                buf[2] = 0;
                buf[3] = 0;
            }
        }

        buf[4] = self.dlc as u8;
        if self.rtr {
            buf[4] |= RXBDLC_RTR;
        }
        buf[5..5 + self.dlc].copy_from_slice(&self.data[..self.dlc]);

        5 + self.dlc
    }

    /// Decodes the receive buffer image read from RXBnSIDH onwards.
    ///
    /// The length nibble is clamped to 8 and payload bytes are only copied
    /// for data frames. For standard frames the remote request is signaled
    /// via SIDL.SRR, for extended frames via the DLC register RTR bit.
    pub(crate) fn from_receive_buffer(buf: &[u8]) -> Self {
        let (identifier, rtr) = if buf[1] & RXBSIDL_IDE != 0 {
            let raw = (buf[0] as u32) << 21
                | ((buf[1] & 0xE0) as u32) << 13
                | ((buf[1] & 0x03) as u32) << 16
                | (buf[2] as u32) << 8
                | buf[3] as u32;
            // Masked to 29 bits above, so the id is always in range
            let id = ExtendedId::new(raw).unwrap_or(ExtendedId::ZERO);
            (Id::Extended(id), buf[4] & RXBDLC_RTR != 0)
        } else {
            let raw = (buf[0] as u16) << 3 | (buf[1] >> 5) as u16;
            let id = StandardId::new(raw).unwrap_or(StandardId::ZERO);
            (Id::Standard(id), buf[1] & RXBSIDL_SRR != 0)
        };

        let dlc = ((buf[4] & 0x0F) as usize).min(MAX_PAYLOAD);

        let mut frame = CanFrame {
            identifier,
            rtr,
            dlc,
            data: [0; MAX_PAYLOAD],
        };
        if !rtr {
            frame.data[..dlc].copy_from_slice(&buf[5..5 + dlc]);
        }
        frame
    }
}
