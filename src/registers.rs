#![allow(unused_braces)]
use modular_bitfield_msb::prelude::*;

// SPI instruction set, data sheet DS21801E table 12-1
pub const INSTRUCTION_WRITE: u8 = 0x02;
pub const INSTRUCTION_READ: u8 = 0x03;
pub const INSTRUCTION_BIT_MODIFY: u8 = 0x05;
pub const INSTRUCTION_RESET: u8 = 0xC0;

/// Instruction loading transmit buffer `n`, starting at TXBnSIDH
pub const fn instruction_load_txb(n: u8) -> u8 {
    0x40 + (n << 1)
}

/// Instruction requesting transmission of buffer `n`
pub const fn instruction_rts(n: u8) -> u8 {
    0x80 + (1 << n)
}

/// Instruction reading receive buffer `n`, starting at RXBnSIDH.
/// The read also clears the matching CANINTF receive flag.
pub const fn instruction_read_rxb(n: u8) -> u8 {
    0x90 + (n << 2)
}

// Register addresses
pub const CANSTAT: u8 = 0x0E;
pub const CANCTRL: u8 = 0x0F;
pub const TEC: u8 = 0x1C;
pub const REC: u8 = 0x1D;
pub const CANINTF: u8 = 0x2C;
pub const EFLG: u8 = 0x2D;
pub const CNF3: u8 = 0x28;
pub const RXB0CTRL: u8 = 0x60;
pub const RXB1CTRL: u8 = 0x70;

// CANCTRL bits
pub const CANCTRL_REQOP_NORMAL: u8 = 0x00;
pub const CANCTRL_REQOP_SLEEP: u8 = 0x20;
pub const CANCTRL_REQOP_LOOPBACK: u8 = 0x40;
pub const CANCTRL_REQOP_LISTEN_ONLY: u8 = 0x60;
pub const CANCTRL_REQOP_CONF: u8 = 0x80;
pub const CANCTRL_REQOP_MASK: u8 = 0xE0;
pub const CANCTRL_OSM: u8 = 1 << 3;

// CANINTF receive flags, cleared implicitly by the buffer read
pub const CANINTF_RX: u8 = 0x03;

// CANINTE bits
pub const CANINTE_RX: u8 = 0x03;
pub const CANINTE_TX: u8 = 0x1C;
pub const CANINTE_ERR: u8 = 0x20;

// CNF2 bits
pub const CNF2_BTLMODE: u8 = 1 << 7;
pub const CNF2_SAM: u8 = 1 << 6;

// RXBnCTRL bits
pub const RXBCTRL_BUKT: u8 = 1 << 2;
pub const RXBCTRL_RXM0: u8 = 1 << 5;
pub const RXBCTRL_RXM1: u8 = 1 << 6;

// RXBnSIDL bits
pub const RXBSIDL_IDE: u8 = 1 << 3;
pub const RXBSIDL_SRR: u8 = 1 << 4;

// RXBnDLC bits
pub const RXBDLC_RTR: u8 = 1 << 6;

#[bitfield]
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
/// CANINTF interrupt flag register
pub struct InterruptFlags {
    /// Message error interrupt flag
    pub merrf: bool,
    /// Wakeup interrupt flag
    pub wakif: bool,
    /// Error interrupt flag (EFLG holds the details)
    pub errif: bool,
    /// Transmit buffer 2 empty interrupt flag
    pub tx2if: bool,
    /// Transmit buffer 1 empty interrupt flag
    pub tx1if: bool,
    /// Transmit buffer 0 empty interrupt flag
    pub tx0if: bool,
    /// Receive buffer 1 full interrupt flag
    pub rx1if: bool,
    /// Receive buffer 0 full interrupt flag
    pub rx0if: bool,
}

impl InterruptFlags {
    /// Transmit-complete flag of the given buffer
    pub fn txif(&self, index: usize) -> bool {
        match index {
            0 => self.tx0if(),
            1 => self.tx1if(),
            _ => self.tx2if(),
        }
    }

    pub fn any(&self) -> bool {
        u8::from(*self) != 0
    }
}

#[bitfield]
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
/// EFLG error flag register
pub struct ErrorFlags {
    /// Receive buffer 1 overflow flag
    pub rx1ovr: bool,
    /// Receive buffer 0 overflow flag
    pub rx0ovr: bool,
    /// Bus-off error flag
    pub txbo: bool,
    /// Transmit error-passive flag
    pub txep: bool,
    /// Receive error-passive flag
    pub rxep: bool,
    /// Transmit error warning flag
    pub txwar: bool,
    /// Receive error warning flag
    pub rxwar: bool,
    /// Error warning flag
    pub ewarn: bool,
}

impl ErrorFlags {
    /// A receive buffer was overwritten before software read it.
    ///
    /// The receive flow chart (figure 4-3) of the data sheet (DS21801E)
    /// says that, with RXB0CTRL.BUKT set, the overflow flag that is set is
    /// RX1OVR, when in fact it is RX0OVR that is set. To be safe, test for
    /// any one of them.
    pub fn overrun(&self) -> bool {
        self.rx0ovr() || self.rx1ovr()
    }

    pub fn any(&self) -> bool {
        u8::from(*self) != 0
    }
}
