use crate::registers::{
    CANCTRL_OSM, CANCTRL_REQOP_LISTEN_ONLY, CANCTRL_REQOP_LOOPBACK, CANCTRL_REQOP_NORMAL, CNF2_BTLMODE, CNF2_SAM,
};

/// Entire configuration currently supported
#[derive(Default, Copy, Clone, Debug)]
pub struct Configuration {
    pub bit_timing: BitTiming,
    pub mode: ControlMode,
}

/// Bit timing fields, already resolved to register-ready integers.
///
/// All values are logical time-quantum counts; the minus-one register
/// encoding is applied by [`BitTiming::as_cnf_bytes`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitTiming {
    /// Baud rate prescaler (1..=64)
    pub brp: u8,

    /// Synchronization jump width (1..=4)
    pub sjw: u8,

    /// Propagation segment (1..=8)
    pub prop_seg: u8,

    /// Phase segment 1 (1..=8)
    pub phase_seg1: u8,

    /// Phase segment 2 (2..=8)
    pub phase_seg2: u8,
}

impl Default for BitTiming {
    /// 16 time quanta per bit with the sample point at 62.5%
    fn default() -> Self {
        Self {
            brp: 1,
            sjw: 1,
            prop_seg: 2,
            phase_seg1: 7,
            phase_seg2: 6,
        }
    }
}

impl BitTiming {
    /// Encodes the CNF3, CNF2 and CNF1 register values, in ascending
    /// register address order starting at CNF3
    pub(crate) fn as_cnf_bytes(&self, triple_sample: bool) -> [u8; 3] {
        debug_assert!((1..=64).contains(&self.brp), "brp out of range");
        debug_assert!((1..=4).contains(&self.sjw), "sjw out of range");
        debug_assert!((1..=8).contains(&self.prop_seg), "prop_seg out of range");
        debug_assert!((1..=8).contains(&self.phase_seg1), "phase_seg1 out of range");
        debug_assert!((2..=8).contains(&self.phase_seg2), "phase_seg2 out of range");

        let cnf3 = self.phase_seg2 - 1;

        let cnf2 = CNF2_BTLMODE
            | if triple_sample { CNF2_SAM } else { 0 }
            | (self.phase_seg1 - 1) << 3
            | (self.prop_seg - 1);

        let cnf1 = (self.sjw - 1) << 6 | (self.brp - 1);

        [cnf3, cnf2, cnf1]
    }
}

/// Control-mode flags applied at activation
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ControlMode {
    /// Internal loopback, frames are not put on the bus
    pub loopback: bool,

    /// Listen-only, no dominant bits are ever sent
    pub listen_only: bool,

    /// Sample the bus line three times per bit
    pub triple_sample: bool,

    /// No automatic retransmission on arbitration loss or error
    pub one_shot: bool,
}

impl ControlMode {
    /// Encodes the CANCTRL request-mode byte. Loopback takes precedence
    /// over listen-only.
    pub(crate) fn as_canctrl(&self) -> u8 {
        let mut value = if self.loopback {
            CANCTRL_REQOP_LOOPBACK
        } else if self.listen_only {
            CANCTRL_REQOP_LISTEN_ONLY
        } else {
            CANCTRL_REQOP_NORMAL
        };

        if self.one_shot {
            value |= CANCTRL_OSM;
        }

        value
    }
}
