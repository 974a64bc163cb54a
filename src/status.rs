use crate::registers::{ErrorFlags, InterruptFlags};

/// Last-read CANINTF and EFLG values, captured together in one exchange.
///
/// The snapshot is consumed by the completion handlers of the cycle that
/// read it and superseded by the next status read; it is never partially
/// updated.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub canintf: InterruptFlags,
    pub eflg: ErrorFlags,
}

impl StatusSnapshot {
    pub(crate) fn from_registers(canintf: u8, eflg: u8) -> Self {
        Self {
            canintf: InterruptFlags::from(canintf),
            eflg: ErrorFlags::from(eflg),
        }
    }
}

/// Exchange to issue next after a status read completed
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Read and decode receive buffer 0
    ReadRxb0,
    /// Read and decode receive buffer 1
    ReadRxb1,
    /// Clear the transmit/error/wakeup flags of the snapshot
    ClearInterruptFlags,
    /// Load the lowest-indexed pending transmit slot
    LoadPendingSlot,
    /// A wake was deferred while busy; run one extra status read
    ReadFlagsAgain,
    /// Nothing to do, release the scheduler and arm the fallback timer
    Idle,
}

/// Decodes a status snapshot into the next scheduler action.
///
/// Strict priority order: receive buffer 0, receive buffer 1, any other
/// interrupt flag, a pending transmit slot, a deferred wake, idle.
pub fn next_action(snapshot: &StatusSnapshot, tx_pending: bool, deferred_interrupt: bool) -> Action {
    if snapshot.canintf.rx0if() {
        Action::ReadRxb0
    } else if snapshot.canintf.rx1if() {
        Action::ReadRxb1
    } else if snapshot.canintf.any() {
        Action::ClearInterruptFlags
    } else if tx_pending {
        Action::LoadPendingSlot
    } else if deferred_interrupt {
        Action::ReadFlagsAgain
    } else {
        Action::Idle
    }
}
