use crate::status::{next_action, Action, StatusSnapshot};

#[test]
fn test_receive_has_highest_priority() {
    // RX0IF wins over everything else
    let snapshot = StatusSnapshot::from_registers(0xFF, 0xFF);
    assert_eq!(Action::ReadRxb0, next_action(&snapshot, true, true));

    // RX1IF next
    let snapshot = StatusSnapshot::from_registers(0xFE, 0xFF);
    assert_eq!(Action::ReadRxb1, next_action(&snapshot, true, true));
}

#[test]
fn test_other_flags_cleared_before_transmit() {
    // TX0IF without receive flags
    let snapshot = StatusSnapshot::from_registers(0x04, 0x00);
    assert_eq!(Action::ClearInterruptFlags, next_action(&snapshot, true, false));

    // ERRIF alone
    let snapshot = StatusSnapshot::from_registers(0x20, 0x00);
    assert_eq!(Action::ClearInterruptFlags, next_action(&snapshot, false, false));
}

#[test]
fn test_pending_transmit_when_flags_clear() {
    let snapshot = StatusSnapshot::from_registers(0x00, 0x00);
    assert_eq!(Action::LoadPendingSlot, next_action(&snapshot, true, true));
}

#[test]
fn test_deferred_wake_runs_extra_cycle() {
    let snapshot = StatusSnapshot::from_registers(0x00, 0x00);
    assert_eq!(Action::ReadFlagsAgain, next_action(&snapshot, false, true));
}

#[test]
fn test_idle_when_nothing_to_do() {
    let snapshot = StatusSnapshot::from_registers(0x00, 0x00);
    assert_eq!(Action::Idle, next_action(&snapshot, false, false));

    // EFLG alone does not start a cycle; it is only acted upon together
    // with an interrupt flag
    let snapshot = StatusSnapshot::from_registers(0x00, 0xFF);
    assert_eq!(Action::Idle, next_action(&snapshot, false, false));
}

#[test]
fn test_snapshot_decodes_registers() {
    let snapshot = StatusSnapshot::from_registers(0x05, 0x40);

    assert!(snapshot.canintf.rx0if());
    assert!(snapshot.canintf.tx0if());
    assert!(!snapshot.canintf.rx1if());
    assert!(snapshot.eflg.rx0ovr());
    assert!(snapshot.eflg.overrun());
}
