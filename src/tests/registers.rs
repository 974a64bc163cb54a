use crate::registers::*;

#[test]
fn test_buffer_instructions() {
    assert_eq!(0x40, instruction_load_txb(0));
    assert_eq!(0x42, instruction_load_txb(1));
    assert_eq!(0x44, instruction_load_txb(2));

    assert_eq!(0x81, instruction_rts(0));
    assert_eq!(0x82, instruction_rts(1));
    assert_eq!(0x84, instruction_rts(2));

    assert_eq!(0x90, instruction_read_rxb(0));
    assert_eq!(0x94, instruction_read_rxb(1));
}

#[test]
fn test_interrupt_flags_decode() {
    let flags = InterruptFlags::from(0b0001_1101);

    assert!(flags.rx0if());
    assert!(!flags.rx1if());
    assert!(flags.tx0if());
    assert!(flags.tx1if());
    assert!(flags.tx2if());
    assert!(!flags.errif());
    assert!(flags.any());

    assert!(flags.txif(0));
    assert!(flags.txif(1));
    assert!(flags.txif(2));
}

#[test]
fn test_interrupt_flags_roundtrip() {
    assert_eq!(0x00, u8::from(InterruptFlags::from(0x00)));
    assert!(!InterruptFlags::from(0x00).any());
    assert_eq!(0xA5, u8::from(InterruptFlags::from(0xA5)));
}

#[test]
fn test_error_flags_decode() {
    let flags = ErrorFlags::from(0b0010_0001);

    assert!(flags.txbo());
    assert!(flags.ewarn());
    assert!(!flags.overrun());
    assert!(flags.any());
}

#[test]
fn test_overrun_accepts_either_flag() {
    assert!(ErrorFlags::from(0x40).overrun());
    assert!(ErrorFlags::from(0x80).overrun());
    assert!(!ErrorFlags::from(0x3F).overrun());
}
