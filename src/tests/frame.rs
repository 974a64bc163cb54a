use crate::frame::{CanFrame, BUFFER_SIZE};
use embedded_can::{ExtendedId, Frame, Id, StandardId};

#[test]
fn test_transmit_buffer_standard() {
    let id = Id::Standard(StandardId::new(0x123).unwrap());
    let frame = CanFrame::new(id, &[0xAA, 0xBB]).unwrap();

    let mut buf = [0u8; BUFFER_SIZE];
    let len = frame.to_transmit_buffer(&mut buf);

    assert_eq!(7, len);
    assert_eq!([0x24, 0x60, 0x00, 0x00, 0x02, 0xAA, 0xBB], buf[..7]);
}

#[test]
fn test_transmit_buffer_extended() {
    let id = Id::Extended(ExtendedId::new(0x1EAD_BEEF).unwrap());
    let frame = CanFrame::new(id, &[0x01]).unwrap();

    let mut buf = [0u8; BUFFER_SIZE];
    let len = frame.to_transmit_buffer(&mut buf);

    assert_eq!(6, len);
    // SIDH, SIDL (with EXIDE and EID17/16), EID8, EID0
    assert_eq!([0xF5, 0x69, 0xBE, 0xEF, 0x01, 0x01], buf[..6]);
}

#[test]
fn test_transmit_buffer_remote() {
    let id = Id::Standard(StandardId::new(0x7FF).unwrap());
    let frame = CanFrame::new_remote(id, 4).unwrap();

    let mut buf = [0u8; BUFFER_SIZE];
    let len = frame.to_transmit_buffer(&mut buf);

    assert_eq!(9, len);
    assert_eq!([0xFF, 0xE0, 0x00, 0x00, 0x44], buf[..5]);
}

#[test]
fn test_receive_buffer_standard() {
    let buf = [0x24, 0x60, 0x00, 0x00, 0x02, 0xAA, 0xBB, 0, 0, 0, 0, 0, 0];
    let frame = CanFrame::from_receive_buffer(&buf);

    assert_eq!(Id::Standard(StandardId::new(0x123).unwrap()), frame.identifier);
    assert!(!frame.rtr);
    assert_eq!(&[0xAA, 0xBB], frame.data());
}

#[test]
fn test_receive_buffer_extended() {
    let buf = [0xF5, 0x69, 0xBE, 0xEF, 0x01, 0x55, 0, 0, 0, 0, 0, 0, 0];
    let frame = CanFrame::from_receive_buffer(&buf);

    assert_eq!(Id::Extended(ExtendedId::new(0x1EAD_BEEF).unwrap()), frame.identifier);
    assert_eq!(&[0x55], frame.data());
}

#[test]
fn test_receive_buffer_standard_remote() {
    // SRR signals the remote request for standard frames
    let buf = [0x24, 0x70, 0x00, 0x00, 0x03, 0, 0, 0, 0, 0, 0, 0, 0];
    let frame = CanFrame::from_receive_buffer(&buf);

    assert!(frame.rtr);
    assert_eq!(3, frame.dlc);
    assert!(frame.data().iter().all(|b| *b == 0));
}

#[test]
fn test_receive_buffer_extended_remote() {
    // The DLC register RTR bit signals the remote request for extended
    // frames
    let buf = [0xF5, 0x69, 0xBE, 0xEF, 0x42, 0xFF, 0, 0, 0, 0, 0, 0, 0];
    let frame = CanFrame::from_receive_buffer(&buf);

    assert!(frame.rtr);
    assert_eq!(2, frame.dlc);
    // Payload bytes of a remote frame are not copied
    assert!(frame.data().iter().all(|b| *b == 0));
}

#[test]
fn test_receive_buffer_length_clamped() {
    let buf = [0x24, 0x60, 0x00, 0x00, 0x0F, 1, 2, 3, 4, 5, 6, 7, 8];
    let frame = CanFrame::from_receive_buffer(&buf);

    assert_eq!(8, frame.dlc);
    assert_eq!(&[1, 2, 3, 4, 5, 6, 7, 8], frame.data());
}

#[test]
fn test_new_rejects_oversized_payload() {
    let id = Id::Standard(StandardId::new(0x1).unwrap());
    assert!(CanFrame::new(id, &[0; 9]).is_none());
    assert!(CanFrame::new_remote(id, 9).is_none());
}
