#![cfg_attr(not(test), no_std)]
#![cfg_attr(feature = "strict", deny(warnings))]
#![allow(dead_code)]

//! # Asynchronous driver core for the MCP2515 CAN controller
//!
//! Crate currently offers the following features:
//! * Fully asynchronous register traffic after activation, at most one
//!   exchange outstanding, no blocking waits
//! * Standard and extended ID formats for CAN 2.0 frames
//! * Three-slot transmit ring with host queue flow control
//! * Fallback polling for missed interrupt edges
//! * no_std support
//!
//! The platform provides the transport ([`bus::RegisterBus`]), the
//! network stack glue ([`host::Host`]) and a one-shot timer
//! ([`host::FallbackTimer`]); the driver core is hardware independent.
//!
//!## Tx example
//!
//!```
//!use mcp2515::can::Mcp2515;
//!use mcp2515::config::{BitTiming, Configuration, ControlMode};
//!use mcp2515::example::{ExampleBus, ExampleClock, ExampleHost, ExampleTimer};
//!use mcp2515::frame::CanFrame;
//!use embedded_can::{Frame, Id, StandardId};
//!
//!let clock = ExampleClock::default();
//!
//!let mut driver = Mcp2515::new(ExampleBus::default(), ExampleHost::default(), ExampleTimer::default());
//!
//!// Verify the chip responds on the bus
//!driver.detect().unwrap();
//!
//!// Bring the controller up in normal mode
//!driver
//!    .start(
//!        &Configuration {
//!            bit_timing: BitTiming::default(),
//!            mode: ControlMode {
//!                loopback: false,
//!                listen_only: false,
//!                triple_sample: false,
//!                one_shot: false,
//!            },
//!        },
//!        &clock,
//!    )
//!    .unwrap();
//!
//!// Queue a frame for transmission
//!let can_id = Id::Standard(StandardId::new(0x55).unwrap());
//!let frame = CanFrame::new(can_id, &[1, 2, 3]).unwrap();
//!driver.transmit(frame).unwrap();
//!
//!// The load exchange is now in flight; once the platform reports the
//!// completion the driver issues the request-to-send on its own.
//!assert!(driver.is_busy());
//!```

extern crate alloc;

pub mod bus;
pub mod can;
pub mod config;
pub mod frame;
pub mod host;
pub mod registers;
pub mod ring;
pub mod status;

pub mod example;
#[cfg(test)]
pub(crate) mod mocks;
#[cfg(test)]
mod tests;
