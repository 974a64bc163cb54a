//! # Mock dummy structure for doc examples
use crate::bus::RegisterBus;
use crate::frame::CanFrame;
use crate::host::{FallbackTimer, Host, OutOfBuffers};
use crate::registers::{CANCTRL, CANSTAT, INSTRUCTION_READ, TEC};
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::convert::Infallible;
use embedded_time::clock::Error;
use embedded_time::duration::{Duration, Fraction, Milliseconds};
use embedded_time::fixed_point::FixedPoint;
use embedded_time::timer::param::{Armed, OneShot};
use embedded_time::{Clock, Instant, Timer};

#[derive(Default, Debug)]
pub struct ExampleBus {
    canstat_calls: u32,

    /// Requests queued via [`RegisterBus::transfer_async`]
    pub requests: Vec<Vec<u8>>,
}

impl RegisterBus for ExampleBus {
    type Error = Infallible;

    fn transfer(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error> {
        if buffer[0] != INSTRUCTION_READ {
            return Ok(());
        }

        match buffer[1] {
            CANSTAT => {
                // Post-reset defaults first (detection), requested mode
                // afterwards
                if self.canstat_calls == 0 {
                    self.canstat_calls += 1;
                    buffer[2] = 0x80;
                } else {
                    buffer[2] = 0x00;
                }
            }
            CANCTRL => buffer[2] = 0x87,
            TEC => {
                buffer[2] = 0;
                buffer[3] = 0;
            }
            _ => {}
        }

        Ok(())
    }

    fn transfer_async(&mut self, request: &[u8]) -> Result<(), Self::Error> {
        self.requests.push(request.to_vec());
        Ok(())
    }
}

#[derive(Default, Debug)]
pub struct ExampleHost {
    pub delivered: Vec<CanFrame>,
    pub queue_stopped: bool,
}

impl Host for ExampleHost {
    fn deliver(&mut self, frame: CanFrame) -> Result<(), OutOfBuffers> {
        self.delivered.push(frame);
        Ok(())
    }

    fn stop_queue(&mut self) {
        self.queue_stopped = true;
    }

    fn wake_queue(&mut self) {
        self.queue_stopped = false;
    }

    fn transmit_done(&mut self, _slot: usize, _bytes: usize) {}
}

#[derive(Default, Debug)]
pub struct ExampleTimer {
    pub armed: Option<Milliseconds<u32>>,
}

impl FallbackTimer for ExampleTimer {
    fn arm(&mut self, interval: Milliseconds<u32>) {
        self.armed = Some(interval);
    }

    fn cancel(&mut self) {
        self.armed = None;
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ExampleClock {
    pub next_instants: RefCell<Vec<u64>>,
}

impl ExampleClock {
    pub fn new(next_instants: Vec<u64>) -> Self {
        Self {
            next_instants: RefCell::new(next_instants),
        }
    }
}

impl Default for ExampleClock {
    fn default() -> Self {
        Self::new(vec![
            100, // Mode change: Timer start
            200, // Mode change: First expiration check
        ])
    }
}

impl Clock for ExampleClock {
    type T = u64;
    const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

    fn try_now(&self) -> Result<Instant<Self>, Error> {
        if self.next_instants.borrow().len() == 0 {
            return Err(Error::Unspecified);
        }

        Ok(Instant::new(self.next_instants.borrow_mut().remove(0)))
    }

    fn new_timer<Dur: Duration + FixedPoint>(&self, duration: Dur) -> Timer<OneShot, Armed, Self, Dur> {
        Timer::new(self, duration)
    }
}
