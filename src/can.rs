//!# Asynchronous MCP2515 driver core
//!
//!```
//!# use mcp2515::can::Mcp2515;
//!# use mcp2515::config::Configuration;
//!# use mcp2515::example::{ExampleBus, ExampleClock, ExampleHost, ExampleTimer};
//!# use mcp2515::frame::CanFrame;
//!# use embedded_can::{Frame, Id, StandardId};
//!#
//! let mut driver = Mcp2515::new(ExampleBus::default(), ExampleHost::default(), ExampleTimer::default());
//!
//! // Verify the chip responds, then bring it up with default settings
//! driver.detect().unwrap();
//! driver.start(&Configuration::default(), &ExampleClock::default()).unwrap();
//!
//! // Queue a frame; the driver chains the load and request-send exchanges
//! let id = Id::Standard(StandardId::new(0x55).unwrap());
//! let frame = CanFrame::new(id, &[1, 2, 3]).unwrap();
//! driver.transmit(frame).unwrap();
//!```
//!
//! All register traffic after activation is asynchronous: the driver never
//! blocks and keeps at most one exchange outstanding. Wake sources
//! ([`Mcp2515::interrupt`], [`Mcp2515::poll`], [`Mcp2515::transmit`])
//! either win the busy transition and start a status-read cycle, or record
//! their intent and return. [`Mcp2515::transfer_complete`] chains the
//! follow-up exchange for the step that just finished until the cycle runs
//! dry and the fallback timer is re-armed.

use crate::bus::RegisterBus;
use crate::config::Configuration;
use crate::frame::{CanFrame, BUFFER_SIZE};
use crate::host::{FallbackTimer, Host, OutOfBuffers};
use crate::registers::{
    instruction_load_txb, instruction_read_rxb, instruction_rts, CANCTRL, CANCTRL_REQOP_MASK, CANCTRL_REQOP_SLEEP,
    CANINTE_ERR, CANINTE_RX, CANINTE_TX, CANINTF, CANINTF_RX, CANSTAT, CNF3, EFLG, INSTRUCTION_BIT_MODIFY,
    INSTRUCTION_READ, INSTRUCTION_RESET, INSTRUCTION_WRITE, RXB0CTRL, RXBCTRL_BUKT, RXBCTRL_RXM0, RXBCTRL_RXM1, TEC,
};
use crate::ring::{TxRing, TX_SLOT_COUNT};
use crate::status::{next_action, Action, StatusSnapshot};
use core::cell::RefCell;
use critical_section::Mutex;
use embedded_time::duration::Milliseconds;
use embedded_time::Clock;
use log::{debug, error, info};

/// Interval of the fallback poll timer, armed whenever the scheduler goes
/// idle
pub const FALLBACK_POLL_INTERVAL: Milliseconds<u32> = Milliseconds(200);

/// Bound for the synchronous mode-change poll at activation
const MODE_CHANGE_TIMEOUT: Milliseconds<u32> = Milliseconds(1_000);

/// Timer expiries skipped while busy before a diagnostic is logged
const SKIP_LOG_THRESHOLD: u32 = 10;

/// Largest exchange: read-receive-buffer instruction plus the buffer image
const TRANSFER_SIZE: usize = 1 + BUFFER_SIZE;

/// Errors of the synchronous activation path
#[derive(Debug, PartialEq, Eq)]
pub enum StartError<E> {
    /// Transport failure
    Bus(E),
    /// System clock failure during the mode-change window
    Clock,
    /// Status and control registers do not match the documented post-reset
    /// defaults; no MCP2515 is present on the bus
    NotDetected { canstat: u8, canctrl: u8 },
    /// The controller did not reach the requested mode within the bounded
    /// poll window
    ModeTimeout,
}

impl<E> From<embedded_time::clock::Error> for StartError<E> {
    fn from(_error: embedded_time::clock::Error) -> Self {
        StartError::Clock
    }
}

/// Errors reported for a rejected transmit request
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransmitError {
    /// All transmit slots are claimed; the host queue has been stopped
    QueueFull,
}

/// Frame and byte counters kept across the lifetime of the driver
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Stats {
    pub rx_packets: u32,
    pub rx_bytes: u32,
    /// Frames discarded because the host had no receive buffer
    pub rx_dropped: u32,
    /// Receive buffer overruns reported via EFLG
    pub rx_over_errors: u32,
    pub tx_packets: u32,
    pub tx_bytes: u32,
}

/// Transmit/receive error counter pair (TEC/REC)
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ErrorCounters {
    pub transmit: u8,
    pub receive: u8,
}

/// Logical step that produced the outstanding exchange; selects the
/// follow-up when the completion arrives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Step {
    ReadFlags,
    ReadRxb0,
    ReadRxb1,
    ClearInterruptFlags,
    ClearErrorFlags,
    LoadTxb,
    RequestToSend,
}

impl Step {
    /// Minimum response length the completion handler dereferences
    fn response_len(&self) -> usize {
        match self {
            Step::ReadFlags => 4,
            Step::ReadRxb0 | Step::ReadRxb1 => TRANSFER_SIZE,
            _ => 0,
        }
    }
}

/// Per-chip session state, guarded by the driver's critical-section lock
struct Session<B, H, T> {
    bus: B,
    host: H,
    timer: T,

    /// Last-observed CANINTF/EFLG values
    snapshot: StatusSnapshot,
    /// Set while a status-read cycle is running, i.e. an asynchronous
    /// exchange is outstanding or about to be chained
    busy: bool,
    /// A wake arrived while busy; honour it with one extra status read
    deferred_interrupt: bool,
    /// The running cycle was started by the fallback timer, not an
    /// interrupt edge
    timer_initiated: bool,
    /// Timer expiries skipped because the scheduler was busy
    skip: u32,
    ring: TxRing,
    /// Tag of the outstanding exchange
    pending: Option<Step>,
    /// Request buffer of the outstanding exchange
    tx_buf: [u8; TRANSFER_SIZE],
    stats: Stats,
}

impl<B, H, T> Session<B, H, T>
where
    B: RegisterBus,
    H: Host,
    T: FallbackTimer,
{
    /// Queues the exchange for `step`.
    ///
    /// A rejected submission is only logged: this layer never retries, the
    /// next interrupt or timer expiry is the recovery path. The scheduler
    /// is released so that such a wake can win the busy transition again.
    fn submit(&mut self, step: Step, len: usize) {
        self.pending = Some(step);

        if let Err(err) = self.bus.transfer_async(&self.tx_buf[..len]) {
            error!("submitting {:?} exchange failed: {:?}", step, err);
            self.pending = None;

            // Park the affected slot again so a later cycle retries the
            // load instead of leaking the slot
            if matches!(step, Step::LoadTxb | Step::RequestToSend) {
                let index = self.ring.loaded();
                self.ring.mark_pending(index);
            }

            self.idle();
        }
    }

    /// Releases the scheduler and arms the fallback poll
    fn idle(&mut self) {
        self.busy = false;
        // A cycle that dies before its status read completes must not
        // leave the marker behind for the next, possibly
        // interrupt-initiated, cycle
        self.timer_initiated = false;
        self.timer.arm(FALLBACK_POLL_INTERVAL);
    }

    /// Reads CANINTF and EFLG in one shot
    fn read_flags(&mut self) {
        self.tx_buf[0] = INSTRUCTION_READ;
        self.tx_buf[1] = CANINTF;
        self.tx_buf[2] = 0; // CANINTF
        self.tx_buf[3] = 0; // EFLG
        self.submit(Step::ReadFlags, 4);
    }

    fn read_rxb(&mut self, step: Step, instruction: u8) {
        self.tx_buf = [0; TRANSFER_SIZE];
        self.tx_buf[0] = instruction;
        self.submit(step, TRANSFER_SIZE);
    }

    /// Clears the CANINTF bits of the snapshot. The receive flags were
    /// already cleared by the buffer read itself.
    fn clear_interrupt_flags(&mut self) {
        self.tx_buf[0] = INSTRUCTION_BIT_MODIFY;
        self.tx_buf[1] = CANINTF;
        self.tx_buf[2] = u8::from(self.snapshot.canintf) & !CANINTF_RX; // mask
        self.tx_buf[3] = 0; // data
        self.submit(Step::ClearInterruptFlags, 4);
    }

    fn clear_error_flags(&mut self) {
        self.tx_buf[0] = INSTRUCTION_BIT_MODIFY;
        self.tx_buf[1] = EFLG;
        self.tx_buf[2] = u8::from(self.snapshot.eflg); // mask
        self.tx_buf[3] = 0; // data
        self.submit(Step::ClearErrorFlags, 4);
    }

    /// Loads the frame of `index` into the matching hardware buffer
    fn load_txb(&mut self, index: usize) {
        let frame = match self.ring.frame(index) {
            Some(frame) => *frame,
            None => {
                error!("transmit slot {} claimed without a frame", index);
                self.read_flags();
                return;
            }
        };

        let mut image = [0; BUFFER_SIZE];
        let len = frame.to_transmit_buffer(&mut image);

        self.ring.set_loaded(index);
        self.tx_buf[0] = instruction_load_txb(index as u8);
        self.tx_buf[1..].copy_from_slice(&image);
        self.submit(Step::LoadTxb, 1 + len);
    }

    /// Requests transmission of the buffer loaded last
    fn rts_txb(&mut self) {
        self.tx_buf[0] = instruction_rts(self.ring.loaded() as u8);
        self.submit(Step::RequestToSend, 1);
    }

    fn read_flags_complete(&mut self, response: &[u8]) {
        self.snapshot = StatusSnapshot::from_registers(response[2], response[3]);

        // We really ought never miss the edge-triggered interrupt, but if
        // we did and this poll caught it, note so here.
        if self.timer_initiated {
            self.timer_initiated = false;
            if self.snapshot.canintf.any() || self.snapshot.eflg.any() {
                debug!(
                    "fallback poll found flags an interrupt should have announced: CANINTF={:#04x} EFLG={:#04x}",
                    u8::from(self.snapshot.canintf),
                    u8::from(self.snapshot.eflg)
                );
            }
        }

        match next_action(&self.snapshot, self.ring.has_pending(), self.deferred_interrupt) {
            Action::ReadRxb0 => self.read_rxb(Step::ReadRxb0, instruction_read_rxb(0)),
            Action::ReadRxb1 => self.read_rxb(Step::ReadRxb1, instruction_read_rxb(1)),
            Action::ClearInterruptFlags => self.clear_interrupt_flags(),
            Action::LoadPendingSlot => self.transmit_or_read_flags(),
            Action::ReadFlagsAgain => {
                self.deferred_interrupt = false;
                self.read_flags();
            }
            Action::Idle => self.idle(),
        }
    }

    /// Decodes one receive buffer image and hands the frame to the host
    fn receive(&mut self, response: &[u8]) {
        let frame = CanFrame::from_receive_buffer(&response[1..]);

        match self.host.deliver(frame) {
            Ok(()) => {
                self.stats.rx_packets += 1;
                self.stats.rx_bytes += frame.dlc as u32;
            }
            Err(OutOfBuffers) => self.stats.rx_dropped += 1,
        }
    }

    /// Post-receive decision: a parked transmit goes first, else return to
    /// the status read
    fn transmit_or_read_flags(&mut self) {
        match self.ring.take_pending() {
            Some(index) => self.load_txb(index),
            None => self.read_flags(),
        }
    }

    fn read_rxb0_complete(&mut self, response: &[u8]) {
        self.receive(response);

        if self.snapshot.canintf.rx1if() {
            self.read_rxb(Step::ReadRxb1, instruction_read_rxb(1));
        } else {
            self.transmit_or_read_flags();
        }
    }

    fn read_rxb1_complete(&mut self, response: &[u8]) {
        self.receive(response);
        self.transmit_or_read_flags();
    }

    fn clear_interrupt_flags_complete(&mut self) {
        for index in 0..TX_SLOT_COUNT {
            if self.snapshot.canintf.txif(index) {
                if let Some(frame) = self.ring.complete(index) {
                    self.stats.tx_packets += 1;
                    self.stats.tx_bytes += frame.dlc as u32;
                    self.host.transmit_done(index, frame.dlc);
                }
            }
        }

        if self.ring.queue_stopped() && !self.ring.is_full() {
            self.ring.set_queue_stopped(false);
            self.host.wake_queue();
        }

        if self.snapshot.eflg.any() {
            self.clear_error_flags();
        } else {
            self.read_flags();
        }
    }

    fn clear_error_flags_complete(&mut self) {
        if self.snapshot.eflg.overrun() {
            self.stats.rx_over_errors += 1;
        }

        self.read_flags();
    }

    // Synchronous helpers for the activation path

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), B::Error> {
        let mut buffer = [INSTRUCTION_WRITE, reg, value];
        self.bus.transfer(&mut buffer)
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, B::Error> {
        let mut buffer = [INSTRUCTION_READ, reg, 0];
        self.bus.transfer(&mut buffer)?;
        Ok(buffer[2])
    }

    fn read_2regs(&mut self, reg: u8) -> Result<(u8, u8), B::Error> {
        let mut buffer = [INSTRUCTION_READ, reg, 0, 0];
        self.bus.transfer(&mut buffer)?;
        Ok((buffer[2], buffer[3]))
    }

    /// Resets internal registers to their defaults and enters
    /// configuration mode
    fn reset(&mut self) -> Result<(), B::Error> {
        let mut buffer = [INSTRUCTION_RESET];
        self.bus.transfer(&mut buffer)
    }

    fn sleep(&mut self) -> Result<(), B::Error> {
        self.write_reg(CANCTRL, CANCTRL_REQOP_SLEEP)
    }
}

/// Asynchronous MCP2515 driver.
///
/// One instance per attached chip. The session state is behind a
/// non-blocking critical-section lock, so the wake entry points and the
/// completion callback may be invoked concurrently from interrupt, timer
/// and transmit contexts. Activation and deactivation take `&mut self`
/// and run synchronously.
pub struct Mcp2515<B, H, T> {
    session: Mutex<RefCell<Session<B, H, T>>>,
}

impl<B, H, T> Mcp2515<B, H, T>
where
    B: RegisterBus,
    H: Host,
    T: FallbackTimer,
{
    pub fn new(bus: B, host: H, timer: T) -> Self {
        Self {
            session: Mutex::new(RefCell::new(Session {
                bus,
                host,
                timer,
                snapshot: StatusSnapshot::default(),
                busy: false,
                deferred_interrupt: false,
                timer_initiated: false,
                skip: 0,
                ring: TxRing::new(),
                pending: None,
                tx_buf: [0; TRANSFER_SIZE],
                stats: Stats::default(),
            })),
        }
    }

    /// Verifies that an MCP2515 responds on the bus, then puts it to
    /// sleep.
    ///
    /// The check compares CANSTAT and CANCTRL against the documented
    /// post-reset defaults, which rules out the common all-zeroes and
    /// all-ones failure patterns of a floating bus.
    pub fn detect(&mut self) -> Result<(), StartError<B::Error>> {
        let session = self.session.get_mut().get_mut();

        session.reset().map_err(StartError::Bus)?;

        let canstat = session.read_reg(CANSTAT).map_err(StartError::Bus)?;
        let canctrl = session.read_reg(CANCTRL).map_err(StartError::Bus)?;
        debug!("chip detection: canstat={:#04x} canctrl={:#04x}", canstat, canctrl);

        if canstat & 0xEE != 0x80 || canctrl & 0x17 != 0x07 {
            return Err(StartError::NotDetected { canstat, canctrl });
        }

        session.sleep().map_err(StartError::Bus)?;
        Ok(())
    }

    /// Resets the controller, writes bit timing, interrupt enables and
    /// receive buffer control, and enters the requested mode.
    ///
    /// The mode change is the only synchronously polled step: CANSTAT is
    /// re-read until the mode sticks or the one second window elapses. On
    /// success the host queue is woken and the fallback timer armed.
    pub fn start<CLK: Clock>(&mut self, config: &Configuration, clock: &CLK) -> Result<(), StartError<B::Error>> {
        let session = self.session.get_mut().get_mut();

        session.reset().map_err(StartError::Bus)?;

        // CNF3, CNF2, CNF1 and CANINTE occupy consecutive addresses and
        // are written in one sequential exchange.
        let cnf = config.bit_timing.as_cnf_bytes(config.mode.triple_sample);
        info!("writing CNF: {:#04x} {:#04x} {:#04x}", cnf[2], cnf[1], cnf[0]);
        let mut buffer = [
            INSTRUCTION_WRITE,
            CNF3,
            cnf[0],
            cnf[1],
            cnf[2],
            CANINTE_RX | CANINTE_TX | CANINTE_ERR,
        ];
        session.bus.transfer(&mut buffer).map_err(StartError::Bus)?;

        // Accept any frame in both receive buffers; let buffer 0 roll
        // over into buffer 1 while it is still unread (BUKT).
        let mut buffer = [
            INSTRUCTION_WRITE,
            RXB0CTRL,
            RXBCTRL_RXM1 | RXBCTRL_RXM0 | RXBCTRL_BUKT,
            RXBCTRL_RXM1 | RXBCTRL_RXM0,
        ];
        session.bus.transfer(&mut buffer).map_err(StartError::Bus)?;

        let mode = config.mode.as_canctrl();
        session.write_reg(CANCTRL, mode).map_err(StartError::Bus)?;

        let deadline = clock
            .try_now()?
            .checked_add(MODE_CHANGE_TIMEOUT)
            .ok_or(StartError::Clock)?;

        loop {
            let canstat = session.read_reg(CANSTAT).map_err(StartError::Bus)?;
            if canstat & CANCTRL_REQOP_MASK == mode & CANCTRL_REQOP_MASK {
                break;
            }

            if clock.try_now()? > deadline {
                error!("controller did not enter the requested mode");
                session.sleep().map_err(StartError::Bus)?;
                return Err(StartError::ModeTimeout);
            }
        }

        session.ring.set_queue_stopped(false);
        session.host.wake_queue();
        session.timer.arm(FALLBACK_POLL_INTERVAL);

        Ok(())
    }

    /// Deactivates the controller: stops the host queue, resets the chip,
    /// requests sleep mode and releases the frames still held by the
    /// transmit ring.
    ///
    /// Shutdown is a drain, not a cancel: the caller must disable the
    /// interrupt source, disarm the fallback timer and wait for
    /// [`Mcp2515::is_busy`] to clear before calling this.
    pub fn stop(&mut self) -> Result<(), StartError<B::Error>> {
        let session = self.session.get_mut().get_mut();

        session.timer.cancel();
        session.host.stop_queue();

        session.reset().map_err(StartError::Bus)?;
        session.sleep().map_err(StartError::Bus)?;

        session.ring.clear();
        session.snapshot = StatusSnapshot::default();
        session.busy = false;
        session.deferred_interrupt = false;
        session.timer_initiated = false;
        session.pending = None;

        Ok(())
    }

    /// True while an asynchronous exchange is outstanding
    pub fn is_busy(&self) -> bool {
        critical_section::with(|cs| self.session.borrow_ref(cs).busy)
    }

    /// Snapshot of the frame and byte counters
    pub fn stats(&self) -> Stats {
        critical_section::with(|cs| self.session.borrow_ref(cs).stats)
    }

    /// Reads the transmit and receive error counters in one exchange
    pub fn error_counters(&mut self) -> Result<ErrorCounters, B::Error> {
        let session = self.session.get_mut().get_mut();

        let (transmit, receive) = session.read_2regs(TEC)?;
        Ok(ErrorCounters { transmit, receive })
    }

    /// Interrupt wake, called from a non-blocking bottom-half context.
    ///
    /// Starts a status-read cycle, or records a deferred wake if an
    /// exchange is already outstanding. Any number of interrupts during
    /// one busy period coalesce into a single extra cycle.
    pub fn interrupt(&self) {
        critical_section::with(|cs| {
            let mut session = self.session.borrow_ref_mut(cs);

            if session.busy {
                session.deferred_interrupt = true;
                return;
            }
            session.busy = true;

            session.read_flags();
        });
    }

    /// Fallback timer expiry; polls the controller in case an interrupt
    /// edge was missed.
    pub fn poll(&self) {
        critical_section::with(|cs| {
            let mut session = self.session.borrow_ref_mut(cs);

            if session.busy {
                session.skip += 1;
                if session.skip > SKIP_LOG_THRESHOLD {
                    debug!("continually busy (now {} times)", session.skip);
                }
                return;
            }
            session.busy = true;
            session.skip = 0;
            session.timer_initiated = true;

            session.read_flags();
        });
    }

    /// Queues a frame for transmission.
    ///
    /// The frame is loaded into its hardware buffer immediately when the
    /// scheduler is idle, and parked in its slot for the running cycle to
    /// dequeue otherwise. When the claim fills the last slot the host
    /// queue is stopped; it is woken again once a transmission completes.
    pub fn transmit(&self, frame: CanFrame) -> Result<(), TransmitError> {
        critical_section::with(|cs| {
            let mut session = self.session.borrow_ref_mut(cs);

            let index = match session.ring.claim(frame) {
                Some(index) => index,
                None => {
                    session.ring.set_queue_stopped(true);
                    session.host.stop_queue();
                    return Err(TransmitError::QueueFull);
                }
            };

            if session.ring.is_full() {
                session.ring.set_queue_stopped(true);
                session.host.stop_queue();
            }

            if session.busy {
                session.ring.mark_pending(index);
                return Ok(());
            }
            session.busy = true;

            session.load_txb(index);
            Ok(())
        })
    }

    /// Completion of the outstanding asynchronous exchange. `response`
    /// holds the full-duplex bytes received while the request was clocked
    /// out.
    ///
    /// Every completion either submits the follow-up exchange or returns
    /// the scheduler to idle; no response payload can break that.
    pub fn transfer_complete(&self, response: &[u8]) {
        critical_section::with(|cs| {
            let mut session = self.session.borrow_ref_mut(cs);

            let step = match session.pending.take() {
                Some(step) => step,
                None => {
                    debug!("completion without an outstanding exchange");
                    return;
                }
            };

            if response.len() < step.response_len() {
                error!("short {:?} response: {} bytes", step, response.len());
                session.idle();
                return;
            }

            match step {
                Step::ReadFlags => session.read_flags_complete(response),
                Step::ReadRxb0 => session.read_rxb0_complete(response),
                Step::ReadRxb1 => session.read_rxb1_complete(response),
                Step::ClearInterruptFlags => session.clear_interrupt_flags_complete(),
                Step::ClearErrorFlags => session.clear_error_flags_complete(),
                Step::LoadTxb => session.rts_txb(),
                Step::RequestToSend => session.read_flags(),
            }
        });
    }
}
