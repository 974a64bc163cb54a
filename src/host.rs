//!# Host-side collaborators
//!
//! The driver feeds decoded frames into a network stack and relies on a
//! one-shot timer as backstop for the edge-triggered interrupt line. Both
//! are provided by the platform.
use crate::frame::CanFrame;
use embedded_time::duration::Milliseconds;

/// Returned by [`Host::deliver`] when no receive buffer is available
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OutOfBuffers;

/// Host network stack fed by the driver.
///
/// All methods are invoked from wake or completion context while the
/// driver session lock is held; they must not block.
pub trait Host {
    /// Hands a received frame to the network stack. On error the frame is
    /// dropped and counted.
    fn deliver(&mut self, frame: CanFrame) -> Result<(), OutOfBuffers>;

    /// All transmit slots are claimed; stop feeding frames until
    /// [`Host::wake_queue`].
    fn stop_queue(&mut self);

    /// A slot was released, transmission may resume.
    fn wake_queue(&mut self);

    /// Acknowledges one completed transmission of `bytes` payload bytes
    /// from `slot`.
    fn transmit_done(&mut self, slot: usize, bytes: usize);
}

/// One-shot fallback timer polling the controller in case an interrupt
/// edge was missed.
pub trait FallbackTimer {
    /// Arms (or re-arms) the timer. Expiry must invoke
    /// [`Mcp2515::poll`](crate::can::Mcp2515::poll).
    fn arm(&mut self, interval: Milliseconds<u32>);

    /// Disarms the timer. An expiry already in flight may still fire.
    fn cancel(&mut self);
}
