//!# Register transfer transport
//!
//! The controller is reached over a byte-serial full-duplex link: every
//! request byte clocked out yields one response byte. How the link is
//! implemented (SPI peripheral, bit-banged, DMA) is up to the platform.
use core::fmt::Debug;

/// Byte-serial register link to the controller.
pub trait RegisterBus {
    type Error: Debug;

    /// Performs one blocking exchange. The response bytes replace the
    /// contents of `buffer`. Only used on the synchronous activation and
    /// deactivation paths.
    fn transfer(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error>;

    /// Queues one exchange and returns immediately.
    ///
    /// Must not block: the driver invokes this while holding its session
    /// lock. Once the exchange finished on the wire, the response bytes
    /// must be handed to
    /// [`Mcp2515::transfer_complete`](crate::can::Mcp2515::transfer_complete).
    ///
    /// The driver guarantees that at most one queued exchange is
    /// outstanding at any instant.
    fn transfer_async(&mut self, request: &[u8]) -> Result<(), Self::Error>;
}
