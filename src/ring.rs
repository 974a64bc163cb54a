use crate::frame::CanFrame;

/// Number of hardware transmit buffers
pub const TX_SLOT_COUNT: usize = 3;

const ALL_SLOTS: u8 = (1 << TX_SLOT_COUNT) - 1;

/// Fixed ring of hardware transmit slots.
///
/// A slot is claimed for a frame by [`TxRing::claim`], parked as pending
/// while the scheduler is busy, and released by [`TxRing::complete`] once
/// the controller acknowledged the transmission. The slot owns its frame
/// exclusively until then.
#[derive(Debug, Default)]
pub struct TxRing {
    frames: [Option<CanFrame>; TX_SLOT_COUNT],
    busy_map: u8,
    pending_map: u8,
    loaded: usize,
    queue_stopped: bool,
}

impl TxRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the lowest-indexed free slot for `frame`, or `None` if all
    /// slots are occupied.
    pub fn claim(&mut self, frame: CanFrame) -> Option<usize> {
        let index = (0..TX_SLOT_COUNT).find(|i| self.busy_map & (1 << i) == 0)?;

        self.busy_map |= 1 << index;
        self.frames[index] = Some(frame);
        Some(index)
    }

    pub fn is_full(&self) -> bool {
        self.busy_map >= ALL_SLOTS
    }

    /// Parks a claimed slot until the scheduler dequeues it
    pub fn mark_pending(&mut self, index: usize) {
        self.pending_map |= 1 << index;
    }

    pub fn has_pending(&self) -> bool {
        self.pending_map != 0
    }

    /// Dequeues the lowest-indexed pending slot
    pub fn take_pending(&mut self) -> Option<usize> {
        let index = (0..TX_SLOT_COUNT).find(|i| self.pending_map & (1 << i) != 0)?;

        self.pending_map &= !(1 << index);
        Some(index)
    }

    /// Frame held by a claimed slot
    pub fn frame(&self, index: usize) -> Option<&CanFrame> {
        self.frames[index].as_ref()
    }

    /// Releases a slot after the controller acknowledged its transmission,
    /// returning the frame for completion accounting.
    pub fn complete(&mut self, index: usize) -> Option<CanFrame> {
        let frame = self.frames[index].take()?;

        self.busy_map &= !(1 << index);
        self.pending_map &= !(1 << index);
        Some(frame)
    }

    /// Number of claimed slots
    pub fn occupancy(&self) -> usize {
        self.busy_map.count_ones() as usize
    }

    /// Remembers which slot the load exchange currently in flight targets
    pub fn set_loaded(&mut self, index: usize) {
        self.loaded = index;
    }

    pub fn loaded(&self) -> usize {
        self.loaded
    }

    pub fn queue_stopped(&self) -> bool {
        self.queue_stopped
    }

    pub fn set_queue_stopped(&mut self, stopped: bool) {
        self.queue_stopped = stopped;
    }

    /// Drops all claimed frames, e.g. at deactivation
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
