//! Ring allocator for per-draw uniform data.
//!
//! Instead of one small uniform buffer per object (rewritten before every
//! draw), the renderer reserves slices out of one large buffer and binds
//! them with dynamic offsets. Each reservation is rounded up to the 256-byte
//! granularity that uniform offsets must be aligned to, the cursor bumps
//! forward, and when a reservation would run past the end it wraps back to
//! offset zero.
//!
//! # The wraparound hazard
//!
//! Nothing tracks whether the GPU has finished reading a region before the
//! cursor wraps over it. The contract is capacity: [`UniformRing::new`]
//! rejects any configuration whose capacity cannot hold at least two
//! worst-case frames, so by the time the cursor laps itself the writes it
//! overwrites are at least a frame old. There is no fence and no occupancy
//! tracking at runtime.

use crate::error::Error;
use crate::gpu::GpuContext;

/// Alignment every reservation is rounded to. Matches wgpu's default
/// `min_uniform_buffer_offset_alignment`.
pub const RING_GRANULARITY: u64 = 256;

/// Pure bump-and-wrap cursor arithmetic, separate from the GPU buffer so
/// the reservation pattern is testable on its own.
#[derive(Clone, Copy, Debug)]
pub struct RingCursor {
    capacity: u64,
    granularity: u64,
    offset: u64,
}

impl RingCursor {
    pub fn new(capacity: u64, granularity: u64) -> Self {
        Self {
            capacity,
            granularity,
            offset: 0,
        }
    }

    /// Reserves space for `size` bytes and returns the reservation offset.
    ///
    /// The size is rounded up to the granularity. A reservation that would
    /// reach or pass the end of the arena wraps to offset zero first.
    pub fn reserve(&mut self, size: u64) -> u64 {
        let reserved = size.div_ceil(self.granularity) * self.granularity;
        if self.offset + reserved >= self.capacity {
            self.offset = 0;
        }
        let at = self.offset;
        self.offset += reserved;
        at
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// The current write position, shown by the debug overlay.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

/// One large GPU uniform buffer fed through a [`RingCursor`].
///
/// [`UniformRing::push`] reserves a slice and uploads into it through the
/// queue; the returned offset is what the renderer passes as the dynamic
/// offset at `set_bind_group` time.
pub struct UniformRing {
    buffer: wgpu::Buffer,
    cursor: RingCursor,
}

impl UniformRing {
    /// Creates a ring of `capacity` bytes, validated against the declared
    /// worst-case per-frame allocation volume.
    ///
    /// Returns [`Error::RingCapacity`] unless the capacity holds at least
    /// two worst-case frames, which is what makes the unfenced wraparound
    /// safe in practice.
    pub fn new(gpu: &GpuContext, capacity: u64, worst_case_frame: u64) -> Result<Self, Error> {
        let capacity = capacity.div_ceil(RING_GRANULARITY) * RING_GRANULARITY;
        if capacity < worst_case_frame.saturating_mul(2) {
            return Err(Error::RingCapacity {
                capacity,
                frame: worst_case_frame,
            });
        }

        let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Uniform Ring"),
            size: capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            buffer,
            cursor: RingCursor::new(capacity, RING_GRANULARITY),
        })
    }

    /// Reserves a slice, uploads `bytes` into it, and returns the dynamic
    /// offset to bind it at.
    pub fn push(&mut self, queue: &wgpu::Queue, bytes: &[u8]) -> u32 {
        let offset = self.cursor.reserve(bytes.len() as u64);
        queue.write_buffer(&self.buffer, offset, bytes);
        offset as u32
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn offset(&self) -> u64 {
        self.cursor.offset()
    }

    pub fn capacity(&self) -> u64 {
        self.cursor.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservations_are_rounded_to_granularity() {
        let mut cursor = RingCursor::new(4096, 256);
        assert_eq!(cursor.reserve(1), 0);
        assert_eq!(cursor.reserve(256), 256);
        assert_eq!(cursor.reserve(257), 512);
        // The 257-byte reservation consumed two slots.
        assert_eq!(cursor.offset(), 1024);
    }

    #[test]
    fn sums_below_capacity_never_wrap() {
        let mut cursor = RingCursor::new(256 * 10, 256);
        let mut last = 0;
        for i in 0..9 {
            let at = cursor.reserve(200);
            assert_eq!(at, i as u64 * 256);
            last = at;
        }
        assert_eq!(last, 2048);
    }

    #[test]
    fn overflowing_reservation_wraps_to_zero_first() {
        let mut cursor = RingCursor::new(1024, 256);
        cursor.reserve(512);
        cursor.reserve(256);
        // 768 + 512 > 1024: the whole reservation restarts at zero.
        assert_eq!(cursor.reserve(512), 0);
        assert_eq!(cursor.offset(), 512);
    }

    #[test]
    fn exactly_reaching_the_end_also_wraps() {
        let mut cursor = RingCursor::new(1024, 256);
        cursor.reserve(768);
        // 768 + 256 == 1024 triggers the wrap; the slice at the very end
        // of the arena is never handed out.
        assert_eq!(cursor.reserve(256), 0);
    }

    #[test]
    fn wrapped_cursor_keeps_allocating_sequentially() {
        let mut cursor = RingCursor::new(1024, 256);
        cursor.reserve(1000);
        assert_eq!(cursor.reserve(256), 0);
        assert_eq!(cursor.reserve(256), 256);
        assert_eq!(cursor.reserve(256), 512);
    }
}
