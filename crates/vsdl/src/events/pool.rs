//! Reusable native event buffers.

use std::fmt;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Size of the native SDL_Event union.
pub const EVENT_SIZE: usize = 56;

/// One native event record, aligned like the C union it is written into.
#[repr(C, align(8))]
#[derive(Clone, PartialEq, Eq)]
pub struct RawEvent {
    bytes: [u8; EVENT_SIZE],
}

impl RawEvent {
    pub const fn zeroed() -> Self {
        Self {
            bytes: [0; EVENT_SIZE],
        }
    }

    /// Leading discriminant.
    pub fn kind(&self) -> u32 {
        self.u32_at(0)
    }

    pub fn as_bytes(&self) -> &[u8; EVENT_SIZE] {
        &self.bytes
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8; EVENT_SIZE] {
        &mut self.bytes
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.bytes.as_mut_ptr()
    }

    // Fields are stored in host byte order, as the native library wrote them.

    pub(crate) fn u8_at(&self, offset: usize) -> u8 {
        self.bytes[offset]
    }

    pub(crate) fn u16_at(&self, offset: usize) -> u16 {
        let b = &self.bytes;
        u16::from_ne_bytes([b[offset], b[offset + 1]])
    }

    pub(crate) fn u32_at(&self, offset: usize) -> u32 {
        let b = &self.bytes;
        u32::from_ne_bytes([b[offset], b[offset + 1], b[offset + 2], b[offset + 3]])
    }

    pub(crate) fn i32_at(&self, offset: usize) -> i32 {
        self.u32_at(offset) as i32
    }
}

impl Default for RawEvent {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl fmt::Debug for RawEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawEvent")
            .field("kind", &format_args!("{:#x}", self.kind()))
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct PoolInner {
    free: Mutex<Vec<Box<RawEvent>>>,
    allocated: AtomicUsize,
}

impl PoolInner {
    fn put(&self, buffer: Box<RawEvent>) {
        self.free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(buffer);
    }
}

/// Free list of event buffers shared by the decoder and event consumers.
///
/// Steady-state polling allocates nothing: a buffer is only created when the
/// free list is empty.
#[derive(Clone, Default)]
pub struct EventPool {
    inner: Arc<PoolInner>,
}

impl EventPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a buffer, allocating only if none is free.
    pub fn acquire(&self) -> PooledEvent {
        let recycled = self
            .inner
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        let buffer = recycled.unwrap_or_else(|| {
            self.inner.allocated.fetch_add(1, Ordering::Relaxed);
            Box::new(RawEvent::zeroed())
        });

        PooledEvent {
            buffer: ManuallyDrop::new(buffer),
            pool: Arc::clone(&self.inner),
        }
    }

    /// Buffers created over the pool's lifetime.
    pub fn allocated(&self) -> usize {
        self.inner.allocated.load(Ordering::Relaxed)
    }

    /// Buffers currently sitting in the free list.
    pub fn available(&self) -> usize {
        self.inner
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl fmt::Debug for EventPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventPool")
            .field("allocated", &self.allocated())
            .field("available", &self.available())
            .finish()
    }
}

/// A buffer checked out of an [`EventPool`].
///
/// Exactly one owner at a time. Dropping or [`release`](Self::release)-ing
/// it puts the buffer back; since release consumes the handle, a buffer can
/// not be returned twice or read after return.
pub struct PooledEvent {
    buffer: ManuallyDrop<Box<RawEvent>>,
    pool: Arc<PoolInner>,
}

impl PooledEvent {
    pub fn release(self) {
        drop(self);
    }
}

impl Deref for PooledEvent {
    type Target = RawEvent;

    fn deref(&self) -> &RawEvent {
        &self.buffer
    }
}

impl DerefMut for PooledEvent {
    fn deref_mut(&mut self) -> &mut RawEvent {
        &mut self.buffer
    }
}

impl Drop for PooledEvent {
    fn drop(&mut self) {
        // SAFETY: `buffer` is not touched again after being taken here.
        let buffer = unsafe { ManuallyDrop::take(&mut self.buffer) };
        self.pool.put(buffer);
    }
}

impl fmt::Debug for PooledEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self.buffer, f)
    }
}
