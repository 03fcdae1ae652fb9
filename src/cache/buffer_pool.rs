use bytes::BytesMut;
use crossbeam::queue::ArrayQueue;
use std::sync::Arc;

use crate::constants::{DEFAULT_BUFFER_POOL_DEPTH, MAX_POOLED_BUFFER_SIZE};

/// Recycles the private buffers of converted pages.
///
/// Converting pagers build a fresh page per request and drop it on release;
/// keeping the buffers around avoids reallocating a full page every time a
/// consumer steps to the next block of rows.
pub struct BufferPool {
    buffers: ArrayQueue<BytesMut>,
}

impl BufferPool {
    pub fn new(depth: usize) -> Arc<Self> {
        Arc::new(Self {
            buffers: ArrayQueue::new(depth.max(1)),
        })
    }

    /// A zero-filled buffer of exactly `size` bytes.
    pub fn get(&self, size: usize) -> BytesMut {
        if let Some(mut buf) = self.buffers.pop() {
            buf.clear();
            if buf.capacity() < size {
                buf.reserve(size);
            }
            buf.resize(size, 0);
            return buf;
        }
        BytesMut::zeroed(size)
    }

    /// Returns a buffer for reuse. Oversized buffers are dropped.
    pub fn put(&self, mut buf: BytesMut) {
        if buf.capacity() > MAX_POOLED_BUFFER_SIZE {
            return;
        }
        buf.clear();
        let _ = self.buffers.push(buf);
    }

    pub fn available(&self) -> usize {
        self.buffers.len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self {
            buffers: ArrayQueue::new(DEFAULT_BUFFER_POOL_DEPTH),
        }
    }
}
