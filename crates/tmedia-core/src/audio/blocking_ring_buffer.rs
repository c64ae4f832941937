// crates/tmedia-core/src/audio/blocking_ring_buffer.rs
//
// BlockingAudioRingBuffer wraps AudioRingBuffer behind a single Mutex and a
// single Condvar that is notified on *any* state change (room becoming
// available or data becoming available). Every operation re-checks its
// predicate after waking — spurious wakeups and "wrong reason" wakeups
// (the producer waiting for room woken by the consumer's notify) are
// handled identically.
//
// Thread-safety contract: at most one producer and one consumer thread
// call into this type concurrently. Channel count and sample rate are
// immutable after construction and read without locking.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

use super::ring_buffer::AudioRingBuffer;

pub struct BlockingAudioRingBuffer {
    inner: Mutex<AudioRingBuffer>,
    cond: Condvar,
    channels: usize,
    sample_rate: u32,
}

impl BlockingAudioRingBuffer {
    pub fn new(capacity_frames: usize, channels: usize, sample_rate: u32, start_time: f64) -> Self {
        Self {
            inner: Mutex::new(AudioRingBuffer::new(capacity_frames, channels, sample_rate, start_time)),
            cond: Condvar::new(),
            channels,
            sample_rate,
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Blocks until `readable_frames() >= n`, then reads and notifies.
    pub fn read_into(&self, n: usize, out: &mut [f32]) {
        let mut guard = self
            .cond
            .wait_while(self.inner.lock().unwrap(), |rb| rb.readable_frames() < n)
            .unwrap();
        guard.read_into(n, out);
        self.cond.notify_all();
    }

    /// Returns `true` on success, `false` if `timeout` elapses first.
    pub fn try_read_into(&self, n: usize, out: &mut [f32], timeout: Duration) -> bool {
        let guard = self.inner.lock().unwrap();
        let (mut guard, _result) = self
            .cond
            .wait_timeout_while(guard, timeout, |rb| rb.readable_frames() < n)
            .unwrap();
        if guard.readable_frames() < n {
            return false;
        }
        guard.read_into(n, out);
        self.cond.notify_all();
        true
    }

    /// Blocks until `writable_frames() >= n`, then writes and notifies.
    pub fn write_into(&self, n: usize, input: &[f32]) {
        let mut guard = self
            .cond
            .wait_while(self.inner.lock().unwrap(), |rb| rb.writable_frames() < n)
            .unwrap();
        guard.write_into(n, input);
        self.cond.notify_all();
    }

    pub fn try_write_into(&self, n: usize, input: &[f32], timeout: Duration) -> bool {
        let guard = self.inner.lock().unwrap();
        let (mut guard, _result) = self
            .cond
            .wait_timeout_while(guard, timeout, |rb| rb.writable_frames() < n)
            .unwrap();
        if guard.writable_frames() < n {
            return false;
        }
        guard.write_into(n, input);
        self.cond.notify_all();
        true
    }

    /// Waits until `is_time_in_bounds(t)` holds, or `timeout` elapses.
    pub fn try_set_time_in_bounds(&self, t: f64, timeout: Duration) -> bool {
        let guard = self.inner.lock().unwrap();
        let (mut guard, _result) = self
            .cond
            .wait_timeout_while(guard, timeout, |rb| !rb.is_time_in_bounds(t))
            .unwrap();
        if !guard.is_time_in_bounds(t) {
            return false;
        }
        guard.set_time_in_bounds(t);
        true
    }

    pub fn clear(&self, new_start: f64) {
        let mut guard = self.inner.lock().unwrap();
        guard.clear(new_start);
        drop(guard);
        self.cond.notify_all();
    }

    pub fn current_time(&self) -> f64 {
        self.inner.lock().unwrap().current_time()
    }

    pub fn end_time(&self) -> f64 {
        self.inner.lock().unwrap().end_time()
    }

    pub fn readable_frames(&self) -> usize {
        self.inner.lock().unwrap().readable_frames()
    }

    pub fn writable_frames(&self) -> usize {
        self.inner.lock().unwrap().writable_frames()
    }

    /// Non-blocking snapshot read used by diagnostics (e.g. the audio-only
    /// visualizer, which peeks the latest samples without taking the
    /// consumer role).
    pub fn peek_into(&self, n: usize, out: &mut [f32]) -> bool {
        let guard = self.inner.lock().unwrap();
        if guard.readable_frames() < n {
            return false;
        }
        guard.peek_into(n, out);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn write_then_read_roundtrip() {
        let rb = BlockingAudioRingBuffer::new(4, 1, 1000, 0.0);
        rb.write_into(4, &[1.0, 2.0, 3.0, 4.0]);
        let mut out = [0.0f32; 4];
        rb.read_into(4, &mut out);
        assert_eq!(out, [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn try_read_times_out_when_empty() {
        let rb = BlockingAudioRingBuffer::new(4, 1, 1000, 0.0);
        let mut out = [0.0f32; 1];
        assert!(!rb.try_read_into(1, &mut out, Duration::from_millis(10)));
    }

    #[test]
    fn blocking_read_wakes_on_write_from_other_thread() {
        let rb = Arc::new(BlockingAudioRingBuffer::new(4, 1, 1000, 0.0));
        let rb2 = Arc::clone(&rb);
        let handle = thread::spawn(move || {
            let mut out = [0.0f32; 2];
            rb2.read_into(2, &mut out);
            out
        });
        thread::sleep(Duration::from_millis(20));
        rb.write_into(2, &[9.0, 10.0]);
        let out = handle.join().unwrap();
        assert_eq!(out, [9.0, 10.0]);
    }

    #[test]
    fn clear_wakes_blocked_waiters() {
        let rb = Arc::new(BlockingAudioRingBuffer::new(4, 1, 1000, 0.0));
        let rb2 = Arc::clone(&rb);
        let handle = thread::spawn(move || {
            let mut out = [0.0f32; 1];
            rb2.try_read_into(1, &mut out, Duration::from_secs(2))
        });
        thread::sleep(Duration::from_millis(20));
        rb.clear(1.0);
        rb.write_into(1, &[42.0]);
        assert!(handle.join().unwrap());
    }
}
