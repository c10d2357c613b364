//! Frame synchronization gate.
//!
//! Arbitrates the depth producer, the color producer and the render consumer
//! over the single-slot reconstruction pipeline. There is no frame queue: the
//! newest depth frame wins and older ones are dropped. A dropped frame is a
//! normal, recoverable outcome.

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Why a frame was dropped by the gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// A reconstruction pass is still in progress.
    Busy,
    /// The renderer has not consumed the previous point cloud yet.
    NotConsumed,
    /// The pipeline is paused.
    Paused,
    /// No rasterized depth data is waiting for a color frame.
    NoDepthPending,
    /// The color frame's pixel format is not supported.
    UnsupportedFormat,
    /// The session has not been connected yet.
    NotConnected,
}

/// Outcome of feeding a frame into the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    /// The frame was accepted and processed.
    Processed,
    /// The frame was dropped; the pipeline continues with the next one.
    Dropped(DropReason),
}

/// Snapshot of the gate's flags and frame bookkeeping.
#[derive(Clone, Copy, Debug)]
pub struct GateState {
    /// A depth frame is being reconstructed (set from depth acceptance until
    /// the color stage completes).
    pub reconstructing: bool,
    /// Rasterized depth data is waiting for a color frame.
    pub color_pending: bool,
    /// Color processing and the render wait are suspended.
    pub paused: bool,
    /// The renderer picked up the latest geometry.
    pub frame_consumed: bool,
    /// New geometry is ready for the renderer.
    pub geometry_updated: bool,
    /// Sample count of the depth frame in flight.
    pub point_count: usize,
    /// Timestamp of the depth frame in flight, in seconds.
    pub timestamp: f64,
}

impl GateState {
    fn initial() -> Self {
        Self {
            reconstructing: false,
            color_pending: false,
            paused: false,
            frame_consumed: true,
            geometry_updated: false,
            point_count: 0,
            timestamp: 0.0,
        }
    }
}

/// Monitor coordinating the depth callback, the color callback and the
/// render consumer.
///
/// All five flags live behind one mutex; the condvar signals geometry
/// completion and pause toggles to a waiting renderer.
pub struct FrameGate {
    state: Mutex<GateState>,
    geometry_ready: Condvar,
}

impl Default for FrameGate {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameGate {
    /// Create a gate in the initial state (ready for a depth frame).
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState::initial()),
            geometry_ready: Condvar::new(),
        }
    }

    /// Try to start the depth stage for a newly arrived frame.
    ///
    /// Fails when a reconstruction is still in flight or the renderer has not
    /// consumed the previous point cloud; the caller drops the frame.
    pub fn try_begin_depth(&self, point_count: usize, timestamp: f64) -> Result<(), DropReason> {
        let mut state = self.state.lock().unwrap();
        if state.reconstructing {
            return Err(DropReason::Busy);
        }
        if !state.frame_consumed {
            return Err(DropReason::NotConsumed);
        }
        state.reconstructing = true;
        state.frame_consumed = false;
        state.point_count = point_count;
        state.timestamp = timestamp;
        Ok(())
    }

    /// Finish the depth stage: the rasterized image now waits for color.
    ///
    /// The busy flag stays up until the color stage completes, so a second
    /// depth frame arriving in between is still dropped.
    pub fn end_depth(&self) {
        let mut state = self.state.lock().unwrap();
        state.color_pending = true;
    }

    /// Try to start the color stage.
    ///
    /// Fails while paused or when no depth data is pending.
    pub fn try_begin_color(&self) -> Result<(), DropReason> {
        let mut state = self.state.lock().unwrap();
        if state.paused {
            return Err(DropReason::Paused);
        }
        if !state.color_pending {
            return Err(DropReason::NoDepthPending);
        }
        state.color_pending = false;
        Ok(())
    }

    /// Abandon the color stage after a processing failure.
    ///
    /// Clears the busy flag and re-arms the depth stage without signaling
    /// geometry, so neither side deadlocks on a frame that never finished.
    pub fn abort_color(&self) {
        let mut state = self.state.lock().unwrap();
        state.reconstructing = false;
        state.frame_consumed = true;
    }

    /// Finish the color stage: new geometry is ready for the renderer.
    pub fn end_color(&self) {
        let mut state = self.state.lock().unwrap();
        state.reconstructing = false;
        state.geometry_updated = true;
        self.geometry_ready.notify_all();
    }

    /// Block until new geometry is signaled, the optional timeout elapses or
    /// the gate is paused.
    ///
    /// Returns `true` when new geometry was observed (and clears the flag).
    /// While paused this returns immediately so the renderer re-renders the
    /// last geometry. `None` waits without bound.
    pub fn wait_for_geometry(&self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.state.lock().unwrap();
        loop {
            if state.geometry_updated {
                state.geometry_updated = false;
                return true;
            }
            if state.paused {
                return false;
            }
            state = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    let (guard, _) = self
                        .geometry_ready
                        .wait_timeout(state, deadline - now)
                        .unwrap();
                    guard
                }
                None => self.geometry_ready.wait(state).unwrap(),
            };
        }
    }

    /// Mark the latest geometry as consumed by the renderer.
    pub fn mark_consumed(&self) {
        let mut state = self.state.lock().unwrap();
        state.frame_consumed = true;
    }

    /// Toggle the pause flag, returning the new value.
    ///
    /// Pausing suspends color processing and the render wait; depth
    /// rasterization keeps running so tracking stays warm.
    pub fn toggle_paused(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        state.paused = !state.paused;
        // wake a parked renderer so it observes the pause
        self.geometry_ready.notify_all();
        state.paused
    }

    /// Whether the gate is currently paused.
    pub fn is_paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }

    /// Copy the current gate state.
    pub fn snapshot(&self) -> GateState {
        *self.state.lock().unwrap()
    }

    /// Reset all flags to the initial state.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        *state = GateState::initial();
        self.geometry_ready.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_depth_accepted_when_idle() {
        let gate = FrameGate::new();
        assert!(gate.try_begin_depth(100, 1.0).is_ok());
        let state = gate.snapshot();
        assert!(state.reconstructing);
        assert!(!state.frame_consumed);
        assert_eq!(state.point_count, 100);
    }

    #[test]
    fn test_depth_dropped_while_busy() {
        let gate = FrameGate::new();
        gate.try_begin_depth(10, 1.0).unwrap();
        // busy flag stays up across end_depth until the color stage finishes
        gate.end_depth();
        assert_eq!(gate.try_begin_depth(20, 2.0), Err(DropReason::Busy));
        // and the in-flight frame's bookkeeping is untouched
        let state = gate.snapshot();
        assert!(state.reconstructing);
        assert_eq!(state.point_count, 10);
        assert_eq!(state.timestamp, 1.0);
    }

    #[test]
    fn test_depth_dropped_until_consumed() {
        let gate = FrameGate::new();
        gate.try_begin_depth(10, 1.0).unwrap();
        gate.end_depth();
        gate.try_begin_color().unwrap();
        gate.end_color();
        // reconstruction finished but the renderer has not consumed yet
        assert_eq!(gate.try_begin_depth(20, 2.0), Err(DropReason::NotConsumed));
        assert!(gate.wait_for_geometry(None));
        gate.mark_consumed();
        assert!(gate.try_begin_depth(20, 2.0).is_ok());
    }

    #[test]
    fn test_color_requires_pending_depth() {
        let gate = FrameGate::new();
        assert_eq!(gate.try_begin_color(), Err(DropReason::NoDepthPending));
        gate.try_begin_depth(10, 1.0).unwrap();
        gate.end_depth();
        assert!(gate.try_begin_color().is_ok());
        // the pending flag is cleared on begin
        assert_eq!(gate.try_begin_color(), Err(DropReason::NoDepthPending));
    }

    #[test]
    fn test_color_dropped_while_paused() {
        let gate = FrameGate::new();
        gate.try_begin_depth(10, 1.0).unwrap();
        gate.end_depth();
        assert!(gate.toggle_paused());
        assert_eq!(gate.try_begin_color(), Err(DropReason::Paused));
        assert!(!gate.toggle_paused());
        assert!(gate.try_begin_color().is_ok());
    }

    #[test]
    fn test_wait_returns_immediately_when_paused() {
        let gate = FrameGate::new();
        gate.toggle_paused();
        assert!(!gate.wait_for_geometry(None));
    }

    #[test]
    fn test_wait_times_out() {
        let gate = FrameGate::new();
        let start = Instant::now();
        assert!(!gate.wait_for_geometry(Some(Duration::from_millis(20))));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_wait_wakes_on_geometry() {
        let gate = Arc::new(FrameGate::new());
        gate.try_begin_depth(10, 1.0).unwrap();
        gate.end_depth();
        gate.try_begin_color().unwrap();

        let signaler = {
            let gate = gate.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(10));
                gate.end_color();
            })
        };
        assert!(gate.wait_for_geometry(Some(Duration::from_secs(5))));
        signaler.join().unwrap();
        // the flag was cleared by the successful wait
        assert!(!gate.snapshot().geometry_updated);
    }

    #[test]
    fn test_abort_color_rearms_depth() {
        let gate = FrameGate::new();
        gate.try_begin_depth(10, 1.0).unwrap();
        gate.end_depth();
        gate.try_begin_color().unwrap();
        gate.abort_color();
        let state = gate.snapshot();
        assert!(!state.geometry_updated);
        assert!(gate.try_begin_depth(20, 2.0).is_ok());
    }

    #[test]
    fn test_reset() {
        let gate = FrameGate::new();
        gate.try_begin_depth(10, 1.0).unwrap();
        gate.end_depth();
        gate.reset();
        let state = gate.snapshot();
        assert!(!state.reconstructing);
        assert!(!state.color_pending);
        assert!(state.frame_consumed);
        assert!(gate.try_begin_depth(5, 2.0).is_ok());
    }
}
