//! Face landmark tracking
//!
//! Runs the landmark detector on a named background thread and gates
//! submissions with a single-slot in-flight flag: while one detection is
//! outstanding, new frames are dropped, not queued. Under sustained
//! overload the pipeline processes fewer frames per second instead of
//! building latency or backlog.

pub mod face_mesh;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

/// A single detected facial keypoint, normalized to [0,1] in both axes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// The ordered keypoints detected in one frame. Empty means no face.
#[derive(Clone, Debug, Default)]
pub struct LandmarkSet {
    landmarks: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)
    }
}

/// One frame handed to the detector.
pub struct VideoFrame {
    /// RGBA pixel data
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub frame_number: u64,
}

/// Latest tracking output. `landmarks` is empty when the frame had no
/// face or the detector call failed.
#[derive(Clone, Debug, Default)]
pub struct TrackingResult {
    pub landmarks: LandmarkSet,
    pub frame_number: u64,
}

/// Detection backend seam. The production implementation is
/// [`face_mesh::FaceMeshDetector`]; tests inject their own.
pub trait LandmarkDetector: Send {
    /// Detect facial landmarks in `frame`. An empty set is the normal
    /// no-face outcome; `Err` is a failed detector call.
    fn detect(&mut self, frame: &VideoFrame) -> Result<LandmarkSet, String>;
}

/// Detection thread plus the in-flight gate.
pub struct FaceTracker {
    /// Set while a detection is outstanding. The worker clears it after
    /// every call, including failed ones; a stuck flag would stall the
    /// pipeline permanently.
    in_flight: Arc<AtomicBool>,
    latest_result: Arc<Mutex<TrackingResult>>,
    frame_sender: Option<Sender<VideoFrame>>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl FaceTracker {
    /// Start the tracker with an injected detector backend.
    pub fn new(detector: Box<dyn LandmarkDetector>) -> Result<Self, String> {
        let in_flight = Arc::new(AtomicBool::new(false));
        let latest_result = Arc::new(Mutex::new(TrackingResult::default()));

        // Capacity 1: a frame is only ever sent while the gate is held,
        // so nothing queues behind an outstanding detection.
        let (frame_sender, frame_receiver) = crossbeam_channel::bounded::<VideoFrame>(1);

        let in_flight_clone = in_flight.clone();
        let latest_result_clone = latest_result.clone();

        let thread_handle = std::thread::Builder::new()
            .name("face-tracking".to_string())
            .spawn(move || {
                Self::tracking_thread(detector, frame_receiver, latest_result_clone, in_flight_clone);
            })
            .map_err(|e| format!("Failed to spawn tracking thread: {}", e))?;

        Ok(Self {
            in_flight,
            latest_result,
            frame_sender: Some(frame_sender),
            thread_handle: Some(thread_handle),
        })
    }

    fn tracking_thread(
        mut detector: Box<dyn LandmarkDetector>,
        frame_receiver: Receiver<VideoFrame>,
        latest_result: Arc<Mutex<TrackingResult>>,
        in_flight: Arc<AtomicBool>,
    ) {
        log::info!("Face tracking thread started");

        while let Ok(frame) = frame_receiver.recv() {
            let frame_number = frame.frame_number;
            match detector.detect(&frame) {
                Ok(landmarks) => {
                    *latest_result.lock() = TrackingResult {
                        landmarks,
                        frame_number,
                    };
                }
                Err(e) => {
                    log::warn!("Detection failed on frame {}: {}", frame_number, e);
                    *latest_result.lock() = TrackingResult {
                        landmarks: LandmarkSet::empty(),
                        frame_number,
                    };
                }
            }
            // Clear the gate only after the result is published, so the
            // next accepted frame always observes the previous outcome.
            in_flight.store(false, Ordering::Release);
        }

        log::info!("Face tracking thread stopped");
    }

    /// Submit a frame for detection. Returns false when a detection is
    /// already in flight; the frame is dropped, never queued.
    pub fn submit(&self, frame: VideoFrame) -> bool {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let Some(sender) = &self.frame_sender else {
            self.in_flight.store(false, Ordering::Release);
            return false;
        };

        if sender.send(frame).is_err() {
            // Worker gone; release the gate so the pipeline cannot wedge.
            self.in_flight.store(false, Ordering::Release);
            return false;
        }
        true
    }

    /// Latest published result.
    pub fn latest_result(&self) -> TrackingResult {
        self.latest_result.lock().clone()
    }

    pub fn stop(&mut self) {
        self.frame_sender = None;
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for FaceTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::{Duration, Instant};

    fn frame(n: u64) -> VideoFrame {
        VideoFrame {
            data: vec![0u8; 16],
            width: 2,
            height: 2,
            frame_number: n,
        }
    }

    fn wait_until(deadline_ms: u64, mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_millis(deadline_ms);
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        done()
    }

    /// Blocks inside detect() until released, counting concurrent calls.
    struct BlockingDetector {
        release: Receiver<()>,
        active: Arc<AtomicU32>,
        max_active: Arc<AtomicU32>,
    }

    impl LandmarkDetector for BlockingDetector {
        fn detect(&mut self, _frame: &VideoFrame) -> Result<LandmarkSet, String> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            let _ = self.release.recv();
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(LandmarkSet::empty())
        }
    }

    struct FailingDetector;

    impl LandmarkDetector for FailingDetector {
        fn detect(&mut self, _frame: &VideoFrame) -> Result<LandmarkSet, String> {
            Err("injected failure".to_string())
        }
    }

    struct CountingDetector {
        calls: Arc<AtomicU32>,
    }

    impl LandmarkDetector for CountingDetector {
        fn detect(&mut self, frame: &VideoFrame) -> Result<LandmarkSet, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let _ = frame;
            Ok(LandmarkSet::new(vec![Landmark::default(); 468]))
        }
    }

    #[test]
    fn frames_are_dropped_while_detection_in_flight() {
        let (release_tx, release_rx) = crossbeam_channel::unbounded();
        let active = Arc::new(AtomicU32::new(0));
        let max_active = Arc::new(AtomicU32::new(0));
        let tracker = FaceTracker::new(Box::new(BlockingDetector {
            release: release_rx,
            active: active.clone(),
            max_active: max_active.clone(),
        }))
        .unwrap();

        assert!(tracker.submit(frame(1)));
        assert!(wait_until(1000, || active.load(Ordering::SeqCst) == 1));

        // Rapid submissions while the first detection is pending.
        for n in 2..10 {
            assert!(!tracker.submit(frame(n)));
        }
        assert_eq!(max_active.load(Ordering::SeqCst), 1);

        release_tx.send(()).unwrap();
        assert!(wait_until(1000, || tracker.submit(frame(10))));
        release_tx.send(()).unwrap();
    }

    #[test]
    fn gate_clears_after_failed_detection() {
        let tracker = FaceTracker::new(Box::new(FailingDetector)).unwrap();

        assert!(tracker.submit(frame(1)));
        // The failure must release the gate and still publish a result.
        assert!(wait_until(1000, || tracker.latest_result().frame_number == 1));
        assert!(tracker.latest_result().landmarks.is_empty());
        assert!(wait_until(1000, || tracker.submit(frame(2))));
    }

    #[test]
    fn results_carry_frame_numbers() {
        let calls = Arc::new(AtomicU32::new(0));
        let tracker = FaceTracker::new(Box::new(CountingDetector {
            calls: calls.clone(),
        }))
        .unwrap();

        assert!(tracker.submit(frame(7)));
        assert!(wait_until(1000, || tracker.latest_result().frame_number == 7));
        assert_eq!(tracker.latest_result().landmarks.len(), 468);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
