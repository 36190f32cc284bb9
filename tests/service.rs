//! End-to-end tests of the polling worker behind `ObjectTracker`.

use idtrack::{
    BBox, CancelToken, Detection, Detector, Error, Frame, FrameSource, ObjectTracker, Result,
    TrackerConfig,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

/// What the scripted source does once its frames run out.
#[derive(Clone, Copy)]
enum AfterScript {
    /// Keep producing empty-pixel frames forever.
    Repeat,
    /// Block until cancelled.
    Block,
    /// Report end of stream.
    Fail,
}

#[derive(Default, Clone)]
struct SourceLog {
    released: Arc<AtomicUsize>,
    starts: Arc<Mutex<Vec<Instant>>>,
}

impl SourceLog {
    fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    fn frames(&self) -> usize {
        self.starts.lock().len()
    }
}

struct ScriptedSource {
    seq: u64,
    limit: u64,
    after: AfterScript,
    seen: SourceLog,
}

impl ScriptedSource {
    fn new(limit: u64, after: AfterScript, seen: &SourceLog) -> Self {
        Self {
            seq: 0,
            limit,
            after,
            seen: seen.clone(),
        }
    }
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self, cancel: &CancelToken) -> Result<Frame> {
        if self.seq >= self.limit {
            match self.after {
                AfterScript::Repeat => {}
                AfterScript::Block => {
                    cancel.sleep(Duration::from_secs(30));
                    return Err(Error::Cancelled);
                }
                AfterScript::Fail => return Err(Error::frame("end of stream")),
            }
        }

        self.seen.starts.lock().push(Instant::now());
        self.seq += 1;
        Ok(Frame::empty(self.seq, (640, 480)))
    }

    fn release(&mut self) {
        self.seen.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Detector reporting a car drifting right by 2px per frame and a static person.
struct Street;

impl Detector for Street {
    fn detect(&self, frame: &Frame, _cancel: &CancelToken) -> Result<Vec<Detection>> {
        let x = 2 * frame.seq as i32;
        Ok(vec![
            Detection::new(BBox::ltwh(x, 100, 40, 20), 0.8, "Car"),
            Detection::new(BBox::ltwh(300, 200, 20, 60), 0.6, "person"),
            Detection::new(BBox::ltwh(500, 10, 5, 5), 0.1, "bird"),
        ])
    }
}

/// Detector that takes `delay` per frame and honours cancellation while working.
struct Slow {
    delay: Duration,
}

impl Detector for Slow {
    fn detect(&self, _frame: &Frame, cancel: &CancelToken) -> Result<Vec<Detection>> {
        if cancel.sleep(self.delay) {
            return Err(Error::Cancelled);
        }
        Ok(Vec::new())
    }
}

fn config(freq: f64) -> TrackerConfig {
    let mut config = TrackerConfig::new("cam", "det");
    config.max_frequency_hz = freq;
    config
}

#[test]
fn test_rate_limit_spaces_cycle_starts() {
    init_logger();
    let seen = SourceLog::default();
    let source = ScriptedSource::new(0, AfterScript::Repeat, &seen);
    let tracker = ObjectTracker::new(config(10.0), source, Arc::new(Street)).unwrap();

    assert!(wait_until(Duration::from_secs(5), || seen.frames() >= 6));
    tracker.close().unwrap();

    let starts = seen.starts.lock().clone();
    let epsilon = Duration::from_millis(5);
    for pair in starts.windows(2).take(5) {
        let gap = pair[1] - pair[0];
        assert!(
            gap + epsilon >= Duration::from_millis(100),
            "cycle started after only {:?}",
            gap
        );
    }
    assert_eq!(seen.released(), 1);
}

#[test]
fn test_cancel_mid_cycle_releases_once() {
    init_logger();
    let seen = SourceLog::default();
    let source = ScriptedSource::new(0, AfterScript::Repeat, &seen);
    let detector = Slow {
        delay: Duration::from_millis(300),
    };
    let tracker = ObjectTracker::new(config(10.0), source, Arc::new(detector)).unwrap();

    assert!(wait_until(Duration::from_secs(2), || seen.frames() >= 1));
    thread::sleep(Duration::from_millis(50));

    let started = Instant::now();
    tracker.close().unwrap();

    assert!(started.elapsed() < Duration::from_millis(300));
    assert_eq!(seen.released(), 1);
}

#[test]
fn test_cancel_while_waiting_for_frame() {
    init_logger();
    let seen = SourceLog::default();
    let source = ScriptedSource::new(2, AfterScript::Block, &seen);
    let tracker = ObjectTracker::new(config(0.0), source, Arc::new(Street)).unwrap();

    assert!(wait_until(Duration::from_secs(2), || tracker.generations().seq == 2));
    assert!(tracker.is_running());

    let started = Instant::now();
    tracker.close().unwrap();

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(seen.released(), 1);
}

#[test]
fn test_frame_error_stops_worker() {
    init_logger();
    let seen = SourceLog::default();
    let source = ScriptedSource::new(3, AfterScript::Fail, &seen);
    let tracker = ObjectTracker::new(config(0.0), source, Arc::new(Street)).unwrap();

    assert!(wait_until(Duration::from_secs(2), || !tracker.is_running()));
    assert_eq!(seen.released(), 1);

    // what was published before the failure stays readable
    assert_eq!(tracker.generations().seq, 3);
    assert_eq!(tracker.stats().count, 3);

    let err = tracker.close().unwrap_err();
    assert!(matches!(err, Error::FrameAcquisition(_)));
    assert_eq!(seen.released(), 1);
}

#[test]
fn test_detector_error_stops_worker() {
    init_logger();
    let seen = SourceLog::default();
    let source = ScriptedSource::new(0, AfterScript::Repeat, &seen);
    let detector =
        |_frame: &Frame| -> Result<Vec<Detection>> { Err(Error::detection("model crashed")) };
    let tracker = ObjectTracker::new(config(0.0), source, Arc::new(detector)).unwrap();

    assert!(wait_until(Duration::from_secs(2), || !tracker.is_running()));

    let err = tracker.close().unwrap_err();
    assert!(matches!(err, Error::Detection(_)));
    assert_eq!(seen.frames(), 1);
    assert_eq!(seen.released(), 1);
}

#[test]
fn test_drop_joins_worker() {
    init_logger();
    let seen = SourceLog::default();
    let source = ScriptedSource::new(0, AfterScript::Repeat, &seen);
    let tracker = ObjectTracker::new(config(50.0), source, Arc::new(Street)).unwrap();

    assert!(wait_until(Duration::from_secs(2), || seen.frames() >= 2));
    drop(tracker);

    assert_eq!(seen.released(), 1);
}

#[test]
fn test_identities_confirmed_once() {
    init_logger();
    let seen = SourceLog::default();
    let source = ScriptedSource::new(6, AfterScript::Block, &seen);

    let mut config = config(0.0);
    config.chosen_labels.insert("car".into(), 0.5);
    config.chosen_labels.insert("Person".into(), 0.5);
    config.stability_threshold = 3;

    let tracker = ObjectTracker::new(config, source, Arc::new(Street)).unwrap();
    assert!(wait_until(Duration::from_secs(2), || tracker.generations().seq == 6));

    let confirmed = tracker.drain_confirmed();
    let mut labels: Vec<_> = confirmed
        .iter()
        .map(|d| d.label.rsplitn(3, '_').nth(2).unwrap_or_default().to_string())
        .collect();
    labels.sort();
    assert_eq!(labels, vec!["car_0", "person_0"]);
    assert!(tracker.drain_confirmed().is_empty());

    let current = tracker.current_tracked();
    assert_eq!(current.len(), 2);
    assert!(current[0].label.starts_with("car_0_"));
    assert_eq!(current[0].bbox, BBox::ltwh(12, 100, 40, 20));
    assert!(current[0].norm_bbox.is_some());

    let snap = tracker.generations();
    assert_eq!(snap.previous[0].bbox(), &BBox::ltwh(10, 100, 40, 20));
    assert_eq!(snap.current[0].persistence, 5);

    assert_eq!(tracker.tracking_labels(), vec!["car_0", "person_0"]);
    assert_eq!(tracker.history("car_0").map(|h| h.len()), Some(6));

    let stats = tracker.stats();
    assert_eq!(stats.count, 6);
    assert!(stats.min <= stats.mean && stats.mean <= stats.max);

    assert_eq!(tracker.detections_from_camera("cam").unwrap().len(), 2);
    assert!(matches!(
        tracker.detections_from_camera("other"),
        Err(Error::Config(_))
    ));

    tracker.close().unwrap();
    assert_eq!(seen.released(), 1);
}

#[test]
fn test_one_shot_detections_are_filtered_not_tracked() {
    init_logger();
    let seen = SourceLog::default();
    let source = ScriptedSource::new(0, AfterScript::Block, &seen);

    let mut config = config(0.0);
    config.chosen_labels.insert("person".into(), 0.5);
    let tracker = ObjectTracker::new(config, source, Arc::new(Street)).unwrap();

    let dets = tracker.detections(&Frame::empty(1, (640, 480))).unwrap();
    assert_eq!(dets.len(), 1);
    assert_eq!(dets[0].label, "person");
    assert!(tracker.tracking_labels().is_empty());
    assert_eq!(tracker.generations().seq, 0);

    tracker.close().unwrap();
}

#[test]
fn test_invalid_config_is_rejected() {
    let seen = SourceLog::default();
    let source = ScriptedSource::new(0, AfterScript::Repeat, &seen);

    let mut bad = config(10.0);
    bad.min_confidence = 2.0;

    let err = ObjectTracker::new(bad, source, Arc::new(Street)).err().unwrap();
    assert!(matches!(err, Error::Config(_)));
    assert_eq!(seen.frames(), 0);

    // a period too long for `Duration` must not bring the constructor down
    let source = ScriptedSource::new(0, AfterScript::Repeat, &seen);
    let err = ObjectTracker::new(config(1e-300), source, Arc::new(Street)).err().unwrap();
    assert!(matches!(err, Error::Config(_)));
    assert_eq!(seen.frames(), 0);
}

#[test]
fn test_concurrent_readers_see_monotonic_generations() {
    init_logger();
    let seen = SourceLog::default();
    let source = ScriptedSource::new(0, AfterScript::Repeat, &seen);
    let tracker = Arc::new(ObjectTracker::new(config(0.0), source, Arc::new(Street)).unwrap());

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let tracker = tracker.clone();
            thread::spawn(move || {
                let mut last = 0;
                for _ in 0..500 {
                    let snap = tracker.generations();
                    assert!(snap.seq >= last);
                    if snap.seq >= 2 {
                        // the car moves 2px per frame between consecutive generations
                        let prev = snap.previous[0].bbox().left();
                        let curr = snap.current[0].bbox().left();
                        assert_eq!(curr - prev, 2);
                    }
                    last = snap.seq;
                }
            })
        })
        .collect();

    for reader in readers {
        reader.join().unwrap();
    }

    let tracker = Arc::try_unwrap(tracker).ok().unwrap();
    tracker.close().unwrap();
    assert_eq!(seen.released(), 1);
}
