//! Tracks two synthetic objects crossing a 640x480 scene.
//!
//! Run with `RUST_LOG=idtrack=debug cargo run --example synthetic`.

use idtrack::{
    BBox, CancelToken, Detection, Error, Frame, FrameSource, ObjectTracker, Result, TrackerConfig,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

/// Endless stream of blank frames, `frames` long.
struct Synthetic {
    seq: u64,
    frames: u64,
}

impl FrameSource for Synthetic {
    fn next_frame(&mut self, cancel: &CancelToken) -> Result<Frame> {
        if self.seq >= self.frames {
            // hold the stream open until the tracker shuts down
            cancel.sleep(Duration::from_secs(3600));
            return Err(Error::Cancelled);
        }

        self.seq += 1;
        Ok(Frame::empty(self.seq, (WIDTH, HEIGHT)))
    }

    fn release(&mut self) {
        log::info!("synthetic source released after {} frames", self.seq);
    }
}

/// A car driving right and a pedestrian walking down, plus a low-confidence flicker.
fn detect(frame: &Frame) -> Result<Vec<Detection>> {
    let t = frame.seq as i32;
    let mut dets = vec![
        Detection::new(BBox::ltwh(20 + 6 * t, 200, 80, 40), 0.9, "car"),
        Detection::new(BBox::ltwh(400, 40 + 3 * t, 24, 60), 0.7, "person"),
    ];

    if t % 4 == 0 {
        dets.push(Detection::new(BBox::ltwh(600, 10, 8, 8), 0.15, "bird"));
    }

    Ok(dets)
}

fn main() -> Result<()> {
    env_logger::init();

    let config = TrackerConfig::from_json(
        r#"{
            "camera_name": "synthetic",
            "detector_name": "scripted",
            "chosen_labels": {"car": 0.5, "person": 0.5, "bird": 0.1},
            "max_frequency_hz": 20,
            "stability_threshold": 3,
            "motion_prediction": true
        }"#,
    )?;

    let source = Synthetic { seq: 0, frames: 60 };
    let tracker = ObjectTracker::new(config, source, Arc::new(detect))?;

    while tracker.is_running() && tracker.generations().seq < 60 {
        thread::sleep(Duration::from_millis(250));

        for det in tracker.drain_confirmed() {
            println!("confirmed {} at {:?}", det.label, det.bbox);
        }
    }

    for det in tracker.detections_from_camera("synthetic")? {
        println!("tracked {} p={:.2} {:?}", det.label, det.score, det.norm_bbox);
    }

    let stats = tracker.stats();
    println!(
        "{} cycles, min {:?} mean {:?} max {:?}",
        stats.count, stats.min, stats.mean, stats.max
    );

    tracker.close()
}
