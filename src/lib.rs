//! Frame-to-frame identity tracking on top of an external object detector.
//!
//! Each polling cycle pulls a frame, runs the detector, filters the results,
//! matches them against the previous generation of tracks by box overlap and
//! carries labels like `car_3_20240307_1405` forward. Identities seen in
//! enough consecutive frames are confirmed and published on a bounded queue.
//!
//! ```rust,ignore
//! use idtrack::{ObjectTracker, TrackerConfig};
//!
//! let config = TrackerConfig::from_json(r#"{"camera_name": "cam", "detector_name": "yolo"}"#)?;
//! let tracker = ObjectTracker::new(config, camera, Arc::new(detector))?;
//!
//! for det in tracker.drain_confirmed() {
//!     println!("new object {}", det.label);
//! }
//! tracker.close()?;
//! ```

pub mod association;
pub mod bbox;
pub mod cancel;
pub mod config;
pub mod detection;
pub mod detector;
pub mod error;
pub mod filter;
pub mod frame;
pub mod labels;
pub mod poller;
pub mod queue;
pub mod service;
pub mod solver;
pub mod stats;
pub mod store;

mod track;

pub use bbox::{BBox, NormBox};
pub use cancel::CancelToken;
pub use config::TrackerConfig;
pub use detection::Detection;
pub use detector::Detector;
pub use error::{Error, Result};
pub use frame::{Frame, FrameSource};
pub use labels::{IdentityManager, Resolution};
pub use service::ObjectTracker;
pub use solver::{Assignment, AssignmentSolver, MunkresSolver};
pub use stats::CycleStats;
pub use track::{Stability, Track};
