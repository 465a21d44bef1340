//! 카메라로 차선을 인식해 아두이노 RC 차량의 조향을 제어합니다.
//!
//! 데이터 흐름:
//!
//! ```text
//! Camera → Pipeline(전처리 → 허프 선분 → 조향각) → ControlArbiter → CommandChannel(시리얼)
//! InputListener(별도 스레드) → CommandSlot → ControlArbiter
//! ```

pub mod arbiter;
pub mod camera;
pub mod command;
pub mod command_channel;
pub mod config;
pub mod display;
pub mod drive;
pub mod error;
pub mod input_listener;
pub mod lane_detection;
pub mod steering;

pub use arbiter::{ControlArbiter, ControlMode, Poll};
pub use camera::{Camera, CameraGuard, OpenCvCamera};
pub use command::{Command, CommandSlot, DriveCommand};
pub use command_channel::CommandChannel;
pub use config::Config;
pub use drive::{DriveLoop, DriveStats, ExitReason};
pub use error::{LaneDriveError, LaneDriveResult};
pub use lane_detection::{Detection, LaneDetectionResult, Pipeline};
pub use steering::{steering_angle, LineSegment};
