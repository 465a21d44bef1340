use opencv::{
    core::{Mat, Point, Scalar},
    highgui,
    imgproc,
    prelude::*,
};
use tracing::warn;

use crate::lane_detection::LaneDetectionResult;
use crate::steering::LineSegment;

pub const WINDOW_NAME: &str = "Lane Detection";

/// 검출된 선분을 원본 프레임 위에 그려 보여주는 창
///
/// 제어 상태에는 영향을 주지 않습니다. 창이 닫히는 것은 drop 시점입니다.
pub struct Display {
    window: String,
}

impl Display {
    pub fn open(window: &str) -> LaneDetectionResult<Self> {
        highgui::named_window(window, highgui::WINDOW_AUTOSIZE)?;
        Ok(Self {
            window: window.to_string(),
        })
    }

    /// 프레임을 그리고 표시합니다. 창에서 'q'를 누르면 `true`.
    pub fn show(&self, frame: &Mat, segments: &[LineSegment]) -> LaneDetectionResult<bool> {
        let annotated = annotate(frame, segments)?;
        highgui::imshow(&self.window, &annotated)?;

        let key = highgui::wait_key(1)?;
        Ok(key & 0xFF == b'q' as i32)
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_window(&self.window) {
            warn!("Failed to destroy window {}: {}", self.window, e);
        }
    }
}

/// 프레임 복사본 위에 선분을 초록색(두께 2)으로 그립니다.
pub fn annotate(frame: &Mat, segments: &[LineSegment]) -> LaneDetectionResult<Mat> {
    let mut annotated = frame.try_clone()?;
    for seg in segments {
        imgproc::line(
            &mut annotated,
            Point::new(seg.x1, seg.y1),
            Point::new(seg.x2, seg.y2),
            Scalar::new(0.0, 255.0, 0.0, 255.0),
            2,
            imgproc::LINE_8,
            0,
        )?;
    }
    Ok(annotated)
}
