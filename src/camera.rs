//! 카메라 추상화와 OpenCV 구현
//!
//! 제어 루프는 [`Camera`] 트레이트에만 의존합니다. 실제 장치는
//! [`OpenCvCamera`]가, 테스트에서는 가짜 카메라가 이 역할을 맡습니다.

use crate::error::{LaneDriveError, LaneDriveResult};
use opencv::{
    core::{self, Mat},
    prelude::*,
    videoio,
};
use tracing::{info, warn};

/// 디코딩된 BGR 프레임을 한 장씩 돌려주는 장치
pub trait Camera {
    fn start(&mut self) -> LaneDriveResult<()>;

    /// 다음 프레임을 가져옵니다. 프레임이 올 때까지 블록될 수 있습니다.
    fn capture_frame(&mut self) -> LaneDriveResult<Mat>;

    fn stop(&mut self) -> LaneDriveResult<()>;

    fn close(&mut self) -> LaneDriveResult<()>;
}

/// `videoio::VideoCapture` 기반 카메라
pub struct OpenCvCamera {
    index: i32,
    rotate_180: bool,
    cap: Option<videoio::VideoCapture>,
}

impl OpenCvCamera {
    pub fn new(index: i32, rotate_180: bool) -> Self {
        Self {
            index,
            rotate_180,
            cap: None,
        }
    }
}

impl Camera for OpenCvCamera {
    fn start(&mut self) -> LaneDriveResult<()> {
        let cap = videoio::VideoCapture::new(self.index, videoio::CAP_ANY)?;
        if !cap.is_opened()? {
            return Err(LaneDriveError::Camera(format!(
                "failed to open camera {}",
                self.index
            )));
        }
        info!("Camera {} started", self.index);
        self.cap = Some(cap);
        Ok(())
    }

    fn capture_frame(&mut self) -> LaneDriveResult<Mat> {
        let cap = self
            .cap
            .as_mut()
            .ok_or_else(|| LaneDriveError::Camera("camera is not started".to_string()))?;

        let mut frame = Mat::default();
        if !cap.read(&mut frame)? || frame.empty() {
            return Err(LaneDriveError::Camera(format!(
                "failed to read frame from camera {}",
                self.index
            )));
        }

        if !self.rotate_180 {
            return Ok(frame);
        }

        let mut rotated = Mat::default();
        core::rotate(&frame, &mut rotated, core::ROTATE_180)?;
        Ok(rotated)
    }

    fn stop(&mut self) -> LaneDriveResult<()> {
        if let Some(cap) = self.cap.as_mut() {
            cap.release()?;
        }
        Ok(())
    }

    fn close(&mut self) -> LaneDriveResult<()> {
        self.cap = None;
        Ok(())
    }
}

/// 카메라의 수명을 스코프에 묶어 두는 가드
///
/// 획득할 때 `start`, 해제할 때 `stop` → `close`를 정확히 한 번 호출합니다.
/// 명시적으로 [`CameraGuard::release`]를 부르지 않아도 drop 시 해제됩니다.
pub struct CameraGuard<C: Camera> {
    camera: C,
    released: bool,
}

impl<C: Camera> CameraGuard<C> {
    pub fn acquire(mut camera: C) -> LaneDriveResult<Self> {
        camera.start()?;
        Ok(Self {
            camera,
            released: false,
        })
    }

    pub fn capture_frame(&mut self) -> LaneDriveResult<Mat> {
        if self.released {
            return Err(LaneDriveError::Camera("camera already released".to_string()));
        }
        self.camera.capture_frame()
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Err(e) = self.camera.stop() {
            warn!("Failed to stop camera: {}", e);
        }
        if let Err(e) = self.camera.close() {
            warn!("Failed to close camera: {}", e);
        }
        info!("Camera released");
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }
}

impl<C: Camera> Drop for CameraGuard<C> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use opencv::core::{Scalar, CV_8UC3};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// 생명주기 호출 횟수를 세는 가짜 카메라
    #[derive(Debug, Default, Clone)]
    pub struct CallCounts {
        pub start: Arc<AtomicUsize>,
        pub capture: Arc<AtomicUsize>,
        pub stop: Arc<AtomicUsize>,
        pub close: Arc<AtomicUsize>,
    }

    impl CallCounts {
        pub fn get(counter: &AtomicUsize) -> usize {
            counter.load(Ordering::SeqCst)
        }
    }

    /// 검은 프레임을 돌려주고, `capture` 번째마다 훅을 부르는 카메라
    pub struct MockCamera {
        pub counts: CallCounts,
        pub fail_start: bool,
        pub on_capture: Option<Box<dyn FnMut(usize) + Send>>,
    }

    impl MockCamera {
        pub fn new() -> Self {
            Self {
                counts: CallCounts::default(),
                fail_start: false,
                on_capture: None,
            }
        }
    }

    impl Camera for MockCamera {
        fn start(&mut self) -> LaneDriveResult<()> {
            self.counts.start.fetch_add(1, Ordering::SeqCst);
            if self.fail_start {
                return Err(LaneDriveError::Camera("no device".to_string()));
            }
            Ok(())
        }

        fn capture_frame(&mut self) -> LaneDriveResult<Mat> {
            let n = self.counts.capture.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(hook) = self.on_capture.as_mut() {
                hook(n);
            }
            Ok(Mat::new_rows_cols_with_default(48, 64, CV_8UC3, Scalar::all(0.0))?)
        }

        fn stop(&mut self) -> LaneDriveResult<()> {
            self.counts.stop.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn close(&mut self) -> LaneDriveResult<()> {
            self.counts.close.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}
