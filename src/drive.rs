//! 인식 → 중재 → 전송 메인 루프

use crate::arbiter::{ArbiterStats, ControlArbiter, Poll};
use crate::camera::{Camera, CameraGuard};
use crate::display::Display;
use crate::error::LaneDriveResult;
use crate::lane_detection::Pipeline;
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// 종료 명령 (터미널 `q` 또는 인터럽트)
    Quit,
    /// 표시 창에서 `q`
    Window,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveStats {
    pub frames: u64,
    pub arbiter: ArbiterStats,
    pub exit: ExitReason,
}

/// 카메라, 파이프라인, 중재기, (선택) 표시 창을 소유하는 제어 루프
///
/// 메인 스레드에서만 돌며, 블록되는 곳은 프레임 획득과 채널 쓰기뿐입니다.
/// 루프가 어떤 경로로 끝나든 카메라와 창은 [`DriveLoop::run`]이 돌아가기 전에
/// 해제되고, 시리얼 채널은 이 값이 drop 될 때 닫힙니다.
pub struct DriveLoop<C: Camera, W: Write> {
    camera: CameraGuard<C>,
    pipeline: Pipeline,
    arbiter: ControlArbiter<W>,
    display: Option<Display>,
    idle_interval: Duration,
    frames: u64,
}

impl<C: Camera, W: Write> DriveLoop<C, W> {
    pub fn new(camera: CameraGuard<C>, pipeline: Pipeline, arbiter: ControlArbiter<W>) -> Self {
        Self {
            camera,
            pipeline,
            arbiter,
            display: None,
            idle_interval: Duration::from_millis(10),
            frames: 0,
        }
    }

    pub fn with_display(mut self, display: Display) -> Self {
        self.display = Some(display);
        self
    }

    pub fn with_idle_interval(mut self, idle_interval: Duration) -> Self {
        self.idle_interval = idle_interval;
        self
    }

    pub fn arbiter(&self) -> &ControlArbiter<W> {
        &self.arbiter
    }

    pub fn camera(&self) -> &CameraGuard<C> {
        &self.camera
    }

    /// 종료 조건을 만날 때까지 루프를 돌립니다.
    ///
    /// 인식 단계(프레임 획득, OpenCV 처리)의 에러는 루프를 끝내고 그대로 돌려줍니다.
    /// 채널 쓰기 실패는 중재기가 흡수하므로 여기까지 오지 않습니다.
    pub fn run(&mut self) -> LaneDriveResult<DriveStats> {
        let result = self.drive();

        self.camera.release();
        self.display = None;

        let exit = result?;
        let stats = DriveStats {
            frames: self.frames,
            arbiter: self.arbiter.stats(),
            exit,
        };
        info!(
            "Drive loop finished ({:?}): {} frames, {} angles, {} manual commands",
            stats.exit, stats.frames, stats.arbiter.angles_sent, stats.arbiter.manual_sent
        );
        Ok(stats)
    }

    fn drive(&mut self) -> LaneDriveResult<ExitReason> {
        loop {
            match self.arbiter.poll() {
                Poll::Quit => return Ok(ExitReason::Quit),
                Poll::Paused => {
                    if !self.idle_interval.is_zero() {
                        thread::sleep(self.idle_interval);
                    }
                    continue;
                }
                Poll::Autonomous => {}
            }

            let start_time = Instant::now();

            let frame = self.camera.capture_frame()?;
            let detection = self.pipeline.processing(&frame)?;
            self.arbiter.steer(detection.angle);
            self.frames += 1;

            if let Some(display) = &self.display {
                match display.show(&frame, &detection.segments) {
                    Ok(true) => return Ok(ExitReason::Window),
                    Ok(false) => {}
                    Err(e) => warn!("Failed to display frame: {}", e),
                }
            }

            let elapsed = start_time.elapsed().as_secs_f32();
            debug!(
                "frame {}: {} segments, angle {:.2}, {:.1} FPS",
                self.frames,
                detection.segments.len(),
                detection.angle,
                1.0 / elapsed.max(f32::EPSILON)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::mock::{CallCounts, MockCamera};
    use crate::command::{Command, CommandSlot, DriveCommand};
    use crate::command_channel::CommandChannel;
    use std::sync::Arc;

    fn build(camera: MockCamera, slot: Arc<CommandSlot>) -> DriveLoop<MockCamera, Vec<u8>> {
        let arbiter = ControlArbiter::new(CommandChannel::new(Vec::new()), slot);
        DriveLoop::new(CameraGuard::acquire(camera).unwrap(), Pipeline::default(), arbiter)
            .with_idle_interval(Duration::from_millis(1))
    }

    fn written<C: Camera>(drive: &DriveLoop<C, Vec<u8>>) -> String {
        String::from_utf8(drive.arbiter().channel().get_ref().clone()).unwrap()
    }

    #[test]
    fn test_quit_while_autonomous() {
        let slot = Arc::new(CommandSlot::new());
        let mut camera = MockCamera::new();
        let counts = camera.counts.clone();
        let hook_slot = Arc::clone(&slot);
        camera.on_capture = Some(Box::new(move |n| {
            if n == 2 {
                hook_slot.deposit(Command::Quit);
            }
        }));

        let mut drive = build(camera, slot);
        let stats = drive.run().unwrap();

        assert_eq!(stats.exit, ExitReason::Quit);
        assert_eq!(stats.frames, 2);
        // 검은 프레임에는 선분이 없으므로 0도
        assert_eq!(written(&drive), "A0\nA0\n");
        assert!(drive.camera().is_released());
        assert_eq!(CallCounts::get(&counts.stop), 1);
        assert_eq!(CallCounts::get(&counts.close), 1);

        drop(drive);
        assert_eq!(CallCounts::get(&counts.stop), 1);
        assert_eq!(CallCounts::get(&counts.close), 1);
    }

    #[test]
    fn test_paused_loop_sends_no_angles() {
        let slot = Arc::new(CommandSlot::new());
        let mut camera = MockCamera::new();
        let counts = camera.counts.clone();
        let hook_slot = Arc::clone(&slot);
        camera.on_capture = Some(Box::new(move |n| {
            if n != 1 {
                return;
            }
            hook_slot.deposit(Command::Toggle);
            // 토글이 소비된 뒤에 수동 명령, 그다음 종료를 넣는다
            let operator = Arc::clone(&hook_slot);
            thread::spawn(move || {
                for cmd in [Command::Drive(DriveCommand::Stop), Command::Quit] {
                    while operator.peek().is_some() {
                        thread::sleep(Duration::from_millis(1));
                    }
                    operator.deposit(cmd);
                }
            });
        }));

        let mut drive = build(camera, slot);
        let stats = drive.run().unwrap();

        assert_eq!(stats.exit, ExitReason::Quit);
        assert_eq!(stats.frames, 1);
        assert_eq!(CallCounts::get(&counts.capture), 1);
        assert_eq!(written(&drive), "A0\npx");
        assert_eq!(stats.arbiter.toggles, 1);
        assert_eq!(stats.arbiter.manual_sent, 1);
    }

    #[test]
    fn test_quit_before_first_frame() {
        let slot = Arc::new(CommandSlot::new());
        slot.deposit(Command::Quit);
        let camera = MockCamera::new();
        let counts = camera.counts.clone();

        let mut drive = build(camera, slot);
        let stats = drive.run().unwrap();

        assert_eq!(stats.frames, 0);
        assert_eq!(CallCounts::get(&counts.capture), 0);
        assert!(written(&drive).is_empty());
        assert_eq!(CallCounts::get(&counts.stop), 1);
    }
}
