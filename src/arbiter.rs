//! 자율 주행 / 수동(일시정지) 모드 중재기
//!
//! 명령 채널에 쓰는 주체는 이 중재기 하나뿐입니다. 입력 스레드는 의도만
//! [`CommandSlot`]에 기록하고, 토글 바이트 전송을 포함한 모든 쓰기는
//! 메인 루프가 슬롯을 소비하는 시점에 여기서 일어납니다.

use crate::command::{Command, CommandSlot, DriveCommand};
use crate::command_channel::CommandChannel;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    Autonomous,
    ManualPaused,
}

impl ControlMode {
    pub fn toggled(self) -> Self {
        match self {
            ControlMode::Autonomous => ControlMode::ManualPaused,
            ControlMode::ManualPaused => ControlMode::Autonomous,
        }
    }
}

/// 한 번의 폴링 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// 종료 명령을 받음. 루프를 빠져나가야 한다.
    Quit,
    /// 수동 모드라 이번 반복은 인식 경로를 건너뛴다.
    Paused,
    /// 자율 주행: 프레임을 처리하고 [`ControlArbiter::steer`]를 호출한다.
    Autonomous,
}

/// 중재기 누적 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArbiterStats {
    pub angles_sent: u64,
    pub manual_sent: u64,
    pub toggles: u64,
    pub write_failures: u64,
}

pub struct ControlArbiter<W: Write> {
    mode: ControlMode,
    slot: Arc<CommandSlot>,
    channel: CommandChannel<W>,
    stats: ArbiterStats,
}

impl<W: Write> ControlArbiter<W> {
    /// 초기 모드는 항상 자율 주행입니다.
    pub fn new(channel: CommandChannel<W>, slot: Arc<CommandSlot>) -> Self {
        Self {
            mode: ControlMode::Autonomous,
            slot,
            channel,
            stats: ArbiterStats::default(),
        }
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn slot(&self) -> &Arc<CommandSlot> {
        &self.slot
    }

    pub fn stats(&self) -> ArbiterStats {
        self.stats
    }

    pub fn channel(&self) -> &CommandChannel<W> {
        &self.channel
    }

    pub fn into_channel(self) -> CommandChannel<W> {
        self.channel
    }

    /// 반복 시작 시 대기 명령을 소비하고 이번 반복에서 할 일을 정합니다.
    ///
    /// 채널 쓰기 실패는 경고만 남기고 흡수합니다. 명령 하나를 잃는 편이
    /// 인식 루프를 멈추는 것보다 낫습니다.
    pub fn poll(&mut self) -> Poll {
        if let Some(command) = self.slot.take() {
            match command {
                Command::Quit => {
                    info!("Quit command received");
                    return Poll::Quit;
                }
                Command::Toggle => self.toggle(),
                Command::Drive(drive) => self.forward(drive),
            }
        }

        match self.mode {
            ControlMode::ManualPaused => Poll::Paused,
            ControlMode::Autonomous => Poll::Autonomous,
        }
    }

    /// 계산된 조향각을 보냅니다. 수동 모드에서는 아무것도 보내지 않고 `false`.
    pub fn steer(&mut self, angle: f64) -> bool {
        if self.mode != ControlMode::Autonomous {
            return false;
        }

        match self.channel.send_angle(angle) {
            Ok(()) => {
                self.stats.angles_sent += 1;
                debug!("Sent angle {:.2}", angle);
                true
            }
            Err(e) => {
                self.stats.write_failures += 1;
                warn!("Failed to send angle {:.2}: {}", angle, e);
                false
            }
        }
    }

    fn toggle(&mut self) {
        self.mode = self.mode.toggled();
        self.stats.toggles += 1;

        if let Err(e) = self.channel.send_toggle() {
            self.stats.write_failures += 1;
            warn!("Failed to send pause/resume: {}", e);
        }

        match self.mode {
            ControlMode::ManualPaused => println!("Car movement paused"),
            ControlMode::Autonomous => println!("Car movement resumed"),
        }
        info!("Control mode is now {:?}", self.mode);
    }

    /// 수동 주행 명령은 현재 모드와 상관없이 그대로 전달합니다.
    fn forward(&mut self, drive: DriveCommand) {
        match self.channel.send_raw(drive) {
            Ok(()) => {
                self.stats.manual_sent += 1;
                println!("Sent command: {}", drive.as_byte() as char);
            }
            Err(e) => {
                self.stats.write_failures += 1;
                warn!("Failed to send command {:?}: {}", drive, e);
            }
        }
    }
}
