//! 아두이노와의 시리얼 명령 채널
//!
//! 프로토콜은 ASCII 이며 응답은 읽지 않습니다.
//! - 조향각: `A<정수>\n`
//! - 일시정지/재개: `p`
//! - 수동 주행: `w`, `s`, `a`, `d`, `x`, `+`, `-` 한 바이트

use crate::command::DriveCommand;
use crate::config::SerialConfig;
use crate::error::LaneDriveResult;
use serialport::SerialPort;
use std::io::{self, Write};
use tracing::info;

pub const TOGGLE_BYTE: u8 = b'p';

/// 바이트 단위 반이중 명령 채널
///
/// 모든 쓰기는 이 값을 소유한 쪽(제어 루프)에서 순서대로만 일어납니다.
#[derive(Debug)]
pub struct CommandChannel<W: Write> {
    port: W,
}

impl CommandChannel<Box<dyn SerialPort>> {
    /// 설정된 포트를 엽니다. 실패하면 제어 루프에 들어가서는 안 됩니다.
    pub fn open(config: &SerialConfig) -> LaneDriveResult<Self> {
        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(config.timeout())
            .open()?;
        info!(
            "Serial connection established on {} @ {} baud",
            config.port, config.baud_rate
        );
        Ok(Self::new(port))
    }
}

impl<W: Write> CommandChannel<W> {
    pub fn new(port: W) -> Self {
        Self { port }
    }

    /// 조향각을 정수(0 방향 버림)로 잘라 `A<int>\n`으로 보냅니다.
    pub fn send_angle(&mut self, angle: f64) -> io::Result<()> {
        self.write_frame(encode_angle(angle).as_bytes())
    }

    pub fn send_toggle(&mut self) -> io::Result<()> {
        self.write_frame(&[TOGGLE_BYTE])
    }

    pub fn send_raw(&mut self, command: DriveCommand) -> io::Result<()> {
        self.write_frame(&[command.as_byte()])
    }

    fn write_frame(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()
    }

    pub fn get_ref(&self) -> &W {
        &self.port
    }

    pub fn into_inner(self) -> W {
        self.port
    }
}

/// `37.9` → `"A37\n"`, `-12.7` → `"A-12\n"`
pub fn encode_angle(angle: f64) -> String {
    format!("A{}\n", angle.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angle_is_truncated_not_rounded() {
        assert_eq!(encode_angle(37.9), "A37\n");
        assert_eq!(encode_angle(-37.9), "A-37\n");
        assert_eq!(encode_angle(0.0), "A0\n");
        assert_eq!(encode_angle(-0.4), "A0\n");
        assert_eq!(encode_angle(90.0), "A90\n");
    }

    #[test]
    fn test_wire_bytes() {
        let mut channel = CommandChannel::new(Vec::new());
        channel.send_angle(37.9).unwrap();
        channel.send_toggle().unwrap();
        channel.send_raw(DriveCommand::Forward).unwrap();
        channel.send_raw(DriveCommand::SpeedDown).unwrap();
        assert_eq!(channel.into_inner(), b"A37\npw-".to_vec());
    }

    struct BrokenPort;

    impl Write for BrokenPort {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::TimedOut, "write timed out"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_surfaces_to_caller() {
        let mut channel = CommandChannel::new(BrokenPort);
        let err = channel.send_angle(10.0).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }
}
