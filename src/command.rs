//! 운전자 명령과 단일 슬롯 명령 보관소
//!
//! 입력 스레드는 해석한 명령을 [`CommandSlot`]에 넣기만 하고,
//! 메인 루프가 매 반복마다 한 번 꺼내 갑니다. 큐가 아니라 슬롯이므로
//! 소비되기 전에 새 명령이 들어오면 이전 명령은 덮어씌워집니다.

use parking_lot::Mutex;

/// 아두이노로 그대로 전달되는 수동 주행 명령
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriveCommand {
    Forward,
    Backward,
    Left,
    Right,
    Stop,
    SpeedUp,
    SpeedDown,
}

impl DriveCommand {
    pub const ALL: [DriveCommand; 7] = [
        DriveCommand::Forward,
        DriveCommand::Backward,
        DriveCommand::Left,
        DriveCommand::Right,
        DriveCommand::Stop,
        DriveCommand::SpeedUp,
        DriveCommand::SpeedDown,
    ];

    /// 시리얼로 보내는 원시 바이트
    pub fn as_byte(self) -> u8 {
        match self {
            DriveCommand::Forward => b'w',
            DriveCommand::Backward => b's',
            DriveCommand::Left => b'a',
            DriveCommand::Right => b'd',
            DriveCommand::Stop => b'x',
            DriveCommand::SpeedUp => b'+',
            DriveCommand::SpeedDown => b'-',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        DriveCommand::ALL
            .into_iter()
            .find(|cmd| cmd.as_byte() as char == c)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Drive(DriveCommand),
    /// 자율 주행 ⇄ 수동(일시정지) 전환
    Toggle,
    Quit,
}

impl Command {
    /// 한 줄 입력을 명령으로 해석합니다.
    ///
    /// 앞뒤 공백을 지우고 대소문자를 구분하지 않습니다.
    /// 정확히 한 글자짜리 토큰만 인정하며 그 외 입력은 `None`.
    pub fn parse(input: &str) -> Option<Self> {
        let token = input.trim().to_lowercase();
        let mut chars = token.chars();
        let c = chars.next()?;
        if chars.next().is_some() {
            return None;
        }

        match c {
            'p' => Some(Command::Toggle),
            'q' => Some(Command::Quit),
            other => DriveCommand::from_char(other).map(Command::Drive),
        }
    }
}

/// 입력 스레드와 메인 루프가 공유하는 단일 슬롯
///
/// `Quit`은 한 번 들어오면 소비될 때까지 다른 명령으로 덮어쓰이지 않습니다.
#[derive(Debug, Default)]
pub struct CommandSlot {
    pending: Mutex<Option<Command>>,
}

impl CommandSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 명령을 넣고, 소비되지 못하고 밀려난 이전 명령을 돌려줍니다.
    pub fn deposit(&self, command: Command) -> Option<Command> {
        let mut pending = self.pending.lock();
        if *pending == Some(Command::Quit) {
            return Some(command);
        }
        pending.replace(command)
    }

    /// 대기 중인 명령을 꺼내고 슬롯을 비웁니다.
    pub fn take(&self) -> Option<Command> {
        self.pending.lock().take()
    }

    pub fn peek(&self) -> Option<Command> {
        *self.pending.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_parse_accepted_tokens() {
        assert_eq!(Command::parse("w"), Some(Command::Drive(DriveCommand::Forward)));
        assert_eq!(Command::parse("S"), Some(Command::Drive(DriveCommand::Backward)));
        assert_eq!(Command::parse(" a \n"), Some(Command::Drive(DriveCommand::Left)));
        assert_eq!(Command::parse("d"), Some(Command::Drive(DriveCommand::Right)));
        assert_eq!(Command::parse("x"), Some(Command::Drive(DriveCommand::Stop)));
        assert_eq!(Command::parse("+"), Some(Command::Drive(DriveCommand::SpeedUp)));
        assert_eq!(Command::parse("-"), Some(Command::Drive(DriveCommand::SpeedDown)));
        assert_eq!(Command::parse("P"), Some(Command::Toggle));
        assert_eq!(Command::parse("q"), Some(Command::Quit));
    }

    #[test]
    fn test_parse_rejects_other_input() {
        for input in ["", "   ", "ww", "quit", "z", "A10", "1"] {
            assert_eq!(Command::parse(input), None, "input {:?}", input);
        }
    }

    #[test]
    fn test_drive_bytes_round_trip_through_parse() {
        for cmd in DriveCommand::ALL {
            let text = (cmd.as_byte() as char).to_string();
            assert_eq!(Command::parse(&text), Some(Command::Drive(cmd)));
        }
    }

    #[test]
    fn test_slot_last_write_wins() {
        let slot = CommandSlot::new();
        assert_eq!(slot.deposit(Command::Drive(DriveCommand::Forward)), None);
        assert_eq!(
            slot.deposit(Command::Drive(DriveCommand::Left)),
            Some(Command::Drive(DriveCommand::Forward))
        );
        assert_eq!(slot.take(), Some(Command::Drive(DriveCommand::Left)));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_slot_quit_is_not_displaced() {
        let slot = CommandSlot::new();
        slot.deposit(Command::Quit);
        assert_eq!(slot.deposit(Command::Toggle), Some(Command::Toggle));
        assert_eq!(slot.peek(), Some(Command::Quit));
        assert_eq!(slot.take(), Some(Command::Quit));
    }

    #[test]
    fn test_slot_concurrent_deposits_leave_one_value() {
        let slot = Arc::new(CommandSlot::new());
        let handles: Vec<_> = DriveCommand::ALL
            .into_iter()
            .map(|cmd| {
                let slot = Arc::clone(&slot);
                thread::spawn(move || {
                    for _ in 0..100 {
                        slot.deposit(Command::Drive(cmd));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert!(matches!(slot.take(), Some(Command::Drive(_))));
        assert_eq!(slot.take(), None);
    }
}
