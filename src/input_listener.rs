//! 터미널 입력 전용 스레드
//!
//! 한 줄씩 읽어 명령으로 해석한 뒤 공유 슬롯에 넣는 것이 전부입니다.
//! 카메라, 영상 버퍼, 명령 채널에는 손대지 않습니다.

use crate::command::{Command, CommandSlot};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

pub const PROMPT: &str =
    "Enter command (w, s, a, d, x, +, -) or press 'p' to pause/unpause, 'q' to quit: ";

/// 입력 루프가 끝난 이유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerExit {
    /// 운전자가 `q`를 입력함
    Quit,
    /// 입력 스트림이 닫힘 (stdin EOF)
    Eof,
}

/// `reader`에서 입력을 읽는 스레드를 띄웁니다.
///
/// 반환된 핸들은 join 하지 않아도 됩니다. 메인 루프가 끝나면 이 스레드가
/// `read_line`에서 대기 중이어도 프로세스는 종료됩니다.
pub fn spawn<R>(reader: R, slot: Arc<CommandSlot>) -> io::Result<thread::JoinHandle<ListenerExit>>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("input-listener".to_string())
        .spawn(move || {
            let exit = listen(reader, &slot);
            debug!("Input listener finished: {:?}", exit);
            exit
        })
}

/// 종료 명령이나 EOF를 만날 때까지 입력을 읽습니다.
pub fn listen<R: BufRead>(mut reader: R, slot: &CommandSlot) -> ListenerExit {
    let mut line = String::new();
    loop {
        print!("{}", PROMPT);
        let _ = io::stdout().flush();

        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => {
                info!("Operator input closed");
                return ListenerExit::Eof;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Failed to read operator input: {}", e);
                return ListenerExit::Eof;
            }
        }

        let Some(command) = Command::parse(&line) else {
            continue;
        };

        if let Some(dropped) = slot.deposit(command) {
            debug!("Command {:?} superseded before delivery", dropped);
        }

        if command == Command::Quit {
            println!("Exiting program...");
            return ListenerExit::Quit;
        }
    }
}
