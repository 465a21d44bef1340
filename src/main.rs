use anyhow::{Context, Result};
use clap::Parser;
use lane_drive::{
    display::{Display, WINDOW_NAME},
    input_listener, CameraGuard, Command, CommandChannel, CommandSlot, Config, ControlArbiter,
    DriveLoop, OpenCvCamera, Pipeline,
};
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// 차선 인식 기반 RC 차량 조향 제어
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML 설정 파일 경로 (없으면 기본값)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 시리얼 포트 (설정 파일 값을 덮어씀)
    #[arg(long)]
    port: Option<String>,

    /// 카메라 장치 번호
    #[arg(long)]
    camera: Option<i32>,

    /// 검출 결과 창을 띄우지 않음
    #[arg(long)]
    headless: bool,

    /// 로그 필터 (RUST_LOG 보다 우선)
    #[arg(long)]
    log: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match &args.log {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lane_drive=info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(port) = args.port {
        config.serial.port = port;
    }
    if let Some(index) = args.camera {
        config.camera.index = index;
    }
    if args.headless {
        config.drive.visible = false;
    }
    config.validate()?;

    // 시리얼 연결이 없으면 조향 경로가 없으므로 루프에 들어가지 않는다
    let channel = CommandChannel::open(&config.serial)
        .with_context(|| format!("failed to open serial port {}", config.serial.port))?;

    let slot = Arc::new(CommandSlot::new());

    let interrupt_slot = Arc::clone(&slot);
    ctrlc::set_handler(move || {
        println!("Program terminated by interrupt.");
        interrupt_slot.deposit(Command::Quit);
    })
    .context("failed to set signal handler")?;

    let camera = CameraGuard::acquire(OpenCvCamera::new(config.camera.index, config.camera.rotate_180))
        .context("failed to start camera")?;

    let pipeline = Pipeline::new(config.color, config.canny, config.hough);
    let arbiter = ControlArbiter::new(channel, Arc::clone(&slot));
    let mut drive = DriveLoop::new(camera, pipeline, arbiter)
        .with_idle_interval(config.drive.idle_interval());

    if config.drive.visible {
        match Display::open(WINDOW_NAME) {
            Ok(display) => drive = drive.with_display(display),
            Err(e) => warn!("Display unavailable, running headless: {}", e),
        }
    }

    // join 하지 않는다. 메인 루프가 끝나면 입력 대기 중이어도 프로세스는 종료된다.
    let _listener = input_listener::spawn(BufReader::new(io::stdin()), Arc::clone(&slot))
        .context("failed to spawn input listener")?;

    info!("Lane drive started (autonomous)");
    match drive.run() {
        Ok(stats) => {
            info!("Stopped after {} frames", stats.frames);
            Ok(())
        }
        Err(e) => {
            error!("Drive loop aborted: {}", e);
            Err(e.into())
        }
    }
}
