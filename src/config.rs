//! 실행 설정
//!
//! 모든 값은 기본값을 가지며, TOML 파일(`--config`)로 일부만 덮어쓸 수 있습니다.
//! 시작 시 한 번 읽고 검증한 뒤에는 읽기 전용으로만 사용합니다.

use crate::error::{LaneDriveError, LaneDriveResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 전체 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub serial: SerialConfig,
    pub camera: CameraConfig,
    pub color: ColorRange,
    pub canny: CannyParams,
    pub hough: HoughParams,
    pub drive: DriveConfig,
}

/// 아두이노와 연결되는 시리얼 포트 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    /// 읽기 타임아웃 (ms)
    pub timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud_rate: 115200,
            timeout_ms: 1000,
        }
    }
}

impl SerialConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// `videoio::VideoCapture` 장치 번호
    pub index: i32,
    /// 카메라가 뒤집혀 장착된 경우 매 프레임을 180도 회전
    pub rotate_180: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            rotate_180: true,
        }
    }
}

/// 차선 색상(HSV) 범위
///
/// OpenCV 8비트 HSV 기준이므로 H는 0~179, S/V는 0~255 입니다.
/// 기본값은 노란색 차선에 맞춰져 있으며 실제 차선 색상에 따라 조정이 필요합니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorRange {
    pub h_min: u8,
    pub h_max: u8,
    pub s_min: u8,
    pub s_max: u8,
    pub v_min: u8,
    pub v_max: u8,
}

impl Default for ColorRange {
    fn default() -> Self {
        Self {
            h_min: 20,
            h_max: 36,
            s_min: 50,
            s_max: 255,
            v_min: 185,
            v_max: 255,
        }
    }
}

impl ColorRange {
    /// `core::in_range`에 넘길 (하한, 상한) 값
    pub fn bounds(&self) -> ([f64; 3], [f64; 3]) {
        (
            [self.h_min as f64, self.s_min as f64, self.v_min as f64],
            [self.h_max as f64, self.s_max as f64, self.v_max as f64],
        )
    }
}

/// Canny 엣지 검출 이중 임계값
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CannyParams {
    pub low: f64,
    pub high: f64,
}

impl Default for CannyParams {
    fn default() -> Self {
        Self {
            low: 50.0,
            high: 150.0,
        }
    }
}

/// 확률적 허프 변환(`hough_lines_p`) 파라미터
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoughParams {
    /// 거리 해상도 (픽셀)
    pub rho: f64,
    /// 각도 해상도 (도)
    pub theta_deg: f64,
    /// 최소 투표 수
    pub threshold: i32,
    pub min_line_len: f64,
    pub max_line_gap: f64,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            rho: 2.0,
            theta_deg: 1.0,
            threshold: 15,
            min_line_len: 10.0,
            max_line_gap: 20.0,
        }
    }
}

impl HoughParams {
    pub fn theta_rad(&self) -> f64 {
        self.theta_deg.to_radians()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// 일시정지 중 폴링 간격 (ms). 0이면 쉬지 않고 돈다.
    pub idle_interval_ms: u64,
    /// 검출 결과 창 표시 여부
    pub visible: bool,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            idle_interval_ms: 10,
            visible: true,
        }
    }
}

impl DriveConfig {
    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }
}

impl Config {
    /// TOML 파일에서 설정을 읽고 검증합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> LaneDriveResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> LaneDriveResult<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LaneDriveResult<()> {
        let c = &self.color;
        for (name, lo, hi) in [
            ("h", c.h_min, c.h_max),
            ("s", c.s_min, c.s_max),
            ("v", c.v_min, c.v_max),
        ] {
            if lo > hi {
                return Err(LaneDriveError::Config(format!(
                    "color.{name}_min ({lo}) is greater than color.{name}_max ({hi})"
                )));
            }
        }

        if self.canny.low > self.canny.high {
            return Err(LaneDriveError::Config(format!(
                "canny.low ({}) is greater than canny.high ({})",
                self.canny.low, self.canny.high
            )));
        }

        if self.hough.rho <= 0.0 || self.hough.theta_deg <= 0.0 {
            return Err(LaneDriveError::Config(
                "hough.rho and hough.theta_deg must be positive".to_string(),
            ));
        }

        if self.serial.port.is_empty() {
            return Err(LaneDriveError::Config("serial.port is empty".to_string()));
        }

        Ok(())
    }
}
