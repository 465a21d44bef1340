//! 차선 주행 제어 루프의 에러 타입

use thiserror::Error;

/// 제어 루프 전반에서 사용하는 에러 타입
///
/// 영상 처리 단계 자체는 `LaneDetectionResult`(= `opencv::Result`)를 그대로 쓰고,
/// 장치(시리얼, 카메라)와 설정이 얽히는 곳에서 이 타입으로 합쳐집니다.
#[derive(Error, Debug)]
pub enum LaneDriveError {
    /// 시리얼 포트 열기/설정 실패
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// 채널 쓰기 등 일반 IO 실패
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// OpenCV 호출 실패
    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),

    /// 설정 파일 파싱 또는 검증 실패
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// 카메라가 열리지 않았거나 빈 프레임을 돌려줌
    #[error("Camera error: {0}")]
    Camera(String),
}

pub type LaneDriveResult<T> = Result<T, LaneDriveError>;

impl From<toml::de::Error> for LaneDriveError {
    fn from(e: toml::de::Error) -> Self {
        LaneDriveError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::LaneDriveError;

    #[test]
    fn test_error_display() {
        let err = LaneDriveError::Camera("device 0 not opened".to_string());
        assert_eq!(format!("{}", err), "Camera error: device 0 not opened");

        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: LaneDriveError = io.into();
        assert!(format!("{}", err).contains("pipe closed"));
    }

    #[test]
    fn test_toml_error_maps_to_config() {
        let parsed: Result<toml::Table, _> = toml::from_str("serial = [");
        let err: LaneDriveError = parsed.unwrap_err().into();
        assert!(matches!(err, LaneDriveError::Config(_)));
    }
}
