//! 검출된 선분들로부터 조향각을 계산합니다.

use opencv::core::Vec4i;

/// `hough_lines_p`가 돌려주는 선분 하나 (x1, y1) → (x2, y2)
///
/// 영상 좌표계이므로 y는 아래로 갈수록 커집니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSegment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl LineSegment {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// 선분의 기울기 각도 `atan2(Δy, Δx)` (라디안)
    pub fn orientation(&self) -> f64 {
        let dy = (self.y2 - self.y1) as f64;
        let dx = (self.x2 - self.x1) as f64;
        dy.atan2(dx)
    }
}

impl From<Vec4i> for LineSegment {
    fn from(v: Vec4i) -> Self {
        let [x1, y1, x2, y2] = v.0;
        Self { x1, y1, x2, y2 }
    }
}

/// 선분들의 평균 각도를 도 단위로 반환합니다.
///
/// - 선분 길이로 가중하지 않은 단순 산술 평균입니다.
/// - 선분이 하나도 없으면 0도(직진)를 반환합니다. 한 프레임의 검출 실패는
///   일시적인 것으로 보고 조향을 급하게 바꾸지 않습니다.
/// - 라디안 값을 그대로 평균하므로 ±90도 부근에 걸친 선분들이 섞이면
///   평균이 한쪽으로 치우칠 수 있습니다. 알려진 근사이며 보정하지 않습니다.
pub fn steering_angle(segments: &[LineSegment]) -> f64 {
    if segments.is_empty() {
        return 0.0;
    }

    let angle_sum: f64 = segments.iter().map(LineSegment::orientation).sum();
    let angle_avg = angle_sum / segments.len() as f64;
    angle_avg.to_degrees()
}
