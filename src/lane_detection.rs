use opencv::{
    core::{self, Mat, Point, Scalar, Size, Vec4i, Vector},
    imgproc,
    prelude::*,
    Result,
};
use opencv::core::AlgorithmHint::ALGO_HINT_DEFAULT;

use crate::config::{CannyParams, ColorRange, HoughParams};
use crate::steering::{steering_angle, LineSegment};

/// 파이프라인 함수들에서 공통으로 사용할 `Result` 타입 별칭입니다.
/// 영상 처리 단계는 OpenCV 에러를 그대로 `?`로 전파합니다.
pub type LaneDetectionResult<T> = Result<T>;

/// 한 프레임의 차선 검출 결과
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// ROI 안에서 검출된 선분들
    pub segments: Vec<LineSegment>,
    /// 선분들의 평균 각도 (도). 선분이 없으면 0.
    pub angle: f64,
}

/// 노란색(설정된 색상) 차선을 찾아 조향각을 계산하는 파이프라인입니다.
///
/// # 주요 멤버
///
/// - `color`: 차선 색상 HSV 범위
/// - `canny`: 엣지 검출 이중 임계값
/// - `hough`: 확률적 허프 변환 파라미터
///
/// 모든 값은 시작 시 설정에서 한 번 정해지고 이후 바뀌지 않습니다.
/// 프레임 크기에 의존하는 ROI 꼭짓점은 매 프레임 새로 계산합니다.
#[derive(Debug, Clone)]
pub struct Pipeline {
    color: ColorRange,
    canny: CannyParams,
    hough: HoughParams,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(
            ColorRange::default(),
            CannyParams::default(),
            HoughParams::default(),
        )
    }
}

impl Pipeline {
    pub fn new(color: ColorRange, canny: CannyParams, hough: HoughParams) -> Self {
        Self {
            color,
            canny,
            hough,
        }
    }

    /// HSV로 변환한 뒤 차선 색상 범위에 들어오는 픽셀만 남깁니다.
    ///
    /// # 인자
    /// * `img` - BGR 색상 영상
    ///
    /// # 반환
    /// * 범위 밖 픽셀이 0으로 지워진 BGR 영상
    fn filter_colors(&self, img: &Mat) -> Result<Mat> {
        let mut hsv = Mat::default();
        imgproc::cvt_color(img, &mut hsv, imgproc::COLOR_BGR2HSV, 0, ALGO_HINT_DEFAULT)?;

        let (lower, upper) = self.color.bounds();
        let mut mask = Mat::default();
        core::in_range(
            &hsv,
            &Scalar::new(lower[0], lower[1], lower[2], 0.0),
            &Scalar::new(upper[0], upper[1], upper[2], 0.0),
            &mut mask,
        )?;

        let mut filtered = Mat::default();
        core::bitwise_and(img, img, &mut filtered, &mask)?;
        Ok(filtered)
    }

    fn gray_scale(&self, img: &Mat) -> Result<Mat> {
        let mut gray = Mat::default();
        imgproc::cvt_color(img, &mut gray, imgproc::COLOR_BGR2GRAY, 0, ALGO_HINT_DEFAULT)?;
        Ok(gray)
    }

    /// 5x5 가우시안 블러로 센서 노이즈를 줄입니다.
    fn noise_removal(&self, img: &Mat) -> Result<Mat> {
        let mut dst = Mat::default();
        imgproc::gaussian_blur(
            img,
            &mut dst,
            Size::new(5, 5),
            0.0,
            0.0,
            core::BORDER_DEFAULT,
            ALGO_HINT_DEFAULT
        )?;
        Ok(dst)
    }

    /// Otsu 방식으로 전역 임계값을 자동으로 골라 이진화합니다.
    fn binarize(&self, img: &Mat) -> Result<Mat> {
        let mut binary = Mat::default();
        imgproc::threshold(
            img,
            &mut binary,
            0.0,
            255.0,
            imgproc::THRESH_BINARY | imgproc::THRESH_OTSU,
        )?;
        Ok(binary)
    }

    fn edge_detection(&self, img: &Mat) -> Result<Mat> {
        let mut edges = Mat::default();
        imgproc::canny(img, &mut edges, self.canny.low, self.canny.high, 3, false)?;
        Ok(edges)
    }

    /// 관심영역(ROI) 사다리꼴만 남기고 외부 영역을 제거합니다.
    fn roi(&self, img: &Mat) -> Result<Mat> {
        // 영상과 동일한 크기의 검정색 마스크 생성
        let mut mask = Mat::zeros(img.rows(), img.cols(), img.typ())?.to_mat()?;

        let vertices = roi_vertices(img.cols(), img.rows());
        let mut polygons: Vector<Vector<Point>> = Vector::new();
        polygons.push(vertices.into_iter().collect::<Vector<Point>>());

        // 마스크에 흰색으로 폴리곤(ROI) 영역을 채움
        imgproc::fill_poly(
            &mut mask,
            &polygons,
            Scalar::all(255.0),
            imgproc::LINE_8,
            0,
            Point::new(0, 0),
        )?;

        let mut masked_img = Mat::default();
        core::bitwise_and(img, &mask, &mut masked_img, &Mat::default())?;
        Ok(masked_img)
    }

    /// 프레임을 ROI가 적용된 단일 채널 엣지 영상으로 바꿉니다.
    ///
    /// 1) 색상 필터
    /// 2) 그레이 변환
    /// 3) 가우시안 블러
    /// 4) Otsu 이진화
    /// 5) 캐니 엣지
    /// 6) ROI
    ///
    /// 크기가 0인 프레임은 입력 조건 위반이므로 바로 에러를 돌려줍니다.
    pub fn preprocess(&self, frame: &Mat) -> Result<Mat> {
        if frame.empty() || frame.rows() <= 0 || frame.cols() <= 0 {
            return Err(opencv::Error::new(
                core::StsBadArg,
                "Cannot preprocess an empty frame.",
            ));
        }

        let filtered = self.filter_colors(frame)?;
        let gray = self.gray_scale(&filtered)?;
        let blur = self.noise_removal(&gray)?;
        let binary = self.binarize(&blur)?;
        let edges = self.edge_detection(&binary)?;
        self.roi(&edges)
    }

    /// 엣지 영상에서 확률적 허프 변환으로 선분을 찾습니다.
    pub fn detect_segments(&self, edges: &Mat) -> Result<Vec<LineSegment>> {
        let mut lines: Vector<Vec4i> = Vector::new();
        imgproc::hough_lines_p(
            edges,
            &mut lines,
            self.hough.rho,
            self.hough.theta_rad(),
            self.hough.threshold,
            self.hough.min_line_len,
            self.hough.max_line_gap,
        )?;
        Ok(lines.iter().map(LineSegment::from).collect())
    }

    /// 단일 프레임에 대한 전체 처리: 전처리 → 선분 검출 → 조향각
    pub fn processing(&self, frame: &Mat) -> Result<Detection> {
        let edges = self.preprocess(frame)?;
        let segments = self.detect_segments(&edges)?;
        let angle = steering_angle(&segments);
        Ok(Detection { segments, angle })
    }
}

/// 프레임 크기에 맞춘 ROI 사다리꼴 꼭짓점 (좌하, 좌상, 우상, 우하)
///
/// 하단은 폭의 10%~90%, 상단은 높이 50% 지점에서 폭의 40%~60% 입니다.
pub fn roi_vertices(width: i32, height: i32) -> [Point; 4] {
    let w = width as f64;
    let h = height as f64;
    let half = (h * 0.5) as i32;
    [
        Point::new((w * 0.1) as i32, height),
        Point::new((w * 0.4) as i32, half),
        Point::new((w * 0.6) as i32, half),
        Point::new((w * 0.9) as i32, height),
    ]
}
