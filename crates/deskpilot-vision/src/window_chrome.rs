//! 창 장식(window chrome) 검출.
//!
//! OCR로 찾은 텍스트 상자가 창 제목 표시줄 안에 있는지 확인하고,
//! 헤더 사각형과 4개 제어 버튼 사각형을 복원한다.
//!
//! 각 단계는 `Result`를 반환하는 독립 함수이며, 실패 시 어느 단계에서
//! 실패했는지를 [`ChromeMiss`]로 알린다. 실패는 해당 후보를 버린다는 뜻일 뿐
//! 태스크 실패가 아니다.
//!
//! 텍스트 상자는 반열림 구간으로 해석한다: 열 `x_min..x_max`, 행 `y_min..y_max`.

use std::collections::HashMap;

use deskpilot_core::models::geometry::Rect;
use deskpilot_core::models::window::{WindowButtons, WindowDescriptor};
use image::GrayImage;
use thiserror::Error;
use tracing::debug;

/// 색상 유사 판정 임계값: 채널별 차이의 합(R+G+B)이 이 값 미만이면 같은 색
pub const COLOR_DISTANCE_THRESHOLD: u32 = 32;
/// 버튼 너비 허용 범위 (px)
pub const BUTTON_WIDTH_RANGE: (i32, i32) = (4, 30);
/// 이웃 버튼 간 간격 허용 범위 (px)
pub const BUTTON_GAP_RANGE: (i32, i32) = (12, 40);
/// 제목 표시줄의 제어 버튼 수
pub const BUTTON_COUNT: usize = 4;
/// 버튼 사각형의 헤더 대비 상하 여백 (px)
pub const BUTTON_INSET: i32 = 5;
/// 창 높이 탐색 한계 (px)
pub const MAX_HEIGHT_SEARCH: i32 = 2000;

/// 검출 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromePhase {
    BackgroundSampling,
    RightEdgeTrace,
    ButtonPattern,
    LeftEdge,
    HeaderTop,
    WindowHeight,
}

/// 검출 실패: 실패한 단계와 사유
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChromeMiss {
    #[error("텍스트 상자가 이미지 범위를 벗어남: {0:?}")]
    TextBoxOutOfBounds(Rect),

    #[error("배경 샘플 없음")]
    NoBackgroundSample,

    #[error("오른쪽 테두리를 찾지 못함 (x={from}부터)")]
    BorderNotFound { from: i32 },

    #[error("버튼 패턴 불일치: {found}개 발견, {reason}")]
    ButtonPattern { found: usize, reason: String },

    #[error("왼쪽 경계 탐색 불가 (x={0})")]
    LeftEdge(i32),

    #[error("헤더 상단 탐색 불가")]
    HeaderTop,

    #[error("창 높이 탐색 불가: 테두리 열 x={0}")]
    WindowHeight(i32),
}

impl ChromeMiss {
    /// 실패한 단계
    pub fn phase(&self) -> ChromePhase {
        match self {
            ChromeMiss::TextBoxOutOfBounds(_) | ChromeMiss::NoBackgroundSample => {
                ChromePhase::BackgroundSampling
            }
            ChromeMiss::BorderNotFound { .. } => ChromePhase::RightEdgeTrace,
            ChromeMiss::ButtonPattern { .. } => ChromePhase::ButtonPattern,
            ChromeMiss::LeftEdge(_) => ChromePhase::LeftEdge,
            ChromeMiss::HeaderTop => ChromePhase::HeaderTop,
            ChromeMiss::WindowHeight(_) => ChromePhase::WindowHeight,
        }
    }
}

/// 버튼 하나의 열 범위 (left: 배경 열, right: 마지막 비배경 열)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonSpan {
    pub left: i32,
    pub right: i32,
}

impl ButtonSpan {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }
}

/// 오른쪽 추적 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RightEdge {
    /// 배경이 이어지는 마지막 열
    pub header_right: i32,
    /// 텍스트 행 전체가 비배경인 첫 열
    pub border_right: i32,
}

/// 단계별 함수를 순서대로 실행하는 검출기
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowChromeDetector;

impl WindowChromeDetector {
    pub fn new() -> Self {
        Self
    }

    /// 텍스트 상자 주변에서 창을 검출
    pub fn detect(
        &self,
        gray: &GrayImage,
        text: Rect,
        title: &str,
    ) -> Result<WindowDescriptor, ChromeMiss> {
        check_bounds(gray, text)?;
        let background = sample_background(gray, text)?;
        let edge = trace_right_edge(gray, text, background)?;
        let scan_area = Rect::new(text.x_max, text.y_min, edge.header_right, text.y_max);
        let spans = find_buttons(gray, scan_area, background, edge.border_right)?;
        let left = find_left_edge(gray, text, background)?;
        let top = find_header_top(gray, text, background)?;

        let header = Rect::new(
            left,
            top,
            edge.header_right,
            text.y_max + (text.y_min - top),
        );
        let bottom = find_window_bottom(gray, header, edge.border_right)?;

        // spans는 오른쪽부터: close, maximize, minimize, roll-up
        let rect = |span: ButtonSpan| {
            Rect::new(
                span.left,
                header.y_min + BUTTON_INSET,
                span.right,
                header.y_max - BUTTON_INSET,
            )
        };
        let buttons = WindowButtons {
            close: rect(spans[0]),
            maximize: rect(spans[1]),
            minimize: rect(spans[2]),
            roll_up: rect(spans[3]),
        };

        let descriptor = WindowDescriptor {
            title: title.to_string(),
            bounding_box: Rect::new(header.x_min, header.y_min, edge.border_right, bottom),
            header,
            buttons,
        };
        debug!(title, header = ?descriptor.header, "창 검출 성공");
        Ok(descriptor)
    }
}

// ============================================================
// 픽셀 헬퍼
// ============================================================

/// 회색조 값을 (v,v,v)로 보았을 때 채널 차이 합이 임계값 미만인지
#[inline]
pub fn similar(a: u8, b: u8) -> bool {
    3 * u32::from(a.abs_diff(b)) < COLOR_DISTANCE_THRESHOLD
}

#[inline]
fn in_bounds(gray: &GrayImage, x: i32, y: i32) -> bool {
    x >= 0 && y >= 0 && (x as u32) < gray.width() && (y as u32) < gray.height()
}

#[inline]
fn at(gray: &GrayImage, x: i32, y: i32) -> u8 {
    gray.get_pixel(x as u32, y as u32)[0]
}

/// 행 구간 `[y0, y1)`에서 열 `x`가 모두 배경인지
fn column_all_background(gray: &GrayImage, x: i32, y0: i32, y1: i32, bg: u8) -> bool {
    (y0..y1).all(|y| similar(at(gray, x, y), bg))
}

/// 행 구간 `[y0, y1)`에서 열 `x`가 모두 비배경인지
fn column_all_foreground(gray: &GrayImage, x: i32, y0: i32, y1: i32, bg: u8) -> bool {
    (y0..y1).all(|y| !similar(at(gray, x, y), bg))
}

/// 가장 많이 나온 값. 동률이면 먼저 나온 값.
fn most_frequent(samples: impl IntoIterator<Item = u8>) -> Option<u8> {
    let mut counts: HashMap<u8, (usize, usize)> = HashMap::new();
    for (order, value) in samples.into_iter().enumerate() {
        counts.entry(value).or_insert((0, order)).0 += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1 .0.cmp(&b.1 .0).then(b.1 .1.cmp(&a.1 .1)))
        .map(|(value, _)| value)
}

// ============================================================
// 단계 함수
// ============================================================

/// 텍스트 상자가 비어 있지 않고 이미지 안에 있는지
pub fn check_bounds(gray: &GrayImage, text: Rect) -> Result<(), ChromeMiss> {
    let valid = text.x_min < text.x_max
        && text.y_min < text.y_max
        && in_bounds(gray, text.x_min, text.y_min)
        && in_bounds(gray, text.x_max - 1, text.y_max - 1);
    if valid {
        Ok(())
    } else {
        Err(ChromeMiss::TextBoxOutOfBounds(text))
    }
}

/// 1단계: 텍스트 상자 바로 바깥 4점(왼/오/위/아래)에서 최빈값을 배경색으로 삼는다
pub fn sample_background(gray: &GrayImage, text: Rect) -> Result<u8, ChromeMiss> {
    let points = [
        (text.x_min - 1, text.y_min),
        (text.x_max, text.y_min),
        (text.x_min, text.y_min - 1),
        (text.x_min, text.y_max),
    ];
    let samples = points
        .into_iter()
        .filter(|(x, y)| in_bounds(gray, *x, *y))
        .map(|(x, y)| at(gray, x, y));
    most_frequent(samples).ok_or(ChromeMiss::NoBackgroundSample)
}

/// 2단계: 텍스트 오른쪽부터 열 단위로 진행하여 텍스트 행 전체가 비배경인
/// 첫 열(테두리)을 찾는다. 그 직전까지가 헤더의 오른쪽이다.
pub fn trace_right_edge(gray: &GrayImage, text: Rect, bg: u8) -> Result<RightEdge, ChromeMiss> {
    let width = gray.width() as i32;
    let mut header_right = text.x_max;
    for x in text.x_max..width {
        if column_all_foreground(gray, x, text.y_min, text.y_max, bg) {
            return Ok(RightEdge {
                header_right,
                border_right: x,
            });
        }
        header_right = x;
    }
    Err(ChromeMiss::BorderNotFound { from: text.x_max })
}

/// `start`부터 왼쪽으로 `area` 안에서 다음 버튼을 찾는다.
///
/// 오른쪽 끝은 영역 행 중 비배경 픽셀이 있는 첫 열, 왼쪽 끝은 그 뒤로
/// 처음 나오는 전부 배경인 열이다.
pub fn find_vertical_edge(gray: &GrayImage, start: i32, area: Rect, bg: u8) -> Option<ButtonSpan> {
    let lowest = area.x_min.max(0);
    let right = (lowest..=start)
        .rev()
        .find(|&x| !column_all_background(gray, x, area.y_min, area.y_max, bg))?;
    let left = (lowest..=right)
        .rev()
        .find(|&x| column_all_background(gray, x, area.y_min, area.y_max, bg))?;
    Some(ButtonSpan { left, right })
}

/// 3단계: 테두리 바로 왼쪽부터 정확히 4개의 버튼을 찾는다.
///
/// 각 버튼 너비는 [`BUTTON_WIDTH_RANGE`], 이웃 간격은 [`BUTTON_GAP_RANGE`] 안이어야 하며,
/// 같은 조건을 만족하는 다섯 번째 버튼이 있어도 실패다.
/// 반환 순서는 오른쪽부터다.
pub fn find_buttons(
    gray: &GrayImage,
    area: Rect,
    bg: u8,
    border_right: i32,
) -> Result<Vec<ButtonSpan>, ChromeMiss> {
    let mut spans: Vec<ButtonSpan> = Vec::with_capacity(BUTTON_COUNT);
    let mut cursor = border_right - 1;

    loop {
        let Some(span) = find_vertical_edge(gray, cursor, area, bg) else {
            break;
        };
        if let Some(prev) = spans.last() {
            let gap = prev.left - span.right;
            if gap < BUTTON_GAP_RANGE.0 || gap > BUTTON_GAP_RANGE.1 {
                if spans.len() < BUTTON_COUNT {
                    return Err(ChromeMiss::ButtonPattern {
                        found: spans.len(),
                        reason: format!("버튼 간격 {gap}px 범위 밖"),
                    });
                }
                break;
            }
        }
        let width = span.width();
        if width < BUTTON_WIDTH_RANGE.0 || width > BUTTON_WIDTH_RANGE.1 {
            if spans.len() < BUTTON_COUNT {
                return Err(ChromeMiss::ButtonPattern {
                    found: spans.len(),
                    reason: format!("버튼 너비 {width}px 범위 밖"),
                });
            }
            break;
        }
        if spans.len() == BUTTON_COUNT {
            return Err(ChromeMiss::ButtonPattern {
                found: BUTTON_COUNT + 1,
                reason: "버튼이 4개보다 많음".to_string(),
            });
        }
        spans.push(span);
        cursor = span.left;
    }

    if spans.len() != BUTTON_COUNT {
        return Err(ChromeMiss::ButtonPattern {
            found: spans.len(),
            reason: "버튼 수 부족".to_string(),
        });
    }
    Ok(spans)
}

/// 4단계: 텍스트 왼쪽으로 배경이 끊기는 열을 찾고, 그 장애물(테두리 픽셀 등)을
/// 건너뛰어 이어지는 배경 구간의 가장 왼쪽 열을 헤더 왼쪽으로 삼는다.
/// 장애물 너머에 배경이 없으면 장애물 바로 오른쪽 열이다.
pub fn find_left_edge(gray: &GrayImage, text: Rect, bg: u8) -> Result<i32, ChromeMiss> {
    if !in_bounds(gray, text.x_min, text.y_min) {
        return Err(ChromeMiss::LeftEdge(text.x_min));
    }
    let is_bg = |x: i32| column_all_background(gray, x, text.y_min, text.y_max, bg);

    let Some(obstacle) = (0..text.x_min).rev().find(|&x| !is_bg(x)) else {
        return Ok(0);
    };
    let Some(resume) = (0..obstacle).rev().find(|&x| is_bg(x)) else {
        return Ok(obstacle + 1);
    };
    let left = (0..=resume)
        .rev()
        .take_while(|&x| is_bg(x))
        .last()
        .unwrap_or(resume);
    Ok(left)
}

/// 5단계: 텍스트 가운데 열에서 위로 올라가며 첫 비배경 행을 헤더 상단으로 삼는다.
/// 이미지 위쪽 끝까지 없으면 텍스트 상단을 쓴다.
pub fn find_header_top(gray: &GrayImage, text: Rect, bg: u8) -> Result<i32, ChromeMiss> {
    let mid_x = (text.x_min + text.x_max - 1) / 2;
    if !in_bounds(gray, mid_x, text.y_min) {
        return Err(ChromeMiss::HeaderTop);
    }
    let top = (0..text.y_min)
        .rev()
        .find(|&y| !similar(at(gray, mid_x, y), bg))
        .unwrap_or(text.y_min);
    Ok(top)
}

/// 6단계: 테두리 바로 안쪽 두 열의 헤더 구간 최빈값을 테두리 색으로 삼고,
/// 헤더 아래에서부터 같은 색이 이어지는 동안 내려간다.
/// 처음 어긋나는 행(또는 탐색 한계)이 창의 바닥이다.
pub fn find_window_bottom(
    gray: &GrayImage,
    header: Rect,
    border_right: i32,
) -> Result<i32, ChromeMiss> {
    let column = border_right - 1;
    if !in_bounds(gray, column, header.y_min.max(0)) {
        return Err(ChromeMiss::WindowHeight(border_right));
    }

    let height = gray.height() as i32;
    let rows = header.y_min.max(0)..header.y_max.min(height);
    let samples = rows.flat_map(|y| {
        [column, column - 1]
            .into_iter()
            .filter(|x| *x >= 0)
            .map(move |x| at(gray, x, y))
    });
    let border = most_frequent(samples).ok_or(ChromeMiss::WindowHeight(border_right))?;

    let start = header.y_max;
    let end = height.min(start + MAX_HEIGHT_SEARCH);
    let mut bottom = start;
    for y in start..end {
        if !similar(at(gray, column, y), border) {
            return Ok(y);
        }
        bottom = y;
    }
    Ok(bottom)
}
