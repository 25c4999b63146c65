//! 좌표/사각형 모델.

use serde::{Deserialize, Serialize};

/// 화면 좌표 (픽셀)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// 축 정렬 사각형 (최소/최대 좌표)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rect {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl Rect {
    /// 좌표 순서를 정규화하여 생성
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            x_min: x1.min(x2),
            y_min: y1.min(y2),
            x_max: x1.max(x2),
            y_max: y1.max(y2),
        }
    }

    pub fn width(&self) -> i32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> i32 {
        self.y_max - self.y_min
    }

    /// 두 사각형을 모두 포함하는 최소 사각형
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// 네 모서리 좌표가 모두 `tolerance` 이내로 같은지 여부
    pub fn corners_within(&self, other: &Rect, tolerance: i32) -> bool {
        (self.x_min - other.x_min).abs() <= tolerance
            && (self.y_min - other.y_min).abs() <= tolerance
            && (self.x_max - other.x_max).abs() <= tolerance
            && (self.y_max - other.y_max).abs() <= tolerance
    }

    /// 세로 구간 `[top, bottom]`과 겹치는지 여부
    pub fn overlaps_rows(&self, top: i32, bottom: i32) -> bool {
        self.y_min <= bottom && self.y_max >= top
    }
}

/// 검출된 영역의 바운딩 박스. `id`는 한 검출 패스 안에서 순차 부여된다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub id: u32,
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    /// 좌표 순서를 정규화하여 생성 (x1≤x2, y1≤y2 보장)
    pub fn new(id: u32, x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        let rect = Rect::new(x1, y1, x2, y2);
        Self {
            id,
            x1: rect.x_min,
            y1: rect.y_min,
            x2: rect.x_max,
            y2: rect.y_max,
        }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x1, self.y1, self.x2, self.y2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_normalizes_order() {
        let r = Rect::new(10, 20, 0, 5);
        assert_eq!((r.x_min, r.y_min, r.x_max, r.y_max), (0, 5, 10, 20));
        assert_eq!(r.width(), 10);
        assert_eq!(r.height(), 15);
    }

    #[test]
    fn union_envelopes_both() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, -5, 30, 8);
        assert_eq!(a.union(&b), Rect::new(0, -5, 30, 10));
    }

    #[test]
    fn corners_within_tolerance() {
        let a = Rect::new(0, 0, 10, 10);
        assert!(a.corners_within(&Rect::new(5, 5, 15, 15), 5));
        assert!(!a.corners_within(&Rect::new(0, 0, 16, 10), 5));
    }

    #[test]
    fn rect_serializes_camel_case() {
        let json = serde_json::to_string(&Rect::new(1, 2, 3, 4)).unwrap();
        assert_eq!(json, r#"{"xMin":1,"yMin":2,"xMax":3,"yMax":4}"#);
    }

    #[test]
    fn bounding_box_invariant() {
        let b = BoundingBox::new(3, 9, 9, 1, 2);
        assert!(b.x1 <= b.x2 && b.y1 <= b.y2);
        assert_eq!(b.width(), 8);
    }
}
