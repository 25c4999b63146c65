//! 색상 및 색상 빈도 모델.

use serde::{Deserialize, Serialize};
use std::fmt;

/// RGB 색상. 직렬화 시 `#RRGGBB` 문자열로 표현한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// 회색조 색상
    pub const fn gray(v: u8) -> Self {
        Self { r: v, g: v, b: v }
    }

    /// `0xRRGGBB` 정수값. 동률 정렬의 2차 키로 사용한다.
    pub fn value(&self) -> u32 {
        (u32::from(self.r) << 16) | (u32::from(self.g) << 8) | u32::from(self.b)
    }

    /// 채널별 `|a-b| ≤ drift` 여부
    pub fn within_drift(&self, other: &Color, drift: u8) -> bool {
        self.r.abs_diff(other.r) <= drift
            && self.g.abs_diff(other.g) <= drift
            && self.b.abs_diff(other.b) <= drift
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let hex = value.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("잘못된 색상 형식: {value}"));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| format!("잘못된 색상 형식: {value}"))
        };
        Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// 대표 색상 항목: 픽셀 수 내림차순으로 정렬된다
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorCount {
    pub color: Color,
    pub count: u64,
    /// 전체 픽셀 대비 비율 (0.0 ~ 100.0)
    pub percentage: f64,
}
