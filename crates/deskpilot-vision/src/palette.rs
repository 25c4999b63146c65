//! 대표 색상 추출과 색상 마스크.
//!
//! 픽셀을 정확한 색상값으로 묶어 빈도를 세고, 특정 색상에 대한 허용 오차
//! 마스크를 만든다. 그레이스케일 변환과 이진화도 여기서 제공한다.

use std::collections::HashMap;

use deskpilot_core::models::color::{Color, ColorCount};
use image::{GrayImage, ImageBuffer, Luma, Pixel, RgbaImage};

/// 픽셀의 RGB 색상 (알파 무시)
pub fn pixel_color<P: Pixel<Subpixel = u8>>(pixel: &P) -> Color {
    let rgb = pixel.to_rgb();
    Color::rgb(rgb[0], rgb[1], rgb[2])
}

/// 상위 `k`개 대표 색상.
///
/// 픽셀 수 내림차순, 동률이면 색상값(`0xRRGGBB`) 오름차순으로 정렬한다.
/// 서로 다른 색상이 `k`개보다 적으면 전부 반환한다.
pub fn dominant_colors<P>(image: &ImageBuffer<P, Vec<u8>>, k: usize) -> Vec<ColorCount>
where
    P: Pixel<Subpixel = u8>,
{
    let total = u64::from(image.width()) * u64::from(image.height());
    if total == 0 || k == 0 {
        return Vec::new();
    }

    let mut counts: HashMap<Color, u64> = HashMap::new();
    for pixel in image.pixels() {
        *counts.entry(pixel_color(pixel)).or_insert(0) += 1;
    }

    let mut ranked: Vec<ColorCount> = counts
        .into_iter()
        .map(|(color, count)| ColorCount {
            color,
            count,
            percentage: count as f64 / total as f64 * 100.0,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.color.value().cmp(&b.color.value()))
    });
    ranked.truncate(k);
    ranked
}

/// 휘도 그레이스케일 (ITU-R BT.601 가중치)
pub fn to_grayscale(image: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let p = image.get_pixel(x, y);
        Luma([luminance(p[0], p[1], p[2])])
    })
}

/// 0.299R + 0.587G + 0.114B, 16비트 고정소수점 반올림
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let y = 19_595 * u32::from(r) + 38_470 * u32::from(g) + 7_471 * u32::from(b) + (1 << 15);
    (y >> 16) as u8
}

/// 임계값 이진화: `v < threshold → 0`, 그 외 255
pub fn binarize(gray: &GrayImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y)[0];
        Luma([if v < threshold { 0 } else { 255 }])
    })
}

// ============================================================
// Mask
// ============================================================

/// 원본 이미지와 같은 크기의 2차원 불리언 격자 (행 우선)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl Mask {
    /// 모두 false인 마스크
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width as usize * height as usize],
        }
    }

    /// 좌표별 술어로 마스크 생성
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if f(x, y) {
                    mask.set(x, y, true);
                }
            }
        }
        mask
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// 범위 밖 좌표는 false
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.bits[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if x < self.width && y < self.height {
            let i = self.index(x, y);
            self.bits[i] = value;
        }
    }

    /// true 픽셀 수
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }
}

/// `color`에서 채널별 `drift` 이내인 픽셀을 true로 표시
pub fn create_mask<P>(image: &ImageBuffer<P, Vec<u8>>, color: Color, drift: u8) -> Mask
where
    P: Pixel<Subpixel = u8>,
{
    Mask::from_fn(image.width(), image.height(), |x, y| {
        pixel_color(image.get_pixel(x, y)).within_drift(&color, drift)
    })
}
