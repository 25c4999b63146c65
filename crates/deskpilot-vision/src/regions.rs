//! 영역 바운딩 박스 검출.
//!
//! 상위 대표 색상마다 정확 마스크(drift 0)와 느슨한 마스크를 만들어 각각 라벨링하고,
//! 두 결과의 합집합에서 순도(정확 마스크에 속한 픽셀 비율)가 낮은 영역과
//! 최소 크기 미만의 영역을 버린다.
//!
//! 1차 패스는 그레이스케일에서 글리프 크기 영역을, 2차 패스는 이진화 이미지에서
//! 패널 크기 영역을 찾는다. ID는 두 패스에 걸쳐 순차 부여된다.

use deskpilot_core::config::VisionConfig;
use deskpilot_core::models::color::ColorCount;
use deskpilot_core::models::geometry::BoundingBox;
use image::{GrayImage, ImageBuffer, Pixel};
use tracing::debug;

use crate::labeling::{label_components, Component};
use crate::palette::{binarize, create_mask, dominant_colors, Mask};

/// 한 검출 패스의 최소 크기
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinSize {
    pub height: i32,
    pub width: i32,
}

/// 색상별 이중 마스크 영역 검출기
#[derive(Debug, Clone, Copy)]
pub struct RegionDetector {
    /// 느슨한 마스크 허용 오차
    loose_drift: u8,
    /// 순도 하한 (%)
    min_purity: f64,
}

impl RegionDetector {
    pub fn new(loose_drift: u8, min_purity: f64) -> Self {
        Self {
            loose_drift,
            min_purity,
        }
    }

    /// 주어진 색상 목록에 대해 한 패스를 수행한다.
    ///
    /// `next_id`에서 시작해 박스마다 1씩 증가시킨다.
    pub fn detect<P>(
        &self,
        image: &ImageBuffer<P, Vec<u8>>,
        colors: &[ColorCount],
        min: MinSize,
        next_id: &mut u32,
    ) -> Vec<BoundingBox>
    where
        P: Pixel<Subpixel = u8>,
    {
        let mut boxes = Vec::new();

        for entry in colors {
            let exact = create_mask(image, entry.color, 0);
            let exact_components = label_components(&exact);

            let mut candidates: Vec<Component> = exact_components.clone();
            if self.loose_drift > 0 {
                let loose = create_mask(image, entry.color, self.loose_drift);
                let owners = component_owners(&exact, &exact_components);
                for component in label_components(&loose) {
                    if !duplicates_exact(&component, &owners, &exact_components, exact.width()) {
                        candidates.push(component);
                    }
                }
            }

            for component in candidates {
                let purity = purity(&component, &exact);
                if purity < self.min_purity {
                    continue;
                }
                let bbox = component.bounding_box(*next_id);
                if bbox.height() < min.height || bbox.width() < min.width {
                    continue;
                }
                *next_id += 1;
                boxes.push(bbox);
            }
        }

        debug!(
            colors = colors.len(),
            boxes = boxes.len(),
            "영역 검출 패스 완료"
        );
        boxes
    }

    /// 그레이스케일 이미지에 2단계 검출 수행
    ///
    /// 1. 그레이스케일, 상위 `region_colors`개 색상, 글리프 최소 크기
    /// 2. 이진화 이미지, 모든 색상, 패널 최소 크기
    pub fn detect_two_pass(&self, gray: &GrayImage, config: &VisionConfig) -> Vec<BoundingBox> {
        let mut next_id = 0;

        let colors = dominant_colors(gray, config.region_colors);
        let mut boxes = self.detect(
            gray,
            &colors,
            MinSize {
                height: config.glyph_min_height,
                width: config.glyph_min_width,
            },
            &mut next_id,
        );

        let binary = binarize(gray, config.binarize_threshold);
        let colors = dominant_colors(&binary, usize::MAX);
        boxes.extend(self.detect(
            &binary,
            &colors,
            MinSize {
                height: config.panel_min_height,
                width: config.panel_min_width,
            },
            &mut next_id,
        ));

        boxes
    }
}

impl Default for RegionDetector {
    fn default() -> Self {
        let config = VisionConfig::default();
        Self::new(config.loose_drift, config.min_purity)
    }
}

/// 정확 마스크에 속한 픽셀 비율 (%)
pub fn purity(component: &Component, exact: &Mask) -> f64 {
    if component.is_empty() {
        return 0.0;
    }
    let inside = component
        .pixels()
        .iter()
        .filter(|(x, y)| exact.get(*x, *y))
        .count();
    inside as f64 / component.len() as f64 * 100.0
}

/// 픽셀별 정확 마스크 컴포넌트 인덱스 (없으면 u32::MAX)
fn component_owners(exact: &Mask, components: &[Component]) -> Vec<u32> {
    let width = exact.width() as usize;
    let mut owners = vec![u32::MAX; width * exact.height() as usize];
    for (i, component) in components.iter().enumerate() {
        for &(x, y) in component.pixels() {
            owners[y as usize * width + x as usize] = i as u32;
        }
    }
    owners
}

/// 느슨한 컴포넌트가 정확 컴포넌트 하나와 완전히 같은지 여부.
///
/// 정확 컴포넌트는 연결되어 있으므로 느슨한 컴포넌트 하나에 통째로 포함된다.
/// 따라서 크기가 같고 픽셀 하나를 공유하면 같은 집합이다.
fn duplicates_exact(
    component: &Component,
    owners: &[u32],
    exact_components: &[Component],
    width: u32,
) -> bool {
    let (x, y) = component.seed();
    let owner = owners[y as usize * width as usize + x as usize];
    owner != u32::MAX && exact_components[owner as usize].len() == component.len()
}
