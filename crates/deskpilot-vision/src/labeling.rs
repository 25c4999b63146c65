//! 연결 요소 라벨링.
//!
//! 4방향 인접(대각선 제외) 기준으로 마스크의 true 픽셀을 서로소 영역으로 나눈다.
//! 재귀 대신 명시적 스택을 사용하므로 영역 크기와 무관하게 O(width×height)이다.

use deskpilot_core::models::geometry::BoundingBox;

use crate::palette::Mask;

/// 하나의 연결 영역. 비어 있지 않다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pixels: Vec<(u32, u32)>,
}

impl Component {
    /// 발견 순서대로의 픽셀 좌표 (첫 픽셀은 래스터 순서상 가장 앞)
    pub fn pixels(&self) -> &[(u32, u32)] {
        &self.pixels
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// 래스터 순서상 첫 픽셀
    pub fn seed(&self) -> (u32, u32) {
        self.pixels[0]
    }

    /// 좌표 최소/최대로 만든 바운딩 박스
    pub fn bounding_box(&self, id: u32) -> BoundingBox {
        let (mut x1, mut y1) = self.seed();
        let (mut x2, mut y2) = (x1, y1);
        for &(x, y) in &self.pixels {
            x1 = x1.min(x);
            y1 = y1.min(y);
            x2 = x2.max(x);
            y2 = y2.max(y);
        }
        BoundingBox::new(id, x1 as i32, y1 as i32, x2 as i32, y2 as i32)
    }
}

/// 마스크의 연결 요소를 래스터 순서(행 우선)로 발견하여 반환
pub fn label_components(mask: &Mask) -> Vec<Component> {
    let (width, height) = (mask.width(), mask.height());
    let mut visited = vec![false; width as usize * height as usize];
    let index = |x: u32, y: u32| y as usize * width as usize + x as usize;

    let mut components = Vec::new();
    let mut stack: Vec<(u32, u32)> = Vec::new();

    for y in 0..height {
        for x in 0..width {
            if !mask.get(x, y) || visited[index(x, y)] {
                continue;
            }

            let mut pixels = Vec::new();
            visited[index(x, y)] = true;
            stack.push((x, y));

            while let Some((cx, cy)) = stack.pop() {
                pixels.push((cx, cy));

                let neighbors = [
                    (cx.checked_sub(1), Some(cy)),
                    (cx.checked_add(1).filter(|nx| *nx < width), Some(cy)),
                    (Some(cx), cy.checked_sub(1)),
                    (Some(cx), cy.checked_add(1).filter(|ny| *ny < height)),
                ];
                for (nx, ny) in neighbors {
                    let (Some(nx), Some(ny)) = (nx, ny) else {
                        continue;
                    };
                    if mask.get(nx, ny) && !visited[index(nx, ny)] {
                        visited[index(nx, ny)] = true;
                        stack.push((nx, ny));
                    }
                }
            }

            components.push(Component { pixels });
        }
    }

    components
}
