//! 비전 파이프라인 통합 테스트.
//!
//! 프레임 → 대표 색상 → 영역 검출 → 스냅샷, OCR 스냅샷 → 델타 cross-crate 연동.

use deskpilot_core::config::VisionConfig;
use deskpilot_core::models::frame::Frame;
use deskpilot_core::models::geometry::{Point, Rect};
use deskpilot_core::models::ocr::OcrRegion;
use deskpilot_vision::analyzer::FrameAnalyzer;
use deskpilot_vision::labeling::label_components;
use deskpilot_vision::palette::{create_mask, dominant_colors};
use deskpilot_vision::regions::{MinSize, RegionDetector};
use deskpilot_vision::text_delta::{merge_close_text, produce_delta};
use image::{Rgba, RgbaImage};

const BACKGROUND: Rgba<u8> = Rgba([235, 235, 235, 255]);
const SQUARE: Rgba<u8> = Rgba([40, 120, 200, 255]);

/// 120x90 배경 위 (30,20)~(59,49) 30x30 정사각형
fn square_image() -> RgbaImage {
    RgbaImage::from_fn(120, 90, |x, y| {
        if (30..60).contains(&x) && (20..50).contains(&y) {
            SQUARE
        } else {
            BACKGROUND
        }
    })
}

fn region(text: &str, x1: i32, y1: i32, x2: i32, y2: i32) -> OcrRegion {
    OcrRegion::new(text, Rect::new(x1, y1, x2, y2), 95.0)
}

/// 두 색 이미지의 전경색으로 검출하면 정사각형 범위의 박스 하나
#[test]
fn single_square_yields_one_enclosing_box() {
    let image = square_image();
    let colors = dominant_colors(&image, 10);
    assert_eq!(colors.len(), 2);

    // 최빈색(배경)을 제외한 전경색만 검출
    let detector = RegionDetector::new(0, 80.0);
    let mut next_id = 0;
    let boxes = detector.detect(
        &image,
        &colors[1..],
        MinSize {
            height: 10,
            width: 10,
        },
        &mut next_id,
    );

    assert_eq!(boxes.len(), 1);
    let b = &boxes[0];
    assert_eq!((b.x1, b.y1, b.x2, b.y2), (30, 20, 59, 49));
    assert_eq!((b.width(), b.height()), (29, 29));
}

/// 라벨링은 참 픽셀을 빠짐없이, 겹치지 않게 나눈다
#[test]
fn labeling_partitions_mask() {
    let image = RgbaImage::from_fn(64, 48, |x, y| {
        if (x / 8 + y / 8) % 2 == 0 {
            SQUARE
        } else {
            BACKGROUND
        }
    });
    let colors = dominant_colors(&image, 2);
    let mask = create_mask(&image, colors[0].color, 0);
    let components = label_components(&mask);

    let mut seen = vec![false; 64 * 48];
    for component in &components {
        for &(x, y) in component.pixels() {
            let i = (y * 64 + x) as usize;
            assert!(!seen[i], "({x},{y}) 중복 배정");
            assert!(mask.get(x, y));
            seen[i] = true;
        }
    }
    assert_eq!(seen.iter().filter(|s| **s).count(), mask.count());
}

#[test]
fn added_word_shows_up_in_delta() {
    let old = vec![region("hello", 0, 0, 10, 10)];
    let new = vec![region("hello", 0, 0, 10, 10), region("world", 20, 0, 30, 10)];

    let delta = produce_delta(&old, &new);

    assert_eq!(delta.added, vec![region("world", 20, 0, 30, 10)]);
    assert!(delta.removed.is_empty());
    assert!(delta.modified.is_empty());
}

#[test]
fn same_snapshot_has_empty_delta() {
    let snapshot = vec![
        region("파일", 0, 0, 20, 10),
        region("편집", 30, 0, 50, 10),
        region("보기", 60, 0, 80, 10),
    ];
    assert!(produce_delta(&snapshot, &snapshot).is_empty());
}

#[test]
fn merge_is_idempotent_on_far_apart_regions() {
    let merged = vec![region("left", 0, 0, 30, 10), region("right", 500, 400, 540, 410)];
    assert_eq!(merge_close_text(&merged, 20, 40), merged);
}

/// 프레임 분석 전체 흐름: 박스, 색상, 커서 근처 OCR
#[test]
fn analyzer_builds_snapshot_from_frame() {
    let image = square_image();
    let frame = Frame::new(image.width(), image.height(), image.into_raw())
        .unwrap()
        .with_cursor(Some(Point::new(45, 35)));
    let ocr = vec![region("버튼", 32, 30, 55, 40), region("상태", 0, 80, 20, 88)];

    let analyzer = FrameAnalyzer::new(VisionConfig::default());
    let snapshot = analyzer.perceive(&frame, ocr).unwrap();

    assert_eq!(snapshot.screen, (120, 90));
    assert_eq!(snapshot.colors.len(), 2);
    assert!(!snapshot.boxes.is_empty());
    assert!(snapshot.windows.is_empty());
    assert_eq!(snapshot.cursor, Some(Point::new(45, 35)));

    let near = snapshot.ocr_near_cursor(23);
    assert_eq!(near.len(), 1);
    assert_eq!(near[0].text, "버튼");
}
