//! OCR 결과 병합과 스냅샷 간 델타 계산.

use std::collections::HashMap;

use deskpilot_core::models::ocr::{OcrDelta, OcrRegion};

/// 위치 변경으로 보지 않는 모서리 좌표 허용 오차 (px)
pub const MOVE_TOLERANCE: i32 = 5;

/// 가까운 텍스트 영역을 합친다.
///
/// 먼저 `x_min` 또는 `x_max`가 그룹 첫 영역과 `h_proximity` 이내인 영역끼리 묶고,
/// 결과를 `y_min` 순으로 정렬한 뒤 `y_min` 또는 `y_max`가 `v_proximity` 이내인
/// 영역끼리 다시 묶는다. 묶인 영역은 텍스트를 공백으로 잇고 상자를 합친다.
/// 신뢰도는 그룹 첫 영역의 값을 쓴다.
pub fn merge_close_text(regions: &[OcrRegion], h_proximity: i32, v_proximity: i32) -> Vec<OcrRegion> {
    let horizontal = group_by(regions.to_vec(), |anchor, other| {
        (anchor.bounding_box.x_min - other.bounding_box.x_min).abs() <= h_proximity
            || (anchor.bounding_box.x_max - other.bounding_box.x_max).abs() <= h_proximity
    });

    let mut sorted = horizontal;
    sorted.sort_by_key(|region| region.bounding_box.y_min);

    group_by(sorted, |anchor, other| {
        (anchor.bounding_box.y_min - other.bounding_box.y_min).abs() <= v_proximity
            || (anchor.bounding_box.y_max - other.bounding_box.y_max).abs() <= v_proximity
    })
}

/// 순서대로 훑으며 아직 묶이지 않은 첫 영역을 기준으로 그룹을 만든다
fn group_by<F>(regions: Vec<OcrRegion>, close: F) -> Vec<OcrRegion>
where
    F: Fn(&OcrRegion, &OcrRegion) -> bool,
{
    let mut used = vec![false; regions.len()];
    let mut merged = Vec::new();

    for i in 0..regions.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        let anchor = &regions[i];
        let mut group = anchor.clone();

        for j in (i + 1)..regions.len() {
            if !used[j] && close(anchor, &regions[j]) {
                used[j] = true;
                group.text.push(' ');
                group.text.push_str(&regions[j].text);
                group.bounding_box = group.bounding_box.union(&regions[j].bounding_box);
            }
        }
        merged.push(group);
    }

    merged
}

/// 두 OCR 스냅샷의 차이를 구한다.
///
/// 텍스트 문자열을 키로 비교한다. 같은 텍스트가 한 스냅샷에 여러 번 나오면
/// 마지막 것만 남으므로, 화면에 같은 글자가 여러 곳에 있을 때 그 사이의
/// 추가/삭제는 보고되지 않는다.
///
/// - `added`: 새 스냅샷에만 있는 텍스트
/// - `removed`: 이전 스냅샷에만 있는 텍스트
/// - `modified`: 양쪽에 있지만 모서리가 [`MOVE_TOLERANCE`]보다 많이 움직인 텍스트 (새 위치)
///
/// 각 목록은 해당 스냅샷에서 처음 등장한 순서를 따른다.
pub fn produce_delta(old: &[OcrRegion], new: &[OcrRegion]) -> OcrDelta {
    let old_index = index_by_text(old);
    let new_index = index_by_text(new);

    let mut delta = OcrDelta::default();

    for text in first_appearance(new) {
        let current = new_index[text];
        match old_index.get(text) {
            None => delta.added.push(current.clone()),
            Some(previous) => {
                if !previous
                    .bounding_box
                    .corners_within(&current.bounding_box, MOVE_TOLERANCE)
                {
                    delta.modified.push(current.clone());
                }
            }
        }
    }

    for text in first_appearance(old) {
        if !new_index.contains_key(text) {
            delta.removed.push(old_index[text].clone());
        }
    }

    delta
}

/// 텍스트별 마지막 영역
fn index_by_text(regions: &[OcrRegion]) -> HashMap<&str, &OcrRegion> {
    regions
        .iter()
        .map(|region| (region.text.as_str(), region))
        .collect()
}

/// 중복을 제거한 텍스트의 첫 등장 순서
fn first_appearance(regions: &[OcrRegion]) -> Vec<&str> {
    let mut seen = std::collections::HashSet::new();
    regions
        .iter()
        .map(|region| region.text.as_str())
        .filter(|text| seen.insert(*text))
        .collect()
}
