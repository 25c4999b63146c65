//! LLM 응답 JSON 복구.
//!
//! 응답 텍스트에서 JSON 후보를 순서대로 뽑아 해석되는 것을 쓴다.
//! 1. 전체 텍스트
//! 2. 마크다운 코드 블록(```json ... ```)의 내용
//! 3. 여는 `{`/`[` 위치마다 괄호 균형이 맞는 객체/배열, 앞에서부터 (문자열 리터럴 내부 괄호는 무시)
//!
//! 각 파서는 원하는 모양이 나올 때까지 후보를 넘긴다. 설명문 속 `[the window]`나
//! `{x, y}` 같은 괄호가 뒤따르는 JSON을 가리지 않는다.
//! 모든 후보가 실패하면 `None`을 돌려주고, 기본값 선택은 호출자가 한다.

use deskpilot_core::models::action::ActionSpec;
use deskpilot_core::models::task::SubTask;
use deskpilot_core::ports::decision::Verdict;
use serde_json::Value;
use tracing::debug;

/// 응답에서 해석 가능한 첫 JSON 값
pub fn extract_json(text: &str) -> Option<Value> {
    json_values(text).next()
}

/// 해석에 성공한 후보 값들 (후보 순서)
fn json_values(text: &str) -> impl Iterator<Item = Value> + '_ {
    candidates(text).filter_map(|candidate| serde_json::from_str::<Value>(candidate).ok())
}

fn candidates(text: &str) -> impl Iterator<Item = &str> + '_ {
    std::iter::once(text.trim())
        .chain(fenced_blocks(text))
        .chain(balanced_spans(text))
}

/// ``` 로 감싼 블록의 내용 (언어 태그 줄 제외)
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("```") {
        let after = &rest[open + 3..];
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after[body_start..];
        let Some(close) = body.find("```") else {
            break;
        };
        blocks.push(body[..close].trim());
        rest = &body[close + 3..];
    }
    blocks
}

/// 여는 괄호 위치마다 짝이 맞는 구간
fn balanced_spans(text: &str) -> impl Iterator<Item = &str> + '_ {
    text.char_indices()
        .filter(|(_, ch)| matches!(*ch, '{' | '['))
        .filter_map(move |(start, _)| balanced_from(text, start))
}

/// `start`의 `{` 또는 `[`부터 짝이 맞는 닫는 괄호까지
fn balanced_from(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// 객체 안에서 배열을 감싼 흔한 키
fn unwrap_list<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => keys
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array)),
        _ => None,
    }
}

/// 서브태스크 목록. 항목은 문자열 또는 `{"description": ...}` 객체.
/// ID는 1부터 다시 매긴다. 유효한 항목이 없으면 `None`.
pub fn parse_subtasks(text: &str) -> Option<Vec<SubTask>> {
    json_values(text).find_map(|value| subtasks_from(&value))
}

fn subtasks_from(value: &Value) -> Option<Vec<SubTask>> {
    let items = unwrap_list(value, &["subtasks", "subTasks", "steps"])?;

    let descriptions: Vec<String> = items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Object(map) => ["description", "subtask", "task", "step"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .map(|s| s.trim().to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect();

    if descriptions.is_empty() {
        return None;
    }
    Some(
        descriptions
            .into_iter()
            .enumerate()
            .map(|(i, description)| SubTask::new(i as u32 + 1, description))
            .collect(),
    )
}

/// 액션 배치. 배열, 단일 액션 객체, `{"actions": [...]}`를 받는다.
/// 해석되지 않는 항목은 건너뛴다. 유효한 항목이 없으면 `None`.
pub fn parse_actions(text: &str) -> Option<Vec<ActionSpec>> {
    json_values(text).find_map(|value| actions_from(&value))
}

fn actions_from(value: &Value) -> Option<Vec<ActionSpec>> {
    let items: Vec<Value> = match value {
        Value::Object(map) if map.contains_key("action") => vec![value.clone()],
        other => unwrap_list(other, &["actions"])?.clone(),
    };

    let total = items.len();
    let actions: Vec<ActionSpec> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<ActionSpec>(item).ok())
        .collect();

    if actions.len() < total {
        debug!(total, parsed = actions.len(), "해석 불가 액션 항목 제외");
    }
    if actions.is_empty() {
        None
    } else {
        Some(actions)
    }
}

/// 검증 결과 객체. 배열 등 객체가 아닌 후보는 건너뛴다.
pub fn parse_verdict(text: &str) -> Option<Verdict> {
    json_values(text).find_map(|value| match value {
        Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskpilot_core::models::action::ActionKind;

    #[test]
    fn plain_json_is_used_directly() {
        let value = extract_json(r#"  [1, 2]  "#).unwrap();
        assert_eq!(value, serde_json::json!([1, 2]));
    }

    #[test]
    fn fenced_block_is_extracted() {
        let text = "분석 결과:\n```json\n{\"isGoalAchieved\": true}\n```\n끝";
        let verdict = parse_verdict(text).unwrap();
        assert!(verdict.achieved);
    }

    #[test]
    fn balanced_span_ignores_brackets_in_strings() {
        let text = r#"Sure! {"description": "닫는 괄호 } 포함", "isGoalAchieved": false} trailing }"#;
        let verdict = parse_verdict(text).unwrap();
        assert_eq!(verdict.reason, "닫는 괄호 } 포함");
    }

    #[test]
    fn verdict_after_bracketed_prose() {
        let text = r#"I checked [the terminal window]. Result: {"isGoalAchieved": true, "description": "터미널이 열림"}"#;
        let verdict = parse_verdict(text).unwrap();
        assert!(verdict.achieved);
        assert_eq!(verdict.reason, "터미널이 열림");
    }

    #[test]
    fn verdict_skips_leading_valid_array() {
        let text = r#"Checked rows [1, 2] first, then {"isGoalAchieved": true}"#;
        assert!(parse_verdict(text).unwrap().achieved);
    }

    #[test]
    fn actions_after_brace_prose() {
        let text = r#"Using {x, y} coordinates: [{"actionSequenceID": 1, "action": "mouseClickLeft"}]"#;
        let actions = parse_actions(text).unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, ActionKind::MouseClickLeft);
    }

    #[test]
    fn subtasks_skip_non_list_json() {
        let text = r#"Plan for {"goal": "x"}: ["터미널 열기", "ls 입력"]"#;
        let subtasks = parse_subtasks(text).unwrap();
        assert_eq!(subtasks.len(), 2);
        assert_eq!(subtasks[1], SubTask::new(2, "ls 입력"));
    }

    #[test]
    fn unparseable_text_yields_none() {
        assert!(extract_json("no json here").is_none());
        assert!(parse_actions("{ broken").is_none());
        assert!(parse_verdict("[1,2]").is_none());
    }

    #[test]
    fn subtasks_from_strings_and_objects() {
        let subtasks = parse_subtasks(r#"["터미널 열기", {"description": "ls 입력"}, 3, ""]"#).unwrap();
        assert_eq!(subtasks.len(), 2);
        assert_eq!(subtasks[0], SubTask::new(1, "터미널 열기"));
        assert_eq!(subtasks[1], SubTask::new(2, "ls 입력"));

        let wrapped = parse_subtasks(r#"{"subtasks": ["a"]}"#).unwrap();
        assert_eq!(wrapped.len(), 1);
        assert!(parse_subtasks("[]").is_none());
    }

    #[test]
    fn actions_skip_invalid_items() {
        let text = r#"```json
[
  {"actionSequenceID": 1, "action": "mouseMove", "coordinates": {"x": 10, "y": 20}},
  "garbage",
  {"actionSequenceID": "two", "action": "mouseClickLeft"},
  {"actionSequenceID": 3, "action": "keyTap", "keyTapString": "enter"}
]
```"#;
        let actions = parse_actions(text).unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].kind, ActionKind::MouseMove { x: 10, y: 20 });
        assert_eq!(actions[1].sequence_id, 3);
    }

    #[test]
    fn single_action_object_is_accepted() {
        let actions = parse_actions(r#"{"actionSequenceID": 1, "action": "stopIteration"}"#).unwrap();
        assert_eq!(actions[0].kind, ActionKind::StopIteration);

        let wrapped = parse_actions(r#"{"actions": [{"action": "mouseClickRight"}]}"#).unwrap();
        assert_eq!(wrapped[0].kind, ActionKind::MouseClickRight);
    }
}
