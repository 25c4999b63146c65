//! 키 이름 정규화와 조합 키 분해.

/// `ctrl+alt+t` 형식을 개별 키로 분해한다.
///
/// 앞뒤 공백은 무시하며, `+` 자체를 누르는 경우(`"+"`, `"ctrl++"`)도 처리한다.
pub fn split_combo(combo: &str) -> Vec<String> {
    let combo = combo.trim();
    if combo.is_empty() {
        return Vec::new();
    }
    if combo == "+" {
        return vec!["+".to_string()];
    }

    let (body, trailing_plus) = match combo.strip_suffix("++") {
        Some(body) => (body, true),
        None => (combo, false),
    };

    let mut keys: Vec<String> = body
        .split('+')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(normalize_key)
        .collect();
    if trailing_plus {
        keys.push("+".to_string());
    }
    keys
}

/// 별칭을 표준 이름으로 바꾼다 (소문자)
pub fn normalize_key(key: &str) -> String {
    let lower = key.to_lowercase();
    let canonical = match lower.as_str() {
        "return" => "enter",
        "esc" => "escape",
        "del" => "delete",
        "control" => "ctrl",
        "option" => "alt",
        "command" | "cmd" | "super" | "win" | "windows" => "meta",
        "uparrow" => "up",
        "downarrow" => "down",
        "leftarrow" => "left",
        "rightarrow" => "right",
        "pgup" => "pageup",
        "pgdn" => "pagedown",
        other => other,
    };
    canonical.to_string()
}
