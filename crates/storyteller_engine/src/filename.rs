/// File name for an exported artifact: the backend name with path separators,
/// reserved characters and Windows device names neutralized.
pub fn artifact_filename(name: &str) -> String {
    // Backend names may carry a directory prefix; keep only the last component.
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name);

    let mut cleaned = String::with_capacity(base.len());
    let mut prev_underscore = false;
    for c in base.chars() {
        let c = if is_forbidden(c) { '_' } else { c };
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        cleaned.push(c);
    }

    let mut cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]).to_string();
    if cleaned.is_empty() {
        cleaned = "artifact".to_string();
    }
    if cleaned.len() > 120 {
        let mut cut = 120;
        while !cleaned.is_char_boundary(cut) {
            cut -= 1;
        }
        cleaned.truncate(cut);
    }
    let stem = cleaned.split('.').next().unwrap_or(&cleaned);
    if is_reserved_windows_name(stem) {
        cleaned.insert(0, '_');
    }
    cleaned
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
