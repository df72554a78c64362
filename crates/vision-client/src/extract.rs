//! Tolerant JSON extraction from free-form model replies.

/// Find the outermost balanced JSON object or array in `raw`.
///
/// Models wrap structured answers in prose and code fences; this scans for
/// the first opener whose balanced span parses as JSON, tracking string
/// literals and escapes so braces inside strings do not confuse the balance.
pub fn extract_json(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    for (start, &byte) in bytes.iter().enumerate() {
        if byte != b'{' && byte != b'[' {
            continue;
        }
        if let Some(end) = balanced_end(bytes, start) {
            let candidate = &raw[start..=end];
            if serde_json::from_str::<serde_json::Value>(candidate).is_ok() {
                return Some(candidate.to_string());
            }
        }
    }
    None
}

/// Index of the byte closing the bracket opened at `start`, or `None` when
/// the input ends unbalanced.
fn balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}
