//! DOM probe scripts evaluated in the page.

/// Interactive elements with a positive on-viewport box, trimmed text, and
/// the small attribute set the model needs to build selectors.
pub(crate) const DOM_SNAPSHOT_SCRIPT: &str = r#"
(() => {
    const nodes = document.querySelectorAll(
        'a, button, input, textarea, [role="button"], [role="link"], [data-testid]'
    );
    const keep = ['id', 'class', 'role', 'aria-label', 'data-testid', 'name', 'placeholder'];
    const results = [];
    for (const el of nodes) {
        const rect = el.getBoundingClientRect();
        if (rect.width <= 0 || rect.height <= 0 || rect.top < 0 || rect.left < 0) {
            continue;
        }
        const attributes = {};
        for (const name of keep) {
            const value = el.getAttribute(name);
            if (value) {
                attributes[name] = value;
            }
        }
        results.push({
            tag: el.tagName.toLowerCase(),
            text: el.innerText ? el.innerText.substring(0, 160) : '',
            attributes,
            rect: { x: rect.x, y: rect.y, width: rect.width, height: rect.height },
        });
    }
    return results;
})()
"#;

/// Script returning the viewport rect of the first match for a selector, or
/// null. The selector is embedded as a JSON string literal.
pub(crate) fn rect_probe_script(selector: &str) -> String {
    let selector = serde_json::to_string(selector).unwrap_or_else(|_| "''".to_string());
    format!(
        r#"(() => {{
            const el = document.querySelector({selector});
            if (!el) {{
                return null;
            }}
            const rect = el.getBoundingClientRect();
            return {{ x: rect.x, y: rect.y, width: rect.width, height: rect.height }};
        }})()"#
    )
}

/// Script performing a scripted click on the first match, returning whether
/// an element was found.
pub(crate) fn forced_click_script(selector: &str) -> String {
    let selector = serde_json::to_string(selector).unwrap_or_else(|_| "''".to_string());
    format!(
        r#"(() => {{
            const el = document.querySelector({selector});
            if (!el) {{
                return false;
            }}
            el.click();
            return true;
        }})()"#
    )
}

/// Script returning the inner text of the first match, or null.
pub(crate) fn inner_text_script(selector: &str) -> String {
    let selector = serde_json::to_string(selector).unwrap_or_else(|_| "''".to_string());
    format!(
        r#"(() => {{
            const el = document.querySelector({selector});
            if (!el) {{
                return null;
            }}
            return el.innerText || el.textContent || '';
        }})()"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_is_json_escaped() {
        let script = rect_probe_script("a[href='/compose']");
        assert!(script.contains(r#""a[href='/compose']""#));

        let tricky = forced_click_script(r#"button[title="x\y"]"#);
        assert!(tricky.contains(r#"\"x\\y\""#));
    }

    #[test]
    fn snapshot_script_filters_offscreen_boxes() {
        assert!(DOM_SNAPSHOT_SCRIPT.contains("rect.top < 0"));
        assert!(DOM_SNAPSHOT_SCRIPT.contains("data-testid"));
    }
}
