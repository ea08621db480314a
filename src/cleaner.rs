//! Cleanup of raw model output before display.
//!
//! Generation models wrap code in markdown fences and leave directive or
//! language-tag artifacts behind; `clean` strips them. The function is pure,
//! total, and idempotent.

use once_cell::sync::Lazy;
use regex::Regex;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```(?:tsx|jsx)?").unwrap());
static DIRECTIVE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^(?:'use client'|"use client");?[ \t]*\r?$"#).unwrap());

/// Strip markdown fences, standalone client-mode directive lines, and a
/// leading bare language tag from raw model output.
pub fn clean(raw: &str) -> String {
    // Every pass only deletes text, so iterating to a fixpoint terminates
    // and makes the whole function idempotent even when one pass exposes
    // an artifact for the next (e.g. a fence hiding a directive line).
    let mut current = raw.to_string();
    loop {
        let next = clean_once(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn clean_once(raw: &str) -> String {
    let without_fences = CODE_FENCE.replace_all(raw, "");
    let without_directives = DIRECTIVE_LINE.replace_all(&without_fences, "");
    strip_leading_language_tag(without_directives.trim())
        .trim()
        .to_string()
}

/// Remove a leftover `tsx` token at the head of the text, case-insensitively.
/// Only a bare tag is stripped, never an identifier that merely starts with it.
fn strip_leading_language_tag(code: &str) -> &str {
    let mut out = code;
    // Byte-wise prefix check: "tsx" is ASCII, so a hit guarantees the slice
    // below lands on a char boundary even in non-ASCII input.
    while out.as_bytes().len() >= 3 && out.as_bytes()[..3].eq_ignore_ascii_case(b"tsx") {
        let rest = &out[3..];
        match rest.chars().next() {
            Some(c) if c.is_alphanumeric() || c == '_' => break,
            _ => out = rest.trim_start(),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fences_and_language_tags() {
        let raw = "```tsx\nexport default function App() { return <div /> }\n```";
        assert_eq!(
            clean(raw),
            "export default function App() { return <div /> }"
        );
    }

    #[test]
    fn strips_jsx_and_bare_fences() {
        assert_eq!(clean("```jsx\n<div />\n```"), "<div />");
        assert_eq!(clean("```\n<div />\n```"), "<div />");
    }

    #[test]
    fn removes_standalone_directive_lines() {
        let raw = "'use client'\n\nfunction App() { return <div /> }";
        assert_eq!(clean(raw), "function App() { return <div /> }");

        let double_quoted = "\"use client\";\nconst App = () => <div />;";
        assert_eq!(clean(double_quoted), "const App = () => <div />;");
    }

    #[test]
    fn keeps_inline_directive_mentions() {
        // Only standalone lines are directives; a quoted mention inside an
        // expression stays untouched.
        let raw = "const label = \"'use client' is a directive\";";
        assert_eq!(clean(raw), raw);
    }

    #[test]
    fn strips_leading_tsx_token_case_insensitively() {
        assert_eq!(clean("tsx\n<div />"), "<div />");
        assert_eq!(clean("TSX <div />"), "<div />");
        assert_eq!(clean("tsxFactory()"), "tsxFactory()");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(clean("  \n <div /> \n "), "<div />");
    }

    #[test]
    fn is_idempotent_on_layered_artifacts() {
        let inputs = [
            "```tsx\n'use client'\ntsx\n<div />\n```",
            "tsx tsx <div />",
            "tsx'use client'\n<div />",
            "",
            "plain text",
        ];
        for input in inputs {
            let once = clean(input);
            assert_eq!(clean(&once), once, "clean not idempotent for {input:?}");
        }
    }

    #[test]
    fn empty_and_fence_only_inputs_clean_to_empty() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("```tsx\n```"), "");
    }
}
