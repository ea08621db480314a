//! Validation and sanitization of generated code before rendering.
//!
//! Pattern matching over source text, not parsing: the rules are heuristic
//! by design and tuned for untrusted model output. Findings are non-fatal;
//! callers receive the full error list plus a best-effort repaired copy and
//! decide whether to display the code anyway.

use once_cell::sync::Lazy;
use regex::Regex;

/// Import origins the dangerous-pattern scan accepts without complaint.
const SAFE_IMPORT_ORIGINS: &[&str] = &["react", "lucide-react", "tailwindcss"];

/// Allowed import sources (whitelist, matched by substring containment).
const ALLOWED_IMPORTS: &[&str] = &[
    "react",
    "lucide-react",
    "@/components",
    "@/lib",
    "clsx",
    "tailwind-merge",
];

/// One rule of the unsafe-construct scan. The import rule needs a
/// capture-and-check pass (no lookaround in the `regex` crate), so the scan
/// is a rule list rather than a bare pattern list.
enum UnsafeRule {
    Pattern(Regex),
    ForeignImport,
}

static UNSAFE_RULES: Lazy<Vec<UnsafeRule>> = Lazy::new(|| {
    let pattern = |p: &str| UnsafeRule::Pattern(Regex::new(p).expect("unsafe pattern compiles"));
    vec![
        pattern(r"(?i)eval\s*\("),
        pattern(r"(?i)Function\s*\("),
        pattern(r"(?i)document\.write"),
        pattern(r"(?i)innerHTML\s*="),
        pattern(r"(?i)dangerouslySetInnerHTML"),
        UnsafeRule::ForeignImport,
        pattern(r"(?i)<script"),
        pattern(r"(?i)onclick\s*="),
        pattern(r"(?i)onerror\s*="),
        pattern(r#"(?i)fetch\s*\(\s*['"`]"#),
    ]
});

static IMPORT_SOURCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"import\s+[^\n]*?from\s+['"]([^'"]+)['"]"#).unwrap());

static DECLARATION_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:function|const)\s+(\w+)\s*[(=:]").unwrap());

/// Outcome of one validation pass. Computed once per generation response,
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub sanitized_code: String,
}

impl ValidationResult {
    fn invalid(errors: Vec<String>) -> Self {
        Self {
            is_valid: false,
            errors,
            sanitized_code: String::new(),
        }
    }
}

/// Validate that the code is safe and shaped like a component.
///
/// Check order is load-bearing: the empty and mock checks short-circuit,
/// everything after runs to completion and accumulates errors.
pub fn validate_generated_code(code: &str) -> ValidationResult {
    if code.trim().is_empty() {
        return ValidationResult::invalid(vec!["Generated code is empty".to_string()]);
    }

    // Known placeholder-template signatures; a fallback template must never
    // be mistaken for real generated output.
    if code.contains("Component {i}") || (code.contains("map((i)") && code.contains("Component")) {
        return ValidationResult::invalid(vec![
            "Generated code appears to be a template/mock response, not real generated code"
                .to_string(),
        ]);
    }

    let mut errors = Vec::new();
    let mut sanitized_code = code.to_string();

    for rule in UNSAFE_RULES.iter() {
        if let Some(fragment) = rule.first_match(code) {
            errors.push(format!("Dangerous pattern detected: {fragment}"));
        }
    }

    if !code.contains("export") && !code.contains("return") {
        errors.push("Code must export a React component".to_string());
    }

    // Auto-repair: never adds errors, never fires twice on repaired input.
    if !code.starts_with("'use client'") && !code.starts_with("\"use client\"") {
        sanitized_code = format!("'use client'\n\n{code}");
    }

    if !code.contains("export default") && (code.contains("function") || code.contains("const")) {
        if let Some(name) = first_declared_name(code) {
            sanitized_code = format!("{sanitized_code}\n\nexport default {name}");
        }
    }

    for caps in IMPORT_SOURCE.captures_iter(code) {
        let source = &caps[1];
        let is_allowed = ALLOWED_IMPORTS
            .iter()
            .any(|allowed| source.contains(allowed))
            || source.starts_with('.');
        if !is_allowed && !source.starts_with('@') {
            errors.push(format!("Import from \"{source}\" is not in the allowed list"));
        }
    }

    if !code.contains("return") && !code.contains("jsx") && !code.contains('<') {
        errors.push("Code does not appear to be valid React/JSX".to_string());
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
        sanitized_code,
    }
}

/// Quick gate used before preview assembly, independent of the full
/// validator: JSX markers present, an export present, nothing unsafe.
pub fn is_valid_react_code(code: &str) -> bool {
    if code.trim().is_empty() {
        return false;
    }
    if !code.contains('<') || !code.contains('>') {
        return false;
    }
    if !code.contains("export") {
        return false;
    }
    UNSAFE_RULES.iter().all(|rule| rule.first_match(code).is_none())
}

/// Collapse an error list into one display string.
pub fn warning_summary(errors: &[String]) -> String {
    match errors {
        [] => String::new(),
        [single] => format!("⚠️ {single}"),
        many => {
            let bullets = many
                .iter()
                .map(|e| format!("• {e}"))
                .collect::<Vec<_>>()
                .join("\n");
            format!("⚠️ Multiple issues found:\n{bullets}")
        }
    }
}

impl UnsafeRule {
    /// First offending fragment for this rule, if any. One finding per rule;
    /// repeated occurrences do not multiply errors.
    fn first_match(&self, code: &str) -> Option<String> {
        match self {
            UnsafeRule::Pattern(pattern) => pattern.find(code).map(|m| m.as_str().to_string()),
            UnsafeRule::ForeignImport => {
                for caps in IMPORT_SOURCE.captures_iter(code) {
                    let source = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                    let safe = SAFE_IMPORT_ORIGINS
                        .iter()
                        .any(|origin| source.starts_with(origin));
                    if !safe {
                        return Some(caps.get(0).map(|m| m.as_str().to_string()).unwrap_or_default());
                    }
                }
                None
            }
        }
    }
}

/// First declared function or constant name; ambiguity resolves to the
/// first match.
fn first_declared_name(code: &str) -> Option<&str> {
    DECLARATION_NAME
        .captures(code)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_COMPONENT: &str =
        "'use client'\n\nexport default function Button() {\n  return <button>Click me</button>\n}";

    #[test]
    fn valid_component_passes_clean() {
        let result = validate_generated_code(VALID_COMPONENT);
        assert!(result.is_valid, "unexpected errors: {:?}", result.errors);
        assert!(result.errors.is_empty());
        assert_eq!(result.sanitized_code, VALID_COMPONENT);
    }

    #[test]
    fn empty_code_is_invalid_with_empty_sanitized_output() {
        for input in ["", "   \n\t"] {
            let result = validate_generated_code(input);
            assert!(!result.is_valid);
            assert_eq!(result.errors, vec!["Generated code is empty"]);
            assert_eq!(result.sanitized_code, "");
        }
    }

    #[test]
    fn mock_template_short_circuits_before_dangerous_scan() {
        // Contains eval too; the mock check must win and be the only error.
        let code = "eval('x'); items.map((i) => <div>Component {i}</div>)";
        let result = validate_generated_code(code);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("template/mock response"));
        assert_eq!(result.sanitized_code, "");
    }

    #[test]
    fn mapped_index_loop_with_component_is_mock() {
        let code = "export default () => [1,2,3].map((i) => <div>Component</div>)";
        let result = validate_generated_code(code);
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("template/mock response"));
    }

    #[test]
    fn eval_is_flagged_as_dangerous() {
        let code = "export default function App() { eval('1'); return <div /> }";
        let result = validate_generated_code(code);
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .iter()
                .any(|e| e.starts_with("Dangerous pattern detected: eval")),
            "errors: {:?}",
            result.errors
        );
        assert!(!is_valid_react_code(code));
    }

    #[test]
    fn scan_reports_every_matching_rule() {
        let code = "export default function App() {\n  eval('1')\n  document.write('x')\n  return <div onclick=\"hi()\" />\n}";
        let result = validate_generated_code(code);
        let dangerous = result
            .errors
            .iter()
            .filter(|e| e.starts_with("Dangerous pattern detected"))
            .count();
        assert_eq!(dangerous, 3);
    }

    #[test]
    fn one_error_per_rule_despite_repeats() {
        let code = "export default () => { eval('1'); eval('2'); return <div /> }";
        let result = validate_generated_code(code);
        let evals = result
            .errors
            .iter()
            .filter(|e| e.contains("eval"))
            .count();
        assert_eq!(evals, 1);
    }

    #[test]
    fn import_outside_safe_origins_is_dangerous() {
        let code = "import axios from 'axios'\nexport default () => <div />";
        let result = validate_generated_code(code);
        assert!(
            result
                .errors
                .iter()
                .any(|e| e.starts_with("Dangerous pattern detected: import")),
            "errors: {:?}",
            result.errors
        );
        assert!(!is_valid_react_code(code));
    }

    #[test]
    fn react_scoped_imports_are_safe() {
        let code = "import { useState } from 'react'\nimport ReactDOM from 'react-dom'\nexport default () => <div />";
        let result = validate_generated_code(code);
        assert!(result.is_valid, "errors: {:?}", result.errors);
        assert!(is_valid_react_code(code));
    }

    #[test]
    fn missing_export_and_return_is_flagged() {
        let result = validate_generated_code("let x = 1");
        assert!(
            result
                .errors
                .iter()
                .any(|e| e == "Code must export a React component")
        );
    }

    #[test]
    fn repair_prepends_directive_once() {
        let code = "export default function App() { return <div /> }";
        let result = validate_generated_code(code);
        assert!(result.sanitized_code.starts_with("'use client'\n\n"));

        // Second pass over repaired output is a no-op for the directive rule.
        let repaired = validate_generated_code(&result.sanitized_code);
        assert_eq!(repaired.sanitized_code, result.sanitized_code);
    }

    #[test]
    fn repair_appends_default_export_for_first_declaration() {
        let code = "'use client'\nfunction Header() { return <h1>hi</h1> }\nconst Footer = () => <footer />";
        let result = validate_generated_code(code);
        assert!(result.sanitized_code.ends_with("export default Header"));

        let repaired = validate_generated_code(&result.sanitized_code);
        let exports = repaired
            .sanitized_code
            .matches("export default")
            .count();
        assert_eq!(exports, 1);
    }

    #[test]
    fn repair_skips_export_when_nothing_is_declared() {
        let code = "'use client'\nreturn <div />";
        let result = validate_generated_code(code);
        assert!(!result.sanitized_code.contains("export default"));
    }

    #[test]
    fn disallowed_import_warns_but_sanitized_code_survives() {
        let code = "import moment from 'moment'\nexport default function Clock() { return <div /> }";
        let result = validate_generated_code(code);
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .iter()
                .any(|e| e.contains("\"moment\" is not in the allowed list"))
        );
        assert!(!result.sanitized_code.is_empty());
    }

    #[test]
    fn relative_and_aliased_imports_are_allowed() {
        let code = "import Button from './button'\nimport { cn } from '@/lib/utils'\nimport Chart from '@acme/charts'\nexport default () => <div />";
        let result = validate_generated_code(code);
        assert!(
            !result
                .errors
                .iter()
                .any(|e| e.contains("not in the allowed list")),
            "errors: {:?}",
            result.errors
        );
    }

    #[test]
    fn non_jsx_text_fails_the_final_heuristic() {
        let result = validate_generated_code("export const answer = 42");
        assert!(
            result
                .errors
                .iter()
                .any(|e| e == "Code does not appear to be valid React/JSX")
        );
    }

    #[test]
    fn quick_gate_requires_jsx_and_export() {
        assert!(!is_valid_react_code(""));
        assert!(!is_valid_react_code("export const x = 1"));
        assert!(!is_valid_react_code("const App = () => <div />"));
        assert!(is_valid_react_code("export default () => <div />"));
    }

    #[test]
    fn warning_summary_formats_single_and_multiple() {
        assert_eq!(warning_summary(&[]), "");
        assert_eq!(
            warning_summary(&["bad import".to_string()]),
            "⚠️ bad import"
        );
        let summary = warning_summary(&["a".to_string(), "b".to_string()]);
        assert!(summary.starts_with("⚠️ Multiple issues found:\n"));
        assert!(summary.contains("• a"));
        assert!(summary.contains("• b"));
    }

    #[test]
    fn first_declared_name_prefers_earliest_declaration() {
        assert_eq!(
            first_declared_name("const Card = () => <div />\nfunction Page() {}"),
            Some("Card")
        );
        assert_eq!(first_declared_name("return <div />"), None);
    }
}
