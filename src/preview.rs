//! Sandboxed preview document assembly.
//!
//! Takes validated component source and emits a fully self-contained HTML
//! document: runtime libraries from fixed CDN URLs, the component inlined in
//! an in-browser transform script block, and a mount call guarded so render
//! failures paint an error panel instead of a blank page. The document is
//! only ever executed inside a sandboxed frame; that isolation boundary is
//! the safety mechanism, not escaping.

use crate::sanitizer::is_valid_react_code;
use once_cell::sync::Lazy;
use regex::Regex;
use tera::{Context, Tera};
use thiserror::Error;

/// Entry symbol used when no declaration can be found in the code.
pub const FALLBACK_COMPONENT: &str = "App";

const TEMPLATE_NAME: &str = "preview";

static IMPORT_STATEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"import\s+[^\n]*?from\s+['"][^'"]*['"];?"#).unwrap());
static LEADING_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)^['"]use client['"];?\n*"#).unwrap());
static EXPORT_DEFAULT: Lazy<Regex> = Lazy::new(|| Regex::new(r"export\s+default\s+").unwrap());
static DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:function|const)\s+(\w+)\s*[(=]").unwrap());

static PREVIEW_TERA: Lazy<Tera> = Lazy::new(|| {
    let mut tera = Tera::default();
    // The component source must land in the script block verbatim.
    tera.autoescape_on(vec![]);
    tera.add_raw_template(TEMPLATE_NAME, PREVIEW_TEMPLATE)
        .expect("preview template parses");
    tera
});

#[derive(Debug, Error)]
pub enum PreviewError {
    /// The safety gate rejected the code; no document is built.
    #[error("Generated code appears to be invalid or unsafe")]
    UnsafeCode,
    #[error("Failed to generate preview: {0}")]
    Render(#[from] tera::Error),
}

/// Build the self-contained preview document for the given component source.
pub fn build_preview(code: &str) -> Result<String, PreviewError> {
    if !is_valid_react_code(code) {
        return Err(PreviewError::UnsafeCode);
    }

    // Imports cannot resolve inside the sandbox and the mount call uses the
    // symbol directly, so imports, the directive, and `export default` all go.
    let without_imports = IMPORT_STATEMENT.replace_all(code, "");
    let without_directive = LEADING_DIRECTIVE.replace(without_imports.trim(), "");
    let cleaned = without_directive.trim();

    let entry_symbol = component_name(cleaned);
    let component_code = EXPORT_DEFAULT.replace_all(cleaned, "");

    render_document(&component_code, entry_symbol)
}

/// Extract the mount symbol: first declared function or constant name,
/// falling back to `App`.
pub fn component_name(code: &str) -> &str {
    DECLARATION
        .captures(code)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(FALLBACK_COMPONENT)
}

fn render_document(component_code: &str, component_name: &str) -> Result<String, PreviewError> {
    let mut context = Context::new();
    context.insert("component_code", component_code);
    context.insert("component_name", component_name);
    Ok(PREVIEW_TERA.render(TEMPLATE_NAME, &context)?)
}

/// Readiness probe: render the harness with a stub component.
pub fn template_health_check() -> Result<(), String> {
    render_document("function App() { return null; }", FALLBACK_COMPONENT)
        .map(|_| ())
        .map_err(|err| err.to_string())
}

const PREVIEW_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Preview</title>
  <script crossorigin src="https://unpkg.com/react@18/umd/react.production.min.js"></script>
  <script crossorigin src="https://unpkg.com/react-dom@18/umd/react-dom.production.min.js"></script>
  <script src="https://unpkg.com/@babel/standalone@7/babel.min.js"></script>
  <script src="https://cdn.tailwindcss.com"></script>
  <style>
    * { margin: 0; padding: 0; box-sizing: border-box; }
    body { font-family: system-ui, -apple-system, sans-serif; background: white; }
    #root { width: 100%; min-height: 100vh; }
  </style>
</head>
<body>
  <div id="root"></div>
  <script type="text/babel">
    (function() {
      try {
        const { useState, useEffect, Fragment } = React;

        {{ component_code }}

        const root = ReactDOM.createRoot(document.getElementById('root'));
        root.render(<{{ component_name }} />);
      } catch (error) {
        console.error('Render error:', error);
        const root = document.getElementById('root');
        root.innerHTML = '<div style="padding: 20px; color: red; font-family: monospace;"><h2>Preview Error:</h2><pre>' + (error.stack || error.message) + '</pre></div>';
      }
    })();
  </script>
</body>
</html>
"#;
