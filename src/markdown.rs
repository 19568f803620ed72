//! Placeholder markdown transform.
//!
//! This is literal, ordered string substitution and not a markdown parser:
//! no escaping, no closing tags, no nesting rules. Callers that need real
//! rendering should do it client-side.

/// Substitutions applied in order; later rules see the output of earlier ones
const RULES: &[(&str, &str)] = &[
    ("**", "<strong>"),
    ("*", "<em>"),
    ("# ", "<h1>"),
    ("## ", "<h2>"),
    ("### ", "<h3>"),
    ("\n", "<br>"),
];

/// Render `content` with the minimal substitution rules
pub fn render(content: &str) -> String {
    RULES
        .iter()
        .fold(content.to_string(), |html, (from, to)| html.replace(from, to))
}
