// src/utils/html.rs

/// Sanitizes author-supplied rich text (module bodies, simulation scenarios).
///
/// Whitelist-based: formatting tags such as `<p>` or `<b>` survive, while
/// `<script>`/`<iframe>` (including their content) and event-handler
/// attributes are removed.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input.trim())
}
