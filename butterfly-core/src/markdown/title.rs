//! Leading title removal. Titles come from front matter, so a body that
//! repeats the title as its opening `# Heading` would show it twice.

/// Remove an opening level-1 ATX heading and trim the rest.
///
/// Blank lines before the heading are skipped. Only `# text` counts:
/// `## text`, `#tag` and a bare `#` are left alone.
pub fn strip_title(body: &str) -> &str {
    let body = body.trim_start();
    let (first, rest) = body.split_once('\n').unwrap_or((body, ""));

    if is_h1(first.trim_end_matches('\r')) {
        rest.trim()
    } else {
        body.trim()
    }
}

fn is_h1(line: &str) -> bool {
    let Some(after) = line.strip_prefix('#') else {
        return false;
    };
    after.starts_with([' ', '\t']) && !after.trim().is_empty()
}
