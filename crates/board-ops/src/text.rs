//! Line-oriented edits on text node bodies.
//!
//! Lines are split on `'\n'` only, so an empty body is one empty line and a
//! trailing newline yields a trailing empty line. Line numbers are 1-based.

use regex::{NoExpand, Regex, RegexBuilder};

use crate::error::OpsError;

/// Inserts `content` as a whole line so that it becomes line `line`.
///
/// Valid lines are `1..=count + 1`; `count + 1` appends after the last line.
pub fn insert_line(text: &str, line: usize, content: &str) -> Result<String, OpsError> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    let max = lines.len() + 1;
    if line < 1 || line > max {
        return Err(OpsError::LineOutOfRange { line, min: 1, max });
    }
    lines.insert(line - 1, content);
    Ok(lines.join("\n"))
}

/// Compiles the search pattern. Literal searches are escaped; case
/// sensitivity applies to both.
pub fn compile_pattern(search: &str, is_regex: bool, case_sensitive: bool) -> Result<Regex, OpsError> {
    if search.is_empty() {
        return Err(OpsError::validation("search", "must not be empty"));
    }
    let source = if is_regex {
        search.to_string()
    } else {
        regex::escape(search)
    };
    RegexBuilder::new(&source)
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|e| OpsError::InvalidPattern {
            reason: e.to_string(),
        })
}

/// Replaces every match of `pattern`.
///
/// With `expand`, `$1`/`${name}` in `replacement` refer to capture groups;
/// otherwise the replacement is inserted verbatim.
pub fn replace_all(text: &str, pattern: &Regex, replacement: &str, expand: bool) -> String {
    if expand {
        pattern.replace_all(text, replacement).into_owned()
    } else {
        pattern.replace_all(text, NoExpand(replacement)).into_owned()
    }
}

/// Rewrites only lines `start..=end` (1-based, inclusive) with `rewrite` and
/// splices the result back between the untouched lines.
///
/// `start` defaults to the first line and `end` to the last.
pub fn rewrite_lines(
    text: &str,
    start: Option<usize>,
    end: Option<usize>,
    rewrite: impl FnOnce(&str) -> String,
) -> Result<String, OpsError> {
    if start.is_none() && end.is_none() {
        return Ok(rewrite(text));
    }
    let lines: Vec<&str> = text.split('\n').collect();
    let count = lines.len();
    let start = start.unwrap_or(1);
    let end = end.unwrap_or(count);
    if start < 1 || start > count {
        return Err(OpsError::LineOutOfRange {
            line: start,
            min: 1,
            max: count,
        });
    }
    if end < start || end > count {
        return Err(OpsError::LineOutOfRange {
            line: end,
            min: start,
            max: count,
        });
    }

    let rewritten = rewrite(&lines[start - 1..end].join("\n"));
    let mut out: Vec<&str> = Vec::with_capacity(count);
    out.extend_from_slice(&lines[..start - 1]);
    out.push(&rewritten);
    out.extend_from_slice(&lines[end..]);
    Ok(out.join("\n"))
}
