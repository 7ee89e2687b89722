//! Delimiter tracking shared by every language parser.
//!
//! These helpers are deliberately approximate: they understand string
//! literals and line comments well enough to keep brace counting honest on
//! ordinary code, and give up gracefully on anything stranger.

/// A body span located in a file, 1-indexed and inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodySpan {
    pub start_line: usize,
    pub end_line: usize,
    pub text: String,
}

/// Remove string/char literal contents and trailing `//` comments so that
/// delimiter counting does not see braces inside them.
pub fn strip_literals(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    let mut quote: Option<char> = None;
    let mut prev = '\0';

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                if c == '\\' {
                    chars.next();
                } else if c == q {
                    quote = None;
                    out.push(c);
                }
            }
            None => {
                if c == '"' || c == '`' {
                    quote = Some(c);
                    out.push(c);
                } else if c == '\'' {
                    // Rust lifetimes use a lone quote after `&` or `<`.
                    let is_lifetime =
                        (prev == '&' || prev == '<') && !chars.clone().take(3).any(|n| n == '\'');
                    if !is_lifetime && chars.clone().any(|n| n == '\'') {
                        quote = Some(c);
                    }
                    out.push(c);
                } else if c == '/' && chars.peek() == Some(&'/') {
                    break;
                } else {
                    out.push(c);
                }
            }
        }
        prev = c;
    }
    out
}

/// Net `{`/`}` balance of a line, ignoring literals and comments.
pub fn brace_delta(line: &str) -> i32 {
    strip_literals(line).chars().fold(0, |acc, c| match c {
        '{' => acc + 1,
        '}' => acc - 1,
        _ => acc,
    })
}

/// Extract a brace-delimited body starting at `start_idx` (0-indexed).
///
/// The span runs from the declaration line through the line on which the
/// brace count returns to zero. Returns `None` when no `{` opens before a
/// `;` terminates the declaration (abstract, interface or trait methods) or
/// within `lookahead` lines.
pub fn extract_brace_body(lines: &[&str], start_idx: usize, lookahead: usize) -> Option<BodySpan> {
    let mut depth: i32 = 0;
    let mut opened = false;

    for (idx, line) in lines.iter().enumerate().skip(start_idx) {
        let cleaned = strip_literals(line);
        for c in cleaned.chars() {
            match c {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' if opened => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(span(lines, start_idx, idx));
                    }
                }
                ';' if !opened => return None,
                _ => {}
            }
        }
        if !opened && idx >= start_idx + lookahead {
            return None;
        }
    }

    // Unterminated body: keep what we have rather than dropping the item.
    if opened {
        Some(span(lines, start_idx, lines.len().saturating_sub(1)))
    } else {
        None
    }
}

/// Extract an indentation-delimited body (Python).
///
/// The declaration may span several lines; the body starts after the line
/// that ends the signature with `:` and stops before the first non-blank line
/// indented at or below the declaration.
pub fn extract_indent_body(lines: &[&str], start_idx: usize) -> Option<BodySpan> {
    let decl_indent = indent_of(lines.get(start_idx)?);

    let mut header_end = start_idx;
    let mut depth: i32 = 0;
    for (idx, line) in lines.iter().enumerate().skip(start_idx) {
        let cleaned = strip_python_comment(line);
        depth += paren_delta(&cleaned);
        header_end = idx;
        if depth <= 0 && cleaned.trim_end().ends_with(':') {
            break;
        }
        if idx > start_idx + 20 {
            return None;
        }
    }

    let mut end = header_end;
    for (idx, line) in lines.iter().enumerate().skip(header_end + 1) {
        if line.trim().is_empty() {
            continue;
        }
        if indent_of(line) <= decl_indent {
            break;
        }
        end = idx;
    }

    Some(span(lines, start_idx, end))
}

fn span(lines: &[&str], start_idx: usize, end_idx: usize) -> BodySpan {
    BodySpan {
        start_line: start_idx + 1,
        end_line: end_idx + 1,
        text: lines[start_idx..=end_idx].join("\n"),
    }
}

/// Leading whitespace width, tabs counted as four columns.
pub fn indent_of(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

fn strip_python_comment(line: &str) -> String {
    let cleaned = strip_literals(line);
    match cleaned.find('#') {
        Some(pos) => cleaned[..pos].to_string(),
        None => cleaned,
    }
}

fn paren_delta(line: &str) -> i32 {
    line.chars().fold(0, |acc, c| match c {
        '(' | '[' => acc + 1,
        ')' | ']' => acc - 1,
        _ => acc,
    })
}

/// Join a declaration that spans lines until its parameter list closes.
///
/// Returns the joined text and the index of the last line consumed.
pub fn join_signature(lines: &[&str], start_idx: usize, max_lines: usize) -> (String, usize) {
    let mut joined = String::new();
    let mut depth: i32 = 0;
    let mut seen_open = false;
    let mut last = start_idx;

    for (idx, line) in lines.iter().enumerate().skip(start_idx).take(max_lines) {
        let cleaned = strip_literals(line);
        if !joined.is_empty() {
            joined.push(' ');
        }
        joined.push_str(cleaned.trim());
        last = idx;
        for c in cleaned.chars() {
            match c {
                '(' => {
                    depth += 1;
                    seen_open = true;
                }
                ')' => depth -= 1,
                _ => {}
            }
        }
        if !seen_open || depth <= 0 {
            break;
        }
    }
    (joined, last)
}

/// Split a parameter or argument list on top-level commas.
///
/// Commas nested in `()`, `[]`, `{}` or `<>` do not split, so
/// `Map<String, Integer> m, int[] xs` yields two entries. The `>` of `->`
/// and `=>` is not treated as a closing bracket.
pub fn split_top_level(list: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;
    let mut prev = '\0';

    for c in list.chars() {
        if let Some(q) = quote {
            current.push(c);
            if c == q && prev != '\\' {
                quote = None;
            }
            prev = c;
            continue;
        }
        match c {
            '"' | '\'' | '`' => {
                quote = Some(c);
                current.push(c);
            }
            '(' | '[' | '{' | '<' => {
                depth += 1;
                current.push(c);
            }
            '>' if prev == '-' || prev == '=' => current.push(c),
            ')' | ']' | '}' | '>' => {
                depth = (depth - 1).max(0);
                current.push(c);
            }
            ',' if depth == 0 => {
                let part = current.trim();
                if !part.is_empty() {
                    parts.push(part.to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
        prev = c;
    }

    let part = current.trim();
    if !part.is_empty() {
        parts.push(part.to_string());
    }
    parts
}

/// Text between the `(` at byte offset `open` and its matching `)`.
///
/// When the call continues past the end of the line the rest of the line is
/// returned, which is what an assertion spanning several lines needs.
pub fn balanced_args(line: &str, open: usize) -> Option<&str> {
    let bytes = line.as_bytes();
    if bytes.get(open) != Some(&b'(') {
        return None;
    }
    let mut depth = 0i32;
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for (idx, &b) in bytes.iter().enumerate().skip(open) {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' | b'`' => quote = Some(b),
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&line[open + 1..idx]);
                }
            }
            _ => {}
        }
    }
    Some(line[open + 1..].trim_end_matches([';', '{', ' ']))
}

/// Whether a trimmed line is only a comment.
pub fn is_comment_line(trimmed: &str) -> bool {
    trimmed.starts_with("//")
        || trimmed.starts_with("/*")
        || trimmed.starts_with('*')
        || trimmed.starts_with('#') && !trimmed.starts_with("#[")
}

/// Keywords that look like calls in C-family languages.
pub const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "new", "else", "do", "try", "throw",
    "synchronized", "using", "foreach", "lock", "match", "loop", "function", "typeof", "sizeof",
    "await", "yield", "case", "delete",
];

pub fn is_control_keyword(word: &str) -> bool {
    CONTROL_KEYWORDS.contains(&word)
}
