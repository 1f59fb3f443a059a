//! Statement reader.
//!
//! A script is a sequence of command invocations `name(arg arg ...)`
//! separated by arbitrary whitespace and comments.  The reader yields one
//! [`Statement`] per invocation; arguments stay raw (quotes included) until
//! the dispatcher substitutes them.
//!
//! Reading never fails: a name with no `(` or an unbalanced `(` simply ends
//! the input.

use std::sync::OnceLock;

use regex::Regex;

/// One parsed command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Command name as written (dispatch lowercases it).
    pub name: String,
    /// Raw arguments; quoted arguments keep their quotes.
    pub arguments: Vec<String>,
    /// 1-based line of the command name.
    pub line: usize,
}

impl Statement {
    pub fn new(name: impl Into<String>, arguments: Vec<String>, line: usize) -> Self {
        Statement { name: name.into(), arguments, line }
    }
}

/// Read every statement in `src`.
pub fn parse_script(src: &str) -> Vec<Statement> {
    Reader::new(src).collect()
}

// ── Reader ────────────────────────────────────────────────────────────────────

/// Iterator over the statements of a source string.
pub struct Reader<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    line_pos: usize,
}

fn bracket_open() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#\[(=*)\[").expect("valid bracket comment regex"))
}

impl<'a> Reader<'a> {
    pub fn new(src: &'a str) -> Self {
        Reader { src, pos: 0, line: 1, line_pos: 0 }
    }

    /// Line number of byte offset `at`; offsets must be non-decreasing.
    fn line_of(&mut self, at: usize) -> usize {
        if at > self.line_pos {
            self.line += self.src[self.line_pos..at].bytes().filter(|&b| b == b'\n').count();
            self.line_pos = at;
        }
        self.line
    }

    /// Skip whitespace and comments.  Returns `false` at end of input.
    fn skip_trivia(&mut self) -> bool {
        let bytes = self.src.as_bytes();
        loop {
            while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            if self.pos >= bytes.len() {
                return false;
            }
            if bytes[self.pos] != b'#' {
                return true;
            }
            self.pos = skip_comment(self.src, self.pos);
        }
    }
}

impl Iterator for Reader<'_> {
    type Item = Statement;

    fn next(&mut self) -> Option<Statement> {
        if !self.skip_trivia() {
            return None;
        }
        let start = self.pos;
        let Some(rel) = self.src[start..].find('(') else {
            self.pos = self.src.len();
            return None;
        };
        let open = start + rel;
        let Some(close) = matching_paren(self.src, open) else {
            self.pos = self.src.len();
            return None;
        };

        let name = self.src[start..open].trim().to_owned();
        let arguments = tokenize_arguments(&self.src[open + 1..close]);
        let line = self.line_of(start);
        self.pos = close + 1;
        Some(Statement { name, arguments, line })
    }
}

/// Skip the comment starting at `at` (which must point at `#`); returns the
/// offset just past it.  Bracket comments without a closer run to the end.
fn skip_comment(src: &str, at: usize) -> usize {
    if let Some(caps) = bracket_open().captures(&src[at..]) {
        let eq = caps.get(1).map_or(0, |m| m.as_str().len());
        let opener_len = caps.get(0).map_or(0, |m| m.as_str().len());
        let closer = format!("]{}]", "=".repeat(eq));
        let body = at + opener_len;
        return match src[body..].find(&closer) {
            Some(rel) => body + rel + closer.len(),
            None => src.len(),
        };
    }
    match src[at..].find('\n') {
        Some(rel) => at + rel + 1,
        None => src.len(),
    }
}

/// Find the `)` matching the `(` at `open`, ignoring parens inside quoted
/// strings and line comments.
fn matching_paren(src: &str, open: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut i = open;
    while i < bytes.len() {
        let b = bytes[i];
        if in_quote {
            match b {
                b'\\' => i += 1,
                b'"' => in_quote = false,
                _ => {}
            }
        } else {
            match b {
                b'"' => in_quote = true,
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                b'#' if starts_comment(bytes, i) => {
                    i = skip_comment(src, i);
                    continue;
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

/// A `#` opens a comment inside an argument list only at a token boundary.
fn starts_comment(bytes: &[u8], i: usize) -> bool {
    i == 0 || matches!(bytes[i - 1], b' ' | b'\t' | b'\n' | b'\r' | b'(')
}

// ── Argument tokenizer ────────────────────────────────────────────────────────

/// Split the interior of an argument list into raw arguments.
///
/// Whitespace outside quotes and nested parens separates arguments; a
/// `"`-delimited run (with `\` escapes) is one argument including its
/// quotes; parenthesized sub-runs stay part of the current argument.
pub fn tokenize_arguments(s: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut cur = String::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quote {
            cur.push(ch);
            match ch {
                '\\' => {
                    if let Some(next) = chars.next() {
                        cur.push(next);
                    }
                }
                '"' => {
                    in_quote = false;
                    if depth == 0 {
                        args.push(std::mem::take(&mut cur));
                    }
                }
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => {
                if depth == 0 && !cur.is_empty() {
                    args.push(std::mem::take(&mut cur));
                }
                in_quote = true;
                cur.push(ch);
            }
            '(' => {
                depth += 1;
                cur.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                cur.push(ch);
            }
            '#' if depth == 0 && cur.is_empty() => {
                // Line comment between arguments.
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            c if c.is_whitespace() && depth == 0 => {
                if !cur.is_empty() {
                    args.push(std::mem::take(&mut cur));
                }
            }
            c => cur.push(c),
        }
    }
    if !cur.is_empty() {
        args.push(cur);
    }
    args
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn simple_statement() {
        let stmts = parse_script(r#"set(X "a b" c)"#);
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].name, "set");
        assert_eq!(stmts[0].arguments, args(&["X", "\"a b\"", "c"]));
        assert_eq!(stmts[0].line, 1);
    }

    #[test]
    fn line_numbers_and_comments() {
        let src = "# leading comment\n\nproject(Foo)\n  message(STATUS hi) # trailing\nset(A 1)\n";
        let stmts = parse_script(src);
        let lines: Vec<_> = stmts.iter().map(|s| (s.name.as_str(), s.line)).collect();
        assert_eq!(lines, vec![("project", 3), ("message", 4), ("set", 5)]);
    }

    #[test]
    fn bracket_comment_with_matching_equals() {
        let src = "#[===[ set(HIDDEN 1) ]==] still hidden ]===]\nset(SHOWN 1)";
        let stmts = parse_script(src);
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].arguments, args(&["SHOWN", "1"]));
        assert_eq!(stmts[0].line, 2);
    }

    #[test]
    fn unterminated_bracket_comment_runs_to_end() {
        assert!(parse_script("#[[ set(X 1)").is_empty());
    }

    #[test]
    fn nested_parens_stay_in_argument() {
        let stmts = parse_script("if((A AND B) OR C)");
        assert_eq!(stmts[0].arguments, args(&["(A AND B)", "OR", "C"]));
    }

    #[test]
    fn paren_inside_quotes_ignored() {
        let stmts = parse_script(r#"message(STATUS "a ) b \" ) c")"#);
        assert_eq!(stmts[0].arguments, args(&["STATUS", r#""a ) b \" ) c""#]));
    }

    #[test]
    fn quote_adjacent_to_text_splits() {
        assert_eq!(tokenize_arguments(r#"a"b c"d"#), args(&["a", "\"b c\"", "d"]));
    }

    #[test]
    fn comments_inside_argument_list() {
        let stmts = parse_script("set(L\n  a # first (unbalanced\n  b)\n");
        assert_eq!(stmts[0].arguments, args(&["L", "a", "b"]));
    }

    #[test]
    fn missing_paren_stops_reading() {
        assert_eq!(parse_script("set(A 1)\nbogus").len(), 1);
        assert_eq!(parse_script("set(A 1)\nset(B 2").len(), 1);
    }

    #[test]
    fn multiline_arguments() {
        let stmts = parse_script("list(APPEND L\n  one\n  two)\nset(X y)");
        assert_eq!(stmts[0].arguments, args(&["APPEND", "L", "one", "two"]));
        assert_eq!(stmts[1].line, 4);
    }
}
