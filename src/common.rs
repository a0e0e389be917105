use std::{fmt, ops::Range};

/// Char offsets into the source a token or diagnostic covers.
pub type Span = Range<usize>;

/// One-based line and column of a char offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn of(source: &str, offset: usize) -> Self {
        let mut line = 1;
        let mut column = 1;

        for c in source.chars().take(offset) {
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }

        Location { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Free stack that must remain before recursing further.
const RED_ZONE: usize = 100 * 1024;

/// Stack allocated whenever the red zone is reached.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Runs `f`, first moving to a freshly allocated stack segment if the
/// current one is nearly exhausted. Wraps the recursive entry points of the
/// parser and the evaluator.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// Returns the text of a one-based line, without its terminator.
pub fn line_text(source: &str, line: usize) -> Option<&str> {
    source.lines().nth(line.checked_sub(1)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_counts_lines_and_columns() {
        let source = "mut x = 1;\nx = @;";
        assert_eq!(Location::of(source, 0), Location { line: 1, column: 1 });
        assert_eq!(Location::of(source, 15), Location { line: 2, column: 5 });
        assert_eq!(line_text(source, 2), Some("x = @;"));
        assert_eq!(line_text(source, 0), None);
    }

    #[test]
    fn deep_recursion_grows_the_stack() {
        fn count_down(n: u64) -> u64 {
            ensure_sufficient_stack(|| if n == 0 { 0 } else { count_down(n - 1) + 1 })
        }

        assert_eq!(count_down(100_000), 100_000);
    }
}
