//! Human-readable warnings and errors for the CLI.

use colored::Colorize;
use std::fmt;

/// An inclusive range used for tracking positions in source code.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct Position {
    pub start: usize,
    pub end: usize,
}

impl Position {
    pub fn at(index: usize) -> Self {
        Position {
            start: index,
            end: index,
        }
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

pub trait Combine<T> {
    fn combine(&self, _: T) -> T;
}

impl Combine<Position> for Position {
    fn combine(&self, other: Self) -> Self {
        let (first_pos, second_pos) = if self.start <= other.start {
            (*self, other)
        } else {
            (other, *self)
        };

        // If they're adjacent positions, we can merge them.
        if first_pos.end + 1 >= second_pos.start {
            Position {
                start: first_pos.start,
                end: second_pos.end.max(first_pos.end),
            }
        } else {
            // Otherwise, just use the second position.
            other
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Level {
    Warning,
    Error,
}

/// A message about a program, optionally pointing into its source.
#[derive(Debug)]
pub struct Diagnostic {
    pub level: Level,
    pub filename: String,
    pub message: String,
    /// Byte offsets into `source`.
    pub position: Option<Position>,
    pub source: Option<String>,
}

/// Convert a byte offset into a zero-indexed (line, column) pair.
fn line_and_column(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 0;
    let mut column = 0;
    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }
    }
    (line, column)
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let level = match self.level {
            Level::Warning => "warning:".bold().yellow(),
            Level::Error => "error:".bold().red(),
        };

        let (source, position) = match (&self.source, self.position) {
            (Some(source), Some(position)) => (source, position),
            _ => {
                return write!(
                    f,
                    "{} {} {}",
                    format!("{}:", self.filename).bold(),
                    level,
                    self.message.bold()
                );
            }
        };

        let (line, column) = line_and_column(source, position.start);
        let (end_line, end_column) = line_and_column(source, position.end);
        writeln!(
            f,
            "{} {} {}",
            format!("{}:{}:{}:", self.filename, line + 1, column + 1).bold(),
            level,
            self.message.bold()
        )?;

        let text = source.lines().nth(line).unwrap_or("");
        writeln!(f, "{}", text)?;

        // Only underline up to the end of the first line.
        let width = if end_line == line {
            end_column - column + 1
        } else {
            text.chars().count().saturating_sub(column).max(1)
        };
        write!(
            f,
            "{}{}",
            " ".repeat(column),
            "^".repeat(width).bold().green()
        )
    }
}

#[test]
fn test_combine_pos() {
    let pos1 = Position { start: 1, end: 2 };
    let pos2 = Position { start: 3, end: 4 };

    assert_eq!(pos1.combine(pos2), Position { start: 1, end: 4 });
}

#[test]
fn test_combine_order() {
    let pos1 = Position { start: 3, end: 4 };
    let pos2 = Position { start: 1, end: 2 };

    assert_eq!(pos1.combine(pos2), Position { start: 1, end: 4 });
}

#[test]
fn test_combine_pos_not_consecutive() {
    let pos1 = Position { start: 1, end: 2 };
    let pos2 = Position { start: 4, end: 5 };

    assert_eq!(pos1.combine(pos2), Position { start: 4, end: 5 });
}

#[test]
fn test_combine_pos_overlap() {
    let pos1 = Position { start: 1, end: 1 };
    let pos2 = Position { start: 1, end: 3 };

    assert_eq!(pos1.combine(pos2), Position { start: 1, end: 3 });
}

#[test]
fn line_and_column_counts_newlines() {
    assert_eq!(line_and_column("+-\n+[", 0), (0, 0));
    assert_eq!(line_and_column("+-\n+[", 4), (1, 1));
}

#[test]
fn diagnostic_points_at_source() {
    colored::control::set_override(false);
    let diagnostic = Diagnostic {
        level: Level::Error,
        filename: "loop.bf".to_owned(),
        message: "unmatched '[' at pc=3".to_owned(),
        position: Some(Position::at(4)),
        source: Some("+\n++[-".to_owned()),
    };
    assert_eq!(
        diagnostic.to_string(),
        "loop.bf:2:3: error: unmatched '[' at pc=3\n++[-\n  ^"
    );
}
