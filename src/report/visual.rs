mod pointer;

pub use pointer::Pointer;

use std::fmt::{Debug, Formatter, Result};

const BLANK: &str = "";
const PIPE: &str = "|";
const EQUAL: &str = "=";
const HIGHLIGHT: &str = "^";

/// Describes a type that can be associated with an Error and used
/// to print a visualization.
pub trait Visual: Debug + Send + Sync {
    /// Display the visualization by writing to the given Formatter.
    fn display(
        &self,
        formatter: &mut Formatter<'_>,
        template: Option<&str>,
        help: Option<&str>,
    ) -> Result;
}

/// Return the zero indexed line and column for a byte offset within the
/// given lines.
///
/// Columns are measured in display width, so wide characters count double.
fn get_line_and_column(lines: &[&str], offset: usize) -> (usize, usize) {
    let mut consumed = 0;

    for (i, line) in lines.iter().enumerate() {
        let len = line.len() + 1;
        if consumed + len > offset {
            let within = (offset - consumed).min(line.len());
            let column = line
                .get(..within)
                .map(get_width)
                .unwrap_or(within);
            return (i, column);
        }
        consumed += len;
    }

    let last = lines.last().map(|line| get_width(line)).unwrap_or(0);

    (lines.len().saturating_sub(1), last)
}

/// Wrapper for UnicodeWidthStr::width.
fn get_width(s: &str) -> usize {
    unicode_width::UnicodeWidthStr::width(s)
}

#[cfg(test)]
mod tests {
    use super::get_line_and_column;

    #[test]
    fn test_line_and_column() {
        let lines = vec!["<p>", "  {{ name }}", "</p>"];

        assert_eq!(get_line_and_column(&lines, 0), (0, 0));
        assert_eq!(get_line_and_column(&lines, 7), (1, 3));
        assert_eq!(get_line_and_column(&lines, 18), (2, 1));
    }

    #[test]
    fn test_offset_past_end() {
        let lines = vec!["{{ a"];

        assert_eq!(get_line_and_column(&lines, 4), (0, 4));
        assert_eq!(get_line_and_column(&[], 0), (0, 0));
    }
}
