//! Plain-text tables for the dashboard pages.
//!
//! Columns are padded by display width (not byte length) so company names
//! with non-ASCII characters still line up.

use unicode_width::UnicodeWidthStr;

/// Horizontal alignment of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// A titled table with a header row and an optional totals row.
#[derive(Debug, Clone)]
pub struct TextTable {
    title: String,
    headers: Vec<String>,
    aligns: Vec<Align>,
    rows: Vec<Vec<String>>,
    footer: Option<Vec<String>>,
}

impl TextTable {
    /// New table; every column starts left-aligned.
    pub fn new(title: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            title: title.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            aligns: vec![Align::Left; headers.len()],
            rows: Vec::new(),
            footer: None,
        }
    }

    /// Right-align the given columns (numbers).
    pub fn right_align(mut self, columns: &[usize]) -> Self {
        for &c in columns {
            if let Some(a) = self.aligns.get_mut(c) {
                *a = Align::Right;
            }
        }
        self
    }

    /// Append a data row. Short rows are padded, long rows truncated to the
    /// header count.
    pub fn push_row(&mut self, cells: Vec<String>) {
        self.rows.push(self.fit(cells));
    }

    /// Set the totals row rendered under a separator.
    pub fn set_footer(&mut self, cells: Vec<String>) {
        self.footer = Some(self.fit(cells));
    }

    /// Render the table, one line per row, ending with a newline.
    pub fn render(&self) -> String {
        let widths = self.column_widths();
        let separator = widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-");

        let mut out = String::new();
        if !self.title.is_empty() {
            out.push_str(&self.title);
            out.push('\n');
            out.push_str(&"=".repeat(UnicodeWidthStr::width(self.title.as_str())));
            out.push('\n');
        }

        out.push_str(&self.render_line(&self.headers, &widths));
        out.push_str(&separator);
        out.push('\n');
        for row in &self.rows {
            out.push_str(&self.render_line(row, &widths));
        }
        if let Some(footer) = &self.footer {
            out.push_str(&separator);
            out.push('\n');
            out.push_str(&self.render_line(footer, &widths));
        }
        out
    }

    fn fit(&self, mut cells: Vec<String>) -> Vec<String> {
        cells.resize(self.headers.len(), String::new());
        cells
    }

    fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| display_width(h)).collect();
        for row in self.rows.iter().chain(self.footer.iter()) {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(display_width(cell));
            }
        }
        widths
    }

    fn render_line(&self, cells: &[String], widths: &[usize]) -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .zip(&self.aligns)
            .map(|((cell, width), align)| pad(cell, *width, *align))
            .collect();
        let mut line = padded.join(" | ");
        line.truncate(line.trim_end().len());
        line.push('\n');
        line
    }
}

/// Display width of `s` in terminal columns.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Pad `s` to `width` display columns.
pub fn pad(s: &str, width: usize, align: Align) -> String {
    let fill = " ".repeat(width.saturating_sub(display_width(s)));
    match align {
        Align::Left => format!("{s}{fill}"),
        Align::Right => format!("{fill}{s}"),
    }
}

/// Placeholder shown when a page has nothing to list.
pub fn render_no_data(title: &str, hint: &str) -> String {
    format!("{title}\n{}\n\nNo data.\n{hint}\n", "=".repeat(display_width(title)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TextTable {
        let mut table = TextTable::new("Sectors", &["Sector", "Total"]).right_align(&[1]);
        table.push_row(vec!["IT".to_string(), "3".to_string()]);
        table.push_row(vec!["Banking".to_string(), "12".to_string()]);
        table
    }

    #[test]
    fn test_render_aligns_columns() {
        let out = sample().render();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "Sectors");
        assert_eq!(lines[1], "=======");
        assert_eq!(lines[2], "Sector  | Total");
        assert_eq!(lines[3], "--------+------");
        assert_eq!(lines[4], "IT      |     3");
        assert_eq!(lines[5], "Banking |    12");
    }

    #[test]
    fn test_footer_after_separator() {
        let mut table = sample();
        table.set_footer(vec!["TOTAL".to_string(), "15".to_string()]);
        let out = table.render();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[6], "--------+------");
        assert_eq!(lines[7], "TOTAL   |    15");
    }

    #[test]
    fn test_short_rows_are_padded() {
        let mut table = TextTable::new("", &["A", "B", "C"]);
        table.push_row(vec!["x".to_string()]);
        let out = table.render();
        assert_eq!(out.lines().nth(2), Some("x |   |"));
    }

    #[test]
    fn test_wide_characters_measured_by_display_width() {
        assert_eq!(display_width("日本"), 4);
        assert_eq!(pad("日本", 6, Align::Left), "日本  ");
        assert_eq!(pad("ab", 4, Align::Right), "  ab");
    }

    #[test]
    fn test_render_no_data() {
        let out = render_no_data("The Watchlist", "No anomalies detected.");
        assert!(out.starts_with("The Watchlist\n============="));
        assert!(out.contains("No data."));
        assert!(out.contains("No anomalies detected."));
    }
}
