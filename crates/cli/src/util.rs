use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Cells wider than this are clipped in human-readable tables.
pub(crate) const MAX_CELL_WIDTH: usize = 40;

/// Clip a string to `width` display columns, marking the cut with "..".
/// Hebrew and CJK text is measured by display width, not bytes.
pub(crate) fn clip(s: &str, width: usize) -> String {
    if UnicodeWidthStr::width(s) <= width {
        return s.to_string();
    }
    let budget = width.saturating_sub(2);
    let mut used = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let cw = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            break;
        }
        used += cw;
        out.push(ch);
    }
    if width >= 2 {
        out.push_str("..");
    }
    out
}

/// Left-align `s` in a column of `width` display columns.
pub(crate) fn pad(s: &str, width: usize) -> String {
    let clipped = clip(s, width);
    let w = UnicodeWidthStr::width(clipped.as_str());
    format!("{}{}", clipped, " ".repeat(width.saturating_sub(w)))
}

/// Plain-text table: header row, dashed rule, one line per row. Column widths
/// fit the widest cell up to [`MAX_CELL_WIDTH`].
pub(crate) fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(col, h)| {
            rows.iter()
                .filter_map(|r| r.get(col))
                .map(|c| UnicodeWidthStr::width(c.as_str()))
                .chain(std::iter::once(UnicodeWidthStr::width(*h)))
                .max()
                .unwrap_or(0)
                .min(MAX_CELL_WIDTH)
        })
        .collect();

    let line = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| pad(c, *w))
            .collect();
        format!("  {}", padded.join("  ").trim_end())
    };

    let mut out = String::new();
    out.push_str(&line(headers.to_vec()));
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("  {}\n", rule.join("  ")));
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}
