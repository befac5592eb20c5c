// src/core/csv.rs
//
// Delimited table output for the CLI's stdout. Display only; spreadsheet
// exports go through export.rs.

use std::borrow::Cow;

fn escape(cell: &str, sep: char) -> Cow<'_, str> {
    let must_quote = cell
        .chars()
        .any(|c| c == sep || c == '"' || c == '\n' || c == '\r');
    if must_quote {
        Cow::Owned(format!("\"{}\"", cell.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(cell)
    }
}

fn push_row(out: &mut String, row: &[String], sep: char) {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            out.push(sep);
        }
        out.push_str(&escape(cell, sep));
    }
    out.push('\n');
}

pub fn rows_to_string(headers: Option<&[String]>, rows: &[Vec<String>], sep: char) -> String {
    let mut out = String::new();
    if let Some(h) = headers {
        push_row(&mut out, h, sep);
    }
    for r in rows {
        push_row(&mut out, r, sep);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_fields_containing_separator_or_quotes() {
        let rows = vec![vec!["a,b".to_string(), "say \"hi\"".to_string()]];
        assert_eq!(
            rows_to_string(None, &rows, ','),
            "\"a,b\",\"say \"\"hi\"\"\"\n"
        );
    }

    #[test]
    fn tsv_leaves_commas_alone() {
        let headers = vec!["uid".to_string(), "name".to_string()];
        let rows = vec![vec!["a1".to_string(), "Water, WASH".to_string()]];
        assert_eq!(
            rows_to_string(Some(&headers), &rows, '\t'),
            "uid\tname\na1\tWater, WASH\n"
        );
    }
}
