//! In-memory tabular data read from a data file

use std::collections::HashSet;

/// Rows of optional text cells under a header
///
/// Every row has exactly as many cells as there are columns; `None` marks a
/// missing or empty cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Dataset {
    /// Build a dataset from raw header names and rows
    ///
    /// Header names are cleaned up (see [`normalize_headers`]) and rows are
    /// padded or truncated to the header width. Empty cells become `None`.
    pub fn new(raw_columns: Vec<String>, raw_rows: Vec<Vec<Option<String>>>) -> Self {
        let columns = normalize_headers(raw_columns);
        let width = columns.len();
        let rows = raw_rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row.into_iter()
                    .map(|cell| cell.filter(|v| !v.is_empty()))
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    /// Column names in file order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows
    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Whether there are no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column
    pub fn column_values(&self, index: usize) -> Vec<Option<&str>> {
        self.rows
            .iter()
            .map(|row| row.get(index).and_then(|cell| cell.as_deref()))
            .collect()
    }

    /// True when every row holds a distinct non-null value in the column
    pub fn is_column_unique(&self, index: usize) -> bool {
        let mut seen = HashSet::with_capacity(self.rows.len());
        for row in &self.rows {
            match row.get(index).and_then(|cell| cell.as_deref()) {
                Some(value) => {
                    if !seen.insert(value) {
                        return false;
                    }
                }
                None => return false,
            }
        }
        true
    }
}

/// Clean up header names
///
/// Blank names become `column_<n>` (1-based position). Names that collide
/// case-insensitively with an earlier one get a `.1`, `.2`, ... suffix, since
/// the warehouse treats identifiers case-insensitively.
pub fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut columns = Vec::with_capacity(raw.len());

    for (idx, name) in raw.into_iter().enumerate() {
        let trimmed = name.trim();
        let base = if trimmed.is_empty() {
            format!("column_{}", idx + 1)
        } else {
            trimmed.to_string()
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate.to_lowercase()) {
            candidate = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        seen.insert(candidate.to_lowercase());
        columns.push(candidate);
    }

    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn test_rows_padded_and_truncated() {
        let dataset = Dataset::new(
            vec!["a".into(), "b".into()],
            vec![cells(&["1"]), cells(&["1", "2", "3"])],
        );
        assert_eq!(dataset.rows()[0], vec![Some("1".to_string()), None]);
        assert_eq!(dataset.rows()[1].len(), 2);
    }

    #[test]
    fn test_empty_cells_become_none() {
        let dataset = Dataset::new(vec!["a".into()], vec![cells(&[""])]);
        assert_eq!(dataset.column_values(0), vec![None]);
    }

    #[test]
    fn test_header_normalization() {
        let headers = normalize_headers(vec![
            "id".into(),
            "".into(),
            "Name".into(),
            "name".into(),
            "name".into(),
        ]);
        assert_eq!(headers, vec!["id", "column_2", "Name", "name.1", "name.2"]);
    }

    #[test]
    fn test_uniqueness() {
        let dataset = Dataset::new(
            vec!["id".into(), "tag".into()],
            vec![cells(&["1", "x"]), cells(&["2", "x"]), cells(&["3", ""])],
        );
        assert!(dataset.is_column_unique(0));
        assert!(!dataset.is_column_unique(1));
    }

    #[test]
    fn test_null_breaks_uniqueness() {
        let dataset = Dataset::new(vec!["id".into()], vec![cells(&["1"]), cells(&[""])]);
        assert!(!dataset.is_column_unique(0));
    }
}
