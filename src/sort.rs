// Column sorting: ordinal text compare keyed by column index + direction.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::models::RowSet;

/// Column index + direction. Session-scoped: lives until the display
/// surface is replaced by a different sampler/aggregator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub column_index: usize,
    pub ascending: bool,
}

/// Rows expose their cells as text. Out-of-range columns read as "" so a
/// stray click on a missing column is a stable no-op.
pub trait Columns {
    fn column(&self, index: usize) -> Cow<'_, str>;
}

/// Stable in-place sort by the text of one column. Ordinal compare only —
/// numeric-looking cells sort as text, matching the historical behavior.
pub fn sort_rows<R: Columns>(rows: &mut [R], spec: SortSpec) {
    rows.sort_by(|a, b| {
        let ord = a.column(spec.column_index).cmp(&b.column(spec.column_index));
        if spec.ascending { ord } else { ord.reverse() }
    });
}

/// Column-click state machine: same column flips direction, a new column
/// resets to ascending.
#[derive(Debug, Default)]
pub struct TableSortEngine {
    spec: Option<SortSpec>,
}

impl TableSortEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spec(&self) -> Option<SortSpec> {
        self.spec
    }

    pub fn toggle(&mut self, column_index: usize) -> SortSpec {
        let spec = match self.spec {
            Some(prev) if prev.column_index == column_index => SortSpec {
                column_index,
                ascending: !prev.ascending,
            },
            _ => SortSpec {
                column_index,
                ascending: true,
            },
        };
        self.spec = Some(spec);
        spec
    }

    /// The surface was replaced; the old spec no longer applies to anything.
    pub fn reset(&mut self) {
        self.spec = None;
    }
}

/// The single display surface the shell renders: the most recently published
/// row set plus the sort state attached to it. Exactly one writer at a time
/// (sampler tick or one-shot query) under the stop-before-switch protocol.
#[derive(Debug, Default)]
pub struct DisplayState {
    pub current: Option<RowSet>,
    pub sort: TableSortEngine,
}

impl DisplayState {
    /// New content from a different sampler/aggregator run.
    pub fn replace(&mut self, rows: RowSet) {
        self.current = Some(rows);
        self.sort.reset();
    }

    /// Same-run refresh (a sampler tick): row identity is stable, sort state
    /// is kept for toggling but not re-applied.
    pub fn refresh(&mut self, rows: RowSet) {
        self.current = Some(rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Cell(&'static str, &'static str);

    impl Columns for Cell {
        fn column(&self, index: usize) -> Cow<'_, str> {
            match index {
                0 => Cow::Borrowed(self.0),
                1 => Cow::Borrowed(self.1),
                _ => Cow::Borrowed(""),
            }
        }
    }

    #[test]
    fn toggle_same_column_flips_direction() {
        let mut engine = TableSortEngine::new();
        assert_eq!(
            engine.toggle(1),
            SortSpec {
                column_index: 1,
                ascending: true
            }
        );
        assert_eq!(
            engine.toggle(1),
            SortSpec {
                column_index: 1,
                ascending: false
            }
        );
    }

    #[test]
    fn toggle_new_column_resets_to_ascending() {
        let mut engine = TableSortEngine::new();
        engine.toggle(0);
        engine.toggle(0);
        assert_eq!(
            engine.toggle(2),
            SortSpec {
                column_index: 2,
                ascending: true
            }
        );
    }

    #[test]
    fn sort_is_ordinal_not_numeric() {
        let mut rows = vec![Cell("9", "a"), Cell("10", "b"), Cell("2", "c")];
        sort_rows(
            &mut rows,
            SortSpec {
                column_index: 0,
                ascending: true,
            },
        );
        let order: Vec<&str> = rows.iter().map(|r| r.0).collect();
        assert_eq!(order, vec!["10", "2", "9"]);
    }

    #[test]
    fn equal_keys_keep_relative_order() {
        let mut rows = vec![Cell("x", "first"), Cell("x", "second"), Cell("a", "third")];
        sort_rows(
            &mut rows,
            SortSpec {
                column_index: 0,
                ascending: true,
            },
        );
        let order: Vec<&str> = rows.iter().map(|r| r.1).collect();
        assert_eq!(order, vec!["third", "first", "second"]);
    }

    #[test]
    fn out_of_range_column_is_a_no_op() {
        let mut rows = vec![Cell("b", ""), Cell("a", "")];
        sort_rows(
            &mut rows,
            SortSpec {
                column_index: 7,
                ascending: true,
            },
        );
        assert_eq!(rows[0].0, "b");
        assert_eq!(rows[1].0, "a");
    }
}
