//! In-memory mirror of a table as the presentation layer shows it.

/// Stable identity of a displayed row. Ids are never reused within a list, so
/// a stale selection cannot silently point at a different row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub id: RowId,
    pub cells: Vec<String>,
}

impl DisplayRow {
    /// The primary-key cell. Every schema keeps the key first.
    pub fn key(&self) -> &str {
        self.cells.first().map(String::as_str).unwrap_or_default()
    }
}

/// Ordered rows keyed by [`RowId`], in table order.
#[derive(Debug, Default, Clone)]
pub struct DisplayList {
    rows: Vec<DisplayRow>,
    next_id: u64,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire content. Used at startup and after import/reset.
    pub fn load<I>(&mut self, rows: I)
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        self.rows.clear();
        for cells in rows {
            self.append(cells);
        }
    }

    pub fn append(&mut self, cells: Vec<String>) -> RowId {
        let id = RowId(self.next_id);
        self.next_id += 1;
        self.rows.push(DisplayRow { id, cells });
        id
    }

    /// Replace the cells of an existing row. Returns `false` if the id is gone.
    pub fn update(&mut self, id: RowId, cells: Vec<String>) -> bool {
        match self.rows.iter_mut().find(|row| row.id == id) {
            Some(row) => {
                row.cells = cells;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: RowId) -> Option<DisplayRow> {
        let idx = self.position(id)?;
        Some(self.rows.remove(idx))
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn get(&self, id: RowId) -> Option<&DisplayRow> {
        self.rows.iter().find(|row| row.id == id)
    }

    pub fn position(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|row| row.id == id)
    }

    /// Row at a visual index; the UI tracks its cursor as an index.
    pub fn nth(&self, idx: usize) -> Option<&DisplayRow> {
        self.rows.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DisplayRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn test_append_update_remove() {
        let mut list = DisplayList::new();
        let first = list.append(cells(&["A", "1"]));
        let second = list.append(cells(&["B", "2"]));

        assert!(list.update(second, cells(&["B", "3"])));
        assert_eq!(list.get(second).unwrap().cells, cells(&["B", "3"]));

        let removed = list.remove(first).unwrap();
        assert_eq!(removed.key(), "A");
        assert_eq!(list.len(), 1);
        assert_eq!(list.nth(0).unwrap().id, second);
    }

    #[test]
    fn test_load_replaces_and_invalidates_old_ids() {
        let mut list = DisplayList::new();
        let stale = list.append(cells(&["Old"]));

        list.load(vec![cells(&["X"]), cells(&["Y"])]);
        assert_eq!(list.len(), 2);
        assert!(list.get(stale).is_none());
        assert!(!list.update(stale, cells(&["Z"])));
        let keys: Vec<_> = list.iter().map(DisplayRow::key).collect();
        assert_eq!(keys, vec!["X", "Y"]);
    }
}
