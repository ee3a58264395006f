use crate::error::{Result, SocktabError};

/// An owned, point-in-time snapshot of a socket table.
///
/// Records keep the order in which they appeared in the underlying OS
/// table. That order carries no meaning and can differ between fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTable<R> {
    records: Vec<R>,
}

impl<R> ConnectionTable<R> {
    pub fn new() -> Self {
        ConnectionTable { records: Vec::new() }
    }

    /// Append a record, reporting allocation failure instead of aborting.
    pub(crate) fn push(&mut self, record: R) -> Result<()> {
        self.records
            .try_reserve(1)
            .map_err(|_| SocktabError::AllocationFailure(self.records.len() + 1))?;
        self.records.push(record);
        Ok(())
    }

    /// Reserve room for `additional` records up front when the source
    /// knows its size.
    #[cfg_attr(not(target_os = "windows"), allow(dead_code))]
    pub(crate) fn reserve_exact(&mut self, additional: usize) -> Result<()> {
        self.records
            .try_reserve_exact(additional)
            .map_err(|_| SocktabError::AllocationFailure(self.records.len() + additional))
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<R> {
        self.records
    }

    /// Give the table back. Its records are freed here; dropping the table
    /// has the same effect.
    pub fn release(self) {}
}

impl<R> Default for ConnectionTable<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> FromIterator<R> for ConnectionTable<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        ConnectionTable {
            records: iter.into_iter().collect(),
        }
    }
}

impl<R> IntoIterator for ConnectionTable<R> {
    type Item = R;
    type IntoIter = std::vec::IntoIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a, R> IntoIterator for &'a ConnectionTable<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_table() {
        let table: ConnectionTable<u32> = ConnectionTable::new();
        assert_eq!(table.count(), 0);
        assert!(table.is_empty());
    }

    #[test]
    fn test_count_tracks_pushes() {
        let mut table = ConnectionTable::new();
        for n in 0..5u32 {
            table.push(n).unwrap();
        }
        assert_eq!(table.count(), 5);
        assert_eq!(table.records(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_reserve_then_push() {
        let mut table = ConnectionTable::new();
        table.reserve_exact(3).unwrap();
        table.push("a").unwrap();
        assert_eq!(table.count(), 1);
        assert_eq!(table.into_records(), vec!["a"]);
    }
}
