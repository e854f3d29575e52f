use serde::{Deserialize, Serialize};

use crate::model::{TableId, Token};

/// A row arena for one kind of entity.
///
/// Rows are 1-based and never reused. Removing a row leaves a tombstone, so every
/// [`Token`] handed out by [`Table::insert`] keeps addressing the same slot for the lifetime
/// of the module. Iteration visits live rows in row order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table<T> {
    id: TableId,
    rows: Vec<Option<T>>,
}

impl<T> Table<T> {
    /// Creates an empty table addressed through `id`
    #[must_use]
    pub fn new(id: TableId) -> Self {
        Table {
            id,
            rows: Vec::new(),
        }
    }

    /// The table identifier stored in the high byte of this table's tokens
    #[must_use]
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Appends `value` and returns its token
    pub fn insert(&mut self, value: T) -> Token {
        self.rows.push(Some(value));
        Token::from_parts(self.id, self.rows.len() as u32)
    }

    fn slot(&self, token: Token) -> Option<usize> {
        if !token.is_table(self.id) || token.row() == 0 {
            return None;
        }
        let index = (token.row() - 1) as usize;
        (index < self.rows.len()).then_some(index)
    }

    /// Returns the live entity addressed by `token`
    #[must_use]
    pub fn get(&self, token: Token) -> Option<&T> {
        self.slot(token).and_then(|index| self.rows[index].as_ref())
    }

    /// Returns the live entity addressed by `token` for mutation
    pub fn get_mut(&mut self, token: Token) -> Option<&mut T> {
        self.slot(token).and_then(|index| self.rows[index].as_mut())
    }

    /// Tombstones the row addressed by `token`, returning the removed entity
    pub fn remove(&mut self, token: Token) -> Option<T> {
        self.slot(token).and_then(|index| self.rows[index].take())
    }

    /// Returns true if `token` addresses a live row of this table
    #[must_use]
    pub fn contains(&self, token: Token) -> bool {
        self.get(token).is_some()
    }

    /// Iterates live rows in row order
    pub fn iter(&self) -> impl Iterator<Item = (Token, &T)> {
        let id = self.id;
        self.rows.iter().enumerate().filter_map(move |(index, row)| {
            row.as_ref()
                .map(|value| (Token::from_parts(id, index as u32 + 1), value))
        })
    }

    /// Iterates live rows in row order for mutation
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Token, &mut T)> {
        let id = self.id;
        self.rows
            .iter_mut()
            .enumerate()
            .filter_map(move |(index, row)| {
                row.as_mut()
                    .map(|value| (Token::from_parts(id, index as u32 + 1), value))
            })
    }

    /// Collects the tokens of all live rows
    #[must_use]
    pub fn tokens(&self) -> Vec<Token> {
        self.iter().map(|(token, _)| token).collect()
    }

    /// Number of live rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.iter().filter(|row| row.is_some()).count()
    }

    /// Returns true if the table has no live rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_returns_one_based_rows() {
        let mut table = Table::new(TableId::Field);
        let first = table.insert("a");
        let second = table.insert("b");
        assert_eq!(first, Token(0x04000001));
        assert_eq!(second, Token(0x04000002));
        assert_eq!(table.get(second), Some(&"b"));
    }

    #[test]
    fn remove_leaves_tombstone() {
        let mut table = Table::new(TableId::TypeDef);
        let a = table.insert(1);
        let b = table.insert(2);
        assert_eq!(table.remove(a), Some(1));
        assert_eq!(table.remove(a), None);
        assert!(!table.contains(a));
        assert_eq!(table.len(), 1);
        assert_eq!(table.tokens(), vec![b]);

        let c = table.insert(3);
        assert_eq!(c.row(), 3);
    }

    #[test]
    fn foreign_and_null_tokens_miss() {
        let mut table = Table::new(TableId::MethodDef);
        table.insert(());
        assert!(table.get(Token(0)).is_none());
        assert!(table.get(Token(0x02000001)).is_none());
        assert!(table.get(Token(0x06000002)).is_none());
        assert!(table.get(Token(0x06000001)).is_some());
    }

    #[test]
    fn iter_mut_updates_live_rows() {
        let mut table = Table::new(TableId::Property);
        let a = table.insert(1);
        let b = table.insert(2);
        table.remove(a);
        for (_, value) in table.iter_mut() {
            *value *= 10;
        }
        assert_eq!(table.get(b), Some(&20));
        assert!(!table.is_empty());
    }
}
