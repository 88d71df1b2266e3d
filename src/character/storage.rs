use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sled::IVec;

use super::errors::CharacterError;

const TREE_CHARACTERS: &str = "characters";
const ROW_PREFIX: &str = "character:";

/// A single typed scalar column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Column {
    Int(i64),
    Text(String),
}

impl From<i64> for Column {
    fn from(value: i64) -> Self {
        Column::Int(value)
    }
}

impl From<i32> for Column {
    fn from(value: i32) -> Self {
        Column::Int(i64::from(value))
    }
}

impl From<String> for Column {
    fn from(value: String) -> Self {
        Column::Text(value)
    }
}

impl From<&str> for Column {
    fn from(value: &str) -> Self {
        Column::Text(value.to_string())
    }
}

/// One character row keyed by column name.
pub type Row = BTreeMap<String, Column>;

/// Typed access to row columns with precise errors.
pub struct RowReader<'a> {
    name: &'a str,
    row: &'a Row,
}

impl<'a> RowReader<'a> {
    pub fn new(name: &'a str, row: &'a Row) -> Self {
        Self { name, row }
    }

    fn column(&self, column: &'static str) -> Result<&'a Column, CharacterError> {
        self.row.get(column).ok_or_else(|| CharacterError::Column {
            name: self.name.to_string(),
            column,
            reason: "missing".into(),
        })
    }

    pub fn int(&self, column: &'static str) -> Result<i64, CharacterError> {
        match self.column(column)? {
            Column::Int(value) => Ok(*value),
            Column::Text(_) => Err(CharacterError::Column {
                name: self.name.to_string(),
                column,
                reason: "expected integer".into(),
            }),
        }
    }

    /// Integer column narrowed to `T`; out-of-range values are an error.
    pub fn int_as<T: TryFrom<i64>>(&self, column: &'static str) -> Result<T, CharacterError> {
        let value = self.int(column)?;
        T::try_from(value).map_err(|_| CharacterError::Column {
            name: self.name.to_string(),
            column,
            reason: format!("value {} out of range", value),
        })
    }

    pub fn text(&self, column: &'static str) -> Result<&'a str, CharacterError> {
        match self.column(column)? {
            Column::Text(value) => Ok(value),
            Column::Int(_) => Err(CharacterError::Column {
                name: self.name.to_string(),
                column,
                reason: "expected text".into(),
            }),
        }
    }

    /// Text column that may be absent in older rows.
    pub fn text_or_empty(&self, column: &'static str) -> Result<&'a str, CharacterError> {
        if self.row.contains_key(column) {
            self.text(column)
        } else {
            Ok("")
        }
    }
}

/// Row-keyed query/update interface to the persistence engine. Calls block.
pub trait CharacterStore: Send + Sync {
    fn load_row(&self, name: &str) -> Result<Row, CharacterError>;
    fn update_row(&self, name: &str, row: &Row) -> Result<(), CharacterError>;
    fn list_names(&self) -> Result<Vec<String>, CharacterError>;
}

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct SledCharacterStoreBuilder {
    path: PathBuf,
    temporary: bool,
}

impl SledCharacterStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            temporary: false,
        }
    }

    /// Remove the database when the store is dropped.
    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    pub fn open(self) -> Result<SledCharacterStore, CharacterError> {
        SledCharacterStore::open_with_options(self.path, self.temporary)
    }
}

/// Sled-backed character rows, bincode encoded.
pub struct SledCharacterStore {
    _db: sled::Db,
    rows: sled::Tree,
}

impl SledCharacterStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CharacterError> {
        Self::open_with_options(path, false)
    }

    fn open_with_options<P: AsRef<Path>>(path: P, temporary: bool) -> Result<Self, CharacterError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::Config::new().path(path_ref).temporary(temporary).open()?;
        let rows = db.open_tree(TREE_CHARACTERS)?;
        Ok(Self { _db: db, rows })
    }

    fn row_key(name: &str) -> Vec<u8> {
        format!("{}{}", ROW_PREFIX, name.to_ascii_lowercase()).into_bytes()
    }

    fn serialize(row: &Row) -> Result<Vec<u8>, CharacterError> {
        Ok(bincode::serialize(row)?)
    }

    fn deserialize(bytes: IVec) -> Result<Row, CharacterError> {
        Ok(bincode::deserialize::<Row>(&bytes)?)
    }
}

impl CharacterStore for SledCharacterStore {
    fn load_row(&self, name: &str) -> Result<Row, CharacterError> {
        let Some(bytes) = self.rows.get(Self::row_key(name))? else {
            return Err(CharacterError::NotFound(format!("character: {}", name)));
        };
        Self::deserialize(bytes)
    }

    fn update_row(&self, name: &str, row: &Row) -> Result<(), CharacterError> {
        let bytes = Self::serialize(row)?;
        self.rows.insert(Self::row_key(name), bytes)?;
        self.rows.flush()?;
        Ok(())
    }

    fn list_names(&self) -> Result<Vec<String>, CharacterError> {
        let mut names = Vec::new();
        for entry in self.rows.scan_prefix(ROW_PREFIX.as_bytes()) {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            if let Some(name) = text.strip_prefix(ROW_PREFIX) {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_row() -> Row {
        let mut row = Row::new();
        row.insert("name".into(), "alice".into());
        row.insert("level".into(), Column::Int(4));
        row.insert("inventory".into(), "1,5;".into());
        row
    }

    #[test]
    fn test_round_trip_and_case_insensitive_key() {
        let dir = TempDir::new().expect("tempdir");
        let store = SledCharacterStoreBuilder::new(dir.path()).open().expect("open");
        store.update_row("Alice", &sample_row()).expect("update");
        assert_eq!(store.load_row("alice").expect("load"), sample_row());
        assert_eq!(store.list_names().expect("list"), vec!["alice".to_string()]);
    }

    #[test]
    fn test_missing_row_is_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let store = SledCharacterStore::open(dir.path()).expect("open");
        assert!(matches!(store.load_row("nobody"), Err(CharacterError::NotFound(_))));
    }

    #[test]
    fn test_row_reader_types() {
        let row = sample_row();
        let reader = RowReader::new("alice", &row);
        assert_eq!(reader.int("level").expect("level"), 4);
        assert_eq!(reader.int_as::<u8>("level").expect("narrow"), 4);
        assert!(matches!(reader.int("name"), Err(CharacterError::Column { column: "name", .. })));
        assert!(reader.text("missing").is_err());
        assert_eq!(reader.text_or_empty("missing").expect("optional"), "");
    }
}
