//! Domain models that mirror the SQLite schema. The three record types share a
//! single shape (a string key followed by four columns) so everything above the
//! store works from an [`EntitySchema`] instead of per-type structs.

use std::fmt;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

/// The three tables the librarian maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Entity {
    Book,
    Member,
    Transaction,
}

impl Entity {
    /// Every entity in tab and export order.
    pub const ALL: [Entity; 3] = [Entity::Book, Entity::Member, Entity::Transaction];

    pub fn schema(self) -> &'static EntitySchema {
        match self {
            Entity::Book => &BOOK_SCHEMA,
            Entity::Member => &MEMBER_SCHEMA,
            Entity::Transaction => &TRANSACTION_SCHEMA,
        }
    }

    /// Position inside [`Entity::ALL`], handy for per-entity arrays.
    pub fn index(self) -> usize {
        match self {
            Entity::Book => 0,
            Entity::Member => 1,
            Entity::Transaction => 2,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.schema().label)
    }
}

/// Storage class of a column. Integer columns are parsed from form input;
/// everything else is kept as free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
}

#[derive(Debug)]
pub struct Column {
    /// SQL column name.
    pub name: &'static str,
    /// Heading shown in tables, exports and CSV headers.
    pub heading: &'static str,
    pub kind: ColumnKind,
}

/// Static description of one table: where it lives, how it is keyed, and the
/// fixed column order used by every read, write, export and import.
#[derive(Debug)]
pub struct EntitySchema {
    pub table: &'static str,
    /// Singular lower-case noun used in notices ("book").
    pub label: &'static str,
    /// Plural title used for tabs, sheets and report headings ("Books").
    pub title: &'static str,
    pub columns: &'static [Column],
}

impl EntitySchema {
    /// The primary key is always the first column.
    pub fn key_column(&self) -> &'static Column {
        &self.columns[0]
    }

    pub fn headings(&self) -> Vec<&'static str> {
        self.columns.iter().map(|column| column.heading).collect()
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|column| column.name).collect()
    }

    /// Columns rewritten by an update, in table order.
    pub fn value_columns(&self) -> &'static [Column] {
        &self.columns[1..]
    }
}

static BOOK_SCHEMA: EntitySchema = EntitySchema {
    table: "books",
    label: "book",
    title: "Books",
    columns: &[
        Column {
            name: "title",
            heading: "Title",
            kind: ColumnKind::Text,
        },
        Column {
            name: "author",
            heading: "Author",
            kind: ColumnKind::Text,
        },
        Column {
            name: "genre",
            heading: "Genre",
            kind: ColumnKind::Text,
        },
        Column {
            name: "quantity",
            heading: "Quantity",
            kind: ColumnKind::Integer,
        },
        Column {
            name: "available",
            heading: "Available",
            kind: ColumnKind::Integer,
        },
    ],
};

static MEMBER_SCHEMA: EntitySchema = EntitySchema {
    table: "members",
    label: "member",
    title: "Members",
    columns: &[
        Column {
            name: "member_id",
            heading: "Member ID",
            kind: ColumnKind::Text,
        },
        Column {
            name: "name",
            heading: "Name",
            kind: ColumnKind::Text,
        },
        Column {
            name: "membership_date",
            heading: "Membership Date",
            kind: ColumnKind::Text,
        },
        // Free text on purpose: there is no link to the books table.
        Column {
            name: "books_borrowed",
            heading: "Books Borrowed",
            kind: ColumnKind::Text,
        },
        Column {
            name: "quantity_borrowed",
            heading: "Quantity Borrowed",
            kind: ColumnKind::Integer,
        },
    ],
};

static TRANSACTION_SCHEMA: EntitySchema = EntitySchema {
    table: "transactions",
    label: "transaction",
    title: "Transactions",
    columns: &[
        Column {
            name: "transaction_id",
            heading: "Transaction ID",
            kind: ColumnKind::Text,
        },
        Column {
            name: "book_id",
            heading: "Book ID",
            kind: ColumnKind::Text,
        },
        Column {
            name: "member_id",
            heading: "Member ID",
            kind: ColumnKind::Text,
        },
        Column {
            name: "borrow_date",
            heading: "Borrow Date",
            kind: ColumnKind::Text,
        },
        Column {
            name: "return_date",
            heading: "Return Date",
            kind: ColumnKind::Text,
        },
    ],
};

/// One cell as stored in SQLite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
}

impl FieldValue {
    /// Convert raw text for a column without validating it. Integer columns
    /// keep unparseable input as text, mirroring SQLite's type affinity.
    pub fn from_raw(kind: ColumnKind, raw: &str) -> Self {
        match kind {
            ColumnKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(FieldValue::Integer)
                .unwrap_or_else(|_| FieldValue::Text(raw.to_string())),
            ColumnKind::Text => FieldValue::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Integer(value) => write!(f, "{value}"),
        }
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            FieldValue::Text(text) => Ok(ToSqlOutput::from(text.as_str())),
            FieldValue::Integer(value) => Ok(ToSqlOutput::from(*value)),
        }
    }
}

impl FromSql for FieldValue {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(value) => Ok(FieldValue::Integer(value)),
            ValueRef::Real(value) => Ok(FieldValue::Text(value.to_string())),
            ValueRef::Text(bytes) => Ok(FieldValue::Text(
                String::from_utf8_lossy(bytes).into_owned(),
            )),
            ValueRef::Null => Ok(FieldValue::Text(String::new())),
            ValueRef::Blob(_) => Err(FromSqlError::InvalidType),
        }
    }
}

/// A full row in schema column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub entity: Entity,
    pub values: Vec<FieldValue>,
}

impl Record {
    pub fn new(entity: Entity, values: Vec<FieldValue>) -> Self {
        Self { entity, values }
    }

    /// Build a record from raw strings (CSV cells, test fixtures) without
    /// validation.
    pub fn from_raw<S: AsRef<str>>(entity: Entity, cells: &[S]) -> Self {
        let values = entity
            .schema()
            .columns
            .iter()
            .zip(cells)
            .map(|(column, cell)| FieldValue::from_raw(column.kind, cell.as_ref()))
            .collect();
        Self { entity, values }
    }

    pub fn key(&self) -> String {
        self.values
            .first()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    /// Cell strings as shown in the display list.
    pub fn cells(&self) -> Vec<String> {
        self.values.iter().map(ToString::to_string).collect()
    }
}

/// Validate form input for `entity`: every field is required and integer
/// columns must hold a non-negative whole number.
pub fn validate_fields<S: AsRef<str>>(entity: Entity, fields: &[S]) -> crate::Result<Record> {
    let schema = entity.schema();
    if fields.len() != schema.columns.len() {
        return Err(crate::LibraryError::Validation(format!(
            "Expected {} fields for a {entity}, got {}.",
            schema.columns.len(),
            fields.len()
        )));
    }

    let values = schema
        .columns
        .iter()
        .zip(fields)
        .map(|(column, field)| validate_value(column, field.as_ref()))
        .collect::<crate::Result<Vec<_>>>()?;
    Ok(Record::new(entity, values))
}

/// Validate one form field. Surrounding whitespace is dropped, and a field
/// holding only whitespace counts as empty.
pub fn validate_value(column: &Column, raw: &str) -> crate::Result<FieldValue> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(crate::LibraryError::Validation(
            "All fields are required, please try again!".to_string(),
        ));
    }
    match column.kind {
        ColumnKind::Text => Ok(FieldValue::Text(raw.to_string())),
        ColumnKind::Integer => {
            let number = raw.parse::<i64>().map_err(|_| {
                crate::LibraryError::Validation(format!(
                    "{} must be a whole number.",
                    column.heading
                ))
            })?;
            if number < 0 {
                return Err(crate::LibraryError::Validation(format!(
                    "{} cannot be negative.",
                    column.heading
                )));
            }
            Ok(FieldValue::Integer(number))
        }
    }
}
