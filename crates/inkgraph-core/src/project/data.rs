//! Data bindings: per-shape properties and tabular databases of records.

use super::{ColumnId, DatabaseId, PropertyId, RecordId, ValueId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named string property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub(crate) id: PropertyId,
    pub name: String,
    pub value: String,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn id(&self) -> PropertyId {
        self.id
    }
}

/// Data owned by a shape or page: local properties plus a shared record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataContext {
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub record: Option<RecordId>,
}

impl DataContext {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub(crate) id: ColumnId,
    pub name: String,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

fn default_visible() -> bool {
    true
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            is_visible: true,
        }
    }

    pub fn id(&self) -> ColumnId {
        self.id
    }
}

/// One cell of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    pub(crate) id: ValueId,
    pub content: String,
}

impl Value {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
        }
    }

    pub fn id(&self) -> ValueId {
        self.id
    }
}

/// A database row. Records are shared: shapes bind to them through their data context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub(crate) id: RecordId,
    pub values: Vec<Value>,
}

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            values,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Copy with fresh record and value ids.
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            values: self
                .values
                .iter()
                .map(|v| Value::new(v.content.clone()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub(crate) id: DatabaseId,
    pub name: String,
    #[serde(default = "default_id_column")]
    pub id_column_name: String,
    pub columns: Vec<Column>,
    pub records: Vec<RecordId>,
}

fn default_id_column() -> String {
    "Id".to_string()
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            id_column_name: default_id_column(),
            columns: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn id(&self) -> DatabaseId {
        self.id
    }

    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            ..self.clone()
        }
    }

    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }
}
