use serde_json::{Map, Value};

/// API field -> column name for the `sends` list.
pub const SENT_RENAMES: &[(&str, &str)] = &[
    ("phone", "celular"),
    ("text", "mensaje"),
    ("send_at", "fecha_envio"),
    ("status", "estado"),
    ("carrier", "operadora"),
    ("credit", "credito"),
];

/// API field -> column name for the `receiveds` list.
pub const RECEIVED_RENAMES: &[(&str, &str)] = &[
    ("phone", "celular"),
    ("content", "respuesta"),
    ("received_at", "fecha_respuesta"),
];

/// Rows of JSON values under named columns.
///
/// Columns are the union of the record keys in first-seen order. A record
/// without a given key leaves `Value::Null` in that cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn from_records(records: &[Map<String, Value>], renames: &[(&str, &str)]) -> Self {
        let mut keys: Vec<&str> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !keys.contains(&key.as_str()) {
                    keys.push(key.as_str());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                keys.iter()
                    .map(|key| record.get(*key).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        let columns = keys
            .iter()
            .map(|key| {
                renames
                    .iter()
                    .find(|(from, _)| from == key)
                    .map_or(*key, |(_, to)| *to)
                    .to_string()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in row `row`, if both exist.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(index)
    }
}

/// Text shown for a cell in the UI and written for non-numeric cells.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
