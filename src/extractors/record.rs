// src/extractors/record.rs

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::kinds::TableKind;
use crate::utils::error::ExtractError;

/// Name of the injected first field, taken from the table title rather than a cell.
pub const TEAM_FIELD: &str = "team";

/// A single coerced cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Duration(Duration),
    Date(NaiveDate),
    Code(String),
    Text(String),
    /// The cell did not match its field's expected shape (or was empty).
    Absent,
}

impl Value {
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Code(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            // Minutes are not wrapped into hours; season totals run past 60.
            Value::Duration(d) => write!(f, "{:02}:{:02}", d.as_secs() / 60, d.as_secs() % 60),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Code(s) | Value::Text(s) => f.write_str(s),
            Value::Absent => Ok(()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Integer(v) => serializer.serialize_i64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Duration(_) | Value::Date(_) => serializer.collect_str(self),
            Value::Code(s) | Value::Text(s) => serializer.serialize_str(s),
            Value::Absent => serializer.serialize_none(),
        }
    }
}

/// Ordered field names for one table; `team` always comes first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    kind: TableKind,
    fields: Vec<String>,
}

impl Schema {
    /// Builds the schema for a table from its normalized header names.
    ///
    /// Every name must be non-empty and distinct, `team` included, so that a
    /// field name always picks out exactly one column.
    pub fn new(kind: TableKind, header_names: Vec<String>) -> Result<Self, ExtractError> {
        let mut fields = Vec::with_capacity(header_names.len() + 1);
        fields.push(TEAM_FIELD.to_string());
        for (column, name) in header_names.into_iter().enumerate() {
            if name.is_empty() {
                return Err(ExtractError::BlankHeader { column });
            }
            if fields.contains(&name) {
                return Err(ExtractError::DuplicateField(name));
            }
            fields.push(name);
        }
        Ok(Self { kind, fields })
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }
}

/// One typed output row. Shares its schema with every other row of the same table.
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<Schema>,
    values: Vec<Value>,
}

impl Record {
    pub(crate) fn new(schema: Arc<Schema>, values: Vec<Value>) -> Self {
        debug_assert_eq!(schema.len(), values.len());
        Self { schema, values }
    }

    pub fn kind(&self) -> TableKind {
        self.schema.kind()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn team(&self) -> &str {
        self.values[0].as_text().unwrap_or_default()
    }

    /// Looks a field up by canonical name.
    pub fn get(&self, name: &str) -> Result<&Value, ExtractError> {
        self.schema
            .position(name)
            .map(|i| &self.values[i])
            .ok_or_else(|| ExtractError::UnknownField(name.to_string()))
    }

    /// Fields in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema.fields.iter().map(String::as_str).zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goalie_record() -> Record {
        let schema = Arc::new(
            Schema::new(TableKind::GoalieStats, vec!["name".into(), "mip".into(), "svsperc".into(), "gaa".into()])
                .unwrap(),
        );
        Record::new(
            schema,
            vec![
                Value::Text("Team A".into()),
                Value::Text("Holmqvist, Johan".into()),
                Value::Duration(Duration::from_secs(125 * 60 + 7)),
                Value::Float(92.5),
                Value::Absent,
            ],
        )
    }

    #[test]
    fn test_team_is_first_field() {
        let record = goalie_record();
        assert_eq!(record.schema().fields()[0], TEAM_FIELD);
        assert_eq!(record.team(), "Team A");
        assert_eq!(record.kind(), TableKind::GoalieStats);
    }

    #[test]
    fn test_schema_rejects_blank_and_repeated_names() {
        let blank = Schema::new(TableKind::SkaterStats, vec!["rk".into(), "".into(), "gp".into()]);
        assert!(matches!(blank, Err(ExtractError::BlankHeader { column: 1 })));

        let repeated = Schema::new(TableKind::SkaterStats, vec!["gp".into(), "g".into(), "gp".into()]);
        assert!(matches!(repeated, Err(ExtractError::DuplicateField(name)) if name == "gp"));

        // A header cell reading "Team" would shadow the injected field.
        let team = Schema::new(TableKind::TeamOfficials, vec!["name".into(), "team".into()]);
        assert!(matches!(team, Err(ExtractError::DuplicateField(name)) if name == TEAM_FIELD));
    }

    #[test]
    fn test_get_unknown_field() {
        let record = goalie_record();
        assert_eq!(record.get("svsperc").unwrap(), &Value::Float(92.5));
        match record.get("pim") {
            Err(ExtractError::UnknownField(name)) => assert_eq!(name, "pim"),
            other => panic!("expected UnknownField, got {:?}", other),
        }
    }

    #[test]
    fn test_display_values() {
        let record = goalie_record();
        assert_eq!(record.get("mip").unwrap().to_string(), "125:07");
        assert_eq!(record.get("gaa").unwrap().to_string(), "");
        let dob = Value::Date(NaiveDate::from_ymd_opt(1990, 5, 2).unwrap());
        assert_eq!(dob.to_string(), "1990-05-02");
    }

    #[test]
    fn test_serializes_in_schema_order() {
        let json = serde_json::to_string(&goalie_record()).unwrap();
        assert_eq!(
            json,
            r#"{"team":"Team A","name":"Holmqvist, Johan","mip":"125:07","svsperc":92.5,"gaa":null}"#
        );
    }
}
