//! Canonical schema model: tables, columns, keys, and stored procedures.
//!
//! These types are the engine-agnostic representation every reader's output is
//! folded into. A [`Schema`] is built once by [`assemble`](super::assembler::assemble)
//! and only read afterwards; identifiers are kept exactly as the catalog reports them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::typemap::CanonicalType;

/// Complete metadata for one database schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Tables keyed by native name, in catalog order.
    pub tables: IndexMap<String, Table>,

    /// Stored procedures keyed by native name, in catalog order.
    pub procedures: IndexMap<String, Procedure>,
}

impl Schema {
    /// Foreign keys whose referenced table is not part of this schema.
    ///
    /// Returns `(table, foreign key)` pairs. Catalogs read mid-migration, or
    /// keys pointing into another schema, produce these.
    pub fn dangling_foreign_keys(&self) -> Vec<(&str, &ForeignKey)> {
        self.tables
            .values()
            .flat_map(|table| {
                table
                    .foreign_keys
                    .iter()
                    .filter(|fk| !self.tables.contains_key(&fk.ref_table))
                    .map(move |fk| (table.name.as_str(), fk))
            })
            .collect()
    }

    /// Total column count across all tables.
    pub fn column_count(&self) -> usize {
        self.tables.values().map(|t| t.columns.len()).sum()
    }
}

/// Table metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Table comment, empty when the catalog has none.
    pub description: String,

    /// Column definitions in ordinal order.
    pub columns: Vec<Column>,

    /// Foreign key constraints, one entry per referencing column.
    pub foreign_keys: Vec<ForeignKey>,

    /// Primary key column names in key order.
    pub primary_key: Vec<String>,
}

impl Table {
    /// Check if the table has a primary key.
    pub fn has_pk(&self) -> bool {
        !self.primary_key.is_empty()
    }

    /// Check if the table has a composite primary key.
    pub fn has_composite_pk(&self) -> bool {
        self.primary_key.len() > 1
    }

    /// Check if a column is part of the primary key.
    pub fn is_key_column(&self, column: &str) -> bool {
        self.primary_key.iter().any(|k| k == column)
    }

    /// 0-based position of a column within the primary key.
    pub fn key_position(&self, column: &str) -> Option<usize> {
        self.primary_key.iter().position(|k| k == column)
    }
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Data type as reported by the engine (e.g., "int", "character varying").
    pub data_type: String,

    /// Canonical type category of `data_type`.
    pub canonical_type: CanonicalType,

    /// Whether the column allows NULL.
    pub is_nullable: bool,

    /// Column comment, empty when the catalog has none.
    pub description: String,

    /// Ordinal position (1-based).
    pub ordinal_pos: i32,
}

/// Foreign key metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Referencing column.
    pub column: String,

    /// Referenced table name.
    pub ref_table: String,

    /// Referenced column name.
    pub ref_column: String,

    /// Human-readable description derived from the constraint.
    pub description: String,

    /// 1-based position of `column` within its constraint. Columns of a
    /// composite constraint are adjacent and numbered consecutively.
    #[serde(default = "first_position")]
    pub position: i32,
}

fn first_position() -> i32 {
    1
}

impl ForeignKey {
    /// Build a foreign key, describing it after its constraint name.
    pub fn new(
        constraint: Option<&str>,
        column: impl Into<String>,
        ref_table: impl Into<String>,
        ref_column: impl Into<String>,
    ) -> Self {
        let ref_table = ref_table.into();
        let ref_column = ref_column.into();
        let description = match constraint {
            Some(name) if !name.is_empty() => format!(
                "Foreign key constraint {} referencing {}.{}",
                name, ref_table, ref_column
            ),
            _ => format!(
                "Foreign key constraint referencing {}.{}",
                ref_table, ref_column
            ),
        };

        Self {
            column: column.into(),
            ref_table,
            ref_column,
            description,
            position: first_position(),
        }
    }

    /// Set the column's position within a composite constraint.
    pub fn at_position(mut self, position: i32) -> Self {
        self.position = position;
        self
    }

    /// Whether this column belongs to the same constraint as `previous`.
    pub fn continues(&self, previous: &ForeignKey) -> bool {
        self.position == previous.position + 1 && self.ref_table == previous.ref_table
    }
}

/// Stored procedure metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Procedure {
    /// Procedure name.
    pub name: String,

    /// Body as stored by the engine. Opaque, may be empty.
    pub definition: String,

    /// Procedure comment, empty when the catalog has none.
    pub description: String,

    /// Parameters in declaration order.
    pub parameters: Vec<Parameter>,
}

/// Parameter direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterDirection {
    In,
    Out,
}

impl ParameterDirection {
    /// Parse a catalog parameter mode (`IN`, `OUT`, `INOUT`).
    pub fn from_mode(mode: &str) -> Self {
        match mode.trim().to_uppercase().as_str() {
            "OUT" | "INOUT" | "IN OUT" => ParameterDirection::Out,
            _ => ParameterDirection::In,
        }
    }
}

/// Stored procedure parameter metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name (SQL Server names keep their `@`).
    pub name: String,

    /// Data type as reported by the engine.
    pub data_type: String,

    /// Canonical type category of `data_type`.
    pub canonical_type: CanonicalType,

    /// Parameter direction.
    pub direction: ParameterDirection,
}

impl Parameter {
    /// Build a parameter, mapping its type.
    pub fn new(
        name: impl Into<String>,
        data_type: impl Into<String>,
        direction: ParameterDirection,
    ) -> Self {
        let data_type = data_type.into();
        Self {
            name: name.into(),
            canonical_type: CanonicalType::from_native(&data_type),
            data_type,
            direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_table(name: &str, fks: Vec<ForeignKey>) -> Table {
        Table {
            name: name.to_string(),
            description: String::new(),
            columns: vec![Column {
                name: "id".to_string(),
                data_type: "int".to_string(),
                canonical_type: CanonicalType::Integer,
                is_nullable: false,
                description: String::new(),
                ordinal_pos: 1,
            }],
            foreign_keys: fks,
            primary_key: vec!["id".to_string()],
        }
    }

    #[test]
    fn test_foreign_key_description() {
        let fk = ForeignKey::new(Some("fk_order_customer"), "customer_id", "customer", "id");
        assert_eq!(
            fk.description,
            "Foreign key constraint fk_order_customer referencing customer.id"
        );

        let unnamed = ForeignKey::new(None, "customer_id", "customer", "id");
        assert_eq!(
            unnamed.description,
            "Foreign key constraint referencing customer.id"
        );
    }

    #[test]
    fn test_composite_constraint_continuation() {
        let order = ForeignKey::new(Some("fk_line"), "order_id", "order_line", "order_id");
        let line = ForeignKey::new(Some("fk_line"), "line_no", "order_line", "line_no").at_position(2);
        let other = ForeignKey::new(Some("fk_item"), "item_id", "item", "id");

        assert_eq!(order.position, 1);
        assert!(line.continues(&order));
        assert!(!order.continues(&line));
        assert!(!other.continues(&line));
        assert!(!other.at_position(3).continues(&line));
    }

    #[test]
    fn test_key_helpers() {
        let mut table = make_test_table("order_line", vec![]);
        table.primary_key = vec!["order_id".to_string(), "line_no".to_string()];
        assert!(table.has_pk());
        assert!(table.has_composite_pk());
        assert!(table.is_key_column("line_no"));
        assert!(!table.is_key_column("id"));
        assert_eq!(table.key_position("line_no"), Some(1));
    }

    #[test]
    fn test_dangling_foreign_keys() {
        let mut schema = Schema::default();
        schema.tables.insert(
            "order".to_string(),
            make_test_table(
                "order",
                vec![
                    ForeignKey::new(Some("fk_a"), "customer_id", "customer", "id"),
                    ForeignKey::new(Some("fk_b"), "warehouse_id", "warehouse", "id"),
                ],
            ),
        );
        schema
            .tables
            .insert("customer".to_string(), make_test_table("customer", vec![]));

        let dangling = schema.dangling_foreign_keys();
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].0, "order");
        assert_eq!(dangling[0].1.ref_table, "warehouse");
        assert_eq!(schema.column_count(), 2);
    }

    #[test]
    fn test_parameter_direction() {
        assert_eq!(ParameterDirection::from_mode("IN"), ParameterDirection::In);
        assert_eq!(ParameterDirection::from_mode("out"), ParameterDirection::Out);
        assert_eq!(ParameterDirection::from_mode("INOUT"), ParameterDirection::Out);
        assert_eq!(ParameterDirection::from_mode(""), ParameterDirection::In);
    }

    #[test]
    fn test_parameter_maps_type() {
        let p = Parameter::new("@CustomerId", "uniqueidentifier", ParameterDirection::In);
        assert_eq!(p.canonical_type, CanonicalType::Guid);
    }
}
