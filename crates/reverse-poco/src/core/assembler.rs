//! Merge the partial results of a [`SchemaReader`](super::SchemaReader) into a [`Schema`].

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::typemap::CanonicalType;

use super::schema::{Column, ForeignKey, Procedure, Schema, Table};
use super::traits::{ColumnInfo, TableMap};

/// Build the canonical schema from the five reader results.
///
/// 1. One table per `tables` entry, in that order.
/// 2. Columns attached in ordinal order, raw types mapped to canonical types.
/// 3. Primary key: a non-empty `primary_keys` entry wins; otherwise the
///    columns carrying a key position, ordered by it.
/// 4. Foreign keys attached in the order returned.
/// 5. Procedures attached as-is.
///
/// Tables without columns are kept. Columns, keys and foreign keys reported
/// for a table that `tables` does not list are dropped with a warning.
pub fn assemble(
    tables: TableMap<String>,
    mut columns: TableMap<Vec<ColumnInfo>>,
    mut primary_keys: TableMap<Vec<String>>,
    mut foreign_keys: TableMap<Vec<ForeignKey>>,
    procedures: IndexMap<String, Procedure>,
) -> Schema {
    let mut assembled = IndexMap::with_capacity(tables.len());

    for (name, description) in tables {
        let mut raw_columns = columns.shift_remove(&name).unwrap_or_default();
        raw_columns.sort_by_key(|c| c.ordinal_pos);

        let primary_key = match primary_keys.shift_remove(&name) {
            Some(keys) if !keys.is_empty() => keys,
            _ => key_from_positions(&raw_columns),
        };

        if raw_columns.is_empty() {
            warn!("Table {} has no columns", name);
        }

        let table = Table {
            columns: raw_columns.into_iter().map(to_column).collect(),
            foreign_keys: foreign_keys.shift_remove(&name).unwrap_or_default(),
            primary_key,
            description,
            name: name.clone(),
        };

        debug!(
            "Assembled {}: {} columns, pk {:?}, {} foreign keys",
            name,
            table.columns.len(),
            table.primary_key,
            table.foreign_keys.len()
        );
        assembled.insert(name, table);
    }

    for orphan in columns
        .keys()
        .chain(primary_keys.keys())
        .chain(foreign_keys.keys())
    {
        warn!("Ignoring metadata for unlisted table {}", orphan);
    }

    Schema {
        tables: assembled,
        procedures,
    }
}

/// Key columns in key order; `columns` must already be in ordinal order.
fn key_from_positions(columns: &[ColumnInfo]) -> Vec<String> {
    let mut keyed: Vec<(i32, &str)> = columns
        .iter()
        .filter_map(|c| Some((c.key_position?, c.name.as_str())))
        .collect();
    keyed.sort_by_key(|&(position, _)| position);
    keyed.into_iter().map(|(_, name)| name.to_string()).collect()
}

fn to_column(info: ColumnInfo) -> Column {
    Column {
        canonical_type: CanonicalType::from_native(&info.data_type),
        name: info.name,
        data_type: info.data_type,
        is_nullable: info.is_nullable,
        description: info.description,
        ordinal_pos: info.ordinal_pos,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{Parameter, ParameterDirection};

    fn col(name: &str, data_type: &str, ordinal: i32, key_position: Option<i32>) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            data_type: data_type.to_string(),
            is_nullable: key_position.is_none(),
            key_position,
            description: String::new(),
            ordinal_pos: ordinal,
        }
    }

    fn tables(names: &[&str]) -> TableMap<String> {
        names
            .iter()
            .map(|n| (n.to_string(), format!("{} table", n)))
            .collect()
    }

    #[test]
    fn test_composite_key_from_column_flags() {
        let mut columns = TableMap::new();
        columns.insert(
            "order_line".to_string(),
            vec![
                col("order_id", "int", 1, Some(1)),
                col("line_no", "int", 2, Some(2)),
                col("qty", "int", 3, None),
            ],
        );

        let schema = assemble(
            tables(&["order_line"]),
            columns,
            TableMap::new(),
            TableMap::new(),
            IndexMap::new(),
        );

        assert_eq!(
            schema.tables["order_line"].primary_key,
            vec!["order_id", "line_no"]
        );
    }

    #[test]
    fn test_key_positions_override_ordinal_order() {
        let mut columns = TableMap::new();
        columns.insert(
            "pair".to_string(),
            vec![
                col("a", "int", 1, Some(2)),
                col("note", "text", 2, None),
                col("b", "int", 3, Some(1)),
            ],
        );

        let schema = assemble(
            tables(&["pair"]),
            columns,
            TableMap::new(),
            TableMap::new(),
            IndexMap::new(),
        );

        assert_eq!(schema.tables["pair"].primary_key, vec!["b", "a"]);
        assert_eq!(schema.tables["pair"].columns[0].name, "a");
    }

    #[test]
    fn test_composite_key_from_authoritative_list() {
        let mut columns = TableMap::new();
        columns.insert(
            "order_line".to_string(),
            vec![col("order_id", "int", 1, None), col("line_no", "int", 2, None)],
        );
        let mut keys = TableMap::new();
        keys.insert(
            "order_line".to_string(),
            vec!["order_id".to_string(), "line_no".to_string()],
        );

        let schema = assemble(
            tables(&["order_line"]),
            columns,
            keys,
            TableMap::new(),
            IndexMap::new(),
        );

        assert_eq!(
            schema.tables["order_line"].primary_key,
            vec!["order_id", "line_no"]
        );
    }

    #[test]
    fn test_authoritative_list_overrides_column_flags() {
        let mut columns = TableMap::new();
        columns.insert(
            "t".to_string(),
            vec![col("a", "int", 1, Some(1)), col("b", "int", 2, Some(2))],
        );
        let mut keys = TableMap::new();
        keys.insert("t".to_string(), vec!["b".to_string(), "a".to_string()]);

        let schema = assemble(tables(&["t"]), columns, keys, TableMap::new(), IndexMap::new());
        assert_eq!(schema.tables["t"].primary_key, vec!["b", "a"]);
    }

    #[test]
    fn test_columns_sorted_by_ordinal_and_mapped() {
        let mut columns = TableMap::new();
        columns.insert(
            "customer".to_string(),
            vec![col("name", "varchar", 2, None), col("id", "INT", 1, Some(1))],
        );

        let schema = assemble(
            tables(&["customer"]),
            columns,
            TableMap::new(),
            TableMap::new(),
            IndexMap::new(),
        );

        let table = &schema.tables["customer"];
        assert_eq!(table.description, "customer table");
        assert_eq!(table.columns[0].name, "id");
        assert_eq!(table.columns[0].canonical_type, CanonicalType::Integer);
        assert_eq!(table.columns[1].canonical_type, CanonicalType::Text);
        assert!(table.is_key_column("id"));
    }

    #[test]
    fn test_zero_column_table_is_kept() {
        let schema = assemble(
            tables(&["empty", "other"]),
            TableMap::new(),
            TableMap::new(),
            TableMap::new(),
            IndexMap::new(),
        );
        assert_eq!(schema.tables.len(), 2);
        assert!(schema.tables["empty"].columns.is_empty());
        assert!(!schema.tables["empty"].has_pk());
    }

    #[test]
    fn test_table_order_preserved() {
        let schema = assemble(
            tables(&["zeta", "alpha", "mid"]),
            TableMap::new(),
            TableMap::new(),
            TableMap::new(),
            IndexMap::new(),
        );
        let names: Vec<_> = schema.tables.keys().cloned().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_foreign_keys_and_unlisted_tables() {
        let mut fks = TableMap::new();
        fks.insert(
            "employee".to_string(),
            vec![
                ForeignKey::new(Some("fk_manager"), "manager_id", "employee", "id"),
                ForeignKey::new(Some("fk_mentor"), "mentor_id", "employee", "id"),
            ],
        );
        fks.insert(
            "ghost".to_string(),
            vec![ForeignKey::new(None, "x", "employee", "id")],
        );

        let schema = assemble(
            tables(&["employee"]),
            TableMap::new(),
            TableMap::new(),
            fks,
            IndexMap::new(),
        );

        let employee = &schema.tables["employee"];
        assert_eq!(employee.foreign_keys.len(), 2);
        assert_eq!(employee.foreign_keys[0].column, "manager_id");
        assert_eq!(employee.foreign_keys[1].column, "mentor_id");
        assert!(!schema.tables.contains_key("ghost"));
    }

    #[test]
    fn test_procedures_attached_verbatim() {
        let mut procedures = IndexMap::new();
        procedures.insert(
            "get_orders".to_string(),
            Procedure {
                name: "get_orders".to_string(),
                definition: "SELECT 1".to_string(),
                description: String::new(),
                parameters: vec![Parameter::new(
                    "customer_id",
                    "int",
                    ParameterDirection::In,
                )],
            },
        );

        let schema = assemble(
            TableMap::new(),
            TableMap::new(),
            TableMap::new(),
            TableMap::new(),
            procedures.clone(),
        );
        assert_eq!(schema.procedures, procedures);
    }
}
