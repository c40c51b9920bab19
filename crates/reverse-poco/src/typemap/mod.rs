//! Type mapping from engine-native column types to canonical categories and C# types.
//!
//! Every reader reports raw type names as the catalog spells them (`int4`,
//! `character varying`, `NVARCHAR`, `VARCHAR(50)`, ...). They are folded into a
//! small engine-agnostic [`CanonicalType`] set, which the code generator then
//! renders as a C# type name.

use serde::{Deserialize, Serialize};

/// Engine-agnostic type category of a column or parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalType {
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    Long,
    /// Character data of any length.
    Text,
    /// Date and time.
    DateTime,
    /// Date only.
    Date,
    /// Time of day or interval.
    TimeInterval,
    /// Boolean/bit.
    Boolean,
    /// Exact decimal/numeric/money.
    Decimal,
    /// 32-bit floating point.
    Single,
    /// 64-bit floating point.
    Double,
    /// 8-bit integer.
    Byte,
    /// 16-bit integer.
    Short,
    /// Binary data.
    Binary,
    /// UUID/GUID.
    Guid,
    /// Anything not recognized. Generation continues with `object`.
    Unknown,
}

impl CanonicalType {
    /// Map a native type name to its canonical category.
    ///
    /// Matching is case-insensitive. Length/precision suffixes (`varchar(50)`,
    /// `decimal(18, 2)`) and a trailing `unsigned` are ignored, so SQLite's
    /// free-form declared types map the same way as catalog type names.
    pub fn from_native(native: &str) -> Self {
        let lowered = native.trim().to_lowercase();
        let base = match lowered.find('(') {
            Some(idx) => &lowered[..idx],
            None => lowered.as_str(),
        };
        let base = base
            .trim()
            .trim_end_matches("zerofill")
            .trim_end()
            .trim_end_matches("unsigned")
            .trim();

        match base {
            // Integer types
            "int" | "integer" | "int4" | "mediumint" | "serial" | "serial4" => {
                CanonicalType::Integer
            }
            "bigint" | "int8" | "bigserial" | "serial8" => CanonicalType::Long,
            "smallint" | "int2" | "smallserial" | "serial2" | "year" => CanonicalType::Short,
            "tinyint" => CanonicalType::Byte,

            // String types
            "varchar" | "nvarchar" | "char" | "nchar" | "text" | "ntext" | "tinytext"
            | "mediumtext" | "longtext" | "character varying" | "character" | "bpchar"
            | "citext" | "name" | "enum" | "set" | "json" | "jsonb" | "xml" | "clob"
            | "varchar2" | "nvarchar2" | "string" | "sysname" => CanonicalType::Text,

            // Date/time types
            "datetime" | "datetime2" | "smalldatetime" | "datetimeoffset" | "timestamp"
            | "timestamptz" | "timestamp without time zone" | "timestamp with time zone" => {
                CanonicalType::DateTime
            }
            "date" => CanonicalType::Date,
            "time" | "timetz" | "interval" | "time without time zone"
            | "time with time zone" => CanonicalType::TimeInterval,

            // Boolean
            "bit" | "bool" | "boolean" => CanonicalType::Boolean,

            // Decimal/numeric
            "decimal" | "numeric" | "money" | "smallmoney" => CanonicalType::Decimal,

            // Floating point
            "float" | "real" | "float4" => CanonicalType::Single,
            "double" | "double precision" | "float8" => CanonicalType::Double,

            // Binary types
            "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob"
            | "image" | "bytea" | "rowversion" => CanonicalType::Binary,

            // GUID
            "uniqueidentifier" | "uuid" => CanonicalType::Guid,

            _ => CanonicalType::Unknown,
        }
    }

    /// C# type name for this category (without nullability marker).
    pub fn csharp_type(&self) -> &'static str {
        match self {
            CanonicalType::Integer => "int",
            CanonicalType::Long => "long",
            CanonicalType::Text => "string",
            CanonicalType::DateTime | CanonicalType::Date => "DateTime",
            CanonicalType::TimeInterval => "TimeSpan",
            CanonicalType::Boolean => "bool",
            CanonicalType::Decimal => "decimal",
            CanonicalType::Single => "float",
            CanonicalType::Double => "double",
            CanonicalType::Byte => "byte",
            CanonicalType::Short => "short",
            CanonicalType::Binary => "byte[]",
            CanonicalType::Guid => "Guid",
            CanonicalType::Unknown => "object",
        }
    }

    /// Whether the C# type is a value type (and so needs `?` when nullable).
    pub fn is_value_type(&self) -> bool {
        !matches!(
            self,
            CanonicalType::Text | CanonicalType::Binary | CanonicalType::Unknown
        )
    }

    /// C# type name including the `?` marker for nullable value types.
    pub fn csharp_type_nullable(&self, is_nullable: bool) -> String {
        if is_nullable && self.is_value_type() {
            format!("{}?", self.csharp_type())
        } else {
            self.csharp_type().to_string()
        }
    }
}
