//! Database column types and their semantic value kinds.
//!
//! When the result of a compiled model is read back (for example after a
//! round-trip through a temporary table) its columns arrive as database type
//! names. A [`DtypeMapper`] turns those names into [`SemanticType`]s, which
//! are also the keys of the conversion registry.
//!
//! The mapping tables belong to the caller; [`StandardDtypeMapper`] covers the
//! common names of the supported dialects and is a reasonable default.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::dialect::{Dialect, SqlDialect};
use crate::error::{ModelError, ModelResult};

/// Semantic value kind of a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Bool,
    Int64,
    Float64,
    /// Fixed-precision decimal. `None` means the database default.
    Decimal {
        precision: Option<u8>,
        scale: Option<u8>,
    },
    String,
    Bytes,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Json,
    Uuid,
    Array(Box<SemanticType>),
    Struct(Vec<(String, SemanticType)>),
}

impl SemanticType {
    /// The conversion-registry key for values of this type.
    pub fn name(&self) -> &'static str {
        match self {
            SemanticType::Bool => "bool",
            SemanticType::Int64 => "int64",
            SemanticType::Float64 => "float64",
            SemanticType::Decimal { .. } => "decimal",
            SemanticType::String => "string",
            SemanticType::Bytes => "bytes",
            SemanticType::Date => "date",
            SemanticType::Time => "time",
            SemanticType::Timestamp => "timestamp",
            SemanticType::TimestampTz => "timestamptz",
            SemanticType::Json => "json",
            SemanticType::Uuid => "uuid",
            SemanticType::Array(_) => "array",
            SemanticType::Struct(_) => "struct",
        }
    }

    /// Returns true if this is a numeric type.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            SemanticType::Int64 | SemanticType::Float64 | SemanticType::Decimal { .. }
        )
    }

    /// Returns true if this is a temporal (date/time) type.
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            SemanticType::Date
                | SemanticType::Time
                | SemanticType::Timestamp
                | SemanticType::TimestampTz
        )
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Decimal {
                precision: Some(p),
                scale,
            } => write!(f, "decimal({}, {})", p, scale.unwrap_or(0)),
            SemanticType::Array(inner) => write!(f, "array<{}>", inner),
            SemanticType::Struct(fields) => {
                write!(f, "struct<")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", name, ty)?;
                }
                write!(f, ">")
            }
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Maps a database type name to a semantic type.
pub trait DtypeMapper: Send + Sync {
    fn dtype_for_db_type(&self, dialect: Dialect, db_type_name: &str) -> Option<SemanticType>;
}

/// Type names of Postgres, BigQuery and DuckDB.
///
/// Supports parameterised names (`numeric(10,2)`, `varchar(255)`), arrays
/// (`ARRAY<INT64>`, `integer[]`) and structs (`STRUCT<a INT64>`,
/// `STRUCT(a INTEGER)`).
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDtypeMapper;

impl DtypeMapper for StandardDtypeMapper {
    fn dtype_for_db_type(&self, dialect: Dialect, db_type_name: &str) -> Option<SemanticType> {
        let s = db_type_name.trim().to_lowercase();
        if s.is_empty() {
            return None;
        }

        // Composite types first
        if let Some(inner) = s.strip_suffix("[]") {
            return self
                .dtype_for_db_type(dialect, inner)
                .map(|ty| SemanticType::Array(Box::new(ty)));
        }
        if let Some(inner) = extract_delimited(&s, "array", '<', '>') {
            return self
                .dtype_for_db_type(dialect, &inner)
                .map(|ty| SemanticType::Array(Box::new(ty)));
        }
        if let Some(inner) = extract_delimited(&s, "struct", '<', '>')
            .or_else(|| extract_delimited(&s, "struct", '(', ')'))
        {
            return self.parse_struct_fields(dialect, &inner);
        }

        // Handle types with parameters
        if let Some(inner) = extract_delimited(&s, "numeric", '(', ')')
            .or_else(|| extract_delimited(&s, "decimal", '(', ')'))
            .or_else(|| extract_delimited(&s, "bignumeric", '(', ')'))
        {
            return parse_decimal_params(&inner);
        }
        if let Some(base) = strip_length_param(&s) {
            return match base {
                "varchar" | "character varying" | "char" | "character" | "string" | "bpchar" => {
                    Some(SemanticType::String)
                }
                "bytes" | "bit varying" | "varbit" => Some(SemanticType::Bytes),
                "timestamp" => Some(SemanticType::Timestamp),
                "timestamptz" => Some(SemanticType::TimestampTz),
                "time" => Some(SemanticType::Time),
                _ => None,
            };
        }

        // Dialect-specific spellings that would otherwise be ambiguous
        match (dialect, s.as_str()) {
            // BigQuery TIMESTAMP is an absolute point in time; DATETIME is civil time.
            (Dialect::BigQuery, "timestamp") => return Some(SemanticType::TimestampTz),
            (Dialect::BigQuery, "datetime") => return Some(SemanticType::Timestamp),
            (Dialect::BigQuery, "numeric") => {
                return Some(SemanticType::Decimal {
                    precision: Some(38),
                    scale: Some(9),
                })
            }
            (Dialect::BigQuery, "bignumeric") => {
                return Some(SemanticType::Decimal {
                    precision: Some(76),
                    scale: Some(38),
                })
            }
            (Dialect::DuckDb, "hugeint" | "uhugeint") => {
                return Some(SemanticType::Decimal {
                    precision: Some(38),
                    scale: Some(0),
                })
            }
            _ => {}
        }

        match s.as_str() {
            "bool" | "boolean" | "logical" => Some(SemanticType::Bool),

            "tinyint" | "smallint" | "int" | "integer" | "bigint" | "int1" | "int2" | "int4"
            | "int8" | "int16" | "int32" | "int64" | "smallserial" | "serial" | "bigserial"
            | "utinyint" | "usmallint" | "uinteger" | "ubigint" | "long" | "short" => {
                Some(SemanticType::Int64)
            }

            "real" | "float" | "float4" | "float8" | "float32" | "float64" | "double"
            | "double precision" => Some(SemanticType::Float64),

            "numeric" | "decimal" | "bignumeric" => Some(SemanticType::Decimal {
                precision: None,
                scale: None,
            }),

            "text" | "string" | "varchar" | "char" | "bpchar" | "character varying"
            | "character" | "name" | "citext" => Some(SemanticType::String),

            "bytea" | "bytes" | "blob" | "binary" | "varbinary" => Some(SemanticType::Bytes),

            "date" => Some(SemanticType::Date),
            "time" | "time without time zone" => Some(SemanticType::Time),
            "timestamp" | "timestamp without time zone" | "datetime" => {
                Some(SemanticType::Timestamp)
            }
            "timestamptz" | "timestamp with time zone" => Some(SemanticType::TimestampTz),

            "json" | "jsonb" => Some(SemanticType::Json),
            "uuid" => Some(SemanticType::Uuid),

            _ => None,
        }
    }
}

impl StandardDtypeMapper {
    fn parse_struct_fields(&self, dialect: Dialect, inner: &str) -> Option<SemanticType> {
        let mut fields = Vec::new();
        for field in split_top_level(inner) {
            let field = field.trim();
            let (name, ty) = field.split_once(char::is_whitespace)?;
            let name = name.trim_matches(|c| c == '"' || c == '`');
            fields.push((name.to_string(), self.dtype_for_db_type(dialect, ty)?));
        }
        Some(SemanticType::Struct(fields))
    }
}

/// A result column with its database and semantic types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultColumn {
    pub name: String,
    pub db_type: String,
    pub semantic_type: SemanticType,
}

/// Map `(name, db_type)` pairs reported by a database to result columns.
pub fn reinterpret_columns<N, T>(
    mapper: &dyn DtypeMapper,
    dialect: Dialect,
    columns: &[(N, T)],
) -> ModelResult<Vec<ResultColumn>>
where
    N: AsRef<str>,
    T: AsRef<str>,
{
    columns
        .iter()
        .map(|(name, db_type)| {
            let (name, db_type) = (name.as_ref(), db_type.as_ref());
            dialect.validate_identifier(name)?;
            let semantic_type = mapper.dtype_for_db_type(dialect, db_type).ok_or_else(|| {
                ModelError::UnknownDatabaseType {
                    dialect: dialect.name(),
                    column: name.to_string(),
                    type_name: db_type.to_string(),
                }
            })?;
            Ok(ResultColumn {
                name: name.to_string(),
                db_type: db_type.to_string(),
                semantic_type,
            })
        })
        .collect()
}

/// Extract content between delimiters for a given type prefix.
/// e.g., extract_delimited("array<int64>", "array", '<', '>') returns Some("int64")
fn extract_delimited(s: &str, prefix: &str, open: char, close: char) -> Option<String> {
    let rest = s.strip_prefix(prefix)?.trim();
    let inner = rest.strip_prefix(open)?.strip_suffix(close)?;
    Some(inner.trim().to_string())
}

/// `varchar(255)` -> `varchar`, `timestamp(6)` -> `timestamp`
fn strip_length_param(s: &str) -> Option<&str> {
    let (base, rest) = s.split_once('(')?;
    let param = rest.strip_suffix(')')?.trim();
    if param.eq_ignore_ascii_case("max") || param.parse::<u32>().is_ok() {
        Some(base.trim())
    } else {
        None
    }
}

/// Parse decimal parameters "precision,scale" or "precision".
fn parse_decimal_params(inner: &str) -> Option<SemanticType> {
    let parts: Vec<&str> = inner.split(',').map(|s| s.trim()).collect();
    let (precision, scale) = match parts.as_slice() {
        [p] => (p.parse().ok()?, 0),
        [p, s] => (p.parse().ok()?, s.parse().ok()?),
        _ => return None,
    };
    Some(SemanticType::Decimal {
        precision: Some(precision),
        scale: Some(scale),
    })
}

/// Split on commas that are not nested inside `<>` or `()`.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}
