//! Identifier formatting for generated code.
//!
//! Catalog identifiers stay verbatim inside the canonical schema. They are only
//! reshaped here, at the point where they become C# identifiers:
//!
//! 1. [`NamingConvention::format`] applies the naming policy (verbatim or
//!    word-capitalized).
//! 2. [`csharp_identifier`] makes the result a legal C# identifier (invalid
//!    characters replaced, leading digits prefixed, keywords escaped with `@`).
//!
//! Native names embedded in annotations or SQL text go through
//! [`csharp_string_literal`] instead and are never reformatted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GenError, Result};

/// C# reserved keywords. Identifiers matching one are emitted with an `@` prefix.
const CSHARP_KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// Identifier naming policy for generated classes, properties and methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NamingConvention {
    /// Use catalog names unchanged.
    #[serde(rename = "verbatim", alias = "original")]
    Verbatim,
    /// Split on `_`, upper-case the first letter of each word, concatenate.
    #[default]
    #[serde(rename = "word-capitalized", alias = "camelcase")]
    WordCapitalized,
}

impl NamingConvention {
    /// Apply the naming policy to a catalog identifier.
    ///
    /// `order_item` becomes `OrderItem` under [`NamingConvention::WordCapitalized`].
    /// Only the first character of each word changes, so an already-capitalized
    /// name without underscores is returned unchanged.
    pub fn format(&self, name: &str) -> String {
        match self {
            NamingConvention::Verbatim => name.to_string(),
            NamingConvention::WordCapitalized => name.split('_').map(capitalize_first).collect(),
        }
    }

    /// Config/CLI spelling of the convention.
    pub fn as_str(&self) -> &'static str {
        match self {
            NamingConvention::Verbatim => "verbatim",
            NamingConvention::WordCapitalized => "word-capitalized",
        }
    }
}

impl fmt::Display for NamingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NamingConvention {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "verbatim" | "original" => Ok(NamingConvention::Verbatim),
            "word-capitalized" | "word_capitalized" | "camelcase" => {
                Ok(NamingConvention::WordCapitalized)
            }
            other => Err(GenError::Config(format!(
                "Invalid naming convention '{}'. Valid values: verbatim, word-capitalized",
                other
            ))),
        }
    }
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Turn an arbitrary name into a legal C# identifier.
pub fn csharp_identifier(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if ident.is_empty() {
        return "_".to_string();
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if CSHARP_KEYWORDS.contains(&ident.as_str()) {
        ident.insert(0, '@');
    }
    ident
}

/// Format a catalog name under `naming` and make it a legal C# identifier.
pub fn generated_identifier(naming: NamingConvention, name: &str) -> String {
    csharp_identifier(&naming.format(name))
}

/// Escape text for use inside a regular C# string literal.
pub fn csharp_string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Collapse a description to a single line and escape it for an XML doc comment.
///
/// Runs of whitespace (including newlines) become one space; leading and
/// trailing whitespace is dropped.
pub fn doc_comment_text(description: &str) -> String {
    let collapsed = description.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Validate a user-supplied C# identifier (context name).
pub fn validate_csharp_identifier(name: &str, field: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_alphabetic() || first == '_') && chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        None => false,
    };

    if !valid || CSHARP_KEYWORDS.contains(&name) {
        return Err(GenError::Config(format!(
            "{} must be a valid C# identifier, got {:?}",
            field, name
        )));
    }
    Ok(())
}

/// Validate a dotted C# namespace such as `Shop.Data`.
pub fn validate_namespace(namespace: &str) -> Result<()> {
    if namespace.is_empty() {
        return Err(GenError::Config("generation.namespace is required".into()));
    }
    for segment in namespace.split('.') {
        validate_csharp_identifier(segment, "generation.namespace segment")?;
    }
    Ok(())
}
