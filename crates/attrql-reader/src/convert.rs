//! Shaping flat binding tables into nested maps.
//!
//! `to_nested(table, &["p", "v", "g", "c"])` groups rows by `?p`, then `?v`,
//! then `?g`, collecting the `?c` values of each group in row order:
//!
//! ```text
//! p -> v -> g -> [c, c, ...]
//! ```
//!
//! Keys missing from a row group under `None`. Empty or missing values of the
//! last key are not collected.

use attrql_query::Term;
use std::collections::BTreeMap;
use thiserror::Error;

/// One solution: variable name (without `?`) to bound term.
pub type Row = BTreeMap<String, Term>;
pub type Table = Vec<Row>;

/// Context (or `None` for the default graph) to the types observed there.
pub type TypeMap = BTreeMap<Option<Term>, Vec<Term>>;
/// Value to its [`TypeMap`].
pub type ValueMap = BTreeMap<Term, TypeMap>;
/// Attribute to its [`ValueMap`].
pub type AttributeMap = BTreeMap<Term, ValueMap>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("at least one key is required")]
    NoKeys,

    #[error("row {row} has no binding for ?{key}")]
    MissingColumn { row: usize, key: String },

    #[error("expected {expected}")]
    Shape { expected: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nested {
    Values(Vec<Term>),
    Map(BTreeMap<Option<Term>, Nested>),
}

impl Nested {
    /// The empty result for a conversion over `key_count` keys.
    pub fn empty(key_count: usize) -> Self {
        if key_count <= 1 {
            Nested::Values(Vec::new())
        } else {
            Nested::Map(BTreeMap::new())
        }
    }

    pub fn as_values(&self) -> Option<&[Term]> {
        match self {
            Nested::Values(values) => Some(values),
            Nested::Map(_) => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<Option<Term>, Nested>> {
        match self {
            Nested::Map(map) => Some(map),
            Nested::Values(_) => None,
        }
    }

    pub fn get(&self, key: Option<&Term>) -> Option<&Nested> {
        self.as_map()?.get(&key.cloned())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Nested::Values(values) => values.is_empty(),
            Nested::Map(map) => map.is_empty(),
        }
    }

    fn into_map(self, expected: &'static str) -> Result<BTreeMap<Option<Term>, Nested>, ConvertError> {
        match self {
            Nested::Map(map) => Ok(map),
            Nested::Values(_) => Err(ConvertError::Shape { expected }),
        }
    }

    fn into_values(self, expected: &'static str) -> Result<Vec<Term>, ConvertError> {
        match self {
            Nested::Values(values) => Ok(values),
            Nested::Map(_) => Err(ConvertError::Shape { expected }),
        }
    }
}

pub fn to_nested(table: &[Row], keys: &[&str]) -> Result<Nested, ConvertError> {
    match keys {
        [] => Err(ConvertError::NoKeys),
        [only] => table
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.get(*only).cloned().ok_or_else(|| ConvertError::MissingColumn {
                    row: i,
                    key: (*only).to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Nested::Values),
        _ => {
            let (levels, tail) = keys.split_at(keys.len() - 2);
            let (list_key, value_key) = (tail[0], tail[1]);
            let mut root = BTreeMap::new();
            for row in table {
                let mut level = &mut root;
                for key in levels {
                    let entry = level
                        .entry(row.get(*key).cloned())
                        .or_insert_with(|| Nested::Map(BTreeMap::new()));
                    level = match entry {
                        Nested::Map(map) => map,
                        Nested::Values(_) => {
                            return Err(ConvertError::Shape {
                                expected: "a map at every intermediate key",
                            })
                        }
                    };
                }
                let entry = level
                    .entry(row.get(list_key).cloned())
                    .or_insert_with(|| Nested::Values(Vec::new()));
                let Nested::Values(values) = entry else {
                    return Err(ConvertError::Shape {
                        expected: "a list at the second-to-last key",
                    });
                };
                if let Some(value) = row.get(value_key).filter(|v| v.has_content()) {
                    values.push(value.clone());
                }
            }
            Ok(Nested::Map(root))
        }
    }
}

// ============================================================================
// Typed views
// ============================================================================

/// `g -> [c]` into a [`TypeMap`].
pub fn type_map(nested: Nested) -> Result<TypeMap, ConvertError> {
    nested
        .into_map("context -> types")?
        .into_iter()
        .map(|(context, types)| Ok((context, types.into_values("a list of types")?)))
        .collect()
}

/// `v -> g -> [c]` into a [`ValueMap`]; rows without a value are dropped.
pub fn value_map(nested: Nested) -> Result<ValueMap, ConvertError> {
    let mut out = ValueMap::new();
    for (value, contexts) in nested.into_map("value -> context -> types")? {
        let contexts = type_map(contexts)?;
        if let Some(value) = value {
            out.insert(value, contexts);
        }
    }
    Ok(out)
}

/// `p -> v -> g -> [c]` into an [`AttributeMap`].
pub fn attribute_map(nested: Nested) -> Result<AttributeMap, ConvertError> {
    let mut out = AttributeMap::new();
    for (attribute, values) in nested.into_map("attribute -> value -> context -> types")? {
        let values = value_map(values)?;
        if let Some(attribute) = attribute {
            out.insert(attribute, values);
        }
    }
    Ok(out)
}
