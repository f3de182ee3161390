//! RDF term model shared by queries, backends and result rows.
//!
//! Terms are plain owned values. They are totally ordered so they can key the
//! `BTreeMap`s used for converted results; the ordering is structural and
//! carries no query semantics.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const RDF_TYPE_IRI: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

const NUMERIC_DATATYPES: &[&str] = &[
    XSD_INTEGER,
    XSD_DECIMAL,
    XSD_DOUBLE,
    "http://www.w3.org/2001/XMLSchema#float",
    "http://www.w3.org/2001/XMLSchema#int",
    "http://www.w3.org/2001/XMLSchema#long",
    "http://www.w3.org/2001/XMLSchema#short",
    "http://www.w3.org/2001/XMLSchema#nonNegativeInteger",
    "http://www.w3.org/2001/XMLSchema#positiveInteger",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    pub lexical: String,
    pub datatype: Option<String>,
    pub language: Option<String>,
}

impl Literal {
    pub fn plain(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn typed(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    pub fn lang(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }

    /// Numeric value of the literal, when its datatype is one of the XSD numerics.
    pub fn as_f64(&self) -> Option<f64> {
        let datatype = self.datatype.as_deref()?;
        if !NUMERIC_DATATYPES.contains(&datatype) {
            return None;
        }
        self.lexical.trim().parse::<f64>().ok()
    }
}

/// A ground RDF term: IRI, blank node or literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    Iri(String),
    BlankNode(String),
    Literal(Literal),
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    pub fn blank(id: impl Into<String>) -> Self {
        Term::BlankNode(id.into())
    }

    pub fn literal(lexical: impl Into<String>) -> Self {
        Term::Literal(Literal::plain(lexical))
    }

    pub fn typed_literal(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal(Literal::typed(lexical, datatype))
    }

    pub fn lang_literal(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Term::Literal(Literal::lang(lexical, language))
    }

    /// The `rdf:type` predicate.
    pub fn rdf_type() -> Self {
        Term::Iri(RDF_TYPE_IRI.to_string())
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, Term::Iri(_))
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// The IRI string, blank node label or literal lexical form.
    pub fn lexical(&self) -> &str {
        match self {
            Term::Iri(iri) => iri,
            Term::BlankNode(id) => id,
            Term::Literal(lit) => &lit.lexical,
        }
    }

    /// Reinterpret the term as an IRI.
    ///
    /// Some stores hand back subject/predicate positions as literals; those
    /// positions can only hold IRIs, so the lexical form is taken as the IRI.
    pub fn into_iri(self) -> Self {
        match self {
            Term::Literal(lit) => Term::Iri(lit.lexical),
            other => other,
        }
    }

    /// `false` only for literals with an empty lexical form.
    pub fn has_content(&self) -> bool {
        match self {
            Term::Literal(lit) => !lit.lexical.is_empty(),
            _ => true,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Term::Literal(lit) => lit.as_f64(),
            _ => None,
        }
    }
}

pub(crate) fn escape_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", escape_literal(&self.lexical))?;
        if let Some(lang) = &self.language {
            write!(f, "@{lang}")
        } else if let Some(datatype) = &self.datatype {
            write!(f, "^^<{datatype}>")
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{iri}>"),
            Term::BlankNode(id) => write!(f, "_:{id}"),
            Term::Literal(lit) => lit.fmt(f),
        }
    }
}

// ============================================================================
// Conversions from plain Rust values
// ============================================================================

impl From<Literal> for Term {
    fn from(value: Literal) -> Self {
        Term::Literal(value)
    }
}

impl From<&str> for Term {
    fn from(value: &str) -> Self {
        Term::literal(value)
    }
}

impl From<String> for Term {
    fn from(value: String) -> Self {
        Term::literal(value)
    }
}

impl From<&String> for Term {
    fn from(value: &String) -> Self {
        Term::literal(value.as_str())
    }
}

impl From<&Term> for Term {
    fn from(value: &Term) -> Self {
        value.clone()
    }
}

impl From<bool> for Term {
    fn from(value: bool) -> Self {
        Term::typed_literal(value.to_string(), XSD_BOOLEAN)
    }
}

impl From<f64> for Term {
    fn from(value: f64) -> Self {
        Term::typed_literal(value.to_string(), XSD_DOUBLE)
    }
}

macro_rules! integer_terms {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Term {
                fn from(value: $ty) -> Self {
                    Term::typed_literal(value.to_string(), XSD_INTEGER)
                }
            }
        )*
    };
}

integer_terms!(i32, i64, u32, u64, usize);

/// Anything that stands for a graph node, such as a domain object produced by
/// an instance maker. Constraint values built from a resource use its subject.
pub trait Resource {
    fn subject(&self) -> &Term;
}

impl Resource for Term {
    fn subject(&self) -> &Term {
        self
    }
}
