//! Loading RDF documents into a [`MemoryBackend`] with sophia.
//!
//! Parsed terms are read back through their N-Triples display form, so the
//! mapping into [`Term`] does not depend on sophia's term internals.

use crate::error::{ReaderError, ReaderResult};
use crate::memory::{MemoryBackend, Quad as StoredQuad};
use attrql_query::term::XSD_STRING;
use attrql_query::{Literal, Term};
use sophia::api::prelude::*;
use std::io::BufRead;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfFormat {
    NTriples,
    Turtle,
    NQuads,
    TriG,
    RdfXml,
}

impl RdfFormat {
    pub fn name(self) -> &'static str {
        match self {
            RdfFormat::NTriples => "N-Triples",
            RdfFormat::Turtle => "Turtle",
            RdfFormat::NQuads => "N-Quads",
            RdfFormat::TriG => "TriG",
            RdfFormat::RdfXml => "RDF/XML",
        }
    }

    /// Guess from a file extension (`ttl`, `nt`, `nq`, `trig`, `rdf`, `owl`, `xml`).
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "nt" => Some(RdfFormat::NTriples),
            "ttl" => Some(RdfFormat::Turtle),
            "nq" => Some(RdfFormat::NQuads),
            "trig" => Some(RdfFormat::TriG),
            "rdf" | "owl" | "xml" => Some(RdfFormat::RdfXml),
            _ => None,
        }
    }
}

impl FromStr for RdfFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ntriples" | "n-triples" => Ok(RdfFormat::NTriples),
            "turtle" => Ok(RdfFormat::Turtle),
            "nquads" | "n-quads" => Ok(RdfFormat::NQuads),
            "trig" => Ok(RdfFormat::TriG),
            "rdfxml" | "rdf/xml" => Ok(RdfFormat::RdfXml),
            other => anyhow::bail!("unknown RDF format: {other}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct SinkError(String);

impl MemoryBackend {
    /// Parse `bytes` and insert every statement.
    ///
    /// Triples go to `graph` (the default graph when `None`); quads keep
    /// their own graph name. Returns the number of new quads.
    pub fn load(&mut self, bytes: &[u8], format: RdfFormat, graph: Option<&Term>) -> ReaderResult<usize> {
        let quads = parse_quads(std::io::BufReader::new(bytes), format, graph)?;
        let mut added = 0;
        for quad in quads {
            if self.insert_quad(quad) {
                added += 1;
            }
        }
        tracing::debug!(format = format.name(), added, "loaded RDF");
        Ok(added)
    }
}

fn parse_quads<R: BufRead>(reader: R, format: RdfFormat, graph: Option<&Term>) -> ReaderResult<Vec<StoredQuad>> {
    let mut out: Vec<StoredQuad> = Vec::new();
    let fail = |e: &dyn std::fmt::Display| ReaderError::load(format.name(), e.to_string());
    match format {
        RdfFormat::NTriples => sophia::turtle::parser::nt::parse_bufread(reader)
            .try_for_each_triple(|t| -> Result<(), SinkError> {
                out.push(statement(&t.s().to_string(), &t.p().to_string(), &t.o().to_string(), graph.cloned())?);
                Ok(())
            })
            .map_err(|e| fail(&e))?,
        RdfFormat::Turtle => sophia::turtle::parser::turtle::parse_bufread(reader)
            .try_for_each_triple(|t| -> Result<(), SinkError> {
                out.push(statement(&t.s().to_string(), &t.p().to_string(), &t.o().to_string(), graph.cloned())?);
                Ok(())
            })
            .map_err(|e| fail(&e))?,
        RdfFormat::RdfXml => sophia::xml::parser::parse_bufread(reader)
            .try_for_each_triple(|t| -> Result<(), SinkError> {
                out.push(statement(&t.s().to_string(), &t.p().to_string(), &t.o().to_string(), graph.cloned())?);
                Ok(())
            })
            .map_err(|e| fail(&e))?,
        RdfFormat::NQuads => sophia::turtle::parser::nq::parse_bufread(reader)
            .try_for_each_quad(|q| -> Result<(), SinkError> {
                let g = match q.g() {
                    Some(g) => Some(parse_term(&g.to_string())?),
                    None => graph.cloned(),
                };
                out.push(statement(&q.s().to_string(), &q.p().to_string(), &q.o().to_string(), g)?);
                Ok(())
            })
            .map_err(|e| fail(&e))?,
        RdfFormat::TriG => sophia::turtle::parser::trig::parse_bufread(reader)
            .try_for_each_quad(|q| -> Result<(), SinkError> {
                let g = match q.g() {
                    Some(g) => Some(parse_term(&g.to_string())?),
                    None => graph.cloned(),
                };
                out.push(statement(&q.s().to_string(), &q.p().to_string(), &q.o().to_string(), g)?);
                Ok(())
            })
            .map_err(|e| fail(&e))?,
    }
    Ok(out)
}

fn statement(s: &str, p: &str, o: &str, graph: Option<Term>) -> Result<StoredQuad, SinkError> {
    Ok(StoredQuad {
        subject: parse_term(s)?,
        predicate: parse_term(p)?,
        object: parse_term(o)?,
        graph,
    })
}

/// Parse the N-Triples display form of a term.
fn parse_term(text: &str) -> Result<Term, SinkError> {
    let s = text.trim();
    if let Some(iri) = s.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        return Ok(Term::iri(iri));
    }
    if let Some(id) = s.strip_prefix("_:") {
        return Ok(Term::blank(id));
    }
    if !s.starts_with('"') {
        return Err(SinkError(format!("unsupported RDF term form: {s}")));
    }

    // Decode escapes while looking for the closing quote.
    let mut lexical = String::new();
    let mut tail = None;
    let mut chars = s.char_indices().skip(1);
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => {
                tail = Some(&s[i + 1..]);
                break;
            }
            '\\' => match chars.next().map(|(_, escaped)| escaped) {
                Some('n') => lexical.push('\n'),
                Some('r') => lexical.push('\r'),
                Some('t') => lexical.push('\t'),
                Some(escaped @ ('"' | '\'' | '\\')) => lexical.push(escaped),
                Some(other) => lexical.extend(['\\', other]),
                None => lexical.push('\\'),
            },
            c => lexical.push(c),
        }
    }
    let Some(tail) = tail else {
        return Err(SinkError(format!("literal without closing quote: {s}")));
    };
    let rest = tail.trim();

    let literal = if let Some(language) = rest.strip_prefix('@') {
        Literal::lang(lexical, language)
    } else if let Some(datatype) = rest.strip_prefix("^^") {
        let datatype = datatype.trim();
        let datatype = datatype
            .strip_prefix('<')
            .and_then(|d| d.strip_suffix('>'))
            .unwrap_or(datatype);
        if datatype == XSD_STRING {
            Literal::plain(lexical)
        } else {
            Literal::typed(lexical, datatype)
        }
    } else {
        Literal::plain(lexical)
    };
    Ok(Term::Literal(literal))
}
