//! attrql reader: executing attribute queries against a graph store
//!
//! ```text
//! QueryParams ──► planner (Minimal | NQueries | Subquery)
//!                    │  builds Query values
//!                    ▼
//!                 Backend::execute ──► to_table ──► rows ──► ResultRow list
//! ```
//!
//! - `backend`: the three-method adapter contract (`execute`, `to_table`, `ask`)
//! - `reader`: [`QueryReader`], single-subject reads and row conversion
//! - `planner`: strategy selection and the [`Store`] entry point
//! - `memory`: an in-memory quad store implementing the contract
//! - `load`: filling the memory store from RDF documents

pub mod backend;
pub mod config;
pub mod convert;
pub mod error;
pub mod load;
pub mod memory;
pub mod params;
pub mod planner;
pub mod reader;

pub use backend::Backend;
pub use config::ReaderConfig;
pub use convert::{
    to_nested, AttributeMap, ConvertError, Nested, Row, Table, TypeMap, ValueMap,
};
pub use error::{ReaderError, ReaderResult};
pub use load::RdfFormat;
pub use memory::{MemoryBackend, MemoryOutput, Quad};
pub use params::{FilterClause, OrderBy, Paging, QueryParams};
pub use planner::{apply_params, subject_query, InstanceData, ResultRow, Store, Strategy};
pub use reader::QueryReader;
