//! `shor` is a parser, formatter and query API for shor, a small, ordered,
//! hierarchical configuration language. A shor document is a sequence of
//! nodes; each node has an optional key and is either a scalar (a number, a
//! boolean or a string) or a table of further nodes:
//!
//! ```text
//! # top-level nodes
//! user: "www"
//! worker_processes: 5
//! events: { worker_connections: 4096 }
//! http: {
//!     include: "mime.types"
//!     server: {
//!         listen: 80
//!         "keyless values are fine too"
//!     }
//! }
//! ```
//!
//! Duplicate keys are allowed and order is always preserved, so a document
//! reads the way an nginx-style config file does.
//!
//! ## Example
//!
//! ```rust
//! use shor::ShorTree;
//!
//! let tree: ShorTree = r#"
//! user: "www"
//! events: { worker_connections: 4096 }
//! "#.parse().expect("failed to parse shor");
//!
//! let conns = tree.query().first("events").first("worker_connections");
//! assert_eq!(conns.get(0).and_then(|n| n.get::<f64>()), Some(4096.0));
//!
//! assert_eq!(
//!     tree.to_string(),
//!     r#"user:"www" events:{worker_connections:4096}"#
//! );
//! ```
//!
//! ## Editing
//!
//! Every node lives in the tree's arena and is addressed by a [`NodeId`].
//! Collect ids from a query, then edit through `&mut ShorTree`:
//!
//! ```rust
//! # use shor::ShorTree;
//! let mut tree: ShorTree = "gzip: true".parse().unwrap();
//! let gzip = tree.query().first("gzip").into_ids()[0];
//! assert!(tree.set(gzip, "on"));
//!
//! let level = tree.new_leaf("gzip_level", 6).unwrap();
//! tree.append(tree.root(), level).unwrap();
//!
//! assert_eq!(tree.format(tree.root(), 0, "  "), "gzip: \"on\"\ngzip_level: 6");
//! ```
//!
//! ## Error Reporting
//!
//! [`ShorError`] implements [`miette::Diagnostic`] and can be used to display
//! detailed, pretty-printed diagnostic messages when using [`miette::Result`]
//! and the `"fancy"` feature flag for `miette`:
//!
//! ```toml
//! # Cargo.toml
//! [dependencies]
//! miette = { version = "x.y.z", features = ["fancy"] }
//! ```
//!
//! ```no_run
//! fn main() -> miette::Result<()> {
//!     "foo: \"bar".parse::<shor::ShorTree>()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! * `span` (default) - Includes spans in the nodes built by the parser.
//! * `cli` - Builds the `shor` command-line formatter.
//!
//! ## Minimum Supported Rust Version
//!
//! You must be at least `1.74` to use this crate.

#![deny(missing_debug_implementations, nonstandard_style)]
#![warn(missing_docs, unreachable_pub, rust_2018_idioms)]

pub use error::*;
pub use fmt::{EmptyTable, FormatConfig};
pub use node::{NodeId, ShorNode};
pub use query::*;
pub use tree::ShorTree;
pub use value::*;

mod error;
mod fmt;
mod lexer;
mod node;
mod parser;
mod query;
mod tree;
mod value;

/// Parses a shor document.
///
/// Parsing is all-or-nothing: the input is fully tokenized first, and any
/// lexical or grammatical error aborts with no partial tree.
pub fn parse(input: &str) -> Result<ShorTree, ShorError> {
    let tokens = lexer::tokenize(input)?;
    Ok(parser::Parser::new(input, tokens).parse_document()?)
}
