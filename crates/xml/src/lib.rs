/*!
XML front-end for rng-check.

Two entry points: [`parse_grammar`] reads the RNG XML wire form into the
full-syntax AST, and [`parse_document`] reads an XML instance into the
document tree the validator consumes. Both are thin roxmltree walks;
unsupported RNG constructs are rejected here, before the simplifier ever
sees them.
*/

mod document;
mod grammar;

pub use document::parse_document;
pub use grammar::parse_grammar;

use thiserror::Error;

/// Errors from the wire-form readers.
#[derive(Debug, Error)]
pub enum XmlError {
  #[error(transparent)]
  Parse(#[from] roxmltree::Error),
  #[error("Unsupported construct: <{0}>")]
  Unsupported(String),
  #[error("Unknown element: <{0}>")]
  UnknownElement(String),
  #[error("Missing required attribute `{attribute}` on <{element}>")]
  MissingAttribute { element: String, attribute: String },
  #[error("Invalid combine value: {0}")]
  BadCombine(String),
  #[error("<start> must contain exactly one pattern")]
  BadStart,
  #[error("<{0}> requires a name class")]
  MissingNameClass(String),
}
