//! Reduction of a full-syntax grammar to RELAX NG simple form.
//!
//! Eight passes run in a fixed order; each assumes its predecessors'
//! postconditions and the order is load-bearing. Renames must precede
//! reference rewrites, `combine` elimination must precede grammar
//! flattening, sugar removal must precede `empty` elimination, and
//! reachability re-runs after `notAllowed` propagation. Every pass is
//! idempotent on its own output, and so is the pipeline as a whole.

mod arity;
mod avoid_empty;
mod canonical;
mod combine;
mod desugar;
mod flatten;
mod name_class;
mod not_allowed;

use crate::ast::Root;
use crate::check;

use std::collections::HashSet;
use thiserror::Error;

/// Structural errors raised while simplifying. These indicate bugs in the
/// grammar author's input and abort the pipeline; there is no partial
/// recovery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimplifyError {
  #[error("Grammar should begin with start")]
  MissingStart,
  #[error("Cannot have multiple starts without specifying combine")]
  StartCombineMissing,
  #[error("Cannot have multiple starts with different combine values")]
  StartCombineConflict,
  #[error("Cannot have multiple defines named {0} without specifying combine")]
  DefineCombineMissing(String),
  #[error("Cannot have multiple defines named {0} with different combine values")]
  DefineCombineConflict(String),
  #[error("Each ref or parentRef must be within a grammar")]
  RefOutsideGrammar,
  #[error("parentRef has no enclosing parent grammar")]
  ParentRefWithoutParent,
  #[error("Referencing unknown definition: {0}")]
  UnknownDefinition(String),
  #[error("Not valid as simplified RelaxNG")]
  NotSimple,
}

/// Rewrite `root` into simple form, in place.
///
/// On success the tree satisfies every simple-form invariant, certified by
/// [`check::is_simple`]. On error the tree is left in an intermediate state
/// and must not be reused.
pub fn simplify(root: &mut Root) -> Result<(), SimplifyError> {
  tracing::debug!("pass 1: lift scalar names into name classes");
  name_class::apply(root);
  tracing::debug!("pass 2: normalize arities");
  arity::apply(root);
  tracing::debug!("pass 3: remove mixed/optional/zeroOrMore");
  desugar::apply(root);
  tracing::debug!("pass 4: eliminate combine");
  combine::apply(root)?;
  tracing::debug!("pass 5: flatten to a single grammar");
  flatten::apply(root)?;
  tracing::debug!("pass 6: canonical define/element");
  canonical::apply(root)?;
  tracing::debug!("pass 7: limit notAllowed");
  not_allowed::apply(root)?;
  tracing::debug!("pass 8: remove empty in tight spots");
  avoid_empty::apply(root);

  if !check::is_simple(root) {
    return Err(SimplifyError::NotSimple);
  }
  Ok(())
}

/// First `base__k` not present in `used`; the chosen name is recorded.
pub(crate) fn fresh_name(base: &str, used: &mut HashSet<String>) -> String {
  let mut k = 1usize;
  loop {
    let candidate = format!("{base}__{k}");
    if used.insert(candidate.clone()) {
      return candidate;
    }
    k += 1;
  }
}
