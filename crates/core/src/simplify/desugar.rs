//! Pass 3: remove `mixed`, `optional` and `zeroOrMore`.
//!
//! After arity normalization each of these has a single child C:
//! * `mixed(C)` → `interleave(C, text)`
//! * `optional(C)` → `choice(C, empty)`
//! * `zeroOrMore(C)` → `choice(oneOrMore(C), empty)`

use crate::ast::{Pattern, Root};

pub(crate) fn apply(root: &mut Root) {
  desugar(&mut root.pattern);
}

fn desugar(pattern: &mut Pattern) {
  match pattern {
    Pattern::Mixed(patterns) => {
      let child = patterns.pop().unwrap_or(Pattern::Empty);
      *pattern = Pattern::Interleave(vec![child, Pattern::Text]);
    }
    Pattern::Optional(patterns) => {
      let child = patterns.pop().unwrap_or(Pattern::Empty);
      *pattern = Pattern::Choice(vec![child, Pattern::Empty]);
    }
    Pattern::ZeroOrMore(patterns) => {
      let child = patterns.pop().unwrap_or(Pattern::Empty);
      *pattern = Pattern::Choice(vec![Pattern::OneOrMore(vec![child]), Pattern::Empty]);
    }
    _ => {}
  }
  pattern.for_each_child_mut(&mut desugar);
}
