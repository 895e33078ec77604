//! Simple-form certification.
//!
//! A pure predicate over the simple-form invariants, used as an assertion
//! between the simplifier and its consumers. Checks short-circuit on the
//! first violation.

use crate::ast::{GrammarContent, Pattern, Root};

/// True iff `root` satisfies every simple-form invariant:
/// one grammar, `start` first, every define wrapping exactly one element,
/// restricted arities, `empty`/`notAllowed` only in their permitted spots,
/// and none of the full-form-only kinds remaining.
pub fn is_simple(root: &Root) -> bool {
  let Pattern::Grammar(contents) = &root.pattern else {
    return false;
  };
  let Some((GrammarContent::Start(start), defines)) = contents.split_first() else {
    return false;
  };
  if !top_pattern(&start.pattern) {
    return false;
  }
  defines.iter().all(|content| match content {
    GrammarContent::Define(define) => {
      define.patterns.len() == 1
        && matches!(define.patterns[0], Pattern::Element { .. })
        && top_pattern(&define.patterns[0])
    }
    GrammarContent::Start(_) => false,
  })
}

/// A pattern position where `notAllowed` and `empty` are both permitted:
/// directly under `start` or under `element`.
fn top_pattern(pattern: &Pattern) -> bool {
  check(pattern, true, true)
}

fn check(pattern: &Pattern, allow_not_allowed: bool, allow_empty: bool) -> bool {
  match pattern {
    Pattern::Empty => allow_empty,
    Pattern::NotAllowed => allow_not_allowed,
    Pattern::Text | Pattern::Value(_) | Pattern::Data(_) | Pattern::Ref(_) => true,
    Pattern::Element { patterns, .. } => {
      patterns.len() == 1 && check(&patterns[0], true, true)
    }
    Pattern::Attribute { patterns, .. } => {
      patterns.len() == 1 && check(&patterns[0], false, true)
    }
    Pattern::Group(patterns) | Pattern::Interleave(patterns) => {
      patterns.len() == 2 && patterns.iter().all(|c| check(c, false, false))
    }
    Pattern::Choice(patterns) => {
      patterns.len() == 2
        && check(&patterns[0], false, true)
        && check(&patterns[1], false, false)
    }
    Pattern::OneOrMore(patterns) => patterns.len() == 1 && check(&patterns[0], false, false),
    // Full-form-only kinds; none may survive simplification.
    Pattern::Optional(_)
    | Pattern::ZeroOrMore(_)
    | Pattern::Mixed(_)
    | Pattern::ParentRef(_)
    | Pattern::ElementNamed { .. }
    | Pattern::AttributeNamed { .. }
    | Pattern::Grammar(_) => false,
  }
}
