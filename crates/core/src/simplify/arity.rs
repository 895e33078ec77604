//! Pass 2: arity normalization.
//!
//! * `define | oneOrMore | zeroOrMore | optional | mixed` with more than one
//!   child: wrap the children in a `group`.
//! * `element` with more than one content pattern: keep the name class, wrap
//!   the patterns in a `group`.
//! * `attribute` with no content pattern: append `text`.
//! * `choice | group | interleave` with one child: splice the child in
//!   place. With more than two: left-fold into pairs of the same
//!   constructor, `choice(choice(a, b), c)`.

use crate::ast::{GrammarContent, Pattern, Root};
use std::mem;

pub(crate) fn apply(root: &mut Root) {
  normalize(&mut root.pattern);
}

fn normalize(pattern: &mut Pattern) {
  // A splice replaces this node with its child, which may itself need
  // normalizing, so loop until the node is stable.
  loop {
    match pattern {
      Pattern::OneOrMore(patterns)
      | Pattern::ZeroOrMore(patterns)
      | Pattern::Optional(patterns)
      | Pattern::Mixed(patterns)
        if patterns.len() > 1 =>
      {
        let children = mem::take(patterns);
        patterns.push(Pattern::Group(children));
      }
      Pattern::Element { patterns, .. } if patterns.len() > 1 => {
        let children = mem::take(patterns);
        patterns.push(Pattern::Group(children));
      }
      Pattern::Attribute { patterns, .. } if patterns.is_empty() => {
        patterns.push(Pattern::Text);
      }
      Pattern::Choice(patterns) | Pattern::Group(patterns) | Pattern::Interleave(patterns)
        if patterns.len() == 1 =>
      {
        let child = patterns.pop().unwrap_or(Pattern::Empty);
        *pattern = child;
        continue;
      }
      Pattern::Choice(_) | Pattern::Group(_) | Pattern::Interleave(_) => {
        fold_pairs(pattern);
      }
      Pattern::Grammar(contents) => {
        for content in contents {
          if let GrammarContent::Define(define) = content {
            if define.patterns.len() > 1 {
              let children = mem::take(&mut define.patterns);
              define.patterns.push(Pattern::Group(children));
            }
          }
        }
      }
      _ => {}
    }
    break;
  }
  pattern.for_each_child_mut(&mut normalize);
}

fn fold_pairs(pattern: &mut Pattern) {
  let make: fn(Vec<Pattern>) -> Pattern = match pattern {
    Pattern::Choice(patterns) if patterns.len() > 2 => Pattern::Choice,
    Pattern::Group(patterns) if patterns.len() > 2 => Pattern::Group,
    Pattern::Interleave(patterns) if patterns.len() > 2 => Pattern::Interleave,
    _ => return,
  };
  let (Pattern::Choice(patterns) | Pattern::Group(patterns) | Pattern::Interleave(patterns)) =
    pattern
  else {
    return;
  };
  let mut children = mem::take(patterns).into_iter();
  let first = children.next().unwrap_or(Pattern::Empty);
  let second = children.next().unwrap_or(Pattern::Empty);
  *pattern = children.fold(make(vec![first, second]), |acc, next| make(vec![acc, next]));
}
