//! Pass 8: remove `empty` from tight spots.
//!
//! Post-order, children before parents:
//! * `group(empty, X)` / `group(X, empty)` → `X`, likewise `interleave`;
//! * `choice(X, empty)` → `choice(empty, X)` so `empty` is always first;
//! * `choice(empty, empty)` → `empty`;
//! * `oneOrMore(empty)` → `empty`.

use crate::ast::{Pattern, Root};

pub(crate) fn apply(root: &mut Root) {
  walk(&mut root.pattern);
}

fn walk(pattern: &mut Pattern) {
  pattern.for_each_child_mut(&mut walk);
  match pattern {
    Pattern::Group(patterns) | Pattern::Interleave(patterns) if patterns.len() == 2 => {
      let survivor = if matches!(patterns[0], Pattern::Empty) {
        Some(patterns.remove(1))
      } else if matches!(patterns[1], Pattern::Empty) {
        Some(patterns.remove(0))
      } else {
        None
      };
      if let Some(survivor) = survivor {
        *pattern = survivor;
      }
    }
    Pattern::Choice(patterns) if patterns.len() == 2 => {
      if matches!(patterns[1], Pattern::Empty) {
        if matches!(patterns[0], Pattern::Empty) {
          *pattern = Pattern::Empty;
        } else {
          patterns.swap(0, 1);
        }
      }
    }
    Pattern::OneOrMore(patterns)
      if matches!(patterns.first(), Some(Pattern::Empty)) && patterns.len() == 1 =>
    {
      *pattern = Pattern::Empty;
    }
    _ => {}
  }
}
