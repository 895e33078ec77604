//! Pass 7: limit `notAllowed` to `start` and `element`.
//!
//! A post-order walk, children before parents, so a parent always sees
//! already-normalized children:
//! * an `attribute` whose pattern is `notAllowed` becomes `notAllowed`;
//! * `group | interleave | oneOrMore` with any `notAllowed` child become
//!   `notAllowed`;
//! * `choice(notAllowed, X)` and `choice(X, notAllowed)` become `X`.
//!
//! Collapsing can cut the last reference to a define, so reachability runs
//! again afterwards.

use crate::ast::{Pattern, Root};
use crate::simplify::{canonical, SimplifyError};

pub(crate) fn apply(root: &mut Root) -> Result<(), SimplifyError> {
  walk(&mut root.pattern);
  canonical::reachability(root)
}

fn walk(pattern: &mut Pattern) {
  pattern.for_each_child_mut(&mut walk);
  match pattern {
    Pattern::Attribute { patterns, .. }
      if matches!(patterns.first(), Some(Pattern::NotAllowed)) =>
    {
      *pattern = Pattern::NotAllowed;
    }
    Pattern::Group(patterns) | Pattern::Interleave(patterns) | Pattern::OneOrMore(patterns)
      if patterns.iter().any(|c| matches!(c, Pattern::NotAllowed)) =>
    {
      *pattern = Pattern::NotAllowed;
    }
    Pattern::Choice(patterns) if patterns.len() == 2 => {
      let survivor = if matches!(patterns[0], Pattern::NotAllowed) {
        Some(patterns.remove(1))
      } else if matches!(patterns[1], Pattern::NotAllowed) {
        Some(patterns.remove(0))
      } else {
        None
      };
      if let Some(survivor) = survivor {
        *pattern = survivor;
      }
    }
    _ => {}
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::builder::*;

  fn walked(pattern: Pattern) -> Pattern {
    let mut g = root(pattern);
    walk(&mut g.pattern);
    g.pattern
  }

  #[test]
  fn test_attribute_with_not_allowed_collapses() {
    assert_eq!(walked(attribute(name("id"), vec![not_allowed()])), not_allowed());
  }

  #[test]
  fn test_group_with_not_allowed_collapses() {
    assert_eq!(walked(group(vec![text(), not_allowed()])), not_allowed());
  }

  #[test]
  fn test_choice_drops_not_allowed_branch() {
    assert_eq!(walked(choice(vec![not_allowed(), text()])), text());
    assert_eq!(walked(choice(vec![text(), not_allowed()])), text());
  }

  #[test]
  fn test_collapse_cascades_upward() {
    // The inner group dies first, then the outer oneOrMore sees it.
    let pattern = one_or_more(vec![group(vec![text(), not_allowed()])]);
    assert_eq!(walked(pattern), not_allowed());
  }

  #[test]
  fn test_element_keeps_not_allowed_content() {
    let pattern = element(name("p"), vec![not_allowed()]);
    assert_eq!(walked(pattern.clone()), pattern);
  }

  #[test]
  fn test_reachability_reruns_after_collapse() {
    let mut g = root(grammar(vec![
      start(ref_to("elem__1")),
      define(
        "elem__1",
        vec![element(name("a"), vec![group(vec![not_allowed(), ref_to("elem__2")])])],
      ),
      define("elem__2", vec![element(name("b"), vec![empty()])]),
    ]));
    apply(&mut g).expect("pass");
    assert_eq!(
      g.pattern,
      grammar(vec![
        start(ref_to("elem__1")),
        define("elem__1", vec![element(name("a"), vec![not_allowed()])]),
      ])
    );
  }
}
