//! Pass 1: lift scalar names into name-class children.
//!
//! `elementNamed(n, P*)` becomes `element(name(n), P*)` and
//! `attributeNamed(n, P*)` becomes `attribute(name(n), P*)`, so later passes
//! only deal with the name-class forms.

use crate::ast::{NameClass, Pattern, Root};
use std::mem;

pub(crate) fn apply(root: &mut Root) {
  lift(&mut root.pattern);
}

fn lift(pattern: &mut Pattern) {
  match pattern {
    Pattern::ElementNamed { name, patterns } => {
      *pattern = Pattern::Element {
        name_class: NameClass::Name(mem::take(name)),
        patterns: mem::take(patterns),
      };
    }
    Pattern::AttributeNamed { name, patterns } => {
      *pattern = Pattern::Attribute {
        name_class: NameClass::Name(mem::take(name)),
        patterns: mem::take(patterns),
      };
    }
    _ => {}
  }
  pattern.for_each_child_mut(&mut lift);
}
