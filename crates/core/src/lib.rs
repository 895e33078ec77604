/*!
This crate is the core library for rng-check.

It models Relax NG grammars as a typed AST, reduces full-syntax grammars to
the simple form of §4 of the RELAX NG specification (2001-12-03), and
validates XML document trees against a grammar, annotating problem nodes in
place.

The usual flow: build or parse a [`Root`], run [`simplify`] over it, assert
[`is_simple`], then hand it to a [`Validator`] together with a document
tree and read the diagnostics back with [`XmlNode::collect_problems`].
*/

pub mod ast;
pub mod builder;
pub mod check;
pub mod doc;
pub mod messages;
pub mod simplify;
pub mod validate;

pub use ast::{Combine, Define, GrammarContent, NameClass, Pattern, Root, Start};
pub use check::is_simple;
pub use doc::{XmlKind, XmlNode};
pub use simplify::{simplify, SimplifyError};
pub use validate::{ValidateError, Validator};

#[cfg(test)]
mod test {
  use super::*;
  use crate::builder::*;

  fn problems_of(node: &XmlNode) -> Vec<String> {
    node.collect_problems(true).into_iter().map(|(_, m)| m).collect()
  }

  // Simplify a grammar, certify it, then validate a document against the
  // simplified form end to end.
  #[test]
  fn test_simplify_then_validate() {
    let mut grammar_root = root(grammar(vec![
      start(ref_to("doc")),
      define(
        "doc",
        vec![element_named(
          "doc",
          vec![
            optional(vec![attribute_named("lang", vec![])]),
            zero_or_more(vec![element_named("p", vec![text()])]),
          ],
        )],
      ),
    ]));
    simplify(&mut grammar_root).expect("simplifies");
    assert!(is_simple(&grammar_root));

    let document = XmlNode::element(
      "doc",
      [("lang", "en")],
      vec![
        XmlNode::element("p", [] as [(&str, &str); 0], vec![XmlNode::text("one")]),
        XmlNode::element("p", [] as [(&str, &str); 0], vec![XmlNode::text("two")]),
      ],
    );
    let validator = Validator::new(&grammar_root);
    assert!(validator.validate(&document).expect("validation runs"));
    assert_eq!(problems_of(&document), Vec::<String>::new());
  }

  #[test]
  fn test_validation_diagnostics_survive_simplification() {
    let mut grammar_root = root(grammar(vec![
      start(ref_to("doc")),
      define(
        "doc",
        vec![element_named("doc", vec![one_or_more(vec![element_named("p", vec![])])])],
      ),
    ]));
    simplify(&mut grammar_root).expect("simplifies");

    let document = XmlNode::element(
      "doc",
      [] as [(&str, &str); 0],
      vec![XmlNode::element("q", [] as [(&str, &str); 0], vec![])],
    );
    let validator = Validator::new(&grammar_root);
    validator.validate(&document).expect("validation runs");
    assert!(!problems_of(&document).is_empty());
  }
}
