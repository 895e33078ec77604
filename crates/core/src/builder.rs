//! Plain constructors for the full-syntax AST.
//!
//! These enforce the syntactic defaults of the wire form: an `element` with
//! no content patterns carries an implicit `empty`, an `attribute` with only
//! a name carries an implicit `text`. The XML adapter and the test suites
//! both build trees through this module.

use crate::ast::{Combine, Define, GrammarContent, NameClass, Pattern, Root, Start};

pub fn empty() -> Pattern {
  Pattern::Empty
}

pub fn text() -> Pattern {
  Pattern::Text
}

pub fn value(literal: impl Into<String>) -> Pattern {
  Pattern::Value(literal.into())
}

pub fn data(data_type: impl Into<String>) -> Pattern {
  Pattern::Data(data_type.into())
}

pub fn not_allowed() -> Pattern {
  Pattern::NotAllowed
}

pub fn ref_to(name: impl Into<String>) -> Pattern {
  Pattern::Ref(name.into())
}

pub fn parent_ref(name: impl Into<String>) -> Pattern {
  Pattern::ParentRef(name.into())
}

/// `element` with a scalar name. Appends `empty` when no content is given.
pub fn element_named(name: impl Into<String>, mut patterns: Vec<Pattern>) -> Pattern {
  if patterns.is_empty() {
    patterns.push(Pattern::Empty);
  }
  Pattern::ElementNamed { name: name.into(), patterns }
}

/// `element` with an explicit name class. Appends `empty` when no content
/// is given.
pub fn element(name_class: NameClass, mut patterns: Vec<Pattern>) -> Pattern {
  if patterns.is_empty() {
    patterns.push(Pattern::Empty);
  }
  Pattern::Element { name_class, patterns }
}

/// `attribute` with a scalar name. Appends `text` when no content is given.
pub fn attribute_named(name: impl Into<String>, mut patterns: Vec<Pattern>) -> Pattern {
  if patterns.is_empty() {
    patterns.push(Pattern::Text);
  }
  Pattern::AttributeNamed { name: name.into(), patterns }
}

/// `attribute` with an explicit name class. Appends `text` when no content
/// is given.
pub fn attribute(name_class: NameClass, mut patterns: Vec<Pattern>) -> Pattern {
  if patterns.is_empty() {
    patterns.push(Pattern::Text);
  }
  Pattern::Attribute { name_class, patterns }
}

pub fn group(patterns: Vec<Pattern>) -> Pattern {
  Pattern::Group(patterns)
}

pub fn interleave(patterns: Vec<Pattern>) -> Pattern {
  Pattern::Interleave(patterns)
}

pub fn choice(patterns: Vec<Pattern>) -> Pattern {
  Pattern::Choice(patterns)
}

pub fn optional(patterns: Vec<Pattern>) -> Pattern {
  Pattern::Optional(patterns)
}

pub fn zero_or_more(patterns: Vec<Pattern>) -> Pattern {
  Pattern::ZeroOrMore(patterns)
}

pub fn one_or_more(patterns: Vec<Pattern>) -> Pattern {
  Pattern::OneOrMore(patterns)
}

pub fn mixed(patterns: Vec<Pattern>) -> Pattern {
  Pattern::Mixed(patterns)
}

pub fn grammar(contents: Vec<GrammarContent>) -> Pattern {
  Pattern::Grammar(contents)
}

pub fn start(pattern: Pattern) -> GrammarContent {
  GrammarContent::Start(Start { combine: None, pattern })
}

pub fn start_combine(combine: Combine, pattern: Pattern) -> GrammarContent {
  GrammarContent::Start(Start { combine: Some(combine), pattern })
}

pub fn define(name: impl Into<String>, patterns: Vec<Pattern>) -> GrammarContent {
  GrammarContent::Define(Define { name: name.into(), combine: None, patterns })
}

pub fn define_combine(
  name: impl Into<String>,
  combine: Combine,
  patterns: Vec<Pattern>,
) -> GrammarContent {
  GrammarContent::Define(Define { name: name.into(), combine: Some(combine), patterns })
}

pub fn root(pattern: Pattern) -> Root {
  Root::new(pattern)
}

pub fn name(literal: impl Into<String>) -> NameClass {
  NameClass::Name(literal.into())
}

pub fn any_name() -> NameClass {
  NameClass::AnyName(None)
}

/// `anyName` with an `except` clause; the exclusion is wrapped in its own
/// `except` node, mirroring the wire form.
pub fn any_name_except(except: NameClass) -> NameClass {
  NameClass::AnyName(Some(Box::new(NameClass::Except(Box::new(except)))))
}

pub fn name_choice(left: NameClass, right: NameClass) -> NameClass {
  NameClass::NameChoice(Box::new(left), Box::new(right))
}
