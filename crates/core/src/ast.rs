//! Typed AST for Relax NG grammars.
//!
//! Three disjoint node families mirror the RELAX NG data model:
//! * [`Pattern`]: terms of the pattern language that match content.
//! * [`NameClass`]: terms matching element and attribute names.
//! * [`GrammarContent`]: the `start`/`define` payload of a `grammar`.
//!
//! The tree is a strict hierarchy: every child is owned by exactly one
//! parent. `ref`/`parentRef` are non-owning, name-based references resolved
//! through the nearest enclosing grammar's define table.

use serde::{Deserialize, Serialize};

/// The `combine` attribute fusing multiple `start`/`define` siblings of the
/// same name into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Combine {
  Choice,
  Interleave,
}

/// A name class. Only literal [`NameClass::Name`] equality is interpreted
/// during validation; the other shapes are carried structurally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NameClass {
  Name(String),
  AnyName(Option<Box<NameClass>>),
  NameChoice(Box<NameClass>, Box<NameClass>),
  Except(Box<NameClass>),
}

/// A Relax NG pattern.
///
/// `ElementNamed`/`AttributeNamed` carry their name as a scalar; the first
/// simplification pass rewrites them into the name-class forms. Interior
/// nodes hold an ordered child sequence with arbitrary arity until the
/// arity pass narrows them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Pattern {
  Empty,
  Text,
  Value(String),
  Data(String),
  NotAllowed,
  Ref(String),
  ParentRef(String),
  ElementNamed { name: String, patterns: Vec<Pattern> },
  Element { name_class: NameClass, patterns: Vec<Pattern> },
  AttributeNamed { name: String, patterns: Vec<Pattern> },
  Attribute { name_class: NameClass, patterns: Vec<Pattern> },
  Group(Vec<Pattern>),
  Interleave(Vec<Pattern>),
  Choice(Vec<Pattern>),
  Optional(Vec<Pattern>),
  ZeroOrMore(Vec<Pattern>),
  OneOrMore(Vec<Pattern>),
  Mixed(Vec<Pattern>),
  Grammar(Vec<GrammarContent>),
}

/// Content of a `grammar` element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GrammarContent {
  Start(Start),
  Define(Define),
}

/// A `start` node. Holds exactly one pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Start {
  pub combine: Option<Combine>,
  pub pattern: Pattern,
}

/// A named definition. Multiple patterns are legal in full form; the arity
/// pass wraps them into a single `group`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Define {
  pub name: String,
  pub combine: Option<Combine>,
  pub patterns: Vec<Pattern>,
}

/// The grammar root. Contains exactly one pattern child; after
/// simplification that child is always a `grammar`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Root {
  pub pattern: Pattern,
}

impl Pattern {
  /// The wire-form element name of this pattern kind, used in diagnostics.
  pub fn kind_name(&self) -> &'static str {
    match self {
      Pattern::Empty => "empty",
      Pattern::Text => "text",
      Pattern::Value(_) => "value",
      Pattern::Data(_) => "data",
      Pattern::NotAllowed => "notAllowed",
      Pattern::Ref(_) => "ref",
      Pattern::ParentRef(_) => "parentRef",
      Pattern::ElementNamed { .. } | Pattern::Element { .. } => "element",
      Pattern::AttributeNamed { .. } | Pattern::Attribute { .. } => "attribute",
      Pattern::Group(_) => "group",
      Pattern::Interleave(_) => "interleave",
      Pattern::Choice(_) => "choice",
      Pattern::Optional(_) => "optional",
      Pattern::ZeroOrMore(_) => "zeroOrMore",
      Pattern::OneOrMore(_) => "oneOrMore",
      Pattern::Mixed(_) => "mixed",
      Pattern::Grammar(_) => "grammar",
    }
  }

  /// Apply `f` to every direct child pattern, including the patterns held
  /// by `start`/`define` when this node is a `grammar`.
  pub fn for_each_child_mut<F: FnMut(&mut Pattern)>(&mut self, f: &mut F) {
    match self {
      Pattern::Empty
      | Pattern::Text
      | Pattern::Value(_)
      | Pattern::Data(_)
      | Pattern::NotAllowed
      | Pattern::Ref(_)
      | Pattern::ParentRef(_) => {}
      Pattern::ElementNamed { patterns, .. }
      | Pattern::Element { patterns, .. }
      | Pattern::AttributeNamed { patterns, .. }
      | Pattern::Attribute { patterns, .. } => {
        for child in patterns {
          f(child);
        }
      }
      Pattern::Group(patterns)
      | Pattern::Interleave(patterns)
      | Pattern::Choice(patterns)
      | Pattern::Optional(patterns)
      | Pattern::ZeroOrMore(patterns)
      | Pattern::OneOrMore(patterns)
      | Pattern::Mixed(patterns) => {
        for child in patterns {
          f(child);
        }
      }
      Pattern::Grammar(contents) => {
        for content in contents {
          match content {
            GrammarContent::Start(start) => f(&mut start.pattern),
            GrammarContent::Define(define) => {
              for child in &mut define.patterns {
                f(child);
              }
            }
          }
        }
      }
    }
  }

  /// Read-only sibling of [`Pattern::for_each_child_mut`]. The callback
  /// receives references that live as long as `self`, so they may be kept.
  pub fn for_each_child<'a, F: FnMut(&'a Pattern)>(&'a self, f: &mut F) {
    match self {
      Pattern::Empty
      | Pattern::Text
      | Pattern::Value(_)
      | Pattern::Data(_)
      | Pattern::NotAllowed
      | Pattern::Ref(_)
      | Pattern::ParentRef(_) => {}
      Pattern::ElementNamed { patterns, .. }
      | Pattern::Element { patterns, .. }
      | Pattern::AttributeNamed { patterns, .. }
      | Pattern::Attribute { patterns, .. }
      | Pattern::Group(patterns)
      | Pattern::Interleave(patterns)
      | Pattern::Choice(patterns)
      | Pattern::Optional(patterns)
      | Pattern::ZeroOrMore(patterns)
      | Pattern::OneOrMore(patterns)
      | Pattern::Mixed(patterns) => {
        for child in patterns {
          f(child);
        }
      }
      Pattern::Grammar(contents) => {
        for content in contents {
          match content {
            GrammarContent::Start(start) => f(&start.pattern),
            GrammarContent::Define(define) => {
              for child in &define.patterns {
                f(child);
              }
            }
          }
        }
      }
    }
  }
}

impl Root {
  pub fn new(pattern: Pattern) -> Self {
    Self { pattern }
  }

  /// The grammar contents when the root's child is a `grammar`.
  pub fn grammar(&self) -> Option<&[GrammarContent]> {
    match &self.pattern {
      Pattern::Grammar(contents) => Some(contents),
      _ => None,
    }
  }
}
