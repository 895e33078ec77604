//! Validation of an XML document tree against a Relax NG grammar.
//!
//! The matcher is a direct recursive function over a pattern list and a
//! context of remaining children and attributes. Backtracking is a pure
//! try-in-order: every alternative is evaluated against the same input
//! context and the first plausible outcome is committed. There are no
//! continuations and no memoization; recursive grammars terminate because
//! every cycle passes through an element, which consumes an input node.
//!
//! "Plausible" means the shape could be matched. It does not mean
//! defect-free: a plausible subtree may still carry diagnostics, and
//! interior element diagnostics never propagate upward, so a single run
//! surfaces as many distinct problems as possible.

use crate::ast::{GrammarContent, NameClass, Pattern, Root};
use crate::doc::{XmlKind, XmlNode};
use crate::messages;

use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Errors aborting a validation run. Unlike document diagnostics these are
/// raised, not annotated: they indicate a broken grammar or an unsupported
/// construct, never a broken document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidateError {
  #[error("Referencing unknown definition: {0}")]
  UnknownDefinition(String),
  #[error("interleave matching is not implemented")]
  Interleave,
  #[error("{0} patterns are not supported during validation")]
  Unsupported(&'static str),
  #[error("name classes other than literal names are not supported during validation")]
  NameClass,
}

/// Matches XML nodes against the patterns of one grammar.
///
/// The define table and start pattern are cached at construction. When the
/// root's child is not a `grammar` the pattern itself is the start and the
/// table is empty.
pub struct Validator<'g> {
  start: &'g Pattern,
  defines: HashMap<&'g str, &'g [Pattern]>,
}

/// Remaining children and attributes of the element being matched.
#[derive(Clone)]
struct Context<'t> {
  children: &'t [XmlNode],
  attributes: BTreeMap<&'t str, &'t str>,
}

impl<'t> Context<'t> {
  fn new(children: &'t [XmlNode], attributes: &'t BTreeMap<String, String>) -> Self {
    Self {
      children,
      attributes: attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect(),
    }
  }

  fn consume_child(&self) -> Self {
    Self { children: &self.children[1..], attributes: self.attributes.clone() }
  }

  fn size(&self) -> usize {
    self.children.len() + self.attributes.len()
  }
}

struct Outcome<'t> {
  ok: bool,
  problems: Vec<String>,
  rest: Context<'t>,
}

/// Short description of the head node for diagnostics.
fn found(node: Option<&XmlNode>) -> &str {
  match node.map(XmlNode::kind) {
    None => "nothing",
    Some(XmlKind::Element { name, .. }) => name,
    Some(XmlKind::Text(_)) => "text",
    Some(XmlKind::Other) => "node",
  }
}

/// Diagnostics for whatever the match left unconsumed.
fn leftover(rest: &Context) -> Vec<String> {
  let mut out = vec![];
  for child in rest.children {
    match child.kind() {
      XmlKind::Element { name, .. } => out.push(messages::unexpected_element(name)),
      XmlKind::Text(_) => out.push(messages::UNEXPECTED_TEXT.to_string()),
      XmlKind::Other => {}
    }
  }
  for name in rest.attributes.keys() {
    out.push(messages::unexpected_attribute(name));
  }
  out
}

impl<'g> Validator<'g> {
  pub fn new(root: &'g Root) -> Self {
    let mut start = &root.pattern;
    let mut defines = HashMap::new();
    if let Pattern::Grammar(contents) = &root.pattern {
      for content in contents {
        match content {
          GrammarContent::Start(s) => start = &s.pattern,
          GrammarContent::Define(d) => {
            defines.insert(d.name.as_str(), d.patterns.as_slice());
          }
        }
      }
    }
    Self { start, defines }
  }

  /// Match the document root against the start pattern. Returns the
  /// plausibility verdict; diagnostics land on the tree either way.
  pub fn validate(&self, document: &XmlNode) -> Result<bool, ValidateError> {
    self.validate_node(document, self.start)
  }

  /// Match a single target node against a single pattern, annotating the
  /// target and its subtree.
  pub fn validate_node(
    &self,
    target: &XmlNode,
    pattern: &'g Pattern,
  ) -> Result<bool, ValidateError> {
    let empty_attributes = BTreeMap::new();
    let ctx =
      Context { children: std::slice::from_ref(target), attributes: empty_attributes };
    let out = self.match_list(ctx, &[pattern])?;
    for problem in &out.problems {
      target.add_problem(problem.clone());
    }
    let leftovers = leftover(&out.rest);
    let verdict = out.ok && leftovers.is_empty();
    for problem in leftovers {
      target.add_problem(problem);
    }
    Ok(verdict)
  }

  fn match_list<'t>(
    &self,
    ctx: Context<'t>,
    patterns: &[&'g Pattern],
  ) -> Result<Outcome<'t>, ValidateError> {
    let Some((&head, rest)) = patterns.split_first() else {
      return Ok(Outcome { ok: true, problems: vec![], rest: ctx });
    };
    match head {
      Pattern::Empty => {
        if ctx.children.is_empty() {
          self.match_list(ctx, rest)
        } else {
          self.report(messages::no_children(ctx.children.len()), ctx, rest)
        }
      }
      // Value and data content is accepted shape-only: any text child fits.
      Pattern::Text | Pattern::Value(_) | Pattern::Data(_) => match ctx.children.first() {
        Some(child) if child.is_text() => self.match_list(ctx.consume_child(), rest),
        head_child => self.report(messages::expected_text(found(head_child)), ctx, rest),
      },
      // Matches nothing, silently; an enclosing choice reports the miss.
      Pattern::NotAllowed => Ok(Outcome { ok: false, problems: vec![], rest: ctx }),
      Pattern::Ref(name) => {
        let spliced = self
          .defines
          .get(name.as_str())
          .ok_or_else(|| ValidateError::UnknownDefinition(name.clone()))?;
        let mut chained: Vec<&Pattern> = spliced.iter().collect();
        chained.extend_from_slice(rest);
        self.match_list(ctx, &chained)
      }
      Pattern::Group(inner) => {
        let mut chained: Vec<&Pattern> = inner.iter().collect();
        chained.extend_from_slice(rest);
        self.match_list(ctx, &chained)
      }
      Pattern::Choice(alternatives) => {
        for alternative in alternatives {
          let mut chained: Vec<&Pattern> = vec![alternative];
          chained.extend_from_slice(rest);
          let out = self.match_list(ctx.clone(), &chained)?;
          if out.ok {
            return Ok(out);
          }
        }
        // Branch diagnostics are not merged; one message for the whole miss.
        Ok(Outcome {
          ok: false,
          problems: vec![messages::NO_MATCH.to_string()],
          rest: ctx,
        })
      }
      Pattern::Optional(inner) => {
        let mut chained: Vec<&Pattern> = inner.iter().collect();
        chained.extend_from_slice(rest);
        let out = self.match_list(ctx.clone(), &chained)?;
        if out.ok {
          Ok(out)
        } else {
          self.match_list(ctx, rest)
        }
      }
      Pattern::ZeroOrMore(inner) => self.match_repeat(ctx, head, inner, rest, false),
      Pattern::OneOrMore(inner) => self.match_repeat(ctx, head, inner, rest, true),
      Pattern::ElementNamed { name, patterns } => {
        self.match_element(ctx, Some(name.as_str()), patterns, rest)
      }
      Pattern::Element { name_class, patterns } => match name_class {
        NameClass::Name(name) => self.match_element(ctx, Some(name.as_str()), patterns, rest),
        NameClass::AnyName(None) => self.match_element(ctx, None, patterns, rest),
        _ => Err(ValidateError::NameClass),
      },
      Pattern::AttributeNamed { name, patterns } => {
        self.match_attribute(ctx, name, patterns.first(), rest)
      }
      Pattern::Attribute { name_class, patterns } => match name_class {
        NameClass::Name(name) => self.match_attribute(ctx, name, patterns.first(), rest),
        _ => Err(ValidateError::NameClass),
      },
      Pattern::Interleave(_) => Err(ValidateError::Interleave),
      Pattern::Mixed(_) => Err(ValidateError::Unsupported("mixed")),
      Pattern::ParentRef(_) => Err(ValidateError::Unsupported("parentRef")),
      Pattern::Grammar(_) => Err(ValidateError::Unsupported("grammar")),
    }
  }

  /// Report a mismatch at this level and keep matching the remaining
  /// patterns on the unchanged context. The chain is no longer plausible,
  /// but later patterns still get a chance to surface their own problems.
  fn report<'t>(
    &self,
    message: String,
    ctx: Context<'t>,
    rest: &[&'g Pattern],
  ) -> Result<Outcome<'t>, ValidateError> {
    let mut out = self.match_list(ctx, rest)?;
    out.problems.insert(0, message);
    out.ok = false;
    Ok(out)
  }

  fn match_element<'t>(
    &self,
    ctx: Context<'t>,
    name: Option<&str>,
    inner: &'g [Pattern],
    rest: &[&'g Pattern],
  ) -> Result<Outcome<'t>, ValidateError> {
    let head = ctx.children.first();
    let matched = head.and_then(|child| match child.kind() {
      XmlKind::Element { name: child_name, attributes, children }
        if name.is_none_or(|want| want == child_name) =>
      {
        Some((child, attributes, children))
      }
      _ => None,
    });
    let Some((child, attributes, children)) = matched else {
      let want = name.unwrap_or("*");
      return self.report(messages::expected_element(want, found(head)), ctx, rest);
    };

    // The shape matched, so the child is committed: its interior
    // diagnostics are written to it regardless of overall success, even
    // inside a choice trial that is later discarded.
    let inner_patterns: Vec<&Pattern> = inner.iter().collect();
    let out = self.match_list(Context::new(children, attributes), &inner_patterns)?;
    for problem in out.problems {
      child.add_problem(problem);
    }
    for problem in leftover(&out.rest) {
      child.add_problem(problem);
    }
    self.match_list(ctx.consume_child(), rest)
  }

  fn match_attribute<'t>(
    &self,
    mut ctx: Context<'t>,
    name: &str,
    content: Option<&'g Pattern>,
    rest: &[&'g Pattern],
  ) -> Result<Outcome<'t>, ValidateError> {
    let Some(value) = ctx.attributes.remove(name) else {
      return self.report(messages::expected_attribute(name), ctx, rest);
    };
    let mut problems = vec![];
    self.check_attribute_value(name, value, content, &mut problems)?;
    let mut out = self.match_list(ctx, rest)?;
    if !problems.is_empty() {
      problems.extend(out.problems);
      out.problems = problems;
      out.ok = false;
    }
    Ok(out)
  }

  /// The attribute sub-matcher. `text` accepts any string, `ref`
  /// dereferences a single-pattern define, `value`/`data`/`choice` are
  /// accepted shape-only; anything else cannot match a string.
  fn check_attribute_value(
    &self,
    name: &str,
    value: &str,
    content: Option<&Pattern>,
    problems: &mut Vec<String>,
  ) -> Result<(), ValidateError> {
    match content {
      None
      | Some(Pattern::Text | Pattern::Value(_) | Pattern::Data(_) | Pattern::Choice(_)) => {
        Ok(())
      }
      Some(Pattern::Ref(target)) => {
        let patterns = self
          .defines
          .get(target.as_str())
          .ok_or_else(|| ValidateError::UnknownDefinition(target.clone()))?;
        match patterns.first() {
          Some(pattern) => self.check_attribute_value(name, value, Some(pattern), problems),
          None => Ok(()),
        }
      }
      Some(other) => {
        problems.push(messages::attribute_not_text(name, other.kind_name()));
        Ok(())
      }
    }
  }

  /// Shared engine for `zeroOrMore` (`required = false`) and `oneOrMore`.
  /// Greedy: after a consuming iteration, another round including the rest
  /// is tried first. Iteration never recurses on a non-advancing match.
  fn match_repeat<'t>(
    &self,
    ctx: Context<'t>,
    head: &'g Pattern,
    inner: &'g [Pattern],
    rest: &[&'g Pattern],
    required: bool,
  ) -> Result<Outcome<'t>, ValidateError> {
    let inner_patterns: Vec<&Pattern> = inner.iter().collect();
    let first = self.match_list(ctx.clone(), &inner_patterns)?;
    if !first.ok {
      if required {
        // The mandatory iteration failed: keep its diagnostics and let the
        // remaining patterns consume what they can.
        let tail = self.match_list(ctx, rest)?;
        let mut problems = first.problems;
        problems.extend(tail.problems);
        return Ok(Outcome { ok: false, problems, rest: tail.rest });
      }
      return self.match_list(ctx, rest);
    }
    if first.rest.size() < ctx.size() {
      let mut chained: Vec<&Pattern> = vec![head];
      chained.extend_from_slice(rest);
      let more = self.match_list(first.rest.clone(), &chained)?;
      if more.ok {
        let mut problems = first.problems;
        problems.extend(more.problems);
        return Ok(Outcome { ok: true, problems, rest: more.rest });
      }
    }
    let tail = self.match_list(first.rest, rest)?;
    if !required && !tail.ok {
      // The whole chain failed; retry without any iteration at all.
      return self.match_list(ctx, rest);
    }
    let mut problems = first.problems;
    problems.extend(tail.problems);
    Ok(Outcome { ok: tail.ok, problems, rest: tail.rest })
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::builder::*;

  fn elem(name: &str) -> XmlNode {
    XmlNode::element(name, [] as [(&str, &str); 0], vec![])
  }

  fn elem_with(name: &str, attributes: &[(&str, &str)], children: Vec<XmlNode>) -> XmlNode {
    XmlNode::element(name, attributes.iter().copied(), children)
  }

  fn problems_of(node: &XmlNode) -> Vec<String> {
    node.collect_problems(true).into_iter().map(|(_, m)| m).collect()
  }

  fn check(target: &XmlNode, pattern: &Pattern) -> bool {
    let grammar_root = root(empty());
    let validator = Validator::new(&grammar_root);
    validator.validate_node(target, pattern).expect("validation should run")
  }

  #[test]
  fn test_element_name_agreement() {
    let target = elem("p");
    let pattern = element_named("p", vec![]);
    assert!(check(&target, &pattern));
    assert_eq!(problems_of(&target), Vec::<String>::new());

    let target = elem("p");
    let pattern = element_named("b", vec![]);
    assert!(!check(&target, &pattern));
    assert_eq!(
      problems_of(&target),
      ["Expected element b but found p", "Unexpected element: p"]
    );
  }

  #[test]
  fn test_implicit_empty_rejects_text() {
    let target = elem_with("p", &[], vec![XmlNode::text("hi")]);
    let pattern = element_named("p", vec![]);
    assert!(check(&target, &pattern));
    assert_eq!(
      problems_of(&target),
      ["Expected no contents but found 1 children", "Unexpected text in element"]
    );
  }

  // Scenario: choice picks the branch whose element name matches, and the
  // committed branch's missing attribute is the only diagnostic.
  #[test]
  fn test_choice_commits_matching_branch() {
    let target = elem("p");
    let pattern = choice(vec![
      element_named("b", vec![]),
      element_named("p", vec![attribute_named("foo", vec![])]),
    ]);
    assert!(check(&target, &pattern));
    assert_eq!(problems_of(&target), ["Expected attribute: foo"]);
  }

  // Scenario: greedy oneOrMore stops at the first non-matching child and
  // hands the rest over.
  #[test]
  fn test_one_or_more_greedy_then_rest() {
    let target = elem_with(
      "sec",
      &[],
      vec![elem("p"), elem("p"), elem("b")],
    );
    let pattern = element_named(
      "sec",
      vec![one_or_more(vec![element_named("p", vec![])]), element_named("b", vec![])],
    );
    assert!(check(&target, &pattern));
    assert_eq!(problems_of(&target), Vec::<String>::new());
  }

  // Scenario: the mandatory first iteration fails, its diagnostic is kept,
  // and the rest still consumes the child.
  #[test]
  fn test_one_or_more_mandatory_failure_is_reported() {
    let target = elem_with("sec", &[], vec![elem("b")]);
    let pattern = element_named(
      "sec",
      vec![one_or_more(vec![element_named("p", vec![])]), element_named("b", vec![])],
    );
    assert!(check(&target, &pattern));
    assert_eq!(problems_of(&target), ["Expected element p but found b"]);
  }

  // Scenario: attribute bag matching is order-independent and choice works
  // over attributes.
  #[test]
  fn test_attribute_choice() {
    let target = elem_with("p", &[("bar", "x")], vec![]);
    let pattern = element_named(
      "p",
      vec![choice(vec![
        attribute_named("foo", vec![text()]),
        attribute_named("bar", vec![text()]),
      ])],
    );
    assert!(check(&target, &pattern));
    assert_eq!(problems_of(&target), Vec::<String>::new());
  }

  #[test]
  fn test_choice_with_no_match_reports_once() {
    let target = elem("i");
    let pattern = choice(vec![element_named("b", vec![]), element_named("p", vec![])]);
    assert!(!check(&target, &pattern));
    assert_eq!(
      problems_of(&target),
      ["Could not find matching choice", "Unexpected element: i"]
    );
  }

  #[test]
  fn test_optional_absorption_drops_branch_problems() {
    let target = elem_with("sec", &[], vec![elem("b")]);
    let pattern = element_named(
      "sec",
      vec![
        optional(vec![attribute_named("lang", vec![])]),
        element_named("b", vec![]),
      ],
    );
    assert!(check(&target, &pattern));
    assert_eq!(problems_of(&target), Vec::<String>::new());
  }

  #[test]
  fn test_unexpected_attribute_is_reported() {
    let target = elem_with("p", &[("stray", "1")], vec![]);
    let pattern = element_named("p", vec![]);
    assert!(check(&target, &pattern));
    assert_eq!(problems_of(&target), ["Unexpected attribute: stray"]);
  }

  #[test]
  fn test_zero_or_more_accepts_none_and_many() {
    let pattern = element_named("l", vec![zero_or_more(vec![element_named("i", vec![])])]);
    let none = elem("l");
    assert!(check(&none, &pattern));
    assert_eq!(problems_of(&none), Vec::<String>::new());

    let many = elem_with("l", &[], vec![elem("i"), elem("i"), elem("i")]);
    assert!(check(&many, &pattern));
    assert_eq!(problems_of(&many), Vec::<String>::new());
  }

  #[test]
  fn test_text_pattern_consumes_any_text() {
    let target = elem_with("p", &[], vec![XmlNode::text("hello")]);
    let pattern = element_named("p", vec![text()]);
    assert!(check(&target, &pattern));
    assert_eq!(problems_of(&target), Vec::<String>::new());
  }

  #[test]
  fn test_missing_text_is_reported() {
    let target = elem("p");
    let pattern = element_named("p", vec![text()]);
    assert!(check(&target, &pattern));
    assert_eq!(problems_of(&target), ["Expected text but found nothing"]);
  }

  #[test]
  fn test_attribute_value_shape_mismatch() {
    let target = elem_with("p", &[("foo", "x")], vec![]);
    let pattern =
      element_named("p", vec![attribute_named("foo", vec![element_named("b", vec![])])]);
    assert!(check(&target, &pattern));
    assert_eq!(
      problems_of(&target),
      ["Expected attribute value for foo to be text but was element"]
    );
  }

  #[test]
  fn test_ref_splices_define() {
    let grammar_root = root(grammar(vec![
      start(element_named("doc", vec![ref_to("para")])),
      define("para", vec![element_named("p", vec![])]),
    ]));
    let validator = Validator::new(&grammar_root);
    let target = elem_with("doc", &[], vec![elem("p")]);
    assert!(validator.validate(&target).expect("runs"));
    assert_eq!(problems_of(&target), Vec::<String>::new());
  }

  #[test]
  fn test_unknown_ref_is_fatal() {
    let grammar_root = root(grammar(vec![start(ref_to("ghost"))]));
    let validator = Validator::new(&grammar_root);
    let target = elem("doc");
    assert_eq!(
      validator.validate(&target),
      Err(ValidateError::UnknownDefinition("ghost".into()))
    );
  }

  #[test]
  fn test_interleave_is_unimplemented() {
    let target = elem("p");
    let pattern = element_named("p", vec![interleave(vec![text(), text()])]);
    let grammar_root = root(empty());
    let validator = Validator::new(&grammar_root);
    assert_eq!(
      validator.validate_node(&target, &pattern),
      Err(ValidateError::Interleave)
    );
  }

  #[test]
  fn test_simplified_element_form_matches_like_named() {
    let target = elem("p");
    let pattern = element(name("p"), vec![]);
    assert!(check(&target, &pattern));
    assert_eq!(problems_of(&target), Vec::<String>::new());
  }

  #[test]
  fn test_interior_problems_keep_parent_plausible() {
    // The inner element's name matches, so its own missing-text problem is
    // annotated on it while the document stays plausible.
    let target = elem_with("doc", &[], vec![elem("p")]);
    let pattern = element_named("doc", vec![element_named("p", vec![text()])]);
    assert!(check(&target, &pattern));
    let collected = target.collect_problems(true);
    assert_eq!(collected.len(), 1);
    assert_eq!(collected[0].1, "Expected text but found nothing");
    assert_eq!(collected[0].0.name(), Some("p"));
  }
}
