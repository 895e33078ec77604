//! RNG wire form → full-syntax AST.
//!
//! Dispatch is on the local element name; whitespace-only text and
//! `documentation` elements are stripped along the way. Constructs outside
//! the supported subset are rejected up front.

use crate::XmlError;
use rng_check_core::ast::{Combine, GrammarContent, NameClass, Pattern, Root};
use rng_check_core::builder;
use roxmltree::{Document, Node};

/// Wire constructs the pipeline refuses to model.
const UNSUPPORTED: &[&str] = &["list", "externalRef", "include", "div", "nsName", "param"];

pub fn parse_grammar(text: &str) -> Result<Root, XmlError> {
  let doc = Document::parse(text)?;
  Ok(builder::root(pattern_from(doc.root_element())?))
}

/// Child elements that carry content, with annotation noise dropped.
fn content_children<'a, 'input>(
  node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
  node
    .children()
    .filter(|child| child.is_element() && child.tag_name().name() != "documentation")
}

fn patterns_from(node: Node) -> Result<Vec<Pattern>, XmlError> {
  content_children(node).map(pattern_from).collect()
}

fn required_attribute(node: Node, attribute: &str) -> Result<String, XmlError> {
  node.attribute(attribute).map(str::to_string).ok_or_else(|| XmlError::MissingAttribute {
    element: node.tag_name().name().to_string(),
    attribute: attribute.to_string(),
  })
}

fn pattern_from(node: Node) -> Result<Pattern, XmlError> {
  match node.tag_name().name() {
    "empty" => Ok(builder::empty()),
    "text" => Ok(builder::text()),
    "notAllowed" => Ok(builder::not_allowed()),
    "value" => Ok(builder::value(node.text().unwrap_or_default())),
    // Facets are out of scope, so any content inside <data> is refused
    // rather than silently dropped.
    "data" => match content_children(node).next() {
      None => Ok(builder::data(required_attribute(node, "type")?)),
      Some(child) => {
        let found = child.tag_name().name().to_string();
        if UNSUPPORTED.contains(&found.as_str()) {
          Err(XmlError::Unsupported(found))
        } else {
          Err(XmlError::UnknownElement(found))
        }
      }
    },
    "ref" => Ok(builder::ref_to(required_attribute(node, "name")?)),
    "parentRef" => Ok(builder::parent_ref(required_attribute(node, "name")?)),
    "element" => match node.attribute("name") {
      Some(name) => Ok(builder::element_named(name, patterns_from(node)?)),
      None => {
        let (name_class, patterns) = name_classed_content(node)?;
        Ok(builder::element(name_class, patterns))
      }
    },
    "attribute" => match node.attribute("name") {
      Some(name) => Ok(builder::attribute_named(name, patterns_from(node)?)),
      None => {
        let (name_class, patterns) = name_classed_content(node)?;
        Ok(builder::attribute(name_class, patterns))
      }
    },
    "group" => Ok(builder::group(patterns_from(node)?)),
    "interleave" => Ok(builder::interleave(patterns_from(node)?)),
    "choice" => Ok(builder::choice(patterns_from(node)?)),
    "optional" => Ok(builder::optional(patterns_from(node)?)),
    "zeroOrMore" => Ok(builder::zero_or_more(patterns_from(node)?)),
    "oneOrMore" => Ok(builder::one_or_more(patterns_from(node)?)),
    "mixed" => Ok(builder::mixed(patterns_from(node)?)),
    "grammar" => grammar_from(node),
    other if UNSUPPORTED.contains(&other) => Err(XmlError::Unsupported(other.to_string())),
    other => Err(XmlError::UnknownElement(other.to_string())),
  }
}

/// `element`/`attribute` without a `name` attribute: the first child is the
/// name class, the rest is content.
fn name_classed_content(node: Node) -> Result<(NameClass, Vec<Pattern>), XmlError> {
  let mut children = content_children(node);
  let head = children
    .next()
    .ok_or_else(|| XmlError::MissingNameClass(node.tag_name().name().to_string()))?;
  let name_class = name_class_from(head)?;
  let patterns = children.map(pattern_from).collect::<Result<_, _>>()?;
  Ok((name_class, patterns))
}

fn name_class_from(node: Node) -> Result<NameClass, XmlError> {
  match node.tag_name().name() {
    "name" => Ok(builder::name(node.text().unwrap_or_default().trim())),
    "anyName" => match content_children(node).next() {
      None => Ok(builder::any_name()),
      Some(except) if except.tag_name().name() == "except" => {
        Ok(builder::any_name_except(name_class_group(except)?))
      }
      Some(other) => Err(XmlError::UnknownElement(other.tag_name().name().to_string())),
    },
    "choice" => name_class_group(node),
    other if UNSUPPORTED.contains(&other) => Err(XmlError::Unsupported(other.to_string())),
    other => Err(XmlError::UnknownElement(other.to_string())),
  }
}

/// One or more name classes; several fold left into a `nameChoice`.
fn name_class_group(node: Node) -> Result<NameClass, XmlError> {
  let mut classes = content_children(node).map(name_class_from);
  let first = classes
    .next()
    .ok_or_else(|| XmlError::MissingNameClass(node.tag_name().name().to_string()))??;
  classes.try_fold(first, |acc, next| Ok(builder::name_choice(acc, next?)))
}

fn grammar_from(node: Node) -> Result<Pattern, XmlError> {
  let mut contents: Vec<GrammarContent> = vec![];
  for child in content_children(node) {
    match child.tag_name().name() {
      "start" => {
        let combine = combine_from(child)?;
        let mut patterns = patterns_from(child)?;
        if patterns.len() != 1 {
          return Err(XmlError::BadStart);
        }
        let pattern = patterns.pop().unwrap_or(Pattern::Empty);
        contents.push(match combine {
          Some(combine) => builder::start_combine(combine, pattern),
          None => builder::start(pattern),
        });
      }
      "define" => {
        let name = required_attribute(child, "name")?;
        let combine = combine_from(child)?;
        let patterns = patterns_from(child)?;
        contents.push(match combine {
          Some(combine) => builder::define_combine(name, combine, patterns),
          None => builder::define(name, patterns),
        });
      }
      other if UNSUPPORTED.contains(&other) => {
        return Err(XmlError::Unsupported(other.to_string()))
      }
      other => return Err(XmlError::UnknownElement(other.to_string())),
    }
  }
  Ok(builder::grammar(contents))
}

fn combine_from(node: Node) -> Result<Option<Combine>, XmlError> {
  match node.attribute("combine") {
    None => Ok(None),
    Some("choice") => Ok(Some(Combine::Choice)),
    Some("interleave") => Ok(Some(Combine::Interleave)),
    Some(other) => Err(XmlError::BadCombine(other.to_string())),
  }
}
