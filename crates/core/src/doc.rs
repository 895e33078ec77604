//! The XML document tree consumed by the validator.
//!
//! Nodes carry their validation diagnostics in place. The problem list is
//! interior-mutable so the validator can annotate nodes while holding shared
//! references during recursive matching; the tree structure itself is never
//! mutated.

use std::cell::RefCell;
use std::collections::BTreeMap;

/// A node in an XML document tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlNode {
  kind: XmlKind,
  problems: RefCell<Vec<String>>,
}

/// The kind payload of an [`XmlNode`]. Comments and processing instructions
/// collapse into [`XmlKind::Other`]: they count as "not element / not text"
/// during matching.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum XmlKind {
  Element {
    name: String,
    attributes: BTreeMap<String, String>,
    children: Vec<XmlNode>,
  },
  Text(String),
  #[default]
  Other,
}

impl XmlNode {
  pub fn element<N, K, V, A>(name: N, attributes: A, children: Vec<XmlNode>) -> Self
  where
    N: Into<String>,
    K: Into<String>,
    V: Into<String>,
    A: IntoIterator<Item = (K, V)>,
  {
    Self {
      kind: XmlKind::Element {
        name: name.into(),
        attributes: attributes.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        children,
      },
      problems: RefCell::new(vec![]),
    }
  }

  pub fn text(value: impl Into<String>) -> Self {
    Self { kind: XmlKind::Text(value.into()), problems: RefCell::new(vec![]) }
  }

  /// A comment, processing instruction or other non-content node.
  pub fn other() -> Self {
    Self { kind: XmlKind::Other, problems: RefCell::new(vec![]) }
  }

  pub fn kind(&self) -> &XmlKind {
    &self.kind
  }

  /// The element name, when this node is an element.
  pub fn name(&self) -> Option<&str> {
    match &self.kind {
      XmlKind::Element { name, .. } => Some(name),
      _ => None,
    }
  }

  pub fn is_element(&self) -> bool {
    matches!(self.kind, XmlKind::Element { .. })
  }

  pub fn is_text(&self) -> bool {
    matches!(self.kind, XmlKind::Text(_))
  }

  pub fn children(&self) -> &[XmlNode] {
    match &self.kind {
      XmlKind::Element { children, .. } => children,
      _ => &[],
    }
  }

  pub fn attributes(&self) -> Option<&BTreeMap<String, String>> {
    match &self.kind {
      XmlKind::Element { attributes, .. } => Some(attributes),
      _ => None,
    }
  }

  /// Attach a diagnostic to this node.
  pub fn add_problem(&self, message: impl Into<String>) {
    self.problems.borrow_mut().push(message.into());
  }

  /// The diagnostics attached to this node, in insertion order.
  pub fn problems(&self) -> Vec<String> {
    self.problems.borrow().clone()
  }

  /// Gather `(node, message)` pairs in document order.
  pub fn collect_problems(&self, recursive: bool) -> Vec<(&XmlNode, String)> {
    let mut out = vec![];
    self.collect_into(recursive, &mut out);
    out
  }

  fn collect_into<'a>(&'a self, recursive: bool, out: &mut Vec<(&'a XmlNode, String)>) {
    for message in self.problems.borrow().iter() {
      out.push((self, message.clone()));
    }
    if recursive {
      for child in self.children() {
        child.collect_into(true, out);
      }
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn test_collect_in_document_order() {
    let inner = XmlNode::element("b", [] as [(&str, &str); 0], vec![]);
    inner.add_problem("second");
    let doc = XmlNode::element("a", [] as [(&str, &str); 0], vec![inner]);
    doc.add_problem("first");

    let collected: Vec<_> =
      doc.collect_problems(true).into_iter().map(|(_, m)| m).collect();
    assert_eq!(collected, ["first", "second"]);

    let shallow: Vec<_> =
      doc.collect_problems(false).into_iter().map(|(_, m)| m).collect();
    assert_eq!(shallow, ["first"]);
  }

  #[test]
  fn test_annotation_through_shared_ref() {
    let node = XmlNode::text("hello");
    let view = &node;
    view.add_problem("oops");
    assert_eq!(node.problems(), ["oops"]);
  }
}
