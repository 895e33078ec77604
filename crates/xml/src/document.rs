//! XML instance text → the validator's document tree.

use crate::XmlError;
use rng_check_core::XmlNode;
use roxmltree::{Document, Node, NodeType};

pub fn parse_document(text: &str) -> Result<XmlNode, XmlError> {
  let doc = Document::parse(text)?;
  Ok(node_from(doc.root_element()))
}

fn node_from(node: Node) -> XmlNode {
  let attributes: Vec<(String, String)> = node
    .attributes()
    .map(|attr| (attr.name().to_string(), attr.value().to_string()))
    .collect();
  let mut children = vec![];
  for child in node.children() {
    match child.node_type() {
      NodeType::Element => children.push(node_from(child)),
      NodeType::Text => {
        let value = child.text().unwrap_or_default();
        if !value.trim().is_empty() {
          children.push(XmlNode::text(value));
        }
      }
      NodeType::Comment | NodeType::PI => children.push(XmlNode::other()),
      NodeType::Root => {}
    }
  }
  XmlNode::element(node.tag_name().name(), attributes, children)
}

#[cfg(test)]
mod test {
  use super::*;
  use rng_check_core::XmlKind;

  #[test]
  fn test_parses_elements_attributes_text() {
    let doc = parse_document(r#"<p lang="en">hello <b>world</b></p>"#).expect("parses");
    assert_eq!(doc.name(), Some("p"));
    assert_eq!(
      doc.attributes().expect("element").get("lang").map(String::as_str),
      Some("en")
    );
    let children = doc.children();
    assert_eq!(children.len(), 2);
    assert!(children[0].is_text());
    assert_eq!(children[1].name(), Some("b"));
  }

  #[test]
  fn test_strips_whitespace_only_text() {
    let doc = parse_document("<l>\n  <i/>\n  <i/>\n</l>").expect("parses");
    assert_eq!(doc.children().len(), 2);
    assert!(doc.children().iter().all(XmlNode::is_element));
  }

  #[test]
  fn test_comments_become_other_nodes() {
    let doc = parse_document("<p><!-- note --></p>").expect("parses");
    assert_eq!(doc.children().len(), 1);
    assert_eq!(doc.children()[0].kind(), &XmlKind::Other);
  }
}
