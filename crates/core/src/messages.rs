//! The fixed vocabulary of validation diagnostics.
//!
//! Diagnostics are plain strings attached to XML nodes; tests compare them
//! by equality, so every message is built here and nowhere else.

pub const UNEXPECTED_TEXT: &str = "Unexpected text in element";
pub const NO_MATCH: &str = "Could not find matching choice";

pub fn expected_text(found: &str) -> String {
  format!("Expected text but found {found}")
}

pub fn expected_element(name: &str, found: &str) -> String {
  format!("Expected element {name} but found {found}")
}

pub fn expected_attribute(name: &str) -> String {
  format!("Expected attribute: {name}")
}

pub fn attribute_not_text(name: &str, found: &str) -> String {
  format!("Expected attribute value for {name} to be text but was {found}")
}

pub fn no_children(count: usize) -> String {
  format!("Expected no contents but found {count} children")
}

pub fn unexpected_element(name: &str) -> String {
  format!("Unexpected element: {name}")
}

pub fn unexpected_attribute(name: &str) -> String {
  format!("Unexpected attribute: {name}")
}
