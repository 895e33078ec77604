//! Pass 5: reduce to a single top-level grammar.
//!
//! A non-grammar root is first wrapped as `grammar(start(P))`. Nested
//! grammars are then flattened into the top one: conflicting define names
//! are renamed with `__k` suffixes, every `ref`/`parentRef` is rewritten
//! against the substitution of the grammar it resolves to, nested defines
//! are hoisted, and each nested grammar node is replaced by its start's
//! payload. `parentRef` always becomes `ref`.
//!
//! Resolution carries the ancestor grammar scopes as an explicit stack
//! rather than parent pointers: a `ref` resolves in the nearest enclosing
//! scope, a `parentRef` skips one scope first.

use crate::ast::{Define, GrammarContent, Pattern, Root, Start};
use crate::simplify::{fresh_name, SimplifyError};

use std::collections::{HashMap, HashSet};
use std::mem;

pub(crate) fn apply(root: &mut Root) -> Result<(), SimplifyError> {
  if !matches!(root.pattern, Pattern::Grammar(_)) {
    let payload = mem::replace(&mut root.pattern, Pattern::Empty);
    root.pattern =
      Pattern::Grammar(vec![GrammarContent::Start(Start { combine: None, pattern: payload })]);
  }

  let mut state = State::seed(&root.pattern);
  let Pattern::Grammar(contents) = &mut root.pattern else {
    return Err(SimplifyError::MissingStart);
  };

  let mut scopes: Vec<HashMap<String, String>> = vec![HashMap::new()];
  for content in contents.iter_mut() {
    match content {
      GrammarContent::Start(start) => walk(&mut start.pattern, &mut scopes, &mut state)?,
      GrammarContent::Define(define) => {
        for pattern in &mut define.patterns {
          walk(pattern, &mut scopes, &mut state)?;
        }
      }
    }
  }
  contents.extend(state.hoisted.into_iter().map(GrammarContent::Define));
  Ok(())
}

struct State {
  /// Every name usable for freshness checks: all defines anywhere plus any
  /// generated names.
  used: HashSet<String>,
  /// Names already owned by the flattened output.
  finalized: HashSet<String>,
  hoisted: Vec<Define>,
}

impl State {
  fn seed(top: &Pattern) -> Self {
    let mut used = HashSet::new();
    collect_define_names(top, &mut used);
    let finalized = match top {
      Pattern::Grammar(contents) => contents
        .iter()
        .filter_map(|c| match c {
          GrammarContent::Define(d) => Some(d.name.clone()),
          GrammarContent::Start(_) => None,
        })
        .collect(),
      _ => HashSet::new(),
    };
    Self { used, finalized, hoisted: vec![] }
  }
}

fn collect_define_names(pattern: &Pattern, out: &mut HashSet<String>) {
  if let Pattern::Grammar(contents) = pattern {
    for content in contents {
      if let GrammarContent::Define(d) = content {
        out.insert(d.name.clone());
      }
    }
  }
  pattern.for_each_child(&mut |child| collect_define_names(child, out));
}

fn walk(
  pattern: &mut Pattern,
  scopes: &mut Vec<HashMap<String, String>>,
  state: &mut State,
) -> Result<(), SimplifyError> {
  match pattern {
    Pattern::Ref(name) => {
      let Some(scope) = scopes.last() else {
        return Err(SimplifyError::RefOutsideGrammar);
      };
      if let Some(renamed) = scope.get(name) {
        *name = renamed.clone();
      }
    }
    Pattern::ParentRef(name) => {
      if scopes.is_empty() {
        return Err(SimplifyError::RefOutsideGrammar);
      }
      if scopes.len() < 2 {
        return Err(SimplifyError::ParentRefWithoutParent);
      }
      let scope = &scopes[scopes.len() - 2];
      let target = scope.get(name).cloned().unwrap_or_else(|| name.clone());
      *pattern = Pattern::Ref(target);
    }
    Pattern::Grammar(contents) => {
      // Decide renames for this nested grammar before touching its refs.
      let mut scope = HashMap::new();
      for content in contents.iter() {
        if let GrammarContent::Define(define) = content {
          if state.finalized.contains(&define.name) {
            let renamed = fresh_name(&define.name, &mut state.used);
            state.finalized.insert(renamed.clone());
            scope.insert(define.name.clone(), renamed);
          } else {
            state.finalized.insert(define.name.clone());
          }
        }
      }
      scopes.push(scope);
      for content in contents.iter_mut() {
        match content {
          GrammarContent::Start(start) => walk(&mut start.pattern, scopes, state)?,
          GrammarContent::Define(define) => {
            for child in &mut define.patterns {
              walk(child, scopes, state)?;
            }
          }
        }
      }
      let scope = scopes.pop().unwrap_or_default();

      let mut payload = None;
      for content in mem::take(contents) {
        match content {
          GrammarContent::Start(start) => payload = Some(start.pattern),
          GrammarContent::Define(mut define) => {
            if let Some(renamed) = scope.get(&define.name) {
              define.name = renamed.clone();
            }
            state.hoisted.push(define);
          }
        }
      }
      *pattern = payload.ok_or(SimplifyError::MissingStart)?;
      return Ok(());
    }
    _ => {}
  }

  let mut result = Ok(());
  pattern.for_each_child_mut(&mut |child| {
    if result.is_ok() {
      result = walk(child, scopes, state);
    }
  });
  result
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::builder::*;

  #[test]
  fn test_wraps_bare_pattern() {
    let mut g = root(text());
    apply(&mut g).expect("flatten");
    assert_eq!(g.pattern, grammar(vec![start(text())]));
  }

  #[test]
  fn test_hoists_nested_defines() {
    let mut g = root(grammar(vec![
      start(grammar(vec![start(ref_to("inner")), define("inner", vec![text()])])),
    ]));
    apply(&mut g).expect("flatten");
    assert_eq!(
      g.pattern,
      grammar(vec![start(ref_to("inner")), define("inner", vec![text()])])
    );
  }

  #[test]
  fn test_renames_conflicting_defines() {
    let mut g = root(grammar(vec![
      start(grammar(vec![start(ref_to("a")), define("a", vec![value("nested")])])),
      define("a", vec![value("outer")]),
    ]));
    apply(&mut g).expect("flatten");
    assert_eq!(
      g.pattern,
      grammar(vec![
        start(ref_to("a__1")),
        define("a", vec![value("outer")]),
        define("a__1", vec![value("nested")]),
      ])
    );
  }

  #[test]
  fn test_parent_ref_resolves_one_scope_up() {
    let mut g = root(grammar(vec![
      start(grammar(vec![
        start(parent_ref("a")),
        define("a", vec![value("nested")]),
      ])),
      define("a", vec![value("outer")]),
    ]));
    apply(&mut g).expect("flatten");
    // The nested define is renamed, but the parentRef targets the outer a.
    assert_eq!(
      g.pattern,
      grammar(vec![
        start(ref_to("a")),
        define("a", vec![value("outer")]),
        define("a__1", vec![value("nested")]),
      ])
    );
  }

  #[test]
  fn test_parent_ref_in_top_grammar_fails() {
    let mut g = root(grammar(vec![start(parent_ref("a")), define("a", vec![text()])]));
    assert_eq!(apply(&mut g), Err(SimplifyError::ParentRefWithoutParent));
  }

  #[test]
  fn test_fresh_name_avoids_every_grammar() {
    // a__1 is taken by a sibling grammar, so the conflicting define skips
    // to a__2.
    let mut g = root(grammar(vec![
      start(group(vec![
        grammar(vec![start(ref_to("a")), define("a", vec![value("first")])]),
        grammar(vec![start(ref_to("a__1")), define("a__1", vec![value("second")])]),
      ])),
      define("a", vec![value("outer")]),
    ]));
    apply(&mut g).expect("flatten");
    assert_eq!(
      g.pattern,
      grammar(vec![
        start(group(vec![ref_to("a__2"), ref_to("a__1")])),
        define("a", vec![value("outer")]),
        define("a__2", vec![value("first")]),
        define("a__1", vec![value("second")]),
      ])
    );
  }
}
