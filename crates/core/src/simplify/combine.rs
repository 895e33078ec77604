//! Pass 4: eliminate `combine`.
//!
//! Inside each grammar, `start` nodes and `define` nodes of the same name
//! are folded into one. Members sort absent-combine first and fold left, so
//! the result reads `combine(combine(a, b), c)` with input order preserved.
//! A group of two or more must agree on a single non-absent `combine`
//! value; at most one member may leave it absent and inherit.

use crate::ast::{Combine, Define, GrammarContent, Pattern, Root, Start};
use crate::simplify::SimplifyError;
use std::mem;

pub(crate) fn apply(root: &mut Root) -> Result<(), SimplifyError> {
  walk(&mut root.pattern)
}

fn walk(pattern: &mut Pattern) -> Result<(), SimplifyError> {
  if let Pattern::Grammar(contents) = pattern {
    merge(contents)?;
  }
  let mut result = Ok(());
  pattern.for_each_child_mut(&mut |child| {
    if result.is_ok() {
      result = walk(child);
    }
  });
  result
}

fn merge(contents: &mut Vec<GrammarContent>) -> Result<(), SimplifyError> {
  let mut starts: Vec<Start> = vec![];
  // Define groups in first-occurrence order.
  let mut names: Vec<String> = vec![];
  let mut groups: Vec<Vec<Define>> = vec![];
  for content in mem::take(contents) {
    match content {
      GrammarContent::Start(start) => starts.push(start),
      GrammarContent::Define(define) => {
        match names.iter().position(|n| *n == define.name) {
          Some(i) => groups[i].push(define),
          None => {
            names.push(define.name.clone());
            groups.push(vec![define]);
          }
        }
      }
    }
  }

  if starts.is_empty() {
    return Err(SimplifyError::MissingStart);
  }
  contents.push(GrammarContent::Start(merge_starts(starts)?));
  for group in groups {
    contents.push(GrammarContent::Define(merge_defines(group)?));
  }
  Ok(())
}

fn merge_starts(mut starts: Vec<Start>) -> Result<Start, SimplifyError> {
  if starts.len() == 1 {
    return Ok(starts.remove(0));
  }
  let combine = group_combine(starts.iter().map(|s| s.combine)).map_err(|e| match e {
    CombineFault::Missing => SimplifyError::StartCombineMissing,
    CombineFault::Conflict => SimplifyError::StartCombineConflict,
  })?;
  starts.sort_by_key(|s| s.combine.is_some());
  let mut members = starts.into_iter().map(|s| s.pattern);
  let first = members.next().unwrap_or(Pattern::Empty);
  let pattern = members.fold(first, |acc, next| fold_pair(combine, acc, next));
  Ok(Start { combine: Some(combine), pattern })
}

fn merge_defines(mut defines: Vec<Define>) -> Result<Define, SimplifyError> {
  if defines.len() == 1 {
    return Ok(defines.remove(0));
  }
  let name = defines[0].name.clone();
  let combine = group_combine(defines.iter().map(|d| d.combine)).map_err(|e| match e {
    CombineFault::Missing => SimplifyError::DefineCombineMissing(name.clone()),
    CombineFault::Conflict => SimplifyError::DefineCombineConflict(name.clone()),
  })?;
  defines.sort_by_key(|d| d.combine.is_some());
  // Arity normalization already left each define with a single pattern.
  let mut members = defines
    .into_iter()
    .map(|mut d| d.patterns.pop().unwrap_or(Pattern::Empty));
  let first = members.next().unwrap_or(Pattern::Empty);
  let pattern = members.fold(first, |acc, next| fold_pair(combine, acc, next));
  Ok(Define { name, combine: Some(combine), patterns: vec![pattern] })
}

fn fold_pair(combine: Combine, left: Pattern, right: Pattern) -> Pattern {
  match combine {
    Combine::Choice => Pattern::Choice(vec![left, right]),
    Combine::Interleave => Pattern::Interleave(vec![left, right]),
  }
}

enum CombineFault {
  Missing,
  Conflict,
}

/// The single combine value governing a group of two or more members.
fn group_combine(
  members: impl Iterator<Item = Option<Combine>>,
) -> Result<Combine, CombineFault> {
  let mut absent = 0usize;
  let mut value = None;
  for member in members {
    match member {
      None => absent += 1,
      Some(c) => match value {
        None => value = Some(c),
        Some(v) if v == c => {}
        Some(_) => return Err(CombineFault::Conflict),
      },
    }
  }
  match (value, absent) {
    (Some(v), 0 | 1) => Ok(v),
    _ => Err(CombineFault::Missing),
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::builder::*;

  fn grammar_of(root: &Root) -> &[GrammarContent] {
    root.grammar().expect("grammar root")
  }

  #[test]
  fn test_folds_defines_left() {
    let mut g = root(grammar(vec![
      start(text()),
      define_combine("a", Combine::Choice, vec![value("1")]),
      define_combine("a", Combine::Choice, vec![value("2")]),
      define_combine("a", Combine::Choice, vec![value("3")]),
    ]));
    apply(&mut g).expect("combine should fold");
    let contents = grammar_of(&g);
    assert_eq!(contents.len(), 2);
    let GrammarContent::Define(d) = &contents[1] else {
      panic!("define");
    };
    assert_eq!(
      d.patterns,
      vec![choice(vec![choice(vec![value("1"), value("2")]), value("3")])]
    );
  }

  #[test]
  fn test_absent_member_sorts_first() {
    let mut g = root(grammar(vec![
      start(text()),
      define_combine("a", Combine::Interleave, vec![value("tagged")]),
      define("a", vec![value("plain")]),
    ]));
    apply(&mut g).expect("one absent member inherits");
    let GrammarContent::Define(d) = &grammar_of(&g)[1] else {
      panic!("define");
    };
    assert_eq!(d.combine, Some(Combine::Interleave));
    assert_eq!(
      d.patterns,
      vec![interleave(vec![value("plain"), value("tagged")])]
    );
  }

  #[test]
  fn test_conflicting_defines_rejected() {
    let mut g = root(grammar(vec![
      start(text()),
      define_combine("a", Combine::Choice, vec![text()]),
      define_combine("a", Combine::Interleave, vec![text()]),
    ]));
    assert_eq!(
      apply(&mut g),
      Err(SimplifyError::DefineCombineConflict("a".into()))
    );
  }

  #[test]
  fn test_all_absent_rejected() {
    let mut g = root(grammar(vec![
      start(text()),
      define("a", vec![text()]),
      define("a", vec![empty()]),
    ]));
    assert_eq!(
      apply(&mut g),
      Err(SimplifyError::DefineCombineMissing("a".into()))
    );
  }

  #[test]
  fn test_missing_start_rejected() {
    let mut g = root(grammar(vec![define("a", vec![text()])]));
    assert_eq!(apply(&mut g), Err(SimplifyError::MissingStart));
  }

  #[test]
  fn test_nested_grammar_is_merged_too() {
    let mut g = root(grammar(vec![
      start(grammar(vec![
        start(text()),
        define("b", vec![value("x")]),
        define("b", vec![value("y")]),
      ])),
    ]));
    assert_eq!(
      apply(&mut g),
      Err(SimplifyError::DefineCombineMissing("b".into()))
    );
  }
}
