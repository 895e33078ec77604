//! Pass 6: canonical define/element shape.
//!
//! Four steps over the single top-level grammar:
//! 1. Reachability: defines are reordered into the order they are first
//!    referenced from `start`; unreached defines are dropped.
//! 2. Element lifting: every element not already the body of a canonical
//!    `elem__N` define moves into a fresh `elem__N` define and leaves a
//!    `ref` behind. New defines are visited later in the same pass, so
//!    nested elements keep lifting until none remain.
//! 3. Inlining: refs to defines whose body is not an element are replaced
//!    by a structural copy of that body. Non-element defines are acyclic by
//!    construction; no cycle detection is attempted.
//! 4. Pruning: defines whose body is not an element are dropped.
//!
//! After this pass every define wraps exactly one element and every
//! surviving ref targets such a define.

use crate::ast::{Define, GrammarContent, Pattern, Root, Start};
use crate::simplify::SimplifyError;

use std::collections::{HashMap, HashSet, VecDeque};
use std::mem;

pub(crate) fn apply(root: &mut Root) -> Result<(), SimplifyError> {
  reachability(root)?;
  lift_elements(root);
  inline_defines(root);
  prune(root);
  Ok(())
}

/// Reorder the top grammar so reached defines follow `start` in first
/// reference order; drop the rest. Also reruns after the `notAllowed` pass,
/// which can cut references away.
pub(crate) fn reachability(root: &mut Root) -> Result<(), SimplifyError> {
  let Pattern::Grammar(contents) = &mut root.pattern else {
    return Err(SimplifyError::MissingStart);
  };

  let mut start: Option<Start> = None;
  let mut index: HashMap<String, Define> = HashMap::new();
  for content in mem::take(contents) {
    match content {
      GrammarContent::Start(s) => start = Some(s),
      GrammarContent::Define(d) => {
        index.insert(d.name.clone(), d);
      }
    }
  }
  let start = start.ok_or(SimplifyError::MissingStart)?;

  let mut seen: HashSet<String> = HashSet::new();
  let mut queue: VecDeque<String> = VecDeque::new();
  enqueue_refs(&start.pattern, &mut seen, &mut queue);

  let mut reached: Vec<Define> = vec![];
  while let Some(name) = queue.pop_front() {
    let define =
      index.remove(&name).ok_or_else(|| SimplifyError::UnknownDefinition(name.clone()))?;
    for pattern in &define.patterns {
      enqueue_refs(pattern, &mut seen, &mut queue);
    }
    reached.push(define);
  }

  contents.push(GrammarContent::Start(start));
  contents.extend(reached.into_iter().map(GrammarContent::Define));
  Ok(())
}

fn enqueue_refs(pattern: &Pattern, seen: &mut HashSet<String>, queue: &mut VecDeque<String>) {
  if let Pattern::Ref(name) = pattern {
    if seen.insert(name.clone()) {
      queue.push_back(name.clone());
    }
  }
  pattern.for_each_child(&mut |child| enqueue_refs(child, seen, queue));
}

/// True for the pass's own `elem__N` names. A define that already has a
/// canonical name and wraps an element is left in place, which is what
/// keeps the whole pipeline idempotent.
fn is_canonical(name: &str) -> bool {
  name
    .strip_prefix("elem__")
    .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

fn lift_elements(root: &mut Root) {
  let Pattern::Grammar(contents) = &mut root.pattern else {
    return;
  };

  let mut used: HashSet<String> = contents
    .iter()
    .filter_map(|c| match c {
      GrammarContent::Define(d) => Some(d.name.clone()),
      GrammarContent::Start(_) => None,
    })
    .collect();
  let mut counter = 1usize;
  let mut fresh = move |used: &mut HashSet<String>| loop {
    let candidate = format!("elem__{counter}");
    counter += 1;
    if used.insert(candidate.clone()) {
      return candidate;
    }
  };

  let mut pending: Vec<Define> = vec![];
  for content in contents.iter_mut() {
    match content {
      GrammarContent::Start(start) => {
        lift(&mut start.pattern, &mut used, &mut fresh, &mut pending);
      }
      GrammarContent::Define(define) => {
        lift_define(define, &mut used, &mut fresh, &mut pending);
      }
    }
  }
  // New defines are visited in the same pass: lifting inside them may grow
  // the worklist further.
  let mut i = 0;
  while i < pending.len() {
    let mut define = mem::replace(
      &mut pending[i],
      Define { name: String::new(), combine: None, patterns: vec![] },
    );
    let mut grown: Vec<Define> = vec![];
    lift_define(&mut define, &mut used, &mut fresh, &mut grown);
    pending[i] = define;
    pending.extend(grown);
    i += 1;
  }
  contents.extend(pending.into_iter().map(GrammarContent::Define));
}

fn lift_define(
  define: &mut Define,
  used: &mut HashSet<String>,
  fresh: &mut impl FnMut(&mut HashSet<String>) -> String,
  pending: &mut Vec<Define>,
) {
  let keeps_element = define.patterns.len() == 1
    && matches!(define.patterns[0], Pattern::Element { .. })
    && is_canonical(&define.name);
  if keeps_element {
    // The element body stays; only elements nested inside it lift out.
    let Pattern::Element { patterns, .. } = &mut define.patterns[0] else {
      return;
    };
    for child in patterns {
      lift(child, used, fresh, pending);
    }
  } else {
    for pattern in &mut define.patterns {
      lift(pattern, used, fresh, pending);
    }
  }
}

fn lift(
  pattern: &mut Pattern,
  used: &mut HashSet<String>,
  fresh: &mut impl FnMut(&mut HashSet<String>) -> String,
  pending: &mut Vec<Define>,
) {
  if matches!(pattern, Pattern::Element { .. }) {
    let name = fresh(used);
    let element = mem::replace(pattern, Pattern::Ref(name.clone()));
    pending.push(Define { name, combine: None, patterns: vec![element] });
    return;
  }
  pattern.for_each_child_mut(&mut |child| lift(child, used, fresh, pending));
}

fn inline_defines(root: &mut Root) {
  let Pattern::Grammar(contents) = &mut root.pattern else {
    return;
  };
  let table: HashMap<String, Pattern> = contents
    .iter()
    .filter_map(|content| match content {
      GrammarContent::Define(d)
        if !matches!(d.patterns.first(), Some(Pattern::Element { .. })) =>
      {
        Some((d.name.clone(), d.patterns.first().cloned().unwrap_or(Pattern::Empty)))
      }
      _ => None,
    })
    .collect();
  if table.is_empty() {
    return;
  }
  for content in contents.iter_mut() {
    match content {
      GrammarContent::Start(start) => substitute(&mut start.pattern, &table),
      GrammarContent::Define(define) => {
        for pattern in &mut define.patterns {
          substitute(pattern, &table);
        }
      }
    }
  }
}

fn substitute(pattern: &mut Pattern, table: &HashMap<String, Pattern>) {
  if let Pattern::Ref(name) = pattern {
    if let Some(body) = table.get(name) {
      let mut copy = body.clone();
      // Copies may reference further non-element defines; acyclic per the
      // grammar contract.
      substitute(&mut copy, table);
      *pattern = copy;
      return;
    }
  }
  pattern.for_each_child_mut(&mut |child| substitute(child, table));
}

fn prune(root: &mut Root) {
  let Pattern::Grammar(contents) = &mut root.pattern else {
    return;
  };
  contents.retain(|content| match content {
    GrammarContent::Start(_) => true,
    GrammarContent::Define(d) => matches!(d.patterns.first(), Some(Pattern::Element { .. })),
  });
}
