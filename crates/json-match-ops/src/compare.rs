use json_match_config::RuleKind;
use json_match_format::{Mismatch, ValueType, Violation};
use json_match_path::NodePath;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::absent::{check_forbidden_keys, sweep_unaddressed};
use crate::suggest::closest_key;
use crate::tree::{ConfigTree, Cursor};

/// Destination for mismatches. Silent sinks are used while trying wildcard
/// candidates so that rejected candidates leave no trace in the report.
pub(crate) struct Sink<'a> {
    mismatches: Option<&'a mut Vec<Mismatch>>,
}

impl<'a> Sink<'a> {
    pub(crate) fn collecting(mismatches: &'a mut Vec<Mismatch>) -> Self {
        Sink {
            mismatches: Some(mismatches),
        }
    }

    pub(crate) fn silent() -> Self {
        Sink { mismatches: None }
    }

    pub(crate) fn is_silent(&self) -> bool {
        self.mismatches.is_none()
    }

    pub(crate) fn push(&mut self, build: impl FnOnce() -> Mismatch) {
        if let Some(mismatches) = self.mismatches.as_deref_mut() {
            mismatches.push(build());
        }
    }
}

/// Rule context for one node of the walk.
#[derive(Clone, Copy)]
struct Frame<'t> {
    cursor: Cursor<'t>,
    /// Set when the node is an array element: the array's cursor and the
    /// element's expected-side index.
    element_of: Option<(Cursor<'t>, usize)>,
}

impl<'t> Frame<'t> {
    fn at(cursor: Cursor<'t>) -> Self {
        Frame {
            cursor,
            element_of: None,
        }
    }
}

/// Lock-step walk of expected and actual documents.
pub(crate) struct Walker<'t> {
    tree: &'t ConfigTree,
    suggestions: bool,
}

impl<'t> Walker<'t> {
    pub(crate) fn new(tree: &'t ConfigTree, suggestions: bool) -> Self {
        Walker { tree, suggestions }
    }

    /// Compare from the top-level node. Returns whether everything matched.
    pub(crate) fn run(&self, expected: &Value, actual: &Value, sink: &mut Sink<'_>) -> bool {
        let frame = Frame::at(self.tree.root());
        self.check(Some(expected), Some(actual), frame, &NodePath::root(), sink)
    }

    fn check(
        &self,
        expected: Option<&Value>,
        actual: Option<&Value>,
        frame: Frame<'t>,
        path: &NodePath,
        sink: &mut Sink<'_>,
    ) -> bool {
        let Some(expected) = expected.filter(|value| !value.is_null()) else {
            return match actual {
                Some(actual) => sweep_unaddressed(self.tree, frame.cursor, actual, path, sink),
                None => true,
            };
        };
        let Some(actual) = actual.filter(|value| !value.is_null()) else {
            sink.push(|| {
                Mismatch::new(
                    path.clone(),
                    Violation::MissingValue { suggestion: None },
                    Some(expected),
                    actual,
                )
            });
            return false;
        };

        let expected_type = ValueType::of(expected);
        let actual_type = ValueType::of(actual);
        if expected_type != actual_type {
            sink.push(|| {
                Mismatch::new(
                    path.clone(),
                    Violation::TypeMismatch {
                        expected: expected_type,
                        actual: actual_type,
                    },
                    Some(expected),
                    Some(actual),
                )
            });
            if !sink.is_silent() {
                sweep_unaddressed(self.tree, frame.cursor, actual, path, sink);
            }
            return false;
        }

        match (expected, actual) {
            (Value::Object(expected_map), Value::Object(actual_map)) => self.check_map(
                (expected, actual),
                expected_map,
                actual_map,
                frame,
                path,
                sink,
            ),
            (Value::Array(expected_items), Value::Array(actual_items)) => self.check_list(
                (expected, actual),
                expected_items,
                actual_items,
                frame,
                path,
                sink,
            ),
            _ => self.check_scalar(expected, actual, frame, path, sink),
        }
    }

    fn check_scalar(
        &self,
        expected: &Value,
        actual: &Value,
        frame: Frame<'t>,
        path: &NodePath,
        sink: &mut Sink<'_>,
    ) -> bool {
        let exact = match frame.element_of {
            Some((list, index)) => self
                .tree
                .element(list, index, RuleKind::PrimitiveExactMatch),
            None => self.tree.local(frame.cursor, RuleKind::PrimitiveExactMatch),
        };

        if !exact.active || expected == actual {
            return true;
        }

        sink.push(|| {
            Mismatch::new(
                path.clone(),
                Violation::ValueMismatch,
                Some(expected),
                Some(actual),
            )
        });
        false
    }

    /// Shared size rule for maps and arrays. Returns `false` after reporting
    /// a violation.
    fn check_count(
        &self,
        frame: Frame<'t>,
        lengths: (usize, usize),
        values: (&Value, &Value),
        path: &NodePath,
        sink: &mut Sink<'_>,
    ) -> bool {
        let (expected_len, actual_len) = lengths;
        let exact = self
            .tree
            .local(frame.cursor, RuleKind::CollectionEqualCount)
            .active;
        let satisfied = if exact {
            expected_len == actual_len
        } else {
            expected_len <= actual_len
        };

        if !satisfied {
            sink.push(|| {
                Mismatch::new(
                    path.clone(),
                    Violation::CollectionCount {
                        expected: expected_len,
                        actual: actual_len,
                        exact,
                    },
                    Some(values.0),
                    Some(values.1),
                )
            });
        }
        satisfied
    }

    fn check_map(
        &self,
        values: (&Value, &Value),
        expected: &Map<String, Value>,
        actual: &Map<String, Value>,
        frame: Frame<'t>,
        path: &NodePath,
        sink: &mut Sink<'_>,
    ) -> bool {
        let mut matched =
            self.check_count(frame, (expected.len(), actual.len()), values, path, sink);
        if !matched && sink.is_silent() {
            return false;
        }
        if !check_forbidden_keys(self.tree, frame.cursor, actual, path, sink) {
            matched = false;
            if sink.is_silent() {
                return false;
            }
        }

        for (key, expected_child) in expected {
            let child_path = path.key(key);
            let child_frame = Frame::at(self.tree.descend(frame.cursor, key));

            let child_matched = match actual.get(key) {
                None if !expected_child.is_null() => {
                    sink.push(|| {
                        let suggestion = if self.suggestions {
                            closest_key(key, actual.keys().filter(|k| !expected.contains_key(*k)))
                        } else {
                            None
                        };
                        Mismatch::new(
                            child_path.clone(),
                            Violation::MissingValue { suggestion },
                            Some(expected_child),
                            None,
                        )
                    });
                    false
                }
                None => true,
                Some(actual_child) => self.check(
                    Some(expected_child),
                    Some(actual_child),
                    child_frame,
                    &child_path,
                    sink,
                ),
            };

            if !child_matched {
                matched = false;
                if sink.is_silent() {
                    return false;
                }
            }
        }

        for (key, actual_child) in actual {
            if expected.contains_key(key) {
                continue;
            }
            let cursor = self.tree.descend(frame.cursor, key);
            if !sweep_unaddressed(self.tree, cursor, actual_child, &path.key(key), sink) {
                matched = false;
                if sink.is_silent() {
                    return false;
                }
            }
        }

        matched
    }

    fn check_list(
        &self,
        values: (&Value, &Value),
        expected: &[Value],
        actual: &[Value],
        frame: Frame<'t>,
        path: &NodePath,
        sink: &mut Sink<'_>,
    ) -> bool {
        // Element matching is meaningless once the sizes disagree.
        if !self.check_count(frame, (expected.len(), actual.len()), values, path, sink) {
            if !sink.is_silent() {
                self.sweep_elements(frame, actual, 0..actual.len(), path, sink);
            }
            return false;
        }

        let (wildcard, fixed): (Vec<usize>, Vec<usize>) = (0..expected.len()).partition(|&index| {
            self.tree
                .element(frame.cursor, index, RuleKind::WildcardMatch)
                .active
        });

        let mut matched = true;

        for &index in &fixed {
            let child_path = path.index(index);
            let child_frame = self.element_frame(frame, index);
            let child_matched = match actual.get(index) {
                Some(actual_child) => self.check(
                    Some(&expected[index]),
                    Some(actual_child),
                    child_frame,
                    &child_path,
                    sink,
                ),
                None if expected[index].is_null() => true,
                None => {
                    sink.push(|| {
                        Mismatch::new(
                            child_path.clone(),
                            Violation::MissingValue { suggestion: None },
                            Some(&expected[index]),
                            None,
                        )
                    });
                    false
                }
            };
            if !child_matched {
                matched = false;
                if sink.is_silent() {
                    return false;
                }
            }
        }

        let mut pool: Vec<usize> = (0..actual.len())
            .filter(|candidate| !fixed.contains(candidate))
            .collect();

        for &index in &wildcard {
            // A null element matches anything, so it takes no candidate.
            if expected[index].is_null() {
                continue;
            }
            let child_path = path.index(index);
            let child_frame = self.element_frame(frame, index);

            let found = pool.iter().position(|&candidate| {
                trace!(path = %child_path, candidate, "trying wildcard candidate");
                let mut scratch = Sink::silent();
                self.check(
                    Some(&expected[index]),
                    Some(&actual[candidate]),
                    child_frame,
                    &child_path,
                    &mut scratch,
                )
            });

            match found {
                Some(position) => {
                    let candidate = pool.remove(position);
                    debug!(path = %child_path, candidate, "wildcard element matched");
                }
                None => {
                    sink.push(|| {
                        Mismatch::new(
                            child_path.clone(),
                            Violation::NoWildcardCandidate {
                                remaining: pool.clone(),
                            },
                            Some(&expected[index]),
                            None,
                        )
                    });
                    matched = false;
                    if sink.is_silent() {
                        return false;
                    }
                }
            }
        }

        // Elements nothing was paired with are only checked for forbidden keys.
        if !self.sweep_elements(frame, actual, pool, path, sink) {
            matched = false;
        }

        matched
    }

    /// Sweep actual elements that no expected element addresses. Per-index
    /// nodes name expected positions, so only the array's subtree defaults apply.
    fn sweep_elements(
        &self,
        list: Frame<'t>,
        actual: &[Value],
        indices: impl IntoIterator<Item = usize>,
        path: &NodePath,
        sink: &mut Sink<'_>,
    ) -> bool {
        let cursor = self.tree.detach(list.cursor);
        let mut clean = true;
        for index in indices {
            if !sweep_unaddressed(self.tree, cursor, &actual[index], &path.index(index), sink) {
                clean = false;
                if sink.is_silent() {
                    return false;
                }
            }
        }
        clean
    }

    fn element_frame(&self, list: Frame<'t>, index: usize) -> Frame<'t> {
        Frame {
            cursor: self.tree.descend(list.cursor, &index.to_string()),
            element_of: Some((list.cursor, index)),
        }
    }
}
