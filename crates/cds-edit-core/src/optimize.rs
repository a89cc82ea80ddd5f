//! Batch optimization
//!
//! Runs once per batch on operations whose pointers were already converted
//! to concrete pointers. The stages run in a fixed order:
//!
//! 1. inserts into empty containers are anchored at index 0
//! 2. duplicated and shadowed operations are dropped
//! 3. an insert and a delete at the same assignment index fold into a replace
//! 4. the last insert into a bare single-annotation target is followed by a
//!    compound conversion marker
//! 5. deletions emptying a container bubble up into a deletion of the
//!    container, bottom-up
//! 6. shadowing runs again and deletions are ordered by pointer

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashSet};

use crate::change::{ChangeCommand, Operation};
use crate::cst::{CdsDocument, CstNode};
use crate::pointer::Pointer;

pub fn optimize(document: &CdsDocument, operations: Vec<Operation>) -> Vec<Operation> {
    let submitted = operations.len();
    let operations = normalize_insert_index(document, operations);
    let operations = apply_commands(&operations, &remove_shadowed(&operations));
    let operations = apply_commands(&operations, &combine_replacements(&operations));
    let operations = apply_commands(&operations, &expand_compound(document, &operations));
    let operations = bubble_up_deletions(document, operations);
    let operations = apply_commands(&operations, &remove_shadowed(&operations));
    let operations = order(operations);
    tracing::debug!(submitted, optimized = operations.len(), "optimized batch");
    operations
}

/// Apply one command per operation
pub fn apply_commands(operations: &[Operation], commands: &[ChangeCommand]) -> Vec<Operation> {
    operations
        .iter()
        .zip(commands)
        .flat_map(|(operation, command)| match command {
            ChangeCommand::Pick => vec![operation.clone()],
            ChangeCommand::Drop => Vec::new(),
            ChangeCommand::Replace(replacements) => replacements.clone(),
        })
        .collect()
}

fn normalize_insert_index(document: &CdsDocument, mut operations: Vec<Operation>) -> Vec<Operation> {
    for operation in &mut operations {
        if !operation.is_list_insert() {
            continue;
        }
        let is_empty = document
            .resolve(operation.pointer())
            .and_then(|node| node.list_len())
            .is_some_and(|len| len == 0);
        if is_empty {
            operation.set_index(Some(0));
        }
    }
    operations
}

/// Drop duplicated destructive operations and operations below a removed node
pub fn remove_shadowed(operations: &[Operation]) -> Vec<ChangeCommand> {
    let mut commands = vec![ChangeCommand::Pick; operations.len()];

    let mut seen = HashSet::new();
    for (index, operation) in operations.iter().enumerate().rev() {
        if operation.is_destructive() && !seen.insert(operation.pointer()) {
            commands[index] = ChangeCommand::Drop;
        }
    }

    let removed: Vec<&Pointer> = operations
        .iter()
        .zip(&commands)
        .filter(|(operation, command)| {
            **command == ChangeCommand::Pick && operation.removes_subtree()
        })
        .map(|(operation, _)| operation.pointer())
        .collect();

    for (operation, command) in operations.iter().zip(commands.iter_mut()) {
        if *command == ChangeCommand::Drop {
            continue;
        }
        let pointer = operation.pointer();
        let shadowed = if operation.is_destructive() {
            removed.iter().any(|removed| removed.is_ancestor_of(pointer))
        } else {
            removed.iter().any(|removed| {
                pointer.starts_with(removed)
                    || operation
                        .source_pointers()
                        .iter()
                        .any(|source| source.starts_with(removed))
            })
        };
        if shadowed {
            *command = ChangeCommand::Drop;
        }
    }
    commands
}

/// Fold `insert-annotation` at index i and the deletion of assignment i
fn combine_replacements(operations: &[Operation]) -> Vec<ChangeCommand> {
    let mut commands = vec![ChangeCommand::Pick; operations.len()];
    let mut folded = HashSet::new();

    for (index, operation) in operations.iter().enumerate() {
        let Operation::InsertAnnotation {
            pointer,
            index: Some(position),
            element,
        } = operation
        else {
            continue;
        };
        let assignment = pointer.child("assignments").child(position);
        if folded.contains(&assignment) {
            continue;
        }
        let deletion = operations.iter().position(|candidate| {
            matches!(
                candidate,
                Operation::DeleteAnnotation { .. } | Operation::DeleteAnnotationGroup { .. }
            ) && *candidate.pointer() == assignment
        });
        if let Some(deletion) = deletion {
            commands[deletion] = ChangeCommand::Drop;
            commands[index] = ChangeCommand::Replace(vec![Operation::ReplaceNode {
                pointer: assignment.clone(),
                element: element.clone(),
            }]);
            folded.insert(assignment);
        }
    }
    commands
}

/// Append a compound conversion marker after the last insert into a bare
/// target holding a single annotation
fn expand_compound(document: &CdsDocument, operations: &[Operation]) -> Vec<ChangeCommand> {
    let mut commands = vec![ChangeCommand::Pick; operations.len()];
    let mut handled = HashSet::new();

    for (index, operation) in operations.iter().enumerate().rev() {
        let Operation::InsertAnnotation { pointer, .. } = operation else {
            continue;
        };
        if handled.contains(pointer) {
            continue;
        }
        let Some(CstNode::Target(target)) = document.resolve(pointer) else {
            continue;
        };
        handled.insert(pointer.clone());
        if target.compound.is_some() || target.assignments.len() != 1 {
            continue;
        }
        let sole = pointer.child("assignments").child(0);
        let unnecessary = operations.iter().any(|candidate| {
            matches!(
                candidate,
                Operation::DeleteAnnotation { .. } | Operation::DeleteAnnotationGroup { .. }
            ) && *candidate.pointer() == sole
        });
        commands[index] = ChangeCommand::Replace(vec![
            operation.clone(),
            Operation::ConvertToCompoundAnnotation {
                pointer: pointer.clone(),
                unnecessary,
            },
        ]);
    }
    commands
}

/// Container a deletion belongs to, with the key of the deleted child
fn container_of<'d>(document: &'d CdsDocument, pointer: &Pointer) -> Option<(Pointer, CstNode<'d>, String)> {
    let last = pointer.last()?;
    let container = if pointer.last_index().is_some() {
        pointer.ancestor(2)?
    } else {
        pointer.parent()?
    };
    let node = document.resolve(&container)?;
    let accepted = match node {
        CstNode::Target(_) | CstNode::GroupItems(_) | CstNode::Record(_) => {
            pointer.last_index().is_some()
        }
        CstNode::Group(_) => last == "items",
        CstNode::Annotation(_) | CstNode::Property(_) => last == "value",
        _ => false,
    };
    accepted.then(|| (container, node, last.to_string()))
}

fn child_count(node: &CstNode<'_>) -> usize {
    match node {
        CstNode::Annotation(annotation) => usize::from(annotation.value.is_some()),
        CstNode::Property(property) => usize::from(property.value.is_some()),
        CstNode::Group(_) => 1,
        node => node.list_len().unwrap_or(0),
    }
}

/// Deletion replacing a fully emptied container
fn container_deletion(pointer: &Pointer, node: &CstNode<'_>) -> Option<Operation> {
    let pointer = pointer.clone();
    Some(match node {
        CstNode::Target(_) => Operation::DeleteTarget { pointer },
        CstNode::GroupItems(_) => Operation::DeleteAnnotationGroupItems { pointer },
        CstNode::Group(_) => Operation::DeleteAnnotationGroup { pointer },
        CstNode::Record(_) => Operation::DeleteRecord { pointer },
        CstNode::Annotation(annotation) if annotation.embedded => {
            Operation::DeleteEmbeddedAnnotation { pointer }
        }
        CstNode::Annotation(_) => Operation::DeleteAnnotation { pointer },
        CstNode::Property(_) => Operation::DeleteRecordProperty { pointer },
        _ => return None,
    })
}

/// Replace deletions of all children of a container by a deletion of the
/// container, repeated upwards
///
/// Containers are processed deepest first; containers of equal depth are
/// processed in pointer order.
fn bubble_up_deletions(document: &CdsDocument, operations: Vec<Operation>) -> Vec<Operation> {
    let mut operations: Vec<Option<Operation>> = operations.into_iter().map(Some).collect();
    let mut pending: BTreeMap<Pointer, (BTreeSet<String>, Vec<usize>)> = BTreeMap::new();
    let mut worklist = BinaryHeap::new();

    let register = |index: usize,
                        operation: &Operation,
                        pending: &mut BTreeMap<Pointer, (BTreeSet<String>, Vec<usize>)>,
                        worklist: &mut BinaryHeap<(usize, Reverse<Pointer>)>| {
        if !operation.is_deletion() || matches!(operation, Operation::DeleteQualifier { .. }) {
            return;
        }
        if let Some((container, _, key)) = container_of(document, operation.pointer()) {
            let entry = pending.entry(container.clone()).or_default();
            entry.0.insert(key);
            entry.1.push(index);
            worklist.push((container.depth(), Reverse(container)));
        }
    };

    for (index, operation) in operations.iter().enumerate() {
        if let Some(operation) = operation {
            register(index, operation, &mut pending, &mut worklist);
        }
    }

    let mut processed = HashSet::new();
    while let Some((_, Reverse(container))) = worklist.pop() {
        if !processed.insert(container.clone()) {
            continue;
        }
        let Some(node) = document.resolve(&container) else {
            continue;
        };
        let Some((keys, indices)) = pending.get(&container) else {
            continue;
        };
        if keys.len() < child_count(&node) {
            continue;
        }
        let blocked = operations.iter().flatten().any(|operation| {
            !operation.is_deletion() && operation.pointer().starts_with(&container)
        });
        if blocked {
            continue;
        }
        let Some(replacement) = container_deletion(&container, &node) else {
            continue;
        };
        tracing::debug!(container = %container, "container emptied by deletions");
        for index in indices.clone() {
            operations[index] = None;
        }
        let index = operations.len();
        register(index, &replacement, &mut pending, &mut worklist);
        operations.push(Some(replacement));
    }

    operations.into_iter().flatten().collect()
}

/// Non-deletions in submission order, then deletions sorted by pointer
fn order(operations: Vec<Operation>) -> Vec<Operation> {
    let (mut deletions, mut ordered): (Vec<Operation>, Vec<Operation>) =
        operations.into_iter().partition(Operation::is_deletion);
    deletions.sort_by(|a, b| a.pointer().cmp(b.pointer()).then(a.kind().cmp(b.kind())));
    ordered.extend(deletions);
    ordered
}
