//! Edit operations
//!
//! Operations are plain data. On submission their pointers address the
//! abstract annotation tree; the writer converts them to concrete pointers
//! before the batch is optimized.

use serde::{Deserialize, Serialize};

use crate::model::{Element, Reference, Target};
use crate::pointer::Pointer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Operation {
    InsertTarget {
        pointer: Pointer,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        target: Target,
    },
    InsertAnnotation {
        pointer: Pointer,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        element: Element,
    },
    InsertEmbeddedAnnotation {
        pointer: Pointer,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        element: Element,
    },
    InsertRecord {
        pointer: Pointer,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        element: Element,
    },
    InsertCollection {
        pointer: Pointer,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        element: Element,
    },
    InsertRecordProperty {
        pointer: Pointer,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        element: Element,
    },
    InsertPrimitiveValue {
        pointer: Pointer,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        element: Element,
    },
    InsertQualifier {
        pointer: Pointer,
        value: String,
    },
    InsertReference {
        pointer: Pointer,
        reference: Reference,
    },
    DeleteTarget {
        pointer: Pointer,
    },
    DeleteAnnotation {
        pointer: Pointer,
    },
    DeleteAnnotationGroup {
        pointer: Pointer,
    },
    DeleteAnnotationGroupItems {
        pointer: Pointer,
    },
    DeleteEmbeddedAnnotation {
        pointer: Pointer,
    },
    DeleteRecord {
        pointer: Pointer,
    },
    DeleteCollection {
        pointer: Pointer,
    },
    DeletePrimitiveValue {
        pointer: Pointer,
    },
    DeleteRecordProperty {
        pointer: Pointer,
    },
    DeleteQualifier {
        pointer: Pointer,
    },
    ReplaceNode {
        pointer: Pointer,
        element: Element,
    },
    ReplaceRecordProperty {
        pointer: Pointer,
        element: Element,
    },
    ReplaceTextValue {
        pointer: Pointer,
        text: String,
    },
    UpdatePrimitiveValue {
        pointer: Pointer,
        element: Element,
    },
    SetFlags {
        pointer: Pointer,
        value: String,
    },
    MoveCollectionValue {
        pointer: Pointer,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        #[serde(rename = "fromPointers")]
        from_pointers: Vec<Pointer>,
    },
    ConvertToCompoundAnnotation {
        pointer: Pointer,
        #[serde(default)]
        unnecessary: bool,
    },
}

impl Operation {
    pub fn pointer(&self) -> &Pointer {
        match self {
            Operation::InsertTarget { pointer, .. }
            | Operation::InsertAnnotation { pointer, .. }
            | Operation::InsertEmbeddedAnnotation { pointer, .. }
            | Operation::InsertRecord { pointer, .. }
            | Operation::InsertCollection { pointer, .. }
            | Operation::InsertRecordProperty { pointer, .. }
            | Operation::InsertPrimitiveValue { pointer, .. }
            | Operation::InsertQualifier { pointer, .. }
            | Operation::InsertReference { pointer, .. }
            | Operation::DeleteTarget { pointer }
            | Operation::DeleteAnnotation { pointer }
            | Operation::DeleteAnnotationGroup { pointer }
            | Operation::DeleteAnnotationGroupItems { pointer }
            | Operation::DeleteEmbeddedAnnotation { pointer }
            | Operation::DeleteRecord { pointer }
            | Operation::DeleteCollection { pointer }
            | Operation::DeletePrimitiveValue { pointer }
            | Operation::DeleteRecordProperty { pointer }
            | Operation::DeleteQualifier { pointer }
            | Operation::ReplaceNode { pointer, .. }
            | Operation::ReplaceRecordProperty { pointer, .. }
            | Operation::ReplaceTextValue { pointer, .. }
            | Operation::UpdatePrimitiveValue { pointer, .. }
            | Operation::SetFlags { pointer, .. }
            | Operation::MoveCollectionValue { pointer, .. }
            | Operation::ConvertToCompoundAnnotation { pointer, .. } => pointer,
        }
    }

    pub fn set_pointer(&mut self, new_pointer: Pointer) {
        match self {
            Operation::InsertTarget { pointer, .. }
            | Operation::InsertAnnotation { pointer, .. }
            | Operation::InsertEmbeddedAnnotation { pointer, .. }
            | Operation::InsertRecord { pointer, .. }
            | Operation::InsertCollection { pointer, .. }
            | Operation::InsertRecordProperty { pointer, .. }
            | Operation::InsertPrimitiveValue { pointer, .. }
            | Operation::InsertQualifier { pointer, .. }
            | Operation::InsertReference { pointer, .. }
            | Operation::DeleteTarget { pointer }
            | Operation::DeleteAnnotation { pointer }
            | Operation::DeleteAnnotationGroup { pointer }
            | Operation::DeleteAnnotationGroupItems { pointer }
            | Operation::DeleteEmbeddedAnnotation { pointer }
            | Operation::DeleteRecord { pointer }
            | Operation::DeleteCollection { pointer }
            | Operation::DeletePrimitiveValue { pointer }
            | Operation::DeleteRecordProperty { pointer }
            | Operation::DeleteQualifier { pointer }
            | Operation::ReplaceNode { pointer, .. }
            | Operation::ReplaceRecordProperty { pointer, .. }
            | Operation::ReplaceTextValue { pointer, .. }
            | Operation::UpdatePrimitiveValue { pointer, .. }
            | Operation::SetFlags { pointer, .. }
            | Operation::MoveCollectionValue { pointer, .. }
            | Operation::ConvertToCompoundAnnotation { pointer, .. } => *pointer = new_pointer,
        }
    }

    /// Wire tag of the operation
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::InsertTarget { .. } => "insert-target",
            Operation::InsertAnnotation { .. } => "insert-annotation",
            Operation::InsertEmbeddedAnnotation { .. } => "insert-embedded-annotation",
            Operation::InsertRecord { .. } => "insert-record",
            Operation::InsertCollection { .. } => "insert-collection",
            Operation::InsertRecordProperty { .. } => "insert-record-property",
            Operation::InsertPrimitiveValue { .. } => "insert-primitive-value",
            Operation::InsertQualifier { .. } => "insert-qualifier",
            Operation::InsertReference { .. } => "insert-reference",
            Operation::DeleteTarget { .. } => "delete-target",
            Operation::DeleteAnnotation { .. } => "delete-annotation",
            Operation::DeleteAnnotationGroup { .. } => "delete-annotation-group",
            Operation::DeleteAnnotationGroupItems { .. } => "delete-annotation-group-items",
            Operation::DeleteEmbeddedAnnotation { .. } => "delete-embedded-annotation",
            Operation::DeleteRecord { .. } => "delete-record",
            Operation::DeleteCollection { .. } => "delete-collection",
            Operation::DeletePrimitiveValue { .. } => "delete-primitive-value",
            Operation::DeleteRecordProperty { .. } => "delete-record-property",
            Operation::DeleteQualifier { .. } => "delete-qualifier",
            Operation::ReplaceNode { .. } => "replace-node",
            Operation::ReplaceRecordProperty { .. } => "replace-record-property",
            Operation::ReplaceTextValue { .. } => "replace-text-value",
            Operation::UpdatePrimitiveValue { .. } => "update-primitive-value",
            Operation::SetFlags { .. } => "set-flags",
            Operation::MoveCollectionValue { .. } => "move-collection-value",
            Operation::ConvertToCompoundAnnotation { .. } => "convert-to-compound-annotation",
        }
    }

    /// Insert index for operations that add a child to a list
    pub fn index(&self) -> Option<usize> {
        match self {
            Operation::InsertTarget { index, .. }
            | Operation::InsertAnnotation { index, .. }
            | Operation::InsertEmbeddedAnnotation { index, .. }
            | Operation::InsertRecord { index, .. }
            | Operation::InsertCollection { index, .. }
            | Operation::InsertRecordProperty { index, .. }
            | Operation::InsertPrimitiveValue { index, .. }
            | Operation::MoveCollectionValue { index, .. } => *index,
            _ => None,
        }
    }

    pub fn set_index(&mut self, new_index: Option<usize>) {
        match self {
            Operation::InsertTarget { index, .. }
            | Operation::InsertAnnotation { index, .. }
            | Operation::InsertEmbeddedAnnotation { index, .. }
            | Operation::InsertRecord { index, .. }
            | Operation::InsertCollection { index, .. }
            | Operation::InsertRecordProperty { index, .. }
            | Operation::InsertPrimitiveValue { index, .. }
            | Operation::MoveCollectionValue { index, .. } => *index = new_index,
            _ => {}
        }
    }

    /// Element payload of insert and replace operations
    pub fn element(&self) -> Option<&Element> {
        match self {
            Operation::InsertAnnotation { element, .. }
            | Operation::InsertEmbeddedAnnotation { element, .. }
            | Operation::InsertRecord { element, .. }
            | Operation::InsertCollection { element, .. }
            | Operation::InsertRecordProperty { element, .. }
            | Operation::InsertPrimitiveValue { element, .. }
            | Operation::ReplaceNode { element, .. }
            | Operation::ReplaceRecordProperty { element, .. }
            | Operation::UpdatePrimitiveValue { element, .. } => Some(element),
            _ => None,
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(
            self,
            Operation::InsertTarget { .. }
                | Operation::InsertAnnotation { .. }
                | Operation::InsertEmbeddedAnnotation { .. }
                | Operation::InsertRecord { .. }
                | Operation::InsertCollection { .. }
                | Operation::InsertRecordProperty { .. }
                | Operation::InsertPrimitiveValue { .. }
                | Operation::InsertQualifier { .. }
                | Operation::InsertReference { .. }
        )
    }

    /// Inserts adding a child to a list container
    pub fn is_list_insert(&self) -> bool {
        self.is_insert()
            && !matches!(
                self,
                Operation::InsertQualifier { .. } | Operation::InsertReference { .. }
            )
    }

    pub fn is_deletion(&self) -> bool {
        matches!(
            self,
            Operation::DeleteTarget { .. }
                | Operation::DeleteAnnotation { .. }
                | Operation::DeleteAnnotationGroup { .. }
                | Operation::DeleteAnnotationGroupItems { .. }
                | Operation::DeleteEmbeddedAnnotation { .. }
                | Operation::DeleteRecord { .. }
                | Operation::DeleteCollection { .. }
                | Operation::DeletePrimitiveValue { .. }
                | Operation::DeleteRecordProperty { .. }
                | Operation::DeleteQualifier { .. }
        )
    }

    /// Operations that remove or overwrite what is at their pointer
    pub fn is_destructive(&self) -> bool {
        self.is_deletion()
            || matches!(
                self,
                Operation::ReplaceNode { .. }
                    | Operation::ReplaceRecordProperty { .. }
                    | Operation::ReplaceTextValue { .. }
                    | Operation::UpdatePrimitiveValue { .. }
                    | Operation::SetFlags { .. }
            )
    }

    /// Operations that remove or replace the node at their pointer entirely
    pub fn removes_subtree(&self) -> bool {
        self.is_destructive() && !matches!(self, Operation::DeleteQualifier { .. })
    }

    /// Pointers this operation reads from besides its own pointer
    pub fn source_pointers(&self) -> &[Pointer] {
        match self {
            Operation::MoveCollectionValue { from_pointers, .. } => from_pointers,
            _ => &[],
        }
    }
}

/// Outcome of the optimizer for one submitted operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeCommand {
    /// Keep the operation unchanged
    Pick,
    /// Discard the operation
    Drop,
    /// Substitute the operation by zero or more operations
    Replace(Vec<Operation>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ElementKind;

    #[test]
    fn test_wire_shape() {
        let json = r#"{
            "type": "move-collection-value",
            "pointer": "/targets/0/terms/0/content/0",
            "index": 0,
            "fromPointers": ["/targets/0/terms/0/content/0/content/1"]
        }"#;
        let operation: Operation = serde_json::from_str(json).unwrap();
        assert_eq!(operation.kind(), "move-collection-value");
        assert_eq!(operation.index(), Some(0));
        assert_eq!(operation.source_pointers().len(), 1);

        let value = serde_json::to_value(&operation).unwrap();
        assert_eq!(value["type"], "move-collection-value");
        assert_eq!(value["fromPointers"][0], "/targets/0/terms/0/content/0/content/1");
    }

    #[test]
    fn test_insert_payload() {
        let json = r#"{
            "type": "insert-primitive-value",
            "pointer": "/targets/0/terms/0/content/0",
            "element": { "name": "String", "content": [ { "type": "text", "text": "a" } ] }
        }"#;
        let operation: Operation = serde_json::from_str(json).unwrap();
        assert!(operation.is_insert());
        assert!(!operation.is_destructive());
        assert_eq!(operation.element().map(Element::kind), Some(ElementKind::String));
        assert_eq!(operation.index(), None);
    }

    #[test]
    fn test_classification() {
        let pointer = Pointer::parse("/targets/0/assignments/0").unwrap();
        let delete = Operation::DeleteAnnotation {
            pointer: pointer.clone(),
        };
        assert!(delete.is_deletion());
        assert!(delete.is_destructive());

        let flags = Operation::SetFlags {
            pointer: pointer.clone(),
            value: "A/b".into(),
        };
        assert!(flags.is_destructive());
        assert!(!flags.is_deletion());

        let qualifier = Operation::DeleteQualifier { pointer };
        assert!(!qualifier.removes_subtree());
    }
}
