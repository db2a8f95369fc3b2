//! Nodes
//!
//! A node is a named reactive state cell: an opaque JSON value plus the
//! UI-relevant flags a rendering layer reads (visibility, disabled state and
//! a validation error).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::NodeId;

/// A reactive state cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier, immutable after creation.
    id: NodeId,

    /// The cell's value. The engine never interprets it.
    #[serde(default)]
    pub value: Value,

    /// Whether the control bound to this node should be shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,

    /// Whether the control bound to this node should accept input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,

    /// Current validation error, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Free-form data for collaborators (labels, option lists, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Node {
    /// Create a node with the given id and value and no flags set.
    pub fn new(id: impl Into<NodeId>, value: impl Into<Value>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
            visible: None,
            disabled: None,
            error: None,
            metadata: None,
        }
    }

    /// Set the visibility flag.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    /// Set the disabled flag.
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }

    /// Set the error message.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attach a metadata map.
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Get the node's id.
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Treats an unset visibility flag as visible.
    pub fn is_visible(&self) -> bool {
        self.visible.unwrap_or(true)
    }

    /// Treats an unset disabled flag as enabled.
    pub fn is_disabled(&self) -> bool {
        self.disabled.unwrap_or(false)
    }

    /// Merge a patch onto this node.
    ///
    /// Listed fields are replaced wholesale; nested structures in `value`
    /// and `metadata` are not merged.
    pub fn apply(&mut self, patch: NodePatch) {
        let NodePatch {
            value,
            visible,
            disabled,
            error,
            metadata,
        } = patch;

        if let Some(value) = value {
            self.value = value;
        }
        if let Some(visible) = visible {
            self.visible = visible;
        }
        if let Some(disabled) = disabled {
            self.disabled = disabled;
        }
        if let Some(error) = error {
            self.error = error;
        }
        if let Some(metadata) = metadata {
            self.metadata = metadata;
        }
    }
}

/// A partial update to a [`Node`].
///
/// Optional node fields use `Option<Option<T>>`: the outer `None` leaves the
/// field untouched, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub value: Option<Value>,
    pub visible: Option<Option<bool>>,
    pub disabled: Option<Option<bool>>,
    pub error: Option<Option<String>>,
    pub metadata: Option<Option<Map<String, Value>>>,
}

impl NodePatch {
    /// An empty patch. Applying it changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a patch that only replaces the value.
    pub fn value_only(value: impl Into<Value>) -> Self {
        Self::new().value(value)
    }

    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = Some(Some(visible));
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(Some(disabled));
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(Some(error.into()));
        self
    }

    pub fn clear_error(mut self) -> Self {
        self.error = Some(None);
        self
    }

    pub fn metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(Some(metadata));
        self
    }

    pub fn clear_metadata(mut self) -> Self {
        self.metadata = Some(None);
        self
    }

    /// Check whether applying this patch would leave a node untouched.
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
            && self.visible.is_none()
            && self.disabled.is_none()
            && self.error.is_none()
            && self.metadata.is_none()
    }
}
