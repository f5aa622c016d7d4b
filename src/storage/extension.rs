//! Capability negotiation between a storage extension and its graph.

use crate::types::Result;

/// What a storage extension asks of the graph that hosts it.
///
/// A graph checks these requirements at construction time and seeds any
/// required extra fields with the declared defaults. Extensions without
/// data at a given level must refuse the corresponding default request
/// instead of returning a meaningless value.
pub trait GraphExtension {
    /// Whether the extension needs a per-node extra field.
    fn requires_node_field(&self) -> bool;

    /// Whether the extension needs a per-edge extra field.
    fn requires_edge_field(&self) -> bool;

    /// Default value for a freshly created node's extra field.
    fn default_node_field_value(&self) -> Result<i32>;

    /// Default value for a freshly created edge's extra field.
    fn default_edge_field_value(&self) -> i32;
}
