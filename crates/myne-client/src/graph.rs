//! Graph entities returned by action execution.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A node of the property graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub updated_at: String,
    pub authored_by: String,
    /// String-keyed properties as defined by the action's query.
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

/// A directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub id: String,
    pub name: String,
    pub updated_at: String,
    pub authored_by: String,
    /// Id of the node the edge points into.
    pub node_in_id: String,
    /// Id of the node the edge points out of.
    pub node_out_id: String,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

/// Deserialized response body of one action invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}
