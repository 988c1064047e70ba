//! Tiny knowledge graph: entities and their mentions in memories.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub entity_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMention {
    pub memory_id: String,
    pub entity_id: String,
}
