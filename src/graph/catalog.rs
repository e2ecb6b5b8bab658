//! Name → node lookup for deferred references.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{ModelError, ModelResult};
use crate::model::ModelNode;

/// Models registered by name, used to resolve
/// [`Binding::Deferred`](crate::model::Binding::Deferred) at assembly time.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: BTreeMap<String, Arc<ModelNode>>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node under its own name.
    ///
    /// Registering the same node twice is a no-op; a different node with an
    /// already registered name fails with `DuplicateModel`.
    pub fn register(&mut self, node: Arc<ModelNode>) -> ModelResult<()> {
        match self.models.get(node.name()) {
            Some(existing) if existing.id() == node.id() => Ok(()),
            Some(_) => Err(ModelError::DuplicateModel {
                name: node.name().to_string(),
            }),
            None => {
                self.models.insert(node.name().to_string(), node);
                Ok(())
            }
        }
    }

    /// Builder-style [`ModelCatalog::register`].
    pub fn with(mut self, node: Arc<ModelNode>) -> ModelResult<Self> {
        self.register(node)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ModelNode>> {
        self.models.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
