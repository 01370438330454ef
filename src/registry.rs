//! Named component registries with parent fallback.
//!
//! A [`Registry`] maps string identifiers to constructors so that a component
//! can be picked by name from a declarative configuration. Each registry
//! belongs to a *scope* (the project that owns it) and may hold a parent
//! registry, usually the framework-wide table of the same kind:
//!
//! - `resolve("Name")` looks in the local table first, then walks the parent
//!   chain.
//! - `resolve("scope.Name")` jumps to the table in the chain whose scope is
//!   `scope` and resolves `Name` from there.
//!
//! Registering a name twice in the same table is an error; the first
//! registration stays in place.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::config::build_bdd100k;
use crate::dataset::{Bdd100kDataset, DetectionDataset};
use crate::error::ArmitageError;

/// Scope of the registries this crate declares.
pub const LOCAL_SCOPE: &str = "armitage";

/// Scope conventionally used for framework-wide parent registries.
pub const FRAMEWORK_SCOPE: &str = "engine";

/// Builds a dataset from its configuration parameters.
pub type DatasetFactory = fn(&Value) -> Result<Box<dyn DetectionDataset>, ArmitageError>;

/// A name-to-component table with an optional parent.
pub struct Registry<T> {
    name: String,
    scope: String,
    entries: BTreeMap<String, T>,
    parent: Option<Arc<Registry<T>>>,
}

impl<T> Registry<T> {
    /// Creates a root registry with no parent.
    pub fn new(name: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: scope.into(),
            entries: BTreeMap::new(),
            parent: None,
        }
    }

    /// Creates a registry that falls back to `parent` on lookup misses.
    pub fn with_parent(
        name: impl Into<String>,
        scope: impl Into<String>,
        parent: Arc<Registry<T>>,
    ) -> Self {
        Self {
            parent: Some(parent),
            ..Self::new(name, scope)
        }
    }

    /// Creates a registry named after `kind`.
    pub fn for_kind(
        kind: RegistryKind,
        scope: impl Into<String>,
        parent: Option<Arc<Registry<T>>>,
    ) -> Self {
        Self {
            parent,
            ..Self::new(kind.name(), scope)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn parent(&self) -> Option<&Registry<T>> {
        self.parent.as_deref()
    }

    /// Adds `item` under `name` in this table.
    ///
    /// # Errors
    /// Fails with [`ArmitageError::AlreadyRegistered`] if this table already
    /// holds `name`. Entries in parent tables do not count.
    pub fn register(&mut self, name: impl Into<String>, item: T) -> Result<(), ArmitageError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(ArmitageError::AlreadyRegistered {
                registry: self.name.clone(),
                name,
            });
        }
        tracing::debug!(registry = %self.name, scope = %self.scope, %name, "registered component");
        self.entries.insert(name, item);
        Ok(())
    }

    /// Looks up `key`, which is either `Name` or `scope.Name`.
    pub fn resolve(&self, key: &str) -> Result<&T, ArmitageError> {
        match key.split_once('.') {
            Some((scope, name)) => {
                let target = self.scoped(scope).ok_or_else(|| ArmitageError::UnknownScope {
                    registry: self.name.clone(),
                    scope: scope.to_string(),
                })?;
                target.resolve_unscoped(name)
            }
            None => self.resolve_unscoped(key),
        }
    }

    fn resolve_unscoped(&self, name: &str) -> Result<&T, ArmitageError> {
        let mut current = Some(self);
        while let Some(registry) = current {
            if let Some(item) = registry.entries.get(name) {
                tracing::debug!(registry = %registry.name, scope = %registry.scope, name, "resolved component");
                return Ok(item);
            }
            current = registry.parent();
        }
        Err(ArmitageError::NotRegistered {
            registry: self.name.clone(),
            name: name.to_string(),
        })
    }

    /// Returns the table in the chain (this one included) owned by `scope`.
    pub fn scoped(&self, scope: &str) -> Option<&Registry<T>> {
        let mut current = Some(self);
        while let Some(registry) = current {
            if registry.scope == scope {
                return Some(registry);
            }
            current = registry.parent();
        }
        None
    }

    /// True if this table itself holds `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Names registered in this table, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .field("parent", &self.parent)
            .finish()
    }
}

/// The kinds of component registry a project declares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegistryKind {
    Runner,
    RunnerConstructor,
    Loop,
    Hook,
    Dataset,
    Transform,
    Model,
    ModelWrapper,
    WeightInitializer,
    Optimizer,
    OptimWrapper,
    OptimWrapperConstructor,
    ParamScheduler,
    Metric,
    Evaluator,
    TaskUtil,
    Visualizer,
    VisBackend,
    LogProcessor,
}

impl RegistryKind {
    pub const ALL: [RegistryKind; 19] = [
        RegistryKind::Runner,
        RegistryKind::RunnerConstructor,
        RegistryKind::Loop,
        RegistryKind::Hook,
        RegistryKind::Dataset,
        RegistryKind::Transform,
        RegistryKind::Model,
        RegistryKind::ModelWrapper,
        RegistryKind::WeightInitializer,
        RegistryKind::Optimizer,
        RegistryKind::OptimWrapper,
        RegistryKind::OptimWrapperConstructor,
        RegistryKind::ParamScheduler,
        RegistryKind::Metric,
        RegistryKind::Evaluator,
        RegistryKind::TaskUtil,
        RegistryKind::Visualizer,
        RegistryKind::VisBackend,
        RegistryKind::LogProcessor,
    ];

    /// Display name used in registry errors and listings.
    pub fn name(&self) -> &'static str {
        match self {
            RegistryKind::Runner => "runner",
            RegistryKind::RunnerConstructor => "runner constructor",
            RegistryKind::Loop => "loop",
            RegistryKind::Hook => "hook",
            RegistryKind::Dataset => "dataset",
            RegistryKind::Transform => "transform",
            RegistryKind::Model => "model",
            RegistryKind::ModelWrapper => "model_wrapper",
            RegistryKind::WeightInitializer => "weight initializer",
            RegistryKind::Optimizer => "optimizer",
            RegistryKind::OptimWrapper => "optim_wrapper",
            RegistryKind::OptimWrapperConstructor => "optimizer constructor",
            RegistryKind::ParamScheduler => "parameter scheduler",
            RegistryKind::Metric => "metric",
            RegistryKind::Evaluator => "evaluator",
            RegistryKind::TaskUtil => "task util",
            RegistryKind::Visualizer => "visualizer",
            RegistryKind::VisBackend => "vis_backend",
            RegistryKind::LogProcessor => "log_processor",
        }
    }

    /// What the registry manages.
    pub fn description(&self) -> &'static str {
        match self {
            RegistryKind::Runner => "runners, e.g. epoch- or iteration-based",
            RegistryKind::RunnerConstructor => "how runners are initialized",
            RegistryKind::Loop => "train, val and test loops",
            RegistryKind::Hook => "hooks such as checkpointing",
            RegistryKind::Dataset => "datasets",
            RegistryKind::Transform => "data preprocessing steps",
            RegistryKind::Model => "model modules",
            RegistryKind::ModelWrapper => "distributed model wrappers",
            RegistryKind::WeightInitializer => "weight initialization schemes",
            RegistryKind::Optimizer => "optimizers",
            RegistryKind::OptimWrapper => "optimizer wrappers, e.g. mixed precision",
            RegistryKind::OptimWrapperConstructor => "per-parameter optimizer settings",
            RegistryKind::ParamScheduler => "learning-rate and momentum schedules",
            RegistryKind::Metric => "evaluation metrics",
            RegistryKind::Evaluator => "metric collections",
            RegistryKind::TaskUtil => "anchor generators, box coders",
            RegistryKind::Visualizer => "prediction drawing",
            RegistryKind::VisBackend => "log storage backends",
            RegistryKind::LogProcessor => "log statistics windows",
        }
    }
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Builds this crate's dataset registry, with the BDD100K dataset registered.
pub fn datasets(
    parent: Option<Arc<Registry<DatasetFactory>>>,
) -> Result<Registry<DatasetFactory>, ArmitageError> {
    let mut registry = Registry::for_kind(RegistryKind::Dataset, LOCAL_SCOPE, parent);
    registry.register(Bdd100kDataset::TYPE_NAME, build_bdd100k as DatasetFactory)?;
    Ok(registry)
}
