//! Document tree core for the Trellis UI runtime.
//!
//! A [`DomManager`] owns one document: a node registry keyed by [`NodeId`],
//! the root node, a [`RenderManager`] bridge and two listener registries.
//! Callers describe mutations with [`NodeDescriptor`]s, group them between
//! [`DomManager::begin_batch`] and [`DomManager::end_batch`], and the batch is
//! committed on the document's [`TaskRunner`] in a single pass.

pub mod batch;
pub mod collections;
pub mod config;
pub mod error;
pub mod listener;
pub mod manager;
pub mod manager_registry;
pub mod node;
pub mod platform;
pub mod registry;
pub mod value;

mod document;

pub use batch::{BatchOperation, ChangeKind, CommitReport, NodeChange, OperationKind, SkippedOperation};
pub use config::{DocumentConfig, IdleOperationPolicy};
pub use error::{CallFunctionError, DomError, RenderError};
pub use listener::{
    DomTreeEvent, DomTreeEventKind, DomTreeEventListener, ListenerId, TouchEvent,
    TouchEventKind, TouchEventListener,
};
pub use manager::DomManager;
pub use manager_registry::{DocumentFactory, DomManagerRegistry};
pub use node::{DomNode, LayoutResult, NodeDescriptor, NodeId, RootId};
pub use platform::{
    CallFunctionCallback, CallFunctionResult, FunctionResponder, LayoutService, RenderManager,
    Task, TaskRunner,
};
pub use registry::DomNodeRegistry;
pub use value::{props, DomValue, PropertyMap};
