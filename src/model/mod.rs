//! Models: named SQL templates bound into immutable graph nodes.
//!
//! A [`ModelSpec`] is a template such as
//! `select * from {{orders}} where amount > {min}`. A [`ModelBuilder`] binds
//! its placeholders (`{min}` to a value or expression, `{{orders}}` to another
//! node) and produces a [`ModelNode`] whose identity is a hash of its content,
//! so structurally identical nodes compare equal wherever they were built.

mod binding;
mod builder;
mod node;
mod spec;

pub use binding::{Binding, Bindings, Scalar};
pub use builder::ModelBuilder;
pub use node::{ModelNode, NodeId, Reference};
pub use spec::ModelSpec;
