//! Arena-based AST substrate for the tsdl downlevel engine.
//!
//! Nodes are stored contiguously in a [`NodeArena`] and referenced by
//! [`NodeIndex`], a stable integer id assigned at construction time. The
//! engine never mutates parsed nodes; synthesized nodes are appended to the
//! same arena and marked [`NodeFlags::SYNTHESIZED`].
//!
//! Sequences of nodes are [`NodeList`]s backed by `Arc<[NodeIndex]>`, so an
//! unchanged list can be returned by pointer identity and a rewritten list
//! can share its unchanged prefix cheaply.

pub mod arena;
pub mod base;
pub mod node;
pub mod syntax_kind;

pub use arena::NodeArena;
pub use base::{NodeIndex, NodeList};
pub use node::{Node, NodeData, NodeFlags};
pub use syntax_kind::SyntaxKind;
