//! Tree-lowering engine for the tsdl downlevel compiler.
//!
//! The engine rewrites a parsed source file toward an older language
//! target by threading its nodes through a chain of lowering pipelines.
//! It is organized around a few cooperating pieces:
//!
//! - [`flags`]: per-node feature classification ([`TransformFlags`]) with a
//!   write-once cache, so pipelines can skip subtrees that contain nothing
//!   they lower.
//! - [`node_stack`]: the ancestor chain maintained by the driver, plus
//!   detachable [`ParentNavigator`] snapshots.
//! - [`name_generator`]: collision-free temp and unique names.
//! - [`lexical_environment`]: per-scope hoisting state.
//! - [`pipeline`]: output sinks and the visit driver.
//! - [`transformer`]: the per-run state bundle and the chain entry point,
//!   [`run_transformation_chain`].
//!
//! Parsed nodes are never mutated; rewrites synthesize replacement nodes
//! into the same arena and the engine reports the rewritten statement list.

pub mod flags;
pub mod lexical_environment;
pub mod name_generator;
pub mod node_stack;
pub mod pipeline;
pub mod transformer;

pub use flags::{FlagCache, TransformFlags, aggregate_transform_flags, compute_transform_flags};
pub use lexical_environment::LexicalEnvironment;
pub use name_generator::{NameGenerator, TempFlags, make_identifier_from_module_name};
pub use node_stack::{NodeStack, ParentNavigator};
pub use pipeline::{CoalesceMode, NodeSink, Pipeline, PipelineFlags, PipelineFn};
pub use transformer::{EmitResolver, NullResolver, Transformer, run_transformation_chain};
