//! Common types for the tsdl downlevel engine.
//!
//! This crate provides the handful of option types shared between the engine
//! and its collaborators:
//! - Language targets (`ScriptTarget`)
//! - Module output formats (`ModuleKind`)
//! - The compiler option bag handed to a transformation run (`CompilerOptions`)

pub mod common;
pub use common::{CompilerOptions, ModuleKind, ScriptTarget};
