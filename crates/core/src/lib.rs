//! Arbor Core - foundational types for the Arbor state tree.
//!
//! This crate provides the types every other Arbor crate builds on:
//!
//! - `Value`: the dynamically-typed payload held by a tree node
//!   (scalars, lists, and string-keyed composites)
//! - `Path`: dot-delimited addressing of nodes from the root
//! - `Error`: error types for path resolution and propagation
//!
//! # Example
//!
//! ```rust
//! use arbor_core::{Path, Value};
//!
//! let path = Path::parse("todos.list").unwrap();
//! assert_eq!(path.depth(), 2);
//! assert_eq!(path.key(), Some("list"));
//!
//! let todos = Value::map([
//!     ("list", Value::List(vec![Value::Int(42)])),
//!     ("error", Value::Null),
//! ]);
//! assert!(todos.is_composite());
//! assert_eq!(todos.get("error"), Some(&Value::Null));
//! ```

#![no_std]

extern crate alloc;

mod error;
mod path;
mod value;

pub use error::{Error, Result};
pub use path::Path;
pub use value::{Value, ValueMap};
