//! Taskgraph - task dependency graph analysis.
//!
//! This crate provides both a CLI application and a library for reasoning
//! about task dependency graphs. Its core is the circular dependency checker
//! consulted before a task's dependency set is changed.
//!
//! # Example
//!
//! ```
//! use taskgraph::checker::check_circularity;
//! use taskgraph::domain::{Task, TaskId};
//!
//! let tasks = vec![
//!     Task::new("A", "Design"),
//!     Task::new("B", "Build").with_dependencies(["A"]),
//! ];
//!
//! let result = check_circularity(&TaskId::new("A"), &[TaskId::new("B")], &tasks).unwrap();
//! assert!(result.has_circular);
//! assert_eq!(result.describe().as_deref(), Some("A → B → A"));
//! ```

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod checker;
pub mod config;
pub mod domain;
pub mod error;
pub mod graph;
pub mod snapshot;

// Public CLI module (needed by binary)
pub mod cli;

pub mod output;
