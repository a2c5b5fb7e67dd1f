//! Low-level helper utilities.

pub mod backend;
pub mod cache;
pub mod command;
pub mod copy;
pub mod git_backend;
pub mod git_ops;
pub mod hash;
pub mod ignore;
pub mod layout;
pub mod lock;
pub mod memory;
