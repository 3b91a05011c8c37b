//! Domain model module declarations.

pub mod command;
