//! Request handlers

pub mod system;
