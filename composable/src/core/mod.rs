//! Core scene graph types

pub mod entity;
