//! SketchScene Core Types and Definitions
//!
//! This crate provides the foundational types of a SketchScene document. It
//! includes:
//!
//! - **Values**: The tagged field value union ([`value::FieldValue`])
//! - **Elements**: Ordered element records ([`element::ElementRecord`])
//! - **Documents**: The scene document envelope ([`document::SceneDocument`])

pub mod document;
pub mod element;
pub mod value;
