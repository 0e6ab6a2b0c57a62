//! Tracery Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Tracery layout
//! engine and its command-line front end. It includes:
//!
//! - **Geometry**: Integer points, dimensions, rectangles and directions ([`geometry`] module)
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Diagram**: The interaction diagram element model ([`diagram`] module)
//! - **Draw**: The SVG drawing surface and text measurement ([`draw`] module)

pub mod color;
pub mod diagram;
pub mod draw;
pub mod geometry;
