//! Blocking client for image-to-mesh apps served through Gradio's `/call` API.

mod client;
mod error;
#[cfg(test)]
mod fake_app;
pub mod schemas;
pub mod space;
pub mod sse;

pub use error::ClientError;
pub use client::{GradioClient, GradioConfig, GradioSession, Routes, DEFAULT_SPACE, DEFAULT_TIMEOUT};
