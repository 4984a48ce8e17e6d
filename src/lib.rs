#![deny(missing_docs)]

//! Core library for the document and video summarizer.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Format detection and text extraction for PDF, DOCX, and plain text.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Audio extraction and speech-to-text for video input.
pub mod media;
/// Summarization metrics helpers.
pub mod metrics;
/// Chunking, hierarchical summarization, and pipeline orchestration.
pub mod processing;
/// Summarization backends and the retry/fallback decorator.
pub mod summarization;
