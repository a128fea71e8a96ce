//! Hosted service clients for voxplex
//!
//! This crate provides the answer-generation provider abstraction with its
//! OpenPerplex implementation, and the speech-to-text transcription client.

pub mod base;
pub mod openperplex;
pub mod transcription;

pub use base::{
    Answer, AnswerProvider, AnswerProviderFactory, ProviderError, ProviderResult, Source,
};
pub use openperplex::{OpenperplexClient, OpenperplexFactory};
pub use transcription::{TranscriptionError, TranscriptionService};
