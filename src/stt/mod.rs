//! Speech-to-text backends.

pub mod http;
pub mod transcriber;

pub use http::HttpTranscriber;
pub use transcriber::{StubTranscriber, Transcriber};
