//! Shell command parsing: tokenizer, pipeline decomposition, wrapper stripping.

mod error;
mod pipeline;
mod tokenizer;
mod wrappers;

pub use error::ParseError;
pub use pipeline::{
    Connector, Pipeline, PipelineStage, RedirectOp, RedirectionSpec, decompose, parse_pipeline,
};
pub use tokenizer::{Token, TokenKind, render_tokens, tokenize};
pub use wrappers::{is_wrapper, shell_payload, strip_wrappers};
