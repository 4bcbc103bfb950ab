pub mod config;
pub mod logging;

pub mod cache;
pub mod decoder;
pub mod protocol;
pub mod resolver;
pub mod scan;
pub mod shortener;

pub use decoder::{decode, DecodeResult, Decoder};
pub use resolver::{FailureReason, ResolutionMethod, ResolutionOutcome, ShortenerResolver};
