use thiserror::Error;

/// Structural failures that abort opening a movie.
///
/// Anything scoped to a single resource is reported through `Option` instead
/// and never ends up here.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("stream is too small to hold a movie header")]
    StreamTooSmall,
    #[error("projector header is truncated")]
    TruncatedProjectorHeader,
    #[error("unable to locate RIFX/XFIR magic")]
    MagicNotFound,
    #[error("movie header at offset {0} is truncated")]
    TruncatedHeader(usize),
    #[error("expected afterburner chunk '{expected}' but found '{found}'")]
    UnexpectedAfterburnerChunk { expected: String, found: String },
    #[error("afterburner map is corrupt: {0}")]
    CorruptAfterburnerMap(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
