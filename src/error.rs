use reqwest::StatusCode;
use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for coolcart.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; binary code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum CoolcartError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Backend API ─────────────────────────────────────────────────────
    #[error("api: {0}")]
    Api(#[from] ApiError),

    // ── Profile decoding ────────────────────────────────────────────────
    #[error("decode: {0}")]
    Decode(#[from] DecodeError),

    // ── Streaming chat responses ────────────────────────────────────────
    #[error("stream: {0}")]
    Stream(#[from] StreamError),

    // ── Durable client state ────────────────────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Backend API errors ─────────────────────────────────────────────────────

/// Normalized failure shape for every backend call.
///
/// `status` is `None` for transport-level failures (connect refused, TLS,
/// timeouts) where no HTTP response was received.
#[derive(Debug, Clone, Error)]
#[error("{message} [{code}]")]
pub struct ApiError {
    pub message: String,
    pub code: String,
    pub status: Option<StatusCode>,
}

impl ApiError {
    pub fn is_status(&self, status: StatusCode) -> bool {
        self.status == Some(status)
    }
}

// ─── Config errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("invalid api base url {url}: {reason}")]
    BaseUrl { url: String, reason: String },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Profile decode errors ──────────────────────────────────────────────────

/// Failures of the versioned profile decoder. Missing optional fields are
/// never an error (they default); wrong types and unknown enum words are.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("profile payload is not a JSON object")]
    NotAnObject,

    #[error("field {field}: expected {expected}, got {found}")]
    FieldType {
        field: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("field {field}: unknown value {value:?}")]
    UnknownVariant { field: &'static str, value: String },
}

// ─── Streaming errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream read failed: {0}")]
    Read(String),

    /// The stream completed without producing any text fragment. Callers
    /// treat this as a soft failure and fall back to the non-streaming call.
    #[error("stream produced no content")]
    Empty,

    #[error("stream cancelled")]
    Cancelled,
}

// ─── Durable state errors ───────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state dir unavailable: {0}")]
    StateDir(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, CoolcartError>;
