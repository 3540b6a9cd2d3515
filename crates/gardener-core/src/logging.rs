//! Structured logging field names for digital-gardener.
//!
//! All crates use these constants for structured `tracing` fields so a log
//! filter can query the same field across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | A command failed and the user was notified |
//! | WARN  | Recoverable issue, fallback applied (skipped file, empty index) |
//! | INFO  | Lifecycle events, command completions, vault mutations |
//! | DEBUG | Decision points, prompt sizes, request parameters |
//! | TRACE | Per-document iteration during indexing |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "vault", "inference", "agent", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "openai", "client", "composer", "index", "fs_store"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "request_json", "request_chat", "merge_frontmatter"
pub const OPERATION: &str = "op";

/// Command identifier being executed.
pub const COMMAND: &str = "command";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Vault-relative document path.
pub const PATH: &str = "path";

/// Number of documents scanned or affected.
pub const DOCUMENT_COUNT: &str = "document_count";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Byte length of a composed prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

/// Number of candidates returned by the model.
pub const CANDIDATE_COUNT: &str = "candidate_count";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

/// Sampling temperature sent with the request.
pub const TEMPERATURE: &str = "temperature";

/// Token budget sent with the request.
pub const MAX_TOKENS: &str = "max_tokens";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Failure classification for completion requests.
pub const FAILURE_KIND: &str = "failure_kind";
