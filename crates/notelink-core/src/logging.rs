//! Structured logging field name constants for notelink.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across both
//! services.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue (poison message, retried apply) |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, matched counts, config choices |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "api", "db", "bus", "consumer", "publisher"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pool", "memory_bus", "amqp", "link_consumer"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "publish", "apply", "link_note", "unlink_note"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Note UUID referenced by an envelope or request.
pub const NOTE_ID: &str = "note_id";

/// Event UUID referenced by an envelope or request.
pub const EVENT_ID: &str = "event_id";

/// Queue name an envelope was published to or consumed from.
pub const QUEUE: &str = "queue";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of documents matched by a link or unlink update.
pub const MATCHED: &str = "matched";

/// Apply attempt number for a delivery (1-based).
pub const ATTEMPT: &str = "attempt";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
