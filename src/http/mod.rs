//! HTTP/1.x protocol implementation.
//!
//! One request is read per connection, one response is written, and the
//! connection is closed.
//!
//! # Architecture
//!
//! - **`connection`**: The per-connection read state machine and response write
//! - **`headers`**: Folds raw reads into headers and decides when framing is complete
//! - **`parser`**: Request line parsing and target normalization
//! - **`request`**: Method and parsed request representation
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Serializes and writes HTTP responses to the client
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← read ≤ 2048 bytes, bounded by idle + hard deadline
//!        └──────┬──────┘
//!               │
//!       ┌───────┼────────────┬──────────────┐
//!       ▼       ▼            ▼              ▼
//!   Complete  Malformed   TimedOut        Reset
//!       │       │            │              │
//!       │       └─────┬──────┘              │
//!       ▼             ▼                     ▼
//!    handler     400 Bad Request     close, no response
//!                (no response if zero bytes were received)
//! ```

pub mod connection;
pub mod headers;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
