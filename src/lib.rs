//! # File Envelope
//!
//! Password-derived keys and authenticated file envelopes.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     FILE ENVELOPE                         │
//! │  ┌──────────────────┐          ┌──────────────────────┐  │
//! │  │  KDF             │          │  ENVELOPE CODEC      │  │
//! │  │  PBKDF2-SHA256   │  key     │  AES-128-CBC         │  │
//! │  │  100k iterations ├─────────►│  HMAC-SHA256         │  │
//! │  └──────────────────┘ (caller) │  seal / open         │  │
//! │                                └──────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Model
//!
//! - 32-byte keys split into a 16-byte HMAC key and a 16-byte AES key
//! - Fresh random IV for every sealed payload
//! - Tag verified in constant time before anything is decrypted
//! - Key bytes zeroized on drop
//!
//! ## Boundary
//!
//! [`seal`] and [`open`] return an [`OperationResult`] and never an error:
//! callers branch on success, not on error propagation.

pub mod config;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod result;
pub mod token;

#[cfg(feature = "batch-ops")]
pub mod batch;

pub use config::EnvelopeConfig;
pub use crypto::{derive_key, derive_key_with, generate_key, DerivedKey, KdfParams, Salt, SymmetricKey};
pub use envelope::{inspect, open, open_text, opened_filename, seal, seal_text, sealed_filename};
pub use error::{EnvelopeError, EnvelopeResult};
pub use result::{OperationRecord, OperationResult};
pub use token::{Token, TokenInfo};

#[cfg(feature = "batch-ops")]
pub use batch::{open_batch, seal_batch, FileEntry};

/// File Envelope version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
