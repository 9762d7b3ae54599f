//! # Crypt Session
//!
//! The interactive hashing loop.
//!
//! Each iteration refills the randomness buffer, reads one passphrase into
//! locked storage, rejects control characters, asks the provider for a
//! setting and a hash, and prints `Hash: <result>`. An empty line or end of
//! input ends the session.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::io;
//!
//! use crypt_cleanup::SecurityContext;
//! use crypt_provider::CryptProvider;
//! use crypt_session::{InputMode, OsEntropy, Session, SessionConfig};
//! use crypt_terminal::RawStdin;
//!
//! # fn main() -> Result<(), crypt_session::SessionError> {
//! let context = SecurityContext::global();
//! let config = SessionConfig::new(Some("$2b$"), 4);
//! let mut session = Session::new(
//!     config,
//!     InputMode::Batch(RawStdin),
//!     CryptProvider::new(),
//!     OsEntropy,
//!     context,
//!     io::stdout(),
//!     io::stderr(),
//! )?;
//! let summary = session.run()?;
//! println!("{} hashed, {} rejected", summary.hashed, summary.rejected);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod entropy;
pub mod error;
pub mod session;
pub mod storage;

pub use config::SessionConfig;
pub use entropy::{EntropySource, OsEntropy};
pub use error::{EntropyError, SessionError};
pub use session::{InputMode, Session, SessionSummary, Step};
pub use storage::{CryptStorage, Regions, ENTROPY_SIZE, STORAGE_SIZE};
