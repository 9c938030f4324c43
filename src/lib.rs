//! Semantic core of the Basecode bootstrap compiler.
//!
//! Pipeline, leaves first: a [`source`] buffer is lexed by [`lexer`] into a stream of
//! pool-interned [`token`]s, parsed by [`parser`] into a typed [`ast`], lowered by [`lower`] into
//! the [`element`] graph (the compiler's IR) via the [`scope`] manager, then driven through the
//! fixed [`semantic`] pass pipeline. [`session`] owns all of the above for one compilation run
//! and threads [`diagnostics`] and fatal [`error`]s throughout.
//!
//! The machine-code emitter, FFI loader, CLI front-end, and assembler are external collaborators
//! this crate exposes interfaces to ([`session`]'s config, [`element`]'s `on_emit_*`-shaped
//! hooks) but does not implement.
//!
//! ```
//! use basecode_core::session::{Session, SessionConfig};
//!
//! let mut session = Session::new(SessionConfig::default());
//! session.add_source("example.bc", "x := 42;");
//! let compiled = session.run().expect("no fatal error");
//! assert!(compiled.success());
//! ```

pub mod ast;
pub mod diagnostics;
pub mod element;
pub mod error;
pub mod lexer;
pub mod lower;
pub mod parser;
pub mod scope;
pub mod semantic;
pub mod session;
pub mod source;
pub mod token;

pub use error::{Error, Result};
pub use session::{CompiledSession, CompiledUnit, Session, SessionBuilder, SessionConfig};

#[cfg(test)]
mod scenario_tests;
