//! Pipeline stages for earnings-report analysis.
//!
//! Each submodule implements exactly one step, so each can be tested
//! without the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ upload ──▶ generate ──▶ parse
//! (stage)   (+ poll)   (Gemini)     (JSON)
//! ```
//!
//! 1. [`input`]   : resolve a path or URL, or stage raw bytes, to a local
//!    file that is removed when the run ends
//! 2. [`upload`]  : send the file to the Files API and poll its state with
//!    a bounded number of checks
//! 3. [`generate`]: one generation call with the fixed analyst prompt
//! 4. [`parse`]   : strip code fences and parse the text as JSON

pub mod generate;
pub mod input;
pub mod parse;
pub mod upload;
