//! # doc-canvas
//!
//! Citation-anchored artifacts from a single document.
//!
//! doc-canvas ingests one PDF, EPUB, or plain-text file, splits it into
//! overlapping chunks that each carry a precise source location, and
//! derives structured artifacts (outline, summaries, runbook, flowchart,
//! tables, Q&A seeds, answers) in which every item cites the span of
//! source text that supports it. A validator flags uncited items and a
//! differ compares two builds of the same document.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌────────────────┐
//! │  Decoders   │──▶│   Chunker    │──▶│   Generators   │
//! │ PDF/EPUB/Tx │   │  Citations   │   │ outline … qa   │
//! └─────────────┘   └──────────────┘   └───────┬────────┘
//!                                              │
//!                    ┌───────────────┬─────────┴──────┐
//!                    ▼               ▼                ▼
//!              ┌──────────┐    ┌──────────┐     ┌──────────┐
//!              │ Validate │    │   Diff   │     │  Viewer  │
//!              └──────────┘    └──────────┘     └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! canvas ingest ops-guide.pdf --out pack.json
//! canvas runbook pack.json
//! canvas validate pack.json --fail-on error
//! canvas view pack.json
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Pack data types and citation invariants |
//! | [`text`] | Whitespace, sentence, HTML, and char-offset helpers |
//! | [`chunk`] | Sliding-window chunking |
//! | [`citation`] | Excerpt resolution |
//! | [`retrieval`] | Keyword ranking |
//! | [`generate`] | Artifact generators |
//! | [`ask`] | Question answering |
//! | [`completion`] | Completion backend abstraction |
//! | [`validate`] | Citation completeness and fail policy |
//! | [`diff`] | Pack comparison |
//! | [`pack`] | Build, save, load, and check packs |
//! | [`extract`] | PDF, EPUB, and text decoders |
//! | [`ingest`] | File to pack |
//! | [`render`] | Text renderings for the CLI |
//! | [`server`] | Local viewer server |
//! | [`config`] | TOML configuration parsing |

pub mod ask;
pub mod chunk;
pub mod citation;
pub mod completion;
pub mod config;
pub mod diff;
pub mod extract;
pub mod generate;
pub mod ingest;
pub mod models;
pub mod pack;
pub mod render;
pub mod retrieval;
pub mod server;
pub mod text;
pub mod validate;
