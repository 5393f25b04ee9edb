//! voxpost - record a voice memo, play it back and upload it
//!
//! Captures microphone audio in periodic chunks, assembles them into one
//! recording when capture stops, plays the recording back locally and POSTs
//! it to an HTTP endpoint.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Value objects, the recording session entity, and errors
//! - **Application**: The recorder controller use case and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal, reqwest, rodio, XDG config)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
