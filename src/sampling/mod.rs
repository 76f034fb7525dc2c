//! Fixed-size uniform sampling over the trailing window of a stream.
mod window;


pub use window::{Sequenced, WindowSampler, validate_parameters};
