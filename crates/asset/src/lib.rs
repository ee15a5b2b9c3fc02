//! Asset loading: OBJ/MTL parsers, texture decoding, byte-progress
//! reporting and the two-stage material-then-geometry load pipeline.

pub mod loader;
pub mod mesh;
pub mod mtl;
pub mod obj;
pub mod progress;
pub mod texture;

pub use loader::{FetchResource, FsFetcher, LoadError, LoadedObject, load_scene};
pub use progress::ProgressEvent;
