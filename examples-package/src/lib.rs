//! Runnable examples for the quake crates; see the `examples/` directory.
