//! Unit tests for the protocol surface.
