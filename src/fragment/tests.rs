//! Unit tests for the splitting and reassembly subsystem.
