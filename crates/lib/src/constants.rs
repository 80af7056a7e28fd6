//! Constants used throughout the z80unit library.
//!
//! This module provides central definitions for engine identifiers, reserved
//! tree names, and user-facing messages.

/// Identifier of the debugger engine that executes Z80 unit tests.
pub const DEFAULT_ENGINE_ID: &str = "maziac.z80-debug";

/// Display label of the root suite.
pub const ROOT_SUITE_LABEL: &str = "z80-unit-tests";

/// Id of the root suite. Requesting it runs every loaded test.
pub const ROOT_SUITE_ID: &str = "";

/// Separator between label segments.
pub const LABEL_SEPARATOR: char = '.';

/// Name of the per-project configuration file.
pub const CONFIG_FILE: &str = ".z80unit.json";

/// Message attached to a test case the engine reported as timed out.
pub const TIMED_OUT_MESSAGE: &str = "Timed out!";
