//! Cross-module test suites
//!
//! Unit tests live next to the code they cover; these suites exercise the
//! editor, serialization and rendering layers together through the theme
//! blocks.
