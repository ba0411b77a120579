//! Process module tests.
