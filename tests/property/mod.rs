//! Property-based tests for selection and fan-out guarantees

mod selection;
