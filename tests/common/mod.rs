#![allow(dead_code)]

pub use domwatch_test_utils::{init_tracing, with_timeout};
