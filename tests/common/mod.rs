#![allow(dead_code)]

pub use procker_test_utils::capture::CaptureBuffer;
pub use procker_test_utils::fake_process::FakeProcess;
pub use procker_test_utils::{init_tracing, with_timeout};

/// Absolute path of a file under `tests/fixtures/`.
pub fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

/// `PATH=...` of the test runner, for processes with an explicit env list.
pub fn path_entry() -> String {
    format!("PATH={}", std::env::var("PATH").unwrap_or_default())
}
