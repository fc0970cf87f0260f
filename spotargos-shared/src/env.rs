//! Process environment access.
//!
//! Everything that reads environment variables goes through [`ENV`]. With the
//! `test-impl` feature the process environment is replaced by an in-memory map, so tests
//! can set `HOME`, `DEBUG` and friends without touching the real environment of the
//! test runner.

use std::{ffi::OsString, sync::LazyLock};

#[cfg(feature = "test-impl")]
type Vars = std::sync::Mutex<std::collections::HashMap<String, String>>;

pub struct Env {
    #[cfg(feature = "test-impl")]
    vars: Vars,
}

pub static ENV: LazyLock<Env> = LazyLock::new(|| Env {
    #[cfg(feature = "test-impl")]
    vars: Vars::default(),
});

impl Env {
    /// Returns the value only if it is set and valid unicode.
    pub fn var(&self, key: &str) -> Option<String> {
        #[cfg(not(feature = "test-impl"))]
        return std::env::var(key).ok();

        #[cfg(feature = "test-impl")]
        return self.lock().get(key).cloned();
    }

    pub fn var_os(&self, key: &str) -> Option<OsString> {
        #[cfg(not(feature = "test-impl"))]
        return std::env::var_os(key);

        #[cfg(feature = "test-impl")]
        return self.var(key).map(OsString::from);
    }

    /// `true` when `key` is set to exactly `expected`.
    pub fn is(&self, key: &str, expected: &str) -> bool {
        self.var(key).is_some_and(|value| value == expected)
    }
}

#[cfg(feature = "test-impl")]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used)]
impl Env {
    fn lock(&self) -> std::sync::MutexGuard<'_, std::collections::HashMap<String, String>> {
        self.vars.lock().unwrap()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) {
        self.lock().remove(key);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
