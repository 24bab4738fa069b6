use std::collections::HashMap;
use std::ffi::{OsStr, OsString};

/// Read-only snapshot of the variables the shell was started with.
///
/// Only `PATH` is consulted during resolution; the whole map is handed to
/// every child as its environment, byte for byte.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<OsString, OsString>,
}

impl Environment {
    pub fn from_process() -> Self {
        Self { vars: std::env::vars_os().collect() }
    }

    pub fn get(&self, name: &str) -> Option<&OsStr> {
        self.vars.get(OsStr::new(name)).map(OsString::as_os_str)
    }

    pub fn path(&self) -> Option<&OsStr> {
        self.get("PATH")
    }

    pub fn vars(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }
}

impl<K: Into<OsString>, V: Into<OsString>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
