use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;

/// Tokens of one command line. Element zero is the program name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArgumentList {
    tokens: Vec<OsString>,
}

impl ArgumentList {
    pub fn program(&self) -> Option<&OsStr> {
        self.tokens.first().map(OsString::as_os_str)
    }

    /// Everything after the program name.
    pub fn args(&self) -> &[OsString] {
        self.tokens.get(1..).unwrap_or(&[])
    }

    #[cfg(test)]
    pub fn as_slice(&self) -> &[OsString] {
        &self.tokens
    }
}

/// Splits `line` on runs of spaces, keeping at most `max_tokens` tokens.
///
/// Tokens past the bound are dropped. No quoting or escaping is applied,
/// and only the space character delimits. Bytes are kept as-is, so a line
/// need not be valid UTF-8.
pub fn split_arguments<S: AsRef<OsStr> + ?Sized>(line: &S, max_tokens: usize) -> ArgumentList {
    let mut words = line.as_ref().as_bytes().split(|b| *b == b' ').filter(|w| !w.is_empty());
    let tokens: Vec<OsString> = words
        .by_ref()
        .take(max_tokens)
        .map(|w| OsStr::from_bytes(w).to_os_string())
        .collect();

    let dropped = words.count();
    if dropped > 0 {
        log::debug!("Dropped {} token(s) past the limit of {}", dropped, max_tokens);
    }

    ArgumentList { tokens }
}
