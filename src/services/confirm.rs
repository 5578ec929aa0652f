//! Operator confirmation for the manual upload step.

use std::io::{self, BufRead};
use std::path::PathBuf;

/// What the operator is asked to do before the run continues
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// The bare repository to copy
    pub bare_repo: PathBuf,
    /// Where it has to end up
    pub remote: String,
}

/// Blocks until the operator has copied the bare repository.
///
/// `Ok(false)` means the operator did not confirm and the run stops.
pub trait Confirm {
    fn confirm_upload(&mut self, request: &UploadRequest) -> io::Result<bool>;
}

impl<F> Confirm for F
where
    F: FnMut(&UploadRequest) -> io::Result<bool>,
{
    fn confirm_upload(&mut self, request: &UploadRequest) -> io::Result<bool> {
        self(request)
    }
}

/// Waits for one line on a reader, normally stdin.
///
/// Any line confirms; end of input does not.
pub struct LineConfirm<R> {
    reader: R,
}

impl<R: BufRead> LineConfirm<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl LineConfirm<io::StdinLock<'static>> {
    /// Confirm from the process's standard input
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock())
    }
}

impl<R: BufRead> Confirm for LineConfirm<R> {
    fn confirm_upload(&mut self, request: &UploadRequest) -> io::Result<bool> {
        tracing::debug!(
            "Waiting for upload of {} to {}",
            request.bare_repo.display(),
            request.remote
        );
        let mut line = String::new();
        let read = self.reader.read_line(&mut line)?;
        Ok(read > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn request() -> UploadRequest {
        UploadRequest {
            bare_repo: PathBuf::from("/tmp/Demo.git"),
            remote: "http://alice@host/repos/Demo.git".to_string(),
        }
    }

    #[test]
    fn test_enter_confirms() {
        let mut confirm = LineConfirm::new(Cursor::new("\n"));
        assert!(confirm.confirm_upload(&request()).unwrap());
    }

    #[test]
    fn test_end_of_input_does_not_confirm() {
        let mut confirm = LineConfirm::new(Cursor::new(""));
        assert!(!confirm.confirm_upload(&request()).unwrap());
    }

    #[test]
    fn test_reads_one_line_per_confirmation() {
        let mut confirm = LineConfirm::new(Cursor::new("yes\n"));
        assert!(confirm.confirm_upload(&request()).unwrap());
        assert!(!confirm.confirm_upload(&request()).unwrap());
    }

    #[test]
    fn test_closure_confirm() {
        let mut seen = Vec::new();
        let mut confirm = |req: &UploadRequest| {
            seen.push(req.remote.clone());
            Ok::<_, io::Error>(true)
        };
        assert!(confirm.confirm_upload(&request()).unwrap());
        assert_eq!(seen, vec!["http://alice@host/repos/Demo.git"]);
    }
}
