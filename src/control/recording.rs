//! Dry-run backend that records calls instead of performing them

use crate::control::{ControlError, ControlResult, Key, PcControl};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One primitive call as seen by the backend
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCall {
    Launch(String),
    OpenUrl(String),
    OpenPath(PathBuf),
    Hotkey(Vec<Key>),
    Press(Key, u32),
    TypeText(String),
    WriteFile(PathBuf, String),
    Pause(Duration),
}

/// Records every primitive; optionally fails on a chosen call
///
/// Used by `--dry-run` and by tests that need to observe side effects
/// without a desktop.
#[derive(Debug, Default)]
pub struct RecordingControl {
    calls: Vec<ControlCall>,
    fail_on_call: Option<usize>,
    home: Option<PathBuf>,
}

impl RecordingControl {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            fail_on_call: None,
            home: Some(PathBuf::from("/home/neo")),
        }
    }

    /// Fail the n-th primitive call (1-indexed) and every call after it
    pub fn failing_on_call(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    /// Pretend there is no home directory
    pub fn without_home(mut self) -> Self {
        self.home = None;
        self
    }

    pub fn calls(&self) -> &[ControlCall] {
        &self.calls
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    fn record(&mut self, call: ControlCall) -> ControlResult<()> {
        let n = self.calls.len() + 1;
        if let Some(fail_at) = self.fail_on_call {
            if n >= fail_at {
                tracing::debug!("Dry run: injected failure on call {} ({:?})", n, call);
                self.calls.push(call);
                return Err(ControlError::Injected(format!("injected failure on call {}", n)));
            }
        }
        tracing::info!("Dry run: {:?}", call);
        self.calls.push(call);
        Ok(())
    }
}

impl PcControl for RecordingControl {
    fn launch(&mut self, program: &str) -> ControlResult<()> {
        self.record(ControlCall::Launch(program.to_string()))
    }

    fn open_url(&mut self, url: &str) -> ControlResult<()> {
        self.record(ControlCall::OpenUrl(url.to_string()))
    }

    fn open_path(&mut self, path: &Path) -> ControlResult<()> {
        self.record(ControlCall::OpenPath(path.to_path_buf()))
    }

    fn hotkey(&mut self, keys: &[Key]) -> ControlResult<()> {
        self.record(ControlCall::Hotkey(keys.to_vec()))
    }

    fn press(&mut self, key: Key, times: u32) -> ControlResult<()> {
        self.record(ControlCall::Press(key, times))
    }

    fn type_text(&mut self, text: &str) -> ControlResult<()> {
        self.record(ControlCall::TypeText(text.to_string()))
    }

    fn write_file(&mut self, path: &Path, contents: &str) -> ControlResult<()> {
        self.record(ControlCall::WriteFile(path.to_path_buf(), contents.to_string()))
    }

    fn pause(&mut self, duration: Duration) -> ControlResult<()> {
        self.record(ControlCall::Pause(duration))
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let mut control = RecordingControl::new();
        control.launch("chrome").unwrap();
        control.hotkey(&[Key::Ctrl, Key::Char('c')]).unwrap();

        assert_eq!(
            control.calls(),
            &[
                ControlCall::Launch("chrome".into()),
                ControlCall::Hotkey(vec![Key::Ctrl, Key::Char('c')]),
            ]
        );
    }

    #[test]
    fn test_injected_failure() {
        let mut control = RecordingControl::new().failing_on_call(2);
        assert!(control.launch("chrome").is_ok());
        assert!(matches!(
            control.type_text("hola"),
            Err(ControlError::Injected(_))
        ));
        assert!(control.press(Key::Enter, 1).is_err());
        assert_eq!(control.calls().len(), 3);
    }
}
