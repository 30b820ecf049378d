//! PC control boundary
//!
//! Catalog handlers never touch the OS directly; they are written against
//! the small set of primitives below. The desktop backend maps them onto
//! xdotool / xdg-open, the recording backend only remembers them.

pub mod desktop;
pub mod recording;

pub use desktop::DesktopControl;
pub use recording::{ControlCall, RecordingControl};

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("{program} exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{function} needs argument {position}")]
    MissingArgument {
        function: &'static str,
        position: usize,
    },

    #[error("Folder '{0}' is not one of the quick folders")]
    UnknownFolder(String),

    #[error("Home directory not available")]
    NoHomeDirectory,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Injected(String),
}

pub type ControlResult<T> = std::result::Result<T, ControlError>;

/// Keys the catalog presses, alone or in combinations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Super,
    Alt,
    Ctrl,
    Shift,
    Tab,
    Enter,
    F4,
    Up,
    Down,
    Left,
    Right,
    VolumeUp,
    VolumeDown,
    VolumeMute,
    Char(char),
}

impl Key {
    /// X keysym name understood by xdotool
    pub fn keysym(&self) -> String {
        match self {
            Key::Super => "super".into(),
            Key::Alt => "alt".into(),
            Key::Ctrl => "ctrl".into(),
            Key::Shift => "shift".into(),
            Key::Tab => "Tab".into(),
            Key::Enter => "Return".into(),
            Key::F4 => "F4".into(),
            Key::Up => "Up".into(),
            Key::Down => "Down".into(),
            Key::Left => "Left".into(),
            Key::Right => "Right".into(),
            Key::VolumeUp => "XF86AudioRaiseVolume".into(),
            Key::VolumeDown => "XF86AudioLowerVolume".into(),
            Key::VolumeMute => "XF86AudioMute".into(),
            Key::Char(c) => c.to_string(),
        }
    }
}

/// Side-effecting primitives owned by the PC-control collaborator
///
/// Every call either succeeds or returns an error; there is no other
/// return channel. Handlers compose these into catalog actions.
pub trait PcControl {
    /// Start a program by its catalog name ("chrome", "notepad", ...)
    fn launch(&mut self, program: &str) -> ControlResult<()>;

    /// Open a URL in the browser
    fn open_url(&mut self, url: &str) -> ControlResult<()>;

    /// Open a file or folder with the desktop's default handler
    fn open_path(&mut self, path: &Path) -> ControlResult<()>;

    /// Press a key combination at once (modifiers first)
    fn hotkey(&mut self, keys: &[Key]) -> ControlResult<()>;

    /// Press a single key `times` times
    fn press(&mut self, key: Key, times: u32) -> ControlResult<()>;

    /// Type text into the focused window
    fn type_text(&mut self, text: &str) -> ControlResult<()>;

    /// Create or overwrite a file
    fn write_file(&mut self, path: &Path, contents: &str) -> ControlResult<()>;

    /// Block for the given duration
    fn pause(&mut self, duration: Duration) -> ControlResult<()>;

    /// Base directory for quick folders and notes
    fn home_dir(&self) -> Option<PathBuf>;
}
