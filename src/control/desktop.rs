//! Desktop backend driven through xdotool and xdg-open

use crate::control::{ControlError, ControlResult, Key, PcControl};
use crate::core::config::ControlConfig;
use ahash::AHashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Controls the local X11/XWayland desktop
pub struct DesktopControl {
    aliases: AHashMap<String, String>,
    type_delay_ms: u64,
}

impl DesktopControl {
    pub fn new(config: &ControlConfig) -> Self {
        Self {
            aliases: config.program_aliases.clone(),
            type_delay_ms: config.type_delay_ms,
        }
    }

    /// Resolve a catalog program name to the executable to start
    pub fn executable_for<'a>(&'a self, program: &'a str) -> &'a str {
        self.aliases
            .get(&program.to_lowercase())
            .map(String::as_str)
            .unwrap_or(program)
    }

    fn run(&self, program: &str, args: &[&str]) -> ControlResult<()> {
        tracing::debug!("{} {}", program, args.join(" "));
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| ControlError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ControlError::CommandFailed {
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Start a program that outlives the action
///
/// A background thread waits on the child so it is reaped when it exits.
/// The returned handle yields its exit status.
fn spawn_detached(executable: &str) -> ControlResult<JoinHandle<Option<ExitStatus>>> {
    let mut child = Command::new(executable)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| ControlError::Spawn {
            program: executable.to_string(),
            source,
        })?;

    let program = executable.to_string();
    Ok(thread::spawn(move || match child.wait() {
        Ok(status) => {
            tracing::debug!("{} exited with {}", program, status);
            Some(status)
        }
        Err(e) => {
            tracing::warn!("Could not wait for {}: {}", program, e);
            None
        }
    }))
}

impl PcControl for DesktopControl {
    fn launch(&mut self, program: &str) -> ControlResult<()> {
        let executable = self.executable_for(program).to_string();
        tracing::info!("Launching {} ({})", program, executable);

        spawn_detached(&executable)?;
        Ok(())
    }

    fn open_url(&mut self, url: &str) -> ControlResult<()> {
        self.run("xdg-open", &[url])
    }

    fn open_path(&mut self, path: &Path) -> ControlResult<()> {
        let path = path.to_string_lossy();
        self.run("xdg-open", &[path.as_ref()])
    }

    fn hotkey(&mut self, keys: &[Key]) -> ControlResult<()> {
        let combo = keys
            .iter()
            .map(Key::keysym)
            .collect::<Vec<_>>()
            .join("+");
        self.run("xdotool", &["key", &combo])
    }

    fn press(&mut self, key: Key, times: u32) -> ControlResult<()> {
        if times == 0 {
            return Ok(());
        }
        let repeat = times.to_string();
        let keysym = key.keysym();
        self.run(
            "xdotool",
            &["key", "--repeat", &repeat, "--delay", "100", &keysym],
        )
    }

    fn type_text(&mut self, text: &str) -> ControlResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        let delay = self.type_delay_ms.to_string();
        self.run("xdotool", &["type", "--delay", &delay, "--", text])
    }

    fn write_file(&mut self, path: &Path, contents: &str) -> ControlResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn pause(&mut self, duration: Duration) -> ControlResult<()> {
        thread::sleep(duration);
        Ok(())
    }

    fn home_dir(&self) -> Option<PathBuf> {
        std::env::var_os("HOME").map(PathBuf::from)
    }
}
