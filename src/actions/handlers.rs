//! One handler per catalog action
//!
//! Handlers compose `PcControl` primitives and return the context facts
//! the action produced. They never write the context themselves.

use crate::actions::args::ActionArgs;
use crate::actions::catalog::{ActionId, Handler};
use crate::context::ContextFact;
use crate::control::{ControlError, ControlResult, Key, PcControl};
use chrono::Local;
use std::path::PathBuf;
use std::time::Duration;

/// Most key presses a single volume action may send
pub const MAX_VOLUME_STEPS: u32 = 50;
/// Longest single wait, in seconds
pub const MAX_WAIT_SECS: f64 = 60.0;

const BROWSER: &str = "chrome";

type Facts = ControlResult<Vec<ContextFact>>;

/// The handler that runs `id`
pub fn handler_for(id: ActionId) -> Handler {
    match id {
        ActionId::OpenChrome => open_chrome,
        ActionId::OpenNotepad => open_notepad,
        ActionId::OpenCalculator => open_calculator,
        ActionId::OpenFileExplorer => open_file_explorer,
        ActionId::OpenProgram => open_program,
        ActionId::OpenCmd => open_cmd,
        ActionId::OpenSettings => open_settings,
        ActionId::SearchGoogle => search_google,
        ActionId::OpenUrl => open_url,
        ActionId::OpenYoutube => open_youtube,
        ActionId::MinimizeAll => minimize_all,
        ActionId::CloseWindow => close_window,
        ActionId::SwitchWindow => switch_window,
        ActionId::MaximizeWindow => maximize_window,
        ActionId::MinimizeWindow => minimize_window,
        ActionId::SnapLeft => snap_left,
        ActionId::SnapRight => snap_right,
        ActionId::TypeText => type_text,
        ActionId::Copy => copy,
        ActionId::Paste => paste,
        ActionId::Save => save,
        ActionId::Undo => undo,
        ActionId::SelectAll => select_all,
        ActionId::PressEnter => press_enter,
        ActionId::OpenFolder => open_folder,
        ActionId::QuickNote => quick_note,
        ActionId::VolumeUp => volume_up,
        ActionId::VolumeDown => volume_down,
        ActionId::VolumeMute => volume_mute,
        ActionId::Screenshot => screenshot,
        ActionId::Wait => wait,
    }
}

fn required_text(args: ActionArgs<'_>, id: ActionId, index: usize) -> ControlResult<String> {
    args.text(index).ok_or(ControlError::MissingArgument {
        function: id.name(),
        position: index + 1,
    })
}

fn launch_app(control: &mut dyn PcControl, program: &str, app: &str) -> Facts {
    control.launch(program)?;
    Ok(vec![ContextFact::App(app.to_string())])
}

fn hotkey(control: &mut dyn PcControl, keys: &[Key]) -> Facts {
    control.hotkey(keys)?;
    Ok(Vec::new())
}

/// Prefix a scheme when the model gave a bare host
pub fn normalize_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

fn browse(control: &mut dyn PcControl, url: &str) -> Facts {
    let url = normalize_url(url);
    control.open_url(&url)?;
    Ok(vec![
        ContextFact::App(BROWSER.to_string()),
        ContextFact::Url(url),
    ])
}

fn open_chrome(control: &mut dyn PcControl, _args: ActionArgs<'_>) -> Facts {
    launch_app(control, "chrome", "chrome")
}

fn open_notepad(control: &mut dyn PcControl, _args: ActionArgs<'_>) -> Facts {
    launch_app(control, "notepad", "notepad")
}

fn open_calculator(control: &mut dyn PcControl, _args: ActionArgs<'_>) -> Facts {
    launch_app(control, "calc", "calculadora")
}

fn open_cmd(control: &mut dyn PcControl, _args: ActionArgs<'_>) -> Facts {
    launch_app(control, "cmd", "cmd")
}

fn open_program(control: &mut dyn PcControl, args: ActionArgs<'_>) -> Facts {
    let name = required_text(args, ActionId::OpenProgram, 0)?;
    launch_app(control, &name, &name)
}

fn open_file_explorer(control: &mut dyn PcControl, _args: ActionArgs<'_>) -> Facts {
    hotkey(control, &[Key::Super, Key::Char('e')])
}

fn open_settings(control: &mut dyn PcControl, _args: ActionArgs<'_>) -> Facts {
    hotkey(control, &[Key::Super, Key::Char('i')])
}

fn search_google(control: &mut dyn PcControl, args: ActionArgs<'_>) -> Facts {
    let query = required_text(args, ActionId::SearchGoogle, 0)?;
    let url = format!(
        "https://www.google.com/search?q={}",
        urlencoding::encode(&query)
    );
    control.open_url(&url)?;
    Ok(vec![
        ContextFact::App(BROWSER.to_string()),
        ContextFact::Url(format!("google.com/search?q={}", query)),
        ContextFact::Search(query),
    ])
}

fn open_url(control: &mut dyn PcControl, args: ActionArgs<'_>) -> Facts {
    let url = required_text(args, ActionId::OpenUrl, 0)?;
    browse(control, &url)
}

fn open_youtube(control: &mut dyn PcControl, args: ActionArgs<'_>) -> Facts {
    let url = match args.text(0) {
        Some(query) => format!(
            "youtube.com/results?search_query={}",
            urlencoding::encode(&query).replace("%20", "+")
        ),
        None => "youtube.com".to_string(),
    };
    browse(control, &url)
}

fn minimize_all(control: &mut dyn PcControl, _args: ActionArgs<'_>) -> Facts {
    hotkey(control, &[Key::Super, Key::Char('d')])
}

fn close_window(control: &mut dyn PcControl, _args: ActionArgs<'_>) -> Facts {
    hotkey(control, &[Key::Alt, Key::F4])
}

fn switch_window(control: &mut dyn PcControl, _args: ActionArgs<'_>) -> Facts {
    hotkey(control, &[Key::Alt, Key::Tab])
}

fn maximize_window(control: &mut dyn PcControl, _args: ActionArgs<'_>) -> Facts {
    hotkey(control, &[Key::Super, Key::Up])
}

fn minimize_window(control: &mut dyn PcControl, _args: ActionArgs<'_>) -> Facts {
    hotkey(control, &[Key::Super, Key::Down])
}

fn snap_left(control: &mut dyn PcControl, _args: ActionArgs<'_>) -> Facts {
    hotkey(control, &[Key::Super, Key::Left])
}

fn snap_right(control: &mut dyn PcControl, _args: ActionArgs<'_>) -> Facts {
    hotkey(control, &[Key::Super, Key::Right])
}

fn type_text(control: &mut dyn PcControl, args: ActionArgs<'_>) -> Facts {
    control.type_text(&args.joined_text())?;
    Ok(Vec::new())
}

fn copy(control: &mut dyn PcControl, _args: ActionArgs<'_>) -> Facts {
    hotkey(control, &[Key::Ctrl, Key::Char('c')])
}

fn paste(control: &mut dyn PcControl, _args: ActionArgs<'_>) -> Facts {
    hotkey(control, &[Key::Ctrl, Key::Char('v')])
}

fn save(control: &mut dyn PcControl, _args: ActionArgs<'_>) -> Facts {
    hotkey(control, &[Key::Ctrl, Key::Char('s')])
}

fn undo(control: &mut dyn PcControl, _args: ActionArgs<'_>) -> Facts {
    hotkey(control, &[Key::Ctrl, Key::Char('z')])
}

fn select_all(control: &mut dyn PcControl, _args: ActionArgs<'_>) -> Facts {
    hotkey(control, &[Key::Ctrl, Key::Char('a')])
}

fn press_enter(control: &mut dyn PcControl, _args: ActionArgs<'_>) -> Facts {
    control.press(Key::Enter, 1)?;
    Ok(Vec::new())
}

/// Spoken folder name to its directory under home
pub fn quick_folder(name: &str) -> Option<&'static str> {
    match name.to_lowercase().as_str() {
        "escritorio" => Some("Desktop"),
        "descargas" => Some("Downloads"),
        "documentos" => Some("Documents"),
        "imagenes" | "imágenes" => Some("Pictures"),
        "videos" | "vídeos" => Some("Videos"),
        "musica" | "música" => Some("Music"),
        _ => None,
    }
}

fn open_folder(control: &mut dyn PcControl, args: ActionArgs<'_>) -> Facts {
    let name = required_text(args, ActionId::OpenFolder, 0)?;
    let dir = quick_folder(&name).ok_or_else(|| ControlError::UnknownFolder(name.clone()))?;
    let home = control.home_dir().ok_or(ControlError::NoHomeDirectory)?;
    control.open_path(&home.join(dir))?;
    Ok(Vec::new())
}

fn quick_note(control: &mut dyn PcControl, args: ActionArgs<'_>) -> Facts {
    let home = control.home_dir().ok_or(ControlError::NoHomeDirectory)?;
    let name = format!("nota_{}.txt", Local::now().format("%Y%m%d_%H%M%S"));
    let path: PathBuf = home.join("Desktop").join(name);

    control.write_file(&path, &args.joined_text())?;
    control.open_path(&path)?;
    Ok(vec![ContextFact::File(path.to_string_lossy().into_owned())])
}

fn volume_up(control: &mut dyn PcControl, args: ActionArgs<'_>) -> Facts {
    control.press(Key::VolumeUp, args.count(0, 1, MAX_VOLUME_STEPS))?;
    Ok(vec![ContextFact::VolumeChanged])
}

fn volume_down(control: &mut dyn PcControl, args: ActionArgs<'_>) -> Facts {
    control.press(Key::VolumeDown, args.count(0, 1, MAX_VOLUME_STEPS))?;
    Ok(vec![ContextFact::VolumeChanged])
}

fn volume_mute(control: &mut dyn PcControl, _args: ActionArgs<'_>) -> Facts {
    control.press(Key::VolumeMute, 1)?;
    Ok(Vec::new())
}

fn screenshot(control: &mut dyn PcControl, _args: ActionArgs<'_>) -> Facts {
    hotkey(control, &[Key::Super, Key::Shift, Key::Char('s')])
}

fn wait(control: &mut dyn PcControl, args: ActionArgs<'_>) -> Facts {
    let secs = args.seconds(0, 1.0, MAX_WAIT_SECS);
    control.pause(Duration::from_secs_f64(secs))?;
    Ok(Vec::new())
}
