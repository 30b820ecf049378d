//! Action definitions and catalog
//!
//! The catalog is both the allowlist and the dispatch table: a name is
//! permitted exactly when it maps to a handler here, so the two cannot
//! drift apart.

use crate::actions::args::ActionArgs;
use crate::actions::handlers;
use crate::context::ContextFact;
use crate::control::{ControlResult, PcControl};
use crate::core::error::{NeoError, Result};
use ahash::AHashMap;

/// Unique action identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionId {
    OpenChrome,
    OpenNotepad,
    OpenCalculator,
    OpenFileExplorer,
    OpenProgram,
    OpenCmd,
    OpenSettings,
    SearchGoogle,
    OpenUrl,
    OpenYoutube,
    MinimizeAll,
    CloseWindow,
    SwitchWindow,
    MaximizeWindow,
    MinimizeWindow,
    SnapLeft,
    SnapRight,
    TypeText,
    Copy,
    Paste,
    Save,
    Undo,
    SelectAll,
    PressEnter,
    OpenFolder,
    QuickNote,
    VolumeUp,
    VolumeDown,
    VolumeMute,
    Screenshot,
    Wait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionCategory {
    Programs,
    Web,
    Windows,
    Text,
    Files,
    Media,
    System,
}

impl ActionCategory {
    pub fn title(&self) -> &'static str {
        match self {
            ActionCategory::Programs => "PROGRAMAS",
            ActionCategory::Web => "WEB",
            ActionCategory::Windows => "VENTANAS",
            ActionCategory::Text => "ESCRITURA",
            ActionCategory::Files => "ARCHIVOS",
            ActionCategory::Media => "MULTIMEDIA",
            ActionCategory::System => "SISTEMA",
        }
    }
}

/// Declared argument shape, used for prompts and dispatch diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many positional arguments, by name
    Fixed(&'static [&'static str]),
    /// Any number of text arguments, joined with spaces
    Variadic(&'static str),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Fixed(params) => params.len() == count,
            Arity::Variadic(_) => count >= 1,
        }
    }
}

impl ActionId {
    pub const ALL: [ActionId; 31] = [
        ActionId::OpenChrome,
        ActionId::OpenNotepad,
        ActionId::OpenCalculator,
        ActionId::OpenFileExplorer,
        ActionId::OpenProgram,
        ActionId::OpenCmd,
        ActionId::OpenSettings,
        ActionId::SearchGoogle,
        ActionId::OpenUrl,
        ActionId::OpenYoutube,
        ActionId::MinimizeAll,
        ActionId::CloseWindow,
        ActionId::SwitchWindow,
        ActionId::MaximizeWindow,
        ActionId::MinimizeWindow,
        ActionId::SnapLeft,
        ActionId::SnapRight,
        ActionId::TypeText,
        ActionId::Copy,
        ActionId::Paste,
        ActionId::Save,
        ActionId::Undo,
        ActionId::SelectAll,
        ActionId::PressEnter,
        ActionId::OpenFolder,
        ActionId::QuickNote,
        ActionId::VolumeUp,
        ActionId::VolumeDown,
        ActionId::VolumeMute,
        ActionId::Screenshot,
        ActionId::Wait,
    ];

    /// Wire name, as it appears in `funcion`
    pub fn name(&self) -> &'static str {
        match self {
            ActionId::OpenChrome => "abrir_chrome",
            ActionId::OpenNotepad => "abrir_notepad",
            ActionId::OpenCalculator => "abrir_calculadora",
            ActionId::OpenFileExplorer => "abrir_explorador_archivos",
            ActionId::OpenProgram => "abrir_programa",
            ActionId::OpenCmd => "abrir_cmd",
            ActionId::OpenSettings => "abrir_configuracion",
            ActionId::SearchGoogle => "buscar_en_google",
            ActionId::OpenUrl => "abrir_url",
            ActionId::OpenYoutube => "abrir_youtube",
            ActionId::MinimizeAll => "minimizar_todo",
            ActionId::CloseWindow => "cerrar_ventana_actual",
            ActionId::SwitchWindow => "cambiar_ventana",
            ActionId::MaximizeWindow => "maximizar_ventana",
            ActionId::MinimizeWindow => "minimizar_ventana",
            ActionId::SnapLeft => "ventana_izquierda",
            ActionId::SnapRight => "ventana_derecha",
            ActionId::TypeText => "escribir_texto",
            ActionId::Copy => "copiar",
            ActionId::Paste => "pegar",
            ActionId::Save => "guardar",
            ActionId::Undo => "deshacer",
            ActionId::SelectAll => "seleccionar_todo",
            ActionId::PressEnter => "presionar_enter",
            ActionId::OpenFolder => "abrir_carpeta",
            ActionId::QuickNote => "crear_nota_rapida",
            ActionId::VolumeUp => "volumen_subir",
            ActionId::VolumeDown => "volumen_bajar",
            ActionId::VolumeMute => "volumen_silenciar",
            ActionId::Screenshot => "tomar_captura",
            ActionId::Wait => "esperar",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.name() == name)
    }

    pub fn category(&self) -> ActionCategory {
        use ActionId::*;
        match self {
            OpenChrome | OpenNotepad | OpenCalculator | OpenFileExplorer | OpenProgram
            | OpenCmd | OpenSettings => ActionCategory::Programs,
            SearchGoogle | OpenUrl | OpenYoutube => ActionCategory::Web,
            MinimizeAll | CloseWindow | SwitchWindow | MaximizeWindow | MinimizeWindow
            | SnapLeft | SnapRight => ActionCategory::Windows,
            TypeText | Copy | Paste | Save | Undo | SelectAll | PressEnter => ActionCategory::Text,
            OpenFolder | QuickNote => ActionCategory::Files,
            VolumeUp | VolumeDown | VolumeMute | Screenshot => ActionCategory::Media,
            Wait => ActionCategory::System,
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            ActionId::OpenProgram => Arity::Fixed(&["nombre"]),
            ActionId::SearchGoogle => Arity::Fixed(&["query"]),
            ActionId::OpenUrl => Arity::Fixed(&["url"]),
            ActionId::OpenYoutube => Arity::Fixed(&["busqueda"]),
            ActionId::OpenFolder => Arity::Fixed(&["nombre"]),
            ActionId::TypeText | ActionId::QuickNote => Arity::Variadic("texto"),
            ActionId::VolumeUp | ActionId::VolumeDown => Arity::Fixed(&["veces"]),
            ActionId::Wait => Arity::Fixed(&["segundos"]),
            _ => Arity::Fixed(&[]),
        }
    }

    /// Call syntax shown to the model, e.g. `abrir_programa('nombre')`
    pub fn signature(&self) -> String {
        let params = match self.arity() {
            Arity::Fixed(params) => params
                .iter()
                .map(|p| match self {
                    // Numeric parameters go unquoted
                    ActionId::VolumeUp | ActionId::VolumeDown | ActionId::Wait => p.to_string(),
                    _ => format!("'{}'", p),
                })
                .collect::<Vec<_>>()
                .join(", "),
            Arity::Variadic(param) => format!("'{}'", param),
        };
        format!("{}({})", self.name(), params)
    }
}

/// Handler signature: perform the action, report the facts it produced
pub type Handler = fn(&mut dyn PcControl, ActionArgs<'_>) -> ControlResult<Vec<ContextFact>>;

/// One permitted action and the code that runs it
#[derive(Clone, Copy)]
pub struct CatalogEntry {
    pub id: ActionId,
    pub handler: Handler,
}

impl std::fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogEntry").field("id", &self.id).finish()
    }
}

/// The closed set of actions the executor may run
#[derive(Debug, Clone)]
pub struct ActionCatalog {
    entries: Vec<CatalogEntry>,
    index: AHashMap<&'static str, usize>,
}

impl ActionCatalog {
    /// Every action the system knows about
    pub fn standard() -> Self {
        Self::build(ActionId::ALL.iter().copied())
    }

    /// The standard catalog minus the named actions
    ///
    /// Unknown names are ignored with a warning. Disabling everything is a
    /// configuration fault.
    pub fn with_disabled(disabled: &[String]) -> Result<Self> {
        for name in disabled {
            if ActionId::from_name(name).is_none() {
                tracing::warn!("Ignoring unknown action '{}' in catalog.disabled", name);
            }
        }
        Self::from_ids(
            ActionId::ALL
                .iter()
                .copied()
                .filter(|id| !disabled.iter().any(|d| d == id.name())),
        )
    }

    /// Catalog over an explicit set of actions
    pub fn from_ids(ids: impl IntoIterator<Item = ActionId>) -> Result<Self> {
        let catalog = Self::build(ids);
        if catalog.is_empty() {
            return Err(NeoError::EmptyCatalog);
        }
        Ok(catalog)
    }

    fn build(ids: impl IntoIterator<Item = ActionId>) -> Self {
        let mut entries: Vec<CatalogEntry> = Vec::new();
        let mut index = AHashMap::new();
        for id in ids {
            if index.contains_key(id.name()) {
                continue;
            }
            index.insert(id.name(), entries.len());
            entries.push(CatalogEntry {
                id,
                handler: handlers::handler_for(id),
            });
        }
        Self { entries, index }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    /// Catalog listing for the prompt, grouped by category
    pub fn describe(&self) -> String {
        let mut s = String::from("FUNCIONES QUE PUEDES EJECUTAR:\n");
        let mut current: Option<ActionCategory> = None;
        let mut ids: Vec<ActionId> = self.entries.iter().map(|e| e.id).collect();
        ids.sort_by_key(|id| id.category());

        for id in ids {
            let category = id.category();
            if current != Some(category) {
                s.push_str(&format!("\n{}:\n", category.title()));
                current = Some(category);
            }
            s.push_str(&format!("- {}\n", id.signature()));
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for id in ActionId::ALL {
            assert_eq!(ActionId::from_name(id.name()), Some(id));
        }
        assert_eq!(ActionId::from_name("borrar_disco"), None);
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = ActionId::ALL.iter().map(|id| id.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ActionId::ALL.len());
    }

    #[test]
    fn test_standard_catalog_contains_everything() {
        let catalog = ActionCatalog::standard();
        assert_eq!(catalog.len(), 31);
        assert!(catalog.contains("abrir_chrome"));
        assert!(catalog.contains("esperar"));
        assert!(!catalog.contains("borrar_disco"));
        assert!(!catalog.contains("ABRIR_CHROME"));
    }

    #[test]
    fn test_disabled_actions_leave_allowlist() {
        let catalog = ActionCatalog::with_disabled(&[
            "escribir_texto".to_string(),
            "no_existe".to_string(),
        ])
        .unwrap();
        assert_eq!(catalog.len(), 30);
        assert!(!catalog.contains("escribir_texto"));
        assert!(catalog.get("escribir_texto").is_none());
    }

    #[test]
    fn test_empty_catalog_is_configuration_fault() {
        let all: Vec<String> = ActionId::ALL.iter().map(|id| id.name().to_string()).collect();
        assert!(matches!(
            ActionCatalog::with_disabled(&all),
            Err(NeoError::EmptyCatalog)
        ));
        assert!(matches!(
            ActionCatalog::from_ids(Vec::new()),
            Err(NeoError::EmptyCatalog)
        ));
    }

    #[test]
    fn test_signatures() {
        assert_eq!(ActionId::OpenChrome.signature(), "abrir_chrome()");
        assert_eq!(ActionId::OpenProgram.signature(), "abrir_programa('nombre')");
        assert_eq!(ActionId::VolumeUp.signature(), "volumen_subir(veces)");
        assert_eq!(ActionId::TypeText.signature(), "escribir_texto('texto')");
    }

    #[test]
    fn test_arity_accepts() {
        assert!(ActionId::Copy.arity().accepts(0));
        assert!(!ActionId::Copy.arity().accepts(1));
        assert!(ActionId::TypeText.arity().accepts(3));
        assert!(!ActionId::TypeText.arity().accepts(0));
    }

    #[test]
    fn test_describe_groups_by_category() {
        let text = ActionCatalog::standard().describe();
        let programs = text.find("PROGRAMAS:").unwrap();
        let system = text.find("SISTEMA:").unwrap();
        assert!(programs < system);
        assert!(text.contains("- buscar_en_google('query')"));
        assert_eq!(text.matches("\n- ").count(), 31);
    }
}
