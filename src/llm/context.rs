//! Prompt assembly for plan generation
//!
//! The prompt carries the literal command, the catalog listing, a summary
//! of the session context and recent turns, and an optional screen
//! description. A few worked examples pin the model to the exact JSON
//! shape the extractor and validator expect.

/// Everything that goes into one generation prompt
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    pub command: String,
    /// Output of `ActionCatalog::describe`
    pub catalog_description: String,
    /// Current facts, only when the session has any
    pub context_summary: Option<String>,
    /// Recent turns, only when there is history
    pub recent_turns: Option<String>,
    /// Screen description supplied by the caller
    pub visual: Option<String>,
}

const FORMAT_RULES: &str = r#"IMPORTANTE: Responde SOLO con JSON en este formato exacto:
{"acciones": [{"funcion": "nombre", "args": []}], "explicacion": "texto"}

NO escribas nada antes ni después del JSON.
Incluye SIEMPRE el campo "explicacion".
Usa SOLO funciones de la lista.
Cierra SIEMPRE todas las llaves y corchetes."#;

const WORKED_EXAMPLES: &str = r#"EJEMPLOS:

Comando: "abre chrome"
{"acciones": [{"funcion": "abrir_chrome", "args": []}], "explicacion": "Abriendo Chrome"}

Comando: "busca python en chrome"
{"acciones": [{"funcion": "abrir_chrome", "args": []}, {"funcion": "esperar", "args": [2]}, {"funcion": "buscar_en_google", "args": ["python"]}], "explicacion": "Buscando python en Google"}

Comando: "escribe hola mundo en el bloc de notas"
{"acciones": [{"funcion": "abrir_notepad", "args": []}, {"funcion": "esperar", "args": [1]}, {"funcion": "escribir_texto", "args": ["hola mundo"]}], "explicacion": "Escribiendo en el bloc de notas"}

Comando: "pon la ventana a la izquierda"
{"acciones": [{"funcion": "ventana_izquierda", "args": []}], "explicacion": "Moviendo la ventana a la izquierda"}"#;

impl PromptContext {
    pub fn new(command: impl Into<String>, catalog_description: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            catalog_description: catalog_description.into(),
            ..Self::default()
        }
    }

    /// Render the full prompt text
    pub fn render(&self) -> String {
        let mut s = String::from(
            "Eres NEO, un asistente de voz que controla el escritorio.\n\n\
             Tu tarea: analizar el comando del usuario y decidir qué funciones ejecutar.\n\n",
        );
        s.push_str(&format!("COMANDO DEL USUARIO:\n\"{}\"\n", self.command));

        if let Some(summary) = &self.context_summary {
            s.push_str(&format!(
                "\n{}Usa este contexto si el comando se refiere a algo anterior.\n",
                summary
            ));
        }
        if let Some(turns) = &self.recent_turns {
            s.push_str(&format!("\n{}", turns));
        }
        if let Some(visual) = &self.visual {
            s.push_str(&format!(
                "\nLO QUE HAY EN LA PANTALLA:\n{}\n\nUsa esta descripción para decidir mejor.\n",
                visual.trim()
            ));
        }

        s.push_str(&format!("\n{}\n", self.catalog_description));
        s.push_str(&format!("\n{}\n\n{}\n", FORMAT_RULES, WORKED_EXAMPLES));
        s.push_str(&format!(
            "\nAhora procesa: \"{}\"\nResponde SOLO con el JSON:",
            self.command
        ));
        s
    }
}

/// Whether the command seems to point at something on screen
pub fn needs_visual_context(command: &str, keywords: &[String]) -> bool {
    let lower = command.to_lowercase();
    keywords
        .iter()
        .any(|k| !k.is_empty() && lower.contains(&k.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::VisionConfig;

    #[test]
    fn test_render_minimal_prompt() {
        let prompt = PromptContext::new("abre spotify", "FUNCIONES QUE PUEDES EJECUTAR:\n- abrir_programa('nombre')\n").render();
        assert!(prompt.contains("\"abre spotify\""));
        assert!(prompt.contains("abrir_programa('nombre')"));
        assert!(prompt.contains("\"explicacion\""));
        assert!(prompt.ends_with("Responde SOLO con el JSON:"));
        assert!(!prompt.contains("CONTEXTO ACTUAL"));
        assert!(!prompt.contains("PANTALLA"));
    }

    #[test]
    fn test_optional_sections_included_when_present() {
        let prompt = PromptContext {
            command: "cierra eso".into(),
            catalog_description: String::new(),
            context_summary: Some("CONTEXTO ACTUAL:\n- Última app: chrome\n".into()),
            recent_turns: Some("Historial reciente:\n- 'abre chrome' → Abriendo Chrome\n".into()),
            visual: Some("Una ventana de Chrome con YouTube".into()),
        }
        .render();
        assert!(prompt.contains("- Última app: chrome"));
        assert!(prompt.contains("Historial reciente:"));
        assert!(prompt.contains("Una ventana de Chrome con YouTube"));
    }

    #[test]
    fn test_worked_examples_are_valid_plans() {
        for line in WORKED_EXAMPLES.lines().filter(|l| l.starts_with('{')) {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value["acciones"].is_array());
            assert!(value["explicacion"].is_string());
        }
    }

    #[test]
    fn test_visual_keywords() {
        let keywords = VisionConfig::default().keywords;
        assert!(needs_visual_context("¿Qué hay en la PANTALLA?", &keywords));
        assert!(needs_visual_context("cierra esta ventana", &keywords));
        assert!(!needs_visual_context("abre chrome", &keywords));
    }
}
