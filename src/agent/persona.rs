use std::fs;
use std::path::Path;

use anyhow::{Result, anyhow};

pub const DEFAULT_DISPLAY_NAME: &str = "João Andrade";

const DEFAULT_BIOGRAPHY: &str = include_str!("biography.md");

/// The fixed identity the assistant impersonates. Immutable for the
/// lifetime of the process; the system instruction is re-rendered from it
/// at the start of every engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub display_name: String,
    pub biography: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
            biography: DEFAULT_BIOGRAPHY.trim().to_string(),
        }
    }
}

impl Persona {
    /// Build the persona from optional config overrides, falling back to
    /// the embedded defaults.
    pub fn from_overrides(display_name: Option<&str>, biography_file: Option<&Path>) -> Result<Self> {
        let mut persona = Self::default();

        if let Some(name) = display_name {
            let trimmed = name.trim();
            if !trimmed.is_empty() {
                persona.display_name = trimmed.to_string();
            }
        }

        if let Some(path) = biography_file {
            persona.biography = fs::read_to_string(path)
                .map_err(|err| {
                    anyhow!(
                        "Failed to load biography file {}: unable to read file: {err}",
                        path.display()
                    )
                })?
                .trim()
                .to_string();
        }

        Ok(persona)
    }

    /// Pure string composition: identity, behavioral directives, and the
    /// embedded biography.
    pub fn render_system_instruction(&self) -> String {
        let name = &self.display_name;
        let mut instruction = format!(
            "You are acting as {name}. You are answering questions on {name}'s website, \
particularly questions related to {name}'s career, background, skills and experience. \
Your responsibility is to represent {name} for interactions on the website as faithfully as possible. \
You are given a summary of {name}'s background which you can use to answer questions. \
Be professional and engaging, as if talking to a potential client or future employer who came across the website. \
If you don't know the answer to any question, use your record_unknown_question tool to record the question that you couldn't answer, even if it's about something trivial or unrelated to career. \
If the user is engaging in discussion, try to steer them towards getting in touch via email; ask for their email and record it using your record_user_details tool."
        );

        instruction.push_str(&format!("\n\n## Summary:\n{}", self.biography));
        instruction.push_str(&format!(
            "\n\nWith this context, please chat with the user, always staying in character as {name}."
        ));
        instruction
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_DISPLAY_NAME, Persona};
    use std::fs;

    #[test]
    fn default_persona_embeds_biography() {
        let persona = Persona::default();
        assert_eq!(persona.display_name, DEFAULT_DISPLAY_NAME);
        assert!(persona.biography.contains("software engineer"));
    }

    #[test]
    fn system_instruction_contains_identity_directives_and_biography() {
        let persona = Persona {
            display_name: "Ada Lovelace".to_string(),
            biography: "Pioneer of computing.".to_string(),
        };

        let instruction = persona.render_system_instruction();
        assert!(instruction.starts_with("You are acting as Ada Lovelace."));
        assert!(instruction.contains("record_unknown_question"));
        assert!(instruction.contains("record_user_details"));
        assert!(instruction.contains("## Summary:\nPioneer of computing."));
        assert!(instruction.ends_with("always staying in character as Ada Lovelace."));
    }

    #[test]
    fn from_overrides_reads_biography_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let bio_path = tmp.path().join("bio.md");
        fs::write(&bio_path, "A custom biography.\n").expect("write biography");

        let persona =
            Persona::from_overrides(Some("Grace Hopper"), Some(&bio_path)).expect("persona");
        assert_eq!(persona.display_name, "Grace Hopper");
        assert_eq!(persona.biography, "A custom biography.");
    }

    #[test]
    fn from_overrides_fails_on_missing_biography_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let missing = tmp.path().join("nope.md");

        let err = Persona::from_overrides(None, Some(&missing)).expect_err("should fail");
        assert!(err.to_string().contains("Failed to load biography file"));
    }

    #[test]
    fn blank_display_name_override_keeps_default() {
        let persona = Persona::from_overrides(Some("   "), None).expect("persona");
        assert_eq!(persona.display_name, DEFAULT_DISPLAY_NAME);
    }
}
