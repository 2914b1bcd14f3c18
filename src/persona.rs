//! Persona prompt artifact
//!
//! The extractor renders a persona prompt and publishes it as a JSON artifact;
//! the bot loads it once at startup and treats it as a constant afterwards.

use std::fmt;
use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::style::{GENERIC_PERSONA, render_prompt};
use crate::{Error, Result};

/// On-disk persona artifact written by `yomi extract`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PersonaArtifact {
    /// Rendered persona prompt
    pub system_prompt: String,

    /// Number of style examples the extractor found
    pub examples_count: usize,

    /// Speaker label the examples were taken from
    pub speaker: String,

    /// When the artifact was generated
    pub generated_at: DateTime<Utc>,
}

impl PersonaArtifact {
    /// Render a new artifact from sampled example texts
    #[must_use]
    pub fn render(speaker: &str, examples: &[String]) -> Self {
        Self {
            system_prompt: render_prompt(speaker, examples),
            examples_count: examples.len(),
            speaker: speaker.to_string(),
            generated_at: Utc::now(),
        }
    }

    /// Write the artifact to `path` atomically
    ///
    /// The JSON is written to a temporary file in the destination directory
    /// and renamed into place, so readers see either the old file or the
    /// complete new one.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written or renamed
    pub fn write(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(tmp.as_file_mut(), self)?;
        tmp.as_file_mut().write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(path)?;

        tracing::info!(
            path = %path.display(),
            examples = self.examples_count,
            "persona artifact written"
        );
        Ok(())
    }

    /// Read an artifact from `path`
    ///
    /// # Errors
    ///
    /// Returns error if the file is missing, malformed, or has an empty prompt
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let artifact: Self = serde_json::from_str(&content)?;

        if artifact.system_prompt.trim().is_empty() {
            return Err(Error::Persona(format!(
                "{} has an empty system prompt",
                path.display()
            )));
        }

        Ok(artifact)
    }
}

/// Where the active persona prompt came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonaSource {
    /// Loaded from a persona artifact
    Artifact {
        /// Speaker the artifact was generated for
        speaker: String,
        /// Number of examples in the artifact
        examples_count: usize,
    },
    /// Built-in generic persona
    Fallback,
    /// Supplied directly (tests, embedding)
    Inline,
}

/// The persona prompt shared by every session
///
/// Cheap to clone; the text is reference counted and never changes.
#[derive(Clone, PartialEq, Eq)]
pub struct PersonaPrompt {
    text: Arc<str>,
    source: PersonaSource,
}

impl PersonaPrompt {
    /// Load the persona from an artifact, falling back to the generic persona
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match PersonaArtifact::read(path) {
            Ok(artifact) => {
                tracing::info!(
                    path = %path.display(),
                    speaker = %artifact.speaker,
                    examples = artifact.examples_count,
                    "loaded persona artifact"
                );
                Self::from_artifact(artifact)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "could not load persona artifact, using generic persona"
                );
                Self::fallback()
            }
        }
    }

    /// Persona prompt taken from an artifact
    #[must_use]
    pub fn from_artifact(artifact: PersonaArtifact) -> Self {
        Self {
            text: Arc::from(artifact.system_prompt),
            source: PersonaSource::Artifact {
                speaker: artifact.speaker,
                examples_count: artifact.examples_count,
            },
        }
    }

    /// The built-in generic persona
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            text: Arc::from(GENERIC_PERSONA),
            source: PersonaSource::Fallback,
        }
    }

    /// Persona prompt from literal text
    #[must_use]
    pub fn inline(text: &str) -> Self {
        Self {
            text: Arc::from(text),
            source: PersonaSource::Inline,
        }
    }

    /// Prompt text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Where the prompt came from
    #[must_use]
    pub const fn source(&self) -> &PersonaSource {
        &self.source
    }

    /// Whether the generic fallback is in use
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self.source, PersonaSource::Fallback)
    }
}

impl fmt::Debug for PersonaPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersonaPrompt")
            .field("source", &self.source)
            .field("chars", &self.text.chars().count())
            .finish()
    }
}
