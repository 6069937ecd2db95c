//! Render stage: convert the summary into the requested representation
//!
//! Text and bullet rendering are pure; audio synthesis goes through the
//! optional TTS collaborator and is invoked by the orchestrator, never here.

use serde::{Deserialize, Serialize};

/// Bullet-marker prefixes recognized in generated summaries
const BULLET_MARKERS: &[&str] = &["\u{2022}", "-", "*"];

/// Requested output representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderFormat {
    Text,
    Bullets,
    Audio,
}

impl Default for RenderFormat {
    fn default() -> Self {
        RenderFormat::Text
    }
}

/// Rendered output artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum RenderedArtifact {
    Text { content: String },
    Bullets { content: Vec<String> },
    /// Audio rendering starts from the text representation; the artifact
    /// path is attached by the orchestrator after synthesis succeeds.
    Audio { content: String },
}

/// Render a summary in the requested format.
pub fn render(summary: &str, format: RenderFormat) -> RenderedArtifact {
    match format {
        RenderFormat::Text => RenderedArtifact::Text {
            content: summary.to_string(),
        },
        RenderFormat::Bullets => {
            let bullets: Vec<String> = summary
                .lines()
                .map(str::trim)
                .filter(|line| {
                    BULLET_MARKERS
                        .iter()
                        .any(|marker| line.starts_with(marker))
                })
                .map(str::to_string)
                .collect();

            RenderedArtifact::Bullets {
                content: if bullets.is_empty() {
                    vec!["[No bullets generated]".to_string()]
                } else {
                    bullets
                },
            }
        }
        RenderFormat::Audio => RenderedArtifact::Audio {
            content: summary.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_format_passes_through() {
        let artifact = render("Some summary.", RenderFormat::Text);
        match artifact {
            RenderedArtifact::Text { content } => assert_eq!(content, "Some summary."),
            other => panic!("expected text artifact, got {:?}", other),
        }
    }

    #[test]
    fn bullets_are_extracted_by_marker_prefix() {
        let summary = "Overview line\n\u{2022} First point\n  \u{2022} Second point\nTrailing note";
        let artifact = render(summary, RenderFormat::Bullets);
        match artifact {
            RenderedArtifact::Bullets { content } => {
                assert_eq!(content.len(), 2);
                assert_eq!(content[0], "\u{2022} First point");
                assert_eq!(content[1], "\u{2022} Second point");
            }
            other => panic!("expected bullets artifact, got {:?}", other),
        }
    }

    #[test]
    fn dash_and_star_markers_count_as_bullets() {
        let summary = "- dash point\n* star point";
        match render(summary, RenderFormat::Bullets) {
            RenderedArtifact::Bullets { content } => assert_eq!(content.len(), 2),
            other => panic!("expected bullets artifact, got {:?}", other),
        }
    }

    #[test]
    fn bulletless_summary_yields_placeholder() {
        match render("No markers anywhere.", RenderFormat::Bullets) {
            RenderedArtifact::Bullets { content } => {
                assert_eq!(content, vec!["[No bullets generated]".to_string()]);
            }
            other => panic!("expected bullets artifact, got {:?}", other),
        }
    }

    #[test]
    fn audio_artifact_carries_the_text() {
        match render("Read me aloud.", RenderFormat::Audio) {
            RenderedArtifact::Audio { content } => assert_eq!(content, "Read me aloud."),
            other => panic!("expected audio artifact, got {:?}", other),
        }
    }
}
