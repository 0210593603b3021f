//! Artifact encoding for inline transport.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Artifact kinds the pipeline can emit, with their transport metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Pdf,
}

impl ArtifactKind {
    pub fn media_type(self) -> &'static str {
        match self {
            ArtifactKind::Pdf => "application/pdf",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Pdf => "pdf",
        }
    }
}

/// Encodes the complete artifact byte stream as a self-describing data URI
/// suitable for iframe embedding.
pub fn data_uri(bytes: &[u8], kind: ArtifactKind) -> String {
    format!(
        "data:{};base64,{}",
        kind.media_type(),
        STANDARD.encode(bytes)
    )
}
