//! Pipeline stages and the status → stage inference table

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Abstract phase of the document pipeline as seen by an observer.
///
/// Variants are declared in pipeline order, so `Ord` follows progression
/// with `Idle` first and `Done` last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Nothing known yet, or the pipeline reported failure
    Idle,
    Download,
    Convert,
    Process,
    Embed,
    Grade,
    Done,
}

impl Stage {
    /// The weighted stages, in pipeline order. `Idle` and `Done` carry no weight.
    pub const PIPELINE: [Stage; 5] = [
        Stage::Download,
        Stage::Convert,
        Stage::Process,
        Stage::Embed,
        Stage::Grade,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Download => "download",
            Self::Convert => "convert",
            Self::Process => "process",
            Self::Embed => "embed",
            Self::Grade => "grade",
            Self::Done => "done",
        }
    }

    /// Human-readable label for display next to a progress bar.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Waiting",
            Self::Download => "Downloading document",
            Self::Convert => "Converting to PDF",
            Self::Process => "Processing (OCR / chunking)",
            Self::Embed => "Indexing (embeddings)",
            Self::Grade => "Grading answers",
            Self::Done => "Done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown stage name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stage: {0}")]
pub struct UnknownStage(pub String);

impl FromStr for Stage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "idle" => Ok(Self::Idle),
            "download" => Ok(Self::Download),
            "convert" => Ok(Self::Convert),
            "process" => Ok(Self::Process),
            "embed" => Ok(Self::Embed),
            "grade" => Ok(Self::Grade),
            "done" => Ok(Self::Done),
            _ => Err(UnknownStage(s.to_string())),
        }
    }
}

/// Map a raw pipeline status string to a stage.
///
/// Matching is case-insensitive. Failure statuses (anything ending in
/// `failed`, plus `error` and `unknown`) and unrecognized values map to
/// [`Stage::Idle`]. When the backend already reports chunks, `Process` is
/// promoted to `Embed`: chunks mean extraction has finished regardless of
/// what the status string says.
pub fn infer_stage(raw_status: &str, chunk_count: u64) -> Stage {
    let status = raw_status.to_lowercase();
    let stage = match status.as_str() {
        "downloading" | "initialized" | "processing" => Stage::Download,
        "downloaded" | "converting" => Stage::Convert,
        "converted" | "processing_rag" => Stage::Process,
        "rag_completed" => Stage::Embed,
        "completed" => Stage::Done,
        _ => Stage::Idle,
    };

    if chunk_count > 0 && stage == Stage::Process {
        Stage::Embed
    } else {
        stage
    }
}
