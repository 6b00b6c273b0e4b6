//! Category tags derived from a file's name and extension

use std::fmt;

/// Name suffixes that mark a drawing source or its markdown companion
const DRAWING_SUFFIXES: [&str; 2] = [".excalidraw", ".excalidraw.md"];

/// Extension of plain notes
pub const NOTE_EXTENSION: &str = "md";

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];
const AUDIO_EXTENSIONS: [&str; 3] = ["mp3", "m4a", "wav"];

/// Short tag embedded in generated names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Drawing source or drawing companion note
    Fig,
    /// Markdown note
    Note,
    /// Raster image
    Image,
    /// Audio recording
    Audio,
    /// Anything else
    File,
}

impl Category {
    /// Tag as it appears in a generated name
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Fig => "fig",
            Category::Note => "note",
            Category::Image => "image",
            Category::Audio => "audio",
            Category::File => "file",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a file by name and extension (case-insensitive, first match wins)
pub fn classify(name: &str, extension: &str) -> Category {
    let name = name.to_lowercase();
    let ext = extension.to_lowercase();

    if DRAWING_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
        return Category::Fig;
    }
    if ext == NOTE_EXTENSION {
        return Category::Note;
    }
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return Category::Image;
    }
    if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        return Category::Audio;
    }

    Category::File
}
