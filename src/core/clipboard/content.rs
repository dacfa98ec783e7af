//! Clipboard content model and classification
//!
//! A raw clipboard read may offer several representations at once (a copied
//! file is usually also available as text). Classification picks exactly one
//! of them, with files winning over images and images over text.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

/// Extensions accepted as file payloads even when the path does not exist
const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "tiff", "heic", "webp", "svg",
];

const IMAGE_LABEL: &str = "Image";

/// Uncooked image data as handed over by the clipboard backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub width: usize,
    pub height: usize,
    /// RGBA8 pixels, row-major
    pub bytes: Vec<u8>,
}

/// Everything a single clipboard read produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawClipboard {
    pub files: Option<Vec<PathBuf>>,
    pub image: Option<RawImage>,
    pub text: Option<String>,
    /// Sequence number the OS bumps on every clipboard write, when the backend exposes one
    pub change_token: Option<u64>,
}

/// Image pixels plus the hash used to recognise them again
#[derive(Debug, Clone, Serialize)]
pub struct ImagePayload {
    pub width: usize,
    pub height: usize,
    #[serde(skip)]
    pub bytes: Arc<[u8]>,
    pub hash: String,
}

impl ImagePayload {
    /// Hash the pixel representation so identical images compare equal
    pub fn from_raw(raw: &RawImage) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((raw.width as u64).to_le_bytes());
        hasher.update((raw.height as u64).to_le_bytes());
        hasher.update(&raw.bytes);
        Self {
            width: raw.width,
            height: raw.height,
            bytes: Arc::from(raw.bytes.as_slice()),
            hash: hex::encode(hasher.finalize()),
        }
    }
}

/// Classified clipboard content
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Content {
    Text(String),
    Image(ImagePayload),
    File(PathBuf),
    /// Paths in copy order, without repeats
    MultiFile(Vec<PathBuf>),
}

/// Coarse content category shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContentKind {
    Text,
    Image,
    File,
    Folder,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContentKind::Text => "Text",
            ContentKind::Image => "Image",
            ContentKind::File => "File",
            ContentKind::Folder => "Folder",
        };
        f.write_str(label)
    }
}

/// Key under which duplicate content is merged.
///
/// Keys on the full value rather than the display preview, so long texts
/// sharing a prefix stay separate entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    Text(String),
    Image(String),
    File(PathBuf),
    MultiFile(BTreeSet<PathBuf>),
}

impl Content {
    pub fn kind(&self) -> ContentKind {
        match self {
            Content::Text(_) => ContentKind::Text,
            Content::Image(_) => ContentKind::Image,
            Content::File(path) if path.is_dir() => ContentKind::Folder,
            Content::File(_) | Content::MultiFile(_) => ContentKind::File,
        }
    }

    /// Short display string; text is cut to `max_chars` graphemes
    pub fn preview(&self, max_chars: usize) -> String {
        match self {
            Content::Text(text) => truncate_graphemes(text, max_chars),
            Content::Image(_) => IMAGE_LABEL.to_string(),
            Content::File(path) => file_label(path),
            Content::MultiFile(paths) => format!("{} files", paths.len()),
        }
    }

    pub fn dedup_key(&self) -> DedupKey {
        match self {
            Content::Text(text) => DedupKey::Text(text.clone()),
            Content::Image(image) => DedupKey::Image(image.hash.clone()),
            Content::File(path) => DedupKey::File(path.clone()),
            Content::MultiFile(paths) => DedupKey::MultiFile(paths.iter().cloned().collect()),
        }
    }

    /// File-backed writes take longer to echo back through the clipboard
    pub fn is_file_backed(&self) -> bool {
        matches!(self, Content::File(_) | Content::MultiFile(_))
    }
}

fn truncate_graphemes(text: &str, max_chars: usize) -> String {
    let mut graphemes = text.graphemes(true);
    let head: String = graphemes.by_ref().take(max_chars).collect();
    if graphemes.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Canonical string for a set of paths: sorted, newline-joined
pub fn joined_paths<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> String {
    let sorted: BTreeSet<&PathBuf> = paths.into_iter().collect();
    sorted
        .into_iter()
        .map(|p| p.to_string_lossy())
        .collect::<Vec<_>>()
        .join("\n")
}

/// A path counts as a file payload if it names an image or exists on disk
pub fn is_file_like(path: &Path) -> bool {
    let known_image = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    known_image || path.exists()
}

/// Pick exactly one content value out of a raw read: files, then image, then text
pub fn classify(raw: &RawClipboard) -> Option<Content> {
    if let Some(files) = raw.files.as_deref() {
        let mut accepted: Vec<PathBuf> = Vec::with_capacity(files.len());
        for path in files.iter().filter(|p| is_file_like(p)) {
            if !accepted.contains(path) {
                accepted.push(path.clone());
            }
        }
        match accepted.len() {
            0 => {}
            1 => return accepted.pop().map(Content::File),
            _ => return Some(Content::MultiFile(accepted)),
        }
    }

    if let Some(image) = raw.image.as_ref().filter(|img| !img.bytes.is_empty()) {
        return Some(Content::Image(ImagePayload::from_raw(image)));
    }

    raw.text
        .as_ref()
        .filter(|text| !text.is_empty())
        .map(|text| Content::Text(text.clone()))
}
