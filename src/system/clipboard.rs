//! System clipboard access through `arboard`
//!
//! A single `arboard::Clipboard` lives on a dedicated owner thread for as long
//! as the backend does. On X11 and Wayland that handle is what serves the
//! contents we write, so it must outlive the write call. The handle is opened
//! lazily and reopened after the platform clipboard became unavailable.
//!
//! File lists are read natively where the platform supports it. When only a
//! `text/uri-list` style text is available, `file://` lines are turned back
//! into paths. Files are written as such a URI list.

use arboard::ImageData;
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use tracing::debug;
use url::Url;

use super::change_count::clipboard_change_count;
use crate::core::clipboard::backend::ClipboardBackend;
use crate::core::clipboard::content::{Content, RawClipboard, RawImage};
use crate::shared::errors::ClipboardError;

const OWNER_THREAD_NAME: &str = "clipboard-owner";
const OWNER_GONE: &str = "clipboard owner thread has exited";

/// Operations the owner thread performs on its clipboard handle
trait ClipboardHandle {
    fn read(&mut self) -> Result<RawClipboard, ClipboardError>;
    fn write(&mut self, content: &Content) -> Result<(), ClipboardError>;
    fn clear(&mut self) -> Result<(), ClipboardError>;
}

impl ClipboardHandle for arboard::Clipboard {
    fn read(&mut self) -> Result<RawClipboard, ClipboardError> {
        // Only trust the counter if no write slipped in while reading
        let before = clipboard_change_count();

        let text = match self.get_text() {
            Ok(text) => Some(text),
            Err(arboard::Error::ContentNotAvailable | arboard::Error::ConversionFailure) => None,
            Err(e) => return Err(e.into()),
        };

        let files = self
            .get()
            .file_list()
            .ok()
            .filter(|files| !files.is_empty())
            .or_else(|| text.as_deref().and_then(parse_uri_list));

        // Files win classification anyway, so skip the pixel copy
        let image = if files.is_some() {
            None
        } else {
            self.get_image().ok().map(|img| RawImage {
                width: img.width,
                height: img.height,
                bytes: img.bytes.into_owned(),
            })
        };

        let after = clipboard_change_count();
        Ok(RawClipboard {
            files,
            image,
            text,
            change_token: if before == after { after } else { None },
        })
    }

    fn write(&mut self, content: &Content) -> Result<(), ClipboardError> {
        let result = match content {
            Content::Text(text) => self.set_text(text.clone()),
            Content::Image(image) => self.set_image(ImageData {
                width: image.width,
                height: image.height,
                bytes: Cow::Borrowed(&image.bytes[..]),
            }),
            Content::File(path) => self.set_text(to_uri_list(std::slice::from_ref(path))),
            Content::MultiFile(paths) => self.set_text(to_uri_list(paths)),
        };
        result.map_err(|e| ClipboardError::Write(e.to_string()))
    }

    fn clear(&mut self) -> Result<(), ClipboardError> {
        arboard::Clipboard::clear(self).map_err(|e| ClipboardError::Write(e.to_string()))
    }
}

enum Request {
    Read(mpsc::Sender<Result<RawClipboard, ClipboardError>>),
    Write(Content, mpsc::Sender<Result<(), ClipboardError>>),
    Clear(mpsc::Sender<Result<(), ClipboardError>>),
}

/// Run `op` on the held handle, opening one first if needed. A handle that
/// reports the clipboard unavailable is dropped so the next request reopens.
fn with_handle<H, T>(
    slot: &mut Option<H>,
    open: &mut impl FnMut() -> Result<H, ClipboardError>,
    op: impl FnOnce(&mut H) -> Result<T, ClipboardError>,
) -> Result<T, ClipboardError> {
    let mut handle = match slot.take() {
        Some(handle) => handle,
        None => open()?,
    };
    let result = op(&mut handle);
    if !matches!(result, Err(ClipboardError::Unavailable(_))) {
        *slot = Some(handle);
    }
    result
}

fn serve<H: ClipboardHandle>(
    mut open: impl FnMut() -> Result<H, ClipboardError>,
    requests: mpsc::Receiver<Request>,
) {
    let mut slot: Option<H> = None;
    for request in requests {
        match request {
            Request::Read(reply) => {
                let _ = reply.send(with_handle(&mut slot, &mut open, |h| h.read()));
            }
            Request::Write(content, reply) => {
                let _ = reply.send(with_handle(&mut slot, &mut open, |h| h.write(&content)));
            }
            Request::Clear(reply) => {
                let _ = reply.send(with_handle(&mut slot, &mut open, |h| h.clear()));
            }
        }
    }
    debug!("clipboard owner thread exiting");
}

/// Clipboard backend backed by `arboard`
#[derive(Debug)]
pub struct ArboardClipboard {
    requests: mpsc::Sender<Request>,
}

impl ArboardClipboard {
    /// Start the owner thread. The clipboard itself is opened on first use.
    pub fn new() -> Result<Self, ClipboardError> {
        Self::spawn(|| Ok(arboard::Clipboard::new()?))
    }

    /// Try to open the clipboard to detect availability
    pub fn available() -> bool {
        arboard::Clipboard::new().is_ok()
    }

    fn spawn<H, F>(open: F) -> Result<Self, ClipboardError>
    where
        H: ClipboardHandle + 'static,
        F: FnMut() -> Result<H, ClipboardError> + Send + 'static,
    {
        let (requests, inbox) = mpsc::channel();
        thread::Builder::new()
            .name(OWNER_THREAD_NAME.to_string())
            .spawn(move || serve(open, inbox))
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        Ok(Self { requests })
    }

    fn call<T>(
        &self,
        make: impl FnOnce(mpsc::Sender<Result<T, ClipboardError>>) -> Request,
    ) -> Result<T, ClipboardError> {
        let (reply, response) = mpsc::channel();
        self.requests
            .send(make(reply))
            .map_err(|_| ClipboardError::Unavailable(OWNER_GONE.to_string()))?;
        response
            .recv()
            .map_err(|_| ClipboardError::Unavailable(OWNER_GONE.to_string()))?
    }
}

impl ClipboardBackend for ArboardClipboard {
    fn read(&mut self) -> Result<RawClipboard, ClipboardError> {
        self.call(Request::Read)
    }

    fn write(&mut self, content: &Content) -> Result<(), ClipboardError> {
        self.call(|reply| Request::Write(content.clone(), reply))
    }

    fn clear(&mut self) -> Result<(), ClipboardError> {
        self.call(Request::Clear)
    }
}

/// Paths from a text made only of `file://` URIs; `None` for anything else
fn parse_uri_list(text: &str) -> Option<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if !line.starts_with("file://") {
            return None;
        }
        let path = Url::parse(line).ok()?.to_file_path().ok()?;
        paths.push(path);
    }
    if paths.is_empty() {
        None
    } else {
        Some(paths)
    }
}

fn to_uri_list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| match Url::from_file_path(path) {
            Ok(url) => url.to_string(),
            Err(()) => path.to_string_lossy().into_owned(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
