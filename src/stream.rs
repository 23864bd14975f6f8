//! Producing the byte stream of a template on demand.

use std::{io::{self, Read, Cursor},
          fs::File,
          path::PathBuf};

use kstring::KString;

use crate::error::{Result, TemplateError, TemplateErrorKind};

/// Creates the stream to read a template from. Called at most once per
/// parse; the caller drops (closes) the stream after reading it, on
/// every path. Implementations do no buffering or caching of their own.
pub trait StreamProvider: Send + Sync {
    fn create_stream(&self) -> Result<Box<dyn Read + '_>>;
}

/// Any `Fn() -> io::Result<impl Read>` closure is a provider; its I/O
/// errors are reported as `TemplateErrorKind::Io`.
impl<F, R> StreamProvider for F
where F: Fn() -> io::Result<R> + Send + Sync,
      R: Read + 'static
{
    fn create_stream(&self) -> Result<Box<dyn Read + '_>> {
        let stream = self().map_err(
            |e| TemplateError::io("creating template stream", e))?;
        Ok(Box::new(stream))
    }
}

/// A template file. A missing file is reported as
/// `ResourceNotFound`, naming the path and the type the template
/// belongs to.
#[derive(Debug, Clone)]
pub struct FileStream {
    pub path: PathBuf,
    pub origin: KString,
}

impl StreamProvider for FileStream {
    fn create_stream(&self) -> Result<Box<dyn Read + '_>> {
        match File::open(&self.path) {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound =>
                Err(TemplateErrorKind::ResourceNotFound {
                    resource: KString::from_string(
                        self.path.to_string_lossy().into_owned()),
                    origin: self.origin.clone(),
                }.into()),
            Err(e) => Err(TemplateError::io(
                format!("opening template {:?}", self.path), e)),
        }
    }
}

/// Bytes compiled into the binary, e.g. via `include_bytes!`.
#[derive(Debug, Clone, Copy)]
pub struct StaticStream(pub &'static [u8]);

impl StreamProvider for StaticStream {
    fn create_stream(&self) -> Result<Box<dyn Read + '_>> {
        Ok(Box::new(Cursor::new(self.0)))
    }
}
