//! `multipart/form-data` encoding for file uploads.
//!
//! The encoder builds the whole body in memory so it can enforce a byte
//! ceiling and fail before anything is sent. Field names, filenames and
//! content types are checked for CR/LF before any bytes are written.

use std::collections::BTreeMap;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::config::SizeLimit;
use crate::error::{Error, ErrorKind, Result};
use crate::security::multipart::{escape_quoted, reject_crlf};

/// Content type used for file parts that do not declare one.
pub const DEFAULT_FILE_CONTENT_TYPE: &str = "application/octet-stream";

/// Multipart field the upload endpoint expects the file under.
pub const UPLOAD_FILE_FIELD: &str = "filename";

/// Multipart field the upload endpoint expects the display name under.
pub const UPLOAD_NAME_FIELD: &str = "name";

/// A file attached to a multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Filename sent in the `Content-Disposition` header.
    pub filename: String,
    /// Content type of the part; empty means `application/octet-stream`.
    pub content_type: String,
    /// Raw file bytes.
    pub content: Bytes,
}

impl FilePart {
    /// Create a file part with the default content type.
    pub fn new(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: String::new(),
            content: content.into(),
        }
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    fn effective_content_type(&self) -> &str {
        if self.content_type.trim().is_empty() {
            DEFAULT_FILE_CONTENT_TYPE
        } else {
            &self.content_type
        }
    }
}

/// An encoded multipart body and its boundary-bearing content type.
#[derive(Debug, Clone)]
pub struct EncodedMultipart {
    pub content_type: String,
    pub body: Bytes,
}

/// Encode plain fields and file parts as `multipart/form-data`.
///
/// Fails with a validation error if any name, filename or content type
/// contains CR or LF, and with a size-limit error if the encoded body would
/// exceed `limit`. No partial body is ever returned.
pub fn encode_multipart(
    fields: &BTreeMap<String, String>,
    files: &BTreeMap<String, FilePart>,
    limit: SizeLimit,
) -> Result<EncodedMultipart> {
    for name in fields.keys() {
        reject_crlf(name, "multipart field name")?;
    }
    for (name, part) in files {
        reject_crlf(name, "multipart file field name")?;
        reject_crlf(&part.filename, "multipart filename")?;
        reject_crlf(&part.content_type, "multipart content type")?;
    }

    let boundary = format!("----patchclient{}", uuid::Uuid::new_v4().simple());
    let mut writer = PartWriter::new(&boundary, limit);

    for (name, value) in fields {
        let head = format!(
            "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
            escape_quoted(name)
        );
        writer.part(&head, value.as_bytes())?;
    }

    for (name, part) in files {
        let head = format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            escape_quoted(name),
            escape_quoted(&part.filename),
            part.effective_content_type()
        );
        writer.part(&head, &part.content)?;
    }

    let body = writer.finish()?;
    debug!(
        fields = fields.len(),
        files = files.len(),
        bytes = body.len(),
        "Encoded multipart body"
    );

    Ok(EncodedMultipart {
        content_type: format!("multipart/form-data; boundary={boundary}"),
        body,
    })
}

/// Map caller-supplied upload fields onto the endpoint's `name`/`filename` contract.
///
/// A single file under any other key is moved to `filename`. Zero files, or
/// several files none of which is keyed `filename`, cannot be mapped. A
/// missing `name` field is filled from the file's own filename, else `"file"`.
pub fn normalize_upload(
    mut fields: BTreeMap<String, String>,
    mut files: BTreeMap<String, FilePart>,
) -> Result<(BTreeMap<String, String>, BTreeMap<String, FilePart>)> {
    if !files.contains_key(UPLOAD_FILE_FIELD) {
        if files.len() != 1 {
            return Err(Error::new(ErrorKind::AmbiguousUpload(format!(
                "upload files must include '{UPLOAD_FILE_FIELD}' field, got {} unlabeled entries",
                files.len()
            ))));
        }
        files = files
            .into_values()
            .map(|part| (UPLOAD_FILE_FIELD.to_string(), part))
            .collect();
    }

    if !fields.contains_key(UPLOAD_NAME_FIELD) {
        let name = files
            .get(UPLOAD_FILE_FIELD)
            .map(|part| part.filename.as_str())
            .filter(|f| !f.is_empty())
            .unwrap_or("file");
        fields.insert(UPLOAD_NAME_FIELD.to_string(), name.to_string());
    }

    Ok((fields, files))
}

/// Appends framed parts while tracking the cumulative size.
struct PartWriter<'a> {
    boundary: &'a str,
    limit: SizeLimit,
    buf: BytesMut,
}

impl<'a> PartWriter<'a> {
    fn new(boundary: &'a str, limit: SizeLimit) -> Self {
        Self {
            boundary,
            limit,
            buf: BytesMut::new(),
        }
    }

    fn part(&mut self, head: &str, content: &[u8]) -> Result<()> {
        let delimiter = format!("--{}\r\n", self.boundary);
        let len = delimiter.len() + head.len() + content.len() + 2;
        self.reserve(len)?;
        self.buf.put_slice(delimiter.as_bytes());
        self.buf.put_slice(head.as_bytes());
        self.buf.put_slice(content);
        self.buf.put_slice(b"\r\n");
        Ok(())
    }

    fn finish(mut self) -> Result<Bytes> {
        let closing = format!("--{}--\r\n", self.boundary);
        self.reserve(closing.len())?;
        self.buf.put_slice(closing.as_bytes());
        Ok(self.buf.freeze())
    }

    fn reserve(&mut self, additional: usize) -> Result<()> {
        let total = (self.buf.len() + additional) as u64;
        if self.limit.exceeded_by(total) {
            return Err(Error::new(ErrorKind::MultipartTooLarge {
                limit: self.limit.reported(),
            }));
        }
        self.buf.reserve(additional);
        Ok(())
    }
}
