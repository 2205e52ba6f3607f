//! Request and response shapes consumed and produced by the dispatcher.

use crate::chunk::ChunkRef;
use crate::etag::{Conditional, ETag};
use crate::header::HeaderContent;
use crate::method::MethodSet;
use crate::resource::{ContentProperties, ResourceMetadata};
use crate::role::AccountId;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Inclusive chunk range.
///
/// A negative `start` counts back from the end. An `end` of zero or less is
/// relative to the last chunk, so `{0, 0}` selects the whole resource and
/// `{-1, 0}` the last chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: i64,
    pub end: i64,
}

impl Range {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn whole() -> Self {
        Self::default()
    }

    /// Resolve against `length` chunks. `None` is the empty whole of an empty resource.
    pub fn resolve(&self, length: usize) -> crate::Result<Option<RangeInclusive<usize>>> {
        let unsatisfiable = || crate::Error::RangeNotSatisfiable {
            start: self.start,
            end: self.end,
            length,
        };
        if length == 0 {
            return if *self == Self::whole() {
                Ok(None)
            } else {
                Err(unsatisfiable())
            };
        }
        let len = length as i64;
        let start = if self.start < 0 { len + self.start } else { self.start };
        let end = if self.end <= 0 { len - 1 + self.end } else { self.end };
        if start < 0 || end < start || end >= len {
            return Err(unsatisfiable());
        }
        Ok(Some(start as usize..=end as usize))
    }
}

/// HEAD request; also the common prefix of every other request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadRequest {
    pub path: String,
    #[serde(default)]
    pub if_modified_since: Option<u64>,
    #[serde(default)]
    pub if_none_match: Option<ETag>,
}

impl HeadRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn if_none_match(mut self, etag: ETag) -> Self {
        self.if_none_match = Some(etag);
        self
    }

    pub fn if_modified_since(mut self, secs: u64) -> Self {
        self.if_modified_since = Some(secs);
        self
    }

    pub fn conditional(&self) -> Conditional {
        Conditional {
            if_none_match: self.if_none_match,
            if_modified_since: self.if_modified_since,
        }
    }
}

/// DELETE carries only the path and conditionals.
pub type DeleteRequest = HeadRequest;

/// GET and LOCATE request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRequest {
    pub head: HeadRequest,
    #[serde(default)]
    pub range: Range,
}

impl GetRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            head: HeadRequest::new(path),
            range: Range::whole(),
        }
    }

    pub fn with_range(mut self, range: Range) -> Self {
        self.range = range;
        self
    }
}

/// One chunk of a PUT or PATCH payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkWrite {
    pub data: Bytes,
    pub index: usize,
    pub publisher: AccountId,
}

impl ChunkWrite {
    pub fn new(data: impl Into<Bytes>, index: usize, publisher: AccountId) -> Self {
        Self {
            data: data.into(),
            index,
            publisher,
        }
    }

    /// Split `data` into sequential chunk writes of `chunk_size` bytes.
    pub fn split(data: &Bytes, chunk_size: u64, publisher: &AccountId) -> Vec<Self> {
        crate::chunk::chunk_data(data, chunk_size)
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| Self::new(chunk.data, index, publisher.clone()))
            .collect()
    }
}

/// PUT request: replace content wholesale.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PutRequest {
    pub head: HeadRequest,
    pub properties: ContentProperties,
    pub chunks: Vec<ChunkWrite>,
}

impl PutRequest {
    pub fn new(path: impl Into<String>, properties: ContentProperties, chunks: Vec<ChunkWrite>) -> Self {
        Self {
            head: HeadRequest::new(path),
            properties,
            chunks,
        }
    }
}

/// PATCH request: append or overwrite individual chunks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatchRequest {
    pub head: HeadRequest,
    pub chunks: Vec<ChunkWrite>,
}

impl PatchRequest {
    pub fn new(path: impl Into<String>, chunks: Vec<ChunkWrite>) -> Self {
        Self {
            head: HeadRequest::new(path),
            chunks,
        }
    }
}

/// DEFINE request: set the header a path references.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefineRequest {
    pub head: HeadRequest,
    pub header: HeaderContent,
}

impl DefineRequest {
    pub fn new(path: impl Into<String>, header: HeaderContent) -> Self {
        Self {
            head: HeadRequest::new(path),
            header,
        }
    }
}

/// OPTIONS request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionsRequest {
    pub path: String,
}

impl OptionsRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Successful outcome of a dispatch.
///
/// Failures are reported through the dispatcher's error type instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Ok,
    Created,
    NoContent,
    PartialContent,
    NotModified,
    /// Redirect code in 300..=310.
    Redirect(u16),
}

impl Status {
    pub fn code(&self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::Created => 201,
            Self::NoContent => 204,
            Self::PartialContent => 206,
            Self::NotModified => 304,
            Self::Redirect(code) => *code,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect(_))
    }
}

/// OPTIONS response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionsResponse {
    pub status: Status,
    pub allowed: MethodSet,
}

/// HEAD response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadResponse {
    pub status: Status,
    pub metadata: ResourceMetadata,
    pub header: HeaderContent,
    pub etag: ETag,
    /// Set when `status` is a redirect.
    pub location: Option<String>,
}

/// LOCATE response, and the body of a GET.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocateResponse {
    pub head: HeadResponse,
    /// Chunk references for the requested range. Empty on 304 and redirects.
    pub chunks: Vec<ChunkRef>,
}

impl LocateResponse {
    pub fn status(&self) -> Status {
        self.head.status
    }
}

/// GET response: located chunks plus their bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetResponse {
    pub locate: LocateResponse,
    pub data: Bytes,
}

impl GetResponse {
    pub fn status(&self) -> Status {
        self.locate.head.status
    }
}

/// Response to PUT, PATCH, DELETE and DEFINE.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResponse {
    pub status: Status,
    pub metadata: ResourceMetadata,
    pub etag: ETag,
}
