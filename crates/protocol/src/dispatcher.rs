//! Verb evaluation.
//!
//! Every verb runs the same gate sequence before doing any work:
//!
//! 1. the header's method mask must contain the verb (site admins bypass),
//! 2. writes to a resource with an immutable header are refused, except for
//!    the single re-arm sequence after a delete (`DEFINE`, then `PUT`),
//! 3. verbs that need existing content fail with 404, or 410 when the path
//!    was deleted under an immutable header,
//! 4. the caller must hold the header's origin role for the verb.
//!
//! Read verbs then evaluate conditional predicates and redirects. Write verbs
//! hold the path lock from the first read to the commit.

use crate::engine::Engine;
use crate::error::{ProtocolError, ProtocolResult};
use crate::events::EventKind;
use wttp_core::{
    AccountId, DefineRequest, DeleteRequest, ETag, GetRequest, GetResponse, HeadRequest,
    HeadResponse, HeaderContent, Lifecycle, LocateResponse, Method, OptionsRequest,
    OptionsResponse, PatchRequest, PutRequest, ResourceMetadata, ResourceRecord, Status,
    WriteResponse,
};

/// Record and effective header of a request that passed the gates.
struct Admitted {
    record: ResourceRecord,
    header: HeaderContent,
}

impl Engine {
    /// Allowed methods for `path`. Never mutates.
    pub async fn options(
        &self,
        caller: &AccountId,
        request: &OptionsRequest,
    ) -> ProtocolResult<OptionsResponse> {
        let admitted = self.admit(caller, Method::Options, &request.path).await?;
        Ok(OptionsResponse {
            status: Status::NoContent,
            allowed: admitted.header.methods,
        })
    }

    pub async fn head(
        &self,
        caller: &AccountId,
        request: &HeadRequest,
    ) -> ProtocolResult<HeadResponse> {
        let Admitted { record, header } = self.admit(caller, Method::Head, &request.path).await?;
        Ok(head_response(request, &record, header))
    }

    /// Chunk references for the requested range, without content.
    pub async fn locate(
        &self,
        caller: &AccountId,
        request: &GetRequest,
    ) -> ProtocolResult<LocateResponse> {
        self.locate_as(caller, Method::Locate, request).await
    }

    pub async fn get(&self, caller: &AccountId, request: &GetRequest) -> ProtocolResult<GetResponse> {
        let locate = self.locate_as(caller, Method::Get, request).await?;
        let data = self.resources().load_content(&locate.chunks).await?;
        Ok(GetResponse { locate, data })
    }

    /// Replace the content of `path` wholesale.
    pub async fn put(&self, caller: &AccountId, request: &PutRequest) -> ProtocolResult<WriteResponse> {
        let path = request.head.path.as_str();
        let _guard = self.resources().lock(path).await;
        let Admitted { mut record, .. } = self.admit(caller, Method::Put, path).await?;
        let prior = record.metadata.lifecycle;

        record.clear_chunks();
        for write in &request.chunks {
            let chunk = self
                .resources()
                .store_chunk(write.data.clone(), &write.publisher)
                .await?;
            record.write_chunk(chunk, write.index)?;
        }
        let now = self.resources().now();
        if request.chunks.is_empty() && prior == Lifecycle::Rearmed {
            // An empty last write spends the re-arm.
            record.delete(now);
        } else {
            record.metadata.properties = request.properties.clone();
            record.bump_version_and_timestamp(now);
            record.mark_written();
        }

        let status = if request.chunks.is_empty() {
            Status::NoContent
        } else if prior == Lifecycle::Active {
            Status::Ok
        } else {
            Status::Created
        };
        self.commit(caller, Method::Put, path, record, status).await
    }

    /// Append or overwrite individual chunks of existing content.
    pub async fn patch(
        &self,
        caller: &AccountId,
        request: &PatchRequest,
    ) -> ProtocolResult<WriteResponse> {
        let path = request.head.path.as_str();
        let _guard = self.resources().lock(path).await;
        let Admitted { mut record, .. } = self.admit(caller, Method::Patch, path).await?;

        if request.chunks.is_empty() {
            return Ok(self.respond(caller, Method::Patch, path, &record, Status::NoContent));
        }
        for write in &request.chunks {
            let chunk = self
                .resources()
                .store_chunk(write.data.clone(), &write.publisher)
                .await?;
            record.write_chunk(chunk, write.index)?;
        }
        record.bump_version_and_timestamp(self.resources().now());
        self.commit(caller, Method::Patch, path, record, Status::Ok).await
    }

    pub async fn delete(
        &self,
        caller: &AccountId,
        request: &DeleteRequest,
    ) -> ProtocolResult<WriteResponse> {
        let path = request.path.as_str();
        let _guard = self.resources().lock(path).await;
        let Admitted { mut record, .. } = self.admit(caller, Method::Delete, path).await?;
        record.delete(self.resources().now());
        self.commit(caller, Method::Delete, path, record, Status::NoContent).await
    }

    /// Point `path` at a new header, keeping its content properties.
    pub async fn define(
        &self,
        caller: &AccountId,
        request: &DefineRequest,
    ) -> ProtocolResult<WriteResponse> {
        let path = request.head.path.as_str();
        let _guard = self.resources().lock(path).await;
        let Admitted { mut record, .. } = self.admit(caller, Method::Define, path).await?;
        let prior = record.metadata.lifecycle;

        let address = self.headers().create_or_get_header(&request.header).await?;
        let metadata = ResourceMetadata::new(record.metadata.properties.clone(), address);
        record.write_metadata(metadata, self.resources().now());

        let status = if prior == Lifecycle::Active {
            Status::Ok
        } else {
            Status::Created
        };
        self.commit(caller, Method::Define, path, record, status).await
    }

    async fn locate_as(
        &self,
        caller: &AccountId,
        method: Method,
        request: &GetRequest,
    ) -> ProtocolResult<LocateResponse> {
        let Admitted { record, header } = self.admit(caller, method, &request.head.path).await?;
        let mut head = head_response(&request.head, &record, header);
        if head.status != Status::Ok {
            return Ok(LocateResponse {
                head,
                chunks: Vec::new(),
            });
        }

        let (chunks, partial) = record.chunk_range(request.range)?;
        if partial {
            head.status = Status::PartialContent;
        }
        Ok(LocateResponse {
            head,
            chunks: chunks.to_vec(),
        })
    }

    async fn admit(
        &self,
        caller: &AccountId,
        method: Method,
        path: &str,
    ) -> ProtocolResult<Admitted> {
        if path.is_empty() {
            return Err(wttp_core::Error::InvalidPath(path.to_string()).into());
        }
        let record = self.resources().read_record(path).await?;
        let header = self.headers().read_header(&record.metadata.header).await?;

        if !header.allows(method) && !self.roles().is_site_admin(caller).await? {
            return Err(ProtocolError::MethodNotAllowed {
                method,
                allowed: header.methods,
            });
        }

        if method.is_write() && header.is_immutable() {
            let blocked = match record.metadata.lifecycle {
                Lifecycle::Unwritten => false,
                Lifecycle::Active => true,
                Lifecycle::Deleted => method != Method::Define,
                Lifecycle::Rearmed => method != Method::Put,
            };
            if blocked {
                return Err(ProtocolError::Immutable {
                    path: path.to_string(),
                    method,
                });
            }
        }

        if !method.may_create() {
            match record.metadata.lifecycle {
                Lifecycle::Active => {}
                Lifecycle::Deleted if header.is_immutable() => {
                    return Err(ProtocolError::Gone(path.to_string()));
                }
                _ => return Err(ProtocolError::NotFound(path.to_string())),
            }
        }

        let role = header
            .origin(method)
            .ok_or(ProtocolError::InvalidHeader {
                expected: Method::COUNT,
                actual: header.origins.len(),
            })?;
        if !self.roles().has_role(role, caller).await? {
            tracing::debug!(caller = %caller, role = %role, method = %method, path, "forbidden");
            return Err(ProtocolError::Forbidden {
                account: caller.clone(),
                role: role.clone(),
                method,
            });
        }

        Ok(Admitted { record, header })
    }

    async fn commit(
        &self,
        caller: &AccountId,
        method: Method,
        path: &str,
        record: ResourceRecord,
        status: Status,
    ) -> ProtocolResult<WriteResponse> {
        self.resources().commit(path, &record).await?;
        Ok(self.respond(caller, method, path, &record, status))
    }

    fn respond(
        &self,
        caller: &AccountId,
        method: Method,
        path: &str,
        record: &ResourceRecord,
        status: Status,
    ) -> WriteResponse {
        let version = record.metadata.version;
        tracing::info!(
            method = %method,
            path,
            caller = %caller,
            status = status.code(),
            version,
            size = record.metadata.size,
            "resource mutated"
        );
        self.events().emit(
            caller,
            EventKind::ResourceMutated {
                method,
                path: path.to_string(),
                status: status.code(),
                version,
            },
        );
        WriteResponse {
            status,
            metadata: record.metadata.clone(),
            etag: ETag::compute(&record.metadata, &record.chunks),
        }
    }
}

fn head_response(request: &HeadRequest, record: &ResourceRecord, header: HeaderContent) -> HeadResponse {
    let etag = ETag::compute(&record.metadata, &record.chunks);
    let (status, location) = if request.conditional().not_modified(&record.metadata, &etag) {
        (Status::NotModified, None)
    } else if header.redirect.is_active() {
        (
            Status::Redirect(header.redirect.code),
            Some(header.redirect.location.clone()),
        )
    } else {
        (Status::Ok, None)
    };
    HeadResponse {
        status,
        metadata: record.metadata.clone(),
        header,
        etag,
        location,
    }
}
