//! S3-compatible object store.
//!
//! The root is `bucket` or `bucket/prefix`; artifacts live at
//! `s3://{bucket}/{prefix}/{name}`. Credentials, region and endpoint come from
//! the standard AWS environment (`AWS_ACCESS_KEY_ID`, `AWS_REGION`,
//! `AWS_ENDPOINT_URL`, ...). Calls block on a private current-thread runtime
//! so the store fits the synchronous [`BlobStore`] contract.

use super::{validate_name, BlobStore, StorageError};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tokio::runtime::Runtime;
use tracing::{debug, info};

pub struct ObjectStore {
    client: Client,
    bucket: String,
    prefix: String,
    runtime: Runtime,
}

impl ObjectStore {
    /// Connect using credentials from the environment.
    pub fn connect(root: &str) -> Result<Self, StorageError> {
        let (bucket, prefix) = split_root(root)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StorageError::Backend(format!("runtime: {e}")))?;
        let sdk_config = runtime.block_on(aws_config::load_from_env());
        let client = Client::new(&sdk_config);

        info!(bucket = %bucket, prefix = %prefix, "object store client initialized");

        Ok(Self {
            client,
            bucket,
            prefix,
            runtime,
        })
    }

    fn key(&self, name: &str) -> Result<String, StorageError> {
        validate_name(name)?;
        Ok(join_key(&self.prefix, name))
    }
}

impl BlobStore for ObjectStore {
    fn list(&self) -> Result<Vec<String>, StorageError> {
        let list_prefix = if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", self.prefix)
        };

        let mut names = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&list_prefix);
            if let Some(token) = &continuation {
                request = request.continuation_token(token);
            }
            let output = self
                .runtime
                .block_on(request.send())
                .map_err(|e| StorageError::io("list", &self.bucket, DisplayErrorContext(&e)))?;

            for object in output.contents() {
                let Some(key) = object.key() else { continue };
                let name = key.strip_prefix(&list_prefix).unwrap_or(key);
                if !name.is_empty() && !name.contains('/') {
                    names.push(name.to_string());
                }
            }

            continuation = output.next_continuation_token().map(str::to_string);
            if output.is_truncated() != Some(true) || continuation.is_none() {
                break;
            }
        }

        names.sort();
        Ok(names)
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let key = self.key(name)?;
        let output = self
            .runtime
            .block_on(self.client.get_object().bucket(&self.bucket).key(&key).send())
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    StorageError::NotFound(name.to_string())
                } else {
                    StorageError::io("read", name, DisplayErrorContext(&e))
                }
            })?;
        let body = self
            .runtime
            .block_on(output.body.collect())
            .map_err(|e| StorageError::io("read body", name, e))?;
        Ok(body.into_bytes().to_vec())
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let key = self.key(name)?;
        debug!("uploading {} bytes to s3://{}/{}", bytes.len(), self.bucket, key);
        self.runtime
            .block_on(
                self.client
                    .put_object()
                    .bucket(&self.bucket)
                    .key(&key)
                    .body(ByteStream::from(bytes.to_vec()))
                    .send(),
            )
            .map_err(|e| StorageError::io("write", name, DisplayErrorContext(&e)))?;
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        let key = self.key(name)?;
        self.runtime
            .block_on(
                self.client
                    .delete_object()
                    .bucket(&self.bucket)
                    .key(&key)
                    .send(),
            )
            .map_err(|e| StorageError::io("delete", name, DisplayErrorContext(&e)))?;
        Ok(())
    }

    fn location(&self, name: &str) -> String {
        format!("s3://{}/{}", self.bucket, join_key(&self.prefix, name))
    }
}

/// Split `bucket[/prefix]` into its parts, trimming stray slashes.
fn split_root(root: &str) -> Result<(String, String), StorageError> {
    let root = root.trim().trim_start_matches("s3://").trim_matches('/');
    let (bucket, prefix) = root.split_once('/').unwrap_or((root, ""));
    if bucket.is_empty() {
        return Err(StorageError::Backend(
            "object store root must name a bucket".into(),
        ));
    }
    Ok((bucket.to_string(), prefix.trim_matches('/').to_string()))
}

fn join_key(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}
