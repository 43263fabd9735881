//! Object body materialization
//!
//! The S3 transport hands back a body that is either already buffered in
//! memory or still a stream of chunks, depending on the object size and the
//! connector in use. Callers only ever want the whole payload, so both cases
//! are folded into [`read_body`].

use aws_sdk_s3::primitives::{ByteStream, ByteStreamError};
use bytes::BytesMut;
use futures::{Stream, StreamExt};
use hyper::body::Bytes;

/// Read the whole object body.
pub async fn read_body(body: ByteStream) -> Result<Bytes, ByteStreamError> {
    if let Some(buffered) = buffered_bytes(&body) {
        return Ok(buffered);
    }
    collect_chunks(chunk_stream(body)).await
}

/// The body, when the transport already holds all of it
fn buffered_bytes(body: &ByteStream) -> Option<Bytes> {
    body.bytes().map(Bytes::copy_from_slice)
}

fn chunk_stream(body: ByteStream) -> impl Stream<Item = Result<Bytes, ByteStreamError>> {
    futures::stream::unfold(body, |mut body| async move {
        body.next().await.map(|chunk| (chunk, body))
    })
}

/// Concatenate chunks in arrival order into one contiguous buffer
pub async fn collect_chunks<S, E>(chunks: S) -> Result<Bytes, E>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    let mut chunks = std::pin::pin!(chunks);
    let mut buffer = BytesMut::new();
    while let Some(chunk) = chunks.next().await {
        buffer.extend_from_slice(&chunk?);
    }
    Ok(buffer.freeze())
}
