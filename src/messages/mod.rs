//! Message patterns the catalog answers on the transport.
//!
//! A request is a JSON object tagged by `cmd` with its arguments under
//! `data`, for example `{"cmd":"find_one_product","data":{"id":5}}`. Replies
//! are either the operation's payload or an [`RpcError`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, instrument, warn};

use crate::actor_framework::CatalogClient;
use crate::products::{CreateProductDto, PaginationDto, ProductError, UpdateProductDto};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdParam {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateParams {
    pub id: i64,
    #[serde(flatten)]
    pub dto: UpdateProductDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "data", rename_all = "snake_case")]
pub enum RpcRequest {
    CreateProduct(CreateProductDto),
    FindAllProducts(PaginationDto),
    FindOneProduct(IdParam),
    UpdateProduct(UpdateParams),
    RemoveProduct(IdParam),
}

impl RpcRequest {
    pub fn cmd(&self) -> &'static str {
        match self {
            RpcRequest::CreateProduct(_) => "create_product",
            RpcRequest::FindAllProducts(_) => "find_all_products",
            RpcRequest::FindOneProduct(_) => "find_one_product",
            RpcRequest::UpdateProduct(_) => "update_product",
            RpcRequest::RemoveProduct(_) => "remove_product",
        }
    }
}

/// Error shape propagated to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub message: String,
    pub status: u16,
}

impl RpcError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: 400,
        }
    }
}

impl From<ProductError> for RpcError {
    fn from(err: ProductError) -> Self {
        let status = err.status();
        let message = match &err {
            ProductError::Persistence(_) => "Internal server error".to_string(),
            _ => err.to_string(),
        };
        Self { message, status }
    }
}

/// Envelope written back for every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcReply {
    Ok { data: Value },
    Err { error: RpcError },
}

impl From<Result<Value, RpcError>> for RpcReply {
    fn from(result: Result<Value, RpcError>) -> Self {
        match result {
            Ok(data) => RpcReply::Ok { data },
            Err(error) => RpcReply::Err { error },
        }
    }
}

fn to_value<T: Serialize>(payload: T) -> Result<Value, RpcError> {
    serde_json::to_value(payload).map_err(|e| RpcError {
        message: format!("Could not encode reply: {e}"),
        status: 500,
    })
}

/// Routes one decoded request to the catalog.
#[instrument(skip(client, request), fields(cmd = request.cmd()))]
pub async fn dispatch(client: &CatalogClient, request: RpcRequest) -> Result<Value, RpcError> {
    let result = match request {
        RpcRequest::CreateProduct(dto) => client.create(dto).await.map(to_value),
        RpcRequest::FindAllProducts(pagination) => client.find_all(pagination).await.map(to_value),
        RpcRequest::FindOneProduct(IdParam { id }) => client.find_one(id).await.map(to_value),
        RpcRequest::UpdateProduct(UpdateParams { id, dto }) => {
            client.update(id, dto).await.map(to_value)
        }
        RpcRequest::RemoveProduct(IdParam { id }) => client.remove(id).await.map(to_value),
    };
    match result {
        Ok(reply) => reply,
        Err(e) => {
            if !e.is_client_error() {
                warn!(error = %e, "Request failed");
            }
            Err(e.into())
        }
    }
}

/// Decodes a raw JSON frame and dispatches it.
pub async fn handle_frame(client: &CatalogClient, frame: &str) -> RpcReply {
    let result = match serde_json::from_str::<RpcRequest>(frame) {
        Ok(request) => dispatch(client, request).await,
        Err(e) => Err(RpcError::bad_request(format!("Malformed request: {e}"))),
    };
    result.into()
}

/// Answers one request per input line with one reply per output line.
///
/// Lines that are not UTF-8 or not a known request get a 400 reply and the
/// loop carries on. Only I/O failures on the streams end it.
pub async fn serve_frames<R, W>(client: &CatalogClient, mut reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let reply = match std::str::from_utf8(&buf) {
            Ok(line) => {
                let frame = line.trim();
                if frame.is_empty() {
                    continue;
                }
                handle_frame(client, frame).await
            }
            Err(e) => {
                debug!(error = %e, "Rejected frame that is not UTF-8");
                RpcReply::Err {
                    error: RpcError::bad_request(format!("Malformed request: {e}")),
                }
            }
        };
        let mut encoded = match serde_json::to_string(&reply) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(error = %e, "Could not encode reply");
                continue;
            }
        };
        encoded.push('\n');
        writer.write_all(encoded.as_bytes()).await?;
        writer.flush().await?;
    }
    info!("Input closed");
    Ok(())
}
