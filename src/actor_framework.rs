//! Request loop that serves the catalog to the rest of the process.
//!
//! Callers hold a cheap, cloneable [`CatalogClient`]. Every call becomes one
//! [`CatalogRequest`] carrying a oneshot responder; the [`CatalogActor`]
//! drains them one at a time against its [`ProductsService`].

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument};

use crate::domain::{Paginated, Product};
use crate::products::{CreateProductDto, PaginationDto, ProductError, ProductsService, UpdateProductDto};
use crate::repository::ProductRepository;

pub type Response<T> = oneshot::Sender<Result<T, ProductError>>;

#[derive(Debug)]
pub enum CatalogRequest {
    Create {
        dto: CreateProductDto,
        respond_to: Response<Product>,
    },
    FindAll {
        pagination: PaginationDto,
        respond_to: Response<Paginated<Product>>,
    },
    FindOne {
        id: i64,
        respond_to: Response<Product>,
    },
    Update {
        id: i64,
        dto: UpdateProductDto,
        respond_to: Response<Product>,
    },
    Remove {
        id: i64,
        respond_to: Response<Product>,
    },
    Shutdown,
}

pub struct CatalogActor<R> {
    receiver: mpsc::Receiver<CatalogRequest>,
    service: ProductsService<R>,
}

impl<R: ProductRepository> CatalogActor<R> {
    pub fn new(buffer_size: usize, service: ProductsService<R>) -> (Self, CatalogClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self { receiver, service };
        (actor, CatalogClient::new(sender))
    }

    /// Runs until a `Shutdown` arrives or every client is dropped.
    #[instrument(name = "catalog_actor", skip(self))]
    pub async fn run(mut self) {
        info!("CatalogActor starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                CatalogRequest::Create { dto, respond_to } => {
                    let _ = respond_to.send(self.service.create(dto).await);
                }
                CatalogRequest::FindAll { pagination, respond_to } => {
                    let _ = respond_to.send(self.service.find_all(pagination).await);
                }
                CatalogRequest::FindOne { id, respond_to } => {
                    let _ = respond_to.send(self.service.find_one(id).await);
                }
                CatalogRequest::Update { id, dto, respond_to } => {
                    let _ = respond_to.send(self.service.update(id, dto).await);
                }
                CatalogRequest::Remove { id, respond_to } => {
                    let _ = respond_to.send(self.service.remove(id).await);
                }
                CatalogRequest::Shutdown => {
                    info!("CatalogActor shutting down");
                    break;
                }
            }
        }
        info!("CatalogActor stopped");
    }
}

/// Generate a client method that sends one request and awaits its reply.
macro_rules! client_method {
    (fn $method:ident($($param:ident: $param_type:ty),*) -> $return_type:ty as $variant:ident) => {
        #[instrument(skip(self))]
        pub async fn $method(&self, $($param: $param_type),*) -> Result<$return_type, ProductError> {
            debug!("Sending request");
            let (respond_to, response) = oneshot::channel();
            self.sender
                .send(CatalogRequest::$variant { $($param,)* respond_to })
                .await
                .map_err(|_| ProductError::ActorCommunication("Actor closed".to_string()))?;
            response
                .await
                .map_err(|_| ProductError::ActorCommunication("Actor dropped".to_string()))?
        }
    };
}

/// Handle to a running [`CatalogActor`].
#[derive(Debug, Clone)]
pub struct CatalogClient {
    sender: mpsc::Sender<CatalogRequest>,
}

impl CatalogClient {
    pub fn new(sender: mpsc::Sender<CatalogRequest>) -> Self {
        Self { sender }
    }

    client_method!(fn create(dto: CreateProductDto) -> Product as Create);
    client_method!(fn find_all(pagination: PaginationDto) -> Paginated<Product> as FindAll);
    client_method!(fn find_one(id: i64) -> Product as FindOne);
    client_method!(fn update(id: i64, dto: UpdateProductDto) -> Product as Update);
    client_method!(fn remove(id: i64) -> Product as Remove);

    pub async fn shutdown(&self) -> Result<(), ProductError> {
        self.sender
            .send(CatalogRequest::Shutdown)
            .await
            .map_err(|_| ProductError::ActorCommunication("Actor closed".to_string()))
    }
}
