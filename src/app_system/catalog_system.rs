use tracing::{error, info};

use crate::actor_framework::{CatalogActor, CatalogClient};
use crate::products::{EmptyPagePolicy, ProductsService};
use crate::repository::ProductRepository;

/// Owns the running catalog actor.
///
/// Responsible for starting it with its store and for orderly shutdown.
pub struct CatalogSystem {
    pub client: CatalogClient,
    handle: tokio::task::JoinHandle<()>,
}

impl CatalogSystem {
    pub fn start<R: ProductRepository>(
        repository: R,
        buffer_size: usize,
        empty_page: EmptyPagePolicy,
    ) -> Self {
        let service = ProductsService::new(repository).with_empty_page_policy(empty_page);
        let (actor, client) = CatalogActor::new(buffer_size, service);
        let handle = tokio::spawn(actor.run());
        info!(buffer_size, ?empty_page, "Catalog system started");
        Self { client, handle }
    }

    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");
        // A failed send means the actor already stopped; the join below reports how.
        let _ = self.client.shutdown().await;
        drop(self.client);

        if let Err(e) = self.handle.await {
            error!("Actor task failed: {:?}", e);
            return Err(format!("Actor task failed: {:?}", e));
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
