//! # Mock Framework
//!
//! Utilities for testing catalog callers in isolation.
//!
//! Use [`create_mock_client`] to get a client and a receiver, then pull the
//! requests it sends with [`expect_request`] and answer them by hand.

use chrono::NaiveDate;
use tokio::sync::mpsc;

use crate::actor_framework::{CatalogClient, CatalogRequest};
use crate::domain::Product;

/// Creates a client whose requests land on a receiver the test controls.
///
/// No actor runs behind it: the test plays the actor's part, which makes
/// success, failure and ordering deterministic.
pub fn create_mock_client(buffer_size: usize) -> (CatalogClient, mpsc::Receiver<CatalogRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (CatalogClient::new(sender), receiver)
}

/// Next request sent by the client, or `None` once every client is gone.
pub async fn expect_request(receiver: &mut mpsc::Receiver<CatalogRequest>) -> Option<CatalogRequest> {
    receiver.recv().await
}

/// An active product with a fixed timestamp.
pub fn sample_product(id: i64) -> Product {
    let at = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap_or_default();
    Product {
        id,
        name: format!("Product {id}"),
        price: 10.0,
        available: true,
        created_at: at,
        updated_at: at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::products::CreateProductDto;

    #[tokio::test]
    async fn test_mock_client() {
        let (client, mut receiver) = create_mock_client(10);

        let create_task = tokio::spawn(async move {
            let dto = CreateProductDto { name: "Test".to_string(), price: 3.5 };
            client.create(dto).await
        });

        match expect_request(&mut receiver).await {
            Some(CatalogRequest::Create { dto, respond_to }) => {
                assert_eq!(dto.name, "Test");
                respond_to.send(Ok(sample_product(1))).unwrap();
            }
            other => panic!("Expected Create request, got {other:?}"),
        }

        let result = create_task.await.unwrap().unwrap();
        assert_eq!(result.id, 1);
    }

    #[tokio::test]
    async fn dropped_responder_surfaces_as_communication_error() {
        let (client, mut receiver) = create_mock_client(1);
        let task = tokio::spawn(async move { client.find_one(1).await });

        drop(expect_request(&mut receiver).await);

        let err = task.await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "Actor communication error: Actor dropped");
    }
}
