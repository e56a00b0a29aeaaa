use async_trait::async_trait;
use dripfile_contract::{
    CreateItinerary, CreateLocation, CreateTransfer, Itinerary, Location, Resource, Transfer,
};

use crate::error::ApiError;

/// Nothing is retried.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    async fn list_locations(&self) -> Result<Vec<Location>, ApiError>;

    async fn read_location(&self, id: &str) -> Result<Location, ApiError>;

    async fn create_location(&self, request: CreateLocation) -> Result<Location, ApiError>;

    async fn delete_location(&self, id: &str) -> Result<(), ApiError>;

    async fn list_itineraries(&self) -> Result<Vec<Itinerary>, ApiError>;

    async fn read_itinerary(&self, id: &str) -> Result<Itinerary, ApiError>;

    async fn create_itinerary(&self, request: CreateItinerary) -> Result<Itinerary, ApiError>;

    async fn delete_itinerary(&self, id: &str) -> Result<(), ApiError>;

    async fn list_transfers(&self) -> Result<Vec<Transfer>, ApiError>;

    async fn read_transfer(&self, id: &str) -> Result<Transfer, ApiError>;

    async fn create_transfer(&self, request: CreateTransfer) -> Result<Transfer, ApiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List(Resource),
    Read(Resource),
    Create(Resource),
    Delete(Resource),
}
