use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dripfile_contract::{
    CreateItinerary, CreateLocation, CreateTransfer, ErrorDetail, Itinerary, Location,
    LocationKind, Resource, Transfer,
};
use tokio::sync::{watch, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::api::{Operation, ResourceApi};
use crate::error::ApiError;

#[derive(Debug, Default)]
struct Records {
    // insertion order is list order
    locations: Vec<Location>,
    itineraries: Vec<Itinerary>,
    transfers: Vec<Transfer>,
}

#[derive(Debug)]
pub struct InMemoryResourceApi {
    records: RwLock<Records>,
    calls: RwLock<HashMap<Operation, usize>>,
    gate: watch::Sender<bool>,
    offline: AtomicBool,
}

impl Default for InMemoryResourceApi {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryResourceApi {
    pub fn new() -> Self {
        Self::with_records(Records::default())
    }

    fn with_records(records: Records) -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            records: RwLock::new(records),
            calls: RwLock::new(HashMap::new()),
            gate,
            offline: AtomicBool::new(false),
        }
    }

    /// Two memory locations joined by one itinerary, with a finished transfer.
    /// Ids are fixed (`loc_1`, `loc_2`, `it_1`, `tr_1`) so they can be typed.
    pub fn with_demo_data() -> Self {
        let now = Utc::now();
        let location = |id: &str| Location {
            id: id.to_string(),
            kind: LocationKind::Memory,
            created_at: now,
            updated_at: now,
        };
        let (from, to) = (location("loc_1"), location("loc_2"));
        let itinerary = Itinerary {
            id: "it_1".to_string(),
            from_location_id: from.id.clone(),
            to_location_id: to.id.clone(),
            pattern: "*".to_string(),
            created_at: now,
            updated_at: now,
        };
        let transfer = Transfer {
            id: "tr_1".to_string(),
            itinerary_id: itinerary.id.clone(),
            status: "success".to_string(),
            progress: 100,
            error: String::new(),
            created_at: now,
            updated_at: now,
        };

        Self::with_records(Records {
            locations: vec![from, to],
            itineraries: vec![itinerary],
            transfers: vec![transfer],
        })
    }

    pub fn pause(&self) {
        self.gate.send_replace(false);
    }

    pub fn resume(&self) {
        self.gate.send_replace(true);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub async fn calls(&self, operation: Operation) -> usize {
        self.calls.read().await.get(&operation).copied().unwrap_or(0)
    }

    pub async fn update_transfer(
        &self,
        id: &str,
        status: &str,
        progress: i64,
    ) -> Result<Transfer, ApiError> {
        let mut records = self.records.write().await;
        let transfer = records
            .transfers
            .iter_mut()
            .find(|transfer| transfer.id == id)
            .ok_or_else(|| not_found(Resource::Transfer))?;
        transfer.status = status.to_string();
        transfer.progress = progress;
        transfer.updated_at = Utc::now();
        Ok(transfer.clone())
    }

    async fn enter(&self, operation: Operation) -> Result<(), ApiError> {
        *self.calls.write().await.entry(operation).or_insert(0) += 1;

        let mut gate = self.gate.subscribe();
        // the sender lives in self, so the wait cannot observe a closed channel
        let _ = gate.wait_for(|open| *open).await;

        if self.offline.load(Ordering::SeqCst) {
            return Err(ApiError::network("in-memory api is offline"));
        }
        Ok(())
    }
}

fn new_id() -> String {
    Uuid::now_v7().to_string()
}

fn not_found(resource: Resource) -> ApiError {
    ApiError::message(format!("{resource} not found"))
}

fn validate_location(request: &CreateLocation) -> Result<(), ApiError> {
    let mut errors = BTreeMap::new();
    match request {
        CreateLocation::Memory { capacity } => {
            if capacity.trim().is_empty() {
                errors.insert("capacity".to_string(), "must be provided".to_string());
            }
        }
        CreateLocation::S3 {
            endpoint,
            bucket,
            access_key_id,
            secret_access_key,
        } => {
            for (field, value) in [
                ("endpoint", endpoint),
                ("bucket", bucket),
                ("accessKeyID", access_key_id),
                ("secretAccessKey", secret_access_key),
            ] {
                if value.trim().is_empty() {
                    errors.insert(field.to_string(), "must be provided".to_string());
                }
            }
            if errors.is_empty() && !valid_bucket_name(bucket) {
                return Err(ApiError::message("bucket name invalid"));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Application(ErrorDetail::Fields(errors)))
    }
}

fn valid_bucket_name(bucket: &str) -> bool {
    (3..=63).contains(&bucket.len())
        && bucket
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
}

#[async_trait]
impl ResourceApi for InMemoryResourceApi {
    async fn list_locations(&self) -> Result<Vec<Location>, ApiError> {
        self.enter(Operation::List(Resource::Location)).await?;
        Ok(self.records.read().await.locations.clone())
    }

    async fn read_location(&self, id: &str) -> Result<Location, ApiError> {
        self.enter(Operation::Read(Resource::Location)).await?;
        let records = self.records.read().await;
        records
            .locations
            .iter()
            .find(|location| location.id == id)
            .cloned()
            .ok_or_else(|| not_found(Resource::Location))
    }

    async fn create_location(&self, request: CreateLocation) -> Result<Location, ApiError> {
        self.enter(Operation::Create(Resource::Location)).await?;
        validate_location(&request)?;

        let now = Utc::now();
        let location = Location {
            id: new_id(),
            kind: request.kind(),
            created_at: now,
            updated_at: now,
        };
        self.records.write().await.locations.push(location.clone());
        info!(id = %location.id, kind = location.kind.as_str(), "in-memory location created");
        Ok(location)
    }

    async fn delete_location(&self, id: &str) -> Result<(), ApiError> {
        self.enter(Operation::Delete(Resource::Location)).await?;
        let mut records = self.records.write().await;
        let referenced = records
            .itineraries
            .iter()
            .any(|itinerary| itinerary.from_location_id == id || itinerary.to_location_id == id);
        if referenced {
            return Err(ApiError::message("location is used by an itinerary"));
        }

        let before = records.locations.len();
        records.locations.retain(|location| location.id != id);
        if records.locations.len() == before {
            return Err(not_found(Resource::Location));
        }
        Ok(())
    }

    async fn list_itineraries(&self) -> Result<Vec<Itinerary>, ApiError> {
        self.enter(Operation::List(Resource::Itinerary)).await?;
        Ok(self.records.read().await.itineraries.clone())
    }

    async fn read_itinerary(&self, id: &str) -> Result<Itinerary, ApiError> {
        self.enter(Operation::Read(Resource::Itinerary)).await?;
        let records = self.records.read().await;
        records
            .itineraries
            .iter()
            .find(|itinerary| itinerary.id == id)
            .cloned()
            .ok_or_else(|| not_found(Resource::Itinerary))
    }

    async fn create_itinerary(&self, request: CreateItinerary) -> Result<Itinerary, ApiError> {
        self.enter(Operation::Create(Resource::Itinerary)).await?;

        let mut records = self.records.write().await;
        let mut errors = BTreeMap::new();
        for (field, id) in [
            ("fromLocationID", &request.from_location_id),
            ("toLocationID", &request.to_location_id),
        ] {
            if !records.locations.iter().any(|location| &location.id == id) {
                errors.insert(field.to_string(), "must reference an existing location".to_string());
            }
        }
        if request.pattern.trim().is_empty() {
            errors.insert("pattern".to_string(), "must be provided".to_string());
        }
        if !errors.is_empty() {
            return Err(ApiError::Application(ErrorDetail::Fields(errors)));
        }

        let now = Utc::now();
        let itinerary = Itinerary {
            id: "it_1".to_string(),
            from_location_id: request.from_location_id,
            to_location_id: request.to_location_id,
            pattern: request.pattern,
            created_at: now,
            updated_at: now,
        };
        records.itineraries.push(itinerary.clone());
        info!(id = %itinerary.id, "in-memory itinerary created");
        Ok(itinerary)
    }

    async fn delete_itinerary(&self, id: &str) -> Result<(), ApiError> {
        self.enter(Operation::Delete(Resource::Itinerary)).await?;
        let mut records = self.records.write().await;
        let before = records.itineraries.len();
        records.itineraries.retain(|itinerary| itinerary.id != id);
        if records.itineraries.len() == before {
            return Err(not_found(Resource::Itinerary));
        }
        Ok(())
    }

    async fn list_transfers(&self) -> Result<Vec<Transfer>, ApiError> {
        self.enter(Operation::List(Resource::Transfer)).await?;
        Ok(self.records.read().await.transfers.clone())
    }

    async fn read_transfer(&self, id: &str) -> Result<Transfer, ApiError> {
        self.enter(Operation::Read(Resource::Transfer)).await?;
        let records = self.records.read().await;
        records
            .transfers
            .iter()
            .find(|transfer| transfer.id == id)
            .cloned()
            .ok_or_else(|| not_found(Resource::Transfer))
    }

    async fn create_transfer(&self, request: CreateTransfer) -> Result<Transfer, ApiError> {
        self.enter(Operation::Create(Resource::Transfer)).await?;

        let mut records = self.records.write().await;
        if !records
            .itineraries
            .iter()
            .any(|itinerary| itinerary.id == request.itinerary_id)
        {
            return Err(ApiError::Application(ErrorDetail::Fields(BTreeMap::from([(
                "itineraryID".to_string(),
                "must reference an existing itinerary".to_string(),
            )]))));
        }

        let now = Utc::now();
        let transfer = Transfer {
            id: "tr_1".to_string(),
            itinerary_id: request.itinerary_id,
            status: "pending".to_string(),
            progress: 0,
            error: String::new(),
            created_at: now,
            updated_at: now,
        };
        records.transfers.push(transfer.clone());
        info!(
            id = %transfer.id,
            itinerary_id = %transfer.itinerary_id,
            "in-memory transfer created"
        );
        Ok(transfer)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use dripfile_contract::{CreateItinerary, CreateLocation, CreateTransfer, Resource};

    use super::InMemoryResourceApi;
    use crate::api::{Operation, ResourceApi};
    use crate::error::ApiError;

    fn memory(capacity: &str) -> CreateLocation {
        CreateLocation::Memory {
            capacity: capacity.to_string(),
        }
    }

    #[tokio::test]
    async fn s3_validation_matches_server_messages() {
        let api = InMemoryResourceApi::new();

        let err = api
            .create_location(CreateLocation::S3 {
                endpoint: String::new(),
                bucket: "photos".to_string(),
                access_key_id: String::new(),
                secret_access_key: "secret".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "accessKeyID: must be provided, endpoint: must be provided"
        );

        let err = api
            .create_location(CreateLocation::S3 {
                endpoint: "localhost:9000".to_string(),
                bucket: "Not A Bucket".to_string(),
                access_key_id: "minio".to_string(),
                secret_access_key: "secret".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::message("bucket name invalid"));
    }

    #[tokio::test]
    async fn itineraries_and_transfers_require_existing_references() {
        let api = InMemoryResourceApi::new();
        let from = api.create_location(memory("10")).await.expect("from");
        let to = api.create_location(memory("10")).await.expect("to");

        let err = api
            .create_itinerary(CreateItinerary {
                from_location_id: from.id.clone(),
                to_location_id: "nowhere".to_string(),
                pattern: "*.csv".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "toLocationID: must reference an existing location");

        let itinerary = api
            .create_itinerary(CreateItinerary {
                from_location_id: from.id.clone(),
                to_location_id: to.id,
                pattern: "*.csv".to_string(),
            })
            .await
            .expect("itinerary");

        let transfer = api
            .create_transfer(CreateTransfer {
                itinerary_id: itinerary.id.clone(),
            })
            .await
            .expect("transfer");
        assert_eq!(transfer.status, "pending");

        let err = api.delete_location(&from.id).await.unwrap_err();
        assert_eq!(err.to_string(), "location is used by an itinerary");
        api.delete_itinerary(&itinerary.id).await.expect("delete itinerary");
        api.delete_location(&from.id).await.expect("delete location");
        assert_eq!(api.list_locations().await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn paused_calls_wait_for_resume_and_are_counted() {
        let api = Arc::new(InMemoryResourceApi::new());
        api.pause();

        let pending = tokio::spawn({
            let api = api.clone();
            async move { api.list_locations().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pending.is_finished());
        assert_eq!(api.calls(Operation::List(Resource::Location)).await, 1);

        api.resume();
        let locations = pending.await.expect("join").expect("list");
        assert!(locations.is_empty());
    }

    #[tokio::test]
    async fn offline_calls_fail_as_network_errors() {
        let api = InMemoryResourceApi::new();
        api.set_offline(true);
        assert!(api.list_transfers().await.unwrap_err().is_network());
    }

    #[tokio::test]
    async fn demo_data_is_consistent_and_transfers_can_advance() {
        let api = InMemoryResourceApi::with_demo_data();
        let locations = api.list_locations().await.expect("locations");
        let itineraries = api.list_itineraries().await.expect("itineraries");
        assert_eq!(locations.len(), 2);
        assert_eq!(itineraries[0].id, "it_1");
        assert_eq!(itineraries[0].from_location_id, locations[0].id);
        assert_eq!(itineraries[0].to_location_id, locations[1].id);

        let transfer = api
            .create_transfer(CreateTransfer {
                itinerary_id: itineraries[0].id.clone(),
            })
            .await
            .expect("transfer");
        let moved = api
            .update_transfer(&transfer.id, "running", 25)
            .await
            .expect("update");
        assert_eq!((moved.status.as_str(), moved.progress), ("running", 25));
        assert_eq!(api.list_transfers().await.expect("transfers").len(), 2);

        let err = api.update_transfer("tr_404", "running", 1).await.unwrap_err();
        assert_eq!(err.to_string(), "transfer not found");
    }
}
