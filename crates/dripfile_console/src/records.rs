use std::sync::Arc;

use chrono::{DateTime, Utc};
use dripfile_client::{ApiError, ResourceApi};
use dripfile_contract::{Entity, Itinerary, Location, Resource, Transfer};
use dripfile_query::{QueryCache, QueryKey, QueryState};
use futures::future::{BoxFuture, FutureExt};

use crate::router::Route;
use crate::view::{Cell, Link};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    Locations(Vec<Location>),
    Location(Location),
    Itineraries(Vec<Itinerary>),
    Itinerary(Itinerary),
    Transfers(Vec<Transfer>),
    Transfer(Transfer),
}

pub type ConsoleCache = QueryCache<Snapshot, ApiError>;
pub type ConsoleState = QueryState<Snapshot, ApiError>;
pub type Fetch<T> = BoxFuture<'static, Result<T, ApiError>>;

pub fn list_key(resource: Resource) -> QueryKey {
    QueryKey::collection(resource.name())
}

pub fn record_key(resource: Resource, id: &str) -> QueryKey {
    QueryKey::record(resource.name(), id)
}

pub trait Record: Entity + PartialEq {
    const LIST_TITLE: &'static str;
    const LIST_DESCRIPTION: &'static str;
    const EMPTY_TITLE: &'static str;
    const EMPTY_PROMPT: &'static str;

    fn create_action() -> Link;

    fn list_snapshot(items: Vec<Self>) -> Snapshot;
    fn record_snapshot(item: Self) -> Snapshot;
    fn from_list(snapshot: &Snapshot) -> Option<&[Self]>;
    fn from_record(snapshot: &Snapshot) -> Option<&Self>;

    fn fetch_list(api: Arc<dyn ResourceApi>) -> Fetch<Vec<Self>>;
    fn fetch_one(api: Arc<dyn ResourceApi>, id: String) -> Fetch<Self>;

    fn columns() -> &'static [&'static str];
    fn row(&self) -> Vec<Cell>;
    fn detail(&self) -> Vec<(String, String)>;
}

fn id_cell<T: Entity>(item: &T) -> Cell {
    Cell::link(item.id(), Route::read(T::RESOURCE, item.id()).path())
}

fn timestamps(created: &DateTime<Utc>, updated: &DateTime<Utc>) -> [(String, String); 2] {
    [
        ("CreatedAt".to_string(), created.to_rfc3339()),
        ("UpdatedAt".to_string(), updated.to_rfc3339()),
    ]
}

impl Record for Location {
    const LIST_TITLE: &'static str = "Locations";
    const LIST_DESCRIPTION: &'static str = "A list of all the locations where your data lives.";
    const EMPTY_TITLE: &'static str = "No locations";
    const EMPTY_PROMPT: &'static str = "Get started by adding a new location.";

    fn create_action() -> Link {
        Link::new("Add location", Route::LocationCreate.path())
    }

    fn list_snapshot(items: Vec<Self>) -> Snapshot {
        Snapshot::Locations(items)
    }

    fn record_snapshot(item: Self) -> Snapshot {
        Snapshot::Location(item)
    }

    fn from_list(snapshot: &Snapshot) -> Option<&[Self]> {
        match snapshot {
            Snapshot::Locations(items) => Some(items),
            _ => None,
        }
    }

    fn from_record(snapshot: &Snapshot) -> Option<&Self> {
        match snapshot {
            Snapshot::Location(item) => Some(item),
            _ => None,
        }
    }

    fn fetch_list(api: Arc<dyn ResourceApi>) -> Fetch<Vec<Self>> {
        async move { api.list_locations().await }.boxed()
    }

    fn fetch_one(api: Arc<dyn ResourceApi>, id: String) -> Fetch<Self> {
        async move { api.read_location(&id).await }.boxed()
    }

    fn columns() -> &'static [&'static str] {
        &["ID", "Kind"]
    }

    fn row(&self) -> Vec<Cell> {
        vec![id_cell(self), Cell::text(self.kind.as_str())]
    }

    fn detail(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("ID".to_string(), self.id.clone()),
            ("Kind".to_string(), self.kind.as_str().to_string()),
        ];
        fields.extend(timestamps(&self.created_at, &self.updated_at));
        fields
    }
}

impl Record for Itinerary {
    const LIST_TITLE: &'static str = "Itineraries";
    const LIST_DESCRIPTION: &'static str = "A list of all your transfer itineraries.";
    const EMPTY_TITLE: &'static str = "No itineraries";
    const EMPTY_PROMPT: &'static str = "Get started by adding a new itinerary.";

    fn create_action() -> Link {
        Link::new("New Itinerary", Route::ItineraryCreate.path())
    }

    fn list_snapshot(items: Vec<Self>) -> Snapshot {
        Snapshot::Itineraries(items)
    }

    fn record_snapshot(item: Self) -> Snapshot {
        Snapshot::Itinerary(item)
    }

    fn from_list(snapshot: &Snapshot) -> Option<&[Self]> {
        match snapshot {
            Snapshot::Itineraries(items) => Some(items),
            _ => None,
        }
    }

    fn from_record(snapshot: &Snapshot) -> Option<&Self> {
        match snapshot {
            Snapshot::Itinerary(item) => Some(item),
            _ => None,
        }
    }

    fn fetch_list(api: Arc<dyn ResourceApi>) -> Fetch<Vec<Self>> {
        async move { api.list_itineraries().await }.boxed()
    }

    fn fetch_one(api: Arc<dyn ResourceApi>, id: String) -> Fetch<Self> {
        async move { api.read_itinerary(&id).await }.boxed()
    }

    fn columns() -> &'static [&'static str] {
        &["ID", "From", "To", "Pattern"]
    }

    fn row(&self) -> Vec<Cell> {
        vec![
            id_cell(self),
            Cell::link(
                &self.from_location_id,
                Route::read(Resource::Location, &self.from_location_id).path(),
            ),
            Cell::link(
                &self.to_location_id,
                Route::read(Resource::Location, &self.to_location_id).path(),
            ),
            Cell::text(&self.pattern),
        ]
    }

    fn detail(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("ID".to_string(), self.id.clone()),
            ("From".to_string(), self.from_location_id.clone()),
            ("To".to_string(), self.to_location_id.clone()),
            ("Pattern".to_string(), self.pattern.clone()),
        ];
        fields.extend(timestamps(&self.created_at, &self.updated_at));
        fields
    }
}

impl Record for Transfer {
    const LIST_TITLE: &'static str = "Transfers";
    const LIST_DESCRIPTION: &'static str = "A list of all recent transfers.";
    const EMPTY_TITLE: &'static str = "No transfers";
    const EMPTY_PROMPT: &'static str = "Get started by running an itinerary.";

    // transfers are started from an itinerary's page
    fn create_action() -> Link {
        Link::new("View itineraries", Route::ItineraryList.path())
    }

    fn list_snapshot(items: Vec<Self>) -> Snapshot {
        Snapshot::Transfers(items)
    }

    fn record_snapshot(item: Self) -> Snapshot {
        Snapshot::Transfer(item)
    }

    fn from_list(snapshot: &Snapshot) -> Option<&[Self]> {
        match snapshot {
            Snapshot::Transfers(items) => Some(items),
            _ => None,
        }
    }

    fn from_record(snapshot: &Snapshot) -> Option<&Self> {
        match snapshot {
            Snapshot::Transfer(item) => Some(item),
            _ => None,
        }
    }

    fn fetch_list(api: Arc<dyn ResourceApi>) -> Fetch<Vec<Self>> {
        async move { api.list_transfers().await }.boxed()
    }

    fn fetch_one(api: Arc<dyn ResourceApi>, id: String) -> Fetch<Self> {
        async move { api.read_transfer(&id).await }.boxed()
    }

    fn columns() -> &'static [&'static str] {
        &["ID", "ItineraryID", "Status", "Progress", "Error"]
    }

    fn row(&self) -> Vec<Cell> {
        vec![
            id_cell(self),
            Cell::link(
                &self.itinerary_id,
                Route::read(Resource::Itinerary, &self.itinerary_id).path(),
            ),
            Cell::text(&self.status),
            Cell::text(self.progress.to_string()),
            Cell::text(&self.error),
        ]
    }

    fn detail(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("ID".to_string(), self.id.clone()),
            ("ItineraryID".to_string(), self.itinerary_id.clone()),
            ("Status".to_string(), self.status.clone()),
            ("Progress".to_string(), self.progress.to_string()),
            ("Error".to_string(), self.error.clone()),
        ];
        fields.extend(timestamps(&self.created_at, &self.updated_at));
        fields
    }
}
