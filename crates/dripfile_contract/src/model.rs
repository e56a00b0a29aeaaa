use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::resource::{Entity, Resource};

pub type LocationId = String;
pub type ItineraryId = String;
pub type TransferId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    Memory,
    S3,
}

impl LocationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationKind::Memory => "memory",
            LocationKind::S3 => "s3",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: LocationId,
    pub kind: LocationKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub id: ItineraryId,
    #[serde(rename = "fromLocationID")]
    pub from_location_id: LocationId,
    #[serde(rename = "toLocationID")]
    pub to_location_id: LocationId,
    pub pattern: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One execution of an itinerary. `status` is owned by the server and only
/// ever observed here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub id: TransferId,
    #[serde(rename = "itineraryID")]
    pub itinerary_id: ItineraryId,
    pub status: String,
    pub progress: i64,
    #[serde(default)]
    pub error: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Location {
    const RESOURCE: Resource = Resource::Location;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Itinerary {
    const RESOURCE: Resource = Resource::Itinerary;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Transfer {
    const RESOURCE: Resource = Resource::Transfer;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CreateLocation {
    Memory {
        capacity: String,
    },
    S3 {
        endpoint: String,
        bucket: String,
        #[serde(rename = "accessKeyID")]
        access_key_id: String,
        #[serde(rename = "secretAccessKey")]
        secret_access_key: String,
    },
}

impl CreateLocation {
    pub fn kind(&self) -> LocationKind {
        match self {
            CreateLocation::Memory { .. } => LocationKind::Memory,
            CreateLocation::S3 { .. } => LocationKind::S3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateItinerary {
    #[serde(rename = "fromLocationID")]
    pub from_location_id: LocationId,
    #[serde(rename = "toLocationID")]
    pub to_location_id: LocationId,
    pub pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateTransfer {
    #[serde(rename = "itineraryID")]
    pub itinerary_id: ItineraryId,
}
