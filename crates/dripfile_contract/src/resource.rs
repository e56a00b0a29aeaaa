use std::fmt;

use serde::{de::DeserializeOwned, Serialize};

pub const API_PREFIX: &str = "/api/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Location,
    Itinerary,
    Transfer,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Location, Resource::Itinerary, Resource::Transfer];

    pub fn name(&self) -> &'static str {
        match self {
            Resource::Location => "location",
            Resource::Itinerary => "itinerary",
            Resource::Transfer => "transfer",
        }
    }

    pub fn collection_key(&self) -> &'static str {
        match self {
            Resource::Location => "locations",
            Resource::Itinerary => "itineraries",
            Resource::Transfer => "transfers",
        }
    }

    pub fn collection_path(&self) -> String {
        format!("{API_PREFIX}/{}", self.name())
    }

    pub fn record_path(&self, id: &str) -> String {
        format!("{API_PREFIX}/{}/{id}", self.name())
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|resource| resource.name() == name)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait Entity: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    const RESOURCE: Resource;

    fn id(&self) -> &str;
}
