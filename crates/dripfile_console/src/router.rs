use std::collections::HashMap;

use dripfile_contract::Resource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    LocationList,
    LocationCreate,
    LocationCreateMemory,
    LocationCreateS3,
    LocationRead { id: Option<String> },
    ItineraryList,
    ItineraryCreate,
    ItineraryRead { id: Option<String> },
    TransferList,
    TransferRead { id: Option<String> },
}

impl Route {
    pub fn list(resource: Resource) -> Self {
        match resource {
            Resource::Location => Route::LocationList,
            Resource::Itinerary => Route::ItineraryList,
            Resource::Transfer => Route::TransferList,
        }
    }

    pub fn read(resource: Resource, id: &str) -> Self {
        let id = Some(id.to_string());
        match resource {
            Resource::Location => Route::LocationRead { id },
            Resource::Itinerary => Route::ItineraryRead { id },
            Resource::Transfer => Route::TransferRead { id },
        }
    }

    pub fn path(&self) -> String {
        let record = |resource: Resource, id: &Option<String>| {
            format!("/{}/{}", resource.name(), id.as_deref().unwrap_or_default())
        };
        match self {
            Route::Dashboard => "/".to_string(),
            Route::LocationList => "/location".to_string(),
            Route::LocationCreate => "/location/create".to_string(),
            Route::LocationCreateMemory => "/location/create/in-memory".to_string(),
            Route::LocationCreateS3 => "/location/create/s3".to_string(),
            Route::LocationRead { id } => record(Resource::Location, id),
            Route::ItineraryList => "/itinerary".to_string(),
            Route::ItineraryCreate => "/itinerary/create".to_string(),
            Route::ItineraryRead { id } => record(Resource::Itinerary, id),
            Route::TransferList => "/transfer".to_string(),
            Route::TransferRead { id } => record(Resource::Transfer, id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
}

/// Path parameters captured by a pattern. Empty captures read as absent.
#[derive(Debug, Default)]
pub struct Params(HashMap<String, String>);

impl Params {
    pub fn get(&self, name: &str) -> Option<String> {
        self.0.get(name).filter(|value| !value.is_empty()).cloned()
    }
}

type RouteBuilder = fn(&Params) -> Route;

#[derive(Debug)]
struct Entry {
    pattern: Vec<Segment>,
    build: RouteBuilder,
}

/// Ordered route table. Patterns are `/`-separated with `{name}` captures;
/// the first matching pattern wins.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Entry>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, pattern: &str, build: RouteBuilder) -> Self {
        self.routes.push(Entry {
            pattern: parse_pattern(pattern),
            build,
        });
        self
    }

    pub fn resolve(&self, path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments = split(path);
        self.routes.iter().find_map(|entry| {
            capture(&entry.pattern, &segments).map(|params| (entry.build)(&params))
        })
    }
}

pub fn build_router() -> Router {
    Router::new()
        .route("/", |_| Route::Dashboard)
        .route("/location", |_| Route::LocationList)
        .route("/location/create", |_| Route::LocationCreate)
        .route("/location/create/in-memory", |_| Route::LocationCreateMemory)
        .route("/location/create/s3", |_| Route::LocationCreateS3)
        .route("/location/{id}", |params| Route::LocationRead {
            id: params.get("id"),
        })
        .route("/itinerary", |_| Route::ItineraryList)
        .route("/itinerary/create", |_| Route::ItineraryCreate)
        .route("/itinerary/{id}", |params| Route::ItineraryRead {
            id: params.get("id"),
        })
        .route("/transfer", |_| Route::TransferList)
        .route("/transfer/{id}", |params| Route::TransferRead {
            id: params.get("id"),
        })
}

fn split(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

fn parse_pattern(pattern: &str) -> Vec<Segment> {
    split(pattern)
        .into_iter()
        .map(|segment| {
            match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Static(segment.to_string()),
            }
        })
        .collect()
}

fn capture(pattern: &[Segment], segments: &[&str]) -> Option<Params> {
    if pattern.len() != segments.len() {
        return None;
    }

    let mut params = HashMap::new();
    for (expected, actual) in pattern.iter().zip(segments) {
        match expected {
            Segment::Static(literal) if literal == actual => {}
            Segment::Static(_) => return None,
            Segment::Param(name) => {
                params.insert(name.clone(), actual.to_string());
            }
        }
    }
    Some(Params(params))
}
