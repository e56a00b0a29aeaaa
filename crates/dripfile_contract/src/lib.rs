pub mod codec;
pub mod envelope;
pub mod model;
pub mod resource;

pub use codec::{decode_collection, decode_created, decode_error, decode_record, CodecError};
pub use envelope::{ErrorDetail, ErrorResponse};
pub use model::{
    CreateItinerary, CreateLocation, CreateTransfer, Itinerary, ItineraryId, Location, LocationId,
    LocationKind, Transfer, TransferId,
};
pub use resource::{Entity, Resource, API_PREFIX};
