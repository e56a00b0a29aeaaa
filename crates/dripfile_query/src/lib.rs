pub mod cache;
pub mod key;
pub mod mutation;
pub mod state;

pub use cache::{Fetcher, QueryCache, QueryHandle};
pub use key::QueryKey;
pub use mutation::{Mutation, Submission};
pub use state::{MutationState, QueryState};
