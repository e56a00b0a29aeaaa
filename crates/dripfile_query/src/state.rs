/// A refetch over existing data goes through `Refreshing`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryState<V, E> {
    Idle,
    Pending,
    Refreshing(V),
    Success(V),
    Error(E),
}

impl<V, E> QueryState<V, E> {
    pub fn data(&self) -> Option<&V> {
        match self {
            QueryState::Success(data) | QueryState::Refreshing(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            QueryState::Error(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self, QueryState::Pending | QueryState::Refreshing(_))
    }

    pub(crate) fn needs_fetch(&self) -> bool {
        matches!(self, QueryState::Idle | QueryState::Error(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationState<T, E> {
    Idle,
    Pending,
    Success(T),
    Error(E),
}

impl<T, E> MutationState<T, E> {
    pub fn is_pending(&self) -> bool {
        matches!(self, MutationState::Pending)
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            MutationState::Error(error) => Some(error),
            _ => None,
        }
    }
}
