use std::marker::PhantomData;

use dripfile_client::ApiError;
use dripfile_query::{QueryHandle, QueryState};
use futures::future::FutureExt;

use crate::context::ConsoleContext;
use crate::records::{list_key, ConsoleState, Record, Snapshot};
use crate::view::{EmptyState, Table, View};

pub struct ListPage<T> {
    handle: QueryHandle<Snapshot, ApiError>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> ListPage<T> {
    pub fn mount(ctx: &ConsoleContext) -> Self {
        let api = ctx.api().clone();
        let handle = ctx.cache().watch(list_key(T::RESOURCE), move || {
            T::fetch_list(api.clone()).map(|result| result.map(T::list_snapshot))
        });
        Self {
            handle,
            _record: PhantomData,
        }
    }

    pub fn handle(&self) -> &QueryHandle<Snapshot, ApiError> {
        &self.handle
    }

    pub fn handle_mut(&mut self) -> &mut QueryHandle<Snapshot, ApiError> {
        &mut self.handle
    }

    pub fn render(&self) -> View {
        render_list::<T>(&self.handle.state())
    }
}

/// Previous data stays on screen while a refetch is in flight.
pub fn render_list<T: Record>(state: &ConsoleState) -> View {
    let snapshot = match state {
        QueryState::Idle | QueryState::Pending => return View::Loading,
        QueryState::Error(error) => return View::Error(error.to_string()),
        QueryState::Success(snapshot) | QueryState::Refreshing(snapshot) => snapshot,
    };
    let Some(items) = T::from_list(snapshot) else {
        return View::Error(format!("unexpected value cached for {}", T::RESOURCE));
    };

    if items.is_empty() {
        return View::Empty(EmptyState {
            title: T::EMPTY_TITLE.to_string(),
            prompt: T::EMPTY_PROMPT.to_string(),
            action: T::create_action(),
        });
    }

    View::Table(Table {
        title: T::LIST_TITLE.to_string(),
        description: T::LIST_DESCRIPTION.to_string(),
        columns: T::columns().iter().map(|column| column.to_string()).collect(),
        rows: items.iter().map(Record::row).collect(),
        action: Some(T::create_action()),
    })
}
