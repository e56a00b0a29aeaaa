use std::marker::PhantomData;

use dripfile_client::ApiError;
use dripfile_query::{QueryHandle, QueryState};
use futures::future::FutureExt;

use crate::context::ConsoleContext;
use crate::records::{record_key, ConsoleState, Record, Snapshot};
use crate::view::{Detail, View};

pub struct ReadPage<T> {
    handle: Option<QueryHandle<Snapshot, ApiError>>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> ReadPage<T> {
    pub fn mount(ctx: &ConsoleContext, id: Option<String>) -> Self {
        let handle = id.map(|id| {
            let api = ctx.api().clone();
            ctx.cache().watch(record_key(T::RESOURCE, &id), move || {
                T::fetch_one(api.clone(), id.clone()).map(|result| result.map(T::record_snapshot))
            })
        });
        Self {
            handle,
            _record: PhantomData,
        }
    }

    pub fn handle(&self) -> Option<&QueryHandle<Snapshot, ApiError>> {
        self.handle.as_ref()
    }

    pub fn handle_mut(&mut self) -> Option<&mut QueryHandle<Snapshot, ApiError>> {
        self.handle.as_mut()
    }

    pub fn render(&self) -> View {
        match &self.handle {
            Some(handle) => render_record::<T>(&handle.state()),
            None => View::Nothing,
        }
    }
}

pub fn render_record<T: Record>(state: &ConsoleState) -> View {
    match state {
        QueryState::Idle | QueryState::Pending => View::Loading,
        QueryState::Error(error) => View::Error(error.to_string()),
        QueryState::Success(snapshot) | QueryState::Refreshing(snapshot) => {
            match T::from_record(snapshot) {
                Some(item) => View::Detail(Detail {
                    fields: item.detail(),
                    form: None,
                }),
                None => View::Error(format!("unexpected value cached for {}", T::RESOURCE)),
            }
        }
    }
}
