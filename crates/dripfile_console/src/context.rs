use std::sync::Arc;

use dripfile_client::{ApiError, ResourceApi};
use dripfile_contract::Resource;
use dripfile_query::Mutation;
use tracing::debug;

use crate::navigation::Navigator;
use crate::pages::Page;
use crate::records::{list_key, ConsoleCache};
use crate::router::{build_router, Route, Router};

#[derive(Clone)]
pub struct ConsoleContext {
    api: Arc<dyn ResourceApi>,
    cache: ConsoleCache,
    navigator: Navigator,
    router: Arc<Router>,
}

impl ConsoleContext {
    pub fn new(api: Arc<dyn ResourceApi>) -> Self {
        Self {
            api,
            cache: ConsoleCache::new(),
            navigator: Navigator::default(),
            router: Arc::new(build_router()),
        }
    }

    pub fn api(&self) -> &Arc<dyn ResourceApi> {
        &self.api
    }

    pub fn cache(&self) -> &ConsoleCache {
        &self.cache
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn resolve(&self, path: &str) -> Option<Route> {
        self.router.resolve(path)
    }

    pub fn open(&self, path: &str) -> Option<Page> {
        let route = self.resolve(path)?;
        if self.navigator.current() != path {
            self.navigator.navigate(path);
        }
        debug!(path, route = ?route, "mounting page");
        Some(Page::mount(self, route))
    }

    pub fn open_current(&self) -> Option<Page> {
        let path = self.navigator.current();
        self.resolve(&path).map(|route| Page::mount(self, route))
    }

    // the list prefix also covers every record key of the resource
    pub(crate) fn after_write(&self, resource: Resource) {
        self.cache.invalidate(&list_key(resource));
        self.navigator.navigate(Route::list(resource).path());
    }

    pub fn delete_mutation(
        &self,
        resource: Resource,
    ) -> Option<Mutation<String, String, ApiError>> {
        if resource == Resource::Transfer {
            return None;
        }
        let api = self.api.clone();
        let context = self.clone();
        let mutation = Mutation::new(move |id: String| {
            let api = api.clone();
            async move {
                let deleted = match resource {
                    Resource::Itinerary => api.delete_itinerary(&id).await,
                    _ => api.delete_location(&id).await,
                };
                deleted.map(|()| id)
            }
        })
        .on_success(move |_: &String| context.after_write(resource));
        Some(mutation)
    }

    pub fn shutdown(&self) {
        self.cache.clear();
    }
}
