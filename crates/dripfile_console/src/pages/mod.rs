mod create;
mod list;
mod read;

use dripfile_client::ApiError;
use dripfile_contract::{Itinerary, Location, Transfer};
use dripfile_query::{MutationState, QueryHandle, QueryKey};
use tokio_stream::wrappers::WatchStream;

pub use create::{
    dashboard, location_menu, ItineraryCreatePage, ItineraryForm, LocationForm, RunForm,
};
pub use list::{render_list, ListPage};
pub use read::{render_record, ReadPage};

use crate::context::ConsoleContext;
use crate::form::SubmitError;
use crate::records::{ConsoleState, Record, Snapshot};
use crate::router::Route;
use crate::view::View;

pub struct ItineraryReadPage {
    read: ReadPage<Itinerary>,
    run: Option<RunForm>,
}

impl ItineraryReadPage {
    fn mount(ctx: &ConsoleContext, id: Option<String>) -> Self {
        let run = id.as_deref().and_then(|id| create::run_form(ctx, id).ok());
        Self {
            read: ReadPage::mount(ctx, id),
            run,
        }
    }

    fn loaded_id(&self) -> Option<String> {
        let state = self.read.handle()?.state();
        state
            .data()
            .and_then(Itinerary::from_record)
            .map(|itinerary| itinerary.id.clone())
    }

    // the form is only shown once the itinerary has loaded
    fn submit(&mut self) -> Result<(), SubmitError> {
        if self.run.is_none() {
            return Err(SubmitError::NotAForm);
        }
        let id = self.loaded_id().ok_or(SubmitError::NotReady)?;
        let run = self.run.as_mut().ok_or(SubmitError::NotAForm)?;
        run.set("itineraryID", id)?;
        run.submit()
    }

    fn render(&self) -> View {
        match (self.read.render(), &self.run) {
            (View::Detail(mut detail), Some(run)) => {
                detail.form = Some(run.render(|_| Vec::new()));
                View::Detail(detail)
            }
            (view, _) => view,
        }
    }
}

pub enum Page {
    Dashboard,
    LocationList(ListPage<Location>),
    LocationCreate,
    LocationCreateMemory(LocationForm),
    LocationCreateS3(LocationForm),
    LocationRead(ReadPage<Location>),
    ItineraryList(ListPage<Itinerary>),
    ItineraryCreate(ItineraryCreatePage),
    ItineraryRead(ItineraryReadPage),
    TransferList(ListPage<Transfer>),
    TransferRead(ReadPage<Transfer>),
}

fn outcome<T>(state: MutationState<T, ApiError>) -> Option<Result<(), ApiError>> {
    match state {
        MutationState::Success(_) => Some(Ok(())),
        MutationState::Error(error) => Some(Err(error)),
        MutationState::Idle | MutationState::Pending => None,
    }
}

impl Page {
    pub fn mount(ctx: &ConsoleContext, route: Route) -> Self {
        match route {
            Route::Dashboard => Page::Dashboard,
            Route::LocationList => Page::LocationList(ListPage::mount(ctx)),
            Route::LocationCreate => Page::LocationCreate,
            Route::LocationCreateMemory => Page::LocationCreateMemory(create::memory_form(ctx)),
            Route::LocationCreateS3 => Page::LocationCreateS3(create::s3_form(ctx)),
            Route::LocationRead { id } => Page::LocationRead(ReadPage::mount(ctx, id)),
            Route::ItineraryList => Page::ItineraryList(ListPage::mount(ctx)),
            Route::ItineraryCreate => Page::ItineraryCreate(ItineraryCreatePage::mount(ctx)),
            Route::ItineraryRead { id } => {
                Page::ItineraryRead(ItineraryReadPage::mount(ctx, id))
            }
            Route::TransferList => Page::TransferList(ListPage::mount(ctx)),
            Route::TransferRead { id } => Page::TransferRead(ReadPage::mount(ctx, id)),
        }
    }

    pub fn render(&self) -> View {
        match self {
            Page::Dashboard => dashboard(),
            Page::LocationList(page) => page.render(),
            Page::LocationCreate => location_menu(),
            Page::LocationCreateMemory(form) | Page::LocationCreateS3(form) => {
                View::Form(form.render(|_| Vec::new()))
            }
            Page::LocationRead(page) => page.render(),
            Page::ItineraryList(page) => page.render(),
            Page::ItineraryCreate(page) => page.render(),
            Page::ItineraryRead(page) => page.render(),
            Page::TransferList(page) => page.render(),
            Page::TransferRead(page) => page.render(),
        }
    }

    fn handle(&self) -> Option<&QueryHandle<Snapshot, ApiError>> {
        match self {
            Page::LocationList(page) => Some(page.handle()),
            Page::ItineraryList(page) => Some(page.handle()),
            Page::TransferList(page) => Some(page.handle()),
            Page::LocationRead(page) => page.handle(),
            Page::ItineraryRead(page) => page.read.handle(),
            Page::TransferRead(page) => page.handle(),
            Page::ItineraryCreate(page) => Some(page.locations()),
            Page::Dashboard
            | Page::LocationCreate
            | Page::LocationCreateMemory(_)
            | Page::LocationCreateS3(_) => None,
        }
    }

    fn handle_mut(&mut self) -> Option<&mut QueryHandle<Snapshot, ApiError>> {
        match self {
            Page::LocationList(page) => Some(page.handle_mut()),
            Page::ItineraryList(page) => Some(page.handle_mut()),
            Page::TransferList(page) => Some(page.handle_mut()),
            Page::LocationRead(page) => page.handle_mut(),
            Page::ItineraryRead(page) => page.read.handle_mut(),
            Page::TransferRead(page) => page.handle_mut(),
            Page::ItineraryCreate(page) => Some(page.locations_mut()),
            Page::Dashboard
            | Page::LocationCreate
            | Page::LocationCreateMemory(_)
            | Page::LocationCreateS3(_) => None,
        }
    }

    pub fn query_key(&self) -> Option<&QueryKey> {
        self.handle().map(QueryHandle::key)
    }

    pub async fn settled(&mut self) -> Option<ConsoleState> {
        match self.handle_mut() {
            Some(handle) => Some(handle.settled().await),
            None => None,
        }
    }

    pub fn updates(&self) -> Option<WatchStream<ConsoleState>> {
        self.handle().map(QueryHandle::updates)
    }

    pub fn refresh(&self, ctx: &ConsoleContext) -> usize {
        self.query_key()
            .map(|key| ctx.cache().invalidate(key))
            .unwrap_or_default()
    }

    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), SubmitError> {
        match self {
            Page::LocationCreateMemory(form) | Page::LocationCreateS3(form) => {
                form.set(name, value)
            }
            Page::ItineraryCreate(page) => page.form_mut().set(name, value),
            Page::ItineraryRead(ItineraryReadPage { run: Some(run), .. }) => run.set(name, value),
            _ => Err(SubmitError::NotAForm),
        }
    }

    pub fn submit(&mut self) -> Result<(), SubmitError> {
        match self {
            Page::LocationCreateMemory(form) | Page::LocationCreateS3(form) => form.submit(),
            Page::ItineraryCreate(page) => page.submit(),
            Page::ItineraryRead(page) => page.submit(),
            _ => Err(SubmitError::NotAForm),
        }
    }

    pub fn dismiss_alert(&mut self) {
        match self {
            Page::LocationCreateMemory(form) | Page::LocationCreateS3(form) => form.dismiss_alert(),
            Page::ItineraryCreate(page) => page.form_mut().dismiss_alert(),
            Page::ItineraryRead(ItineraryReadPage { run: Some(run), .. }) => run.dismiss_alert(),
            _ => {}
        }
    }

    pub async fn submission_settled(&self) -> Option<Result<(), ApiError>> {
        match self {
            Page::LocationCreateMemory(form) | Page::LocationCreateS3(form) => {
                outcome(form.settled().await)
            }
            Page::ItineraryCreate(page) => outcome(page.form().settled().await),
            Page::ItineraryRead(ItineraryReadPage { run: Some(run), .. }) => {
                outcome(run.settled().await)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dripfile_client::{
        InMemoryResourceApi, Operation, ResourceApi, NETWORK_FAILURE_MESSAGE,
    };
    use dripfile_contract::{CreateItinerary, CreateLocation, Resource};
    use dripfile_query::QueryState;

    use crate::context::ConsoleContext;
    use crate::form::SubmitError;
    use crate::records::list_key;
    use crate::view::{FieldInput, View};

    fn console() -> (Arc<InMemoryResourceApi>, ConsoleContext) {
        let api = Arc::new(InMemoryResourceApi::new());
        let ctx = ConsoleContext::new(api.clone());
        (api, ctx)
    }

    async fn seed_location(api: &InMemoryResourceApi, capacity: &str) -> String {
        api.create_location(CreateLocation::Memory {
            capacity: capacity.to_string(),
        })
        .await
        .expect("seed location")
        .id
    }

    #[tokio::test]
    async fn location_list_shows_empty_state_then_table() {
        let (api, ctx) = console();

        let mut page = ctx.open("/location").expect("route");
        assert_eq!(page.render(), View::Loading);
        page.settled().await;
        let View::Empty(empty) = page.render() else {
            panic!("expected empty state");
        };
        assert_eq!(empty.prompt, "Get started by adding a new location.");

        let id = seed_location(&api, "10").await;
        assert_eq!(page.refresh(&ctx), 1);
        page.settled().await;
        let View::Table(table) = page.render() else {
            panic!("expected table");
        };
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0].text, id);
    }

    #[tokio::test]
    async fn pages_mounted_together_share_one_request() {
        let (api, ctx) = console();
        api.pause();

        let mut first = ctx.open("/location").expect("route");
        let mut second = ctx.open("/location").expect("route");
        api.resume();
        first.settled().await;
        second.settled().await;

        assert_eq!(api.calls(Operation::List(Resource::Location)).await, 1);
        assert_eq!(first.render(), second.render());

        // remount is served from cache
        drop(first);
        let mut third = ctx.open("/location").expect("route");
        third.settled().await;
        assert_eq!(api.calls(Operation::List(Resource::Location)).await, 1);
    }

    #[tokio::test]
    async fn refetch_keeps_previous_rows_visible() {
        let (api, ctx) = console();
        seed_location(&api, "1").await;

        let mut page = ctx.open("/location").expect("route");
        page.settled().await;

        seed_location(&api, "2").await;
        api.pause();
        page.refresh(&ctx);
        let View::Table(stale) = page.render() else {
            panic!("stale rows should stay on screen");
        };
        assert_eq!(stale.rows.len(), 1);

        api.resume();
        page.settled().await;
        let View::Table(fresh) = page.render() else {
            panic!("expected table");
        };
        assert_eq!(fresh.rows.len(), 2);
    }

    #[tokio::test]
    async fn memory_location_create_refreshes_list_and_navigates() {
        let (api, ctx) = console();
        let mut list = ctx.open("/location").expect("route");
        list.settled().await;

        let mut form = ctx.open("/location/create/in-memory").expect("route");
        form.set_field("capacity", "10").expect("field");
        form.submit().expect("submitted");
        assert_eq!(form.submission_settled().await, Some(Ok(())));

        assert_eq!(ctx.navigator().current(), "/location");
        list.settled().await;
        let View::Table(table) = list.render() else {
            panic!("expected new location in the list");
        };
        assert_eq!(table.rows[0][1].text, "memory");
        assert_eq!(api.calls(Operation::List(Resource::Location)).await, 2);
        assert_eq!(api.calls(Operation::Create(Resource::Location)).await, 1);
    }

    #[tokio::test]
    async fn submit_is_disabled_while_pending() {
        let (api, ctx) = console();
        let mut form = ctx.open("/location/create/in-memory").expect("route");

        let view = form.render();
        assert!(!view.form().expect("form").submit_enabled);
        assert_eq!(form.submit(), Err(SubmitError::MissingField("capacity")));

        form.set_field("capacity", "10").expect("field");
        api.pause();
        form.submit().expect("submitted");

        let view = form.render();
        let rendered = view.form().expect("form");
        assert!(!rendered.submit_enabled);
        assert_eq!(rendered.submit_label, "Adding...");
        assert_eq!(form.submit(), Err(SubmitError::Pending));

        api.resume();
        assert_eq!(form.submission_settled().await, Some(Ok(())));
        assert_eq!(api.calls(Operation::Create(Resource::Location)).await, 1);
    }

    #[tokio::test]
    async fn invalid_bucket_shows_dismissible_alert() {
        let (api, ctx) = console();
        let mut form = ctx.open("/location/create/s3").expect("route");
        for (name, value) in [
            ("endpoint", "localhost:9000"),
            ("bucket", "Not A Bucket"),
            ("accessKeyID", "minio"),
            ("secretAccessKey", "minio123"),
        ] {
            form.set_field(name, value).expect("field");
        }
        form.submit().expect("submitted");
        let failure = form.submission_settled().await.expect("submitted");
        assert!(failure.is_err());

        let view = form.render();
        let alert = view.alert().expect("alert");
        assert_eq!(alert.message, "bucket name invalid");
        assert_eq!(ctx.navigator().current(), "/location/create/s3");

        // entered values survive the failure
        let rendered = view.form().expect("form");
        assert_eq!(rendered.fields[1].value, "Not A Bucket");
        assert_eq!(rendered.fields[3].input, FieldInput::Secret);

        form.dismiss_alert();
        assert!(form.render().alert().is_none());
        assert_eq!(api.calls(Operation::List(Resource::Location)).await, 0);
    }

    #[tokio::test]
    async fn network_failures_show_generic_message() {
        let (api, ctx) = console();
        api.set_offline(true);

        let mut list = ctx.open("/transfer").expect("route");
        list.settled().await;
        assert_eq!(list.render(), View::Error(NETWORK_FAILURE_MESSAGE.to_string()));

        let mut form = ctx.open("/location/create/in-memory").expect("route");
        form.set_field("capacity", "10").expect("field");
        form.submit().expect("submitted");
        form.submission_settled().await;
        assert_eq!(
            form.render().alert().map(|alert| alert.message.clone()),
            Some(NETWORK_FAILURE_MESSAGE.to_string())
        );

        // an errored query refetches on the next mount
        api.set_offline(false);
        let mut list = ctx.open("/transfer").expect("route");
        list.settled().await;
        assert!(matches!(list.render(), View::Empty(_)));
    }

    #[tokio::test]
    async fn read_pages_render_detail_or_nothing() {
        let (api, ctx) = console();
        let id = seed_location(&api, "5").await;

        let mut read = ctx.open(&format!("/location/{id}")).expect("route");
        read.settled().await;
        let View::Detail(detail) = read.render() else {
            panic!("expected detail");
        };
        assert_eq!(detail.fields[0], ("ID".to_string(), id));

        let mut absent = ctx.open("/transfer/").expect("route");
        assert_eq!(absent.render(), View::Nothing);
        assert!(absent.settled().await.is_none());
        assert_eq!(api.calls(Operation::Read(Resource::Transfer)).await, 0);

        let mut missing = ctx.open("/itinerary/it_404").expect("route");
        missing.settled().await;
        assert!(matches!(missing.render(), View::Error(_)));
    }

    #[tokio::test]
    async fn itinerary_form_defaults_selects_to_first_location() {
        let (api, ctx) = console();
        let first = seed_location(&api, "1").await;
        let second = seed_location(&api, "2").await;

        let mut page = ctx.open("/itinerary/create").expect("route");
        assert_eq!(page.render(), View::Loading);
        assert_eq!(page.submit(), Err(SubmitError::NotReady));
        page.settled().await;

        let view = page.render();
        let form = view.form().expect("form");
        assert_eq!(form.fields[1].value, first);
        assert_eq!(
            form.fields[2].input,
            FieldInput::Select(vec![first.clone(), second.clone()])
        );

        page.set_field("pattern", "*.csv").expect("field");
        page.set_field("toLocationID", &second).expect("field");
        page.submit().expect("submitted");
        assert_eq!(page.submission_settled().await, Some(Ok(())));
        assert_eq!(ctx.navigator().current(), "/itinerary");

        let created = api.list_itineraries().await.expect("list");
        assert_eq!(created[0].from_location_id, first);
        assert_eq!(created[0].to_location_id, second);
    }

    #[tokio::test]
    async fn run_now_starts_transfer_and_shows_transfer_list() {
        let (api, ctx) = console();
        let from = seed_location(&api, "1").await;
        let to = seed_location(&api, "2").await;
        let itinerary = api
            .create_itinerary(CreateItinerary {
                from_location_id: from,
                to_location_id: to,
                pattern: "*".to_string(),
            })
            .await
            .expect("itinerary");

        let mut transfers = ctx.open("/transfer").expect("route");
        transfers.settled().await;
        assert!(matches!(transfers.render(), View::Empty(_)));

        let mut page = ctx.open(&format!("/itinerary/{}", itinerary.id)).expect("route");
        page.settled().await;
        let View::Detail(detail) = page.render() else {
            panic!("expected detail");
        };
        assert_eq!(detail.form.expect("run form").submit_label, "Run Now");

        page.submit().expect("submitted");
        assert_eq!(page.submission_settled().await, Some(Ok(())));
        assert_eq!(ctx.navigator().current(), "/transfer");

        transfers.settled().await;
        let View::Table(table) = transfers.render() else {
            panic!("expected transfer row");
        };
        assert_eq!(table.rows[0][1].text, itinerary.id);
        assert_eq!(table.rows[0][2].text, "pending");

        let transfer_id = table.rows[0][0].text.clone();
        api.update_transfer(&transfer_id, "running", 40)
            .await
            .expect("transfer exists");
        transfers.refresh(&ctx);
        transfers.settled().await;
        let View::Table(table) = transfers.render() else {
            panic!("expected transfer row");
        };
        assert_eq!(table.rows[0][2].text, "running");
        assert_eq!(table.rows[0][3].text, "40");
    }

    #[tokio::test]
    async fn run_now_waits_for_the_itinerary_to_load() {
        let (api, ctx) = console();

        let mut page = ctx.open("/itinerary/it_404").expect("route");
        assert_eq!(page.render(), View::Loading);
        assert_eq!(page.submit(), Err(SubmitError::NotReady));

        page.settled().await;
        assert!(matches!(page.render(), View::Error(_)));
        assert_eq!(page.submit(), Err(SubmitError::NotReady));
        assert!(page.submission_settled().await.is_none());
        assert_eq!(api.calls(Operation::Create(Resource::Transfer)).await, 0);
    }

    #[tokio::test]
    async fn shutdown_clears_cache_and_static_pages_have_no_form() {
        let (_api, ctx) = console();
        let mut list = ctx.open("/itinerary").expect("route");
        list.settled().await;
        assert!(matches!(
            ctx.cache().state(&list_key(Resource::Itinerary)),
            QueryState::Success(_)
        ));

        ctx.shutdown();
        assert_eq!(ctx.cache().state(&list_key(Resource::Itinerary)), QueryState::Idle);

        let mut menu = ctx.open("/location/create").expect("route");
        assert!(matches!(menu.render(), View::Menu(_)));
        assert_eq!(menu.submit(), Err(SubmitError::NotAForm));
        assert!(menu.submission_settled().await.is_none());
    }
}
