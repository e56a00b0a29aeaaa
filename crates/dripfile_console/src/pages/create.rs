use std::future::Future;
use std::sync::Arc;

use dripfile_client::{ApiError, ResourceApi};
use dripfile_contract::{
    CreateItinerary, CreateLocation, CreateTransfer, Itinerary, Location, Resource, Transfer,
};
use dripfile_query::{Mutation, QueryHandle, QueryState};
use futures::future::FutureExt;

use crate::context::ConsoleContext;
use crate::form::{FieldKind, FieldSpec, Form, FormCopy, FormPage, SubmitError};
use crate::records::{list_key, Record, Snapshot};
use crate::view::{Menu, MenuItem, View};

pub const MEMORY_FIELDS: &[FieldSpec] = &[FieldSpec::required(
    "capacity",
    "Capacity",
    FieldKind::Text,
)];

pub const S3_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("endpoint", "Endpoint", FieldKind::Text),
    FieldSpec::required("bucket", "Bucket", FieldKind::Text),
    FieldSpec::required("accessKeyID", "Access Key ID", FieldKind::Text),
    FieldSpec::required("secretAccessKey", "Secret Access Key", FieldKind::Secret),
];

pub const ITINERARY_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("pattern", "Pattern", FieldKind::Text),
    FieldSpec::required("fromLocationID", "From", FieldKind::Select),
    FieldSpec::required("toLocationID", "To", FieldKind::Select),
];

pub const RUN_FIELDS: &[FieldSpec] = &[FieldSpec::required(
    "itineraryID",
    "Itinerary",
    FieldKind::Hidden,
)];

const MEMORY_COPY: FormCopy = FormCopy {
    title: "In-Memory Location",
    description: "An in-memory location for testing Dripfile.",
    submit_label: "Add",
    pending_label: "Adding...",
    cancel: Some(("Cancel", "/location/create")),
};

const S3_COPY: FormCopy = FormCopy {
    title: "S3 Location",
    description: "An Amazon S3 (or compatible) object storage bucket.",
    submit_label: "Add",
    pending_label: "Adding...",
    cancel: Some(("Cancel", "/location/create")),
};

const ITINERARY_COPY: FormCopy = FormCopy {
    title: "Itinerary",
    description: "A plan for transferring files between locations.",
    submit_label: "Create",
    pending_label: "Creating...",
    cancel: Some(("Cancel", "/itinerary")),
};

const RUN_COPY: FormCopy = FormCopy {
    title: "Run Now",
    description: "Start a transfer for this itinerary.",
    submit_label: "Run Now",
    pending_label: "Starting...",
    cancel: None,
};

pub type LocationForm = FormPage<CreateLocation, Location>;
pub type ItineraryForm = FormPage<CreateItinerary, Itinerary>;
pub type RunForm = FormPage<CreateTransfer, Transfer>;

fn create_mutation<P, T, F, Fut>(
    ctx: &ConsoleContext,
    resource: Resource,
    create: F,
) -> Mutation<P, T, ApiError>
where
    P: Send + 'static,
    T: Clone + Send + Sync + 'static,
    F: Fn(Arc<dyn ResourceApi>, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
{
    let api = ctx.api().clone();
    let context = ctx.clone();
    Mutation::new(move |payload| create(api.clone(), payload))
        .on_success(move |_: &T| context.after_write(resource))
}

pub fn location_menu() -> View {
    View::Menu(Menu {
        title: "Add location".to_string(),
        items: vec![
            MenuItem {
                label: "In-Memory".to_string(),
                description: "An in-memory location for testing Dripfile.".to_string(),
                href: "/location/create/in-memory".to_string(),
            },
            MenuItem {
                label: "S3 Bucket".to_string(),
                description: "An Amazon S3 (or compatible) object storage bucket.".to_string(),
                href: "/location/create/s3".to_string(),
            },
        ],
    })
}

pub fn dashboard() -> View {
    let item = |resource: Resource, description: &str| MenuItem {
        label: match resource {
            Resource::Location => Location::LIST_TITLE,
            Resource::Itinerary => Itinerary::LIST_TITLE,
            Resource::Transfer => Transfer::LIST_TITLE,
        }
        .to_string(),
        description: description.to_string(),
        href: format!("/{}", resource.name()),
    };
    View::Menu(Menu {
        title: "Dripfile".to_string(),
        items: vec![
            item(Resource::Location, "Where your data lives."),
            item(Resource::Itinerary, "Plans for moving files between locations."),
            item(Resource::Transfer, "Recent and running transfers."),
        ],
    })
}

fn build_memory(form: &Form) -> CreateLocation {
    CreateLocation::Memory {
        capacity: form.value("capacity").trim().to_string(),
    }
}

fn build_s3(form: &Form) -> CreateLocation {
    CreateLocation::S3 {
        endpoint: form.value("endpoint").trim().to_string(),
        bucket: form.value("bucket").trim().to_string(),
        access_key_id: form.value("accessKeyID").trim().to_string(),
        secret_access_key: form.value("secretAccessKey").to_string(),
    }
}

fn build_itinerary(form: &Form) -> CreateItinerary {
    CreateItinerary {
        from_location_id: form.value("fromLocationID").to_string(),
        to_location_id: form.value("toLocationID").to_string(),
        pattern: form.value("pattern").to_string(),
    }
}

fn build_run(form: &Form) -> CreateTransfer {
    CreateTransfer {
        itinerary_id: form.value("itineraryID").to_string(),
    }
}

fn location_mutation(ctx: &ConsoleContext) -> Mutation<CreateLocation, Location, ApiError> {
    create_mutation(ctx, Resource::Location, |api, request| async move {
        api.create_location(request).await
    })
}

pub fn memory_form(ctx: &ConsoleContext) -> LocationForm {
    FormPage::new(MEMORY_COPY, MEMORY_FIELDS, build_memory, location_mutation(ctx))
}

pub fn s3_form(ctx: &ConsoleContext) -> LocationForm {
    FormPage::new(S3_COPY, S3_FIELDS, build_s3, location_mutation(ctx))
}

pub fn run_form(ctx: &ConsoleContext, itinerary_id: &str) -> Result<RunForm, SubmitError> {
    let mutation = create_mutation(ctx, Resource::Transfer, |api, request| async move {
        api.create_transfer(request).await
    });
    let mut form = FormPage::new(RUN_COPY, RUN_FIELDS, build_run, mutation);
    form.set("itineraryID", itinerary_id)?;
    Ok(form)
}

pub struct ItineraryCreatePage {
    locations: QueryHandle<Snapshot, ApiError>,
    form: ItineraryForm,
}

impl ItineraryCreatePage {
    pub fn mount(ctx: &ConsoleContext) -> Self {
        let api = ctx.api().clone();
        let locations = ctx.cache().watch(list_key(Resource::Location), move || {
            Location::fetch_list(api.clone()).map(|result| result.map(Location::list_snapshot))
        });
        let mutation = create_mutation(ctx, Resource::Itinerary, |api, request| async move {
            api.create_itinerary(request).await
        });
        Self {
            locations,
            form: FormPage::new(ITINERARY_COPY, ITINERARY_FIELDS, build_itinerary, mutation),
        }
    }

    pub fn locations(&self) -> &QueryHandle<Snapshot, ApiError> {
        &self.locations
    }

    pub fn locations_mut(&mut self) -> &mut QueryHandle<Snapshot, ApiError> {
        &mut self.locations
    }

    pub fn form(&self) -> &ItineraryForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut ItineraryForm {
        &mut self.form
    }

    fn location_ids(&self) -> Option<Vec<String>> {
        let state = self.locations.state();
        let ids = state
            .data()
            .and_then(Location::from_list)?
            .iter()
            .map(|location| location.id.clone())
            .collect();
        Some(ids)
    }

    pub fn submit(&mut self) -> Result<(), SubmitError> {
        let ids = self.location_ids().ok_or(SubmitError::NotReady)?;
        if let Some(first) = ids.first() {
            for field in ["fromLocationID", "toLocationID"] {
                if self.form.form().value(field).is_empty() {
                    self.form.set(field, first.clone())?;
                }
            }
        }
        self.form.submit()
    }

    pub fn render(&self) -> View {
        match self.locations.state() {
            QueryState::Idle | QueryState::Pending => return View::Loading,
            QueryState::Error(error) => return View::Error(error.to_string()),
            QueryState::Success(_) | QueryState::Refreshing(_) => {}
        }
        let ids = self.location_ids().unwrap_or_default();

        let mut view = self.form.render(|_| ids.clone());
        if let Some(first) = ids.first() {
            for field in view.fields.iter_mut() {
                if matches!(field.name.as_str(), "fromLocationID" | "toLocationID")
                    && field.value.is_empty()
                {
                    field.value = first.clone();
                }
            }
            if !self.form.state().is_pending() {
                view.submit_enabled = !self.form.form().value("pattern").trim().is_empty();
            }
        }
        View::Form(view)
    }
}
