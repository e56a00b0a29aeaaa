pub mod context;
pub mod form;
pub mod navigation;
pub mod pages;
pub mod records;
pub mod router;
pub mod view;

pub use context::ConsoleContext;
pub use form::{FieldKind, FieldSpec, Form, FormCopy, FormPage, SubmitError};
pub use navigation::{NavigationState, Navigator};
pub use pages::Page;
pub use records::{list_key, record_key, ConsoleCache, ConsoleState, Record, Snapshot};
pub use router::{build_router, Params, Route, Router};
pub use view::View;
