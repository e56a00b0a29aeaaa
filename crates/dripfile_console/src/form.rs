use dripfile_client::ApiError;
use dripfile_query::{Mutation, MutationState, Submission};
use thiserror::Error;
use tracing::info;

use crate::view::{AlertView, FieldInput, FieldView, FormView, Link};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("field `{0}` is required")]
    MissingField(&'static str),
    #[error("this page has no field `{0}`")]
    UnknownField(String),
    #[error("this page has no form")]
    NotAForm,
    #[error("the form is not ready yet")]
    NotReady,
    #[error("a submission is already pending")]
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Secret,
    Select,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Form {
    specs: &'static [FieldSpec],
    values: Vec<String>,
}

impl Form {
    pub fn new(specs: &'static [FieldSpec]) -> Self {
        Self {
            specs,
            values: vec![String::new(); specs.len()],
        }
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), SubmitError> {
        let index = self
            .specs
            .iter()
            .position(|spec| spec.name == name)
            .ok_or_else(|| SubmitError::UnknownField(name.to_string()))?;
        self.values[index] = value.into();
        Ok(())
    }

    pub fn value(&self, name: &str) -> &str {
        self.specs
            .iter()
            .position(|spec| spec.name == name)
            .map(|index| self.values[index].as_str())
            .unwrap_or_default()
    }

    pub fn missing(&self) -> Option<&'static str> {
        self.specs
            .iter()
            .zip(&self.values)
            .find(|(spec, value)| spec.required && value.trim().is_empty())
            .map(|(spec, _)| spec.name)
    }

    pub fn fields(&self, options: impl Fn(&str) -> Vec<String>) -> Vec<FieldView> {
        self.specs
            .iter()
            .zip(&self.values)
            .map(|(spec, value)| FieldView {
                name: spec.name.to_string(),
                label: spec.label.to_string(),
                value: value.clone(),
                input: match spec.kind {
                    FieldKind::Text => FieldInput::Text,
                    FieldKind::Secret => FieldInput::Secret,
                    FieldKind::Select => FieldInput::Select(options(spec.name)),
                    FieldKind::Hidden => FieldInput::Hidden,
                },
                required: spec.required,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FormCopy {
    pub title: &'static str,
    pub description: &'static str,
    pub submit_label: &'static str,
    pub pending_label: &'static str,
    pub cancel: Option<(&'static str, &'static str)>,
}

pub struct FormPage<P, T> {
    copy: FormCopy,
    form: Form,
    build: fn(&Form) -> P,
    mutation: Mutation<P, T, ApiError>,
    alert_dismissed: bool,
}

impl<P, T> FormPage<P, T>
where
    P: Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new(
        copy: FormCopy,
        specs: &'static [FieldSpec],
        build: fn(&Form) -> P,
        mutation: Mutation<P, T, ApiError>,
    ) -> Self {
        Self {
            copy,
            form: Form::new(specs),
            build,
            mutation,
            alert_dismissed: false,
        }
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), SubmitError> {
        self.form.set(name, value)
    }

    pub fn submit(&mut self) -> Result<(), SubmitError> {
        if let Some(field) = self.form.missing() {
            return Err(SubmitError::MissingField(field));
        }
        let payload = (self.build)(&self.form);
        match self.mutation.submit(payload) {
            Submission::Started => {
                info!(form = self.copy.title, "form submitted");
                self.alert_dismissed = false;
                Ok(())
            }
            Submission::Ignored => Err(SubmitError::Pending),
        }
    }

    pub fn dismiss_alert(&mut self) {
        self.alert_dismissed = true;
    }

    pub fn state(&self) -> MutationState<T, ApiError> {
        self.mutation.state()
    }

    pub async fn settled(&self) -> MutationState<T, ApiError> {
        self.mutation.settled().await
    }

    pub fn render(&self, options: impl Fn(&str) -> Vec<String>) -> FormView {
        let state = self.mutation.state();
        let pending = state.is_pending();
        let alert = match state.error() {
            Some(error) if !self.alert_dismissed => Some(AlertView {
                message: error.to_string(),
            }),
            _ => None,
        };

        FormView {
            title: self.copy.title.to_string(),
            description: self.copy.description.to_string(),
            fields: self.form.fields(options),
            submit_label: if pending {
                self.copy.pending_label
            } else {
                self.copy.submit_label
            }
            .to_string(),
            submit_enabled: !pending && self.form.missing().is_none(),
            cancel: self.copy.cancel.map(|(label, href)| Link::new(label, href)),
            alert,
        }
    }
}
