use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub label: String,
    pub href: String,
}

impl Link {
    pub fn new(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: href.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub href: Option<String>,
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: None,
        }
    }

    pub fn link(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: Some(href.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub title: String,
    pub description: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    pub action: Option<Link>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    pub title: String,
    pub prompt: String,
    pub action: Link,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detail {
    pub fields: Vec<(String, String)>,
    pub form: Option<FormView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertView {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInput {
    Text,
    Secret,
    Select(Vec<String>),
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub name: String,
    pub label: String,
    pub value: String,
    pub input: FieldInput,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub title: String,
    pub description: String,
    pub fields: Vec<FieldView>,
    pub submit_label: String,
    pub submit_enabled: bool,
    pub cancel: Option<Link>,
    pub alert: Option<AlertView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    pub description: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub title: String,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Nothing,
    Loading,
    Error(String),
    Empty(EmptyState),
    Table(Table),
    Detail(Detail),
    Form(FormView),
    Menu(Menu),
}

impl View {
    pub fn form(&self) -> Option<&FormView> {
        match self {
            View::Form(form) => Some(form),
            View::Detail(detail) => detail.form.as_ref(),
            _ => None,
        }
    }

    pub fn alert(&self) -> Option<&AlertView> {
        self.form().and_then(|form| form.alert.as_ref())
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Nothing => Ok(()),
            View::Loading => writeln!(f, "Loading..."),
            View::Error(message) => writeln!(f, "Error: {message}"),
            View::Empty(empty) => {
                writeln!(f, "{}", empty.title)?;
                writeln!(f, "{}", empty.prompt)?;
                writeln!(f, "-> {} ({})", empty.action.label, empty.action.href)
            }
            View::Table(table) => write_table(f, table),
            View::Detail(detail) => {
                for (label, value) in &detail.fields {
                    writeln!(f, "{label}: {value}")?;
                }
                if let Some(form) = &detail.form {
                    writeln!(f)?;
                    write_form(f, form)?;
                }
                Ok(())
            }
            View::Form(form) => write_form(f, form),
            View::Menu(menu) => {
                writeln!(f, "{}", menu.title)?;
                for item in &menu.items {
                    writeln!(f, "  {} - {} ({})", item.label, item.description, item.href)?;
                }
                Ok(())
            }
        }
    }
}

fn write_table(f: &mut fmt::Formatter<'_>, table: &Table) -> fmt::Result {
    writeln!(f, "{}", table.title)?;
    writeln!(f, "{}", table.description)?;
    if let Some(action) = &table.action {
        writeln!(f, "[{}] {}", action.label, action.href)?;
    }
    writeln!(f)?;

    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &table.rows {
        for (index, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(index) {
                *width = (*width).max(cell.text.chars().count());
            }
        }
    }

    let header: Vec<&str> = table.columns.iter().map(String::as_str).collect();
    write_row(f, &widths, &header)?;
    for row in &table.rows {
        let cells: Vec<&str> = row.iter().map(|cell| cell.text.as_str()).collect();
        write_row(f, &widths, &cells)?;
    }
    Ok(())
}

fn write_row(f: &mut fmt::Formatter<'_>, widths: &[usize], cells: &[&str]) -> fmt::Result {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    writeln!(f, "{}", line.join("  ").trim_end())
}

fn write_form(f: &mut fmt::Formatter<'_>, form: &FormView) -> fmt::Result {
    if let Some(alert) = &form.alert {
        writeln!(f, "[failed] {}", alert.message)?;
    }
    writeln!(f, "{}", form.title)?;
    writeln!(f, "{}", form.description)?;

    for field in &form.fields {
        let marker = if field.required { "*" } else { "" };
        match &field.input {
            FieldInput::Hidden => continue,
            FieldInput::Text => {
                writeln!(f, "  {}{marker} ({}): {}", field.label, field.name, field.value)?
            }
            FieldInput::Secret => {
                let masked = "*".repeat(field.value.chars().count());
                writeln!(f, "  {}{marker} ({}): {masked}", field.label, field.name)?
            }
            FieldInput::Select(options) => writeln!(
                f,
                "  {}{marker} ({}): {} [{}]",
                field.label,
                field.name,
                field.value,
                options.join(", ")
            )?,
        }
    }

    let state = if form.submit_enabled { "" } else { " (disabled)" };
    writeln!(f, "[{}]{state}", form.submit_label)?;
    if let Some(cancel) = &form.cancel {
        writeln!(f, "[{}] {}", cancel.label, cancel.href)?;
    }
    Ok(())
}
