//! Embedded HTML pages rendered with Tera.

use std::sync::OnceLock;

use anyhow::Context as _;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use rust_embed::RustEmbed;
use tera::{Context, Tera};

use super::flash::Flash;

#[derive(RustEmbed)]
#[folder = "templates/"]
struct Templates;

pub const LOGIN: &str = "login.html";
pub const REGISTER: &str = "register.html";
pub const TOURIST: &str = "tourist.html";
pub const DASHBOARD: &str = "dashboard.html";

static ENGINE: OnceLock<Result<Tera, String>> = OnceLock::new();

/// Parses every embedded file into one engine. Autoescaping is on for `.html`.
pub fn load_engine() -> anyhow::Result<Tera> {
    let mut sources = Vec::new();
    for name in Templates::iter() {
        let Some(file) = Templates::get(&name) else {
            continue;
        };
        let source = String::from_utf8(file.data.into_owned())
            .with_context(|| format!("Template {name} is not UTF-8"))?;
        sources.push((name.into_owned(), source));
    }

    let mut tera = Tera::default();
    tera.add_raw_templates(sources)
        .context("Failed to parse embedded templates")?;
    Ok(tera)
}

fn engine() -> anyhow::Result<&'static Tera> {
    ENGINE
        .get_or_init(|| load_engine().map_err(|e| format!("{e:#}")))
        .as_ref()
        .map_err(|e| anyhow::anyhow!("{e}"))
}

pub struct Page {
    template: &'static str,
    context: Context,
    flashes: Vec<Flash>,
}

impl Page {
    #[must_use]
    pub fn new(template: &'static str) -> Self {
        Self {
            template,
            context: Context::new(),
            flashes: Vec::new(),
        }
    }

    #[must_use]
    pub fn var(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.insert(key, &value.into());
        self
    }

    #[must_use]
    pub fn flash(mut self, flash: Flash) -> Self {
        self.flashes.push(flash);
        self
    }

    #[must_use]
    pub fn flashes(mut self, flashes: Vec<Flash>) -> Self {
        self.flashes.extend(flashes);
        self
    }

    pub fn render(&self) -> anyhow::Result<String> {
        let mut context = self.context.clone();
        context.insert("flashes", &self.flashes);

        engine()?
            .render(self.template, &context)
            .with_context(|| format!("Failed to render {}", self.template))
    }
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        match self.render() {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                tracing::error!("{e:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
            }
        }
    }
}
