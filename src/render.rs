//! The Handlebars rendering boundary.
//!
//! Everything template-language-shaped is delegated to the `handlebars`
//! crate; this module only registers what one build run needs — the built-in
//! helpers and the partials the composer discovered — and compiles layout
//! source against a data object. A [`Renderer`] is constructed fresh per
//! run; there is no process-wide registry.
//!
//! ## Built-In Helpers
//!
//! - `format_date`: formats an ISO `YYYY-MM-DD` value with an optional
//!   strftime `fmt` hash argument. Non-date input renders the literal
//!   `{invalid_date_input}`, a bad format string `{invalid_date_format}`.
//! - `date`: formats the *current* date with the given strftime string,
//!   `{{date "%Y"}}`. A bad format string renders `{invalid_date_format}`.
//! - `when`: block helper for equality branches,
//!   `{{#when data=slug is="about"}} … {{else}} … {{/when}}`; `isnt`
//!   inverts the comparison.
//!
//! Default HTML escaping is left on; layouts emit the pre-rendered body
//! with `{{{entry}}}`.

use crate::template::{Layout, Partial};
use chrono::{Local, NaiveDate};
use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext, Renderable,
    handlebars_helper,
};
use std::fmt::Write;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("partial registration error: {0}")]
    Partial(#[from] Box<handlebars::TemplateError>),
    #[error("render error: {0}")]
    Render(#[from] handlebars::RenderError),
}

handlebars_helper!(format_date: |value: str, {fmt: str = "%B %-d, %Y"}| {
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(parsed) => {
            let mut out = String::new();
            match write!(out, "{}", parsed.format(fmt)) {
                Ok(()) => out,
                Err(_) => "{invalid_date_format}".to_string(),
            }
        }
        Err(_) => "{invalid_date_input}".to_string(),
    }
});

handlebars_helper!(date: |fmt: str| {
    let mut out = String::new();
    match write!(out, "{}", Local::now().format(fmt)) {
        Ok(()) => out,
        Err(_) => "{invalid_date_format}".to_string(),
    }
});

/// `{{#when data=… is=…}}` / `{{#when data=… isnt=…}}` block helper.
struct WhenHelper;

impl HelperDef for WhenHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let data = h.hash_get("data").map(|v| v.value());

        let mut matched = false;
        if let Some(is) = h.hash_get("is") {
            matched = data == Some(is.value());
        }
        if !matched && let Some(isnt) = h.hash_get("isnt") {
            matched = data != Some(isnt.value());
        }

        let template = if matched { h.template() } else { h.inverse() };
        if let Some(template) = template {
            template.render(r, ctx, rc, out)?;
        }
        Ok(())
    }
}

/// A per-run Handlebars registry with helpers and partials registered.
pub struct Renderer {
    registry: Handlebars<'static>,
}

impl Renderer {
    /// Build a registry for one run, registering every discovered partial
    /// by name.
    pub fn new(partials: &[Partial]) -> Result<Self, RenderError> {
        let mut registry = Handlebars::new();
        registry.register_helper("format_date", Box::new(format_date));
        registry.register_helper("date", Box::new(date));
        registry.register_helper("when", Box::new(WhenHelper));

        for partial in partials {
            registry
                .register_partial(&partial.name, &partial.contents)
                .map_err(Box::new)?;
        }

        Ok(Self { registry })
    }

    /// Compile a layout's source against `data` and return the HTML.
    pub fn render(&self, layout: &Layout, data: &serde_json::Value) -> Result<String, RenderError> {
        Ok(self.registry.render_template(&layout.contents, data)?)
    }
}
