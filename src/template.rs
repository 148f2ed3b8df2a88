//! Rendering of nginx.conf and the placeholder index page.
//!
//! Both documents are minijinja templates compiled into the binary from
//! `templates/`. The nginx.conf template holds the fixed skeleton; feature
//! blocks are substituted into the server block in [`Feature::ORDER`].
//!
//! [`Feature::ORDER`]: crate::fragments::Feature::ORDER

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use minijinja::{context, Environment};
use std::fmt;
use tracing::debug;

use crate::config::NginxSettings;
use crate::docroot::SiteIdentity;
use crate::fragments::Fragments;
use crate::utils::{format_generated_at, indent};

const CONFIG_TEMPLATE: &str = include_str!("../templates/nginx.conf");
const CONFIG_TEMPLATE_NAME: &str = "nginx.conf";

const PLACEHOLDER_TEMPLATE: &str = include_str!("../templates/index.html");
const PLACEHOLDER_TEMPLATE_NAME: &str = "index.html";

/// Depth of a block nested in `http { server { ... } }`.
const SERVER_BLOCK_INDENT: usize = 8;

/// A complete nginx.conf, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedConfiguration(String);

impl RenderedConfiguration {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for RenderedConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn environment() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    env.add_template(CONFIG_TEMPLATE_NAME, CONFIG_TEMPLATE)?;
    env.add_template(PLACEHOLDER_TEMPLATE_NAME, PLACEHOLDER_TEMPLATE)?;
    Ok(env)
}

/// Assemble the full configuration for `site` with the given feature blocks.
///
/// Pure: the same inputs always produce the same document.
pub fn assemble<Tz>(
    site: &SiteIdentity,
    fragments: &Fragments,
    nginx: &NginxSettings,
    generated_at: &DateTime<Tz>,
) -> Result<RenderedConfiguration>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let env = environment()?;
    let template = env.get_template(CONFIG_TEMPLATE_NAME)?;

    let blocks: Vec<String> = fragments
        .ordered()
        .map(|(feature, block)| {
            debug!("Adding {} block", feature.name());
            indent(block, SERVER_BLOCK_INDENT)
        })
        .collect();

    let ctx = context! {
        generated_at => format_generated_at(generated_at),
        user => nginx.user,
        worker_processes => nginx.worker_processes,
        pid_file => nginx.pid_file.display().to_string(),
        modules_include => nginx.modules_include,
        worker_connections => nginx.worker_connections,
        mime_types => nginx.mime_types.display().to_string(),
        listen_port => nginx.listen_port,
        server_name => site.domain,
        root => site.root.display().to_string(),
        index_file => nginx.index_file,
        fragments => blocks,
    };

    let rendered = template
        .render(ctx)
        .context("Failed to render nginx configuration")?;
    Ok(RenderedConfiguration(rendered))
}

/// Placeholder index page naming `domain`.
pub fn render_placeholder(domain: &str) -> Result<String> {
    let env = environment()?;
    let template = env.get_template(PLACEHOLDER_TEMPLATE_NAME)?;
    template
        .render(context! { domain => domain })
        .context("Failed to render placeholder page")
}
