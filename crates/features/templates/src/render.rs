//! MiniJinja rendering with the template source directory as loader root.

use aflow_kernel::asset::slash_path;
use aflow_kernel::prelude::{Asset, Mode, Step, StepError};
use minijinja::{Environment, context, path_loader};
use std::path::Path;
use std::sync::Arc;

/// Renders an asset as a MiniJinja template.
///
/// The environment caches every template it loads: layouts and partials
/// edited after the first render are not seen by the same `Render`.
#[derive(Debug, Clone)]
pub struct Render {
    env: Arc<Environment<'static>>,
    mode: Mode,
}

impl Render {
    #[must_use]
    pub fn new(base: &Path, mode: Mode) -> Self {
        let mut env = Environment::new();
        env.set_loader(path_loader(base));
        Self { env: Arc::new(env), mode }
    }
}

impl Step for Render {
    fn name(&self) -> &'static str {
        "minijinja"
    }

    fn apply(&self, mut asset: Asset) -> Result<Asset, StepError> {
        let name = slash_path(&asset.relative);
        let ctx = context! {
            mode => self.mode.to_string(),
            page => context! { path => name.clone() },
        };
        let html = self.env.render_named_str(&name, asset.text()?, ctx).map_err(|e| StepError::Transform {
            message: format!("{}: {e}", asset.display_name()).into(),
            context: None,
        })?;
        asset.set_text(html);
        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_variables() {
        let tmp = tempfile::tempdir().unwrap();
        let render = Render::new(tmp.path(), Mode::Production);
        let asset = Asset::from_text("blog/post.html", "{{ mode }} {{ page.path }}");
        let out = render.apply(asset).unwrap();
        assert_eq!(out.text().unwrap(), "production blog/post.html");
    }

    #[test]
    fn test_syntax_error_names_the_template() {
        let tmp = tempfile::tempdir().unwrap();
        let render = Render::new(tmp.path(), Mode::Development);
        let err = render.apply(Asset::from_text("bad.html", "{% if x %}open")).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("bad.html: "), "{message}");
        assert!(message.contains("syntax error"), "{message}");
    }
}
