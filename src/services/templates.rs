//! Terminal template renderer.
//!
//! Each step owns one HTML file under the configured templates directory;
//! the page is the fixed header shell, the step body with `{{key}}`
//! placeholders substituted, and the footer. A missing file is a
//! deployment defect and fails hard; it can never be caused by user input.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct TemplateRenderer {
    dir: PathBuf,
}

impl TemplateRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Render a step page. `data` values are substituted for `{{key}}`
    /// markers in the step body; unknown markers render empty.
    pub async fn render(
        &self,
        step_slug: &str,
        data: &HashMap<String, String>,
    ) -> AppResult<String> {
        let header = self.load("_header").await?;
        let footer = self.load("_footer").await?;
        let mut body = self.load(step_slug).await?;

        for (key, value) in data {
            body = body.replace(&format!("{{{{{}}}}}", key), value);
        }
        // Clear any placeholder no data was supplied for
        while let (Some(start), Some(end)) = (body.find("{{"), body.find("}}")) {
            if end <= start {
                break;
            }
            body.replace_range(start..end + 2, "");
        }

        Ok(format!("{}{}{}", header, body, footer))
    }

    /// Render a bare fragment (no header/footer shell), used for repeated
    /// rows inside a step page
    pub async fn render_fragment(
        &self,
        name: &str,
        data: &HashMap<String, String>,
    ) -> AppResult<String> {
        let mut body = self.load(name).await?;
        for (key, value) in data {
            body = body.replace(&format!("{{{{{}}}}}", key), value);
        }
        Ok(body)
    }

    async fn load(&self, name: &str) -> AppResult<String> {
        let path = self.dir.join(format!("{}.html", name));
        tokio::fs::read_to_string(&path).await.map_err(|e| {
            AppError::Template(format!(
                "Step template {} missing or unreadable: {}",
                path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_render_substitutes_placeholders() {
        let dir = std::env::temp_dir().join(format!("gatehouse-tpl-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("_header.html"), "<html>").await.unwrap();
        tokio::fs::write(dir.join("_footer.html"), "</html>").await.unwrap();
        tokio::fs::write(dir.join("success.html"), "<p>{{message}}</p>")
            .await
            .unwrap();

        let renderer = TemplateRenderer::new(&dir);
        let mut data = HashMap::new();
        data.insert("message".to_string(), "Done".to_string());
        let html = renderer.render("success", &data).await.unwrap();
        assert_eq!(html, "<html><p>Done</p></html>");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_placeholders_render_empty() {
        let dir = std::env::temp_dir().join(format!("gatehouse-tpl-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("_header.html"), "").await.unwrap();
        tokio::fs::write(dir.join("_footer.html"), "").await.unwrap();
        tokio::fs::write(dir.join("language.html"), "a{{missing}}b")
            .await
            .unwrap();

        let renderer = TemplateRenderer::new(&dir);
        let html = renderer.render("language", &HashMap::new()).await.unwrap();
        assert_eq!(html, "ab");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_template_is_fatal() {
        let dir = std::env::temp_dir().join(format!("gatehouse-tpl-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("_header.html"), "").await.unwrap();
        tokio::fs::write(dir.join("_footer.html"), "").await.unwrap();

        let renderer = TemplateRenderer::new(&dir);
        let err = renderer.render("absent", &HashMap::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Template(_)));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
