use tally_common::{CONTENT_NOT_PRESENT, Result, TallyError};

use crate::extract;

/// Page markup moving through the cleaning stages.
///
/// A document starts either empty (nothing fetched yet) or loaded with
/// markup. Each `clean_*` stage rewrites the content in place and hands
/// back the current text; calling a stage on an empty document yields
/// [`TallyError::PreconditionFailed`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    content: Option<String>,
    count_head: bool,
}

impl Document {
    pub fn new(count_head: bool) -> Self {
        Self {
            content: None,
            count_head,
        }
    }

    pub fn from_markup(markup: impl Into<String>, count_head: bool) -> Self {
        Self {
            content: Some(markup.into()),
            count_head,
        }
    }

    /// Replace the content, e.g. once the fetch completes.
    pub fn load(&mut self, markup: impl Into<String>) {
        self.content = Some(markup.into());
    }

    pub fn count_head(&self) -> bool {
        self.count_head
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.content.is_some()
    }

    pub fn clean_head(&mut self) -> Result<&str> {
        self.apply("head", |text| extract::HEAD.strip(text))
    }

    pub fn clean_html_comments(&mut self) -> Result<&str> {
        self.apply("comments", |text| extract::COMMENT.strip(text))
    }

    /// Both script passes: literal `<script>` first, then attributed tags.
    pub fn clean_js_scripts(&mut self) -> Result<&str> {
        self.apply("scripts", |text| {
            extract::SCRIPT_ATTRIBUTED.strip(&extract::SCRIPT.strip(text))
        })
    }

    pub fn clean_css(&mut self) -> Result<&str> {
        self.apply("style", |text| extract::STYLE.strip(text))
    }

    pub fn clean_ampersand_entities(&mut self) -> Result<&str> {
        self.apply("entities", extract::strip_ampersand_entities)
    }

    pub fn clean_tags(&mut self) -> Result<&str> {
        self.apply("tags", extract::strip_tags)
    }

    pub fn clean_punctuation(&mut self) -> Result<&str> {
        self.apply("punctuation", extract::strip_punctuation)
    }

    /// Run every stage in pipeline order.
    ///
    /// The `<head>` pass only runs when the document was created with
    /// `count_head`.
    pub fn clean_all(&mut self) -> Result<&str> {
        if !self.is_loaded() {
            return Err(TallyError::PreconditionFailed(CONTENT_NOT_PRESENT));
        }
        if self.count_head {
            self.clean_head()?;
        }
        self.clean_html_comments()?;
        self.clean_js_scripts()?;
        self.clean_css()?;
        self.clean_ampersand_entities()?;
        self.clean_tags()?;
        self.clean_punctuation()
    }

    /// Consume the document, yielding its current text.
    pub fn into_text(self) -> Result<String> {
        self.content
            .ok_or(TallyError::PreconditionFailed(CONTENT_NOT_PRESENT))
    }

    fn apply<F>(&mut self, stage: &'static str, pass: F) -> Result<&str>
    where
        F: FnOnce(&str) -> String,
    {
        let content = self
            .content
            .as_mut()
            .ok_or(TallyError::PreconditionFailed(CONTENT_NOT_PRESENT))?;
        let before = content.len();
        let next = pass(content.as_str());
        *content = next;
        tracing::debug!(stage, before, after = content.len(), "clean.stage");
        Ok(content.as_str())
    }
}
