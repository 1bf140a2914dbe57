//! Native write-back
//!
//! Generates text through the [`Assistant`] and writes it into the workspace
//! as real blocks: callouts and headings up front, then one paragraph per
//! chunk so no block exceeds the API's rich-text limit.

use pagetext::{ContentNode, TextRun};
use tracing::{debug, info};

use crate::assistant::{Assistant, AssistantError, QuestionType};
use crate::workspace::{PageMeta, PageSpec, Parent};

pub const SUMMARY_LABEL: &str = "AI-generated summary";
pub const QUESTIONS_HEADING: &str = "❓ AI-Generated Questions";
pub const SUGGESTIONS_HEADING: &str = "🤖 AI-Generated Suggestions";
pub const ANALYSIS_INTRO: &str = "This page contains AI-generated analysis of your content.";

/// Fallback title-property name when a database schema doesn't say
const DEFAULT_TITLE_PROPERTY: &str = "Title";

/// Link to a page by id, the form the web client accepts
pub fn page_link(page_id: &str) -> String {
    format!("https://notion.so/{}", page_id.replace('-', ""))
}

/// Writes generated content back into the workspace
#[derive(Clone)]
pub struct NativeIntegration {
    assistant: Assistant,
    max_length: usize,
}

impl NativeIntegration {
    pub fn new(assistant: Assistant, max_length: usize) -> Self {
        Self { assistant, max_length }
    }

    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    fn chunk(&self, text: &str) -> Result<Vec<String>, AssistantError> {
        Ok(pagetext::chunk(text, self.max_length)?)
    }

    /// Append a summary callout and the summary paragraphs to a page
    pub async fn add_summary_to_page(&self, page_id: &str) -> Result<(), AssistantError> {
        debug!(%page_id, "add_summary_to_page: called");
        let summary = self.assistant.summarize_page(page_id).await?;
        let chunks = self.chunk(&summary)?;

        let header = ContentNode::Callout {
            runs: vec![TextRun::plain(SUMMARY_LABEL).with_color("blue")],
            icon: Some("🔷".to_string()),
            color: Some("blue_background".to_string()),
        };
        let nodes = pagetext::with_header(header, &chunks);

        self.assistant.store().append_blocks(page_id, &nodes).await?;
        info!(%page_id, block_count = nodes.len(), "AI summary added to page");
        Ok(())
    }

    /// Append a divider, a questions heading and the question paragraphs
    pub async fn add_questions_to_page(&self, page_id: &str) -> Result<(), AssistantError> {
        debug!(%page_id, "add_questions_to_page: called");
        let questions = self
            .assistant
            .questions_for_page(page_id, QuestionType::default())
            .await?;
        let chunks = self.chunk(&questions)?;

        let heading = ContentNode::Heading2 {
            runs: vec![TextRun::plain(QUESTIONS_HEADING).with_color("purple")],
        };
        let nodes = pagetext::sections(vec![(vec![ContentNode::divider(), heading], chunks)]);

        self.assistant.store().append_blocks(page_id, &nodes).await?;
        info!(%page_id, block_count = nodes.len(), "AI questions added to page");
        Ok(())
    }

    /// Create a database entry holding generated content suggestions
    ///
    /// The title goes into whichever property the schema marks as the title.
    /// `Status` and `Priority` selects are set only when the schema has them.
    pub async fn add_suggestions_to_database(
        &self,
        database_id: &str,
        topic: &str,
        requirements: &str,
    ) -> Result<PageMeta, AssistantError> {
        debug!(%database_id, %topic, "add_suggestions_to_database: called");
        let database = self.assistant.store().get_database(database_id).await?;
        let suggestions = self.assistant.content_suggestions(topic, requirements).await?;
        let chunks = self.chunk(&suggestions)?;

        let title_property = database.title_property().unwrap_or(DEFAULT_TITLE_PROPERTY);

        let mut spec = PageSpec::new(Parent::Database(database_id.to_string()), format!("AI Suggestions: {}", topic))
            .with_title_property(title_property)
            .with_children(pagetext::with_header(ContentNode::heading_2(SUGGESTIONS_HEADING), &chunks));
        if database.property_kind("Status") == Some("select") {
            spec = spec.with_select("Status", "AI Generated");
        }
        if database.property_kind("Priority") == Some("select") {
            spec = spec.with_select("Priority", "High");
        }

        let entry = self.assistant.store().create_page(spec).await?;
        info!(%database_id, entry_id = %entry.id, "AI suggestions added to database");
        Ok(entry)
    }

    /// Create a child page with summary, key information and questions
    ///
    /// The page lives under `parent_id` when given, otherwise under the
    /// original page.
    pub async fn create_analysis_page(
        &self,
        original_id: &str,
        parent_id: Option<&str>,
    ) -> Result<PageMeta, AssistantError> {
        debug!(%original_id, ?parent_id, "create_analysis_page: called");
        let original = self.assistant.store().get_page(original_id).await?;

        let (summary, key_info, questions) = futures::try_join!(
            self.assistant.summarize_page(original_id),
            self.assistant.key_info_for_page(original_id),
            self.assistant.questions_for_page(original_id, QuestionType::default())
        )?;

        let intro = ContentNode::callout(ANALYSIS_INTRO, "🤖", "blue_background");
        let mut nodes = pagetext::sections(vec![
            (vec![intro, ContentNode::heading_2("📋 Summary")], self.chunk(&summary)?),
            (vec![ContentNode::heading_2("🔍 Key Information")], self.chunk(&key_info)?),
            (vec![ContentNode::heading_2("❓ Generated Questions")], self.chunk(&questions)?),
        ]);
        nodes.push(ContentNode::divider());
        nodes.push(ContentNode::Paragraph {
            runs: vec![
                TextRun::plain("Original page: "),
                TextRun::plain(original.title.as_str()).with_link(page_link(original_id)),
            ],
        });

        let parent = parent_id.unwrap_or(original_id);
        let spec = PageSpec::new(Parent::Page(parent.to_string()), format!("🤖 AI Analysis: {}", original.title))
            .with_children(nodes);

        let page = self.assistant.store().create_page(spec).await?;
        info!(%original_id, analysis_id = %page.id, "AI analysis page created");
        Ok(page)
    }

    /// Summary, then questions, then an analysis sub-page
    pub async fn demonstrate(&self, page_id: &str) -> Result<PageMeta, AssistantError> {
        debug!(%page_id, "demonstrate: called");
        self.add_summary_to_page(page_id).await?;
        self.add_questions_to_page(page_id).await?;
        self.create_analysis_page(page_id, None).await
    }
}
