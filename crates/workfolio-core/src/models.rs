use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// One piece of public work, tagged with where it came from
///
/// Serialized with a `workItemType` discriminant so the presentation layer
/// can tell the variants apart without guessing from shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "workItemType", rename_all = "lowercase")]
pub enum WorkItem {
    Project(Project),
    Article(Article),
    Certification(Certification),
}

impl WorkItem {
    pub fn kind(&self) -> WorkItemType {
        match self {
            WorkItem::Project(_) => WorkItemType::Project,
            WorkItem::Article(_) => WorkItemType::Article,
            WorkItem::Certification(_) => WorkItemType::Certification,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            WorkItem::Project(p) => &p.id,
            WorkItem::Article(a) => &a.id,
            WorkItem::Certification(c) => &c.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            WorkItem::Project(p) => &p.title,
            WorkItem::Article(a) => &a.title,
            WorkItem::Certification(c) => &c.title,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            WorkItem::Project(p) => &p.description,
            WorkItem::Article(a) => &a.description,
            WorkItem::Certification(c) => &c.description,
        }
    }

    pub fn tags(&self) -> &[String] {
        match self {
            WorkItem::Project(p) => &p.tags,
            WorkItem::Article(a) => &a.tags,
            WorkItem::Certification(c) => &c.tags,
        }
    }

    pub fn link(&self) -> &str {
        match self {
            WorkItem::Project(p) => &p.link,
            WorkItem::Article(a) => &a.link,
            WorkItem::Certification(c) => &c.link,
        }
    }
}

/// Discriminant of a [`WorkItem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkItemType {
    Project,
    Article,
    Certification,
}

impl fmt::Display for WorkItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkItemType::Project => write!(f, "project"),
            WorkItemType::Article => write!(f, "article"),
            WorkItemType::Certification => write!(f, "certification"),
        }
    }
}

/// How hard a project was to build, as the author labels it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Extreme,
    High,
    Medium,
    Low,
}

impl FromStr for Complexity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "extreme" => Ok(Complexity::Extreme),
            "high" => Ok(Complexity::High),
            "medium" => Ok(Complexity::Medium),
            "low" => Ok(Complexity::Low),
            other => Err(Error::InvalidRecord(format!("unknown complexity {:?}", other))),
        }
    }
}

/// A code repository presented as a portfolio project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_open: Option<bool>,
    /// Visibility inputs, consumed by the aggregation and never published
    #[serde(skip)]
    pub visibility: ProjectVisibility,
}

impl Project {
    pub fn has_empty_description(&self) -> bool {
        self.description.trim().is_empty()
    }

    /// A project is worth showing once it says what it is and nobody hid it
    pub fn is_visible(&self) -> bool {
        !self.has_empty_description() && !self.visibility.hidden
    }
}

/// Flags that decide whether a project makes it to the page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectVisibility {
    /// The repository is archived upstream
    pub archived: bool,
    /// The extra description asks for the project to be listed even if archived
    pub show_even_archived: bool,
    /// The extra description asks for the project to be left out entirely
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl Article {
    pub fn validate(&self) -> Result<()> {
        require_id("article", &self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(alias = "certificationUrl")]
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_article_url: Option<String>,
    /// Free-form date as printed on the certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<String>,
}

impl Certification {
    pub fn validate(&self) -> Result<()> {
        require_id("certification", &self.id)
    }
}

fn require_id(kind: &str, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::InvalidRecord(format!("{} has no id", kind)));
    }
    Ok(())
}

/// Repository as the code-hosting source reports it
///
/// Only lives long enough to be turned into a [`Project`].
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub owner: String,
    pub description: Option<String>,
    pub html_url: String,
    pub topics: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub language: Option<String>,
    pub stargazers_count: u32,
    pub homepage: Option<String>,
    pub archived: bool,
}

impl SourceRecord {
    /// Minimal record for `owner/name`, everything optional left empty
    pub fn new(id: u64, owner: &str, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            full_name: format!("{}/{}", owner, name),
            owner: owner.to_string(),
            description: None,
            html_url: format!("https://github.com/{}/{}", owner, name),
            topics: Vec::new(),
            created_at: None,
            updated_at: None,
            language: None,
            stargazers_count: 0,
            homepage: None,
            archived: false,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Reject records no well-behaved source would produce
    pub fn validate(&self) -> Result<()> {
        if self.id == 0 {
            return Err(Error::InvalidRecord(format!(
                "repository {:?} has no id",
                self.full_name
            )));
        }
        if self.name.trim().is_empty() {
            return Err(Error::InvalidRecord(format!(
                "repository {} has no name",
                self.id
            )));
        }
        if self.full_name.trim().is_empty() {
            return Err(Error::InvalidRecord(format!(
                "repository {} has no full name",
                self.id
            )));
        }
        Ok(())
    }
}

/// Per-repository presentation override, read from the repository itself
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtraDescription {
    pub title: Option<String>,
    pub custom_description: Option<String>,
    pub custom_topics: Vec<String>,
    pub website_url: Option<String>,
    pub complexity: Option<Complexity>,
    pub starts_open: Option<bool>,
    pub show_even_archived: bool,
    pub is_hidden: bool,
}

/// Publication state of an article page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Draft,
    Published,
}

/// Article page as exported from Notion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotionPage {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    pub status: PageStatus,
}
