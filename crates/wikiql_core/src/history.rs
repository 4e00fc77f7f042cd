use serde::{Deserialize, Serialize};

use crate::client::{GraphqlApi, decode};
use crate::error::{ClientError, ClientResult};
use crate::literal::{ArgList, query};
use crate::model::null_as_default;
use crate::pages::{PagesData, run_page_mutation};
use crate::validate::Identifier;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub version_id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub action_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value_before: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value_after: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub version_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageHistory {
    #[serde(default, deserialize_with = "null_as_default")]
    pub trail: Vec<HistoryEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: u64,
}

/// A stored revision including its full content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageVersion {
    #[serde(default, deserialize_with = "null_as_default")]
    pub version_id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub page_id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub action: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub locale: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub editor: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub version_date: String,
}

pub fn get_page_versions<A: GraphqlApi>(
    api: &mut A,
    page_id: Identifier,
) -> ClientResult<PageHistory> {
    let operation = query(
        "pages",
        "history",
        &ArgList::new().id("id", page_id),
        "trail { versionId authorName actionType valueBefore valueAfter versionDate } total",
    );
    let parsed: PagesData<HistoryPayload> = decode(api.execute(&operation)?, "page history")?;
    Ok(parsed.pages.history)
}

pub fn get_page_version<A: GraphqlApi>(
    api: &mut A,
    page_id: Identifier,
    version_id: Identifier,
) -> ClientResult<PageVersion> {
    let args = ArgList::new()
        .id("pageId", page_id)
        .id("versionId", version_id);
    let operation = query(
        "pages",
        "version",
        &args,
        "versionId pageId action authorName path locale title description content editor tags \
         versionDate",
    );
    let parsed: PagesData<VersionPayload> = decode(api.execute(&operation)?, "page version")?;
    parsed
        .pages
        .version
        .ok_or_else(|| ClientError::PageNotFound(format!("{page_id}@{version_id}")))
}

/// Restore the page content stored in `version_id`.
pub fn revert_page<A: GraphqlApi>(
    api: &mut A,
    page_id: Identifier,
    version_id: Identifier,
) -> ClientResult<()> {
    let args = ArgList::new()
        .id("pageId", page_id)
        .id("versionId", version_id);
    run_page_mutation(api, "restore", &args, "revert page", "Failed to revert page")
}

#[derive(Debug, Deserialize, Default)]
struct HistoryPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    history: PageHistory,
}

#[derive(Debug, Deserialize, Default)]
struct VersionPayload {
    #[serde(default)]
    version: Option<PageVersion>,
}
