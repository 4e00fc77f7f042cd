use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::client::{GraphqlApi, decode};
use crate::config::{DEFAULT_EDITOR, DEFAULT_LOCALE};
use crate::error::{ClientError, ClientResult};
use crate::literal::{ArgList, mutation, query};
use crate::model::{OperationResult, Page, PageSummary, null_as_default};
use crate::validate::{Identifier, PagePath, PageRef};

pub const DEFAULT_LIST_LIMIT: usize = 50;

pub(crate) const RESULT_SELECTION: &str = "responseResult { succeeded errorCode slug message }";
const LIST_SELECTION: &str =
    "id path locale title description isPublished createdAt updatedAt tags";
const PAGE_SELECTION: &str = "id path title description content render locale editor \
    isPublished isPrivate createdAt updatedAt authorName tags { tag }";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PageOrder {
    #[default]
    Title,
    Path,
    Created,
    Updated,
    Id,
}

impl PageOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "title" => Some(Self::Title),
            "path" => Some(Self::Path),
            "created" => Some(Self::Created),
            "updated" => Some(Self::Updated),
            "id" => Some(Self::Id),
            _ => None,
        }
    }

    fn as_literal(self) -> &'static str {
        match self {
            Self::Title => "TITLE",
            Self::Path => "PATH",
            Self::Created => "CREATED",
            Self::Updated => "UPDATED",
            Self::Id => "ID",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListPagesFilter {
    pub tag: Option<String>,
    pub author: Option<String>,
    pub locale: Option<String>,
    pub limit: usize,
    pub order_by: PageOrder,
}

impl Default for ListPagesFilter {
    fn default() -> Self {
        Self {
            tag: None,
            author: None,
            locale: None,
            limit: DEFAULT_LIST_LIMIT,
            order_by: PageOrder::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub limit: usize,
    pub locale: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
            locale: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub locale: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub results: Vec<SearchHit>,
    pub total_hits: u64,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GetPageOptions {
    pub with_children: bool,
    pub locale: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreatePageOptions {
    pub content: String,
    pub description: String,
    pub tags: Vec<String>,
    pub locale: Option<String>,
    pub editor: Option<String>,
    pub is_published: bool,
    pub is_private: bool,
}

impl Default for CreatePageOptions {
    fn default() -> Self {
        Self {
            content: String::new(),
            description: String::new(),
            tags: Vec::new(),
            locale: None,
            editor: None,
            is_published: true,
            is_private: false,
        }
    }
}

/// Fields left as `None` keep the page's current value.
#[derive(Debug, Clone, Default)]
pub struct PageUpdate {
    pub content: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRefSummary {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Locale, then tag, then author, then the limit. The list query carries no
/// author, so each remaining candidate's author is read with `single` until
/// `limit` pages are kept.
pub fn list_pages<A: GraphqlApi>(
    api: &mut A,
    filter: &ListPagesFilter,
) -> ClientResult<Vec<PageSummary>> {
    let pages = fetch_all_pages(api, filter.order_by)?;
    let total = pages.len();
    let candidates = filter_pages(pages, filter);
    let Some(needle) = filter.author.as_deref().map(str::to_lowercase) else {
        let kept = candidates.into_iter().take(filter.limit).collect::<Vec<_>>();
        debug!(total, kept = kept.len(), "filtered page list");
        return Ok(kept);
    };

    let mut kept = Vec::new();
    let mut lookups = 0usize;
    for mut page in candidates {
        if kept.len() >= filter.limit {
            break;
        }
        lookups += 1;
        page.author_name = fetch_author(api, page.id)?;
        let matched = page
            .author_name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(&needle));
        if matched {
            kept.push(page);
        }
    }
    debug!(total, lookups, kept = kept.len(), "filtered page list by author");
    Ok(kept)
}

/// Locale and tag filters, applied to the list response as returned.
pub fn filter_pages(pages: Vec<PageSummary>, filter: &ListPagesFilter) -> Vec<PageSummary> {
    pages
        .into_iter()
        .filter(|page| {
            filter
                .locale
                .as_deref()
                .is_none_or(|locale| page.locale == locale)
        })
        .filter(|page| {
            filter
                .tag
                .as_deref()
                .is_none_or(|tag| page.tags.iter().any(|candidate| candidate == tag))
        })
        .collect()
}

fn fetch_author<A: GraphqlApi>(api: &mut A, page_id: u64) -> ClientResult<Option<String>> {
    let Some(id) = Identifier::from_remote(page_id) else {
        return Ok(None);
    };
    let operation = query("pages", "single", &ArgList::new().id("id", id), "authorName");
    let parsed: PagesData<AuthorPayload> = decode(api.execute(&operation)?, "page author")?;
    Ok(parsed
        .pages
        .single
        .and_then(|page| page.author_name)
        .filter(|name| !name.is_empty()))
}

/// The list query has no server-side filters, so callers filter locally.
pub(crate) fn fetch_all_pages<A: GraphqlApi>(
    api: &mut A,
    order_by: PageOrder,
) -> ClientResult<Vec<PageSummary>> {
    let args = ArgList::new().enum_value("orderBy", order_by.as_literal());
    let data = api.execute(&query("pages", "list", &args, LIST_SELECTION))?;
    let parsed: PagesData<ListPayload> = decode(data, "page list")?;
    Ok(parsed.pages.list)
}

pub fn search_pages<A: GraphqlApi>(
    api: &mut A,
    search: &str,
    options: &SearchOptions,
) -> ClientResult<SearchResults> {
    let mut args = ArgList::new().string("query", search);
    if let Some(locale) = options.locale.as_deref() {
        args = args.string("locale", locale);
    }
    let operation = query(
        "pages",
        "search",
        &args,
        "results { id title description path locale } suggestions totalHits",
    );
    let parsed: PagesData<SearchPayload> = decode(api.execute(&operation)?, "search results")?;
    let mut search = parsed.pages.search;
    search.results.truncate(options.limit);
    Ok(SearchResults {
        results: search.results,
        total_hits: search.total_hits,
        suggestions: search.suggestions,
    })
}

pub fn get_page<A: GraphqlApi>(
    api: &mut A,
    page: &PageRef,
    options: &GetPageOptions,
) -> ClientResult<Page> {
    let operation = match page {
        PageRef::Id(id) => query("pages", "single", &ArgList::new().id("id", *id), PAGE_SELECTION),
        PageRef::Path(path) => {
            let locale = options.locale.as_deref().unwrap_or(DEFAULT_LOCALE);
            let args = ArgList::new()
                .string("path", path.as_str())
                .string("locale", locale);
            query("pages", "singleByPath", &args, PAGE_SELECTION)
        }
    };
    let parsed: PagesData<SinglePayload> = decode(api.execute(&operation)?, "page")?;
    let raw = parsed
        .pages
        .single
        .or(parsed.pages.single_by_path)
        .ok_or_else(|| ClientError::PageNotFound(page.to_string()))?;
    let mut page = raw.into_page();

    if options.with_children {
        let all = fetch_all_pages(api, PageOrder::Path)?;
        page.children = Some(descendants_of(&page, all));
    }
    Ok(page)
}

/// Pages whose path sits strictly below `parent`'s path.
pub fn descendants_of(parent: &Page, pages: Vec<PageSummary>) -> Vec<PageSummary> {
    let prefix = format!("{}/", parent.path);
    pages
        .into_iter()
        .filter(|page| page.id != parent.id && page.path.starts_with(&prefix))
        .collect()
}

pub fn create_page<A: GraphqlApi>(
    api: &mut A,
    path: &PagePath,
    title: &str,
    options: &CreatePageOptions,
) -> ClientResult<PageRefSummary> {
    let args = ArgList::new()
        .string("content", &options.content)
        .string("description", &options.description)
        .string("editor", options.editor.as_deref().unwrap_or(DEFAULT_EDITOR))
        .boolean("isPublished", options.is_published)
        .boolean("isPrivate", options.is_private)
        .string("locale", options.locale.as_deref().unwrap_or(DEFAULT_LOCALE))
        .string("path", path.as_str())
        .string_list("tags", &options.tags)
        .string("title", title);
    let selection = format!("{RESULT_SELECTION} page {{ id path title }}");
    let data = api.execute(&mutation("pages", "create", &args, &selection))?;
    let parsed: PagesData<CreatePayload> = decode(data, "create page response")?;
    let created = parsed.pages.create;
    created
        .response_result
        .unwrap_or_default()
        .ensure("create page", "Failed to create page")?;
    created.page.ok_or_else(|| {
        ClientError::InvalidResponse("create page response did not include the page".to_string())
    })
}

/// The remote update requires the full field set, so the current page is
/// read first and every omitted field is filled from it.
pub fn update_page<A: GraphqlApi>(
    api: &mut A,
    id: Identifier,
    changes: &PageUpdate,
) -> ClientResult<PageRefSummary> {
    let current = get_page(api, &PageRef::Id(id), &GetPageOptions::default())?;
    let content = changes.content.as_deref().unwrap_or(current.content.as_str());
    let title = changes.title.as_deref().unwrap_or(current.title.as_str());
    let description = changes
        .description
        .as_deref()
        .unwrap_or(current.description.as_str());
    let tags = changes.tags.as_deref().unwrap_or(current.tags.as_slice());
    let is_published = changes.is_published.unwrap_or(current.is_published);
    let editor = if current.editor.is_empty() {
        DEFAULT_EDITOR
    } else {
        current.editor.as_str()
    };

    let args = ArgList::new()
        .id("id", id)
        .string("content", content)
        .string("description", description)
        .string("editor", editor)
        .boolean("isPrivate", current.is_private)
        .boolean("isPublished", is_published)
        .string("locale", &current.locale)
        .string("path", &current.path)
        .string_list("tags", tags)
        .string("title", title);
    let selection = format!("{RESULT_SELECTION} page {{ id path title updatedAt }}");
    let data = api.execute(&mutation("pages", "update", &args, &selection))?;
    let parsed: PagesData<UpdatePayload> = decode(data, "update page response")?;
    let updated = parsed.pages.update;
    updated
        .response_result
        .unwrap_or_default()
        .ensure("update page", "Failed to update page")?;
    Ok(updated.page.unwrap_or_else(|| PageRefSummary {
        id: id.get(),
        path: current.path.clone(),
        title: title.to_string(),
        updated_at: None,
    }))
}

/// A `None` locale falls back to `en`. Callers holding a configured default
/// pass it explicitly.
pub fn move_page<A: GraphqlApi>(
    api: &mut A,
    id: Identifier,
    destination: &PagePath,
    locale: Option<&str>,
) -> ClientResult<()> {
    let args = ArgList::new()
        .id("id", id)
        .string("destinationPath", destination.as_str())
        .string("destinationLocale", locale.unwrap_or(DEFAULT_LOCALE));
    run_page_mutation(api, "move", &args, "move page", "Failed to move page")
}

pub fn delete_page<A: GraphqlApi>(api: &mut A, id: Identifier) -> ClientResult<()> {
    let args = ArgList::new().id("id", id);
    run_page_mutation(api, "delete", &args, "delete page", "Failed to delete page")
}

/// Ask the remote to regenerate the page's rendered HTML.
pub fn render_page<A: GraphqlApi>(api: &mut A, id: Identifier) -> ClientResult<()> {
    let args = ArgList::new().id("id", id);
    run_page_mutation(api, "render", &args, "render page", "Failed to render page")
}

pub(crate) fn run_page_mutation<A: GraphqlApi>(
    api: &mut A,
    field: &str,
    args: &ArgList,
    operation: &'static str,
    fallback: &str,
) -> ClientResult<()> {
    let data = api.execute(&mutation("pages", field, args, RESULT_SELECTION))?;
    mutation_result(data, "pages", field)?.ensure(operation, fallback)
}

/// Pull `data.<root>.<field>.responseResult`; any missing level is a failed result.
pub(crate) fn mutation_result(
    data: Value,
    root: &str,
    field: &str,
) -> ClientResult<OperationResult> {
    let block = data
        .get(root)
        .and_then(|value| value.get(field))
        .and_then(|value| value.get("responseResult"))
        .cloned()
        .unwrap_or(Value::Null);
    if block.is_null() {
        return Ok(OperationResult::default());
    }
    decode(block, "mutation result")
}

#[derive(Debug, Deserialize, Default)]
#[serde(bound = "T: Deserialize<'de> + Default")]
pub(crate) struct PagesData<T> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub pages: T,
}

#[derive(Debug, Deserialize, Default)]
struct ListPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    list: Vec<PageSummary>,
}

#[derive(Debug, Deserialize, Default)]
struct AuthorPayload {
    #[serde(default)]
    single: Option<AuthorOnly>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorOnly {
    #[serde(default)]
    author_name: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct SearchPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    search: RawSearch,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawSearch {
    #[serde(default, deserialize_with = "null_as_default")]
    results: Vec<SearchHit>,
    #[serde(default, deserialize_with = "null_as_default")]
    total_hits: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    suggestions: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct SinglePayload {
    #[serde(default)]
    single: Option<RawPage>,
    #[serde(default)]
    single_by_path: Option<RawPage>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawPage {
    #[serde(default, deserialize_with = "null_as_default")]
    id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    render: String,
    #[serde(default, deserialize_with = "null_as_default")]
    locale: String,
    #[serde(default, deserialize_with = "null_as_default")]
    editor: String,
    #[serde(default, deserialize_with = "null_as_default")]
    is_published: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    is_private: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    updated_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    author_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    tags: Vec<TagRef>,
}

#[derive(Debug, Deserialize, Default)]
struct TagRef {
    #[serde(default, deserialize_with = "null_as_default")]
    tag: String,
}

impl RawPage {
    fn into_page(self) -> Page {
        Page {
            id: self.id,
            path: self.path,
            title: self.title,
            description: self.description,
            content: self.content,
            rendered_content: self.render,
            locale: self.locale,
            editor: self.editor,
            created_at: self.created_at,
            updated_at: self.updated_at,
            author_name: self.author_name,
            tags: self.tags.into_iter().map(|tag| tag.tag).collect(),
            is_published: self.is_published,
            is_private: self.is_private,
            children: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct CreatePayload {
    #[serde(default, deserialize_with = "null_as_default")]
    create: MutationPayload,
}

#[derive(Debug, Deserialize, Default)]
struct UpdatePayload {
    #[serde(default, deserialize_with = "null_as_default")]
    update: MutationPayload,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct MutationPayload {
    #[serde(default)]
    response_result: Option<OperationResult>,
    #[serde(default)]
    page: Option<PageRefSummary>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::test_support::{MockApi, mutation_reply, page_list};

    fn summary(id: u64, path: &str, locale: &str, tags: &[&str]) -> Value {
        json!({
            "id": id,
            "path": path,
            "locale": locale,
            "title": format!("Title {id}"),
            "description": "",
            "isPublished": true,
            "createdAt": "2026-01-01T00:00:00Z",
            "updatedAt": "2026-01-02T00:00:00Z",
            "tags": tags,
        })
    }

    fn author(name: Option<&str>) -> Value {
        json!({ "pages": { "single": { "authorName": name } } })
    }

    fn single(page: Value) -> Value {
        json!({ "pages": { "single": page } })
    }

    fn stored_page() -> Value {
        json!({
            "id": 12,
            "path": "docs/setup",
            "title": "Setup",
            "description": "How to set up",
            "content": "# Setup",
            "render": "<h1>Setup</h1>",
            "locale": "en",
            "editor": "markdown",
            "isPublished": true,
            "isPrivate": false,
            "createdAt": "2026-01-01T00:00:00Z",
            "updatedAt": "2026-02-01T00:00:00Z",
            "authorName": "Ada",
            "tags": [{ "tag": "guide" }, { "tag": "ops" }]
        })
    }

    #[test]
    fn list_pages_resolves_authors_after_locale_and_tag() {
        let mut api = MockApi::new()
            .reply(page_list(json!([
                summary(1, "a", "en", &["guide"]),
                summary(2, "b", "fr", &["guide"]),
                summary(3, "c", "en", &["misc"]),
                summary(4, "d", "en", &["guide"]),
                summary(5, "e", "en", &["guide", "x"]),
                summary(6, "f", "en", &["guide"]),
            ])))
            .reply(author(Some("Ada Lovelace")))
            .reply(author(Some("Grace")))
            .reply(author(Some("ADA")))
            .reply(author(None));
        let filter = ListPagesFilter {
            tag: Some("guide".to_string()),
            author: Some("ada".to_string()),
            locale: Some("en".to_string()),
            limit: 5,
            ..ListPagesFilter::default()
        };

        let pages = list_pages(&mut api, &filter).expect("list");
        let ids = pages.iter().map(|page| page.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 5]);
        assert_eq!(pages[0].author_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(
            api.operations,
            vec![
                format!("query {{ pages {{ list(orderBy: TITLE) {{ {LIST_SELECTION} }} }} }}"),
                "query { pages { single(id: 1) { authorName } } }".to_string(),
                "query { pages { single(id: 4) { authorName } } }".to_string(),
                "query { pages { single(id: 5) { authorName } } }".to_string(),
                "query { pages { single(id: 6) { authorName } } }".to_string(),
            ]
        );
    }

    #[test]
    fn list_pages_stops_author_lookups_at_limit() {
        let mut api = MockApi::new()
            .reply(page_list(json!([
                summary(1, "a", "en", &[]),
                summary(2, "b", "en", &[]),
                summary(3, "c", "en", &[]),
            ])))
            .reply(author(Some("bob")))
            .reply(author(Some("Ada")));
        let filter = ListPagesFilter {
            author: Some("Ada".to_string()),
            limit: 1,
            ..ListPagesFilter::default()
        };

        let pages = list_pages(&mut api, &filter).expect("list");
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].id, 2);
        assert_eq!(api.request_count(), 3);
    }

    #[test]
    fn list_pages_without_author_sends_only_the_list_query() {
        let mut api = MockApi::new().reply(page_list(json!([
            summary(1, "a", "en", &["guide"]),
            summary(2, "b", "en", &[]),
        ])));
        let filter = ListPagesFilter {
            tag: Some("guide".to_string()),
            ..ListPagesFilter::default()
        };

        let pages = list_pages(&mut api, &filter).expect("list");
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].author_name, None);
        assert_eq!(api.request_count(), 1);
    }

    #[test]
    fn list_pages_truncates_to_limit() {
        let mut api = MockApi::new().reply(page_list(json!([
            summary(1, "a", "en", &[]),
            summary(2, "b", "en", &[]),
            summary(3, "c", "en", &[]),
        ])));
        let filter = ListPagesFilter {
            limit: 2,
            ..ListPagesFilter::default()
        };
        assert_eq!(list_pages(&mut api, &filter).expect("list").len(), 2);
    }

    #[test]
    fn search_sanitizes_query_and_truncates() {
        let mut api = MockApi::new().reply(json!({
            "pages": { "search": {
                "results": [
                    { "id": "1", "title": "One", "path": "one", "locale": "en" },
                    { "id": "2", "title": "Two", "path": "two", "locale": "en" }
                ],
                "suggestions": ["onee"],
                "totalHits": 2
            }}
        }));
        let options = SearchOptions {
            limit: 1,
            locale: None,
        };
        let results = search_pages(&mut api, "say \"hi\"", &options).expect("search");

        assert_eq!(results.results.len(), 1);
        assert_eq!(results.total_hits, 2);
        assert_eq!(results.suggestions, vec!["onee".to_string()]);
        assert!(api.last_operation().contains(r#"search(query: "say \"hi\"")"#));
    }

    #[test]
    fn get_page_by_id_flattens_tags() {
        let mut api = MockApi::new().reply(single(stored_page()));
        let id = Identifier::new(12).expect("id");
        let page = get_page(&mut api, &PageRef::Id(id), &GetPageOptions::default()).expect("page");

        assert_eq!(page.tags, vec!["guide".to_string(), "ops".to_string()]);
        assert_eq!(page.rendered_content, "<h1>Setup</h1>");
        assert_eq!(page.author_name, "Ada");
        assert!(page.children.is_none());
        assert!(api.last_operation().starts_with("query { pages { single(id: 12) {"));
    }

    #[test]
    fn get_page_by_path_uses_locale() {
        let mut api = MockApi::new().reply(json!({ "pages": { "singleByPath": stored_page() } }));
        let page_ref = PageRef::parse("/docs/setup").expect("ref");
        let options = GetPageOptions {
            with_children: false,
            locale: Some("de".to_string()),
        };
        let page = get_page(&mut api, &page_ref, &options).expect("page");
        assert_eq!(page.id, 12);
        assert!(
            api.last_operation()
                .contains(r#"singleByPath(path: "docs/setup", locale: "de")"#)
        );
    }

    #[test]
    fn get_page_missing_is_not_found() {
        let mut api = MockApi::new().reply(json!({ "pages": { "single": null } }));
        let id = Identifier::new(99).expect("id");
        let error = get_page(&mut api, &PageRef::Id(id), &GetPageOptions::default())
            .expect_err("must fail");
        assert!(matches!(error, ClientError::PageNotFound(ref key) if key == "99"));

        let mut empty = MockApi::new().reply(Value::Null);
        assert!(matches!(
            get_page(&mut empty, &PageRef::Id(id), &GetPageOptions::default()),
            Err(ClientError::PageNotFound(_))
        ));
    }

    #[test]
    fn get_page_with_children_lists_strict_descendants() {
        let mut api = MockApi::new()
            .reply(single(stored_page()))
            .reply(page_list(json!([
                summary(12, "docs/setup", "en", &[]),
                summary(13, "docs/setup/linux", "en", &[]),
                summary(14, "docs/setup/linux/arm", "en", &[]),
                summary(15, "docs/setup-old", "en", &[]),
                summary(16, "docs", "en", &[]),
            ])));
        let id = Identifier::new(12).expect("id");
        let options = GetPageOptions {
            with_children: true,
            locale: None,
        };
        let page = get_page(&mut api, &PageRef::Id(id), &options).expect("page");

        let children = page.children.expect("children");
        let ids = children.iter().map(|child| child.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![13, 14]);
        assert_eq!(api.request_count(), 2);
    }

    #[test]
    fn create_page_reports_remote_message() {
        let mut api = MockApi::new().reply(mutation_reply(
            "create",
            json!({ "succeeded": false, "errorCode": 6002, "message": "Path already exists" }),
            None,
        ));
        let path = PagePath::parse("docs/setup").expect("path");
        let error = create_page(&mut api, &path, "Setup", &CreatePageOptions::default())
            .expect_err("must fail");
        assert_eq!(error.to_string(), "Path already exists");
    }

    #[test]
    fn create_page_builds_full_mutation() {
        let mut api = MockApi::new().reply(mutation_reply(
            "create",
            json!({ "succeeded": true }),
            Some(("page", json!({ "id": 30, "path": "docs/new", "title": "New \"one\"" }))),
        ));
        let path = PagePath::parse("/docs/new").expect("path");
        let options = CreatePageOptions {
            content: "line one\nline two".to_string(),
            tags: vec!["a".to_string(), "b".to_string()],
            ..CreatePageOptions::default()
        };
        let created = create_page(&mut api, &path, "New \"one\"", &options).expect("create");

        assert_eq!(created.id, 30);
        let operation = api.last_operation();
        assert!(
            operation.starts_with("mutation { pages { create(content: \"line one\\nline two\"")
        );
        assert!(operation.contains("editor: \"markdown\", isPublished: true, isPrivate: false"));
        assert!(operation.contains("locale: \"en\", path: \"docs/new\", tags: [\"a\",\"b\"]"));
        assert!(operation.contains("title: \"New \\\"one\\\"\")"));
    }

    #[test]
    fn create_page_without_result_uses_fallback_message() {
        let mut api = MockApi::new().reply(json!({ "pages": { "create": null } }));
        let path = PagePath::parse("docs/x").expect("path");
        let error = create_page(&mut api, &path, "X", &CreatePageOptions::default())
            .expect_err("must fail");
        assert_eq!(error.to_string(), "Failed to create page");
    }

    #[test]
    fn update_page_merges_current_values() {
        let mut api = MockApi::new().reply(single(stored_page())).reply(mutation_reply(
            "update",
            json!({ "succeeded": true }),
            Some((
                "page",
                json!({
                    "id": 12,
                    "path": "docs/setup",
                    "title": "Setup v2",
                    "updatedAt": "2026-03-01"
                }),
            )),
        ));
        let id = Identifier::new(12).expect("id");
        let changes = PageUpdate {
            title: Some("Setup v2".to_string()),
            ..PageUpdate::default()
        };
        let updated = update_page(&mut api, id, &changes).expect("update");

        assert_eq!(updated.title, "Setup v2");
        assert_eq!(updated.updated_at.as_deref(), Some("2026-03-01"));
        assert_eq!(api.operations.len(), 2);
        let operation = api.last_operation();
        assert!(operation.starts_with("mutation { pages { update(id: 12, content: \"# Setup\""));
        assert!(operation.contains("description: \"How to set up\""));
        assert!(operation.contains("isPrivate: false, isPublished: true"));
        assert!(operation.contains("tags: [\"guide\",\"ops\"], title: \"Setup v2\")"));
    }

    #[test]
    fn update_page_failure_carries_message() {
        let mut api = MockApi::new().reply(single(stored_page())).reply(mutation_reply(
            "update",
            json!({ "succeeded": false, "message": "Forbidden" }),
            None,
        ));
        let id = Identifier::new(12).expect("id");
        let error = update_page(&mut api, id, &PageUpdate::default()).expect_err("must fail");
        assert_eq!(error.to_string(), "Forbidden");
    }

    #[test]
    fn move_and_delete_check_result() {
        let mut api = MockApi::new()
            .reply(mutation_reply("move", json!({ "succeeded": true }), None))
            .reply(mutation_reply("delete", json!({ "succeeded": false }), None));
        let id = Identifier::new(5).expect("id");
        let destination = PagePath::parse("archive/old").expect("path");

        move_page(&mut api, id, &destination, Some("fr")).expect("move");
        assert_eq!(
            api.last_operation(),
            "mutation { pages { move(id: 5, destinationPath: \"archive/old\", \
             destinationLocale: \"fr\") { responseResult { succeeded errorCode slug message } } } }"
        );

        let error = delete_page(&mut api, id).expect_err("must fail");
        assert_eq!(error.to_string(), "Failed to delete page");
    }

    #[test]
    fn unset_locale_falls_back_to_en() {
        let mut api = MockApi::new()
            .reply(mutation_reply("move", json!({ "succeeded": true }), None))
            .reply(json!({ "pages": { "singleByPath": stored_page() } }));
        let id = Identifier::new(5).expect("id");
        let destination = PagePath::parse("archive/old").expect("path");

        move_page(&mut api, id, &destination, None).expect("move");
        assert!(api.last_operation().contains("destinationLocale: \"en\""));

        let page_ref = PageRef::parse("docs/setup").expect("ref");
        get_page(&mut api, &page_ref, &GetPageOptions::default()).expect("page");
        assert!(api.last_operation().contains(r#"singleByPath(path: "docs/setup", locale: "en")"#));
    }

    #[test]
    fn transport_errors_propagate_unchanged() {
        let mut api = MockApi::new().fail(ClientError::HttpStatus {
            status: 503,
            body: "busy".to_string(),
        });
        let error = list_pages(&mut api, &ListPagesFilter::default()).expect_err("must fail");
        assert!(matches!(error, ClientError::HttpStatus { status: 503, .. }));
    }

    #[test]
    fn page_order_parses_names() {
        assert_eq!(PageOrder::parse("Updated"), Some(PageOrder::Updated));
        assert_eq!(PageOrder::parse("nope"), None);
    }
}
