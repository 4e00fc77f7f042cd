use serde::{Deserialize, Serialize};

use crate::client::{GraphqlApi, decode};
use crate::error::ClientResult;
use crate::literal::{ArgList, query};
use crate::model::null_as_default;
use crate::pages::PagesData;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: String,
}

pub fn list_tags<A: GraphqlApi>(api: &mut A) -> ClientResult<Vec<Tag>> {
    let operation = query(
        "pages",
        "tags",
        &ArgList::new(),
        "id tag title createdAt updatedAt",
    );
    let parsed: PagesData<TagsPayload> = decode(api.execute(&operation)?, "tag list")?;
    Ok(parsed.pages.tags)
}

/// Tag names matching `needle`, as suggested by the remote.
pub fn search_tags<A: GraphqlApi>(api: &mut A, needle: &str) -> ClientResult<Vec<String>> {
    let args = ArgList::new().string("query", needle);
    let operation = format!("query {{ pages {{ searchTags{} }} }}", args.render());
    let parsed: PagesData<SearchTagsPayload> = decode(api.execute(&operation)?, "tag search")?;
    Ok(parsed.pages.search_tags)
}

#[derive(Debug, Deserialize, Default)]
struct TagsPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    tags: Vec<Tag>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct SearchTagsPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    search_tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::{list_tags, search_tags};
    use crate::test_support::MockApi;

    #[test]
    fn list_tags_decodes_all_fields() {
        let mut api = MockApi::new().reply(json!({
            "pages": { "tags": [
                { "id": 1, "tag": "guide", "title": "Guide", "createdAt": "c", "updatedAt": "u" },
                { "id": 2, "tag": "ops", "title": null }
            ]}
        }));
        let tags = list_tags(&mut api).expect("tags");
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].title, "Guide");
        assert_eq!(tags[1].title, "");
        assert_eq!(
            api.last_operation(),
            "query { pages { tags { id tag title createdAt updatedAt } } }"
        );
    }

    #[test]
    fn empty_data_yields_no_tags() {
        let mut api = MockApi::new().reply(Value::Null);
        assert!(list_tags(&mut api).expect("tags").is_empty());
    }

    #[test]
    fn search_tags_is_a_scalar_list() {
        let mut api =
            MockApi::new().reply(json!({ "pages": { "searchTags": ["guide", "guides"] } }));
        let found = search_tags(&mut api, "gui").expect("search");
        assert_eq!(found, vec!["guide".to_string(), "guides".to_string()]);
        assert_eq!(
            api.last_operation(),
            "query { pages { searchTags(query: \"gui\") } }"
        );
    }
}
