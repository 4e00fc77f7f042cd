use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::client::{GraphqlApi, decode};
use crate::error::ClientResult;
use crate::literal::{ArgList, query};
use crate::model::{PageSummary, null_as_default};
use crate::pages::{PageOrder, fetch_all_pages};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub latest_version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub operating_system: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hostname: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub node_version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub db_type: String,
}

impl SystemInfo {
    pub fn update_available(&self) -> bool {
        !self.latest_version.is_empty() && self.latest_version != self.current_version
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WikiStats {
    pub total_pages: usize,
    pub published_pages: usize,
    pub draft_pages: usize,
    pub by_locale: BTreeMap<String, usize>,
    pub by_tag: BTreeMap<String, usize>,
}

pub fn get_health<A: GraphqlApi>(api: &mut A) -> ClientResult<SystemInfo> {
    let operation = query(
        "system",
        "info",
        &ArgList::new(),
        "currentVersion latestVersion operatingSystem hostname nodeVersion dbType",
    );
    let parsed: SystemData = decode(api.execute(&operation)?, "system info")?;
    Ok(parsed.system.info)
}

pub fn get_stats<A: GraphqlApi>(api: &mut A) -> ClientResult<WikiStats> {
    let pages = fetch_all_pages(api, PageOrder::Path)?;
    Ok(compute_stats(&pages))
}

pub fn compute_stats(pages: &[PageSummary]) -> WikiStats {
    let mut stats = WikiStats {
        total_pages: pages.len(),
        ..WikiStats::default()
    };
    for page in pages {
        if page.is_published {
            stats.published_pages += 1;
        } else {
            stats.draft_pages += 1;
        }
        *stats.by_locale.entry(page.locale.clone()).or_default() += 1;
        for tag in &page.tags {
            *stats.by_tag.entry(tag.clone()).or_default() += 1;
        }
    }
    stats
}

#[derive(Debug, Deserialize, Default)]
struct SystemData {
    #[serde(default, deserialize_with = "null_as_default")]
    system: InfoPayload,
}

#[derive(Debug, Deserialize, Default)]
struct InfoPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    info: SystemInfo,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{get_health, get_stats};
    use crate::client::GraphqlApi;
    use crate::error::ClientError;
    use crate::test_support::{MockApi, page_list};

    #[test]
    fn health_reads_system_info() {
        let mut api = MockApi::new().reply(json!({
            "system": { "info": {
                "currentVersion": "2.5.300",
                "latestVersion": "2.5.301",
                "operatingSystem": "Linux",
                "hostname": "wiki-1",
                "nodeVersion": "20.1.0",
                "dbType": "postgres"
            }}
        }));
        let info = get_health(&mut api).expect("health");
        assert_eq!(info.hostname, "wiki-1");
        assert!(info.update_available());
        assert!(api.last_operation().starts_with("query { system { info {"));
    }

    #[test]
    fn health_propagates_transport_failure() {
        let mut api = MockApi::new().fail(ClientError::InvalidResponse("down".to_string()));
        assert!(get_health(&mut api).is_err());
    }

    #[test]
    fn stats_count_status_locale_and_tags_in_one_request() {
        let mut api = MockApi::new().reply(page_list(json!([
            { "id": 1, "path": "a", "locale": "en", "isPublished": true, "tags": ["guide", "ops"] },
            { "id": 2, "path": "b", "locale": "en", "isPublished": false, "tags": ["guide"] },
            { "id": 3, "path": "c", "locale": "fr", "isPublished": true, "tags": [] }
        ])));
        let stats = get_stats(&mut api).expect("stats");

        assert_eq!(stats.total_pages, 3);
        assert_eq!(stats.published_pages, 2);
        assert_eq!(stats.draft_pages, 1);
        assert_eq!(stats.by_locale.get("en"), Some(&2));
        assert_eq!(stats.by_locale.get("fr"), Some(&1));
        assert_eq!(stats.by_tag.get("guide"), Some(&2));
        assert_eq!(stats.by_tag.get("ops"), Some(&1));
        assert_eq!(api.request_count(), 1);
    }
}
