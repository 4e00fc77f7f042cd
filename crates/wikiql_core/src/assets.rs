use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::client::{GraphqlApi, UploadRequest, decode};
use crate::error::{ClientError, ClientResult};
use crate::literal::{ArgList, mutation, query};
use crate::model::null_as_default;
use crate::pages::{DEFAULT_LIST_LIMIT, RESULT_SELECTION, mutation_result};
use crate::validate::Identifier;

const ASSET_SELECTION: &str = "id filename ext kind mime fileSize createdAt updatedAt";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filename: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ext: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mime: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_size: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFolder {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ListAssetsOptions {
    /// Filename prefix filter.
    pub folder: Option<String>,
    pub limit: usize,
}

impl Default for ListAssetsOptions {
    fn default() -> Self {
        Self {
            folder: None,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub folder_id: Option<u64>,
    pub rename: Option<String>,
}

/// Lists every asset in the root folder, then applies the prefix filter and limit.
pub fn list_assets<A: GraphqlApi>(
    api: &mut A,
    options: &ListAssetsOptions,
) -> ClientResult<Vec<Asset>> {
    let args = ArgList::new().int("folderId", 0).enum_value("kind", "ALL");
    let data = api.execute(&query("assets", "list", &args, ASSET_SELECTION))?;
    let parsed: AssetsData<ListPayload> = decode(data, "asset list")?;
    let assets = parsed
        .assets
        .list
        .into_iter()
        .filter(|asset| {
            options
                .folder
                .as_deref()
                .is_none_or(|prefix| asset.filename.starts_with(prefix))
        })
        .take(options.limit)
        .collect::<Vec<_>>();
    debug!(count = assets.len(), "listed assets");
    Ok(assets)
}

pub fn list_asset_folders<A: GraphqlApi>(
    api: &mut A,
    parent_id: u64,
) -> ClientResult<Vec<AssetFolder>> {
    let args = ArgList::new().int("parentFolderId", parent_id);
    let data = api.execute(&query("assets", "folders", &args, "id slug name"))?;
    let parsed: AssetsData<FoldersPayload> = decode(data, "asset folders")?;
    Ok(parsed.assets.folders)
}

/// Upload a local file. The stored name is `rename` when given, otherwise
/// the file's base name.
pub fn upload_asset<A: GraphqlApi>(
    api: &mut A,
    file_path: &Path,
    options: &UploadOptions,
) -> ClientResult<Value> {
    let metadata = std::fs::metadata(file_path).map_err(|source| ClientError::Io {
        path: file_path.to_path_buf(),
        source,
    })?;
    if !metadata.is_file() {
        return Err(ClientError::Io {
            path: file_path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
        });
    }

    let file_name = match options.rename.as_deref() {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| ClientError::Io {
                path: file_path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "path has no file name",
                ),
            })?,
    };

    let request = UploadRequest {
        file_path: file_path.to_path_buf(),
        file_name,
        folder_id: options.folder_id,
    };
    let response = api.upload(&request)?;
    info!(file = %request.file_name, size = metadata.len(), "uploaded asset");
    Ok(response)
}

pub fn delete_asset<A: GraphqlApi>(api: &mut A, id: Identifier) -> ClientResult<()> {
    let args = ArgList::new().id("id", id);
    let data = api.execute(&mutation("assets", "deleteAsset", &args, RESULT_SELECTION))?;
    mutation_result(data, "assets", "deleteAsset")?.ensure("delete asset", "Failed to delete asset")
}

#[derive(Debug, Deserialize, Default)]
#[serde(bound = "T: Deserialize<'de> + Default")]
struct AssetsData<T> {
    #[serde(default, deserialize_with = "null_as_default")]
    assets: T,
}

#[derive(Debug, Deserialize, Default)]
struct ListPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    list: Vec<Asset>,
}

#[derive(Debug, Deserialize, Default)]
struct FoldersPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    folders: Vec<AssetFolder>,
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use tempfile::tempdir;

    use super::*;
    use crate::test_support::{MockApi, wrap};

    #[test]
    fn list_assets_filters_by_prefix_then_limits() {
        let mut api = MockApi::new().reply(json!({
            "assets": { "list": [
                { "id": 1, "filename": "logo.png", "fileSize": 10 },
                { "id": 2, "filename": "docs-a.pdf" },
                { "id": 3, "filename": "docs-b.pdf" },
                { "id": 4, "filename": "docs-c.pdf" }
            ]}
        }));
        let options = ListAssetsOptions {
            folder: Some("docs-".to_string()),
            limit: 2,
        };
        let assets = list_assets(&mut api, &options).expect("assets");
        let ids = assets.iter().map(|asset| asset.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![2, 3]);
        assert!(api.last_operation().contains("list(folderId: 0, kind: ALL)"));
    }

    #[test]
    fn folders_pass_parent_id() {
        let mut api = MockApi::new().reply(json!({
            "assets": { "folders": [{ "id": 7, "slug": "img", "name": "Images" }] }
        }));
        let folders = list_asset_folders(&mut api, 3).expect("folders");
        assert_eq!(folders[0].name, "Images");
        assert_eq!(
            api.last_operation(),
            "query { assets { folders(parentFolderId: 3) { id slug name } } }"
        );
    }

    #[test]
    fn upload_defaults_name_to_base_name() {
        let dir = tempdir().expect("tempdir");
        let file = dir.path().join("diagram.svg");
        fs::write(&file, "<svg/>").expect("write");

        let mut api = MockApi::new().upload_reply(json!({ "succeeded": true }));
        let response = upload_asset(
            &mut api,
            &file,
            &UploadOptions {
                folder_id: Some(4),
                rename: None,
            },
        )
        .expect("upload");

        assert_eq!(response, json!({ "succeeded": true }));
        assert_eq!(api.uploads.len(), 1);
        assert_eq!(api.uploads[0].file_name, "diagram.svg");
        assert_eq!(api.uploads[0].folder_id, Some(4));
    }

    #[test]
    fn upload_uses_rename_when_given() {
        let dir = tempdir().expect("tempdir");
        let file = dir.path().join("tmp123.bin");
        fs::write(&file, [0u8, 1, 2]).expect("write");

        let mut api = MockApi::new();
        let options = UploadOptions {
            folder_id: None,
            rename: Some("firmware.bin".to_string()),
        };
        upload_asset(&mut api, &file, &options).expect("upload");
        assert_eq!(api.uploads[0].file_name, "firmware.bin");
    }

    #[test]
    fn upload_rejects_missing_file_without_calling_remote() {
        let dir = tempdir().expect("tempdir");
        let mut api = MockApi::new();
        let error = upload_asset(&mut api, &dir.path().join("nope.png"), &UploadOptions::default())
            .expect_err("must fail");
        assert!(matches!(error, ClientError::Io { .. }));
        assert_eq!(api.request_count(), 0);

        let error = upload_asset(&mut api, dir.path(), &UploadOptions::default())
            .expect_err("directory must fail");
        assert!(matches!(error, ClientError::Io { .. }));
    }

    #[test]
    fn delete_asset_checks_result() {
        let mut api = MockApi::new().reply(wrap(
            "assets",
            "deleteAsset",
            json!({ "responseResult": { "succeeded": false, "message": "In use" } }),
        ));
        let error = delete_asset(&mut api, Identifier::new(8).expect("id")).expect_err("fail");
        assert_eq!(error.to_string(), "In use");
        assert!(api.last_operation().starts_with("mutation { assets { deleteAsset(id: 8)"));
    }
}
