//! Plugin Discovery - 파일 시스템 기반 Discovery 구현
//!
//! 검색 경로에서 `<id>/plugin.json` 매니페스트를 해석하고,
//! 설치/활성 여부는 PluginStore에 위임합니다.
//! 원격 엔드포인트가 설정되면 메타데이터를 HTTP로 동기화합니다.

use super::manifest::{ExtensionPointMap, PluginManifest, PluginVersion};
use super::store::{InstalledPlugin, PluginStore};
use super::traits::{ComponentTable, Discovery, PluginComponent, PluginStatus, DEFAULT_COMPONENT};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, warn};

use moim_foundation::{Error, Result};

// ============================================================================
// DiscoveryConfig
// ============================================================================

/// 디스커버리 설정
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// 플러그인 검색 경로 (우선순위 순)
    pub plugin_dirs: Vec<PathBuf>,

    /// 원격 메타데이터 엔드포인트 (없으면 로컬 전용)
    pub remote_endpoint: Option<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        let mut plugin_dirs = vec![PathBuf::from(".moim").join("plugins")];

        if let Some(home) = dirs::home_dir() {
            plugin_dirs.push(home.join(".moim").join("plugins"));
        }

        Self {
            plugin_dirs,
            remote_endpoint: None,
        }
    }
}

// ============================================================================
// RegisteredComponent - 이름으로 참조되는 컴포넌트 핸들
// ============================================================================

/// 이름 기반 컴포넌트 핸들
///
/// 실제 렌더링은 셸이 담당하므로 로컬 디스커버리는 이름만 가진
/// 불투명 핸들을 해석합니다. 네이티브 훅이 필요한 호스트는
/// 자체 Discovery 구현을 주입합니다.
#[derive(Debug, Clone)]
pub struct RegisteredComponent {
    name: String,
    plugin_id: String,
}

impl RegisteredComponent {
    pub fn new(name: impl Into<String>, plugin_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plugin_id: plugin_id.into(),
        }
    }

    /// 기여 플러그인 ID
    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }
}

#[async_trait]
impl PluginComponent for RegisteredComponent {
    fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// LocalDiscovery
// ============================================================================

/// 파일 시스템 기반 Discovery
pub struct LocalDiscovery {
    /// 설정
    config: DiscoveryConfig,

    /// 설치 레코드 저장소
    store: Arc<PluginStore>,

    /// 원격 동기화용 HTTP 클라이언트
    http: reqwest::Client,
}

impl LocalDiscovery {
    /// 새 디스커버리 생성
    pub fn new(config: DiscoveryConfig, store: Arc<PluginStore>) -> Self {
        Self {
            config,
            store,
            http: reqwest::Client::new(),
        }
    }

    /// 설치 레코드 저장소 접근
    pub fn store(&self) -> &Arc<PluginStore> {
        &self.store
    }

    /// 플러그인 디렉토리 탐색 (plugin.json이 있는 첫 경로)
    fn find_plugin_dir(&self, plugin_id: &str) -> Option<PathBuf> {
        self.config
            .plugin_dirs
            .iter()
            .map(|dir| dir.join(plugin_id))
            .find(|dir| dir.join("plugin.json").exists())
    }

    fn remote_url(&self, endpoint: &str, plugin_id: &str) -> String {
        format!("{}/plugins/{}", endpoint.trim_end_matches('/'), plugin_id)
    }
}

#[async_trait]
impl Discovery for LocalDiscovery {
    fn is_plugin_installed(&self, plugin_id: &str) -> bool {
        self.store.contains(plugin_id)
    }

    fn is_plugin_activated(&self, plugin_id: &str) -> bool {
        self.store.is_enabled(plugin_id)
    }

    async fn load_plugin_manifest(&self, plugin_id: &str) -> Result<PluginManifest> {
        let dir = self.find_plugin_dir(plugin_id).ok_or_else(|| {
            Error::NotFound(format!("Plugin manifest not found: {}", plugin_id))
        })?;

        let manifest_path = dir.join("plugin.json");
        let content = fs::read_to_string(&manifest_path).await?;
        let file: PluginJsonFile = serde_json::from_str(&content)?;

        debug!("Loaded manifest for plugin {} from {:?}", plugin_id, dir);
        Ok(file.into_manifest())
    }

    async fn load_plugin_components(
        &self,
        plugin_id: &str,
        manifest: &PluginManifest,
    ) -> Result<ComponentTable> {
        if self.find_plugin_dir(plugin_id).is_none() {
            return Err(Error::NotFound(format!(
                "Plugin directory not found: {}",
                plugin_id
            )));
        }

        let mut table: ComponentTable = ComponentTable::new();

        let default_name = manifest
            .main
            .clone()
            .unwrap_or_else(|| manifest.name.clone());
        table.insert(
            DEFAULT_COMPONENT.to_string(),
            Arc::new(RegisteredComponent::new(default_name, plugin_id)),
        );

        for entries in manifest.extension_points.values() {
            for entry in entries {
                if let Some(name) = entry.component_name() {
                    table.insert(
                        name.to_string(),
                        Arc::new(RegisteredComponent::new(name, plugin_id)),
                    );
                }
            }
        }

        debug!(
            "Resolved {} component(s) for plugin {}",
            table.len(),
            plugin_id
        );
        Ok(table)
    }

    async fn sync_plugin_metadata(&self, plugin_id: &str) -> Result<()> {
        let manifest = self.load_plugin_manifest(plugin_id).await?;
        let dir = self
            .find_plugin_dir(plugin_id)
            .unwrap_or_else(|| PathBuf::from(plugin_id));

        // 기존 레코드의 활성 상태는 유지
        let enabled = self
            .store
            .get(plugin_id)
            .map(|p| p.enabled)
            .unwrap_or(true);

        let mut record = InstalledPlugin::new(plugin_id, manifest.version.to_string(), dir)
            .with_name(manifest.name.clone())
            .with_description(manifest.description.clone());
        if let Some(author) = &manifest.author {
            record = record.with_author(author.clone());
        }
        if !enabled {
            record = record.disabled();
        }
        self.store.record_install(record).await?;

        if let Some(endpoint) = &self.config.remote_endpoint {
            let url = self.remote_url(endpoint, plugin_id);
            let response = self
                .http
                .put(&url)
                .json(&manifest)
                .send()
                .await
                .map_err(|e| Error::Http(e.to_string()))?;

            if !response.status().is_success() {
                return Err(Error::Http(format!(
                    "HTTP {} syncing plugin {}",
                    response.status(),
                    plugin_id
                )));
            }
        }

        Ok(())
    }

    async fn remove_plugin_metadata(&self, plugin_id: &str) -> Result<()> {
        if self.store.record_uninstall(plugin_id).await?.is_none() {
            warn!("Plugin {} had no install record", plugin_id);
        }

        if let Some(endpoint) = &self.config.remote_endpoint {
            let url = self.remote_url(endpoint, plugin_id);
            let response = self
                .http
                .delete(&url)
                .send()
                .await
                .map_err(|e| Error::Http(e.to_string()))?;

            if !response.status().is_success() {
                return Err(Error::Http(format!(
                    "HTTP {} removing plugin {}",
                    response.status(),
                    plugin_id
                )));
            }
        }

        Ok(())
    }

    async fn update_plugin_status(&self, plugin_id: &str, status: PluginStatus) -> Result<()> {
        let enabled = status == PluginStatus::Active;

        if !self.store.set_enabled(plugin_id, enabled).await? {
            return Err(Error::NotFound(format!(
                "Plugin {} is not installed",
                plugin_id
            )));
        }

        if let Some(endpoint) = &self.config.remote_endpoint {
            let url = self.remote_url(endpoint, plugin_id);
            let response = self
                .http
                .patch(&url)
                .json(&json!({ "status": status.to_string() }))
                .send()
                .await
                .map_err(|e| Error::Http(e.to_string()))?;

            if !response.status().is_success() {
                return Err(Error::Http(format!(
                    "HTTP {} updating status of plugin {}",
                    response.status(),
                    plugin_id
                )));
            }
        }

        Ok(())
    }
}

// ============================================================================
// PluginJsonFile - plugin.json 파일 구조
// ============================================================================

/// plugin.json 파일 구조
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PluginJsonFile {
    /// 플러그인 ID
    pub plugin_id: String,

    /// 플러그인 이름
    pub name: String,

    /// 버전 문자열 (예: "1.0.0")
    pub version: String,

    /// 설명
    #[serde(default)]
    pub description: String,

    /// 작성자
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// 엔트리 포인트
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,

    /// 확장 포인트
    #[serde(default)]
    pub extension_points: ExtensionPointMap,
}

impl PluginJsonFile {
    /// PluginManifest로 변환
    fn into_manifest(self) -> PluginManifest {
        let version = PluginVersion::parse(&self.version).unwrap_or_default();

        let mut manifest = PluginManifest::new(self.plugin_id, self.name)
            .with_version(version)
            .with_description(self.description);

        if let Some(author) = self.author {
            manifest = manifest.with_author(author);
        }
        if let Some(main) = self.main {
            manifest = manifest.with_main(main);
        }
        manifest.extension_points = self.extension_points;

        manifest
    }
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::manifest::ExtensionPointType;
    use std::path::Path;
    use tempfile::TempDir;

    async fn write_test_plugin(dir: &Path, plugin_id: &str) {
        let plugin_dir = dir.join(plugin_id);
        fs::create_dir_all(&plugin_dir).await.unwrap();

        let manifest = format!(
            r#"{{
            "pluginId": "{}",
            "name": "Event Photos",
            "version": "1.2.0",
            "description": "Photo galleries for events",
            "author": "Moim Team",
            "main": "PhotoRoot",
            "extensionPoints": {{
                "adminOrgRoute": [
                    {{ "path": "/admin/photos", "component": "PhotoAdmin" }}
                ],
                "g1": [
                    {{ "injector": "PhotoWidget", "target": "orgDashboard", "order": 1 }}
                ]
            }}
        }}"#,
            plugin_id
        );

        fs::write(plugin_dir.join("plugin.json"), manifest)
            .await
            .unwrap();
    }

    async fn test_discovery() -> (LocalDiscovery, TempDir) {
        let temp = TempDir::new().unwrap();
        let plugins_dir = temp.path().join("plugins");
        fs::create_dir_all(&plugins_dir).await.unwrap();

        let store = Arc::new(PluginStore::new(temp.path().join("store")));
        let config = DiscoveryConfig {
            plugin_dirs: vec![plugins_dir],
            remote_endpoint: None,
        };

        (LocalDiscovery::new(config, store), temp)
    }

    #[tokio::test]
    async fn test_load_manifest() {
        let (discovery, temp) = test_discovery().await;
        write_test_plugin(&temp.path().join("plugins"), "eventPhotos").await;

        let manifest = discovery.load_plugin_manifest("eventPhotos").await.unwrap();

        assert_eq!(manifest.plugin_id, "eventPhotos");
        assert_eq!(manifest.name, "Event Photos");
        assert_eq!(manifest.version.to_string(), "1.2.0");
        assert_eq!(manifest.main.as_deref(), Some("PhotoRoot"));
        assert_eq!(manifest.extension_points.len(), 2);
        assert!(manifest
            .extension_points
            .contains_key(&ExtensionPointType::AdminOrgRoute));
    }

    #[tokio::test]
    async fn test_load_manifest_not_found() {
        let (discovery, _temp) = test_discovery().await;

        let result = discovery.load_plugin_manifest("missing").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_components() {
        let (discovery, temp) = test_discovery().await;
        write_test_plugin(&temp.path().join("plugins"), "eventPhotos").await;

        let manifest = discovery.load_plugin_manifest("eventPhotos").await.unwrap();
        let components = discovery
            .load_plugin_components("eventPhotos", &manifest)
            .await
            .unwrap();

        // default + PhotoAdmin + PhotoWidget
        assert_eq!(components.len(), 3);
        assert_eq!(components[DEFAULT_COMPONENT].name(), "PhotoRoot");
        assert!(components.contains_key("PhotoAdmin"));
        assert!(components.contains_key("PhotoWidget"));
    }

    #[tokio::test]
    async fn test_installed_and_activated_delegate_to_store() {
        let (discovery, _temp) = test_discovery().await;

        assert!(!discovery.is_plugin_installed("eventPhotos"));
        assert!(!discovery.is_plugin_activated("eventPhotos"));

        let record = InstalledPlugin::new(
            "eventPhotos",
            "1.2.0",
            discovery.store().plugin_dir("eventPhotos"),
        );
        discovery.store().record_install(record).await.unwrap();

        assert!(discovery.is_plugin_installed("eventPhotos"));
        assert!(discovery.is_plugin_activated("eventPhotos"));
    }

    #[tokio::test]
    async fn test_sync_upserts_store_record() {
        let (discovery, temp) = test_discovery().await;
        write_test_plugin(&temp.path().join("plugins"), "eventPhotos").await;

        discovery.sync_plugin_metadata("eventPhotos").await.unwrap();

        let record = discovery.store().get("eventPhotos").unwrap();
        assert_eq!(record.name, "Event Photos");
        assert_eq!(record.version, "1.2.0");
        assert!(record.enabled);
    }

    #[tokio::test]
    async fn test_sync_preserves_disabled_state() {
        let (discovery, temp) = test_discovery().await;
        write_test_plugin(&temp.path().join("plugins"), "eventPhotos").await;

        let record = InstalledPlugin::new(
            "eventPhotos",
            "1.0.0",
            discovery.store().plugin_dir("eventPhotos"),
        )
        .disabled();
        discovery.store().record_install(record).await.unwrap();

        discovery.sync_plugin_metadata("eventPhotos").await.unwrap();

        let record = discovery.store().get("eventPhotos").unwrap();
        assert_eq!(record.version, "1.2.0");
        assert!(!record.enabled);
    }

    #[tokio::test]
    async fn test_update_plugin_status() {
        let (discovery, _temp) = test_discovery().await;

        let record = InstalledPlugin::new(
            "eventPhotos",
            "1.2.0",
            discovery.store().plugin_dir("eventPhotos"),
        );
        discovery.store().record_install(record).await.unwrap();

        discovery
            .update_plugin_status("eventPhotos", PluginStatus::Inactive)
            .await
            .unwrap();
        assert!(!discovery.is_plugin_activated("eventPhotos"));

        discovery
            .update_plugin_status("eventPhotos", PluginStatus::Active)
            .await
            .unwrap();
        assert!(discovery.is_plugin_activated("eventPhotos"));

        // 미설치 플러그인 상태 갱신은 에러
        assert!(discovery
            .update_plugin_status("missing", PluginStatus::Active)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_remove_plugin_metadata() {
        let (discovery, _temp) = test_discovery().await;

        let record = InstalledPlugin::new(
            "eventPhotos",
            "1.2.0",
            discovery.store().plugin_dir("eventPhotos"),
        );
        discovery.store().record_install(record).await.unwrap();

        discovery
            .remove_plugin_metadata("eventPhotos")
            .await
            .unwrap();
        assert!(!discovery.is_plugin_installed("eventPhotos"));
    }
}
