//! Plugin Store - 플러그인 설치 정보 관리
//!
//! installed.json을 통해 설치된 플러그인 목록을 관리합니다.
//! 캐시 조회는 동기식이라 Discovery의 설치/활성 여부 프로브에
//! 그대로 쓰입니다.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use moim_foundation::Result;

// ============================================================================
// InstalledPlugin - 설치된 플러그인 정보
// ============================================================================

/// 설치된 플러그인 정보
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledPlugin {
    /// 플러그인 ID
    pub id: String,

    /// 플러그인 이름
    pub name: String,

    /// 버전
    pub version: String,

    /// 설치 시간
    pub installed_at: DateTime<Utc>,

    /// 활성화 여부
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// 설치 경로
    pub path: PathBuf,

    /// 설명
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 작성자
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

fn default_true() -> bool {
    true
}

impl InstalledPlugin {
    /// 새 InstalledPlugin 생성
    pub fn new(
        id: impl Into<String>,
        version: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            version: version.into(),
            installed_at: Utc::now(),
            enabled: true,
            path: path.into(),
            description: None,
            author: None,
        }
    }

    /// 이름 설정
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 설명 설정
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// 작성자 설정
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// 비활성 상태로 설정
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

// ============================================================================
// InstalledPluginsFile - installed.json 구조
// ============================================================================

/// installed.json 파일 구조
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstalledPluginsFile {
    /// 파일 버전
    #[serde(default = "default_version")]
    pub version: String,

    /// 설치된 플러그인 목록
    #[serde(default)]
    pub plugins: Vec<InstalledPlugin>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for InstalledPluginsFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            plugins: Vec::new(),
        }
    }
}

// ============================================================================
// PluginStore - 설치 레코드 저장소
// ============================================================================

/// 플러그인 저장소 - installed.json 관리
pub struct PluginStore {
    /// 기본 디렉토리 (~/.moim/plugins)
    base_dir: PathBuf,

    /// installed.json 캐시 (동기 조회용)
    cache: RwLock<InstalledPluginsFile>,
}

impl PluginStore {
    /// 새 저장소 생성
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            cache: RwLock::new(InstalledPluginsFile::default()),
        }
    }

    /// 사용자 홈 디렉토리 기반으로 생성
    pub fn user_store() -> Option<Self> {
        dirs::home_dir().map(|home| Self::new(home.join(".moim").join("plugins")))
    }

    /// 기본 디렉토리 경로
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// installed.json 경로
    fn installed_file(&self) -> PathBuf {
        self.base_dir.join("installed.json")
    }

    /// 플러그인 디렉토리 경로
    pub fn plugin_dir(&self, id: &str) -> PathBuf {
        self.base_dir.join(id)
    }

    // ========================================================================
    // 로드 / 저장
    // ========================================================================

    /// installed.json 로드
    pub async fn load(&self) -> Result<()> {
        let path = self.installed_file();

        if !path.exists() {
            debug!("installed.json not found at {:?}, using empty", path);
            return Ok(());
        }

        let content = fs::read_to_string(&path).await?;
        let file: InstalledPluginsFile = serde_json::from_str(&content)?;

        let count = file.plugins.len();
        *self.cache.write() = file;

        info!("Loaded {} installed plugins", count);
        Ok(())
    }

    /// installed.json 저장
    pub async fn save(&self) -> Result<()> {
        if !self.base_dir.exists() {
            fs::create_dir_all(&self.base_dir).await?;
        }

        let path = self.installed_file();
        let content = {
            let cache = self.cache.read();
            serde_json::to_string_pretty(&*cache)?
        };

        fs::write(&path, content).await?;

        debug!("Saved installed.json");
        Ok(())
    }

    // ========================================================================
    // 플러그인 관리
    // ========================================================================

    /// 설치된 플러그인 목록
    pub fn list(&self) -> Vec<InstalledPlugin> {
        self.cache.read().plugins.clone()
    }

    /// 활성화된 플러그인만
    pub fn list_enabled(&self) -> Vec<InstalledPlugin> {
        self.cache
            .read()
            .plugins
            .iter()
            .filter(|p| p.enabled)
            .cloned()
            .collect()
    }

    /// ID로 플러그인 조회
    pub fn get(&self, id: &str) -> Option<InstalledPlugin> {
        self.cache.read().plugins.iter().find(|p| p.id == id).cloned()
    }

    /// 플러그인 존재 여부
    pub fn contains(&self, id: &str) -> bool {
        self.cache.read().plugins.iter().any(|p| p.id == id)
    }

    /// 플러그인 활성화 여부
    pub fn is_enabled(&self, id: &str) -> bool {
        self.cache
            .read()
            .plugins
            .iter()
            .any(|p| p.id == id && p.enabled)
    }

    /// 플러그인 설치 기록
    pub async fn record_install(&self, plugin: InstalledPlugin) -> Result<()> {
        {
            let mut cache = self.cache.write();

            // 이미 존재하면 업데이트
            if let Some(existing) = cache.plugins.iter_mut().find(|p| p.id == plugin.id) {
                info!("Updating plugin: {} -> v{}", plugin.id, plugin.version);
                *existing = plugin;
            } else {
                info!("Installing plugin: {} v{}", plugin.id, plugin.version);
                cache.plugins.push(plugin);
            }
        }

        self.save().await
    }

    /// 플러그인 제거 기록
    pub async fn record_uninstall(&self, id: &str) -> Result<Option<InstalledPlugin>> {
        let removed = {
            let mut cache = self.cache.write();
            let index = cache.plugins.iter().position(|p| p.id == id);

            if let Some(idx) = index {
                let removed = cache.plugins.remove(idx);
                info!("Uninstalled plugin: {}", id);
                Some(removed)
            } else {
                warn!("Plugin not found for uninstall: {}", id);
                None
            }
        };

        if removed.is_some() {
            self.save().await?;
        }

        Ok(removed)
    }

    /// 플러그인 활성화 상태 변경
    pub async fn set_enabled(&self, id: &str, enabled: bool) -> Result<bool> {
        let updated = {
            let mut cache = self.cache.write();

            if let Some(plugin) = cache.plugins.iter_mut().find(|p| p.id == id) {
                plugin.enabled = enabled;
                info!(
                    "Plugin {} {}",
                    id,
                    if enabled { "enabled" } else { "disabled" }
                );
                true
            } else {
                false
            }
        };

        if updated {
            self.save().await?;
        }

        Ok(updated)
    }

    /// 플러그인 수
    pub fn len(&self) -> usize {
        self.cache.read().plugins.len()
    }

    /// 비어있는지 확인
    pub fn is_empty(&self) -> bool {
        self.cache.read().plugins.is_empty()
    }
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (PluginStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = PluginStore::new(temp.path().join("plugins"));
        (store, temp)
    }

    #[tokio::test]
    async fn test_empty_store() {
        let (store, _temp) = test_store();
        assert!(store.is_empty());
        assert!(store.list().is_empty());
        assert!(!store.contains("anything"));
    }

    #[tokio::test]
    async fn test_record_install() {
        let (store, _temp) = test_store();

        let plugin =
            InstalledPlugin::new("eventPhotos", "1.0.0", store.plugin_dir("eventPhotos"));
        store.record_install(plugin).await.unwrap();

        assert!(store.contains("eventPhotos"));
        assert!(store.is_enabled("eventPhotos"));
        assert_eq!(store.get("eventPhotos").unwrap().version, "1.0.0");
    }

    #[tokio::test]
    async fn test_record_uninstall() {
        let (store, _temp) = test_store();

        let plugin =
            InstalledPlugin::new("eventPhotos", "1.0.0", store.plugin_dir("eventPhotos"));
        store.record_install(plugin).await.unwrap();

        let removed = store.record_uninstall("eventPhotos").await.unwrap();
        assert!(removed.is_some());
        assert!(!store.contains("eventPhotos"));

        let removed_again = store.record_uninstall("eventPhotos").await.unwrap();
        assert!(removed_again.is_none());
    }

    #[tokio::test]
    async fn test_set_enabled() {
        let (store, _temp) = test_store();

        let plugin =
            InstalledPlugin::new("eventPhotos", "1.0.0", store.plugin_dir("eventPhotos"));
        store.record_install(plugin).await.unwrap();

        assert_eq!(store.list_enabled().len(), 1);

        store.set_enabled("eventPhotos", false).await.unwrap();
        assert!(store.list_enabled().is_empty());
        assert!(!store.is_enabled("eventPhotos"));

        store.set_enabled("eventPhotos", true).await.unwrap();
        assert_eq!(store.list_enabled().len(), 1);

        // 미설치 플러그인은 false
        assert!(!store.set_enabled("missing", true).await.unwrap());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (store, _temp) = test_store();

        let plugin =
            InstalledPlugin::new("eventPhotos", "1.0.0", store.plugin_dir("eventPhotos"))
                .with_name("Event Photos")
                .with_description("Photo galleries for events")
                .with_author("Moim Team");
        store.record_install(plugin).await.unwrap();

        // 새 store 인스턴스로 로드
        let store2 = PluginStore::new(store.base_dir());
        store2.load().await.unwrap();

        let retrieved = store2.get("eventPhotos").unwrap();
        assert_eq!(retrieved.name, "Event Photos");
        assert_eq!(
            retrieved.description,
            Some("Photo galleries for events".to_string())
        );
        assert_eq!(retrieved.author, Some("Moim Team".to_string()));
    }

    #[tokio::test]
    async fn test_update_existing() {
        let (store, _temp) = test_store();

        let plugin =
            InstalledPlugin::new("eventPhotos", "1.0.0", store.plugin_dir("eventPhotos"));
        store.record_install(plugin).await.unwrap();

        let update = InstalledPlugin::new("eventPhotos", "2.0.0", store.plugin_dir("eventPhotos"));
        store.record_install(update).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("eventPhotos").unwrap().version, "2.0.0");
    }
}
