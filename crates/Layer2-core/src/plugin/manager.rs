//! Plugin Manager - 플러그인 라이프사이클 관리
//!
//! 로드/언로드/활성/비활성/설치/제거 전이를 조율합니다.
//! 공개 API는 실패를 bool 반환 + 로깅으로만 알리며 절대 throw하지 않습니다.
//! I/O는 전부 주입된 `Discovery`를 통해 수행하고, 동일 plugin_id에 대한
//! 동시 호출 직렬화는 호출자 책임입니다.

use super::events::{self, EventManager};
use super::manifest::PluginManifest;
use super::registry::ExtensionRegistryManager;
use super::traits::{ComponentTable, Discovery, PluginComponent, PluginStatus, DEFAULT_COMPONENT};
use moim_foundation::{is_valid_plugin_id, Result};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

// ============================================================================
// LifecycleConfig
// ============================================================================

/// 라이프사이클 매니저 설정
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// 플러그인 자산 디렉토리 삭제 요청의 베이스 URL
    pub asset_base_url: String,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            asset_base_url: "http://localhost:4321".to_string(),
        }
    }
}

// ============================================================================
// LoadedPlugin - 로드된 플러그인 행
// ============================================================================

/// 로드된 플러그인 런타임 레코드
#[derive(Clone)]
pub struct LoadedPlugin {
    /// 플러그인 ID
    pub plugin_id: String,

    /// 매니페스트 (로드 이후 불변)
    pub manifest: PluginManifest,

    /// 해석된 컴포넌트 테이블
    pub components: ComponentTable,

    /// 현재 상태
    pub status: PluginStatus,

    /// 로드 실패 메시지
    pub error_message: Option<String>,
}

impl std::fmt::Debug for LoadedPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedPlugin")
            .field("plugin_id", &self.plugin_id)
            .field("version", &self.manifest.version.to_string())
            .field("component_count", &self.components.len())
            .field("status", &self.status)
            .field("error_message", &self.error_message)
            .finish()
    }
}

// ============================================================================
// LifecycleHook - 선택적 훅 식별자
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum LifecycleHook {
    Install,
    Activate,
    Deactivate,
    Uninstall,
}

impl std::fmt::Display for LifecycleHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Install => write!(f, "on_install"),
            Self::Activate => write!(f, "on_activate"),
            Self::Deactivate => write!(f, "on_deactivate"),
            Self::Uninstall => write!(f, "on_uninstall"),
        }
    }
}

// ============================================================================
// LifecycleManager
// ============================================================================

/// 라이프사이클 매니저 - 플러그인 테이블과 상태 머신 소유
pub struct LifecycleManager {
    /// 디스커버리 (매니페스트/컴포넌트 해석 + 원격 동기화)
    discovery: Arc<dyn Discovery>,

    /// 확장 포인트 레지스트리
    registry: Arc<ExtensionRegistryManager>,

    /// 이벤트 매니저
    events: Arc<EventManager>,

    /// 로드된 플러그인 테이블 (ID -> LoadedPlugin)
    plugins: RwLock<HashMap<String, LoadedPlugin>>,

    /// 자산 삭제용 HTTP 클라이언트
    http: reqwest::Client,

    /// 설정
    config: LifecycleConfig,
}

impl LifecycleManager {
    /// 새 매니저 생성
    pub fn new(discovery: Arc<dyn Discovery>) -> Self {
        Self::with_config(discovery, LifecycleConfig::default())
    }

    /// 설정으로 생성
    pub fn with_config(discovery: Arc<dyn Discovery>, config: LifecycleConfig) -> Self {
        Self {
            discovery,
            registry: Arc::new(ExtensionRegistryManager::new()),
            events: Arc::new(EventManager::new()),
            plugins: RwLock::new(HashMap::new()),
            http: reqwest::Client::new(),
            config,
        }
    }

    fn check_plugin_id(plugin_id: &str) -> bool {
        if is_valid_plugin_id(plugin_id) {
            true
        } else {
            error!("Invalid plugin id: {:?}", plugin_id);
            false
        }
    }

    // ========================================================================
    // 플러그인 로드/언로드
    // ========================================================================

    /// 플러그인 로드
    ///
    /// 설치되지 않은 플러그인은 테이블 행 없이 건너뜁니다.
    /// 매니페스트/컴포넌트 해석 또는 원격 동기화가 실패하면 합성
    /// 매니페스트(버전 0.0.0)의 ERROR 행을 기록하고 `plugin:error`를
    /// 발행합니다. 전 단계 성공 시에만 `true`를 반환합니다.
    pub async fn load_plugin(&self, plugin_id: &str) -> bool {
        if !Self::check_plugin_id(plugin_id) {
            return false;
        }

        if !self.discovery.is_plugin_installed(plugin_id) {
            warn!("Plugin {} is not installed, skipping load", plugin_id);
            return false;
        }

        info!("Loading plugin: {}", plugin_id);

        match self.load_plugin_inner(plugin_id).await {
            Ok(()) => {
                self.events
                    .emit(events::PLUGIN_LOADED, &json!({ "plugin_id": plugin_id }));
                info!("Plugin {} loaded successfully", plugin_id);
                true
            }
            Err(e) => {
                error!("Failed to load plugin {}: {}", plugin_id, e);

                let row = LoadedPlugin {
                    plugin_id: plugin_id.to_string(),
                    manifest: PluginManifest::placeholder(plugin_id),
                    components: HashMap::new(),
                    status: PluginStatus::Error,
                    error_message: Some(e.to_string()),
                };
                self.plugins.write().await.insert(plugin_id.to_string(), row);

                self.events.emit(
                    events::PLUGIN_ERROR,
                    &json!({ "plugin_id": plugin_id, "error": e.to_string() }),
                );
                false
            }
        }
    }

    async fn load_plugin_inner(&self, plugin_id: &str) -> Result<()> {
        let manifest = self.discovery.load_plugin_manifest(plugin_id).await?;
        let components = self
            .discovery
            .load_plugin_components(plugin_id, &manifest)
            .await?;

        let status = if self.discovery.is_plugin_activated(plugin_id) {
            PluginStatus::Active
        } else {
            PluginStatus::Inactive
        };

        let row = LoadedPlugin {
            plugin_id: plugin_id.to_string(),
            manifest: manifest.clone(),
            components,
            status,
            error_message: None,
        };
        self.plugins.write().await.insert(plugin_id.to_string(), row);

        if status == PluginStatus::Active {
            self.registry.register_extension_points(plugin_id, &manifest);
        }

        self.discovery.sync_plugin_metadata(plugin_id).await?;

        Ok(())
    }

    /// 플러그인 언로드
    ///
    /// 레지스트리/테이블 정리 후 원격 메타데이터를 제거합니다.
    /// 원격 제거 실패만이 언로드를 실패시키며, 자산 디렉토리 삭제는
    /// best-effort입니다 (실패 시 warning 로그만).
    pub async fn unload_plugin(&self, plugin_id: &str) -> bool {
        if !Self::check_plugin_id(plugin_id) {
            return false;
        }

        if !self.plugins.read().await.contains_key(plugin_id) {
            warn!("Plugin {} is not loaded, skipping unload", plugin_id);
            return false;
        }

        info!("Unloading plugin: {}", plugin_id);

        self.registry.unregister_extension_points(plugin_id);
        self.plugins.write().await.remove(plugin_id);

        if let Err(e) = self.discovery.remove_plugin_metadata(plugin_id).await {
            error!(
                "Failed to remove plugin {} from the remote store: {}",
                plugin_id, e
            );
            return false;
        }

        self.delete_plugin_assets(plugin_id).await;

        self.events
            .emit(events::PLUGIN_UNLOADED, &json!({ "plugin_id": plugin_id }));
        info!("Plugin {} unloaded", plugin_id);
        true
    }

    /// 플러그인 자산 디렉토리 삭제 요청 (best-effort)
    async fn delete_plugin_assets(&self, plugin_id: &str) {
        let url = format!(
            "{}/src/plugin/available/{}",
            self.config.asset_base_url.trim_end_matches('/'),
            plugin_id
        );

        match self.http.delete(&url).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Deleted plugin assets for {}", plugin_id);
            }
            Ok(response) => {
                warn!(
                    "Failed to delete plugin assets for {}: HTTP {}",
                    plugin_id,
                    response.status()
                );
            }
            Err(e) => {
                warn!("Failed to delete plugin assets for {}: {}", plugin_id, e);
            }
        }
    }

    // ========================================================================
    // 플러그인 활성화/비활성화
    // ========================================================================

    /// 플러그인 활성화
    ///
    /// 원격 상태 갱신 실패만이 전환을 중단시킵니다. 훅 호출과
    /// 컴포넌트 리프레시는 best-effort입니다.
    pub async fn activate_plugin(&self, plugin_id: &str) -> bool {
        if !Self::check_plugin_id(plugin_id) {
            return false;
        }

        let manifest = {
            let plugins = self.plugins.read().await;
            match plugins.get(plugin_id) {
                Some(plugin) => plugin.manifest.clone(),
                None => {
                    error!("Plugin {} is not loaded", plugin_id);
                    return false;
                }
            }
        };

        self.call_lifecycle_hook(plugin_id, LifecycleHook::Activate)
            .await;

        if let Err(e) = self
            .discovery
            .update_plugin_status(plugin_id, PluginStatus::Active)
            .await
        {
            error!("Failed to update status for plugin {}: {}", plugin_id, e);
            return false;
        }

        {
            let mut plugins = self.plugins.write().await;
            if let Some(plugin) = plugins.get_mut(plugin_id) {
                plugin.status = PluginStatus::Active;
            }
        }

        self.registry.register_extension_points(plugin_id, &manifest);
        self.refresh_plugin_components(plugin_id, &manifest).await;

        self.events
            .emit(events::PLUGIN_ACTIVATED, &json!({ "plugin_id": plugin_id }));
        self.events.emit(
            events::PLUGIN_STATUS_CHANGED,
            &json!({ "plugin_id": plugin_id, "status": PluginStatus::Active.to_string() }),
        );

        info!("Plugin {} activated", plugin_id);
        true
    }

    /// 플러그인 비활성화
    pub async fn deactivate_plugin(&self, plugin_id: &str) -> bool {
        if !Self::check_plugin_id(plugin_id) {
            return false;
        }

        if !self.plugins.read().await.contains_key(plugin_id) {
            error!("Plugin {} is not loaded", plugin_id);
            return false;
        }

        self.call_lifecycle_hook(plugin_id, LifecycleHook::Deactivate)
            .await;

        if let Err(e) = self
            .discovery
            .update_plugin_status(plugin_id, PluginStatus::Inactive)
            .await
        {
            error!("Failed to update status for plugin {}: {}", plugin_id, e);
            return false;
        }

        {
            let mut plugins = self.plugins.write().await;
            if let Some(plugin) = plugins.get_mut(plugin_id) {
                plugin.status = PluginStatus::Inactive;
            }
        }

        self.registry.unregister_extension_points(plugin_id);

        self.events.emit(
            events::PLUGIN_DEACTIVATED,
            &json!({ "plugin_id": plugin_id }),
        );
        self.events.emit(
            events::PLUGIN_STATUS_CHANGED,
            &json!({ "plugin_id": plugin_id, "status": PluginStatus::Inactive.to_string() }),
        );

        info!("Plugin {} deactivated", plugin_id);
        true
    }

    /// 상태 문자열로 활성/비활성 전환
    ///
    /// `"active"` 외의 모든 값은 비활성화 경로로 떨어집니다.
    pub async fn toggle_plugin_status(&self, plugin_id: &str, status: &str) -> bool {
        if status == "active" {
            self.activate_plugin(plugin_id).await
        } else {
            self.deactivate_plugin(plugin_id).await
        }
    }

    /// 활성화 후 동적으로 기여된 컴포넌트 재해석 (best-effort)
    async fn refresh_plugin_components(&self, plugin_id: &str, manifest: &PluginManifest) {
        match self
            .discovery
            .load_plugin_components(plugin_id, manifest)
            .await
        {
            Ok(components) => {
                let mut plugins = self.plugins.write().await;
                if let Some(plugin) = plugins.get_mut(plugin_id) {
                    plugin.components = components;
                }
            }
            Err(e) => {
                warn!(
                    "Failed to refresh components for plugin {}: {}",
                    plugin_id, e
                );
            }
        }
    }

    // ========================================================================
    // 플러그인 설치/제거
    // ========================================================================

    /// 플러그인 설치
    ///
    /// 이미 로드된 플러그인이면 `on_install` 훅만 다시 호출합니다
    /// (멱등 재설치). 신규 설치는 설치 여부 게이트 없이 매니페스트와
    /// 컴포넌트를 직접 로드하며, 실패 시 ERROR 행을 만들지 않습니다.
    pub async fn install_plugin(&self, plugin_id: &str) -> bool {
        if !Self::check_plugin_id(plugin_id) {
            return false;
        }

        if self.plugins.read().await.contains_key(plugin_id) {
            self.call_lifecycle_hook(plugin_id, LifecycleHook::Install)
                .await;
            self.events
                .emit(events::PLUGIN_INSTALLED, &json!({ "plugin_id": plugin_id }));
            info!("Plugin {} re-installed", plugin_id);
            return true;
        }

        info!("Installing plugin: {}", plugin_id);

        let manifest = match self.discovery.load_plugin_manifest(plugin_id).await {
            Ok(manifest) => manifest,
            Err(e) => {
                error!("Failed to install plugin {}: {}", plugin_id, e);
                return false;
            }
        };

        let components = match self
            .discovery
            .load_plugin_components(plugin_id, &manifest)
            .await
        {
            Ok(components) => components,
            Err(e) => {
                error!("Failed to install plugin {}: {}", plugin_id, e);
                return false;
            }
        };

        let row = LoadedPlugin {
            plugin_id: plugin_id.to_string(),
            manifest,
            components,
            status: PluginStatus::Inactive,
            error_message: None,
        };
        self.plugins.write().await.insert(plugin_id.to_string(), row);

        self.call_lifecycle_hook(plugin_id, LifecycleHook::Install)
            .await;

        self.events
            .emit(events::PLUGIN_INSTALLED, &json!({ "plugin_id": plugin_id }));
        info!("Plugin {} installed", plugin_id);
        true
    }

    /// 플러그인 제거
    ///
    /// `on_uninstall` 훅 호출 후 내부적으로 언로드합니다. 언로드 결과와
    /// 무관하게 제거 시퀀스가 완료되면 `true`를 반환합니다 (원격 정리
    /// 성공 여부는 반환값에 반영되지 않음).
    pub async fn uninstall_plugin(&self, plugin_id: &str) -> bool {
        if !Self::check_plugin_id(plugin_id) {
            return false;
        }

        if !self.plugins.read().await.contains_key(plugin_id) {
            error!("Plugin {} is not loaded", plugin_id);
            return false;
        }

        info!("Uninstalling plugin: {}", plugin_id);

        self.call_lifecycle_hook(plugin_id, LifecycleHook::Uninstall)
            .await;

        let _ = self.unload_plugin(plugin_id).await;

        self.events.emit(
            events::PLUGIN_UNINSTALLED,
            &json!({ "plugin_id": plugin_id }),
        );
        info!("Plugin {} uninstalled", plugin_id);
        true
    }

    // ========================================================================
    // 라이프사이클 훅
    // ========================================================================

    /// `default` 컴포넌트의 선택적 훅 호출 (best-effort)
    async fn call_lifecycle_hook(&self, plugin_id: &str, hook: LifecycleHook) {
        let component = {
            let plugins = self.plugins.read().await;
            plugins
                .get(plugin_id)
                .and_then(|plugin| plugin.components.get(DEFAULT_COMPONENT).cloned())
        };

        let Some(component) = component else {
            return;
        };

        let result = match hook {
            LifecycleHook::Install => component.on_install().await,
            LifecycleHook::Activate => component.on_activate().await,
            LifecycleHook::Deactivate => component.on_deactivate().await,
            LifecycleHook::Uninstall => component.on_uninstall().await,
        };

        if let Err(e) = result {
            error!(
                "Error calling {} lifecycle hook for plugin {}: {}",
                hook, plugin_id, e
            );
        }
    }

    // ========================================================================
    // 접근자
    // ========================================================================

    /// 확장 포인트 레지스트리 접근
    pub fn registry(&self) -> &Arc<ExtensionRegistryManager> {
        &self.registry
    }

    /// 이벤트 매니저 접근
    pub fn events(&self) -> &Arc<EventManager> {
        &self.events
    }

    /// 로드된 플러그인 조회
    pub async fn loaded_plugin(&self, plugin_id: &str) -> Option<LoadedPlugin> {
        self.plugins.read().await.get(plugin_id).cloned()
    }

    /// 활성 플러그인의 컴포넌트 조회
    ///
    /// INACTIVE/ERROR 플러그인의 컴포넌트는 이 접근자로 노출되지 않습니다.
    pub async fn plugin_component(
        &self,
        plugin_id: &str,
        component_name: &str,
    ) -> Option<Arc<dyn PluginComponent>> {
        let plugins = self.plugins.read().await;
        let plugin = plugins.get(plugin_id)?;

        if plugin.status != PluginStatus::Active {
            return None;
        }
        plugin.components.get(component_name).cloned()
    }

    /// 로드된 플러그인 수
    pub async fn plugin_count(&self) -> usize {
        self.plugins.read().await.len()
    }

    /// 활성 플러그인 수
    pub async fn active_plugin_count(&self) -> usize {
        self.plugins
            .read()
            .await
            .values()
            .filter(|plugin| plugin.status == PluginStatus::Active)
            .count()
    }

    /// 로드된 플러그인 목록
    pub async fn loaded_plugins(&self) -> Vec<LoadedPlugin> {
        self.plugins.read().await.values().cloned().collect()
    }
}

// ============================================================================
// 테스트
// ============================================================================
