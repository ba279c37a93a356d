//! moim-core: Core Runtime for Moim
//!
//! Layer2 - 플러그인 호스트 레이어
//!
//! # 주요 모듈
//!
//! - `plugin`: Plugin 라이프사이클 / 확장 레지스트리 / 이벤트 시스템
//!
//! # 사용 예시
//!
//! ```ignore
//! use moim_core::{DiscoveryConfig, LifecycleManager, LocalDiscovery, PluginStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(PluginStore::new("/srv/moim/plugins"));
//! let discovery = Arc::new(LocalDiscovery::new(DiscoveryConfig::default(), store));
//! let manager = LifecycleManager::new(discovery);
//!
//! // 설치된 플러그인 로드
//! if manager.load_plugin("eventPhotos").await {
//!     let routes = manager
//!         .registry()
//!         .extension_points(moim_core::ExtensionPointType::AdminOrgRoute);
//!     // 셸 라우터에 routes 주입...
//! }
//! ```

pub mod plugin;

pub use plugin::{
    events, ComponentTable, Discovery, DiscoveryConfig, DrawerEntry, EventCallback, EventManager,
    ExtensionCategory, ExtensionEntry, ExtensionPointType, ExtensionRecord,
    ExtensionRegistryManager, InjectorEntry, InstalledPlugin, LifecycleConfig, LifecycleManager,
    LoadedPlugin, LocalDiscovery, PluginComponent, PluginManifest, PluginStatus, PluginStore,
    PluginVersion, RouteEntry,
};
