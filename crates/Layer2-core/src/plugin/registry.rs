//! Extension Registry - 확장 포인트 레지스트리
//!
//! 컬렉션 태그별 레코드 시퀀스를 하나의 키드 구조로 관리합니다.
//! 등록 순서 = 삽입 순서이며, 플러그인 단위 재등록은
//! clear-then-insert로 이전 레코드 잔류 없이 치환됩니다.

use super::manifest::{
    ExtensionCategory, ExtensionPointType, ExtensionRecord, PluginManifest,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

type Collections = HashMap<ExtensionPointType, Vec<ExtensionRecord>>;

/// 확장 포인트 레지스트리 매니저
pub struct ExtensionRegistryManager {
    /// 컬렉션 저장소 (전 태그가 생성 시점부터 존재)
    collections: RwLock<Collections>,
}

impl ExtensionRegistryManager {
    /// 새 레지스트리 생성
    pub fn new() -> Self {
        let mut collections = HashMap::with_capacity(ExtensionPointType::ALL.len());
        for point_type in ExtensionPointType::ALL {
            collections.insert(point_type, Vec::new());
        }

        Self {
            collections: RwLock::new(collections),
        }
    }

    // ========================================================================
    // 등록 / 해제
    // ========================================================================

    /// 플러그인의 확장 포인트 등록
    ///
    /// 카테고리별(라우트/드로어/인젝터)로 해당 플러그인의 기존 레코드를
    /// 먼저 제거한 뒤, 매니페스트가 제공하는 타입별 항목을 순서대로
    /// 추가합니다. 같은 매니페스트 안의 중복 항목은 그대로 유지됩니다.
    pub fn register_extension_points(&self, plugin_id: &str, manifest: &PluginManifest) {
        let mut collections = self.collections.write();

        for category in ExtensionCategory::ALL {
            Self::clear_category(&mut collections, category, plugin_id);
        }

        let mut inserted = 0usize;
        for (point_type, entries) in &manifest.extension_points {
            let collection = collections.entry(*point_type).or_default();
            for entry in entries {
                collection.push(ExtensionRecord::new(plugin_id, entry.clone()));
                inserted += 1;
            }
        }

        debug!(
            "Registered {} extension point record(s) for plugin {}",
            inserted, plugin_id
        );
    }

    /// 플러그인의 레코드를 전 컬렉션에서 제거
    pub fn unregister_extension_points(&self, plugin_id: &str) {
        let mut collections = self.collections.write();

        let mut removed = 0usize;
        for collection in collections.values_mut() {
            let before = collection.len();
            collection.retain(|record| record.plugin_id != plugin_id);
            removed += before - collection.len();
        }

        if removed > 0 {
            debug!(
                "Unregistered {} extension point record(s) for plugin {}",
                removed, plugin_id
            );
        }
    }

    fn clear_category(collections: &mut Collections, category: ExtensionCategory, plugin_id: &str) {
        for point_type in category.members() {
            if let Some(collection) = collections.get_mut(point_type) {
                collection.retain(|record| record.plugin_id != plugin_id);
            }
        }
    }

    // ========================================================================
    // 조회
    // ========================================================================

    /// 전체 레지스트리 스냅샷 (방어적 복사)
    pub fn registry_snapshot(&self) -> Collections {
        self.collections.read().clone()
    }

    /// 특정 컬렉션의 레코드 목록
    pub fn extension_points(&self, point_type: ExtensionPointType) -> Vec<ExtensionRecord> {
        self.collections
            .read()
            .get(&point_type)
            .cloned()
            .unwrap_or_default()
    }

    /// 플러그인이 등록한 레코드가 있는지 확인
    pub fn has_plugin(&self, plugin_id: &str) -> bool {
        self.collections
            .read()
            .values()
            .any(|collection| collection.iter().any(|r| r.plugin_id == plugin_id))
    }

    /// 전체 레코드 수
    pub fn record_count(&self) -> usize {
        self.collections.read().values().map(|c| c.len()).sum()
    }
}

impl Default for ExtensionRegistryManager {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// 테스트
// ============================================================================
