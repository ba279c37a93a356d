//! Plugin traits - 핵심 플러그인 인터페이스

use super::manifest::PluginManifest;
use async_trait::async_trait;
use moim_foundation::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// 훅 탐색 대상이 되는 컴포넌트 테이블 키
pub const DEFAULT_COMPONENT: &str = "default";

/// 컴포넌트 테이블 (이름 -> 컴포넌트 참조)
pub type ComponentTable = HashMap<String, Arc<dyn PluginComponent>>;

// ============================================================================
// PluginComponent - 플러그인 컴포넌트와 선택적 라이프사이클 훅
// ============================================================================

/// 플러그인 컴포넌트 트레이트
///
/// 라이프사이클 훅은 전부 선택 사항입니다. 기본 구현은 no-op이며,
/// 훅이 필요한 플러그인만 해당 메서드를 재정의합니다.
/// 훅은 컴포넌트 테이블의 `default` 항목에서만 호출됩니다.
#[async_trait]
pub trait PluginComponent: Send + Sync {
    /// 컴포넌트 이름
    fn name(&self) -> &str;

    /// 설치 시 호출
    async fn on_install(&self) -> Result<()> {
        Ok(())
    }

    /// 활성화 시 호출
    async fn on_activate(&self) -> Result<()> {
        Ok(())
    }

    /// 비활성화 시 호출
    async fn on_deactivate(&self) -> Result<()> {
        Ok(())
    }

    /// 제거 시 호출
    async fn on_uninstall(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// PluginStatus - 플러그인 상태
// ============================================================================

/// 플러그인 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginStatus {
    /// 로드됨 (비활성)
    Inactive,

    /// 활성화됨
    Active,

    /// 로드 실패
    Error,
}

impl std::fmt::Display for PluginStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inactive => write!(f, "inactive"),
            Self::Active => write!(f, "active"),
            Self::Error => write!(f, "error"),
        }
    }
}

// ============================================================================
// Discovery - 매니페스트/컴포넌트 해석 및 원격 메타데이터 동기화
// ============================================================================

/// 디스커버리 트레이트 - LifecycleManager가 주입받는 협력자 계약
///
/// 매니페스트/컴포넌트 해석과 원격 데이터 스토어 동기화를 담당합니다.
/// `remove_plugin_metadata` 실패는 언로드 전체를,
/// `update_plugin_status` 실패는 활성/비활성 전환을 중단시킵니다.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// 플러그인 설치 여부
    fn is_plugin_installed(&self, plugin_id: &str) -> bool;

    /// 플러그인 활성화 여부
    fn is_plugin_activated(&self, plugin_id: &str) -> bool;

    /// 매니페스트 로드 (없으면 에러)
    async fn load_plugin_manifest(&self, plugin_id: &str) -> Result<PluginManifest>;

    /// 컴포넌트 테이블 해석 (없으면 에러)
    async fn load_plugin_components(
        &self,
        plugin_id: &str,
        manifest: &PluginManifest,
    ) -> Result<ComponentTable>;

    /// 플러그인 메타데이터를 원격 스토어와 동기화
    async fn sync_plugin_metadata(&self, plugin_id: &str) -> Result<()>;

    /// 원격 스토어에서 플러그인 메타데이터 제거
    async fn remove_plugin_metadata(&self, plugin_id: &str) -> Result<()>;

    /// 원격 스토어의 플러그인 상태 갱신
    async fn update_plugin_status(&self, plugin_id: &str, status: PluginStatus) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BareComponent;

    #[async_trait]
    impl PluginComponent for BareComponent {
        fn name(&self) -> &str {
            "bare"
        }
    }

    #[tokio::test]
    async fn test_default_hooks_are_noops() {
        let component = BareComponent;

        assert!(component.on_install().await.is_ok());
        assert!(component.on_activate().await.is_ok());
        assert!(component.on_deactivate().await.is_ok());
        assert!(component.on_uninstall().await.is_ok());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(PluginStatus::Inactive.to_string(), "inactive");
        assert_eq!(PluginStatus::Active.to_string(), "active");
        assert_eq!(PluginStatus::Error.to_string(), "error");
    }
}
