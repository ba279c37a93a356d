//! Plugin Manifest - 플러그인 메타데이터 및 확장 포인트 정의

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 플러그인 버전
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PluginVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl PluginVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// 버전 문자열 파싱 (예: "1.2.3")
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return None;
        }

        Some(Self {
            major: parts[0].parse().ok()?,
            minor: parts[1].parse().ok()?,
            patch: parts[2].parse().ok()?,
        })
    }

    /// 호환성 검사
    pub fn is_compatible_with(&self, other: &PluginVersion) -> bool {
        // 같은 메이저 버전이면 호환
        self.major == other.major
    }
}

impl std::fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Default for PluginVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

// ============================================================================
// ExtensionPointType - 확장 포인트 컬렉션 태그
// ============================================================================

/// 확장 포인트 카테고리
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionCategory {
    Route,
    Drawer,
    Injector,
}

impl ExtensionCategory {
    /// 카테고리에 속하는 컬렉션 태그들
    pub fn members(&self) -> &'static [ExtensionPointType] {
        use ExtensionPointType::*;
        match self {
            ExtensionCategory::Route => &[
                AdminGlobalRoute,
                AdminOrgRoute,
                UserOrgRoute,
                UserGlobalRoute,
                LegacyRoutes,
            ],
            ExtensionCategory::Drawer => &[
                AdminGlobalDrawer,
                AdminOrgDrawer,
                UserOrgDrawer,
                UserGlobalDrawer,
                LegacyDrawer,
            ],
            ExtensionCategory::Injector => &[Injector1, Injector2, Injector3, Injector4],
        }
    }

    pub const ALL: [ExtensionCategory; 3] = [
        ExtensionCategory::Route,
        ExtensionCategory::Drawer,
        ExtensionCategory::Injector,
    ];
}

/// 확장 포인트 컬렉션 태그
///
/// 관리자/사용자 × 전역/조직 스코프의 라우트·드로어 슬롯 8종,
/// 범용 인젝터 슬롯 4종, 그리고 구버전 매니페스트용 범용 컬렉션 2종.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtensionPointType {
    #[serde(rename = "adminGlobalRoute")]
    AdminGlobalRoute,
    #[serde(rename = "adminOrgRoute")]
    AdminOrgRoute,
    #[serde(rename = "userOrgRoute")]
    UserOrgRoute,
    #[serde(rename = "userGlobalRoute")]
    UserGlobalRoute,

    #[serde(rename = "adminGlobalDrawer")]
    AdminGlobalDrawer,
    #[serde(rename = "adminOrgDrawer")]
    AdminOrgDrawer,
    #[serde(rename = "userOrgDrawer")]
    UserOrgDrawer,
    #[serde(rename = "userGlobalDrawer")]
    UserGlobalDrawer,

    #[serde(rename = "g1")]
    Injector1,
    #[serde(rename = "g2")]
    Injector2,
    #[serde(rename = "g3")]
    Injector3,
    #[serde(rename = "g4")]
    Injector4,

    /// 구버전 매니페스트의 범용 라우트 컬렉션
    #[serde(rename = "routes")]
    LegacyRoutes,
    /// 구버전 매니페스트의 범용 드로어 컬렉션
    #[serde(rename = "drawer")]
    LegacyDrawer,
}

impl ExtensionPointType {
    /// 전체 컬렉션 태그 (등록 순서 고정)
    pub const ALL: [ExtensionPointType; 14] = [
        ExtensionPointType::AdminGlobalRoute,
        ExtensionPointType::AdminOrgRoute,
        ExtensionPointType::UserOrgRoute,
        ExtensionPointType::UserGlobalRoute,
        ExtensionPointType::AdminGlobalDrawer,
        ExtensionPointType::AdminOrgDrawer,
        ExtensionPointType::UserOrgDrawer,
        ExtensionPointType::UserGlobalDrawer,
        ExtensionPointType::Injector1,
        ExtensionPointType::Injector2,
        ExtensionPointType::Injector3,
        ExtensionPointType::Injector4,
        ExtensionPointType::LegacyRoutes,
        ExtensionPointType::LegacyDrawer,
    ];

    /// 소속 카테고리
    pub fn category(&self) -> ExtensionCategory {
        use ExtensionPointType::*;
        match self {
            AdminGlobalRoute | AdminOrgRoute | UserOrgRoute | UserGlobalRoute | LegacyRoutes => {
                ExtensionCategory::Route
            }
            AdminGlobalDrawer | AdminOrgDrawer | UserOrgDrawer | UserGlobalDrawer
            | LegacyDrawer => ExtensionCategory::Drawer,
            Injector1 | Injector2 | Injector3 | Injector4 => ExtensionCategory::Injector,
        }
    }

    /// 매니페스트 키 문자열
    pub fn tag(&self) -> &'static str {
        use ExtensionPointType::*;
        match self {
            AdminGlobalRoute => "adminGlobalRoute",
            AdminOrgRoute => "adminOrgRoute",
            UserOrgRoute => "userOrgRoute",
            UserGlobalRoute => "userGlobalRoute",
            AdminGlobalDrawer => "adminGlobalDrawer",
            AdminOrgDrawer => "adminOrgDrawer",
            UserOrgDrawer => "userOrgDrawer",
            UserGlobalDrawer => "userGlobalDrawer",
            Injector1 => "g1",
            Injector2 => "g2",
            Injector3 => "g3",
            Injector4 => "g4",
            LegacyRoutes => "routes",
            LegacyDrawer => "drawer",
        }
    }
}

impl std::fmt::Display for ExtensionPointType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

// ============================================================================
// Extension Entries - 컬렉션별 레코드 형태
// ============================================================================

/// 라우트 확장 항목
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteEntry {
    /// 라우트 경로
    pub path: String,

    /// 컴포넌트 이름 (이름으로 참조)
    pub component: String,

    /// 정확히 일치해야 매칭
    #[serde(default)]
    pub exact: bool,

    /// 필요한 권한 목록
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

/// 드로어 확장 항목
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DrawerEntry {
    /// 표시 레이블
    pub label: String,

    /// 아이콘 참조
    pub icon: String,

    /// 이동 경로
    pub path: String,

    /// 필요한 권한 목록
    #[serde(default)]
    pub permissions: Vec<String>,

    /// 정렬 순서
    #[serde(default)]
    pub order: i64,
}

/// 인젝터 확장 항목
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InjectorEntry {
    /// 인젝터 컴포넌트 이름 (이름으로 참조)
    pub injector: String,

    /// 설명
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 주입 대상 슬롯 이름
    pub target: String,

    /// 정렬 순서
    #[serde(default)]
    pub order: i64,
}

/// 확장 항목 - 컬렉션 태그가 결정하는 태그드 유니언
///
/// untagged 매칭 순서: route(path+component) -> drawer(label) -> injector(injector)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ExtensionEntry {
    Route(RouteEntry),
    Drawer(DrawerEntry),
    Injector(InjectorEntry),
}

impl ExtensionEntry {
    /// 항목이 참조하는 컴포넌트 이름 (드로어 항목은 없음)
    pub fn component_name(&self) -> Option<&str> {
        match self {
            ExtensionEntry::Route(route) => Some(&route.component),
            ExtensionEntry::Drawer(_) => None,
            ExtensionEntry::Injector(injector) => Some(&injector.injector),
        }
    }
}

/// 레지스트리 레코드 - 등록 시 기여 플러그인이 스탬프됨
///
/// `plugin_id`는 선택적 제거에만 쓰이는 비소유 역참조입니다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionRecord {
    pub plugin_id: String,

    #[serde(flatten)]
    pub entry: ExtensionEntry,
}

impl ExtensionRecord {
    pub fn new(plugin_id: impl Into<String>, entry: ExtensionEntry) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            entry,
        }
    }
}

// ============================================================================
// PluginManifest - 플러그인 정적 기술자
// ============================================================================

/// 확장 포인트 맵 (컬렉션 태그 -> 항목 목록)
pub type ExtensionPointMap = HashMap<ExtensionPointType, Vec<ExtensionEntry>>;

/// 플러그인 매니페스트 - 로드 후 불변
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginManifest {
    /// 고유 플러그인 ID (예: "eventPhotos")
    pub plugin_id: String,

    /// 표시 이름
    pub name: String,

    /// 버전
    pub version: PluginVersion,

    /// 설명
    #[serde(default)]
    pub description: String,

    /// 작성자
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// 엔트리 포인트 참조
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,

    /// 등록할 확장 포인트
    #[serde(default)]
    pub extension_points: ExtensionPointMap,
}

impl PluginManifest {
    /// 새 매니페스트 생성
    pub fn new(plugin_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            name: name.into(),
            version: PluginVersion::default(),
            description: String::new(),
            author: None,
            main: None,
            extension_points: HashMap::new(),
        }
    }

    /// 로드 실패 행에 쓰이는 합성 매니페스트 (버전 0.0.0)
    pub fn placeholder(plugin_id: impl Into<String>) -> Self {
        let plugin_id = plugin_id.into();
        Self {
            name: plugin_id.clone(),
            plugin_id,
            version: PluginVersion::new(0, 0, 0),
            description: String::new(),
            author: None,
            main: None,
            extension_points: HashMap::new(),
        }
    }

    /// 빌더 패턴: 버전 설정
    pub fn with_version(mut self, version: PluginVersion) -> Self {
        self.version = version;
        self
    }

    /// 빌더 패턴: 설명 설정
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// 빌더 패턴: 작성자 설정
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// 빌더 패턴: 엔트리 포인트 설정
    pub fn with_main(mut self, main: impl Into<String>) -> Self {
        self.main = Some(main.into());
        self
    }

    /// 빌더 패턴: 확장 포인트 항목 추가
    pub fn with_extension_point(
        mut self,
        point_type: ExtensionPointType,
        entries: Vec<ExtensionEntry>,
    ) -> Self {
        self.extension_points.insert(point_type, entries);
        self
    }
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_version_parse() {
        let v = PluginVersion::parse("1.2.3").unwrap();
        assert_eq!(v.major, 1);
        assert_eq!(v.minor, 2);
        assert_eq!(v.patch, 3);

        assert!(PluginVersion::parse("1.2").is_none());
        assert!(PluginVersion::parse("a.b.c").is_none());
    }

    #[test]
    fn test_version_compatibility() {
        let v1 = PluginVersion::new(1, 0, 0);
        let v2 = PluginVersion::new(1, 2, 0);
        let v3 = PluginVersion::new(2, 0, 0);

        assert!(v1.is_compatible_with(&v2));
        assert!(!v1.is_compatible_with(&v3));
    }

    #[test]
    fn test_type_categories() {
        assert_eq!(
            ExtensionPointType::AdminOrgRoute.category(),
            ExtensionCategory::Route
        );
        assert_eq!(
            ExtensionPointType::UserGlobalDrawer.category(),
            ExtensionCategory::Drawer
        );
        assert_eq!(
            ExtensionPointType::Injector3.category(),
            ExtensionCategory::Injector
        );
        assert_eq!(
            ExtensionPointType::LegacyRoutes.category(),
            ExtensionCategory::Route
        );

        // 카테고리 멤버를 모두 합치면 전체 태그 집합
        let mut from_categories: Vec<ExtensionPointType> = ExtensionCategory::ALL
            .iter()
            .flat_map(|c| c.members().iter().copied())
            .collect();
        from_categories.sort_by_key(|t| t.tag());
        let mut all = ExtensionPointType::ALL.to_vec();
        all.sort_by_key(|t| t.tag());
        assert_eq!(from_categories, all);
    }

    #[test]
    fn test_entry_untagged_parse() {
        let route: ExtensionEntry = serde_json::from_value(json!({
            "path": "/admin/photos",
            "component": "PhotoAdmin",
            "exact": true
        }))
        .unwrap();
        assert!(matches!(route, ExtensionEntry::Route(_)));
        assert_eq!(route.component_name(), Some("PhotoAdmin"));

        let drawer: ExtensionEntry = serde_json::from_value(json!({
            "label": "Photos",
            "icon": "camera",
            "path": "/admin/photos",
            "permissions": ["admin"],
            "order": 5
        }))
        .unwrap();
        assert!(matches!(drawer, ExtensionEntry::Drawer(_)));
        assert_eq!(drawer.component_name(), None);

        let injector: ExtensionEntry = serde_json::from_value(json!({
            "injector": "PhotoWidget",
            "target": "orgDashboard",
            "order": 1
        }))
        .unwrap();
        assert!(matches!(injector, ExtensionEntry::Injector(_)));
        assert_eq!(injector.component_name(), Some("PhotoWidget"));
    }

    #[test]
    fn test_manifest_json_with_typed_and_legacy_keys() {
        let manifest: PluginManifest = serde_json::from_value(json!({
            "pluginId": "eventPhotos",
            "name": "Event Photos",
            "version": { "major": 1, "minor": 0, "patch": 0 },
            "description": "Photo galleries for events",
            "extensionPoints": {
                "adminOrgRoute": [
                    { "path": "/admin/photos", "component": "PhotoAdmin" }
                ],
                "g2": [
                    { "injector": "PhotoWidget", "target": "orgDashboard", "order": 1 }
                ],
                "routes": [
                    { "path": "/photos", "component": "PhotoList" }
                ]
            }
        }))
        .unwrap();

        assert_eq!(manifest.plugin_id, "eventPhotos");
        assert_eq!(manifest.version.to_string(), "1.0.0");
        assert_eq!(manifest.extension_points.len(), 3);
        assert!(manifest
            .extension_points
            .contains_key(&ExtensionPointType::LegacyRoutes));
        assert!(manifest
            .extension_points
            .contains_key(&ExtensionPointType::Injector2));
    }

    #[test]
    fn test_manifest_builder() {
        let manifest = PluginManifest::new("eventPhotos", "Event Photos")
            .with_version(PluginVersion::new(2, 1, 0))
            .with_description("Photo galleries for events")
            .with_author("Moim Team")
            .with_main("PhotoRoot")
            .with_extension_point(
                ExtensionPointType::AdminOrgRoute,
                vec![ExtensionEntry::Route(RouteEntry {
                    path: "/admin/photos".into(),
                    component: "PhotoAdmin".into(),
                    exact: false,
                    permissions: None,
                })],
            );

        assert_eq!(manifest.version.to_string(), "2.1.0");
        assert_eq!(manifest.extension_points.len(), 1);
    }

    #[test]
    fn test_placeholder_manifest() {
        let manifest = PluginManifest::placeholder("broken");
        assert_eq!(manifest.plugin_id, "broken");
        assert_eq!(manifest.name, "broken");
        assert_eq!(manifest.version, PluginVersion::new(0, 0, 0));
        assert!(manifest.extension_points.is_empty());
    }
}
