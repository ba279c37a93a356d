//! Plugin Events - 라이프사이클 이벤트 발행/구독
//!
//! 동기식 인프로세스 pub/sub 디스패처입니다. 리스너는 `emit` 호출 안에서
//! 등록 순서대로 인라인 실행되며 suspension point가 없습니다.
//! 느린 리스너는 이후 리스너와 `emit` 호출자를 모두 블록합니다.

use moim_foundation::Result;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

// ============================================================================
// 이벤트 이름 상수
// ============================================================================

/// 플러그인 로드 완료
pub const PLUGIN_LOADED: &str = "plugin:loaded";
/// 플러그인 언로드 완료
pub const PLUGIN_UNLOADED: &str = "plugin:unloaded";
/// 플러그인 로드 실패 (payload에 error 포함)
pub const PLUGIN_ERROR: &str = "plugin:error";
/// 플러그인 활성화
pub const PLUGIN_ACTIVATED: &str = "plugin:activated";
/// 플러그인 비활성화
pub const PLUGIN_DEACTIVATED: &str = "plugin:deactivated";
/// 플러그인 설치 완료
pub const PLUGIN_INSTALLED: &str = "plugin:installed";
/// 플러그인 제거 완료
pub const PLUGIN_UNINSTALLED: &str = "plugin:uninstalled";
/// 플러그인 상태 변경 (payload에 status 포함)
pub const PLUGIN_STATUS_CHANGED: &str = "plugin:status-changed";

// ============================================================================
// EventCallback
// ============================================================================

/// 이벤트 콜백
///
/// `Err`를 반환한 콜백은 이벤트 이름과 함께 로깅되며,
/// 이후 리스너 실행을 막지 않습니다.
pub type EventCallback = Arc<dyn Fn(&Value) -> Result<()> + Send + Sync>;

// ============================================================================
// EventManager - 리스너 테이블 관리
// ============================================================================

/// 이벤트 매니저 - 이벤트 이름별 리스너 시퀀스 관리
///
/// 같은 콜백(`Arc`)을 두 번 등록하면 이벤트를 두 번 수신합니다.
/// `off`는 일치하는 첫 번째 등록 하나만 제거합니다.
pub struct EventManager {
    /// 리스너 테이블 (이벤트 이름 -> 등록 순서 시퀀스)
    listeners: RwLock<HashMap<String, Vec<EventCallback>>>,
}

impl EventManager {
    /// 새 이벤트 매니저 생성
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
        }
    }

    fn check_event_name(event: &str) -> bool {
        if event.trim().is_empty() {
            error!("Invalid event name: {:?}", event);
            return false;
        }
        true
    }

    // ========================================================================
    // 등록 / 해제
    // ========================================================================

    /// 리스너 등록
    pub fn on(&self, event: &str, callback: EventCallback) {
        if !Self::check_event_name(event) {
            return;
        }

        let mut listeners = self.listeners.write();
        listeners.entry(event.to_string()).or_default().push(callback);
        debug!("Registered listener for event: {}", event);
    }

    /// 리스너 해제 - 포인터가 일치하는 첫 번째 등록 하나만 제거
    ///
    /// 이벤트 키는 시퀀스가 비면 테이블에서 함께 제거됩니다.
    /// 이벤트나 콜백을 찾지 못하면 조용히 무시합니다.
    pub fn off(&self, event: &str, callback: &EventCallback) {
        if !Self::check_event_name(event) {
            return;
        }

        let mut listeners = self.listeners.write();
        let Some(sequence) = listeners.get_mut(event) else {
            return;
        };

        if let Some(index) = sequence.iter().position(|c| Arc::ptr_eq(c, callback)) {
            sequence.remove(index);
            debug!("Removed listener for event: {}", event);
        }

        if sequence.is_empty() {
            listeners.remove(event);
        }
    }

    /// 한 이벤트 또는 전체 테이블의 리스너 제거
    pub fn remove_all_listeners(&self, event: Option<&str>) {
        let mut listeners = self.listeners.write();
        match event {
            Some(event) => {
                listeners.remove(event);
            }
            None => {
                listeners.clear();
            }
        }
    }

    // ========================================================================
    // 발행
    // ========================================================================

    /// 이벤트 발행 - 등록 순서대로 현재 리스너 전원을 동기 호출
    ///
    /// 개별 리스너의 실패는 로깅만 하고 다음 리스너로 진행합니다.
    /// 리스너가 없는 이벤트는 조용히 무시합니다.
    pub fn emit(&self, event: &str, payload: &Value) {
        if !Self::check_event_name(event) {
            return;
        }

        // emit 진입 시점의 스냅샷에 대해 실행 (리스너가 on/off를 재진입 호출해도 안전)
        let snapshot = {
            let listeners = self.listeners.read();
            match listeners.get(event) {
                Some(sequence) => sequence.clone(),
                None => return,
            }
        };

        debug!("Emitting event: {} ({} listeners)", event, snapshot.len());

        for callback in &snapshot {
            if let Err(e) = callback(payload) {
                error!("Error in listener for event {}: {}", event, e);
            }
        }
    }

    // ========================================================================
    // 조회
    // ========================================================================

    /// 이벤트의 등록 리스너 수 (미등록 이벤트는 0)
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .read()
            .get(event)
            .map(|sequence| sequence.len())
            .unwrap_or(0)
    }

    /// 리스너가 등록된 이벤트 이름 목록
    pub fn event_names(&self) -> Vec<String> {
        self.listeners.read().keys().cloned().collect()
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// 테스트
// ============================================================================
