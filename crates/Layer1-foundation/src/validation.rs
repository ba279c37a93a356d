//! Plugin Identifier Validation - 플러그인 식별자 검증
//!
//! 플러그인 식별자는 생성되는 쿼리/뮤테이션 이름에 그대로 삽입되므로
//! 영문자로 시작하고 영숫자/언더스코어만 포함해야 합니다 (하이픈 금지).

use lazy_static::lazy_static;
use regex::Regex;

/// 플러그인 식별자 패턴
pub const PLUGIN_ID_PATTERN: &str = "^[a-zA-Z][a-zA-Z0-9_]*$";

lazy_static! {
    static ref PLUGIN_ID_REGEX: Regex = Regex::new(PLUGIN_ID_PATTERN).unwrap();
}

/// 플러그인 식별자 유효성 검사
pub fn is_valid_plugin_id(plugin_id: &str) -> bool {
    PLUGIN_ID_REGEX.is_match(plugin_id)
}
