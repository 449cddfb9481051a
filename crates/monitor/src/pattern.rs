//! 필터 패턴 매칭 -- 정규식 컴파일 및 첫 매칭 규칙 탐색
//!
//! [`PatternSet`]은 설정된 필터를 한 번만 컴파일해 보관하고,
//! 라인마다 설정 순서대로 평가하여 처음 매칭된 필터 이름을 돌려줍니다.
//!
//! 매칭은 라인 내 부분 검색(search) 의미이며 전체 라인 앵커를 요구하지 않습니다.
//! 정규식 컴파일에 실패한 필터는 경고를 남기고 제외됩니다 (치명적 에러 아님).

use regex::Regex;

use logbell_core::config::FilterConfig;

/// 컴파일된 매칭 규칙
#[derive(Debug, Clone)]
pub struct PatternRule {
    /// 필터 이름
    name: String,
    /// 컴파일된 정규식
    regex: Regex,
}

impl PatternRule {
    /// 패턴을 컴파일하여 규칙을 생성합니다.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            regex: Regex::new(pattern)?,
        })
    }

    /// 필터 이름을 반환합니다.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 원본 패턴 문자열을 반환합니다.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// 라인 내에 패턴이 존재하는지 확인합니다.
    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }
}

/// 컴파일 단계에서 제외된 필터
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRule {
    /// 필터 이름
    pub name: String,
    /// 제외 사유 (정규식 오류 메시지)
    pub reason: String,
}

/// 필터 집합
///
/// 생성 이후 불변이며, 매칭에 부수 효과가 없습니다.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    /// 설정 순서를 유지하는 활성 규칙 목록
    rules: Vec<PatternRule>,
    /// 컴파일에 실패한 필터
    skipped: Vec<SkippedRule>,
}

impl PatternSet {
    /// 필터 설정 목록을 컴파일합니다.
    ///
    /// - `enabled == false`인 필터는 무시합니다.
    /// - 정규식이 잘못된 필터는 경고를 남기고 제외합니다.
    pub fn compile(filters: &[FilterConfig]) -> Self {
        let mut rules = Vec::with_capacity(filters.len());
        let mut skipped = Vec::new();

        for filter in filters.iter().filter(|f| f.enabled) {
            match PatternRule::new(filter.name.as_str(), &filter.pattern) {
                Ok(rule) => {
                    tracing::info!(filter = %filter.name, "filter activated");
                    rules.push(rule);
                }
                Err(e) => {
                    tracing::warn!(
                        filter = %filter.name,
                        error = %e,
                        "invalid filter pattern, skipping"
                    );
                    skipped.push(SkippedRule {
                        name: filter.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Self { rules, skipped }
    }

    /// 라인에 처음 매칭되는 필터 이름을 반환합니다.
    ///
    /// 설정 순서가 우선순위이며, 매칭되는 필터가 없으면 `None`을 반환합니다.
    pub fn first_match(&self, line: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.is_match(line))
            .map(PatternRule::name)
    }

    /// 활성 규칙 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// 활성 규칙이 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 활성 규칙 목록을 반환합니다.
    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// 컴파일에 실패해 제외된 필터 목록을 반환합니다.
    pub fn skipped(&self) -> &[SkippedRule] {
        &self.skipped
    }
}
