//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! `logbell-monitor`는 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다. 레코더가 설치되지 않았으면 모든 호출은 no-op입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logbell_`
//! - 영역: `tail_`, `batch_`, `delivery_`
//! - 접미어: `_total` (counter), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(logbell_core::metrics::TAIL_LINES_READ_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 필터 이름 레이블 키
pub const LABEL_RULE: &str = "rule";

// ─── Tailer 메트릭 ─────────────────────────────────────────────────

/// Tailer: 읽은 라인 수 (counter)
pub const TAIL_LINES_READ_TOTAL: &str = "logbell_tail_lines_read_total";

/// Tailer: 읽기 실패 수 (counter)
pub const TAIL_READ_ERRORS_TOTAL: &str = "logbell_tail_read_errors_total";

/// Tailer: 파일 축소(truncation) 감지 수 (counter)
pub const TAIL_TRUNCATIONS_TOTAL: &str = "logbell_tail_truncations_total";

/// Tailer: 현재 바이트 오프셋 (gauge)
pub const TAIL_OFFSET_BYTES: &str = "logbell_tail_offset_bytes";

// ─── 매칭/배치 메트릭 ───────────────────────────────────────────────

/// 필터에 매칭된 라인 수 (counter, label: rule)
pub const LINES_MATCHED_TOTAL: &str = "logbell_lines_matched_total";

/// 배치 내 미전송 엔트리 수 (gauge)
pub const BATCH_PENDING_ENTRIES: &str = "logbell_batch_pending_entries";

/// 보관 한도 초과로 드롭된 엔트리 수 (counter)
pub const BATCH_ENTRIES_DROPPED_TOTAL: &str = "logbell_batch_entries_dropped_total";

// ─── 전송 메트릭 ───────────────────────────────────────────────────

/// 전송에 성공한 배치 수 (counter)
pub const DELIVERY_BATCHES_TOTAL: &str = "logbell_delivery_batches_total";

/// 전송에 성공한 엔트리 수 (counter)
pub const DELIVERY_ENTRIES_TOTAL: &str = "logbell_delivery_entries_total";

/// 전송 실패 수 (counter)
pub const DELIVERY_FAILURES_TOTAL: &str = "logbell_delivery_failures_total";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
/// 일반적으로 `logbell-daemon`의 시작 시점에서 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        TAIL_LINES_READ_TOTAL,
        "Total number of non-empty lines read from the tailed log file"
    );
    describe_counter!(
        TAIL_READ_ERRORS_TOTAL,
        "Total number of failed reads of the tailed log file"
    );
    describe_counter!(
        TAIL_TRUNCATIONS_TOTAL,
        "Number of times the log file shrank below the stored offset"
    );
    describe_gauge!(TAIL_OFFSET_BYTES, "Current byte offset into the log file");

    describe_counter!(
        LINES_MATCHED_TOTAL,
        "Lines that matched a filter, labelled by filter name"
    );
    describe_gauge!(
        BATCH_PENDING_ENTRIES,
        "Matched entries waiting for delivery"
    );
    describe_counter!(
        BATCH_ENTRIES_DROPPED_TOTAL,
        "Entries dropped because the pending batch hit max_pending"
    );

    describe_counter!(DELIVERY_BATCHES_TOTAL, "Batches delivered successfully");
    describe_counter!(DELIVERY_ENTRIES_TOTAL, "Entries delivered successfully");
    describe_counter!(
        DELIVERY_FAILURES_TOTAL,
        "Failed delivery attempts (batches are retained for retry)"
    );
}
