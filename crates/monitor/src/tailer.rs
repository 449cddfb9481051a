//! 로그 파일 테일러
//!
//! 로그 파일을 주기적으로 읽으며 마지막 읽은 위치(바이트 오프셋) 이후에
//! 추가된 라인만 반환합니다. `tail -f`와 유사한 동작을 폴링 방식으로 구현합니다.
//!
//! # 동작 규칙
//! - 파일이 없으면 빈 결과를 반환합니다 (에러 아님).
//! - 파일 크기가 오프셋보다 작아지면(truncation) 오프셋을 0으로 되돌립니다.
//! - 읽기 실패 시 경고만 남기고 오프셋은 그대로 유지합니다.
//! - 라인은 손실 허용 UTF-8로 디코딩하고, 앞뒤 공백 제거 후 빈 라인은 버립니다.
//! - 개행으로 끝나지 않은 마지막 조각은 [`TrailingLine`] 설정에 따라
//!   다음 읽기까지 보류하거나 즉시 반환합니다.

use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use logbell_core::config::TrailingLine;
use logbell_core::metrics as m;

/// 개행 없이 보류할 수 있는 최대 조각 길이 (바이트)
///
/// 이보다 긴 미완성 조각은 보류하지 않고 소비합니다.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// 로그 파일 테일러
///
/// 파일 핸들을 유지하지 않고 매 읽기마다 파일을 다시 엽니다.
/// 따라서 파일이 교체되거나 잠시 사라져도 다음 읽기에서 자연스럽게 이어집니다.
#[derive(Debug)]
pub struct Tailer {
    /// 감시 대상 파일 경로
    path: PathBuf,
    /// 다음 읽기 시작 위치 (바이트 오프셋)
    offset: u64,
    /// 미완성 마지막 라인 처리 방식
    trailing_line: TrailingLine,
    /// 보류 가능한 미완성 조각의 최대 길이
    max_line_length: usize,
}

impl Tailer {
    /// 오프셋 0에서 시작하는 테일러를 생성합니다.
    pub fn new(path: impl Into<PathBuf>, trailing_line: TrailingLine) -> Self {
        Self {
            path: path.into(),
            offset: 0,
            trailing_line,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }

    /// 보류 가능한 미완성 조각의 최대 길이를 설정합니다.
    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    /// 감시 대상 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 현재 바이트 오프셋
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// 오프셋을 현재 파일 끝으로 옮깁니다.
    ///
    /// 기존 내용을 건너뛰고 이후 추가되는 라인만 읽을 때 사용합니다.
    /// 파일이 없거나 메타데이터를 읽을 수 없으면 오프셋 0을 유지합니다.
    pub async fn seek_to_end(&mut self) -> u64 {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => {
                self.offset = meta.len();
                tracing::debug!(
                    path = %self.path.display(),
                    offset = self.offset,
                    "tailer positioned at end of file"
                );
            }
            Err(e) => {
                tracing::debug!(
                    path = %self.path.display(),
                    error = %e,
                    "cannot stat log file, starting from offset 0"
                );
                self.offset = 0;
            }
        }
        metrics::gauge!(m::TAIL_OFFSET_BYTES).set(self.offset as f64);
        self.offset
    }

    /// 마지막 읽기 이후 추가된 라인을 반환합니다.
    ///
    /// 실패하지 않습니다. 파일이 없거나 읽기에 실패하면 빈 벡터를 반환하며,
    /// 다음 호출에서 같은 오프셋부터 다시 시도합니다.
    pub async fn read_new_lines(&mut self) -> Vec<String> {
        match self.try_read().await {
            Ok(lines) => {
                if !lines.is_empty() {
                    metrics::counter!(m::TAIL_LINES_READ_TOTAL).increment(lines.len() as u64);
                }
                lines
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "log file not found");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    offset = self.offset,
                    error = %e,
                    "failed to read log file"
                );
                metrics::counter!(m::TAIL_READ_ERRORS_TOTAL).increment(1);
                Vec::new()
            }
        }
    }

    /// 오프셋은 읽기가 끝까지 성공한 뒤에만 갱신합니다.
    async fn try_read(&mut self) -> io::Result<Vec<String>> {
        let mut file = File::open(&self.path).await?;
        let meta = file.metadata().await?;
        if meta.is_dir() {
            return Err(io::Error::other("log path is a directory"));
        }
        let len = meta.len();

        let truncated = len < self.offset;
        let start = if truncated { 0 } else { self.offset };

        if len == start {
            return Ok(Vec::new());
        }

        file.seek(SeekFrom::Start(start)).await?;
        let mut buf = Vec::with_capacity(usize::try_from(len - start).unwrap_or(0));
        file.read_to_end(&mut buf).await?;

        if truncated {
            tracing::warn!(
                path = %self.path.display(),
                previous_offset = self.offset,
                size = len,
                "log file shrank, restarting from beginning"
            );
            metrics::counter!(m::TAIL_TRUNCATIONS_TOTAL).increment(1);
        }

        let consumed = self.consumable_len(&buf);
        let lines = split_lines(&buf[..consumed]);

        self.offset = start + consumed as u64;
        metrics::gauge!(m::TAIL_OFFSET_BYTES).set(self.offset as f64);

        Ok(lines)
    }

    /// 이번 읽기에서 소비할 바이트 수를 결정합니다.
    fn consumable_len(&self, buf: &[u8]) -> usize {
        match self.trailing_line {
            TrailingLine::Emit => buf.len(),
            TrailingLine::Hold => {
                let complete = buf
                    .iter()
                    .rposition(|&b| b == b'\n')
                    .map_or(0, |pos| pos + 1);
                let fragment = buf.len() - complete;
                if fragment > self.max_line_length {
                    tracing::warn!(
                        path = %self.path.display(),
                        fragment_bytes = fragment,
                        max_line_length = self.max_line_length,
                        "unterminated line exceeds max length, consuming it"
                    );
                    buf.len()
                } else {
                    complete
                }
            }
        }
    }
}

/// 바이트 조각을 정리된 라인 목록으로 변환합니다.
fn split_lines(chunk: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(chunk)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use std::io::Write;

    fn append(path: &Path, data: &[u8]) {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        file.write_all(data).unwrap();
    }

    #[tokio::test]
    async fn missing_file_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut tailer = Tailer::new(dir.path().join("absent.log"), TrailingLine::Hold);
        assert!(tailer.read_new_lines().await.is_empty());
        assert_eq!(tailer.offset(), 0);
    }

    #[tokio::test]
    async fn reads_only_appended_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        append(&path, b"INFO ok\nERROR disk full\n");

        let mut tailer = Tailer::new(&path, TrailingLine::Hold);
        assert_eq!(tailer.read_new_lines().await, vec!["INFO ok", "ERROR disk full"]);
        assert!(tailer.read_new_lines().await.is_empty());

        append(&path, b"ERROR timeout\n");
        assert_eq!(tailer.read_new_lines().await, vec!["ERROR timeout"]);
        assert_eq!(tailer.offset(), std::fs::metadata(&path).unwrap().len());
    }

    #[tokio::test]
    async fn trims_and_drops_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        append(&path, b"  padded  \n\n   \r\nwindows\r\n");

        let mut tailer = Tailer::new(&path, TrailingLine::Hold);
        assert_eq!(tailer.read_new_lines().await, vec!["padded", "windows"]);
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        append(&path, b"ERROR \xff\xfe bytes\n");

        let mut tailer = Tailer::new(&path, TrailingLine::Hold);
        let lines = tailer.read_new_lines().await;
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("ERROR "));
        assert!(lines[0].contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn hold_defers_unterminated_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        append(&path, b"first\nERROR par");

        let mut tailer = Tailer::new(&path, TrailingLine::Hold);
        assert_eq!(tailer.read_new_lines().await, vec!["first"]);
        assert_eq!(tailer.offset(), 6);

        append(&path, b"tial\n");
        assert_eq!(tailer.read_new_lines().await, vec!["ERROR partial"]);
    }

    #[tokio::test]
    async fn emit_returns_unterminated_line_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        append(&path, b"ERROR par");

        let mut tailer = Tailer::new(&path, TrailingLine::Emit);
        assert_eq!(tailer.read_new_lines().await, vec!["ERROR par"]);

        append(&path, b"tial\n");
        assert_eq!(tailer.read_new_lines().await, vec!["tial"]);
    }

    #[tokio::test]
    async fn hold_consumes_oversized_fragment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        append(&path, b"0123456789abcdef");

        let mut tailer = Tailer::new(&path, TrailingLine::Hold).with_max_line_length(8);
        assert_eq!(tailer.read_new_lines().await, vec!["0123456789abcdef"]);
        assert_eq!(tailer.offset(), 16);
    }

    #[tokio::test]
    async fn truncation_restarts_from_beginning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        append(&path, b"line one\nline two\n");

        let mut tailer = Tailer::new(&path, TrailingLine::Hold);
        assert_eq!(tailer.read_new_lines().await.len(), 2);

        std::fs::write(&path, b"new\n").unwrap();
        assert_eq!(tailer.read_new_lines().await, vec!["new"]);
        assert_eq!(tailer.offset(), 4);
    }

    #[tokio::test]
    async fn read_error_keeps_offset_and_resumes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let parked = dir.path().join("app.log.parked");
        append(&path, b"line one\nline two\n");

        let mut tailer = Tailer::new(&path, TrailingLine::Hold);
        assert_eq!(tailer.read_new_lines().await.len(), 2);
        let offset = tailer.offset();
        assert_eq!(offset, 18);

        // 경로가 읽을 수 없는 대상(디렉터리)으로 바뀜
        std::fs::rename(&path, &parked).unwrap();
        std::fs::create_dir(&path).unwrap();
        assert!(tailer.read_new_lines().await.is_empty());
        assert_eq!(tailer.offset(), offset);
        assert!(tailer.read_new_lines().await.is_empty());
        assert_eq!(tailer.offset(), offset);

        // 원래 파일이 돌아오면 이어서 읽음
        std::fs::remove_dir(&path).unwrap();
        std::fs::rename(&parked, &path).unwrap();
        append(&path, b"line three\n");
        assert_eq!(tailer.read_new_lines().await, vec!["line three"]);
        assert_eq!(tailer.offset(), std::fs::metadata(&path).unwrap().len());
    }

    #[tokio::test]
    async fn seek_to_end_skips_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        append(&path, b"old line\n");

        let mut tailer = Tailer::new(&path, TrailingLine::Hold);
        assert_eq!(tailer.seek_to_end().await, 9);
        assert!(tailer.read_new_lines().await.is_empty());

        append(&path, b"fresh line\n");
        assert_eq!(tailer.read_new_lines().await, vec!["fresh line"]);
    }

    #[tokio::test]
    async fn seek_to_end_on_missing_file_stays_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("later.log");

        let mut tailer = Tailer::new(&path, TrailingLine::Hold);
        assert_eq!(tailer.seek_to_end().await, 0);

        append(&path, b"created later\n");
        assert_eq!(tailer.read_new_lines().await, vec!["created later"]);
    }

    #[test]
    fn split_lines_handles_mixed_endings() {
        assert_eq!(split_lines(b"a\r\nb\n\nc"), vec!["a", "b", "c"]);
        assert!(split_lines(b"").is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            /// 여러 번 나눠 추가해도 완성된 라인은 정확히 한 번씩 순서대로 반환되고,
            /// 미완성 조각은 개행이 올 때까지 보류됨
            #[test]
            fn appended_lines_are_returned_exactly_once(
                chunks in prop::collection::vec(
                    (
                        prop::collection::vec("[a-zA-Z0-9 ]{0,24}", 0..6),
                        prop::option::of("[a-zA-Z0-9]{1,12}"),
                    ),
                    1..8,
                )
            ) {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .unwrap();
                let dir = tempfile::tempdir().unwrap();
                let path = dir.path().join("prop.log");
                append(&path, b"");

                let mut tailer = Tailer::new(&path, TrailingLine::Hold);
                let mut written = String::new();
                let mut seen = Vec::new();
                let mut last_offset = 0;

                for (lines, fragment) in &chunks {
                    let mut data = String::new();
                    for line in lines {
                        data.push_str(line);
                        data.push('\n');
                    }
                    if let Some(fragment) = fragment {
                        data.push_str(fragment);
                    }
                    append(&path, data.as_bytes());
                    written.push_str(&data);

                    seen.extend(rt.block_on(tailer.read_new_lines()));
                    let file_len = std::fs::metadata(&path).unwrap().len();
                    prop_assert!(tailer.offset() >= last_offset);
                    prop_assert!(tailer.offset() <= file_len);
                    // Hold 모드에서 오프셋은 항상 마지막 개행 직후
                    let complete = written.rfind('\n').map_or(0, |pos| pos + 1) as u64;
                    prop_assert_eq!(tailer.offset(), complete);
                    last_offset = tailer.offset();
                }

                let complete = written.rfind('\n').map_or(0, |pos| pos + 1);
                let expected: Vec<String> = written[..complete]
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_owned)
                    .collect();
                prop_assert_eq!(seen, expected);
            }
        }
    }
}
