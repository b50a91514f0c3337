//! 批量对齐协议
//!
//! 将一个成员的全部片段用分隔符拼接为一次翻译请求，再按同一分隔符拆分响应，
//! 只有分段数与片段数完全一致时才视为有效。任何不一致都让整个成员保留原文。

// 第三方crate导入
use regex::Regex;

// 本地模块导入
use crate::api_constants::markup_config::{FRAGMENT_DELIMITER, WHITESPACE_CHARS};
use crate::error::{Result, TranslationError};
use crate::translator::Translator;

/// 用分隔符拼接片段文本
pub fn join_fragments<S: AsRef<str>>(texts: &[S]) -> String {
    texts
        .iter()
        .map(|t| t.as_ref())
        .collect::<Vec<_>>()
        .join(FRAGMENT_DELIMITER)
}

/// 按分隔符拆分译文响应
///
/// 同时接受 `\r\n` 换行形式的分隔行；每段去除首尾 ` \t\n\r`，
/// 原始空白由回写阶段从节点恢复。
pub fn split_response(response: &str) -> Result<Vec<String>> {
    let delimiter = Regex::new(r"\r?\n---\r?\n")
        .map_err(anyhow::Error::from)?;

    Ok(delimiter
        .split(response)
        .map(|segment| segment.trim_matches(WHITESPACE_CHARS).to_string())
        .collect())
}

/// 对一个成员的片段执行一次批量翻译并校验对齐
///
/// - 片段为空时直接返回空结果，不调用翻译服务
/// - 否则恰好调用一次 `translator`
/// - 分段数不一致返回 [`TranslationError::Alignment`]，不做部分替换
/// - 服务错误原样向上传播，不在此重试
pub async fn align<S, T>(texts: &[S], translator: &T) -> Result<Vec<String>>
where
    S: AsRef<str>,
    T: Translator + ?Sized,
{
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let request = join_fragments(texts);
    let response = translator.translate(&request).await?;
    let segments = split_response(&response)?;

    if segments.len() != texts.len() {
        return Err(TranslationError::Alignment {
            expected: texts.len(),
            actual: segments.len(),
        });
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::mock::MockTranslator;

    #[test]
    fn test_join_fragments() {
        assert_eq!(join_fragments(&["Hi", "Bye"]), "Hi\n---\nBye");
        assert_eq!(join_fragments(&["solo"]), "solo");
    }

    #[test]
    fn test_split_response_accepts_crlf_and_trims() {
        let segments = split_response("Salut\r\n---\r\n Au revoir \n").unwrap();
        assert_eq!(segments, vec!["Salut", "Au revoir"]);
    }

    #[test]
    fn test_split_response_keeps_inline_dashes() {
        let segments = split_response("a --- b\n---\nc").unwrap();
        assert_eq!(segments, vec!["a --- b", "c"]);
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_call() {
        let translator = MockTranslator::echo();
        let empty: [&str; 0] = [];

        let result = align(&empty, &translator).await.unwrap();

        assert!(result.is_empty());
        assert_eq!(translator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_single_call_with_joined_request() {
        let translator = MockTranslator::responding("Salut\n---\nAu revoir");

        let result = align(&["Hi", "Bye"], &translator).await.unwrap();

        assert_eq!(result, vec!["Salut", "Au revoir"]);
        assert_eq!(translator.requests(), vec!["Hi\n---\nBye".to_string()]);
    }

    #[tokio::test]
    async fn test_count_mismatch_is_alignment_error() {
        let translator = MockTranslator::responding("un\n---\ndeux");

        let result = align(&["one", "two", "three"], &translator).await;

        match result {
            Err(TranslationError::Alignment { expected, actual }) => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_service_error_propagates() {
        let translator = MockTranslator::failing();

        let result = align(&["one"], &translator).await;

        assert!(matches!(result, Err(ref e) if e.is_service_error()));
        assert_eq!(translator.call_count(), 1);
    }
}
