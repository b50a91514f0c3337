//! 归档翻译流水线
//!
//! 逐个成员顺序处理：标记成员经过 提取 → 批量对齐 → 回写 → 序列化，
//! 其余成员原样复制。单个成员的任何错误都只会让该成员保留原文（或在无法打开时跳过），
//! 不会中断整个归档。

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::archive::{ArchiveReader, ArchiveWriter, MemberInfo};
use crate::batch::align;
use crate::config::TranslationConfig;
use crate::error::{Result, TranslationError};
use crate::html_processor::{extract_fragments, parse_markup, reinject_fragments, serialize_markup};
use crate::stats::{ArchiveStats, MemberIssue};
use crate::translation_error;
use crate::translator::Translator;

/// 单个标记成员的转换结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupOutcome {
    /// 已翻译并重新序列化
    Translated { bytes: Vec<u8>, fragments: usize },
    /// 没有可翻译片段，原字节保持不变
    Unchanged,
}

/// 转换一个标记成员
///
/// 纯函数式流程，不做日志也不做IO；错误交给调用方决定回退策略。
pub async fn transform_markup<T: Translator + ?Sized>(
    bytes: &[u8],
    eligible_tags: &[String],
    translator: &T,
) -> Result<MarkupOutcome> {
    let dom = parse_markup(bytes)?;
    let fragments = extract_fragments(&dom, eligible_tags);

    if fragments.is_empty() {
        return Ok(MarkupOutcome::Unchanged);
    }

    let texts: Vec<&str> = fragments.iter().map(|f| f.text()).collect();
    let translations = align(&texts, translator).await?;

    reinject_fragments(&fragments, &translations)?;
    let rendered = serialize_markup(&dom)?;

    Ok(MarkupOutcome::Translated {
        bytes: rendered,
        fragments: fragments.len(),
    })
}

/// 统计实际发出的翻译请求
struct CountingTranslator<'a, T: ?Sized> {
    inner: &'a T,
    calls: AtomicUsize,
}

#[async_trait]
impl<'a, T: Translator + ?Sized> Translator for CountingTranslator<'a, T> {
    async fn translate(&self, text: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.translate(text).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

fn issue(name: &str, error: &TranslationError) -> MemberIssue {
    MemberIssue {
        name: name.to_string(),
        kind: error.kind().to_string(),
        message: error.to_string(),
    }
}

/// 归档翻译流水线
pub struct ArchivePipeline<'a, T: Translator + ?Sized> {
    translator: CountingTranslator<'a, T>,
    config: &'a TranslationConfig,
    cancel: CancellationToken,
}

impl<'a, T: Translator + ?Sized> ArchivePipeline<'a, T> {
    pub fn new(translator: &'a T, config: &'a TranslationConfig) -> Self {
        Self {
            translator: CountingTranslator {
                inner: translator,
                calls: AtomicUsize::new(0),
            },
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// 设置取消令牌，仅在成员之间检查
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// 翻译内存或任意可寻址流中的归档
    pub async fn run<R, W>(&self, mut reader: R, writer: W) -> Result<(W, ArchiveStats)>
    where
        R: Read + Seek,
        W: Write + Seek,
    {
        let input_size = reader
            .seek(SeekFrom::End(0))
            .and_then(|size| reader.rewind().map(|_| size))
            .map_err(|e| translation_error!(file_op, "<source archive>", "读取", e))?;

        let source = ArchiveReader::open(reader)?;
        let (writer, mut stats) = self.process(source, writer).await?;
        stats.input_size = input_size;
        Ok((writer, stats))
    }

    /// 按成员顺序处理整个归档，最后写入中央目录
    pub async fn process<R, W>(
        &self,
        mut source: ArchiveReader<R>,
        writer: W,
    ) -> Result<(W, ArchiveStats)>
    where
        R: Read + Seek,
        W: Write + Seek,
    {
        let mut output = ArchiveWriter::new(writer);
        let mut stats = ArchiveStats::new();
        stats.members_total = source.len();
        let calls_before = self.translator.calls.load(Ordering::SeqCst);

        info!("📚 归档共 {} 个成员", stats.members_total);

        for index in 0..source.len() {
            let info = match source.member(index) {
                Ok(info) => info,
                Err(e) => {
                    warn!("  ⚠️ 无法打开成员 #{}: {}，已跳过", index, e);
                    stats.skipped.push(issue(&format!("#{}", index), &e));
                    continue;
                }
            };

            if self.cancel.is_cancelled() {
                if !stats.cancelled {
                    warn!("🛑 收到取消请求，剩余成员将原样复制");
                    stats.cancelled = true;
                }
                self.copy_member(&mut source, &mut output, &info, &mut stats);
                continue;
            }

            if info.is_dir || !self.config.is_markup_member(&info.name) {
                self.copy_member(&mut source, &mut output, &info, &mut stats);
                continue;
            }

            self.process_markup(&mut source, &mut output, &info, &mut stats)
                .await;
        }

        let mut writer = output.finalize()?;
        stats.output_size = writer.stream_position().unwrap_or_default();
        stats.translation_calls = self.translator.calls.load(Ordering::SeqCst) - calls_before;
        stats.finish();

        Ok((writer, stats))
    }

    fn copy_member<R, W>(
        &self,
        source: &mut ArchiveReader<R>,
        output: &mut ArchiveWriter<W>,
        info: &MemberInfo,
        stats: &mut ArchiveStats,
    ) where
        R: Read + Seek,
        W: Write + Seek,
    {
        match output.copy_member(source, info) {
            Ok(()) => {
                debug!("  📄 原样复制: {}", info.name);
                stats.copied += 1;
            }
            Err(e) => {
                warn!("  ⚠️ 复制成员失败 {}: {}，已跳过", info.name, e);
                stats.skipped.push(issue(&info.name, &e));
            }
        }
    }

    async fn process_markup<R, W>(
        &self,
        source: &mut ArchiveReader<R>,
        output: &mut ArchiveWriter<W>,
        info: &MemberInfo,
        stats: &mut ArchiveStats,
    ) where
        R: Read + Seek,
        W: Write + Seek,
    {
        info!("  ⚙️ 处理翻译: {}", info.name);

        let original = match source.read_member(info) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("  ⚠️ 读取成员失败 {}: {}，尝试原样复制", info.name, e);
                if output.copy_member(source, info).is_ok() {
                    stats.fallbacks.push(issue(&info.name, &e));
                } else {
                    stats.skipped.push(issue(&info.name, &e));
                }
                return;
            }
        };

        let outcome = transform_markup(&original, self.config.eligible_tags(), &self.translator).await;

        let (payload, disposition) = match outcome {
            Ok(MarkupOutcome::Translated { bytes, fragments }) => {
                (bytes, Disposition::Translated(fragments))
            }
            Ok(MarkupOutcome::Unchanged) => (original, Disposition::Unchanged),
            Err(e) => {
                match &e {
                    TranslationError::Alignment { expected, actual } => warn!(
                        "  ⚠️ {}: 原文 ({}) 与译文 ({}) 分段数不一致，保留原文",
                        info.name, expected, actual
                    ),
                    _ => warn!("  ⚠️ {}: {}，保留原文", info.name, e),
                }
                (original, Disposition::Fallback(e))
            }
        };

        if let Err(e) = output.write_member(info, &payload) {
            warn!("  ⚠️ 写入成员失败 {}: {}，已跳过", info.name, e);
            stats.skipped.push(issue(&info.name, &e));
            return;
        }

        match disposition {
            Disposition::Translated(fragments) => {
                debug!("  ✅ {}: 已翻译 {} 个片段", info.name, fragments);
                stats.translated += 1;
                stats.fragments_translated += fragments;
            }
            Disposition::Unchanged => {
                debug!("  📄 {}: 没有可翻译文本", info.name);
                stats.unchanged += 1;
            }
            Disposition::Fallback(e) => stats.fallbacks.push(issue(&info.name, &e)),
        }
    }
}

/// 标记成员写入后的统计归类
enum Disposition {
    Translated(usize),
    Unchanged,
    Fallback(TranslationError),
}

/// 归档翻译的文件入口
///
/// 源归档无法打开、输出无法创建或中央目录写入失败时返回错误，其余错误均按成员回退。
pub async fn translate_epub_file<T: Translator + ?Sized>(
    input: &Path,
    output: &Path,
    translator: &T,
    config: &TranslationConfig,
    cancel: CancellationToken,
) -> Result<ArchiveStats> {
    let source_file = File::open(input)
        .map_err(|e| translation_error!(file_op, input.display(), "读取", e))?;
    let input_size = source_file.metadata().map(|m| m.len()).unwrap_or_default();

    // 先确认源归档可读，再创建输出文件
    let source = ArchiveReader::open(BufReader::new(source_file))?;

    let dest_file = File::create(output)
        .map_err(|e| translation_error!(file_op, output.display(), "创建", e))?;

    let pipeline = ArchivePipeline::new(translator, config).with_cancellation(cancel);
    let (mut writer, mut stats) = pipeline.process(source, BufWriter::new(dest_file)).await?;
    writer
        .flush()
        .map_err(|e| translation_error!(file_op, output.display(), "写入", e))?;

    stats.input_size = input_size;
    Ok(stats)
}
