//! 归档容器读写模块
//!
//! 对 `zip` 的薄封装：按顺序枚举成员、读取成员内容、原样复制成员、
//! 创建新成员以及最终写入中央目录。

use std::io::{Read, Seek, Write};

use tracing::warn;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Result, TranslationError};

/// 读取成员时预分配的上限，成员声明的大小不可信
const MAX_PREALLOC_BYTES: u64 = 16 * 1024 * 1024;

/// 归档成员的元数据
#[derive(Debug, Clone)]
pub struct MemberInfo {
    /// 在归档中的位置
    pub index: usize,
    /// 成员名（归档内唯一）
    pub name: String,
    pub compression: CompressionMethod,
    pub unix_mode: Option<u32>,
    pub is_dir: bool,
    /// 未压缩大小
    pub size: u64,
}

fn member_error(name: &str, operation: &str, source: impl ToString) -> TranslationError {
    TranslationError::FileOperation {
        path: name.to_string(),
        operation: operation.to_string(),
        source: source.to_string(),
    }
}

/// 源归档读取器
pub struct ArchiveReader<R: Read + Seek> {
    inner: ZipArchive<R>,
}

impl<R: Read + Seek> ArchiveReader<R> {
    /// 打开源归档，失败属于全局错误
    pub fn open(reader: R) -> Result<Self> {
        let inner = ZipArchive::new(reader)
            .map_err(|e| member_error("<source archive>", "打开", e))?;
        Ok(Self { inner })
    }

    /// 成员数量
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }

    /// 打开成员并读取元数据（不解压）
    pub fn member(&mut self, index: usize) -> Result<MemberInfo> {
        let file = self
            .inner
            .by_index_raw(index)
            .map_err(|e| member_error(&format!("#{}", index), "打开", e))?;

        Ok(MemberInfo {
            index,
            name: file.name().to_string(),
            compression: file.compression(),
            unix_mode: file.unix_mode(),
            is_dir: file.is_dir(),
            size: file.size(),
        })
    }

    /// 读取成员的解压后内容
    pub fn read_member(&mut self, info: &MemberInfo) -> Result<Vec<u8>> {
        let mut file = self
            .inner
            .by_index(info.index)
            .map_err(|e| member_error(&info.name, "打开", e))?;

        let mut bytes = Vec::with_capacity(info.size.min(MAX_PREALLOC_BYTES) as usize);
        file.read_to_end(&mut bytes)
            .map_err(|e| member_error(&info.name, "读取", e))?;
        Ok(bytes)
    }

    /// 按成员名列出全部成员（归档顺序）
    #[cfg(test)]
    pub fn member_names(&mut self) -> Vec<String> {
        (0..self.inner.len())
            .filter_map(|i| self.inner.by_index_raw(i).ok().map(|f| f.name().to_string()))
            .collect()
    }
}

/// 目标归档写入器
pub struct ArchiveWriter<W: Write + Seek> {
    inner: ZipWriter<W>,
}

impl<W: Write + Seek> ArchiveWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: ZipWriter::new(writer),
        }
    }

    /// 原样复制成员：压缩数据与元数据均不变
    pub fn copy_member<R: Read + Seek>(
        &mut self,
        source: &mut ArchiveReader<R>,
        info: &MemberInfo,
    ) -> Result<()> {
        let file = source
            .inner
            .by_index_raw(info.index)
            .map_err(|e| member_error(&info.name, "打开", e))?;
        self.inner
            .raw_copy_file(file)
            .map_err(|e| member_error(&info.name, "复制", e))
    }

    /// 以原成员的名称和压缩方式写入新内容
    pub fn write_member(&mut self, info: &MemberInfo, bytes: &[u8]) -> Result<()> {
        let mut options = SimpleFileOptions::default().compression_method(info.compression);
        if let Some(mode) = info.unix_mode {
            options = options.unix_permissions(mode);
        }

        self.inner
            .start_file(info.name.as_str(), options)
            .map_err(|e| member_error(&info.name, "创建", e))?;
        if let Err(e) = self.inner.write_all(bytes) {
            // 丢弃写了一半的成员，避免其进入中央目录
            if let Err(abort) = self.inner.abort_file() {
                warn!("  ⚠️ 无法丢弃未完成的成员 {}: {}", info.name, abort);
            }
            return Err(member_error(&info.name, "写入", e));
        }
        Ok(())
    }

    /// 写入中央目录并返回底层写入器
    pub fn finalize(self) -> Result<W> {
        self.inner
            .finish()
            .map_err(|e| member_error("<output archive>", "完成", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_archive() -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer.start_file("mimetype", stored).unwrap();
        writer.write_all(b"application/epub+zip").unwrap();
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer.start_file("OEBPS/ch01.xhtml", deflated).unwrap();
        writer.write_all(b"<p>Hello</p>").unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_member_enumeration_keeps_order() {
        let mut reader = ArchiveReader::open(Cursor::new(sample_archive())).unwrap();
        assert_eq!(reader.len(), 2);
        assert_eq!(reader.member_names(), vec!["mimetype", "OEBPS/ch01.xhtml"]);

        let info = reader.member(1).unwrap();
        assert_eq!(info.name, "OEBPS/ch01.xhtml");
        assert_eq!(info.compression, CompressionMethod::Deflated);
        assert_eq!(reader.read_member(&info).unwrap(), b"<p>Hello</p>");
    }

    #[test]
    fn test_copy_and_write_members() {
        let mut reader = ArchiveReader::open(Cursor::new(sample_archive())).unwrap();
        let mut writer = ArchiveWriter::new(Cursor::new(Vec::new()));

        let mimetype = reader.member(0).unwrap();
        writer.copy_member(&mut reader, &mimetype).unwrap();
        let chapter = reader.member(1).unwrap();
        writer.write_member(&chapter, b"<p>Bonjour</p>").unwrap();
        let output = writer.finalize().unwrap().into_inner();

        let mut copied = ArchiveReader::open(Cursor::new(output)).unwrap();
        let first = copied.member(0).unwrap();
        assert_eq!(first.compression, CompressionMethod::Stored);
        assert_eq!(copied.read_member(&first).unwrap(), b"application/epub+zip");
        let second = copied.member(1).unwrap();
        assert_eq!(second.compression, CompressionMethod::Deflated);
        assert_eq!(copied.read_member(&second).unwrap(), b"<p>Bonjour</p>");
    }

    #[test]
    fn test_open_rejects_non_archive() {
        let result = ArchiveReader::open(Cursor::new(b"not a zip".to_vec()));
        assert!(matches!(result, Err(TranslationError::FileOperation { .. })));
    }
}
