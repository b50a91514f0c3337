use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::warn;

/// 根据命令行开关选择日志级别，静默模式仍保留错误输出
pub fn log_level(verbose: bool, quiet: bool) -> tracing::Level {
    if quiet {
        tracing::Level::ERROR
    } else if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    }
}

/// 初始化日志系统
pub fn init_logging(verbose: bool, quiet: bool) {
    tracing_subscriber::fmt()
        .with_max_level(log_level(verbose, quiet))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// 验证输入文件
pub fn validate_input_file(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("输入文件不存在: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("输入路径不是文件: {}", path.display());
    }

    if let Some(ext) = path.extension() {
        if !ext.eq_ignore_ascii_case("epub") {
            warn!("⚠️  文件扩展名不是EPUB: {}", ext.to_string_lossy());
        }
    }

    Ok(())
}

/// 验证输出路径：不能覆盖输入，父目录必须存在
pub fn validate_output_path(input: &Path, output: &Path) -> Result<()> {
    if output == input {
        anyhow::bail!("输出路径不能与输入相同: {}", output.display());
    }
    if let (Ok(a), Ok(b)) = (input.canonicalize(), output.canonicalize()) {
        if a == b {
            anyhow::bail!("输出路径不能与输入相同: {}", output.display());
        }
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            anyhow::bail!("输出目录不存在: {}", parent.display());
        }
    }

    Ok(())
}

/// 生成输出文件路径
pub fn generate_output_path(input: &Path, output: &Option<PathBuf>, lang: &str) -> PathBuf {
    if let Some(output_path) = output {
        return output_path.clone();
    }

    // 自动生成输出路径: book_ko.epub
    let stem = input.file_stem().unwrap_or_default();
    let extension = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "epub".to_string());

    let output_name = format!("{}_{}.{}", stem.to_string_lossy(), lang, extension);

    if let Some(parent) = input.parent() {
        parent.join(output_name)
    } else {
        PathBuf::from(output_name)
    }
}
