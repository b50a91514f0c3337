use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use epub_translation_cli::api_constants::{api_config, is_supported_language};
use epub_translation_cli::config::{Cli, Provider, TranslationConfig};
use epub_translation_cli::pipeline::translate_epub_file;
use epub_translation_cli::stats::{format_duration, print_performance_stats, ArchiveStats};
use epub_translation_cli::translator::{
    GeminiTranslator, HttpApiTranslator, RetryingTranslator, Translator,
};
use epub_translation_cli::utils::{
    generate_output_path, init_logging, validate_input_file, validate_output_path,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    init_logging(cli.verbose, cli.quiet);

    // 全局前置条件：任何成员处理之前检查
    validate_input_file(&cli.input)?;
    let output_path = generate_output_path(&cli.input, &cli.output, &cli.lang);
    validate_output_path(&cli.input, &output_path)?;

    let config = cli.translation_config();
    config.validate().context("配置无效")?;

    if !is_supported_language(config.target_lang()) {
        warn!("⚠️  未知的语言代码，将原样用于提示词: {}", config.target_lang());
    }

    let translator = build_translator(&cli, &config)?;

    info!(
        "🚀 开始翻译EPUB ({} -> {})",
        cli.input.display(),
        output_path.display()
    );
    info!(
        "🌐 目标语言: {} | 后端: {} | 模型: {}",
        config.target_lang(),
        translator.name(),
        config.model()
    );

    // Ctrl-C 只在成员之间生效
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 收到中断信号，当前成员完成后停止翻译");
            signal_token.cancel();
        }
    });

    let total_start = Instant::now();

    match translate_epub_file(&cli.input, &output_path, translator.as_ref(), &config, cancel).await {
        Ok(stats) => {
            let total_duration = total_start.elapsed();
            report(&cli, &stats, total_duration, &output_path);
        }
        Err(e) => {
            error!("❌ 翻译失败: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

/// 根据提供方创建翻译后端，缺少凭据属于致命错误
fn build_translator(cli: &Cli, config: &TranslationConfig) -> Result<Box<dyn Translator>> {
    let translator: Box<dyn Translator> = match cli.provider {
        Provider::Gemini => {
            let api_key = cli.api_key.as_deref().unwrap_or_default();
            if api_key.trim().is_empty() {
                anyhow::bail!("必须设置环境变量 {}", api_config::API_KEY_ENV);
            }
            let gemini = GeminiTranslator::new(config, api_key).context("创建Gemini客户端失败")?;
            wrap_retry(gemini, config.max_retries())
        }
        Provider::Http => {
            let http = HttpApiTranslator::new(config).context("创建HTTP翻译客户端失败")?;
            wrap_retry(http, config.max_retries())
        }
    };
    Ok(translator)
}

fn wrap_retry<T: Translator + 'static>(translator: T, max_retries: usize) -> Box<dyn Translator> {
    if max_retries == 0 {
        Box::new(translator)
    } else {
        Box::new(RetryingTranslator::new(translator, max_retries))
    }
}

/// 输出最终汇总；成员级回退不影响完成状态
fn report(cli: &Cli, stats: &ArchiveStats, total_duration: std::time::Duration, output: &std::path::Path) {
    if !cli.quiet {
        info!(
            "✅ 翻译完成！已翻译 {} 个成员，回退 {} 个，跳过 {} 个，总耗时: {}",
            stats.translated,
            stats.fallbacks.len(),
            stats.skipped.len(),
            format_duration(total_duration)
        );
        info!("📄 输出文件: {}", output.display());
    }

    for issue in stats.fallbacks.iter() {
        warn!("  ↩️ 保留原文 {} [{}]: {}", issue.name, issue.kind, issue.message);
    }
    for issue in stats.skipped.iter() {
        warn!("  ⏭️ 已跳过 {} [{}]: {}", issue.name, issue.kind, issue.message);
    }

    if cli.stats || cli.verbose {
        print_performance_stats(stats, total_duration);
    }
}
