use std::time::Duration;

use chrono::{DateTime, Local};

/// 单个成员的回退或跳过记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberIssue {
    pub name: String,
    /// 错误分类 (parse / service / alignment / render / io ...)
    pub kind: String,
    pub message: String,
}

/// 归档翻译统计结构
#[derive(Debug, Clone)]
pub struct ArchiveStats {
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
    pub members_total: usize,
    /// 成功翻译并重写的标记成员
    pub translated: usize,
    /// 没有可翻译片段、原样保留的标记成员
    pub unchanged: usize,
    /// 原样复制的非标记成员
    pub copied: usize,
    /// 回退为原文的标记成员
    pub fallbacks: Vec<MemberIssue>,
    /// 无法打开或创建而被跳过的成员
    pub skipped: Vec<MemberIssue>,
    pub fragments_translated: usize,
    pub translation_calls: usize,
    pub input_size: u64,
    pub output_size: u64,
    pub cancelled: bool,
}

impl ArchiveStats {
    pub fn new() -> Self {
        Self {
            started_at: Local::now(),
            finished_at: None,
            members_total: 0,
            translated: 0,
            unchanged: 0,
            copied: 0,
            fallbacks: Vec::new(),
            skipped: Vec::new(),
            fragments_translated: 0,
            translation_calls: 0,
            input_size: 0,
            output_size: 0,
            cancelled: false,
        }
    }

    /// 已写入输出归档的成员数
    pub fn members_written(&self) -> usize {
        self.translated + self.unchanged + self.copied + self.fallbacks.len()
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Local::now());
    }
}

impl Default for ArchiveStats {
    fn default() -> Self {
        Self::new()
    }
}

/// 打印运行统计
pub fn print_performance_stats(stats: &ArchiveStats, total_duration: Duration) {
    println!("\n📊 翻译统计报告:");
    println!("═══════════════════════════════════════");

    println!("⏱️  时间:");
    println!("   开始时间: {}", stats.started_at.format("%Y-%m-%d %H:%M:%S"));
    if let Some(finished) = stats.finished_at {
        println!("   结束时间: {}", finished.format("%Y-%m-%d %H:%M:%S"));
    }
    println!("   总耗时: {}", format_duration(total_duration));

    println!("\n📦 成员统计:");
    println!("   成员总数: {}", stats.members_total);
    println!("   已翻译: {}", stats.translated);
    println!("   无可翻译文本: {}", stats.unchanged);
    println!("   原样复制: {}", stats.copied);
    println!("   回退原文: {}", stats.fallbacks.len());
    println!("   跳过: {}", stats.skipped.len());

    println!("\n🔤 翻译统计:");
    println!("   翻译片段: {} 项", stats.fragments_translated);
    println!("   翻译请求: {} 次", stats.translation_calls);

    println!("\n📏 文件统计:");
    println!(
        "   输入大小: {} 字节 ({:.1} KB)",
        stats.input_size,
        stats.input_size as f64 / 1024.0
    );
    println!(
        "   输出大小: {} 字节 ({:.1} KB)",
        stats.output_size,
        stats.output_size as f64 / 1024.0
    );

    if !stats.fallbacks.is_empty() || !stats.skipped.is_empty() {
        println!("\n⚠️  问题成员:");
        for issue in stats.fallbacks.iter() {
            println!("   [回退/{}] {}: {}", issue.kind, issue.name, issue.message);
        }
        for issue in stats.skipped.iter() {
            println!("   [跳过/{}] {}: {}", issue.kind, issue.name, issue.message);
        }
    }

    if stats.cancelled {
        println!("\n🛑 运行被中断，剩余成员已原样复制");
    }
}

/// 格式化持续时间
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.3}s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.500s");
    }

    #[test]
    fn test_members_written_excludes_skipped() {
        let mut stats = ArchiveStats::new();
        stats.translated = 2;
        stats.copied = 3;
        stats.fallbacks.push(MemberIssue {
            name: "a.html".to_string(),
            kind: "service".to_string(),
            message: "down".to_string(),
        });
        stats.skipped.push(MemberIssue {
            name: "b.html".to_string(),
            kind: "io".to_string(),
            message: "crc".to_string(),
        });
        assert_eq!(stats.members_written(), 6);
        assert!(stats.finished_at.is_none());
        stats.finish();
        assert!(stats.finished_at.is_some());
    }
}
