//! HTML处理模块
//!
//! 提供HTML解析、可翻译片段提取、译文回写和序列化功能。
//!
//! 片段以提取顺序作为唯一的对应关系：第 n 个提取出的片段必须接收第 n 段译文。
//! 片段直接持有DOM节点句柄 (`Rc`)，回写时只可变借用该节点的文本单元。

// 第三方crate导入
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

// 本地模块导入
use crate::api_constants::markup_config::WHITESPACE_CHARS;
use crate::error::Result;
use crate::translation_error;

/// 一个可翻译的文本片段
///
/// 指向某个可翻译元素的直接子文本节点。
#[derive(Debug, Clone)]
pub struct TextFragment {
    node: Handle,
    index: usize,
    text: String,
}

impl TextFragment {
    /// 去除首尾空白后的文本，即提交翻译的内容
    pub fn text(&self) -> &str {
        &self.text
    }

    /// 提取顺序中的位置
    pub fn index(&self) -> usize {
        self.index
    }

    /// 节点当前的完整文本内容
    pub fn raw_content(&self) -> String {
        match self.node.data {
            NodeData::Text { ref contents } => contents.borrow().to_string(),
            _ => String::new(),
        }
    }
}

/// 将文本拆分为 (首部空白, 正文, 尾部空白)
pub fn split_whitespace_runs(text: &str) -> (&str, &str, &str) {
    let start_trimmed = text.trim_start_matches(WHITESPACE_CHARS);
    let leading = &text[..text.len() - start_trimmed.len()];
    let core = start_trimmed.trim_end_matches(WHITESPACE_CHARS);
    let trailing = &start_trimmed[core.len()..];
    (leading, core, trailing)
}

/// 解析成员字节为DOM
///
/// 非UTF-8内容视为解析失败，由调用方回退为原样复制。
pub fn parse_markup(bytes: &[u8]) -> Result<RcDom> {
    let html = std::str::from_utf8(bytes)
        .map_err(|e| translation_error!(html_parse, format!("内容不是有效的UTF-8: {}", e)))?;

    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| translation_error!(html_parse, e))
}

/// 按文档顺序提取可翻译片段
///
/// 深度优先遍历整棵树，只收集父元素标签属于 `eligible_tags` 的直接子文本节点，
/// 去除 ` \t\n\r` 后为空的文本节点被跳过。DOM在提取过程中只读。
pub fn extract_fragments<S: AsRef<str>>(dom: &RcDom, eligible_tags: &[S]) -> Vec<TextFragment> {
    let mut fragments = Vec::new();
    // (节点, 父元素是否可翻译)
    let mut stack: Vec<(Handle, bool)> = vec![(dom.document.clone(), false)];

    while let Some((node, parent_eligible)) = stack.pop() {
        let eligible = match node.data {
            NodeData::Text { ref contents } => {
                if parent_eligible {
                    let content = contents.borrow();
                    let (_, core, _) = split_whitespace_runs(&content);
                    if !core.is_empty() {
                        fragments.push(TextFragment {
                            node: node.clone(),
                            index: fragments.len(),
                            text: core.to_string(),
                        });
                    }
                }
                false
            }
            NodeData::Element { ref name, .. } => {
                let tag_name: &str = name.local.as_ref();
                eligible_tags
                    .iter()
                    .any(|t| t.as_ref().eq_ignore_ascii_case(tag_name))
            }
            _ => false,
        };

        // 逆序入栈以保证文档顺序出栈
        for child in node.children.borrow().iter().rev() {
            stack.push((child.clone(), eligible));
        }
    }

    fragments
}

/// 将译文按位置回写到片段节点
///
/// 首尾空白从节点的原始内容重新计算，内容写为 `首部空白 + 译文 + 尾部空白`。
/// 长度不一致属于调用契约错误，返回内部错误且不修改任何节点。
pub fn reinject_fragments(fragments: &[TextFragment], translations: &[String]) -> Result<()> {
    if fragments.len() != translations.len() {
        return Err(anyhow::anyhow!(
            "回写契约被破坏: {} 个片段, {} 段译文",
            fragments.len(),
            translations.len()
        )
        .into());
    }

    for (fragment, translation) in fragments.iter().zip(translations.iter()) {
        let original = fragment.raw_content();
        let (leading, _, trailing) = split_whitespace_runs(&original);

        if let NodeData::Text { ref contents } = fragment.node.data {

            let mut content_ref = contents.borrow_mut();
            content_ref.clear();
            content_ref.push_slice(leading);
            content_ref.push_slice(translation);
            content_ref.push_slice(trailing);
        }
    }

    Ok(())
}

/// 序列化DOM为HTML字节
pub fn serialize_markup(dom: &RcDom) -> Result<Vec<u8>> {
    use html5ever::serialize::{serialize, SerializeOpts};
    use markup5ever_rcdom::SerializableHandle;

    let mut buffer = Vec::new();

    serialize(
        &mut buffer,
        &SerializableHandle::from(dom.document.clone()),
        SerializeOpts::default(),
    )
    .map_err(|e| translation_error!(render, e))?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TranslationError;

    fn texts(fragments: &[TextFragment]) -> Vec<String> {
        fragments.iter().map(|f| f.text().to_string()).collect()
    }

    fn render(dom: &RcDom) -> String {
        String::from_utf8(serialize_markup(dom).unwrap()).unwrap()
    }

    #[test]
    fn test_split_whitespace_runs() {
        assert_eq!(
            split_whitespace_runs("  Hello world  \n"),
            ("  ", "Hello world", "  \n")
        );
        assert_eq!(split_whitespace_runs("plain"), ("", "plain", ""));
        assert_eq!(split_whitespace_runs(" \t\r\n"), (" \t\r\n", "", ""));
        assert_eq!(split_whitespace_runs(""), ("", "", ""));
        // 不间断空格不属于可保留空白
        assert_eq!(
            split_whitespace_runs("\u{a0}Hi "),
            ("", "\u{a0}Hi", " ")
        );
    }

    #[test]
    fn test_extract_direct_children_of_paragraphs_only() {
        let html = "<html><body><h1>Title</h1><p>First <b>bold</b> tail</p><div>Outside</div><p>Second</p></body></html>";
        let dom = parse_markup(html.as_bytes()).unwrap();
        let fragments = extract_fragments(&dom, &["p"]);

        assert_eq!(texts(&fragments), vec!["First", "tail", "Second"]);
        for (i, fragment) in fragments.iter().enumerate() {
            assert_eq!(fragment.index(), i);
        }
    }

    #[test]
    fn test_whitespace_only_nodes_are_skipped() {
        let html = "<p>  \n\t </p><p>\r\n</p><p> x </p>";
        let dom = parse_markup(html.as_bytes()).unwrap();
        let fragments = extract_fragments(&dom, &["p"]);

        assert_eq!(texts(&fragments), vec!["x"]);
    }

    #[test]
    fn test_extraction_order_is_stable() {
        let html = "<ul><li>one<ul><li>two</li></ul>three</li></ul><p>four</p>";
        let first: Vec<String> = texts(&extract_fragments(
            &parse_markup(html.as_bytes()).unwrap(),
            &["li", "p"],
        ));
        let second: Vec<String> = texts(&extract_fragments(
            &parse_markup(html.as_bytes()).unwrap(),
            &["li", "p"],
        ));

        assert_eq!(first, vec!["one", "two", "three", "four"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_eligible_tag_matching_is_case_insensitive() {
        let dom = parse_markup(b"<P>Upper</P><blockquote>Quote</blockquote>").unwrap();
        let fragments = extract_fragments(&dom, &["P", "BlockQuote"]);
        assert_eq!(texts(&fragments), vec!["Upper", "Quote"]);
    }

    #[test]
    fn test_reinject_preserves_whitespace() {
        let dom = parse_markup("<p>  Hello world  \n</p>".as_bytes()).unwrap();
        let fragments = extract_fragments(&dom, &["p"]);
        assert_eq!(texts(&fragments), vec!["Hello world"]);

        reinject_fragments(&fragments, &["Bonjour".to_string()]).unwrap();

        assert_eq!(fragments[0].raw_content(), "  Bonjour  \n");
    }

    #[test]
    fn test_reinject_places_segment_by_position() {
        let dom = parse_markup(b"<p>a</p><p>b <i>x</i> c</p><p>d</p>").unwrap();
        let fragments = extract_fragments(&dom, &["p"]);
        let translations: Vec<String> = ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect();

        reinject_fragments(&fragments, &translations).unwrap();

        let html = render(&dom);
        assert!(html.contains("<p>A</p><p>B <i>x</i> C</p><p>D</p>"), "{}", html);
    }

    #[test]
    fn test_reinject_length_mismatch_leaves_tree_untouched() {
        let dom = parse_markup(b"<p>a</p><p>b</p>").unwrap();
        let fragments = extract_fragments(&dom, &["p"]);

        let result = reinject_fragments(&fragments, &["only".to_string()]);

        assert!(matches!(result, Err(TranslationError::Internal { .. })));
        assert_eq!(fragments[0].raw_content(), "a");
        assert_eq!(fragments[1].raw_content(), "b");
    }

    #[test]
    fn test_translated_text_is_escaped_on_render() {
        let dom = parse_markup(b"<p>Tom</p>").unwrap();
        let fragments = extract_fragments(&dom, &["p"]);
        reinject_fragments(&fragments, &["Tom & <Jerry>".to_string()]).unwrap();

        let html = render(&dom);
        assert!(html.contains("<p>Tom &amp; &lt;Jerry&gt;</p>"), "{}", html);
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let result = parse_markup(&[0x3c, 0x70, 0x3e, 0xff, 0xfe]);
        assert!(matches!(result, Err(TranslationError::HtmlParse { .. })));
    }
}
