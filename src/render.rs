//! Terminal rendering of transcript content
//!
//! Assistant replies arrive as markdown (sometimes with embedded HTML). They
//! go through a GitHub-flavoured markdown pass where single newlines are kept
//! as line breaks, then get flattened to plain text for the terminal.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use scraper::{Html, Node, Selector};

const IMAGE_SELECTOR: &str = ".generated-image-container img";

/// Render markdown to plain terminal text
pub fn render_markdown(content: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;

    let mut out = String::new();
    // One entry per open list: next ordinal for ordered lists
    let mut lists: Vec<Option<u64>> = Vec::new();
    let mut link_targets: Vec<String> = Vec::new();
    let mut in_code_block = false;
    let mut in_image = false;
    // Raw lines of the HTML block being read, parsed as one fragment at its end
    let mut html_block: Option<String> = None;

    for event in Parser::new_ext(content, options) {
        match event {
            Event::Start(tag) => match tag {
                Tag::List(start) => {
                    ensure_line_start(&mut out);
                    lists.push(start);
                }
                Tag::Item => {
                    ensure_line_start(&mut out);
                    let depth = lists.len().saturating_sub(1);
                    out.push_str(&"  ".repeat(depth));
                    match lists.last_mut() {
                        Some(Some(n)) => {
                            out.push_str(&format!("{n}. "));
                            *n += 1;
                        }
                        _ => out.push_str("- "),
                    }
                }
                Tag::CodeBlock(kind) => {
                    ensure_line_start(&mut out);
                    if let CodeBlockKind::Fenced(lang) = kind {
                        if !lang.is_empty() {
                            out.push_str(&format!("[{lang}]\n"));
                        }
                    }
                    in_code_block = true;
                }
                Tag::Link { dest_url, .. } => link_targets.push(dest_url.to_string()),
                Tag::Image { dest_url, .. } => {
                    out.push_str(&format!("[image: {dest_url}]"));
                    in_image = true;
                }
                Tag::HtmlBlock => html_block = Some(String::new()),
                _ => {}
            },
            Event::End(tag) => match tag {
                TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Table => out.push_str("\n\n"),
                TagEnd::TableRow | TagEnd::TableHead => out.push('\n'),
                TagEnd::TableCell => out.push_str(" | "),
                TagEnd::List(_) => {
                    lists.pop();
                    if lists.is_empty() {
                        out.push('\n');
                    }
                }
                TagEnd::Item => ensure_line_start(&mut out),
                TagEnd::CodeBlock => {
                    in_code_block = false;
                    out.push('\n');
                }
                TagEnd::Link => {
                    if let Some(url) = link_targets.pop() {
                        out.push_str(&format!(" ({url})"));
                    }
                }
                TagEnd::Image => in_image = false,
                TagEnd::HtmlBlock => {
                    if let Some(html) = html_block.take() {
                        let text = render_html(&html);
                        let text = text.trim();
                        if !text.is_empty() {
                            ensure_line_start(&mut out);
                            out.push_str(text);
                            out.push_str("\n\n");
                        }
                    }
                }
                _ => {}
            },
            Event::Text(_) if in_image => {}
            Event::Text(text) if in_code_block => {
                for line in text.lines() {
                    out.push_str("    ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
            Event::Text(text) => out.push_str(&text),
            Event::Code(code) => {
                out.push('`');
                out.push_str(&code);
                out.push('`');
            }
            Event::Html(html) => match html_block.as_mut() {
                Some(block) => block.push_str(&html),
                None => out.push_str(&render_html(&html)),
            },
            Event::InlineHtml(html) => out.push_str(&render_html(&html)),
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::Rule => {
                ensure_line_start(&mut out);
                out.push_str("----\n\n");
            }
            Event::TaskListMarker(done) => out.push_str(if done { "[x] " } else { "[ ] " }),
            _ => {}
        }
    }

    out.trim_end().to_string()
}

fn ensure_line_start(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

/// Flatten an HTML fragment to its text, turning images into
/// `[image: url]` markers
fn render_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Text(text) => {
                let hidden = node
                    .parent()
                    .and_then(|parent| parent.value().as_element())
                    .is_some_and(|parent| matches!(parent.name(), "script" | "style"));
                if !hidden {
                    out.push_str(text);
                }
            }
            Node::Element(element) if element.name() == "img" => {
                if let Some(src) = element.attr("src").filter(|src| !src.is_empty()) {
                    out.push_str(&format!("[image: {src}]"));
                }
            }
            _ => {}
        }
    }
    out
}

/// URL of an image embedded in a generated-image container, if the message
/// carries one
pub fn embedded_image_url(content: &str) -> Option<String> {
    let selector = Selector::parse(IMAGE_SELECTOR).ok()?;
    let fragment = Html::parse_fragment(content);
    let url = fragment
        .select(&selector)
        .find_map(|img| img.value().attr("src"))
        .filter(|src| !src.is_empty())
        .map(str::to_string);
    url
}
