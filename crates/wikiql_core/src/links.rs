use std::collections::HashSet;

use serde::Serialize;

pub const MAX_HEADING_DEPTH: usize = 6;

const EXTERNAL_SCHEMES: [&str; 5] = ["http:", "https:", "mailto:", "tel:", "ftp:"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Markdown,
    Wiki,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub text: String,
    pub url: String,
    pub kind: LinkKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: usize,
    pub text: String,
    pub slug: String,
}

/// Markdown `[text](url)` links first, then wiki `[[target|text]]` links.
pub fn extract_links(content: &str) -> Vec<Link> {
    let mut links = extract_markdown_links(content);
    links.extend(extract_wiki_links(content));
    links
}

fn extract_markdown_links(content: &str) -> Vec<Link> {
    let bytes = content.as_bytes();
    let mut out = Vec::new();
    let mut cursor = 0usize;

    while cursor < bytes.len() {
        if bytes[cursor] != b'[' {
            cursor += 1;
            continue;
        }
        let text_start = cursor + 1;
        let Some(text_end) = find_byte(bytes, text_start, b']') else {
            break;
        };
        if text_end > text_start && bytes.get(text_end + 1) == Some(&b'(') {
            let url_start = text_end + 2;
            if let Some(url_end) = find_byte(bytes, url_start, b')')
                && url_end > url_start
            {
                out.push(Link {
                    text: content[text_start..text_end].to_string(),
                    url: content[url_start..url_end].to_string(),
                    kind: LinkKind::Markdown,
                });
                cursor = url_end + 1;
                continue;
            }
        }
        cursor += 1;
    }
    out
}

fn extract_wiki_links(content: &str) -> Vec<Link> {
    let bytes = content.as_bytes();
    let mut out = Vec::new();
    let mut cursor = 0usize;

    while cursor + 1 < bytes.len() {
        if bytes[cursor] == b'[' && bytes[cursor + 1] == b'[' {
            let start = cursor + 2;
            let mut end = start;
            while end + 1 < bytes.len() && !(bytes[end] == b']' && bytes[end + 1] == b']') {
                end += 1;
            }
            if end + 1 >= bytes.len() {
                break;
            }
            if let Some(link) = parse_wiki_link(&content[start..end]) {
                out.push(link);
            }
            cursor = end + 2;
            continue;
        }
        cursor += 1;
    }
    out
}

fn parse_wiki_link(inner: &str) -> Option<Link> {
    let (target, text) = match inner.split_once('|') {
        Some((target, text)) => (target.trim(), text.trim()),
        None => (inner.trim(), ""),
    };
    if target.is_empty() {
        return None;
    }
    let text = if text.is_empty() { target } else { text };
    Some(Link {
        text: text.to_string(),
        url: target.to_string(),
        kind: LinkKind::Wiki,
    })
}

fn find_byte(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|byte| *byte == needle)
        .map(|offset| from + offset)
}

pub fn is_internal_link(url: &str) -> bool {
    if url.starts_with('#') {
        return false;
    }
    let lowered = url.to_ascii_lowercase();
    !EXTERNAL_SCHEMES
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
}

/// Level of an ATX heading line: 1 to 6 `#` followed by whitespace.
pub(crate) fn heading_level(line: &str) -> Option<usize> {
    let hashes = line.bytes().take_while(|byte| *byte == b'#').count();
    if !(1..=MAX_HEADING_DEPTH).contains(&hashes) {
        return None;
    }
    line[hashes..]
        .chars()
        .next()
        .filter(|next| next.is_whitespace())
        .map(|_| hashes)
}

pub fn extract_headings(content: &str, max_depth: usize) -> Vec<Heading> {
    content
        .lines()
        .filter_map(|line| {
            let level = heading_level(line)?;
            if level > max_depth {
                return None;
            }
            let text = line[level..].trim().to_string();
            let slug = slugify(&text);
            Some(Heading { level, text, slug })
        })
        .collect()
}

/// Lowercase, drop everything but ASCII word characters, whitespace and `-`,
/// then turn each whitespace run into one `-`.
pub fn slugify(text: &str) -> String {
    let kept = text
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '-' || ch.is_whitespace())
        .collect::<String>();

    let mut slug = String::with_capacity(kept.len());
    let mut in_space = false;
    for ch in kept.chars() {
        if ch.is_whitespace() {
            if !in_space {
                slug.push('-');
            }
            in_space = true;
        } else {
            slug.push(ch);
            in_space = false;
        }
    }
    slug
}

/// Nested markdown list of anchor links, indented relative to the
/// shallowest heading.
pub fn generate_toc(headings: &[Heading]) -> String {
    let Some(base) = headings.iter().map(|heading| heading.level).min() else {
        return String::new();
    };
    headings
        .iter()
        .map(|heading| {
            format!(
                "{}- [{}](#{})",
                "  ".repeat(heading.level - base),
                heading.text,
                heading.slug
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Internal links whose target page is not among `known_paths`.
pub fn find_broken_links<I, S>(content: &str, known_paths: I) -> Vec<Link>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let known = known_paths
        .into_iter()
        .map(|path| normalize_link_target(path.as_ref()).to_string())
        .collect::<HashSet<_>>();

    extract_links(content)
        .into_iter()
        .filter(|link| is_internal_link(&link.url))
        .filter(|link| {
            let target = normalize_link_target(&link.url);
            !target.is_empty() && !known.contains(target)
        })
        .collect()
}

/// Strip the fragment, query string and surrounding slashes.
fn normalize_link_target(url: &str) -> &str {
    let end = url.find(['#', '?']).unwrap_or(url.len());
    url[..end].trim().trim_start_matches('/').trim_end_matches('/')
}
