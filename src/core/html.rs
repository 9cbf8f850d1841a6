// src/core/html.rs
pub fn to_lower(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii() {
                c.to_ascii_lowercase()
            } else {
                c
            }
        })
        .collect()
}

/// Case-insensitive find, from a byte offset.
pub fn find_ci(s: &str, needle: &str, from: usize) -> Option<usize> {
    let lc = to_lower(s);
    let nl = to_lower(needle);
    lc.get(from..)?.find(&nl).map(|i| i + from)
}

/// `(start, end)` of the next `<o ...> ... </c>` block, end past the close tag.
pub fn next_tag_block_ci(s: &str, o: &str, c: &str, from: usize) -> Option<(usize, usize)> {
    let lc = to_lower(s);
    let ol = to_lower(o);
    let cl = to_lower(c);
    let start = lc.get(from..)?.find(&ol)? + from;
    let open_end = s[start..].find('>')? + start + 1;
    let end_rel = lc[open_end..].find(&cl)?;
    let end = open_end + end_rel + c.len();
    Some((start, end))
}

/// `(start, end)` of the next self-contained open tag (e.g. `<img ...>`),
/// end past the `>`.
pub fn open_tag_ci(s: &str, o: &str, from: usize) -> Option<(usize, usize)> {
    let start = find_ci(s, o, from)?;
    let end = s[start..].find('>')? + start + 1;
    Some((start, end))
}

pub fn inner_after_open_tag(block: &str) -> String {
    if let Some(oe) = block.find('>') {
        if let Some(cs) = block.rfind('<') {
            if cs > oe {
                return block[oe + 1..cs].to_string();
            }
        }
    }
    s!()
}

pub fn strip_tags<S: AsRef<str>>(s: S) -> String {
    let s = s.as_ref();

    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;

    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    super::sanitize::normalize_ws(&out)
}

/// Value of `attr="..."` inside a tag slice (quoted or bare, any case).
pub fn attr_value_ci(tag: &str, attr: &str) -> Option<String> {
    let lc = to_lower(tag);
    let needle = join!(" ", &to_lower(attr));
    let bytes = lc.as_bytes();
    let mut from = 0usize;

    while let Some(hit) = lc[from..].find(&needle).map(|i| i + from) {
        let mut j = hit + needle.len();
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j >= bytes.len() || bytes[j] != b'=' {
            from = hit + needle.len();
            continue;
        }
        j += 1;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j >= bytes.len() {
            return None;
        }
        let quote = bytes[j];
        return if quote == b'"' || quote == b'\'' {
            let start = j + 1;
            let end = tag[start..].find(quote as char)? + start;
            Some(tag[start..end].to_string())
        } else {
            let end = tag[j..]
                .find(|c: char| c.is_ascii_whitespace() || c == '>')
                .map(|e| e + j)
                .unwrap_or(tag.len());
            Some(tag[j..end].to_string())
        };
    }
    None
}
