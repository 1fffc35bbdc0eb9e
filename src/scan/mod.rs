#[derive(Debug, Clone)]
pub struct CodeBytes<'a> {
    bytes: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> CodeBytes<'a> {
    pub fn new(text: &'a str, start: usize, end: usize) -> Self {
        let bytes = text.as_bytes();
        Self {
            bytes,
            pos: start.min(bytes.len()),
            end: end.min(bytes.len()),
        }
    }
}

impl Iterator for CodeBytes<'_> {
    type Item = (usize, u8);

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.end {
            let i = self.pos;
            let b = self.bytes[i];
            match b {
                b'\'' | b'"' | b'`' => {
                    self.pos = string_end(self.bytes, i, self.end);
                    return Some((i, b));
                }
                b'/' if i + 1 < self.end && matches!(self.bytes[i + 1], b'/' | b'*') => {
                    self.pos = comment_end(self.bytes, i, self.end);
                }
                _ => {
                    self.pos = i + 1;
                    return Some((i, b));
                }
            }
        }
        None
    }
}

fn string_end(bytes: &[u8], start: usize, end: usize) -> usize {
    string_close(bytes, start, end).map_or(end, |close| close + 1)
}

fn string_close(bytes: &[u8], start: usize, end: usize) -> Option<usize> {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < end {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn comment_end(bytes: &[u8], start: usize, end: usize) -> usize {
    if bytes[start + 1] == b'/' {
        return bytes[start..end]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(end, |p| start + p + 1);
    }
    bytes[start + 2..end]
        .windows(2)
        .position(|w| w == b"*/")
        .map_or(end, |p| start + 2 + p + 2)
}

pub fn matching_close(text: &str, open: usize) -> Option<usize> {
    let opener = *text.as_bytes().get(open)?;
    let closer = match opener {
        b'{' => b'}',
        b'[' => b']',
        b'(' => b')',
        _ => return None,
    };

    let mut depth: usize = 0;
    for (i, b) in CodeBytes::new(text, open, text.len()) {
        if b == opener {
            depth += 1;
        } else if b == closer {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

pub fn top_level(span: &str) -> String {
    let mut out = span.as_bytes().to_vec();
    let mut depth: usize = 0;
    let mut nested_start = 0;
    for (i, b) in CodeBytes::new(span, 0, span.len()) {
        match b {
            b'{' | b'[' | b'(' => {
                depth += 1;
                if depth == 2 {
                    nested_start = i + 1;
                }
            }
            b'}' | b']' | b')' => {
                if depth == 2 {
                    out[nested_start..i].fill(b' ');
                }
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
    }
    if depth >= 2 {
        out[nested_start..].fill(b' ');
    }
    String::from_utf8_lossy(&out).into_owned()
}

pub fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

pub fn skip_trivia(text: &str, mut pos: usize) -> usize {
    let bytes = text.as_bytes();
    while pos < bytes.len() {
        match bytes[pos] {
            b if b.is_ascii_whitespace() => pos += 1,
            b'/' if pos + 1 < bytes.len() && matches!(bytes[pos + 1], b'/' | b'*') => {
                pos = comment_end(bytes, pos, bytes.len());
            }
            _ => break,
        }
    }
    pos
}

pub fn key_at(text: &str, pos: usize, key: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    if !bytes.get(pos..)?.starts_with(key.as_bytes()) {
        return None;
    }
    if pos > 0 && is_ident(bytes[pos - 1]) {
        return None;
    }
    let after = pos + key.len();
    if bytes.get(after).is_some_and(|&b| is_ident(b)) {
        return None;
    }
    let colon = skip_trivia(text, after);
    (bytes.get(colon) == Some(&b':')).then(|| skip_trivia(text, colon + 1))
}

pub fn key_positions<'a>(text: &'a str, key: &'a str) -> impl Iterator<Item = usize> + 'a {
    CodeBytes::new(text, 0, text.len()).filter_map(move |(i, _)| key_at(text, i, key))
}

pub fn count_keys(text: &str, key: &str) -> usize {
    key_positions(text, key).count()
}

pub fn quoted_value_at(text: &str, pos: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    let quote = *bytes.get(pos)?;
    if !matches!(quote, b'\'' | b'"' | b'`') {
        return None;
    }
    let close = string_close(bytes, pos, bytes.len())?;
    text.get(pos + 1..close)
}

pub fn quoted_value_after<'a>(text: &'a str, key: &'a str) -> Option<&'a str> {
    key_positions(text, key).find_map(|pos| quoted_value_at(text, pos))
}

pub fn word_at(text: &str, pos: usize, word: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.get(pos..).is_some_and(|rest| rest.starts_with(word.as_bytes()))
        && !bytes
            .get(pos + word.len())
            .is_some_and(|&b| is_ident(b))
}
