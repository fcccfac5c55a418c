#[derive(Debug, Clone, PartialEq)]
pub enum ConfigToken {
    String(String),
    Float(f32),
    Number(i32),
}

impl ConfigToken {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigToken::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Whole numbers are accepted where a float is expected.
    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            ConfigToken::Float(value) => Some(value),
            ConfigToken::Number(value) => Some(value as f32),
            ConfigToken::String(_) => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            ConfigToken::Number(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLine {
    /// 1-based line number in the source text.
    pub line_number: usize,
    pub key: String,
    pub params: Vec<ConfigToken>,
}

impl ConfigLine {
    pub fn param(&self, index: usize) -> Option<&ConfigToken> {
        self.params.get(index)
    }

    pub fn string(&self, index: usize) -> Option<&str> {
        self.param(index).and_then(ConfigToken::as_str)
    }

    pub fn float(&self, index: usize) -> Option<f32> {
        self.param(index).and_then(ConfigToken::as_f32)
    }

    pub fn number(&self, index: usize) -> Option<i32> {
        self.param(index).and_then(ConfigToken::as_i32)
    }
}

/// Reads the next token. Quoted strings are a single token (without quotes). An unquoted `;`
/// starts a comment that runs to the end of the line.
fn parse_string(chars: &mut std::iter::Peekable<std::str::Chars>) -> Option<String> {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next(); // Skip leading whitespace
    }

    let mut result = String::new();

    match chars.peek()? {
        ';' => return None,
        '"' => {
            chars.next(); // Skip opening quote
            while let Some(&ch) = chars.peek() {
                chars.next();
                if ch == '"' {
                    break;
                }
                result.push(ch);
            }
        }
        _ => {
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() || ch == ';' {
                    break;
                }
                result.push(ch);
                chars.next();
            }
        }
    }

    Some(result)
}

pub fn parse_line(line_number: usize, line: &str) -> Option<ConfigLine> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(';') {
        return None;
    }

    let mut chars = line.chars().peekable();

    let key = parse_string(&mut chars)?;

    let mut params = Vec::new();
    while let Some(param_str) = parse_string(&mut chars) {
        if let Ok(num) = param_str.parse::<i32>() {
            params.push(ConfigToken::Number(num));
        } else if let Ok(num) = param_str.parse::<f32>() {
            params.push(ConfigToken::Float(num));
        } else {
            params.push(ConfigToken::String(param_str));
        }
    }

    Some(ConfigLine {
        line_number,
        key,
        params,
    })
}

pub struct ConfigLines {
    lines: Vec<ConfigLine>,
}

impl ConfigLines {
    pub fn parse(s: &str) -> Self {
        Self {
            lines: s
                .lines()
                .enumerate()
                .filter_map(|(i, line)| parse_line(i + 1, line))
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigLine> {
        self.lines.iter()
    }
}

impl IntoIterator for ConfigLines {
    type Item = ConfigLine;
    type IntoIter = std::vec::IntoIter<ConfigLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic() {
        let line = parse_line(1, "BONE 3 10.5 -2 \"thumb tip\"").unwrap();
        assert_eq!(line.key, "BONE");
        assert_eq!(
            line.params,
            &[
                ConfigToken::Number(3),
                ConfigToken::Float(10.5),
                ConfigToken::Number(-2),
                ConfigToken::String(String::from("thumb tip")),
            ]
        );
    }

    #[test]
    fn comments_and_blank_lines() {
        assert!(parse_line(1, "").is_none());
        assert!(parse_line(1, "   ").is_none());
        assert!(parse_line(1, "; a comment").is_none());

        let line = parse_line(4, "ROOT_POSITION 0 0 0.1 ; in meters").unwrap();
        assert_eq!(line.line_number, 4);
        assert_eq!(line.params.len(), 3);

        let line = parse_line(1, "END_HAND_POSE;").unwrap();
        assert_eq!(line.key, "END_HAND_POSE");
        assert!(line.params.is_empty());
    }

    #[test]
    fn typed_access() {
        let line = parse_line(1, "KEY 2 0.5 name").unwrap();
        assert_eq!(line.number(0), Some(2));
        assert_eq!(line.float(0), Some(2.0));
        assert_eq!(line.float(1), Some(0.5));
        assert_eq!(line.number(1), None);
        assert_eq!(line.string(2), Some("name"));
        assert_eq!(line.float(2), None);
        assert_eq!(line.param(3), None);
    }

    #[test]
    fn line_numbers_skip_nothing() {
        let lines = ConfigLines::parse("; header\n\nFIRST\n  SECOND 1\n");
        let numbers: Vec<(usize, &str)> = lines
            .iter()
            .map(|line| (line.line_number, line.key.as_str()))
            .collect();
        assert_eq!(numbers, vec![(3, "FIRST"), (4, "SECOND")]);
    }
}
