
use fancy_regex::Regex;
use serde_yaml::Value;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::warn;

/// Front matter fields of a markdown page plus its body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    pub title: String,
    pub description: String,
    pub weight: String,
    pub content: String,
}

#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("front matter is not a key/value mapping")]
    NotAMapping,
    #[error("front matter has no closing delimiter")]
    Unterminated,
}

/// A line of three or more dashes opens and closes the front matter block
static BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^-{3,}[ \t]*\r?$").expect("valid regex"));

/// Read a markdown file and split its front matter from the body.
///
/// Never fails: malformed front matter degrades to the raw file as content,
/// and an unreadable file yields empty fields.
#[inline]
pub fn parse_front_matter(file_path: &Path) -> FrontMatter {
    let text = match fs::read_to_string(file_path) {
        Ok(text) => text,
        Err(e) => {
            warn!("Could not read {}: {}", file_path.display(), e);
            return FrontMatter::default();
        }
    };

    try_parse(&text).unwrap_or_else(|e| {
        warn!(
            "Could not parse front matter for {}: {}",
            file_path.display(),
            e
        );
        raw_content(text)
    })
}

/// Same rules as [`parse_front_matter`] for text already in memory
#[inline]
pub fn parse_front_matter_str(text: &str) -> FrontMatter {
    try_parse(text).unwrap_or_else(|e| {
        warn!("Could not parse front matter: {}", e);
        raw_content(text.to_string())
    })
}

fn raw_content(content: String) -> FrontMatter {
    FrontMatter {
        content,
        ..FrontMatter::default()
    }
}

fn try_parse(text: &str) -> Result<FrontMatter, FrontMatterError> {
    let body = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut boundaries = BOUNDARY
        .find_iter(body)
        .filter_map(std::result::Result::ok);

    let Some(open) = boundaries.next().filter(|m| m.start() == 0) else {
        return Ok(FrontMatter {
            content: body.trim().to_string(),
            ..FrontMatter::default()
        });
    };
    let close = boundaries.next().ok_or(FrontMatterError::Unterminated)?;

    let yaml = body.get(open.end()..close.start()).unwrap_or_default();
    let fields = match serde_yaml::from_str::<Value>(yaml)? {
        Value::Mapping(mapping) => mapping,
        Value::Null => serde_yaml::Mapping::new(),
        _ => return Err(FrontMatterError::NotAMapping),
    };

    let field = |key: &str| fields.get(key).map(scalar_to_string).unwrap_or_default();

    Ok(FrontMatter {
        title: field("title"),
        description: field("description"),
        weight: field("weight"),
        content: body.get(close.end()..).unwrap_or_default().trim().to_string(),
    })
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}
