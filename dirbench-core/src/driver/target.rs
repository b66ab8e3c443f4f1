use std::collections::HashSet;
use std::path::Path;

use crate::error::{Error, Result};

/// A benchmark target: the name used in file names and the url handed to the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub site: String,
    pub url: String,
}

impl Target {
    /// Parses `URL` or `SITE URL`. Blank lines and `#` comments yield `None`.
    pub fn parse_line(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let mut parts = line.split_whitespace();
        let (site, raw_url) = match (parts.next(), parts.next(), parts.next()) {
            (Some(url), None, _) => (None, url),
            (Some(site), Some(url), None) => (Some(site.to_string()), url),
            _ => return Err(Error::InvalidTarget(line.to_string())),
        };

        let url = url::Url::parse(raw_url).map_err(|_| Error::InvalidTarget(line.to_string()))?;
        let site = match site {
            Some(site) => site,
            None => site_from_url(&url).ok_or_else(|| Error::InvalidTarget(line.to_string()))?,
        };

        if !is_valid_name(&site) {
            return Err(Error::InvalidTarget(format!(
                "{line} (site `{site}` must be non-empty and contain no `_` or path separators)"
            )));
        }

        Ok(Some(Self {
            site,
            url: raw_url.to_string(),
        }))
    }
}

/// Last non-empty path segment, or the host when the url has no path.
fn site_from_url(url: &url::Url) -> Option<String> {
    let from_path = url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .map(str::to_string);
    from_path.or_else(|| url.host_str().map(str::to_string))
}

/// Mode and site names end up as `_`-separated file name segments.
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['_', '/', '\\'])
}

pub fn parse_targets(text: &str) -> Result<Vec<Target>> {
    let mut targets = Vec::new();
    let mut seen = HashSet::new();

    for line in text.lines() {
        let Some(target) = Target::parse_line(line)? else {
            continue;
        };
        if !seen.insert(target.site.clone()) {
            return Err(Error::DuplicateSite(target.site));
        }
        targets.push(target);
    }

    Ok(targets)
}

pub fn load_targets(path: &Path) -> Result<Vec<Target>> {
    let text = std::fs::read_to_string(path).map_err(|err| Error::io_at(path, err))?;
    parse_targets(&text)
}
