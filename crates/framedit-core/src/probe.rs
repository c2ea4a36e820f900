//! Best-effort guess at whether a host platform can run the editor.

/// What the embedding page knows about the platform it runs on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlatformInfo {
    pub user_agent: String,
    pub vendor: String,
    /// Version reported by Opera's own API, if this is Opera.
    pub opera_version: Option<f64>,
    pub has_document_selection: bool,
    pub has_activex: bool,
}

/// `Some(true)` or `Some(false)` when a known platform rule matches,
/// `None` when nothing is known about the platform.
pub fn is_probably_supported(platform: &PlatformInfo) -> Option<bool> {
    let agent = platform.user_agent.as_str();

    if let Some(version) = platform.opera_version {
        return Some(version >= 9.52);
    }
    if platform.vendor.contains("Apple Computer") {
        if let Some(version) = safari_version(agent) {
            return Some(version >= 3.0);
        }
    }
    if platform.has_document_selection && platform.has_activex {
        if let Some(version) = msie_version(agent) {
            return Some(version >= 6.0);
        }
    }
    if let Some(build) = gecko_build(agent) {
        return Some(build >= 20050901);
    }
    if agent.contains("Chrome/") {
        return Some(true);
    }
    None
}

/// `Version/x.y.` as sent by Safari; the version must be followed by a dot.
fn safari_version(agent: &str) -> Option<f64> {
    let (_, rest) = agent.split_once("Version/")?;
    let integer = rest.bytes().take_while(u8::is_ascii_digit).count();
    let after = rest[integer..].strip_prefix('.')?;
    if integer == 0 {
        return None;
    }
    let fraction = after.bytes().take_while(u8::is_ascii_digit).count();
    let end = if fraction > 0 && after[fraction..].starts_with('.') {
        integer + 1 + fraction
    } else {
        integer
    };
    rest[..end].parse().ok()
}

fn msie_version(agent: &str) -> Option<f64> {
    let (_, rest) = agent.split_once("MSIE ")?;
    let (number, tail) = leading_number(rest)?;
    let boundary = tail
        .chars()
        .next()
        .is_none_or(|ch| !ch.is_alphanumeric() && ch != '_');
    boundary.then_some(number)
}

/// Eight-digit build date after `gecko/`, matched case-insensitively.
fn gecko_build(agent: &str) -> Option<u32> {
    let lower = agent.to_ascii_lowercase();
    let mut search = lower.as_str();
    while let Some(index) = search.find("gecko/") {
        let rest = &search[index + "gecko/".len()..];
        let digits = rest
            .get(..8)
            .filter(|digits| digits.bytes().all(|byte| byte.is_ascii_digit()));
        if let Some(digits) = digits {
            return digits.parse().ok();
        }
        search = rest;
    }
    None
}

/// Parses `digits[.[digits]]` at the start of `text`.
fn leading_number(text: &str) -> Option<(f64, &str)> {
    let integer = text.bytes().take_while(u8::is_ascii_digit).count();
    if integer == 0 {
        return None;
    }
    let mut end = integer;
    if let Some(after) = text[integer..].strip_prefix('.') {
        end = integer + 1 + after.bytes().take_while(u8::is_ascii_digit).count();
    }
    let number = text[..end].trim_end_matches('.').parse().ok()?;
    Some((number, &text[end..]))
}
