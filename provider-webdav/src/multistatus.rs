//! # Multistatus Listing Parser
//!
//! Reads the `207 Multi-Status` body a PROPFIND returns into flat
//! [`ResourceEntry`] values.
//!
//! ## Overview
//!
//! Servers disagree on namespace prefixes (`d:`, `D:`, `lp1:`, or none at
//! all), so elements are matched by local name only. The reader covers
//! exactly the properties the backup listing needs: `href`, `displayname`,
//! `getlastmodified`, and `resourcetype`. It is not a general XML parser.

use chrono::{DateTime, Utc};

use crate::error::{Result, WebDavError};

// =============================================================================
// Resource Entry
// =============================================================================

/// One resource row of a multistatus listing
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEntry {
    /// Percent-decoded server path of the resource
    pub href: String,

    /// `displayname` property, when the server reports one
    pub display_name: Option<String>,

    /// `getlastmodified` property in UTC
    pub last_modified: Option<DateTime<Utc>>,

    /// Whether the resource is a collection
    pub is_collection: bool,
}

impl ResourceEntry {
    /// Final path segment of the href
    pub fn file_name(&self) -> &str {
        let trimmed = self.href.trim_end_matches('/');
        match trimmed.rsplit_once('/') {
            Some((_, name)) => name,
            None => trimmed,
        }
    }

    /// Object name used for filtering: the displayname when present,
    /// otherwise the href's final segment
    pub fn name(&self) -> &str {
        match &self.display_name {
            Some(display) => display.as_str(),
            None => self.file_name(),
        }
    }
}

// =============================================================================
// Parser
// =============================================================================

/// Parse a multistatus document into resource entries
///
/// Responses without an `href` are skipped. Properties a server marks as
/// missing arrive as empty elements inside a 404 propstat; empty values are
/// treated as absent, which makes propstat status filtering unnecessary.
///
/// # Errors
///
/// Returns [`WebDavError::Listing`] when the document has no `multistatus`
/// root element.
pub fn parse_multistatus(document: &str) -> Result<Vec<ResourceEntry>> {
    let Some(root) = first_element_body(document, "multistatus") else {
        return Err(WebDavError::Listing(
            "missing multistatus root element".to_string(),
        ));
    };

    let mut entries = Vec::new();
    for response in element_bodies(root, "response") {
        let Some(raw_href) = first_element_body(response, "href") else {
            continue;
        };
        let href = percent_decode(&unescape(raw_href.trim()));

        let display_name = element_bodies(response, "displayname")
            .into_iter()
            .map(|raw| unescape(raw.trim()))
            .find(|name| !name.is_empty());

        let last_modified = element_bodies(response, "getlastmodified")
            .into_iter()
            .find_map(parse_last_modified);

        let is_collection = element_bodies(response, "resourcetype")
            .into_iter()
            .any(|body| first_element_body(body, "collection").is_some());

        entries.push(ResourceEntry {
            href,
            display_name,
            last_modified,
            is_collection,
        });
    }

    Ok(entries)
}

/// Parse an RFC 1123 `getlastmodified` value
fn parse_last_modified(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw.trim())
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

fn percent_decode(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        // Undecodable sequences belong to foreign objects; the raw form
        // still lets callers filter them out by name.
        Err(_) => raw.to_string(),
    }
}

/// Replace the five predefined XML entities
///
/// `&amp;` must go last so it cannot manufacture new entity sequences.
fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

// =============================================================================
// Element scanning
// =============================================================================
//
// Multistatus never nests an element inside another of the same local name,
// so the first matching close tag always ends the element.

fn local_name_of(qualified: &str) -> &str {
    match qualified.rsplit_once(':') {
        Some((_, local)) => local,
        None => qualified,
    }
}

/// Inner bodies of every element with the given local name, in order
fn element_bodies<'a>(xml: &'a str, local_name: &str) -> Vec<&'a str> {
    let mut bodies = Vec::new();
    let mut pos = 0;
    while let Some((body, resume)) = next_element(xml, local_name, pos) {
        bodies.push(body);
        pos = resume;
    }
    bodies
}

fn first_element_body<'a>(xml: &'a str, local_name: &str) -> Option<&'a str> {
    next_element(xml, local_name, 0).map(|(body, _)| body)
}

/// Find the next matching element at or after `from`
///
/// Returns the element's inner body and the position just past its close
/// tag. Self-closing elements yield an empty body.
fn next_element<'a>(xml: &'a str, local_name: &str, from: usize) -> Option<(&'a str, usize)> {
    let mut pos = from;
    while pos < xml.len() {
        let offset = xml[pos..].find('<')?;
        let tag_start = pos + offset;
        let rest = &xml[tag_start + 1..];

        // Close tags, comments, and processing instructions are not opens.
        if rest.starts_with('/') || rest.starts_with('!') || rest.starts_with('?') {
            pos = tag_start + 1;
            continue;
        }

        let name_end = rest
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(rest.len());
        let close_angle = rest.find('>')?;
        if local_name_of(&rest[..name_end]) != local_name {
            pos = tag_start + 1;
            continue;
        }

        if rest[..close_angle].ends_with('/') {
            return Some(("", tag_start + 1 + close_angle + 1));
        }

        let body_start = tag_start + 1 + close_angle + 1;
        let (body_end, resume) = find_closing_tag(xml, local_name, body_start)?;
        return Some((&xml[body_start..body_end], resume));
    }
    None
}

/// Find the close tag for `local_name` at or after `from`
///
/// Returns the tag's start position and the position just past its `>`.
fn find_closing_tag(xml: &str, local_name: &str, from: usize) -> Option<(usize, usize)> {
    let mut pos = from;
    loop {
        let offset = xml[pos..].find("</")?;
        let tag_start = pos + offset;
        let rest = &xml[tag_start + 2..];
        let close_angle = rest.find('>')?;
        if local_name_of(rest[..close_angle].trim()) == local_name {
            return Some((tag_start, tag_start + 2 + close_angle + 1));
        }
        pos = tag_start + 2;
    }
}
