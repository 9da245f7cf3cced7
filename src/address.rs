//! Address parsing and reference resolution (RFC 3986).
//!
//! Splits an absolute address into its components, re-serialises it after a
//! component changes and resolves relative references against a base.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("empty address")]
    Empty,

    #[error("relative address without a base: {0}")]
    MissingScheme(String),

    #[error("invalid scheme: {0}")]
    InvalidScheme(String),

    #[error("invalid port: {0}")]
    InvalidPort(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Authority {
    userinfo: Option<String>,
    hostname: String,
    port: Option<u16>,
}

/// An absolute address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    scheme: String,
    authority: Option<Authority>,
    path: String,
    query: Option<String>,
    fragment: Option<String>,
}

/// The five raw components of a reference (RFC 3986, appendix B).
struct Reference<'a> {
    scheme: Option<&'a str>,
    authority: Option<&'a str>,
    path: &'a str,
    query: Option<&'a str>,
    fragment: Option<&'a str>,
}

impl<'a> Reference<'a> {
    fn split(input: &'a str) -> Self {
        let (rest, fragment) = match input.find('#') {
            Some(i) => (&input[..i], Some(&input[i + 1..])),
            None => (input, None),
        };
        let (rest, query) = match rest.find('?') {
            Some(i) => (&rest[..i], Some(&rest[i + 1..])),
            None => (rest, None),
        };

        let mut scheme = None;
        let mut rest = rest;
        if let Some(i) = rest.find(':') {
            let candidate = &rest[..i];
            if !candidate.contains('/') && is_scheme(candidate) {
                scheme = Some(candidate);
                rest = &rest[i + 1..];
            }
        }

        let (authority, path) = match rest.strip_prefix("//") {
            Some(after) => {
                let end = after.find('/').unwrap_or(after.len());
                (Some(&after[..end]), &after[end..])
            }
            None => (None, rest),
        };

        Self {
            scheme,
            authority,
            path,
            query,
            fragment,
        }
    }
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.'))
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" | "ws" => Some(80),
        "https" | "wss" => Some(443),
        "ftp" => Some(21),
        _ => None,
    }
}

fn is_hierarchical(scheme: &str) -> bool {
    default_port(scheme).is_some() || scheme == "file"
}

fn parse_port(raw: &str) -> Result<Option<u16>, AddressError> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<u16>()
        .map(Some)
        .map_err(|_| AddressError::InvalidPort(raw.to_string()))
}

/// Split `host[:port]`, keeping bracketed IPv6 literals intact.
fn split_host_port(raw: &str) -> Result<(String, Option<u16>), AddressError> {
    let port_sep = if raw.starts_with('[') {
        raw.find(']').and_then(|close| {
            raw[close + 1..]
                .starts_with(':')
                .then_some(close + 1)
        })
    } else {
        raw.rfind(':')
    };
    match port_sep {
        Some(i) => Ok((raw[..i].to_ascii_lowercase(), parse_port(&raw[i + 1..])?)),
        None => Ok((raw.to_ascii_lowercase(), None)),
    }
}

fn parse_authority(raw: &str) -> Result<Authority, AddressError> {
    let (userinfo, host_port) = match raw.rfind('@') {
        Some(i) => (Some(raw[..i].to_string()), &raw[i + 1..]),
        None => (None, raw),
    };
    let (hostname, port) = split_host_port(host_port)?;
    Ok(Authority {
        userinfo,
        hostname,
        port,
    })
}

fn non_empty(value: &str, prefix: char) -> Option<String> {
    let value = value.strip_prefix(prefix).unwrap_or(value);
    (!value.is_empty()).then(|| value.to_string())
}

fn remove_dot_segments(path: &str) -> String {
    fn pop_segment(output: &mut String) {
        match output.rfind('/') {
            Some(i) => output.truncate(i),
            None => output.clear(),
        }
    }

    let mut input = path.to_string();
    let mut output = String::with_capacity(path.len());
    while !input.is_empty() {
        if input.starts_with("../") {
            input.drain(..3);
        } else if input.starts_with("./") {
            input.drain(..2);
        } else if input.starts_with("/./") {
            input.replace_range(..3, "/");
        } else if input == "/." {
            input.replace_range(..2, "/");
        } else if input.starts_with("/../") {
            input.replace_range(..4, "/");
            pop_segment(&mut output);
        } else if input == "/.." {
            input.replace_range(..3, "/");
            pop_segment(&mut output);
        } else if input == "." || input == ".." {
            input.clear();
        } else {
            let skip = usize::from(input.starts_with('/'));
            let end = input[skip..].find('/').map_or(input.len(), |i| i + skip);
            output.push_str(&input[..end]);
            input.drain(..end);
        }
    }
    output
}

impl Address {
    /// Parse an absolute address.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AddressError::Empty);
        }
        let reference = Reference::split(input);
        let Some(scheme) = reference.scheme else {
            return Err(AddressError::MissingScheme(input.to_string()));
        };
        let authority = reference.authority.map(parse_authority).transpose()?;
        let mut address = Self {
            scheme: scheme.to_ascii_lowercase(),
            authority,
            path: remove_dot_segments(reference.path),
            query: reference.query.map(str::to_string),
            fragment: reference.fragment.map(str::to_string),
        };
        address.normalize();
        Ok(address)
    }

    /// Resolve `reference` against this address.
    pub fn resolve(&self, reference: &str) -> Result<Self, AddressError> {
        let reference = reference.trim();
        let r = Reference::split(reference);

        if r.scheme.is_some() {
            return Self::parse(reference);
        }

        let mut target = self.clone();
        target.fragment = r.fragment.map(str::to_string);

        if let Some(authority) = r.authority {
            target.authority = Some(parse_authority(authority)?);
            target.path = remove_dot_segments(r.path);
            target.query = r.query.map(str::to_string);
        } else if r.path.is_empty() {
            if let Some(query) = r.query {
                target.query = Some(query.to_string());
            }
        } else {
            target.path = if r.path.starts_with('/') {
                remove_dot_segments(r.path)
            } else {
                remove_dot_segments(&self.merge(r.path))
            };
            target.query = r.query.map(str::to_string);
        }

        target.normalize();
        Ok(target)
    }

    fn merge(&self, relative: &str) -> String {
        if self.authority.is_some() && self.path.is_empty() {
            return format!("/{relative}");
        }
        match self.path.rfind('/') {
            Some(i) => format!("{}{}", &self.path[..=i], relative),
            None => relative.to_string(),
        }
    }

    fn normalize(&mut self) {
        let scheme_port = default_port(&self.scheme);
        if let Some(authority) = &mut self.authority {
            if authority.port.is_some() && authority.port == scheme_port {
                authority.port = None;
            }
        }
        if self.path.is_empty() && self.authority.is_some() && is_hierarchical(&self.scheme) {
            self.path.push('/');
        }
    }

    pub fn href(&self) -> String {
        self.to_string()
    }

    /// Scheme without the trailing colon.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Scheme with the trailing colon, as navigation objects report it.
    pub fn protocol(&self) -> String {
        format!("{}:", self.scheme)
    }

    /// `hostname[:port]`, empty when the address has no authority.
    pub fn host(&self) -> String {
        match &self.authority {
            Some(Authority {
                hostname,
                port: Some(port),
                ..
            }) => format!("{hostname}:{port}"),
            Some(authority) => authority.hostname.clone(),
            None => String::new(),
        }
    }

    pub fn hostname(&self) -> &str {
        self.authority
            .as_ref()
            .map_or("", |authority| authority.hostname.as_str())
    }

    /// Explicit port, empty when absent or the scheme default.
    pub fn port(&self) -> String {
        self.authority
            .as_ref()
            .and_then(|authority| authority.port)
            .map_or_else(String::new, |port| port.to_string())
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query with its leading `?`, or empty.
    pub fn query(&self) -> String {
        match &self.query {
            Some(query) if !query.is_empty() => format!("?{query}"),
            _ => String::new(),
        }
    }

    /// Fragment with its leading `#`, or empty.
    pub fn fragment(&self) -> String {
        match &self.fragment {
            Some(fragment) if !fragment.is_empty() => format!("#{fragment}"),
            _ => String::new(),
        }
    }

    /// `scheme://host`, or `"null"` for addresses without an authority.
    pub fn origin(&self) -> String {
        match &self.authority {
            Some(_) => format!("{}://{}", self.scheme, self.host()),
            None => "null".to_string(),
        }
    }

    pub fn set_scheme(&mut self, scheme: &str) -> Result<(), AddressError> {
        let scheme = scheme.strip_suffix(':').unwrap_or(scheme);
        if !is_scheme(scheme) {
            return Err(AddressError::InvalidScheme(scheme.to_string()));
        }
        self.scheme = scheme.to_ascii_lowercase();
        self.normalize();
        Ok(())
    }

    pub fn set_host(&mut self, host: &str) -> Result<(), AddressError> {
        let (hostname, port) = split_host_port(host)?;
        let userinfo = self.authority.take().and_then(|authority| authority.userinfo);
        self.authority = Some(Authority {
            userinfo,
            hostname,
            port,
        });
        self.normalize();
        Ok(())
    }

    pub fn set_hostname(&mut self, hostname: &str) {
        let hostname = hostname.to_ascii_lowercase();
        match &mut self.authority {
            Some(authority) => authority.hostname = hostname,
            None => {
                self.authority = Some(Authority {
                    userinfo: None,
                    hostname,
                    port: None,
                })
            }
        }
        self.normalize();
    }

    /// Set the port; an empty value clears it.
    pub fn set_port(&mut self, port: &str) -> Result<(), AddressError> {
        let port = parse_port(port)?;
        if let Some(authority) = &mut self.authority {
            authority.port = port;
        }
        self.normalize();
        Ok(())
    }

    pub fn set_path(&mut self, path: &str) {
        let path = if self.authority.is_some() && !path.is_empty() && !path.starts_with('/') {
            format!("/{path}")
        } else {
            path.to_string()
        };
        self.path = remove_dot_segments(&path);
        self.normalize();
    }

    /// Set the query; a leading `?` is optional and an empty value clears it.
    pub fn set_query(&mut self, query: &str) {
        self.query = non_empty(query, '?');
    }

    /// Set the fragment; a leading `#` is optional and an empty value clears it.
    pub fn set_fragment(&mut self, fragment: &str) {
        self.fragment = non_empty(fragment, '#');
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.scheme)?;
        if let Some(authority) = &self.authority {
            f.write_str("//")?;
            if let Some(userinfo) = &authority.userinfo {
                write!(f, "{userinfo}@")?;
            }
            f.write_str(&authority.hostname)?;
            if let Some(port) = authority.port {
                write!(f, ":{port}")?;
            }
        }
        f.write_str(&self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
